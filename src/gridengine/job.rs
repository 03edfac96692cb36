use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Deref;
use std::sync::LazyLock;
use tracing::debug;

use super::Job;
use super::error::{GridError, Result};

/// `<start>-<end>:<step>` anywhere in a task field
static TASK_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)-([0-9]+):([0-9]+)").expect("task range pattern is valid")
});

/// Largest number of jobs a single task range may expand into
pub const MAX_EXPANDED_TASKS: i64 = 1_000_000;

/// Ordered jobs, running-queue jobs first and pending jobs after.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobList(Vec<Job>);

impl JobList {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self(jobs)
    }

    /// New list of the jobs matching `filter`, in their original order
    pub fn filter<F>(&self, filter: F) -> JobList
    where
        F: Fn(&Job) -> bool,
    {
        self.0.iter().filter(|job| filter(job)).cloned().collect()
    }

    /// Sort in place with a less-than comparator and return the list for chaining
    pub fn sort<F>(&mut self, mut less: F) -> &mut Self
    where
        F: FnMut(&Job, &Job) -> bool,
    {
        self.0.sort_by(|a, b| ordering_from_less(less(a, b), less(b, a)));
        self
    }

    /// Sort in place with a less-than comparator over positions in the list as it
    /// was before sorting started
    pub fn sort_by_index<F>(&mut self, mut less: F) -> &mut Self
    where
        F: FnMut(&[Job], usize, usize) -> bool,
    {
        let mut order: Vec<usize> = (0..self.0.len()).collect();
        {
            let jobs = self.0.as_slice();
            order.sort_by(|&i, &j| ordering_from_less(less(jobs, i, j), less(jobs, j, i)));
        }

        let mut slots: Vec<Option<Job>> = std::mem::take(&mut self.0).into_iter().map(Some).collect();
        self.0 = order.into_iter().filter_map(|i| slots[i].take()).collect();
        self
    }

    /// New list with `f` applied to every job
    pub fn map<F>(&self, f: F) -> JobList
    where
        F: Fn(&Job) -> Job,
    {
        self.0.iter().map(f).collect()
    }

    /// Replace every range-bearing job with one job per task id, keeping list order
    pub fn expand_task_ranges(&self) -> Result<JobList> {
        let mut jobs = Vec::with_capacity(self.0.len());
        for job in &self.0 {
            if does_job_contain_task_range(job) {
                jobs.extend(extrapolate_tasks_to_jobs(job)?);
            } else {
                jobs.push(job.clone());
            }
        }
        Ok(JobList(jobs))
    }

    pub fn push(&mut self, job: Job) {
        self.0.push(job);
    }

    pub fn into_inner(self) -> Vec<Job> {
        self.0
    }
}

fn ordering_from_less(a_before_b: bool, b_before_a: bool) -> Ordering {
    if a_before_b {
        Ordering::Less
    } else if b_before_a {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl Deref for JobList {
    type Target = [Job];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Job>> for JobList {
    fn from(jobs: Vec<Job>) -> Self {
        Self(jobs)
    }
}

impl FromIterator<Job> for JobList {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Job> for JobList {
    fn extend<I: IntoIterator<Item = Job>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for JobList {
    type Item = Job;
    type IntoIter = std::vec::IntoIter<Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a JobList {
    type Item = &'a Job;
    type IntoIter = std::slice::Iter<'a, Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Jobs from `jobs` matching `filter`
pub fn filter_jobs<F>(jobs: &JobList, filter: F) -> JobList
where
    F: Fn(&Job) -> bool,
{
    jobs.filter(filter)
}

/// Whether the job's task field holds a `start-end:step` range (substring match)
pub fn does_job_contain_task_range(job: &Job) -> bool {
    job.tasks
        .source()
        .is_some_and(|source| TASK_RANGE.is_match(source))
}

/// Expand a range-bearing job into one job per task id, ascending.
///
/// Every field other than the task id is copied from `original`.
pub fn extrapolate_tasks_to_jobs(original: &Job) -> Result<JobList> {
    let source = original.tasks.source().unwrap_or_default();
    let captures = TASK_RANGE
        .captures(source)
        .ok_or_else(|| GridError::NotATaskRange {
            tasks: original.tasks.encode().unwrap_or_default(),
        })?;

    let parse = |s: &str| {
        s.parse::<i64>()
            .map_err(|e| GridError::invalid_integer(s, e))
    };
    let start = parse(&captures[1])?;
    let end = parse(&captures[2])?;
    let step = parse(&captures[3])?;

    if step <= 0 {
        return Err(GridError::NonPositiveStep { step });
    }
    if start > end {
        return Err(GridError::EmptyTaskRange { start, end });
    }

    let too_large = || GridError::TaskRangeTooLarge {
        start,
        end,
        step,
        limit: MAX_EXPANDED_TASKS,
    };
    let count = end
        .checked_sub(start)
        .map(|span| span / step)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(too_large)?;
    if count > MAX_EXPANDED_TASKS {
        return Err(too_large());
    }

    let mut jobs = Vec::with_capacity(count as usize);
    let mut task_id = start;
    while task_id <= end {
        let mut job = original.clone();
        job.tasks = original.tasks.with_task_id(task_id);
        jobs.push(job);

        task_id = match task_id.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    debug!(
        "Expanded job {} task range {:?} into {} jobs",
        original.job_number,
        source,
        jobs.len()
    );

    Ok(JobList(jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridengine::Task;
    use crate::gridengine::error::ErrorKind;

    fn job(number: i64, state: &str, owner: &str) -> Job {
        Job {
            job_number: number,
            state: state.to_string(),
            owner: owner.to_string(),
            name: format!("job{}", number),
            ..Default::default()
        }
    }

    fn range_job(tasks: &str) -> Job {
        Job {
            job_number: 99,
            state: "qw".to_string(),
            priority: 0.25,
            name: "array".to_string(),
            owner: "bob".to_string(),
            submitted_time: "2024-03-01T10:00:00".to_string(),
            slots: 2,
            tasks: Task::decode(tasks).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_chains_and_keeps_order() {
        let jobs = JobList::new(vec![
            job(1, "r", "alice"),
            job(2, "qw", "alice"),
            job(3, "r", "bob"),
            job(4, "r", "alice"),
            job(5, "hqw", "alice"),
        ]);

        let filtered = jobs.filter(|j| j.is_running()).filter(|j| j.owner == "alice");
        let numbers: Vec<i64> = filtered.iter().map(|j| j.job_number).collect();
        assert_eq!(numbers, vec![1, 4]);
        assert_eq!(jobs.len(), 5);
    }

    #[test]
    fn test_filter_jobs_free_function() {
        let jobs = JobList::new(vec![job(1, "r", "alice"), job(2, "qw", "bob")]);
        let filtered = filter_jobs(&jobs, |j| j.owner == "bob");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].job_number, 2);
    }

    #[test]
    fn test_sort_returns_self_for_chaining() {
        let mut jobs = JobList::new(vec![job(3, "r", "c"), job(1, "r", "a"), job(2, "r", "b")]);
        let numbers: Vec<i64> = jobs
            .sort(|a, b| a.job_number < b.job_number)
            .iter()
            .map(|j| j.job_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_index() {
        let mut jobs = JobList::new(vec![job(3, "r", "c"), job(1, "r", "a"), job(2, "r", "b")]);
        jobs.sort_by_index(|list, i, j| list[i].owner > list[j].owner);
        let owners: Vec<&str> = jobs.iter().map(|j| j.owner.as_str()).collect();
        assert_eq!(owners, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_map() {
        let jobs = JobList::new(vec![job(1, "r", "alice")]);
        let renamed = jobs.map(|j| Job {
            name: j.name.to_uppercase(),
            ..j.clone()
        });
        assert_eq!(renamed[0].name, "JOB1");
        assert_eq!(jobs[0].name, "job1");
    }

    #[test]
    fn test_detects_range_as_substring() {
        assert!(does_job_contain_task_range(&range_job("40-55:5")));
        assert!(does_job_contain_task_range(&range_job("1-3:1,7-9:1")));
        assert!(!does_job_contain_task_range(&range_job("42")));
        assert!(!does_job_contain_task_range(&range_job("a:b")));
        assert!(!does_job_contain_task_range(&Job::default()));
    }

    #[test]
    fn test_extrapolate_range() {
        let original = range_job("40-55:5");
        let jobs = extrapolate_tasks_to_jobs(&original).unwrap();

        let ids: Vec<Option<i64>> = jobs.iter().map(|j| j.tasks.task_id()).collect();
        assert_eq!(ids, vec![Some(40), Some(45), Some(50), Some(55)]);

        for expanded in &jobs {
            assert_eq!(expanded.job_number, original.job_number);
            assert_eq!(expanded.owner, original.owner);
            assert_eq!(expanded.name, original.name);
            assert_eq!(expanded.priority, original.priority);
            assert_eq!(expanded.submitted_time, original.submitted_time);
            assert_eq!(expanded.slots, original.slots);
            assert_eq!(expanded.tasks.source(), Some("40-55:5"));
        }
    }

    #[test]
    fn test_extrapolate_includes_end_only_when_on_step() {
        let jobs = extrapolate_tasks_to_jobs(&range_job("1-10:4")).unwrap();
        let ids: Vec<i64> = jobs.iter().filter_map(|j| j.tasks.task_id()).collect();
        assert_eq!(ids, vec![1, 5, 9]);
    }

    #[test]
    fn test_extrapolate_plain_task_is_domain_error() {
        let err = extrapolate_tasks_to_jobs(&range_job("42")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(matches!(err, GridError::NotATaskRange { .. }));
    }

    #[test]
    fn test_extrapolate_zero_step_is_domain_error() {
        let err = extrapolate_tasks_to_jobs(&range_job("1-5:0")).unwrap_err();
        assert!(matches!(err, GridError::NonPositiveStep { step: 0 }));
    }

    #[test]
    fn test_extrapolate_reversed_range_is_domain_error() {
        let err = extrapolate_tasks_to_jobs(&range_job("9-3:1")).unwrap_err();
        assert!(matches!(err, GridError::EmptyTaskRange { start: 9, end: 3 }));
    }

    #[test]
    fn test_extrapolate_overflow_is_parse_error() {
        let err = extrapolate_tasks_to_jobs(&range_job("1-99999999999999999999:1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_extrapolate_full_i64_span_is_domain_error() {
        let err = extrapolate_tasks_to_jobs(&range_job("0-9223372036854775807:1")).unwrap_err();
        assert!(matches!(err, GridError::TaskRangeTooLarge { .. }));
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_extrapolate_rejects_ranges_past_limit() {
        let err = extrapolate_tasks_to_jobs(&range_job("1-4000000000:1")).unwrap_err();
        assert!(matches!(
            err,
            GridError::TaskRangeTooLarge {
                limit: MAX_EXPANDED_TASKS,
                ..
            }
        ));

        let one_past = format!("0-{}:1", MAX_EXPANDED_TASKS);
        assert!(extrapolate_tasks_to_jobs(&range_job(&one_past)).is_err());
    }

    #[test]
    fn test_range_detection_is_ascii_only() {
        let arabic = range_job("\u{661}-\u{663}:\u{661}");
        assert!(!does_job_contain_task_range(&arabic));
        let err = extrapolate_tasks_to_jobs(&arabic).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_expand_task_ranges_in_place() {
        let jobs = JobList::new(vec![job(1, "r", "alice"), range_job("1-3:1"), job(2, "qw", "bob")]);
        let expanded = jobs.expand_task_ranges().unwrap();
        let ids: Vec<String> = expanded.iter().map(|j| j.display_id()).collect();
        assert_eq!(ids, vec!["1", "99.1", "99.2", "99.3", "2"]);
    }
}
