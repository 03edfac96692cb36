use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{GridError, Result};
use super::job::JobList;
use super::resource::ResourceList;
use super::Job;

/// Root of a `qstat -xml` report.
///
/// ```xml
/// <job_info>
///   <queue_info>
///     <Queue-List> ... <job_list state="running">...</job_list> </Queue-List>
///   </queue_info>
///   <job_info>
///     <job_list state="pending">...</job_list>
///   </job_info>
/// </job_info>
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub queue_info: QueueInfo,
    #[serde(rename(deserialize = "job_info", serialize = "pending_jobs"), default)]
    pub pending_jobs: PendingJobs,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Present with `qstat -f`
    #[serde(rename(deserialize = "Queue-List", serialize = "queues"), default)]
    pub queues: Vec<Queue>,
    /// Running jobs when the report is not grouped by queue
    #[serde(rename(deserialize = "job_list", serialize = "jobs"), default)]
    pub jobs: JobList,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PendingJobs {
    #[serde(rename(deserialize = "job_list", serialize = "jobs"), default)]
    pub jobs: JobList,
}

/// One queue instance (`queue@host`) with its load report and running jobs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    #[serde(default)]
    pub qtype: String,
    #[serde(default)]
    pub slots_used: i32,
    #[serde(default)]
    pub slots_resv: i32,
    #[serde(default)]
    pub slots_total: i32,
    #[serde(default)]
    pub load_avg: Option<f64>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename(deserialize = "resource", serialize = "resources"), default)]
    pub resources: ResourceList,
    #[serde(rename(deserialize = "job_list", serialize = "jobs"), default)]
    pub jobs: JobList,
}

impl Queue {
    /// Host part of `queue@host`
    pub fn host(&self) -> &str {
        self.name
            .split_once('@')
            .map_or(self.name.as_str(), |(_, host)| host)
    }
}

impl JobInfo {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let info: JobInfo = quick_xml::de::from_str(xml)?;
        info.log_summary();
        Ok(info)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let info: JobInfo = quick_xml::de::from_reader(reader)?;
        info.log_summary();
        Ok(info)
    }

    pub fn queues(&self) -> &[Queue] {
        &self.queue_info.queues
    }

    /// Running jobs of every queue in report order, followed by the pending jobs
    pub fn get_jobs(&self) -> JobList {
        let running = self
            .queue_info
            .queues
            .iter()
            .flat_map(|q| q.jobs.iter())
            .chain(self.queue_info.jobs.iter());

        running
            .chain(self.pending_jobs.jobs.iter())
            .cloned()
            .collect()
    }

    fn log_summary(&self) {
        debug!(
            "Decoded qstat report: {} queues, {} pending jobs",
            self.queue_info.queues.len(),
            self.pending_jobs.jobs.len()
        );
    }
}

/// Anything that can produce a decoded qstat report
pub trait JobInfoSource {
    fn job_info(&self) -> Result<JobInfo>;
}

impl JobInfoSource for str {
    fn job_info(&self) -> Result<JobInfo> {
        JobInfo::from_xml(self)
    }
}

impl JobInfoSource for JobInfo {
    fn job_info(&self) -> Result<JobInfo> {
        Ok(self.clone())
    }
}

/// A `qstat -xml` report saved to disk
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobInfoSource for SnapshotFile {
    fn job_info(&self) -> Result<JobInfo> {
        let xml = std::fs::read_to_string(&self.path).map_err(|source| GridError::Snapshot {
            path: self.path.display().to_string(),
            source,
        })?;
        JobInfo::from_xml(&xml)
    }
}

/// Every job in the report, running before pending. Fails as a whole if the
/// report cannot be produced.
pub fn get_jobs<S>(source: &S) -> Result<JobList>
where
    S: JobInfoSource + ?Sized,
{
    Ok(source.job_info()?.get_jobs())
}

/// `get_jobs` narrowed to the jobs matching `filter`
pub fn get_jobs_with_filter<S, F>(source: &S, filter: F) -> Result<JobList>
where
    S: JobInfoSource + ?Sized,
    F: Fn(&Job) -> bool,
{
    Ok(get_jobs(source)?.filter(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridengine::error::ErrorKind;
    use crate::gridengine::Task;

    const REPORT: &str = r#"<?xml version='1.0'?>
<job_info xmlns:xsd="http://arc.liv.ac.uk/repos/darcs/sge/source/dist/util/resources/schemas/qstat/qstat.xsd">
  <queue_info>
    <Queue-List>
      <name>all.q@node01</name>
      <qtype>BIP</qtype>
      <slots_used>2</slots_used>
      <slots_resv>0</slots_resv>
      <slots_total>8</slots_total>
      <load_avg>0.42000</load_avg>
      <arch>lx-amd64</arch>
      <resource name="num_proc" type="hl">8</resource>
      <resource name="mem_free" type="hl">10.2G</resource>
      <job_list state="running">
        <JB_job_number>101</JB_job_number>
        <JAT_prio>0.55500</JAT_prio>
        <JB_name>align</JB_name>
        <JB_owner>alice</JB_owner>
        <state>r</state>
        <JAT_start_time>2024-03-01T10:05:00</JAT_start_time>
        <slots>1</slots>
      </job_list>
      <resource name="mem_total" type="hl">15.5G</resource>
      <job_list state="running">
        <JB_job_number>102</JB_job_number>
        <JAT_prio>0.50000</JAT_prio>
        <JB_name>array</JB_name>
        <JB_owner>bob</JB_owner>
        <state>r</state>
        <JAT_start_time>2024-03-01T10:06:00</JAT_start_time>
        <slots>1</slots>
        <tasks>3</tasks>
      </job_list>
    </Queue-List>
    <Queue-List>
      <name>all.q@node02</name>
      <qtype>BIP</qtype>
      <slots_used>0</slots_used>
      <slots_resv>0</slots_resv>
      <slots_total>8</slots_total>
      <state>au</state>
    </Queue-List>
  </queue_info>
  <job_info>
    <job_list state="pending">
      <JB_job_number>103</JB_job_number>
      <JAT_prio>0.00000</JAT_prio>
      <JB_name>sweep</JB_name>
      <JB_owner>bob</JB_owner>
      <state>qw</state>
      <JB_submission_time>2024-03-01T10:07:00</JB_submission_time>
      <slots>1</slots>
      <tasks>40-55:5</tasks>
    </job_list>
  </job_info>
</job_info>
"#;

    #[test]
    fn test_decodes_queues_and_resources() {
        let info = JobInfo::from_xml(REPORT).unwrap();
        assert_eq!(info.queues().len(), 2);

        let node01 = &info.queues()[0];
        assert_eq!(node01.host(), "node01");
        assert_eq!(node01.slots_total, 8);
        assert_eq!(node01.load_avg, Some(0.42));
        assert_eq!(node01.resources.len(), 3);
        assert_eq!(node01.resources.num_processors().unwrap(), 8);
        assert_eq!(node01.resources.free_memory().unwrap().bytes, 10_200_000_000);
        assert_eq!(node01.jobs.len(), 2);

        let node02 = &info.queues()[1];
        assert_eq!(node02.state.as_deref(), Some("au"));
        assert!(node02.jobs.is_empty());
    }

    #[test]
    fn test_decodes_job_fields() {
        let info = JobInfo::from_xml(REPORT).unwrap();
        let job = &info.queues()[0].jobs[0];
        assert_eq!(job.state_attribute, "running");
        assert_eq!(job.job_number, 101);
        assert_eq!(job.priority, 0.555);
        assert_eq!(job.name, "align");
        assert_eq!(job.owner, "alice");
        assert_eq!(job.start_time, "2024-03-01T10:05:00");
        assert_eq!(job.slots, 1);
        assert_eq!(job.tasks, Task::Absent);
        assert_eq!(info.queues()[0].jobs[1].tasks, Task::Plain(3));
    }

    #[test]
    fn test_get_jobs_orders_running_before_pending() {
        let jobs = get_jobs(REPORT).unwrap();
        let numbers: Vec<i64> = jobs.iter().map(|j| j.job_number).collect();
        assert_eq!(numbers, vec![101, 102, 103]);
        assert!(jobs[2].tasks.is_range());
    }

    #[test]
    fn test_get_jobs_with_filter() {
        let jobs = get_jobs_with_filter(REPORT, |j| j.owner == "bob").unwrap();
        let numbers: Vec<i64> = jobs.iter().map(|j| j.job_number).collect();
        assert_eq!(numbers, vec![102, 103]);
    }

    #[test]
    fn test_ungrouped_report() {
        let xml = r#"<job_info>
  <queue_info>
    <job_list state="running">
      <JB_job_number>7</JB_job_number>
      <JAT_prio>0.5</JAT_prio>
      <JB_name>a</JB_name>
      <JB_owner>u</JB_owner>
      <state>r</state>
      <slots>1</slots>
    </job_list>
  </queue_info>
  <job_info>
    <job_list state="pending">
      <JB_job_number>8</JB_job_number>
      <JAT_prio>0.0</JAT_prio>
      <JB_name>b</JB_name>
      <JB_owner>u</JB_owner>
      <state>qw</state>
      <slots>1</slots>
    </job_list>
  </job_info>
</job_info>"#;
        let jobs = get_jobs(xml).unwrap();
        let numbers: Vec<i64> = jobs.iter().map(|j| j.job_number).collect();
        assert_eq!(numbers, vec![7, 8]);
    }

    #[test]
    fn test_bad_task_id_fails_document() {
        let xml = REPORT.replace("<tasks>3</tasks>", "<tasks>three</tasks>");
        let err = JobInfo::from_xml(&xml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_missing_snapshot_is_upstream() {
        let err = get_jobs(&SnapshotFile::new("/nonexistent/qstat.xml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_empty_report() {
        let jobs = get_jobs("<job_info></job_info>").unwrap();
        assert!(jobs.is_empty());
    }
}
