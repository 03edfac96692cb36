//! Ready-made job predicates for `JobList::filter`.
//!
//! Time filters compare against the scheduler's ISO-8601 timestamps. A job whose
//! timestamp does not parse never matches; use [`parse_timestamp`] directly when a
//! hard failure is wanted instead.

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

use super::Job;
use super::error::{GridError, Result};

/// qstat's timestamp layout; fractional seconds are optional
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), ISO8601_FORMAT).map_err(|_| {
        GridError::InvalidTime {
            value: value.to_string(),
        }
    })
}

fn job_time(job: &Job, field: &str, value: &str) -> Option<NaiveDateTime> {
    match parse_timestamp(value) {
        Ok(time) => Some(time),
        Err(e) => {
            debug!("Excluding job {} from {} filter: {}", job.job_number, field, e);
            None
        }
    }
}

/// Jobs submitted strictly before `t`
pub fn before_submit_time(t: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| job_time(job, "submit time", &job.submitted_time).is_some_and(|time| time < t)
}

/// Jobs submitted strictly after `t`
pub fn after_submit_time(t: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| job_time(job, "submit time", &job.submitted_time).is_some_and(|time| time > t)
}

/// Jobs submitted strictly between `start` and `end`
pub fn between_submit_time(start: NaiveDateTime, end: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| {
        job_time(job, "submit time", &job.submitted_time)
            .is_some_and(|time| time > start && time < end)
    }
}

pub fn before_start_time(t: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| job_time(job, "start time", &job.start_time).is_some_and(|time| time < t)
}

pub fn after_start_time(t: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| job_time(job, "start time", &job.start_time).is_some_and(|time| time > t)
}

pub fn between_start_time(start: NaiveDateTime, end: NaiveDateTime) -> impl Fn(&Job) -> bool {
    move |job| {
        job_time(job, "start time", &job.start_time).is_some_and(|time| time > start && time < end)
    }
}

/// Exact state code, e.g. `r` or `qw`
pub fn state_is(code: &str) -> impl Fn(&Job) -> bool {
    let code = code.to_string();
    move |job| job.state == code
}

pub fn owner_is(owner: &str) -> impl Fn(&Job) -> bool {
    let owner = owner.to_string();
    move |job| job.owner == owner
}

pub fn name_matches(pattern: Regex) -> impl Fn(&Job) -> bool {
    move |job| pattern.is_match(&job.name)
}
