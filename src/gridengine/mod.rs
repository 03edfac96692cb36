//! Grid Engine (SGE/UGE/OGE) `qstat -xml` data model.
//!
//! Values here are plain data with no interior mutability. Concurrent readers of a
//! `JobList` or `ResourceList` are fine; mutation (e.g. sorting) is not internally
//! synchronized and needs a single writer or external locking.

pub mod document;
pub mod error;
pub mod filters;
pub mod job;
pub mod qstat;
pub mod resource;
pub mod task;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use document::{JobInfo, JobInfoSource, Queue, SnapshotFile, get_jobs, get_jobs_with_filter};
pub use error::{ErrorKind, GridError, Result};
pub use job::{
    JobList, MAX_EXPANDED_TASKS, does_job_contain_task_range, extrapolate_tasks_to_jobs,
    filter_jobs,
};
pub use resource::{LoadWindow, Resource, ResourceList, StorageUnit, StorageValue};
pub use task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Pending,
    Held,
    Error,
    Transferring,
    Suspended,
    Deleting,
    Other,
}

impl JobState {
    pub fn all() -> [JobState; 7] {
        [
            JobState::Running,
            JobState::Pending,
            JobState::Held,
            JobState::Error,
            JobState::Transferring,
            JobState::Suspended,
            JobState::Deleting,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            JobState::Running => "RUNNING",
            JobState::Pending => "PENDING",
            JobState::Held => "HELD",
            JobState::Error => "ERROR",
            JobState::Transferring => "TRANSFERRING",
            JobState::Suspended => "SUSPENDED",
            JobState::Deleting => "DELETING",
            JobState::Other => "OTHER",
        };
        write!(f, "{}", state_str)
    }
}

impl FromStr for JobState {
    type Err = String;

    /// Grid Engine state codes are letter combinations (`r`, `qw`, `hqw`, `Eqw`, `dr`, ...).
    /// The most significant letter wins.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let code = s.trim();
        match code.to_uppercase().as_str() {
            "RUNNING" => return Ok(JobState::Running),
            "PENDING" => return Ok(JobState::Pending),
            _ => {}
        }

        let state = if code.contains('E') {
            JobState::Error
        } else if code.starts_with('d') {
            JobState::Deleting
        } else if code.contains('h') {
            JobState::Held
        } else if code.contains('t') {
            JobState::Transferring
        } else if code.contains(['s', 'S', 'T']) {
            JobState::Suspended
        } else if code.contains('q') {
            JobState::Pending
        } else if code.contains('r') {
            JobState::Running
        } else {
            JobState::Other
        };
        Ok(state)
    }
}

/// One `<job_list>` entry, or one array-task slot after range expansion.
///
/// Deserialization reads qstat's element names; serialization writes the
/// interchange names used by `gridview jobs`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename(deserialize = "@state", serialize = "state_attribute"), default)]
    pub state_attribute: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename(deserialize = "JB_job_number", serialize = "job_number"))]
    pub job_number: i64,
    #[serde(rename(deserialize = "JAT_prio", serialize = "priority"), default)]
    pub priority: f64,
    #[serde(rename(deserialize = "JB_name", serialize = "name"), default)]
    pub name: String,
    #[serde(rename(deserialize = "JB_owner", serialize = "owner"), default)]
    pub owner: String,
    #[serde(rename(deserialize = "JAT_start_time", serialize = "start_time"), default)]
    pub start_time: String,
    #[serde(
        rename(deserialize = "JB_submission_time", serialize = "submitted_time"),
        default
    )]
    pub submitted_time: String,
    #[serde(default)]
    pub slots: i32,
    #[serde(default, skip_serializing_if = "Task::is_absent")]
    pub tasks: Task,
}

impl Job {
    /// True only for the plain running code `r`
    pub fn is_running(&self) -> bool {
        self.state == "r"
    }

    pub fn job_state(&self) -> JobState {
        JobState::from_str(&self.state).unwrap_or(JobState::Other)
    }

    /// `123` for plain jobs, `123.4` for a concrete array task
    pub fn display_id(&self) -> String {
        match self.tasks.task_id() {
            Some(task_id) if task_id != 0 => format!("{}.{}", self.job_number, task_id),
            _ => self.job_number.to_string(),
        }
    }
}
