use ratatui::layout::Constraint;
use std::cmp::Ordering;

use gridview::gridengine::Job;

use crate::utils::{format_timestamp, truncate_string};

/// Available columns for display in the job list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobColumn {
    Id,
    Name,
    Owner,
    State,
    Priority,
    Slots,
    SubmitTime,
    StartTime,
    Tasks,
}

impl JobColumn {
    /// Get the title for this column
    pub fn title(&self) -> &'static str {
        match self {
            JobColumn::Id => "ID",
            JobColumn::Name => "Name",
            JobColumn::Owner => "Owner",
            JobColumn::State => "State",
            JobColumn::Priority => "Priority",
            JobColumn::Slots => "Slots",
            JobColumn::SubmitTime => "Submit",
            JobColumn::StartTime => "Start",
            JobColumn::Tasks => "Tasks",
        }
    }

    /// Get the default width constraint for this column
    pub fn default_width(&self) -> Constraint {
        match self {
            JobColumn::Id => Constraint::Length(12),
            JobColumn::Name => Constraint::Min(15),
            JobColumn::Owner => Constraint::Length(10),
            JobColumn::State => Constraint::Length(6),
            JobColumn::Priority => Constraint::Length(9),
            JobColumn::Slots => Constraint::Length(6),
            JobColumn::SubmitTime | JobColumn::StartTime => Constraint::Length(19),
            JobColumn::Tasks => Constraint::Length(14),
        }
    }

    /// Get all available columns
    pub fn all() -> Vec<JobColumn> {
        vec![
            JobColumn::Id,
            JobColumn::Name,
            JobColumn::Owner,
            JobColumn::State,
            JobColumn::Priority,
            JobColumn::Slots,
            JobColumn::SubmitTime,
            JobColumn::StartTime,
            JobColumn::Tasks,
        ]
    }

    /// Cell text for `job`
    pub fn content(&self, job: &Job) -> String {
        match self {
            JobColumn::Id => job.display_id(),
            JobColumn::Name => truncate_string(&job.name, 30),
            JobColumn::Owner => job.owner.clone(),
            JobColumn::State => job.state.clone(),
            JobColumn::Priority => format!("{:.5}", job.priority),
            JobColumn::Slots => job.slots.to_string(),
            JobColumn::SubmitTime => format_timestamp(&job.submitted_time),
            JobColumn::StartTime => format_timestamp(&job.start_time),
            JobColumn::Tasks => job.tasks.to_string(),
        }
    }

    /// Ascending order of two jobs by this column
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        match self {
            JobColumn::Id => {
                (a.job_number, a.tasks.task_id()).cmp(&(b.job_number, b.tasks.task_id()))
            }
            JobColumn::Name => a.name.cmp(&b.name),
            JobColumn::Owner => a.owner.cmp(&b.owner),
            JobColumn::State => a.state.cmp(&b.state),
            JobColumn::Priority => a.priority.total_cmp(&b.priority),
            JobColumn::Slots => a.slots.cmp(&b.slots),
            // ISO-8601 strings order chronologically
            JobColumn::SubmitTime => a.submitted_time.cmp(&b.submitted_time),
            JobColumn::StartTime => a.start_time.cmp(&b.start_time),
            JobColumn::Tasks => a.tasks.task_id().cmp(&b.tasks.task_id()),
        }
    }
}

/// Sort order for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            SortOrder::Ascending => " ↑",
            SortOrder::Descending => " ↓",
        }
    }
}

/// Column and direction the job list is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub column: JobColumn,
    pub order: SortOrder,
}

impl Default for SortColumn {
    fn default() -> Self {
        Self {
            column: JobColumn::Id,
            order: SortOrder::Ascending,
        }
    }
}

impl SortColumn {
    /// Move to the next column in `columns`, keeping the direction
    pub fn next_column(&mut self, columns: &[JobColumn]) {
        let position = columns.iter().position(|c| *c == self.column).unwrap_or(0);
        if let Some(next) = columns.get((position + 1) % columns.len().max(1)) {
            self.column = *next;
        }
    }

    /// Less-than for `JobList::sort`
    pub fn less(&self, a: &Job, b: &Job) -> bool {
        let ordering = self.column.compare(a, b);
        match self.order {
            SortOrder::Ascending => ordering == Ordering::Less,
            SortOrder::Descending => ordering == Ordering::Greater,
        }
    }
}
