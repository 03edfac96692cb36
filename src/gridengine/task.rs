use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::error::{GridError, Result};

/// The `<tasks>` field of a qstat job entry.
///
/// Grid Engine reports either a single array-task id (`7`) or, for pending
/// array jobs, a compressed range such as `40-55:5` (tasks 40 to 55, step 5).
/// The range text is kept verbatim so it can be written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Task {
    /// No task information was reported
    #[default]
    Absent,
    /// A single task id
    Plain(i64),
    /// A compressed range; `task_id` is set on jobs produced by range expansion
    Range { expr: String, task_id: Option<i64> },
}

impl Task {
    /// Decode the raw text of a `<tasks>` element. Range text is kept exactly as given.
    pub fn decode(raw: &str) -> Result<Self> {
        let text = raw.trim();

        if text.is_empty() {
            return Ok(Task::Absent);
        }

        if text.contains(':') {
            return Ok(Task::Range {
                expr: raw.to_string(),
                task_id: None,
            });
        }

        let id = text.parse::<i64>().map_err(|e| {
            debug!("Failed to parse task identifier {:?}: {}", text, e);
            GridError::invalid_integer(text, e)
        })?;

        Ok(Task::Plain(id))
    }

    /// Encode back to the scheduler's text form.
    ///
    /// Ranges are written verbatim, never recomputed from an expanded id.
    /// Task id zero is not representable and encodes as `None`, like `Absent`.
    pub fn encode(&self) -> Option<String> {
        match self {
            Task::Absent | Task::Plain(0) => None,
            Task::Plain(id) => Some(id.to_string()),
            Task::Range { expr, .. } => Some(expr.clone()),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Task::Range { .. })
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Task::Absent)
    }

    /// The concrete task id, if this task names one
    pub fn task_id(&self) -> Option<i64> {
        match self {
            Task::Absent => None,
            Task::Plain(id) => Some(*id),
            Task::Range { task_id, .. } => *task_id,
        }
    }

    /// Raw range text; plain ids have no range source
    pub fn source(&self) -> Option<&str> {
        match self {
            Task::Range { expr, .. } => Some(expr),
            _ => None,
        }
    }

    /// Copy of this task pinned to a single id, keeping any range text
    pub fn with_task_id(&self, id: i64) -> Self {
        match self {
            Task::Range { expr, .. } => Task::Range {
                expr: expr.clone(),
                task_id: Some(id),
            },
            Task::Absent | Task::Plain(_) => Task::Plain(id),
        }
    }
}

impl FromStr for Task {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Task::decode(s)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Range {
                expr,
                task_id: Some(id),
            } => write!(f, "{} ({})", id, expr),
            _ => write!(f, "{}", self.encode().unwrap_or_default()),
        }
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Task::decode(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Task {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.encode() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}
