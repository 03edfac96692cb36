//! Grid Engine job and queue snapshots.
//!
//! [`gridengine`] decodes a `qstat -xml` report into jobs and queue instances,
//! expands array-task ranges, and resolves per-host resource metrics.

pub mod gridengine;
