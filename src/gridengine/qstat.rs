use async_process::{Command, Output};
use tracing::{debug, info};

use super::document::JobInfo;
use super::error::{GridError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QstatOptions {
    /// Program to run, `qstat` unless overridden
    pub program: String,
    /// `-u`; `*` lists every user
    pub user: Option<String>,
    /// `-q`, restrict to one cluster queue
    pub queue: Option<String>,
    /// `-f`, group running jobs under their queue instance
    pub full: bool,
    /// `-F`, include each queue instance's resource report
    pub resources: bool,
}

impl Default for QstatOptions {
    fn default() -> Self {
        Self {
            program: "qstat".to_string(),
            user: Some("*".to_string()),
            queue: None,
            full: true,
            resources: true,
        }
    }
}

impl QstatOptions {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-xml".to_string()];

        if let Some(user) = &self.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }

        if self.full {
            args.push("-f".to_string());
        }

        if self.resources {
            args.push("-F".to_string());
        }

        if let Some(queue) = &self.queue {
            args.push("-q".to_string());
            args.push(queue.clone());
        }

        args
    }
}

/// Execute a command asynchronously and return the output
async fn execute_command(program: &str, args: &[String]) -> Result<Output> {
    Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| GridError::Command {
            program: program.to_string(),
            source,
        })
}

/// Run qstat once and return its XML report
pub async fn run_qstat(options: &QstatOptions) -> Result<String> {
    let args = options.to_args();
    debug!("Running {} with args: {:?}", options.program, args);

    let output = execute_command(&options.program, &args).await?;

    if !output.status.success() {
        return Err(GridError::CommandFailed {
            program: options.program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    info!("{} returned {} bytes", options.program, stdout.len());
    Ok(stdout)
}

/// Run qstat once and decode the report
pub async fn fetch_job_info(options: &QstatOptions) -> Result<JobInfo> {
    let xml = run_qstat(options).await?;
    JobInfo::from_xml(&xml)
}
