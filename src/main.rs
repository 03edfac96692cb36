use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;
mod utils;

use app::{App, SnapshotSource, expand_jobs};
use gridview::gridengine::{JobList, SnapshotFile, filters, qstat::QstatOptions};
use ui::queues::QueueSummary;

#[derive(Debug, Parser)]
#[command(
    name = "gridview",
    author,
    version,
    about = "Inspect Grid Engine job and queue snapshots."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read a saved `qstat -xml` report instead of running qstat
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// qstat program to run
    #[arg(long, env = "GRIDVIEW_QSTAT", default_value = "qstat", global = true)]
    qstat: String,

    /// Only jobs of this user (`*` for everyone)
    #[arg(short, long, default_value = "*", global = true)]
    user: String,

    /// Restrict the report to one cluster queue
    #[arg(short, long, global = true)]
    queue: Option<String>,

    /// One row per array task instead of compressed ranges
    #[arg(short, long, global = true)]
    expand_tasks: bool,

    /// Append logs to this file (filter with GRIDVIEW_LOG)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the snapshot in a terminal UI (default)
    Tui,
    /// Print the job list as JSON
    Jobs {
        /// Only jobs owned by this user
        #[arg(long)]
        owner: Option<String>,
        /// Only jobs with this state code, e.g. `r` or `qw`
        #[arg(long)]
        state: Option<String>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print slots, load and memory per queue instance
    Hosts,
}

impl Cli {
    fn source(&self) -> SnapshotSource {
        match &self.file {
            Some(path) => SnapshotSource::File(SnapshotFile::new(path)),
            None => SnapshotSource::Qstat(QstatOptions {
                program: self.qstat.clone(),
                user: Some(self.user.clone()),
                queue: self.queue.clone(),
                ..Default::default()
            }),
        }
    }
}

fn init_tracing(log_file: Option<&PathBuf>, interactive: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_env("GRIDVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Anything written to the terminal would tear the TUI
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

fn run_tui(cli: &Cli) -> Result<()> {
    let mut app = App::new(cli.source(), cli.expand_tasks)?;
    app.reload()?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}

fn print_jobs(cli: &Cli, owner: Option<&str>, state: Option<&str>, pretty: bool) -> Result<()> {
    let runtime = Runtime::new()?;
    let snapshot = cli.source().load(&runtime)?;

    let mut jobs: JobList = snapshot.get_jobs();
    if cli.expand_tasks {
        let (expanded, failures) = expand_jobs(&jobs);
        if failures > 0 {
            tracing::warn!("{} task ranges could not be expanded", failures);
        }
        jobs = expanded;
    }
    if let Some(owner) = owner {
        jobs = jobs.filter(filters::owner_is(owner));
    }
    if let Some(state) = state {
        jobs = jobs.filter(filters::state_is(state));
    }

    let json = if pretty {
        serde_json::to_string_pretty(&jobs)?
    } else {
        serde_json::to_string(&jobs)?
    };
    println!("{}", json);
    Ok(())
}

fn print_hosts(cli: &Cli) -> Result<()> {
    let runtime = Runtime::new()?;
    let snapshot = cli.source().load(&runtime)?;

    println!(
        "{:<30} {:<6} {:>7} {:>5} {:>6} {:>15} {:>15}",
        "QUEUE", "STATE", "SLOTS", "CPUS", "LOAD", "MEMORY", "SWAP"
    );
    for queue in snapshot.queues() {
        let s = QueueSummary::from_queue(queue);
        println!(
            "{:<30} {:<6} {:>7} {:>5} {:>6} {:>15} {:>15}",
            s.name, s.state, s.slots, s.processors, s.load, s.memory, s.swap
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    init_tracing(cli.log_file.as_ref(), interactive)?;
    tracing::debug!("{:?}", cli);

    match &cli.command {
        None | Some(Commands::Tui) => run_tui(&cli),
        Some(Commands::Jobs {
            owner,
            state,
            pretty,
        }) => print_jobs(&cli, owner.as_deref(), state.as_deref(), *pretty),
        Some(Commands::Hosts) => print_hosts(&cli),
    }
}
