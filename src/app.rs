use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

use gridview::gridengine::{
    self, JobInfo, JobInfoSource, JobList, SnapshotFile, does_job_contain_task_range,
    extrapolate_tasks_to_jobs,
    qstat::{self, QstatOptions},
};

use crate::{
    ui::{
        columns::JobColumn,
        filter::{FilterAction, FilterOptions, FilterPopup},
        jobslist::JobsList,
        layout::{centered_popup_area, draw_footer, draw_header, draw_main_layout},
        queues::QueuesPanel,
    },
    utils::{
        event::{Event as AppEvent, EventConfig, EventHandler},
        format_timestamp,
    },
};

/// Where a snapshot comes from
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    /// A saved `qstat -xml` report
    File(SnapshotFile),
    /// A one-shot qstat invocation
    Qstat(QstatOptions),
}

impl SnapshotSource {
    /// Read and decode one snapshot
    pub fn load(&self, runtime: &Runtime) -> gridengine::Result<JobInfo> {
        match self {
            SnapshotSource::File(file) => file.job_info(),
            SnapshotSource::Qstat(options) => runtime.block_on(qstat::fetch_job_info(options)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SnapshotSource::File(file) => file.path().display().to_string(),
            SnapshotSource::Qstat(options) => {
                format!("{} {}", options.program, options.to_args().join(" "))
            }
        }
    }
}

/// Expand every range-bearing job; a job whose range cannot be expanded is kept as is
pub fn expand_jobs(jobs: &JobList) -> (JobList, usize) {
    let mut expanded = JobList::default();
    let mut failures = 0;

    for job in jobs {
        if !does_job_contain_task_range(job) {
            expanded.push(job.clone());
            continue;
        }
        match extrapolate_tasks_to_jobs(job) {
            Ok(tasks) => expanded.extend(tasks),
            Err(e) => {
                tracing::warn!("Keeping job {} unexpanded: {}", job.job_number, e);
                failures += 1;
                expanded.push(job.clone());
            }
        }
    }

    (expanded, failures)
}

/// Application state and logic
pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Jobs list widget
    pub jobs_list: JobsList,
    /// Queue instances panel
    pub queues_panel: QueuesPanel,
    /// Snapshot source, re-read on reload
    pub source: SnapshotSource,
    /// Tokio runtime for the qstat invocation
    pub runtime: Runtime,
    /// Last decoded snapshot
    pub snapshot: JobInfo,
    /// When the snapshot was loaded
    pub loaded_at: Option<DateTime<Local>>,
    /// Show one row per array task instead of compressed ranges
    pub expand_tasks: bool,
    /// Active job filters
    pub filter: FilterOptions,
    /// Is the filter popup visible?
    pub show_filter_popup: bool,
    /// Filter popup state
    pub filter_popup: FilterPopup,
    /// Is the job detail popup visible?
    pub show_job_detail: bool,
    /// Status message to display in the header
    pub status_message: String,
    /// Status message display timeout
    pub status_timeout: Option<Instant>,
    /// Columns shown in the jobs table
    pub selected_columns: Vec<JobColumn>,
}

impl App {
    /// Create a new application instance
    pub fn new(source: SnapshotSource, expand_tasks: bool) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            running: true,
            jobs_list: JobsList::new(),
            queues_panel: QueuesPanel::new(),
            source,
            runtime,
            snapshot: JobInfo::default(),
            loaded_at: None,
            expand_tasks,
            filter: FilterOptions::default(),
            show_filter_popup: false,
            filter_popup: FilterPopup::new(),
            show_job_detail: false,
            status_message: String::new(),
            status_timeout: None,
            selected_columns: JobColumn::all(),
        })
    }

    /// Run the application's main loop
    pub fn run<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) -> Result<()> {
        let event_handler = EventHandler::new(EventConfig::default());

        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            match event_handler.rx.recv()? {
                AppEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    self.handle_key_event(key)
                }
                AppEvent::Key(_) | AppEvent::Resize(_, _) | AppEvent::Tick => {}
            }
        }

        Ok(())
    }

    /// Read the snapshot source again and rebuild the views
    pub fn reload(&mut self) -> Result<()> {
        let snapshot = self.source.load(&self.runtime)?;
        self.snapshot = snapshot;
        self.loaded_at = Some(Local::now());
        self.rebuild_jobs();
        Ok(())
    }

    /// Recompute the displayed jobs from the current snapshot
    pub fn rebuild_jobs(&mut self) {
        let mut jobs = self.snapshot.get_jobs();
        let total = jobs.len();

        if self.expand_tasks {
            let (expanded, failures) = expand_jobs(&jobs);
            if failures > 0 {
                self.set_status_message(
                    format!("{} task ranges could not be expanded", failures),
                    5,
                );
            }
            jobs = expanded;
        }

        let filtered = self.filter.apply(&jobs);
        if filtered.len() != jobs.len() {
            self.set_status_message(
                format!(
                    "Filtered: {}/{} rows ({} jobs in snapshot)",
                    filtered.len(),
                    jobs.len(),
                    total
                ),
                3,
            );
        }

        self.queues_panel.update_queues(self.snapshot.queues());
        self.jobs_list.update_jobs(filtered);
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let areas = draw_main_layout(frame);

        draw_header(frame, areas.header, &self.source.describe(), &self.status_text());
        self.jobs_list
            .render(frame, areas.jobs, &self.selected_columns);
        self.queues_panel.render(frame, areas.queues);
        draw_footer(frame, areas.footer);

        if self.show_filter_popup {
            let popup_area = centered_popup_area(frame.area(), 60, 70);
            self.filter_popup.render(frame, popup_area);
        }

        if self.show_job_detail {
            let popup_area = centered_popup_area(frame.area(), 70, 60);
            self.render_job_detail(frame, popup_area);
        }
    }

    /// Render job detail popup
    fn render_job_detail(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let Some(job) = self.jobs_list.selected_job() else {
            let empty = Paragraph::new("No job selected")
                .block(Block::default().title("Job Details").borders(Borders::ALL));
            frame.render_widget(empty, area);
            return;
        };

        let detail_text = format!(
            "Job ID: {}\n\
             Name: {}\n\
             Owner: {}\n\
             State: {} ({}, {})\n\
             Priority: {:.5}\n\
             Slots: {}\n\
             Submitted: {}\n\
             Started: {}\n\
             Tasks: {}",
            job.display_id(),
            job.name,
            job.owner,
            job.state,
            job.job_state(),
            job.state_attribute,
            job.priority,
            job.slots,
            format_timestamp(&job.submitted_time),
            format_timestamp(&job.start_time),
            job.tasks,
        );

        let job_detail = Paragraph::new(detail_text)
            .block(
                Block::default()
                    .title(format!("Job Details: {}", job.display_id()))
                    .borders(Borders::ALL),
            )
            .style(Style::default());

        frame.render_widget(job_detail, area);
    }

    fn status_text(&self) -> String {
        let show_status = self
            .status_timeout
            .is_some_and(|timeout| Instant::now() < timeout);

        if show_status {
            return self.status_message.clone();
        }

        let loaded = self
            .loaded_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "not loaded".to_string());
        let filter_desc = self.filter.describe();
        let expansion = if self.expand_tasks { ", tasks expanded" } else { "" };

        if filter_desc.is_empty() {
            format!("Snapshot {}{}", loaded, expansion)
        } else {
            format!("Snapshot {}{} | Filters: {}", loaded, expansion, filter_desc)
        }
    }

    /// Handle key events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_filter_popup {
            match self.filter_popup.handle_key(key) {
                FilterAction::Close => self.show_filter_popup = false,
                FilterAction::Apply => {
                    self.show_filter_popup = false;
                    self.filter = self.filter_popup.options();
                    self.rebuild_jobs();
                }
                FilterAction::None => {}
            }
            return;
        }

        if self.show_job_detail {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_job_detail = false;
            }
            return;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Char('q'))
            | (_, KeyCode::Esc)
            | (KeyModifiers::CONTROL, KeyCode::Char('c')) => self.quit(),

            (_, KeyCode::Up) => self.jobs_list.previous(),
            (_, KeyCode::Down) => self.jobs_list.next(),

            (_, KeyCode::Enter) => {
                if self.jobs_list.selected_job().is_some() {
                    self.show_job_detail = true;
                }
            }

            (_, KeyCode::Char('f')) => {
                self.filter_popup.initialize(&self.filter);
                self.show_filter_popup = true;
            }

            (_, KeyCode::Char('s')) => {
                self.jobs_list.sort.next_column(&self.selected_columns);
                self.jobs_list.sort_jobs();
            }

            (_, KeyCode::Char('o')) => {
                let column = self.jobs_list.sort.column;
                self.jobs_list.sort_by(column);
            }

            (_, KeyCode::Char('e')) => {
                self.expand_tasks = !self.expand_tasks;
                self.rebuild_jobs();
            }

            (_, KeyCode::Char('r')) => match self.reload() {
                Ok(()) => self.set_status_message("Snapshot reloaded".to_string(), 3),
                Err(e) => self.set_status_message(format!("Failed to reload: {}", e), 5),
            },

            _ => {}
        }
    }

    /// Set a temporary status message
    pub fn set_status_message(&mut self, message: String, duration_secs: u64) {
        self.status_message = message;
        self.status_timeout = Some(Instant::now() + Duration::from_secs(duration_secs));
    }

    /// Set running to false to quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }
}
