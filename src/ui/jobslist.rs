use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use gridview::gridengine::{Job, JobList, JobState};

use crate::ui::columns::{JobColumn, SortColumn};

/// Struct to manage the jobs list view
pub struct JobsList {
    pub state: TableState,
    pub jobs: JobList,
    pub sort: SortColumn,
}

impl JobsList {
    pub fn new() -> Self {
        Self {
            state: TableState::default(),
            jobs: JobList::default(),
            sort: SortColumn::default(),
        }
    }

    /// Update the list of jobs
    pub fn update_jobs(&mut self, jobs: JobList) {
        self.jobs = jobs;
        self.sort_jobs();

        // Reset selection if out of bounds
        if let Some(selected) = self.state.selected() {
            if selected >= self.jobs.len() {
                self.state.select(if self.jobs.is_empty() { None } else { Some(0) });
            }
        } else if !self.jobs.is_empty() {
            self.state.select(Some(0));
        }
    }

    /// Sort jobs based on current sort column and direction
    pub fn sort_jobs(&mut self) {
        let sort = self.sort;
        self.jobs.sort(|a, b| sort.less(a, b));
    }

    /// Change sort column, or flip the direction if it is already the sort column
    pub fn sort_by(&mut self, column: JobColumn) {
        if self.sort.column == column {
            self.sort.order = self.sort.order.toggle();
        } else {
            self.sort.column = column;
        }
        self.sort_jobs();
    }

    /// Navigate to next job
    pub fn next(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.jobs.len().saturating_sub(1) {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Navigate to previous job
    pub fn previous(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.jobs.len().saturating_sub(1)
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Draw the jobs list widget
    pub fn render(&mut self, frame: &mut Frame, area: Rect, columns: &[JobColumn]) {
        if self.jobs.is_empty() {
            let empty = Paragraph::new("No jobs in this snapshot.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Jobs").borders(Borders::ALL));
            frame.render_widget(empty, area);
            return;
        }

        let header_cells = columns.iter().map(|col| {
            if *col == self.sort.column {
                Cell::from(format!("{}{}", col.title(), self.sort.order.indicator())).style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Cell::from(col.title()).style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            }
        });

        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::DarkGray))
            .height(1);

        let rows = self.jobs.iter().map(|job| {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|col| Cell::from(col.content(job)))
                .collect();
            Row::new(cells)
                .style(Style::default().fg(state_color(job.job_state())))
                .height(1)
        });

        let constraints: Vec<Constraint> = columns.iter().map(|col| col.default_width()).collect();

        let table = Table::new(rows, constraints)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Jobs ({})", self.jobs.len())),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(" > ");

        frame.render_stateful_widget(table, area, &mut self.state);
    }

    /// Get the currently selected job, if any
    pub fn selected_job(&self) -> Option<&Job> {
        self.state.selected().and_then(|i| self.jobs.get(i))
    }
}

pub fn state_color(state: JobState) -> Color {
    match state {
        JobState::Running => Color::Green,
        JobState::Pending => Color::Yellow,
        JobState::Held => Color::Magenta,
        JobState::Error => Color::Red,
        JobState::Transferring => Color::Cyan,
        JobState::Suspended | JobState::Deleting => Color::Blue,
        JobState::Other => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::columns::SortOrder;

    fn jobs() -> JobList {
        [3, 1, 2]
            .into_iter()
            .map(|n| Job {
                job_number: n,
                owner: format!("user{}", 4 - n),
                ..Default::default()
            })
            .collect()
    }

    fn numbers(list: &JobsList) -> Vec<i64> {
        list.jobs.iter().map(|j| j.job_number).collect()
    }

    #[test]
    fn test_update_sorts_and_selects_first() {
        let mut list = JobsList::new();
        list.update_jobs(jobs());
        assert_eq!(numbers(&list), vec![1, 2, 3]);
        assert_eq!(list.selected_job().map(|j| j.job_number), Some(1));
    }

    #[test]
    fn test_sort_by_same_column_flips_order() {
        let mut list = JobsList::new();
        list.update_jobs(jobs());
        list.sort_by(JobColumn::Id);
        assert_eq!(list.sort.order, SortOrder::Descending);
        assert_eq!(numbers(&list), vec![3, 2, 1]);
        list.sort_by(JobColumn::Owner);
        assert_eq!(list.sort.order, SortOrder::Descending);
        assert_eq!(numbers(&list), vec![1, 2, 3]);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut list = JobsList::new();
        list.update_jobs(jobs());
        list.previous();
        assert_eq!(list.state.selected(), Some(2));
        list.next();
        assert_eq!(list.state.selected(), Some(0));
    }

    #[test]
    fn test_empty_update_clears_selection() {
        let mut list = JobsList::new();
        list.update_jobs(jobs());
        list.state.select(Some(2));
        list.update_jobs(JobList::default());
        assert_eq!(list.selected_job(), None);
    }
}
