use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};

use gridview::gridengine::{GridError, Queue, StorageValue};

use crate::utils::format_bytes;

/// One row of the queue panel, resolved from a queue's resource report
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSummary {
    pub name: String,
    pub state: String,
    pub slots: String,
    pub processors: String,
    pub load: String,
    pub memory: String,
    pub swap: String,
}

impl QueueSummary {
    pub fn from_queue(queue: &Queue) -> Self {
        let resources = &queue.resources;

        let load = resources
            .load_short()
            .or_else(|_| resources.load_average())
            .map(|load| format!("{:.2}", load))
            .or_else(|e| match queue.load_avg {
                Some(load) => Ok(format!("{:.2}", load)),
                None => Err(e),
            });

        Self {
            name: queue.name.clone(),
            state: queue.state.clone().unwrap_or_default(),
            slots: format!("{}/{}", queue.slots_used, queue.slots_total),
            processors: cell_text(resources.num_processors().map(|n| n.to_string())),
            load: cell_text(load),
            memory: cell_text(used_of_total(resources.memory_used(), resources.total_memory())),
            swap: cell_text(used_of_total(resources.swap_used(), resources.total_swap())),
        }
    }
}

fn used_of_total(
    used: Result<StorageValue, GridError>,
    total: Result<StorageValue, GridError>,
) -> Result<String, GridError> {
    Ok(format!("{}/{}", format_bytes(used?.bytes), format_bytes(total?.bytes)))
}

/// Missing metrics show as `-`, malformed ones as `?`
fn cell_text(value: Result<String, GridError>) -> String {
    match value {
        Ok(text) => text,
        Err(GridError::ResourceNotFound { .. }) => "-".to_string(),
        Err(e) => {
            tracing::warn!("Unreadable queue metric: {}", e);
            "?".to_string()
        }
    }
}

/// Panel listing every queue instance in the snapshot
pub struct QueuesPanel {
    pub summaries: Vec<QueueSummary>,
}

impl QueuesPanel {
    pub fn new() -> Self {
        Self {
            summaries: Vec::new(),
        }
    }

    pub fn update_queues(&mut self, queues: &[Queue]) {
        self.summaries = queues.iter().map(QueueSummary::from_queue).collect();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            ["Queue", "State", "Slots", "CPUs", "Load", "Memory", "Swap"]
                .into_iter()
                .map(Cell::from),
        )
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        let rows = self.summaries.iter().map(|s| {
            let style = if s.state.contains(['a', 'u', 'E', 'd']) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(s.state.clone()),
                Cell::from(s.slots.clone()),
                Cell::from(s.processors.clone()),
                Cell::from(s.load.clone()),
                Cell::from(s.memory.clone()),
                Cell::from(s.swap.clone()),
            ])
            .style(style)
        });

        let table = Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Length(15),
                Constraint::Length(15),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Queues ({})", self.summaries.len())),
        );

        frame.render_widget(table, area);
    }
}
