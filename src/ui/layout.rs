use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};

/// Areas of the main screen
pub struct MainAreas {
    pub header: Rect,
    pub jobs: Rect,
    pub queues: Rect,
    pub footer: Rect,
}

/// Defines the main layout of the application
pub fn draw_main_layout(frame: &mut Frame) -> MainAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header area
            Constraint::Min(10),   // Main content area
            Constraint::Length(3), // Footer area
        ])
        .split(frame.area());

    // Split the main content area
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Job list
            Constraint::Percentage(35), // Queue instances
        ])
        .split(chunks[1]);

    MainAreas {
        header: chunks[0],
        jobs: main_chunks[0],
        queues: main_chunks[1],
        footer: chunks[2],
    }
}

/// Draws the application header with the snapshot status
pub fn draw_header(frame: &mut Frame, area: Rect, source: &str, status: &str) {
    let header = Paragraph::new(Text::from(vec![Line::from(vec![
        Span::styled("GRIDVIEW", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" - "),
        Span::styled(source.to_string(), Style::default().fg(Color::White)),
        Span::raw(" | "),
        Span::styled(status.to_string(), Style::default().fg(Color::Gray)),
    ])]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

/// Draws the application footer with help text
pub fn draw_footer(frame: &mut Frame, area: Rect) {
    let keys = [
        ("q", "Quit"),
        ("↑/↓", "Navigate"),
        ("Enter", "Details"),
        ("f", "Filter"),
        ("s", "Sort Column"),
        ("o", "Sort Order"),
        ("e", "Expand Tasks"),
        ("r", "Reload"),
    ];

    let mut footer_text = Vec::new();
    for (i, (key, action)) in keys.iter().enumerate() {
        if i > 0 {
            footer_text.push(Span::raw(" | "));
        }
        footer_text.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        footer_text.push(Span::raw(format!(": {}", action)));
    }

    let footer =
        Paragraph::new(Line::from(footer_text)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

/// Creates a popup area in the center of the screen
pub fn centered_popup_area(frame_size: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(frame_size);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
