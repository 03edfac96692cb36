use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use regex::Regex;

use gridview::gridengine::{JobList, JobState, filters};

/// Filters applied to the snapshot's job list before display
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub owner: Option<String>,
    pub name_filter: Option<String>,
    pub states: Vec<JobState>,
}

impl FilterOptions {
    /// Narrow `jobs` down; an invalid name regex is ignored
    pub fn apply(&self, jobs: &JobList) -> JobList {
        let mut filtered = jobs.clone();

        if let Some(owner) = &self.owner {
            filtered = filtered.filter(filters::owner_is(owner));
        }

        if let Some(pattern) = &self.name_filter {
            match Regex::new(pattern) {
                Ok(re) => filtered = filtered.filter(filters::name_matches(re)),
                Err(e) => tracing::warn!("Ignoring invalid name filter {:?}: {}", pattern, e),
            }
        }

        if !self.states.is_empty() {
            filtered = filtered.filter(|job| self.states.contains(&job.job_state()));
        }

        filtered
    }

    /// Human-readable description of the active filters
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if let Some(owner) = &self.owner {
            parts.push(format!("owner={}", owner));
        }

        if let Some(name) = &self.name_filter {
            parts.push(format!("name_regex={}", name));
        }

        if !self.states.is_empty() {
            let states = self
                .states
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("state={}", states));
        }

        parts.join(", ")
    }
}

/// Which field is currently focused in the filter popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFocus {
    Owner,
    NameFilter,
    States,
}

impl FilterFocus {
    fn next(self) -> Self {
        match self {
            FilterFocus::Owner => FilterFocus::NameFilter,
            FilterFocus::NameFilter => FilterFocus::States,
            FilterFocus::States => FilterFocus::Owner,
        }
    }

    fn previous(self) -> Self {
        match self {
            FilterFocus::Owner => FilterFocus::States,
            FilterFocus::NameFilter => FilterFocus::Owner,
            FilterFocus::States => FilterFocus::NameFilter,
        }
    }
}

/// Action to take after handling a key in the filter popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Do nothing
    None,
    /// Close the filter popup without applying changes
    Close,
    /// Apply the filter changes and close the popup
    Apply,
}

/// Filter popup state
pub struct FilterPopup {
    /// Owner filter being edited
    pub owner: String,
    /// Job name regex being edited
    pub name_filter: String,
    /// Whether the name regex is valid
    pub name_regex_valid: Option<bool>,
    /// States being edited
    pub states: Vec<JobState>,
    /// Input mode - is the user typing?
    pub input_mode: bool,
    pub focus: FilterFocus,
    pub state_list_state: ListState,
}

impl FilterPopup {
    pub fn new() -> Self {
        let mut state_list_state = ListState::default();
        state_list_state.select(Some(0));

        Self {
            owner: String::new(),
            name_filter: String::new(),
            name_regex_valid: None,
            states: Vec::new(),
            input_mode: false,
            focus: FilterFocus::Owner,
            state_list_state,
        }
    }

    /// Initialize filter popup with current options
    pub fn initialize(&mut self, options: &FilterOptions) {
        self.owner = options.owner.clone().unwrap_or_default();
        self.name_filter = options.name_filter.clone().unwrap_or_default();
        self.states = options.states.clone();
        self.input_mode = false;
        self.validate_name_regex();
    }

    /// The options as edited so far
    pub fn options(&self) -> FilterOptions {
        FilterOptions {
            owner: Some(self.owner.trim().to_string()).filter(|o| !o.is_empty()),
            name_filter: Some(self.name_filter.clone())
                .filter(|n| !n.is_empty() && self.name_regex_valid == Some(true)),
            states: self.states.clone(),
        }
    }

    fn validate_name_regex(&mut self) {
        self.name_regex_valid = if self.name_filter.is_empty() {
            None
        } else {
            Some(Regex::new(&self.name_filter).is_ok())
        };
    }

    /// Render the filter popup
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(Line::from("Filter Jobs").centered())
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Black));
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Owner
                Constraint::Length(3), // Name regex
                Constraint::Min(5),    // States
                Constraint::Length(3), // Help text
            ])
            .split(area);

        let focused = |focus: FilterFocus| {
            if self.focus == focus {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            }
        };

        let owner = Paragraph::new(self.owner.as_str()).block(
            Block::default()
                .title(if self.input_mode && self.focus == FilterFocus::Owner {
                    "Owner (editing)"
                } else {
                    "Owner"
                })
                .borders(Borders::ALL)
                .border_style(focused(FilterFocus::Owner)),
        );
        frame.render_widget(owner, chunks[0]);

        let name_style = match self.name_regex_valid {
            Some(false) => Style::default().fg(Color::Red),
            _ => Style::default(),
        };
        let name = Paragraph::new(self.name_filter.as_str())
            .style(name_style)
            .block(
                Block::default()
                    .title(if self.input_mode && self.focus == FilterFocus::NameFilter {
                        "Name regex (editing)"
                    } else {
                        "Name regex"
                    })
                    .borders(Borders::ALL)
                    .border_style(focused(FilterFocus::NameFilter)),
            );
        frame.render_widget(name, chunks[1]);

        let items: Vec<ListItem> = JobState::all()
            .iter()
            .map(|state| {
                let mark = if self.states.contains(state) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {}", mark, state))
            })
            .collect();
        let states = List::new(items)
            .block(
                Block::default()
                    .title("States")
                    .borders(Borders::ALL)
                    .border_style(focused(FilterFocus::States)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_stateful_widget(states, chunks[2], &mut self.state_list_state);

        let help = Paragraph::new(
            "←/→: Switch Field | Enter: Edit/Toggle | Ctrl+a: Apply | Esc: Close",
        )
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);
    }

    /// Handle key events for the filter popup
    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc if self.input_mode => {
                self.input_mode = false;
                return FilterAction::None;
            }
            KeyCode::Esc => return FilterAction::Close,
            KeyCode::F(10) => return FilterAction::Apply,
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return FilterAction::Apply;
            }
            _ => {}
        }

        if self.input_mode {
            self.handle_input_mode(key);
            return FilterAction::None;
        }

        let state_count = JobState::all().len();
        match key.code {
            KeyCode::Enter => match self.focus {
                FilterFocus::Owner | FilterFocus::NameFilter => self.input_mode = true,
                FilterFocus::States => {
                    if let Some(state) = self
                        .state_list_state
                        .selected()
                        .and_then(|idx| JobState::all().get(idx).copied())
                    {
                        if self.states.contains(&state) {
                            self.states.retain(|s| *s != state);
                        } else {
                            self.states.push(state);
                        }
                    }
                }
            },
            KeyCode::Up if self.focus == FilterFocus::States => {
                let selected = self.state_list_state.selected().unwrap_or(0);
                self.state_list_state
                    .select(Some((selected + state_count - 1) % state_count));
            }
            KeyCode::Down if self.focus == FilterFocus::States => {
                let selected = self.state_list_state.selected().unwrap_or(0);
                self.state_list_state.select(Some((selected + 1) % state_count));
            }
            KeyCode::Left => self.focus = self.focus.previous(),
            KeyCode::Right | KeyCode::Tab => self.focus = self.focus.next(),
            _ => {}
        }

        FilterAction::None
    }

    /// Handle input mode (text editing)
    fn handle_input_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Tab => self.input_mode = false,
            KeyCode::Char(c) => match self.focus {
                FilterFocus::Owner => self.owner.push(c),
                FilterFocus::NameFilter => {
                    self.name_filter.push(c);
                    self.validate_name_regex();
                }
                FilterFocus::States => {}
            },
            KeyCode::Backspace => match self.focus {
                FilterFocus::Owner => {
                    let _ = self.owner.pop();
                }
                FilterFocus::NameFilter => {
                    let _ = self.name_filter.pop();
                    self.validate_name_regex();
                }
                FilterFocus::States => {}
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview::gridengine::Job;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn jobs() -> JobList {
        let job = |number: i64, state: &str, owner: &str, name: &str| Job {
            job_number: number,
            state: state.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            ..Default::default()
        };
        JobList::new(vec![
            job(1, "r", "alice", "align_1"),
            job(2, "qw", "alice", "align_2"),
            job(3, "r", "bob", "align_3"),
            job(4, "r", "alice", "sort"),
            job(5, "Eqw", "alice", "align_5"),
        ])
    }

    #[test]
    fn test_apply_combines_filters() {
        let options = FilterOptions {
            owner: Some("alice".to_string()),
            name_filter: Some("^align".to_string()),
            states: vec![JobState::Running, JobState::Error],
        };
        let numbers: Vec<i64> = options.apply(&jobs()).iter().map(|j| j.job_number).collect();
        assert_eq!(numbers, vec![1, 5]);
        assert_eq!(
            options.describe(),
            "owner=alice, name_regex=^align, state=RUNNING,ERROR"
        );
    }

    #[test]
    fn test_apply_ignores_invalid_regex() {
        let options = FilterOptions {
            name_filter: Some("(".to_string()),
            ..Default::default()
        };
        assert_eq!(options.apply(&jobs()).len(), 5);
    }

    #[test]
    fn test_popup_edits_owner_and_states() {
        let mut popup = FilterPopup::new();
        popup.initialize(&FilterOptions::default());

        assert_eq!(popup.handle_key(press(KeyCode::Enter)), FilterAction::None);
        for c in "bob".chars() {
            popup.handle_key(press(KeyCode::Char(c)));
        }
        popup.handle_key(press(KeyCode::Enter));

        popup.handle_key(press(KeyCode::Left));
        assert_eq!(popup.focus, FilterFocus::States);
        popup.handle_key(press(KeyCode::Enter));

        let options = popup.options();
        assert_eq!(options.owner.as_deref(), Some("bob"));
        assert_eq!(options.states, vec![JobState::Running]);

        let apply = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(popup.handle_key(apply), FilterAction::Apply);
        assert_eq!(popup.handle_key(press(KeyCode::Esc)), FilterAction::Close);
    }

    #[test]
    fn test_invalid_regex_is_not_applied() {
        let mut popup = FilterPopup::new();
        popup.focus = FilterFocus::NameFilter;
        popup.handle_key(press(KeyCode::Enter));
        popup.handle_key(press(KeyCode::Char('[')));
        assert_eq!(popup.name_regex_valid, Some(false));
        assert_eq!(popup.options().name_filter, None);
    }
}
