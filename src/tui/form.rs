use crate::model::{NewRunInput, PipelineRun, ValidationError};
use crate::tui::theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

const FIELDS: &[(&str, &str)] = &[
    ("name", "required"),
    ("priority", "normal | high"),
    ("channel", "default: email"),
];

/// Actions the new-run form can request from the page.
#[derive(Debug)]
pub enum FormAction {
    None,
    /// Validation passed; the run is ready to be created.
    Launch(PipelineRun),
    /// The operator dismissed the form.
    Cancel,
}

/// Overlay for launching a new pipeline run. Validation failures stay
/// inside the form as field messages and never reach the page controller.
pub struct NewRunForm {
    values: Vec<String>,
    selected: usize,
    editing: bool,
    cursor: usize,
    error: Option<ValidationError>,
}

impl NewRunForm {
    pub fn new() -> Self {
        Self {
            values: vec![String::new(); FIELDS.len()],
            selected: 0,
            editing: true,
            cursor: 0,
            error: None,
        }
    }

    fn input(&self) -> NewRunInput {
        NewRunInput {
            name: self.values[0].clone(),
            priority: self.values[1].clone(),
            channel: self.values[2].clone(),
        }
    }

    /// Handle a key event. Returns the resulting action.
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if self.editing {
            return self.handle_edit_key(key);
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => FormAction::Cancel,
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                FormAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < FIELDS.len() {
                    self.selected += 1;
                }
                FormAction::None
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::CONTROL) => self.submit(),
            KeyCode::Enter | KeyCode::Char('e') => {
                self.editing = true;
                self.cursor = self.values[self.selected].chars().count();
                FormAction::None
            }
            KeyCode::Char('r') => self.submit(),
            _ => FormAction::None,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.editing = false;
                self.submit()
            }
            KeyCode::Esc | KeyCode::Enter => {
                self.editing = false;
                FormAction::None
            }
            KeyCode::Tab => {
                // Jump straight to the next field while editing.
                self.selected = (self.selected + 1) % FIELDS.len();
                self.cursor = self.values[self.selected].chars().count();
                FormAction::None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                FormAction::None
            }
            KeyCode::Right => {
                let len = self.values[self.selected].chars().count();
                if self.cursor < len {
                    self.cursor += 1;
                }
                FormAction::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                FormAction::None
            }
            KeyCode::End => {
                self.cursor = self.values[self.selected].chars().count();
                FormAction::None
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let value = &mut self.values[self.selected];
                    let byte_idx = char_to_byte(value, self.cursor - 1);
                    value.remove(byte_idx);
                    self.cursor -= 1;
                }
                FormAction::None
            }
            KeyCode::Delete => {
                let value = &mut self.values[self.selected];
                if self.cursor < value.chars().count() {
                    let byte_idx = char_to_byte(value, self.cursor);
                    value.remove(byte_idx);
                }
                FormAction::None
            }
            KeyCode::Char(c) => {
                let value = &mut self.values[self.selected];
                let byte_idx = char_to_byte(value, self.cursor);
                value.insert(byte_idx, c);
                self.cursor += 1;
                FormAction::None
            }
            _ => FormAction::None,
        }
    }

    fn submit(&mut self) -> FormAction {
        match self.input().submit() {
            Ok(run) => {
                self.error = None;
                FormAction::Launch(run)
            }
            Err(err) => {
                self.error = Some(err);
                FormAction::None
            }
        }
    }

    /// Render the form as a centered overlay.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(46, 60, area);
        frame.render_widget(Clear, popup);

        let block = theme::styled_block("Launch Run", true);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines = vec![Line::from("")];
        for (i, ((label, hint), value)) in FIELDS.iter().zip(self.values.iter()).enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { "> " } else { "  " };
            let label_style = if is_selected {
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_SECONDARY)
            };

            lines.push(Line::from(vec![
                Span::styled(indicator, Style::default().fg(theme::ACCENT)),
                Span::styled(*label, label_style),
                Span::styled(
                    format!("  ({hint})"),
                    Style::default().fg(theme::TEXT_MUTED),
                ),
            ]));

            if is_selected && self.editing {
                let chars: Vec<char> = value.chars().collect();
                let split = self.cursor.min(chars.len());
                let before: String = chars[..split].iter().collect();
                let after: String = chars[split..].iter().collect();
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(before, Style::default().fg(theme::TEXT_PRIMARY)),
                    Span::styled(
                        "│",
                        Style::default()
                            .fg(theme::WARNING)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(after, Style::default().fg(theme::TEXT_PRIMARY)),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(value.clone(), Style::default().fg(theme::TEXT_PRIMARY)),
                ]));
            }

            if let Some(msg) = self
                .error
                .as_ref()
                .and_then(|e| e.message_for(FIELDS[i].0))
            {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(msg, Style::default().fg(theme::ERROR)),
                ]));
            }
            lines.push(Line::from(""));
        }

        lines.push(Line::from(vec![
            Span::styled("  [r]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Launch  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[Enter]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Edit field  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[Esc]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Cancel", Style::default().fg(theme::TEXT_SECONDARY)),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    use ratatui::layout::{Constraint, Flex, Layout};
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
