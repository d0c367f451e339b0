use crate::model::PipelineRun;
use crate::tui::theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

/// Actions the history list can request from the page.
#[derive(Debug, PartialEq, Eq)]
pub enum HistoryAction {
    None,
    /// The operator activated a row (index into the most-recent-first view).
    OpenRun(usize),
}

/// The execution history list: every run in the store, most recent first,
/// deliberately untouched by the stage filter. Holds only its row cursor.
pub struct HistoryPane {
    pub list_state: ListState,
}

impl HistoryPane {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state }
    }

    pub fn handle_key(&mut self, key: KeyEvent, len: usize) -> HistoryAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-1, len);
                HistoryAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(1, len);
                HistoryAction::None
            }
            KeyCode::Char('g') => {
                self.list_state.select(Some(0));
                HistoryAction::None
            }
            KeyCode::Char('G') => {
                if len > 0 {
                    self.list_state.select(Some(len - 1));
                }
                HistoryAction::None
            }
            KeyCode::Enter => match self.list_state.selected() {
                Some(idx) if idx < len => HistoryAction::OpenRun(idx),
                _ => HistoryAction::None,
            },
            _ => HistoryAction::None,
        }
    }

    fn move_cursor(&mut self, delta: i32, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, len as i32 - 1) as usize;
        self.list_state.select(Some(next));
    }

    /// Render the list. `ordered` must already be most-recent-first; the
    /// pane does not reorder.
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        ordered: &[&PipelineRun],
        focused: bool,
    ) {
        match self.list_state.selected() {
            Some(idx) if !ordered.is_empty() => {
                self.list_state.select(Some(idx.min(ordered.len() - 1)));
            }
            _ if !ordered.is_empty() => self.list_state.select(Some(0)),
            _ => self.list_state.select(None),
        }

        let block = theme::styled_block("Execution History", focused);
        if ordered.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No runs yet. Press n to launch one.",
                Style::default().fg(theme::TEXT_MUTED),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = ordered
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", crate::model::short_timestamp(r.created_at)),
                        Style::default().fg(theme::TEXT_MUTED),
                    ),
                    Span::styled(
                        format!("{:<22} ", truncate(&r.label, 21)),
                        Style::default().fg(theme::TEXT_PRIMARY),
                    ),
                    Span::styled(
                        r.stage.to_string(),
                        Style::default().fg(theme::stage_color(r.stage)),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn make_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_navigation_clamps() {
        let mut pane = HistoryPane::new();
        assert_eq!(pane.list_state.selected(), Some(0));

        pane.handle_key(make_key(KeyCode::Up), 4);
        assert_eq!(pane.list_state.selected(), Some(0));

        pane.handle_key(make_key(KeyCode::Char('j')), 4);
        pane.handle_key(make_key(KeyCode::Char('j')), 4);
        assert_eq!(pane.list_state.selected(), Some(2));

        pane.handle_key(make_key(KeyCode::Char('G')), 4);
        assert_eq!(pane.list_state.selected(), Some(3));
        pane.handle_key(make_key(KeyCode::Down), 4);
        assert_eq!(pane.list_state.selected(), Some(3));
    }

    #[test]
    fn test_enter_opens_row_under_cursor() {
        let mut pane = HistoryPane::new();
        pane.handle_key(make_key(KeyCode::Down), 3);
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Enter), 3),
            HistoryAction::OpenRun(1)
        );
    }

    #[test]
    fn test_enter_on_empty_history_is_noop() {
        let mut pane = HistoryPane::new();
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Enter), 0),
            HistoryAction::None
        );
    }
}
