use crate::filter::{self, StageFilter};
use crate::model::PipelineRun;
use crate::registry;
use crate::tui::theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

/// Actions the stage map can request from the page.
#[derive(Debug, PartialEq, Eq)]
pub enum FunnelAction {
    None,
    /// The operator moved the stage filter.
    FilterChanged(StageFilter),
    /// The operator activated a run badge (index into the filtered view).
    OpenRun(usize),
}

/// The visual stage map: a row of stage nodes showing full funnel totals,
/// with the runs of the filtered stage listed as badges underneath. Holds
/// only its own badge cursor; every shared concern is reported upward.
pub struct FunnelPane {
    pub list_state: ListState,
}

impl FunnelPane {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state }
    }

    /// Handle a key event. `filter` is the page's current stage filter and
    /// `visible_len` the size of the filtered badge list.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        filter: StageFilter,
        visible_len: usize,
    ) -> FunnelAction {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.emit_filter(filter, prev_filter(filter)),
            KeyCode::Right | KeyCode::Char('l') => self.emit_filter(filter, next_filter(filter)),
            KeyCode::Char('a') => self.emit_filter(filter, StageFilter::All),
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-1, visible_len);
                FunnelAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(1, visible_len);
                FunnelAction::None
            }
            KeyCode::Char('g') => {
                self.list_state.select(Some(0));
                FunnelAction::None
            }
            KeyCode::Char('G') => {
                if visible_len > 0 {
                    self.list_state.select(Some(visible_len - 1));
                }
                FunnelAction::None
            }
            KeyCode::Enter => match self.list_state.selected() {
                Some(idx) if idx < visible_len => FunnelAction::OpenRun(idx),
                _ => FunnelAction::None,
            },
            _ => FunnelAction::None,
        }
    }

    /// Re-activating the already-selected stage is a no-op, never a toggle.
    fn emit_filter(&mut self, current: StageFilter, next: StageFilter) -> FunnelAction {
        if next == current {
            return FunnelAction::None;
        }
        self.list_state.select(Some(0));
        FunnelAction::FilterChanged(next)
    }

    fn move_cursor(&mut self, delta: i32, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, len as i32 - 1) as usize;
        self.list_state.select(Some(next));
    }

    /// Render the stage-node strip. Counts are whole-store totals so the
    /// operator always sees the full funnel, whatever the filter.
    pub fn render_nodes(
        &self,
        frame: &mut Frame,
        area: Rect,
        runs: &[PipelineRun],
        filter: StageFilter,
    ) {
        let stages = registry::stages();
        let counts = filter::stage_counts(runs);

        let constraints: Vec<Constraint> = (0..stages.len() + 1)
            .map(|_| Constraint::Ratio(1, (stages.len() + 1) as u32))
            .collect();
        let nodes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        self.render_node(frame, nodes[0], "All", runs.len(), filter == StageFilter::All);
        for (i, stage) in stages.iter().enumerate() {
            self.render_node(
                frame,
                nodes[i + 1],
                stage.label,
                counts[i],
                filter == StageFilter::Only(stage.key),
            );
        }
    }

    fn render_node(&self, frame: &mut Frame, area: Rect, label: &str, count: usize, active: bool) {
        let block = theme::styled_block(label, active);
        let count_style = if active {
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::TEXT_PRIMARY)
        };
        let body = Paragraph::new(vec![Line::from(Span::styled(
            format!("{count} run{}", if count == 1 { "" } else { "s" }),
            count_style,
        ))])
        .block(block);
        frame.render_widget(body, area);
    }

    /// Render the badge list for the filtered view.
    pub fn render_badges(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        visible: &[&PipelineRun],
        focused: bool,
    ) {
        // Keep the cursor inside the filtered view as it shrinks.
        match self.list_state.selected() {
            Some(idx) if !visible.is_empty() => {
                self.list_state.select(Some(idx.min(visible.len() - 1)));
            }
            _ if !visible.is_empty() => self.list_state.select(Some(0)),
            _ => self.list_state.select(None),
        }

        let block = theme::styled_block("Stage Runs", focused);
        if visible.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No runs in this stage.",
                Style::default().fg(theme::TEXT_MUTED),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = visible
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<26} ", truncate(&r.label, 25)),
                        Style::default().fg(theme::TEXT_PRIMARY),
                    ),
                    Span::styled(r.priority.as_str(), theme::priority_style(r.priority)),
                    Span::styled(
                        format!("  {}", r.channel),
                        Style::default().fg(theme::TEXT_SECONDARY),
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

/// Next filter in `All → stage₀ → … → stageₙ` order; stays put at the end.
fn next_filter(filter: StageFilter) -> StageFilter {
    let stages = registry::stages();
    match filter {
        StageFilter::All => StageFilter::Only(stages[0].key),
        StageFilter::Only(key) => {
            let ord = registry::ordinal(key);
            match stages.get(ord + 1) {
                Some(next) => StageFilter::Only(next.key),
                None => filter,
            }
        }
    }
}

/// Previous filter; `All` is the left end.
fn prev_filter(filter: StageFilter) -> StageFilter {
    match filter {
        StageFilter::All => StageFilter::All,
        StageFilter::Only(key) => match registry::ordinal(key) {
            0 => StageFilter::All,
            ord => StageFilter::Only(registry::stages()[ord - 1].key),
        },
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
    use crate::model::StageKey;
    use crossterm::event::KeyModifiers;

    fn make_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_filter_cycles_right_through_registry_order() {
        let mut pane = FunnelPane::new();
        let mut filter = StageFilter::All;
        let mut seen = vec![filter];
        loop {
            match pane.handle_key(make_key(KeyCode::Right), filter, 0) {
                FunnelAction::FilterChanged(next) => {
                    filter = next;
                    seen.push(next);
                }
                FunnelAction::None => break,
                other => panic!("unexpected action {other:?}"),
            }
        }
        assert_eq!(
            seen,
            vec![
                StageFilter::All,
                StageFilter::Only(StageKey::LeadMagnet),
                StageFilter::Only(StageKey::Lead),
                StageFilter::Only(StageKey::FollowUp),
                StageFilter::Only(StageKey::Meeting),
            ]
        );
    }

    #[test]
    fn test_filter_clamps_at_both_ends() {
        let mut pane = FunnelPane::new();
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Left), StageFilter::All, 0),
            FunnelAction::None
        );
        assert_eq!(
            pane.handle_key(
                make_key(KeyCode::Right),
                StageFilter::Only(StageKey::Meeting),
                0
            ),
            FunnelAction::None
        );
    }

    #[test]
    fn test_left_from_first_stage_returns_to_all() {
        let mut pane = FunnelPane::new();
        assert_eq!(
            pane.handle_key(
                make_key(KeyCode::Left),
                StageFilter::Only(StageKey::LeadMagnet),
                0
            ),
            FunnelAction::FilterChanged(StageFilter::All)
        );
    }

    #[test]
    fn test_a_resets_to_all_and_is_noop_when_already_all() {
        let mut pane = FunnelPane::new();
        assert_eq!(
            pane.handle_key(
                make_key(KeyCode::Char('a')),
                StageFilter::Only(StageKey::Lead),
                0
            ),
            FunnelAction::FilterChanged(StageFilter::All)
        );
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Char('a')), StageFilter::All, 0),
            FunnelAction::None
        );
    }

    #[test]
    fn test_cursor_navigation_clamps() {
        let mut pane = FunnelPane::new();
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 3);
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 3);
        assert_eq!(pane.list_state.selected(), Some(2));
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 3);
        assert_eq!(pane.list_state.selected(), Some(2));
        pane.handle_key(make_key(KeyCode::Char('g')), StageFilter::All, 3);
        assert_eq!(pane.list_state.selected(), Some(0));
        pane.handle_key(make_key(KeyCode::Char('G')), StageFilter::All, 3);
        assert_eq!(pane.list_state.selected(), Some(2));
    }

    #[test]
    fn test_enter_opens_run_under_cursor() {
        let mut pane = FunnelPane::new();
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 3);
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Enter), StageFilter::All, 3),
            FunnelAction::OpenRun(1)
        );
    }

    #[test]
    fn test_enter_on_empty_view_is_noop() {
        let mut pane = FunnelPane::new();
        assert_eq!(
            pane.handle_key(make_key(KeyCode::Enter), StageFilter::All, 0),
            FunnelAction::None
        );
    }

    #[test]
    fn test_filter_change_resets_cursor() {
        let mut pane = FunnelPane::new();
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 5);
        pane.handle_key(make_key(KeyCode::Down), StageFilter::All, 5);
        assert_eq!(pane.list_state.selected(), Some(2));
        pane.handle_key(make_key(KeyCode::Right), StageFilter::All, 5);
        assert_eq!(pane.list_state.selected(), Some(0));
    }
}
