use crate::store::LoadError;
use crate::tui::theme;
use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Shape descriptor for the loading skeleton: how many stat-card slots to
/// sketch across the top and how many shimmer rows below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonSpec {
    pub stat_cards: usize,
    pub rows: usize,
}

/// Render a generic loading skeleton matching the page's eventual shape.
pub fn render_loading(frame: &mut Frame, area: Rect, spec: SkeletonSpec) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    if spec.stat_cards > 0 {
        let constraints: Vec<Constraint> = (0..spec.stat_cards)
            .map(|_| Constraint::Ratio(1, spec.stat_cards as u32))
            .collect();
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(chunks[0]);
        for card in cards.iter() {
            let shimmer = Paragraph::new(Line::from(Span::styled(
                "░░░░░░",
                Style::default().fg(theme::TEXT_MUTED),
            )))
            .block(theme::styled_block("", false));
            frame.render_widget(shimmer, *card);
        }
    }

    let mut lines = vec![Line::from("")];
    for _ in 0..spec.rows {
        lines.push(Line::from(Span::styled(
            "  ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
            Style::default().fg(theme::TEXT_MUTED),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Loading runs…",
        Style::default().fg(theme::TEXT_SECONDARY),
    )));
    let body = Paragraph::new(lines).block(theme::styled_block("", false));
    frame.render_widget(body, chunks[1]);
}

/// Render the load-failure pane: human-readable message, correlation
/// digest, and the retry affordance. The page state does not survive a
/// retry; it reinitializes from whatever the reload returns.
pub fn render_error(frame: &mut Frame, area: Rect, error: &LoadError) {
    let popup = centered_rect(60, 40, area);
    let block = theme::styled_block("Something went wrong", false);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", error.message),
            Style::default().fg(theme::ERROR),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  digest: ", Style::default().fg(theme::TEXT_MUTED)),
            Span::styled(
                error.digest.clone(),
                Style::default().fg(theme::TEXT_SECONDARY),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  [r]",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Try again  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Quit", Style::default().fg(theme::TEXT_SECONDARY)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
