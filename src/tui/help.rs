use crate::tui::theme;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

/// Render the centered help overlay. Any key closes it.
pub fn render_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 64, area);
    frame.render_widget(Clear, popup);

    let block = theme::styled_block("Help", false);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = vec![
        Line::from(Span::styled(
            "  Keyboard Shortcuts",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        help_line("←/→, h/l", "Move the stage filter"),
        help_line("a", "Show all stages"),
        help_line("j/k, ↑/↓", "Move the run cursor"),
        help_line("Tab", "Switch between stage runs and history"),
        help_line("Enter", "Open details for the highlighted run"),
        help_line("n", "Launch a new run"),
        help_line("Esc", "Close the open dialog"),
        help_line("q", "Quit"),
        help_line("?", "Toggle this help"),
    ];

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press any key to close",
        Style::default().fg(theme::TEXT_MUTED),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{key:>12}"),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(desc),
    ])
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
