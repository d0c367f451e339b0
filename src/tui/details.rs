use crate::model::{PipelineRun, RunStage};
use crate::registry;
use crate::tui::theme;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

/// Render the run details dialog as a centered overlay. Stateless: the
/// caller decides visibility and always passes a concrete run, so there is
/// no half-open state to represent here.
pub fn render(frame: &mut Frame, area: Rect, run: &PipelineRun) {
    let popup = centered_rect(52, 64, area);
    frame.render_widget(Clear, popup);

    let block = theme::styled_block("Run Details", true);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let kv = |label: &str, value: String| -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{label:<12}"),
                Style::default().fg(theme::TEXT_MUTED),
            ),
            Span::styled(value, Style::default().fg(theme::TEXT_PRIMARY)),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", run.label),
            Style::default()
                .fg(theme::TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  run {}", run.id),
            Style::default().fg(theme::TEXT_MUTED),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Stage       ", Style::default().fg(theme::TEXT_MUTED)),
            Span::styled(
                run.stage.to_string(),
                Style::default().fg(theme::stage_color(run.stage)),
            ),
            Span::raw("  "),
            Span::styled(progress_dots(run.stage), Style::default().fg(theme::ACCENT)),
        ]),
        kv("Priority", run.priority.as_str().to_string()),
        kv("Channel", run.channel.clone()),
        kv("Created", crate::model::short_timestamp(run.created_at)),
        Line::from(""),
        kv("Contacts", run.metrics.contacts.to_string()),
        kv("Replies", run.metrics.replies.to_string()),
        kv("Meetings", run.metrics.meetings_booked.to_string()),
    ];

    if run.metrics.contacts > 0 {
        let rate = (run.metrics.replies as f64 / run.metrics.contacts as f64) * 100.0;
        lines.push(kv("Reply rate", format!("{rate:.1}%")));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press Esc to close",
        Style::default().fg(theme::TEXT_MUTED),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Funnel position as filled/hollow dots, one per registry stage.
fn progress_dots(stage: RunStage) -> String {
    let total = registry::stages().len();
    match stage {
        RunStage::InStage(key) => {
            let reached = registry::ordinal(key) + 1;
            let mut dots = String::new();
            for i in 0..total {
                dots.push(if i < reached { '●' } else { '○' });
            }
            dots
        }
        RunStage::Completed => "●".repeat(total),
        RunStage::Failed => "✗".to_string(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StageKey;

    #[test]
    fn test_progress_dots_track_ordinal() {
        assert_eq!(progress_dots(RunStage::InStage(StageKey::LeadMagnet)), "●○○○");
        assert_eq!(progress_dots(RunStage::InStage(StageKey::Meeting)), "●●●●");
        assert_eq!(progress_dots(RunStage::Completed), "●●●●");
        assert_eq!(progress_dots(RunStage::Failed), "✗");
    }
}
