use crate::model::{Priority, RunStage};
use ratatui::{
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Padding},
};

// ── Color palette ──────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(125, 200, 255);
pub const SUCCESS: Color = Color::Rgb(130, 215, 130);
pub const ERROR: Color = Color::Rgb(235, 105, 105);
pub const WARNING: Color = Color::Rgb(235, 195, 90);

pub const TEXT_PRIMARY: Color = Color::Rgb(225, 225, 232);
pub const TEXT_SECONDARY: Color = Color::Rgb(150, 150, 168);
pub const TEXT_MUTED: Color = Color::Rgb(95, 95, 115);

pub const BORDER: Color = Color::Rgb(62, 62, 82);
pub const BORDER_FOCUS: Color = ACCENT;

// ── Helpers ────────────────────────────────────────────────────────────

/// Themed block with rounded borders and focus-dependent border color.
pub fn styled_block(title: &str, focused: bool) -> Block<'_> {
    let border_color = if focused { BORDER_FOCUS } else { BORDER };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .padding(Padding::new(1, 1, 0, 0));
    if !title.is_empty() {
        block = block
            .title(format!(" {title} "))
            .title_style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD));
    }
    block
}

/// Display color for where a run sits in the funnel.
pub fn stage_color(stage: RunStage) -> Color {
    match stage {
        RunStage::InStage(_) => ACCENT,
        RunStage::Completed => SUCCESS,
        RunStage::Failed => ERROR,
    }
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Normal => Style::default().fg(TEXT_SECONDARY),
        Priority::High => Style::default().fg(WARNING).add_modifier(Modifier::BOLD),
    }
}
