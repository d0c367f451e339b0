use crate::filter;
use crate::model::{most_recent_first, short_timestamp, PipelineRun};
use crate::registry;

/// Plain-text rendering of the funnel for `--text` mode and for builds
/// without the TUI feature.
pub struct TextSummary {
    pub lines: Vec<String>,
}

pub fn build_text_summary(runs: &[PipelineRun]) -> TextSummary {
    let counts = filter::stage_counts(runs);
    let (completed, failed) = filter::terminal_counts(runs);
    let mut lines = Vec::new();

    lines.push("Outreach funnel".to_string());
    for (stage, count) in registry::stages().iter().zip(counts.iter()) {
        lines.push(format!(
            "  {:<12} {:>4}  {}",
            stage.label,
            count,
            bar(*count)
        ));
    }
    lines.push(format!("  {:<12} {:>4}", "Completed", completed));
    lines.push(format!("  {:<12} {:>4}", "Failed", failed));

    let active = runs.iter().filter(|r| !r.stage.is_terminal()).count();
    lines.push(String::new());
    lines.push(format!("{active} active of {} total", runs.len()));

    lines.push(String::new());
    lines.push("Recent runs".to_string());
    let ordered = most_recent_first(runs);
    if ordered.is_empty() {
        lines.push("  (none)".to_string());
    }
    for run in ordered.iter().take(5) {
        lines.push(format!(
            "  {}  {:<26} {:<10} {} via {}",
            short_timestamp(run.created_at),
            run.label,
            run.stage,
            run.priority.as_str(),
            run.channel
        ));
    }

    TextSummary { lines }
}

/// Fixed-scale count bar, capped so wide stores stay on one line.
fn bar(count: usize) -> String {
    "#".repeat(count.min(40))
}
