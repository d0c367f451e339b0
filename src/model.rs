use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Identity of a funnel stage. Serialized in snake_case everywhere a stage
/// key appears on disk or in JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    LeadMagnet,
    Lead,
    FollowUp,
    Meeting,
}

/// Where a run currently sits: inside a funnel stage, or parked in one of
/// the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    InStage(StageKey),
    Completed,
    Failed,
}

impl RunStage {
    /// The stage key when the run is still moving through the funnel.
    pub fn key(self) -> Option<StageKey> {
        match self {
            RunStage::InStage(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Completed | RunStage::Failed)
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStage::InStage(key) => f.write_str(crate::registry::label(*key)),
            RunStage::Completed => f.write_str("Completed"),
            RunStage::Failed => f.write_str("Failed"),
        }
    }
}

/// Compact `2026-08-03 09:58` rendering of a run timestamp.
pub fn short_timestamp(ts: OffsetDateTime) -> String {
    let fmt = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    ts.format(&fmt).unwrap_or_else(|_| "-".to_string())
}

/// Operator-assigned priority for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Parse from the recognized-options table. Blank input falls back to
    /// the default; anything else is rejected.
    pub fn parse_option(s: &str) -> Option<Priority> {
        match s.trim() {
            "" | "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// Unique run identity, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a random collision-resistant id for a new run.
    pub fn generate() -> Self {
        let mut b = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut b);
        RunId(u64::from_le_bytes(b).to_string())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome counters attached to a run. Descriptive only; never mutated
/// after creation within this portal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    #[serde(default)]
    pub contacts: u32,
    #[serde(default)]
    pub replies: u32,
    #[serde(default)]
    pub meetings_booked: u32,
}

/// One execution of the outreach pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub label: String,
    #[serde(default)]
    pub priority: Priority,
    pub channel: String,
    pub stage: RunStage,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub metrics: RunMetrics,
}

/// All runs, most recent first by `created_at`. The sort is stable, so runs
/// sharing a timestamp keep their store (insertion) order.
pub fn most_recent_first(runs: &[PipelineRun]) -> Vec<&PipelineRun> {
    let mut sorted: Vec<&PipelineRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

/// A single rejected field from run-input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldIssue {
    #[error("name is required")]
    NameRequired,
    #[error("unrecognized priority \"{0}\" (expected normal or high)")]
    UnknownPriority(String),
}

impl FieldIssue {
    /// Which form field the issue belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            FieldIssue::NameRequired => "name",
            FieldIssue::UnknownPriority(_) => "priority",
        }
    }
}

/// Validation failure for a run-creation submission. Recovered locally by
/// the form; never reaches the page controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid run input: {}", .issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Message for one field, if that field was rejected.
    pub fn message_for(&self, field: &str) -> Option<String> {
        self.issues
            .iter()
            .find(|i| i.field() == field)
            .map(|i| i.to_string())
    }
}

/// Raw text captured by the new-run form, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewRunInput {
    pub name: String,
    pub priority: String,
    pub channel: String,
}

impl NewRunInput {
    /// Validate and build the run. This is the only place a run identity is
    /// manufactured: the id is freshly generated, the stage is the first
    /// registry stage, and `created_at` is now.
    pub fn submit(&self) -> Result<PipelineRun, ValidationError> {
        let mut issues = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            issues.push(FieldIssue::NameRequired);
        }

        let priority = match Priority::parse_option(&self.priority) {
            Some(p) => p,
            None => {
                issues.push(FieldIssue::UnknownPriority(self.priority.trim().to_string()));
                Priority::Normal
            }
        };

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        let channel = match self.channel.trim() {
            "" => "email".to_string(),
            c => c.to_string(),
        };

        Ok(PipelineRun {
            id: RunId::generate(),
            label: name.to_string(),
            priority,
            channel,
            stage: RunStage::InStage(crate::registry::first_key()),
            created_at: OffsetDateTime::now_utc(),
            metrics: RunMetrics::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn run(id: &str, offset_secs: i64) -> PipelineRun {
        PipelineRun {
            id: RunId(id.to_string()),
            label: format!("run {id}"),
            priority: Priority::Normal,
            channel: "email".to_string(),
            stage: RunStage::InStage(StageKey::Lead),
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(offset_secs),
            metrics: RunMetrics::default(),
        }
    }

    #[test]
    fn test_submit_minimal_input() {
        let input = NewRunInput {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let r = input.submit().unwrap();
        assert_eq!(r.label, "Acme");
        assert_eq!(r.priority, Priority::Normal);
        assert_eq!(r.channel, "email");
        assert_eq!(r.stage, RunStage::InStage(crate::registry::first_key()));
    }

    #[test]
    fn test_submit_missing_name() {
        let input = NewRunInput {
            name: "   ".to_string(),
            ..Default::default()
        };
        let err = input.submit().unwrap_err();
        assert_eq!(err.issues, vec![FieldIssue::NameRequired]);
        assert!(err.message_for("name").is_some());
        assert!(err.message_for("priority").is_none());
    }

    #[test]
    fn test_submit_unknown_priority() {
        let input = NewRunInput {
            name: "Acme".to_string(),
            priority: "urgent".to_string(),
            channel: String::new(),
        };
        let err = input.submit().unwrap_err();
        assert_eq!(
            err.issues,
            vec![FieldIssue::UnknownPriority("urgent".to_string())]
        );
    }

    #[test]
    fn test_submit_recognized_options() {
        let input = NewRunInput {
            name: "Acme".to_string(),
            priority: "high".to_string(),
            channel: "linkedin".to_string(),
        };
        let r = input.submit().unwrap();
        assert_eq!(r.priority, Priority::High);
        assert_eq!(r.channel, "linkedin");
    }

    #[test]
    fn test_submit_ids_are_unique() {
        let input = NewRunInput {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(input.submit().unwrap().id));
        }
    }

    #[test]
    fn test_most_recent_first_is_stable() {
        let runs = vec![run("a", 10), run("b", 30), run("c", 30), run("d", 20)];
        let ordered: Vec<&str> = most_recent_first(&runs)
            .iter()
            .map(|r| r.id.0.as_str())
            .collect();
        // b and c tie; store order between them is preserved.
        assert_eq!(ordered, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_short_timestamp_format() {
        use time::macros::datetime;
        assert_eq!(
            short_timestamp(datetime!(2026-08-03 09:58 UTC)),
            "2026-08-03 09:58"
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(RunStage::InStage(StageKey::FollowUp).to_string(), "Follow-up");
        assert_eq!(RunStage::Completed.to_string(), "Completed");
        assert_eq!(RunStage::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_terminal_stages_have_no_key() {
        assert_eq!(RunStage::Completed.key(), None);
        assert_eq!(RunStage::Failed.key(), None);
        assert_eq!(
            RunStage::InStage(StageKey::Meeting).key(),
            Some(StageKey::Meeting)
        );
        assert!(RunStage::Failed.is_terminal());
        assert!(!RunStage::InStage(StageKey::Lead).is_terminal());
    }
}
