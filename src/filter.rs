use crate::model::{PipelineRun, StageKey};
use crate::registry;

/// The active narrowing criterion for run views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageFilter {
    #[default]
    All,
    Only(StageKey),
}

impl StageFilter {
    pub fn matches(self, run: &PipelineRun) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Only(key) => run.stage.key() == Some(key),
        }
    }
}

/// Narrow `runs` to the filter. `All` is the identity; `Only(key)` keeps the
/// subsequence currently in that stage, relative order preserved. Matching
/// is structural on the run's stage key and never consults the registry;
/// terminal runs match no stage key.
pub fn runs_matching(runs: &[PipelineRun], filter: StageFilter) -> Vec<&PipelineRun> {
    runs.iter().filter(|r| filter.matches(r)).collect()
}

/// Full per-stage totals in registry order, ignoring any active filter. The
/// funnel always shows the whole picture regardless of what is highlighted.
pub fn stage_counts(runs: &[PipelineRun]) -> Vec<usize> {
    registry::stages()
        .iter()
        .map(|s| runs.iter().filter(|r| r.stage.key() == Some(s.key)).count())
        .collect()
}

/// Count of runs parked in terminal states (completed, failed).
pub fn terminal_counts(runs: &[PipelineRun]) -> (usize, usize) {
    let completed = runs.iter().filter(|r| r.stage == crate::model::RunStage::Completed).count();
    let failed = runs.iter().filter(|r| r.stage == crate::model::RunStage::Failed).count();
    (completed, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, RunId, RunMetrics, RunStage};
    use time::{Duration, OffsetDateTime};

    fn run(id: &str, stage: RunStage) -> PipelineRun {
        PipelineRun {
            id: RunId(id.to_string()),
            label: id.to_string(),
            priority: Priority::Normal,
            channel: "email".to_string(),
            stage,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(1),
            metrics: RunMetrics::default(),
        }
    }

    fn sample() -> Vec<PipelineRun> {
        vec![
            run("a", RunStage::InStage(StageKey::Lead)),
            run("b", RunStage::InStage(StageKey::Meeting)),
            run("c", RunStage::InStage(StageKey::Lead)),
            run("d", RunStage::Completed),
        ]
    }

    fn ids(runs: &[&PipelineRun]) -> Vec<String> {
        runs.iter().map(|r| r.id.0.clone()).collect()
    }

    #[test]
    fn test_all_is_identity() {
        let runs = sample();
        let visible = runs_matching(&runs, StageFilter::All);
        assert_eq!(ids(&visible), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_only_preserves_relative_order() {
        let runs = sample();
        let visible = runs_matching(&runs, StageFilter::Only(StageKey::Lead));
        assert_eq!(ids(&visible), vec!["a", "c"]);
        for r in visible {
            assert_eq!(r.stage.key(), Some(StageKey::Lead));
        }
    }

    #[test]
    fn test_stage_with_no_runs_is_empty() {
        let runs = sample();
        assert!(runs_matching(&runs, StageFilter::Only(StageKey::FollowUp)).is_empty());
    }

    #[test]
    fn test_terminal_runs_match_no_stage() {
        let runs = vec![run("x", RunStage::Completed), run("y", RunStage::Failed)];
        for stage in crate::registry::stages() {
            assert!(runs_matching(&runs, StageFilter::Only(stage.key)).is_empty());
        }
        assert_eq!(runs_matching(&runs, StageFilter::All).len(), 2);
    }

    #[test]
    fn test_stage_counts_ignore_filter() {
        let runs = sample();
        // Counts are whole-store totals in registry order.
        assert_eq!(stage_counts(&runs), vec![0, 2, 0, 1]);
        let (completed, failed) = terminal_counts(&runs);
        assert_eq!(completed, 1);
        assert_eq!(failed, 0);
    }

    #[test]
    fn test_empty_input() {
        assert!(runs_matching(&[], StageFilter::All).is_empty());
        assert_eq!(stage_counts(&[]), vec![0, 0, 0, 0]);
    }
}
