use crate::model::{PipelineRun, Priority, RunId, RunMetrics, RunStage, StageKey};
use anyhow::{Context, Result};
use rand::RngCore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Read/append access to the set of known runs. The portal only ever reads
/// the current sequence and appends newly launched runs; nothing is mutated
/// or removed within a session.
pub trait RunStore {
    fn runs(&self) -> &[PipelineRun];

    /// Append a newly created run. The in-memory append always takes hold;
    /// an `Err` only means a write-through to disk failed.
    fn append(&mut self, run: PipelineRun) -> Result<()>;
}

/// In-memory store, optionally writing appended runs through to a JSONL
/// file.
pub struct MemoryStore {
    runs: Vec<PipelineRun>,
    write_through: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(runs: Vec<PipelineRun>) -> Self {
        Self {
            runs,
            write_through: None,
        }
    }

    /// Persist appended runs to `path` as JSONL lines.
    pub fn with_write_through(mut self, path: PathBuf) -> Self {
        self.write_through = Some(path);
        self
    }
}

impl RunStore for MemoryStore {
    fn runs(&self) -> &[PipelineRun] {
        &self.runs
    }

    fn append(&mut self, run: PipelineRun) -> Result<()> {
        let persist = match &self.write_through {
            Some(path) => append_run(path, &run),
            None => Ok(()),
        };
        self.runs.push(run);
        persist
    }
}

/// Where the runs shown at mount come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Built-in sample data.
    Sample,
    /// A JSONL file of runs, one per line.
    File(PathBuf),
}

impl DataSource {
    /// Resolve the source for this session: an explicit `--data` path wins;
    /// otherwise the default data file is used if it exists, else the
    /// sample set.
    pub fn resolve(explicit: Option<PathBuf>) -> DataSource {
        if let Some(p) = explicit {
            return DataSource::File(p);
        }
        match default_data_path() {
            Some(p) if p.exists() => DataSource::File(p),
            _ => DataSource::Sample,
        }
    }

    pub fn load(&self) -> Result<Vec<PipelineRun>> {
        match self {
            DataSource::Sample => Ok(sample_runs()),
            DataSource::File(path) => load_runs(path),
        }
    }
}

/// Default location for persisted runs.
pub fn default_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("funnel-ops").join("runs.jsonl"))
}

/// Load all runs from a JSONL file, preserving line order.
pub fn load_runs(path: &Path) -> Result<Vec<PipelineRun>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read runs from {}", path.display()))?;
    let mut runs = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let run: PipelineRun = serde_json::from_str(line)
            .with_context(|| format!("parse run on line {} of {}", i + 1, path.display()))?;
        runs.push(run);
    }
    Ok(runs)
}

/// Append one run as a JSONL line, creating parent directories on first
/// write.
pub fn append_run(path: &Path, run: &PipelineRun) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create data dir {}", parent.display()))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(run)?;
    writeln!(file, "{line}").with_context(|| format!("write run to {}", path.display()))?;
    Ok(())
}

/// Load failure surfaced to the error pane: a human-readable message plus a
/// short correlation token the operator can quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub message: String,
    pub digest: String,
}

impl LoadError {
    fn new(err: &anyhow::Error) -> Self {
        let mut b = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut b);
        Self {
            message: format!("{err:#}"),
            digest: format!("{:08x}", u32::from_le_bytes(b)),
        }
    }
}

/// Load the source on a dedicated thread and hand the outcome back over a
/// channel, keeping file I/O off the UI thread. The receiver sees exactly
/// one message per call.
pub fn spawn_loader(source: DataSource) -> mpsc::Receiver<Result<Vec<PipelineRun>, LoadError>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = source.load().map_err(|e| LoadError::new(&e));
        let _ = tx.send(outcome);
    });
    rx
}

fn sample_run(
    id: &str,
    label: &str,
    priority: Priority,
    channel: &str,
    stage: RunStage,
    created_at: time::OffsetDateTime,
    metrics: RunMetrics,
) -> PipelineRun {
    PipelineRun {
        id: RunId(id.to_string()),
        label: label.to_string(),
        priority,
        channel: channel.to_string(),
        stage,
        created_at,
        metrics,
    }
}

/// The built-in demo dataset shown when no run file exists yet.
pub fn sample_runs() -> Vec<PipelineRun> {
    use time::macros::datetime;
    vec![
        sample_run(
            "5201774400917530",
            "Spring webinar list",
            Priority::Normal,
            "email",
            RunStage::Completed,
            datetime!(2026-07-21 09:12 UTC),
            RunMetrics {
                contacts: 180,
                replies: 44,
                meetings_booked: 9,
            },
        ),
        sample_run(
            "9042816650112345",
            "SaaS founders EU",
            Priority::High,
            "linkedin",
            RunStage::InStage(StageKey::Meeting),
            datetime!(2026-07-24 14:03 UTC),
            RunMetrics {
                contacts: 95,
                replies: 31,
                meetings_booked: 6,
            },
        ),
        sample_run(
            "3310078245996112",
            "Conference follow-ups",
            Priority::Normal,
            "email",
            RunStage::InStage(StageKey::FollowUp),
            datetime!(2026-07-27 11:47 UTC),
            RunMetrics {
                contacts: 120,
                replies: 18,
                meetings_booked: 2,
            },
        ),
        sample_run(
            "7788120034651209",
            "Q3 cold outreach",
            Priority::Normal,
            "email",
            RunStage::InStage(StageKey::Lead),
            datetime!(2026-07-29 08:30 UTC),
            RunMetrics {
                contacts: 240,
                replies: 12,
                meetings_booked: 0,
            },
        ),
        sample_run(
            "1145098733402781",
            "Churned accounts winback",
            Priority::High,
            "phone",
            RunStage::InStage(StageKey::Lead),
            datetime!(2026-07-30 16:20 UTC),
            RunMetrics {
                contacts: 38,
                replies: 7,
                meetings_booked: 1,
            },
        ),
        sample_run(
            "6650923178804417",
            "Ebook download cohort",
            Priority::Normal,
            "email",
            RunStage::InStage(StageKey::LeadMagnet),
            datetime!(2026-08-01 10:05 UTC),
            RunMetrics {
                contacts: 410,
                replies: 3,
                meetings_booked: 0,
            },
        ),
        sample_run(
            "2207541196733098",
            "Agency partners pilot",
            Priority::Normal,
            "linkedin",
            RunStage::Failed,
            datetime!(2026-08-02 13:41 UTC),
            RunMetrics {
                contacts: 25,
                replies: 0,
                meetings_booked: 0,
            },
        ),
        sample_run(
            "8873340021675524",
            "August newsletter leads",
            Priority::Normal,
            "email",
            RunStage::InStage(StageKey::LeadMagnet),
            datetime!(2026-08-03 09:58 UTC),
            RunMetrics {
                contacts: 96,
                replies: 1,
                meetings_booked: 0,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewRunInput;

    #[test]
    fn test_sample_ids_are_distinct() {
        let runs = sample_runs();
        let ids: std::collections::HashSet<_> = runs.iter().map(|r| &r.id).collect();
        assert_eq!(ids.len(), runs.len());
    }

    #[test]
    fn test_append_keeps_store_order() {
        let mut store = MemoryStore::new(sample_runs());
        let before = store.runs().len();
        let run = NewRunInput {
            name: "Acme".to_string(),
            ..Default::default()
        }
        .submit()
        .unwrap();
        let id = run.id.clone();
        store.append(run).unwrap();
        assert_eq!(store.runs().len(), before + 1);
        assert_eq!(store.runs().last().unwrap().id, id);
    }

    #[test]
    fn test_jsonl_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");
        let runs = sample_runs();
        for run in &runs {
            append_run(&path, run).unwrap();
        }
        let loaded = load_runs(&path).unwrap();
        assert_eq!(loaded, runs);
    }

    #[test]
    fn test_write_through_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.jsonl");
        let mut store = MemoryStore::new(Vec::new()).with_write_through(path.clone());
        let run = NewRunInput {
            name: "Acme".to_string(),
            ..Default::default()
        }
        .submit()
        .unwrap();
        store.append(run.clone()).unwrap();
        assert_eq!(load_runs(&path).unwrap(), vec![run]);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jsonl");
        assert!(load_runs(&path).is_err());
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let explicit = PathBuf::from("/tmp/some-runs.jsonl");
        match DataSource::resolve(Some(explicit.clone())) {
            DataSource::File(p) => assert_eq!(p, explicit),
            DataSource::Sample => panic!("expected explicit file source"),
        }
    }

    #[test]
    fn test_loader_delivers_one_outcome() {
        let rx = spawn_loader(DataSource::Sample);
        let outcome = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("loader should report");
        assert_eq!(outcome.unwrap(), sample_runs());
    }
}
