//! Page-level view state for the pipeline screen.
//!
//! All state shared between the funnel, the new-run form, and the history
//! list lives here, behind a single reducer. Panes never mutate shared
//! state themselves; they emit events and the reducer applies them one at
//! a time.

use crate::filter::StageFilter;
use crate::model::{most_recent_first, PipelineRun};
use crate::store::RunStore;
use anyhow::Result;

/// Everything that can happen to the page state. Both run-selection paths
/// (funnel badge, history row) funnel into the same `RunSelected` event, so
/// the details dialog behaves identically regardless of entry point.
#[derive(Debug, Clone)]
pub enum PageEvent {
    StageChanged(StageFilter),
    RunSelected(PipelineRun),
    RunCreated(PipelineRun),
    DialogClosed,
}

/// The shared selection triple owned by the page controller.
#[derive(Debug, Clone)]
pub struct PageState {
    pub stage_filter: StageFilter,
    pub selected: Option<PipelineRun>,
    details_open: bool,
}

impl PageState {
    /// Seed from the store's contents at mount: no filter, the most recent
    /// run preselected (dialog closed), or nothing when the store is empty.
    pub fn new(store: &dyn RunStore) -> Self {
        let selected = most_recent_first(store.runs()).first().map(|r| (*r).clone());
        Self {
            stage_filter: StageFilter::All,
            selected,
            details_open: false,
        }
    }

    /// The details dialog renders only when it was opened and a run is
    /// bound. This is the single place that relation is derived.
    pub fn dialog_visible(&self) -> bool {
        self.details_open && self.selected.is_some()
    }

    /// Apply one event. Selection transitions cannot fail; an `Err` only
    /// reports that a created run could not be written through to disk (it
    /// is still in the store and selected).
    pub fn apply(&mut self, event: PageEvent, store: &mut dyn RunStore) -> Result<()> {
        match event {
            PageEvent::StageChanged(filter) => {
                self.stage_filter = filter;
                Ok(())
            }
            PageEvent::RunSelected(run) => {
                self.selected = Some(run);
                self.details_open = true;
                Ok(())
            }
            PageEvent::RunCreated(run) => {
                let persist = store.append(run.clone());
                self.selected = Some(run);
                self.details_open = true;
                persist
            }
            PageEvent::DialogClosed => {
                // Selection is retained so the same run shows on reopen.
                self.details_open = false;
                Ok(())
            }
        }
    }
}
