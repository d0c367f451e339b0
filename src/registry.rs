use crate::model::StageKey;

/// One step of the funnel as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub key: StageKey,
    pub label: &'static str,
    pub ordinal: usize,
}

/// The fixed funnel, in display and progress order. Defined once at process
/// start; read-only everywhere else.
const STAGES: &[Stage] = &[
    Stage {
        key: StageKey::LeadMagnet,
        label: "Lead Magnet",
        ordinal: 0,
    },
    Stage {
        key: StageKey::Lead,
        label: "Lead",
        ordinal: 1,
    },
    Stage {
        key: StageKey::FollowUp,
        label: "Follow-up",
        ordinal: 2,
    },
    Stage {
        key: StageKey::Meeting,
        label: "Meeting",
        ordinal: 3,
    },
];

pub fn stages() -> &'static [Stage] {
    STAGES
}

/// The stage every newly launched run starts in.
pub fn first_key() -> StageKey {
    STAGES[0].key
}

/// Display label for a stage key.
pub fn label(key: StageKey) -> &'static str {
    match STAGES.iter().find(|s| s.key == key) {
        Some(s) => s.label,
        None => "?",
    }
}

/// Position of a key within the funnel.
pub fn ordinal(key: StageKey) -> usize {
    STAGES
        .iter()
        .position(|s| s.key == key)
        .unwrap_or(STAGES.len())
}
