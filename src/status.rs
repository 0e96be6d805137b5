use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a stage or event, reduced to the handful of values a
/// renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    #[default]
    Unknown,
    Queued,
    Idle,
    Ok,
    Finished,
    Failed,
}

impl CanonicalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Queued => "queued",
            Self::Idle => "idle",
            Self::Ok => "ok",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order: a terminal state wins over a "running" that happens to
// appear elsewhere in the text.
const STATUS_RULES: [(&[&str], CanonicalStatus); 5] = [
    (&["finish", "complete"], CanonicalStatus::Finished),
    (&["fail", "error"], CanonicalStatus::Failed),
    (&["running"], CanonicalStatus::Ok),
    (&["queued"], CanonicalStatus::Queued),
    (&["idle"], CanonicalStatus::Idle),
];

/// Maps free-text state to a [`CanonicalStatus`] by case-insensitive
/// substring match.
pub fn normalize(state_text: &str) -> CanonicalStatus {
    let lowered = state_text.to_ascii_lowercase();
    for (needles, status) in STATUS_RULES {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return status;
        }
    }
    CanonicalStatus::Unknown
}

pub fn normalize_opt(state_text: Option<&str>) -> CanonicalStatus {
    state_text.map(normalize).unwrap_or_default()
}
