//! Readiness of the comparison action.

use std::fmt;

use crate::model::{SlotRole, Slots};

/// Whether comparison may run, and if not, what is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// At least one slot has no uploaded image
    NeedsUpload,
    /// At least one slot has no points
    NeedsPoints,
    /// Every slot has points but the counts differ
    NeedsEqualCounts,
    Ready,
}

impl GateState {
    /// Evaluate the gate over the three slots.
    pub fn evaluate(slots: &Slots) -> Self {
        let uploaded = (*SlotRole::all()).map(|role| slots.get(role).is_uploaded());
        Self::from_counts(uploaded, slots.counts())
    }

    /// Evaluate from upload flags and point counts in slot order.
    pub fn from_counts(uploaded: [bool; 3], counts: [usize; 3]) -> Self {
        if uploaded.iter().any(|u| !u) {
            GateState::NeedsUpload
        } else if counts.iter().any(|&c| c == 0) {
            GateState::NeedsPoints
        } else if counts.iter().any(|&c| c != counts[0]) {
            GateState::NeedsEqualCounts
        } else {
            GateState::Ready
        }
    }

    pub fn is_ready(&self) -> bool {
        *self == GateState::Ready
    }

    /// Status line shown next to the comparison action.
    pub fn status_text(&self) -> &'static str {
        match self {
            GateState::NeedsUpload => "Upload all three images",
            GateState::NeedsPoints => "Mark feature points on every image",
            GateState::NeedsEqualCounts => "Every image needs the same number of feature points",
            GateState::Ready => "Ready to compare",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}
