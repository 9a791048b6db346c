//! Per-slot rendering with last-request-wins ordering.
//!
//! A redraw captures a snapshot of a slot's points together with a fresh
//! generation number. Image loading completes asynchronously; a completion
//! is only turned into a frame if its generation is still the newest one
//! issued for that slot.

mod frame;
mod loader;
mod synchronizer;

pub use frame::{Frame, Marker, draw_markers};
pub use loader::{DecoderThread, ImageLoader, LoadCompletion};
pub use synchronizer::RenderSynchronizer;

use crate::model::{FeaturePoint, ImageSource, SlotRole};

/// Monotonic per-slot redraw counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Everything needed to draw one slot, captured when the redraw was requested.
#[derive(Debug, Clone)]
pub struct RedrawRequest {
    pub slot: SlotRole,
    pub generation: Generation,
    pub image: ImageSource,
    /// Points as they were when the redraw was requested
    pub points: Vec<FeaturePoint>,
}
