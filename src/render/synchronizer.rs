//! Generation-gated frame updates for the three slots.

use crate::model::{ImageSlot, SlotRole};

use super::{Frame, Generation, ImageLoader, LoadCompletion, RedrawRequest};

/// Keeps each slot's displayed frame in step with its newest redraw request.
///
/// Every request bumps the slot's generation. Completions carrying an older
/// generation are discarded, so a slow load can never overwrite the result of
/// a newer one regardless of completion order.
pub struct RenderSynchronizer {
    loader: Box<dyn ImageLoader>,
    radius: f32,
    generations: [Generation; 3],
    frames: [Option<Frame>; 3],
    /// Newest generation submitted but not yet applied, per slot
    pending: [Option<Generation>; 3],
}

impl RenderSynchronizer {
    pub fn new(loader: Box<dyn ImageLoader>, radius: f32) -> Self {
        Self {
            loader,
            radius,
            generations: [Generation::default(); 3],
            frames: [None, None, None],
            pending: [None, None, None],
        }
    }

    /// Request a redraw of `slot` from its current points.
    ///
    /// Returns the new generation, or `None` when the slot has no image yet.
    pub fn request(&mut self, slot: &ImageSlot) -> Option<Generation> {
        let role = slot.role();
        let idx = role.index();
        let generation = self.generations[idx].next();
        self.generations[idx] = generation;

        let Some(image) = slot.active_image() else {
            log::debug!("{}: no image to draw, redraw {:?} skipped", role, generation);
            self.frames[idx] = None;
            self.pending[idx] = None;
            return None;
        };

        self.pending[idx] = Some(generation);
        self.loader.submit(RedrawRequest {
            slot: role,
            generation,
            image: image.clone(),
            points: slot.points.points().to_vec(),
        });
        Some(generation)
    }

    /// Drain finished loads. Returns the slots whose frame changed.
    pub fn poll(&mut self) -> Vec<SlotRole> {
        let mut updated = Vec::new();
        while let Some(completion) = self.loader.try_next() {
            let role = completion.request.slot;
            if self.apply(completion) && !updated.contains(&role) {
                updated.push(role);
            }
        }
        updated
    }

    /// Apply one completion. Returns `true` if it produced the slot's frame.
    pub fn apply(&mut self, completion: LoadCompletion) -> bool {
        let LoadCompletion { request, result } = completion;
        let idx = request.slot.index();
        let current = self.generations[idx];

        if request.generation != current {
            log::debug!(
                "{}: dropping stale redraw {:?} (current {:?})",
                request.slot,
                request.generation,
                current
            );
            return false;
        }
        self.pending[idx] = None;

        match result {
            Ok(image) => {
                self.frames[idx] = Some(Frame::compose(
                    request.slot,
                    request.generation,
                    image,
                    &request.points,
                    self.radius,
                ));
                true
            }
            Err(e) => {
                log::error!("{}: failed to load image for redraw: {}", request.slot, e);
                false
            }
        }
    }

    /// The most recently applied frame for a slot.
    pub fn frame(&self, role: SlotRole) -> Option<&Frame> {
        self.frames[role.index()].as_ref()
    }

    pub fn current_generation(&self, role: SlotRole) -> Generation {
        self.generations[role.index()]
    }

    /// Whether every submitted redraw has been applied or superseded.
    pub fn is_idle(&self) -> bool {
        self.pending.iter().all(Option::is_none)
    }
}
