//! Data models for the annotation engine.

mod category;
mod point;
mod slot;
mod store;

pub use category::FeatureCategory;
pub use point::{FeaturePoint, PointId, Provenance};
pub use slot::{ImageKind, ImageSlot, ImageSource, SlotRole, Slots};
pub use store::PointStore;
