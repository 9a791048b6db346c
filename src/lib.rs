//! Facemark - feature point annotation and synchronization engine
//!
//! Operators mark corresponding facial feature points on a reference image and
//! two comparison images; a scoring backend then decides which comparison image
//! is closer to the reference. This crate holds the engine behind that flow:
//! per-image point stores, the pointer-driven editor, the merge of automatic
//! extraction results, generation-gated rendering, fire-and-forget persistence
//! and the comparison gate.

pub mod config;
pub mod constants;
pub mod editor;
mod fanout;
pub mod gate;
pub mod geometry;
pub mod merger;
pub mod model;
pub mod persistence;
pub mod render;
pub mod session;
pub mod stats;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, ConfigError, LogLevel};
pub use editor::{DragSession, Editor, EditorEvent, Effect, MarkingMode, Pointer};
pub use gate::GateState;
pub use geometry::{CanvasMetrics, ImagePoint, ScreenPosition, hit_test, to_image_coordinates};
pub use merger::{AutoFeatureMerger, ExtractionParams, MergeError, MergeReport, ValidationReport};
pub use model::{FeatureCategory, FeaturePoint, ImageSlot, PointStore, Provenance, SlotRole, Slots};
pub use session::{DetectionReport, Session, SessionError};
pub use stats::SlotStatistics;
