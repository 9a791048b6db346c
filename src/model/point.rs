//! Feature point types.

use facemark_api::WirePoint;

use super::category::FeatureCategory;
use crate::geometry::ImagePoint;

/// Unique identifier for a point within one store.
pub type PointId = u64;

/// Where a point came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provenance {
    /// Placed by the operator.
    Manual,
    /// Produced by the extraction service.
    Automatic {
        /// Index of the source landmark in the detector's mesh
        landmark_index: u32,
        /// Detector confidence in 0.0-1.0
        confidence: f32,
    },
}

/// A single feature point on a slot's active image.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePoint {
    /// Store-assigned identifier, stable across relabeling and reordering.
    pub id: PointId,
    /// X coordinate in image pixels
    pub x: f32,
    /// Y coordinate in image pixels
    pub y: f32,
    pub category: FeatureCategory,
    pub label: String,
    pub provenance: Provenance,
}

impl FeaturePoint {
    /// Create an automatic point. The store assigns the final id.
    pub fn automatic(
        x: f32,
        y: f32,
        category: FeatureCategory,
        label: impl Into<String>,
        landmark_index: u32,
        confidence: f32,
    ) -> Self {
        Self {
            id: 0,
            x,
            y,
            category,
            label: label.into(),
            provenance: Provenance::Automatic {
                landmark_index,
                confidence,
            },
        }
    }

    pub fn position(&self) -> ImagePoint {
        ImagePoint::new(self.x, self.y)
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.provenance, Provenance::Manual)
    }

    pub fn is_automatic(&self) -> bool {
        !self.is_manual()
    }

    /// Convert to the backend representation.
    pub fn to_wire(&self) -> WirePoint {
        let (confidence, landmark_index) = match self.provenance {
            Provenance::Manual => (None, None),
            Provenance::Automatic {
                landmark_index,
                confidence,
            } => (Some(confidence), Some(landmark_index)),
        };
        WirePoint {
            x: self.x,
            y: self.y,
            kind: self.category.wire_name().to_string(),
            label: self.label.clone(),
            confidence,
            landmark_index,
        }
    }

    /// Build an automatic point from an extraction result.
    ///
    /// Returns None if the backend point carries no landmark index, since
    /// provenance is decided structurally and never from label text.
    pub fn from_extracted(wire: &WirePoint) -> Option<Self> {
        let landmark_index = wire.landmark_index?;
        Some(Self::automatic(
            wire.x,
            wire.y,
            FeatureCategory::from_wire(&wire.kind),
            wire.label.clone(),
            landmark_index,
            wire.confidence.unwrap_or(0.0),
        ))
    }
}
