//! Anatomical feature categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of categories a feature point can belong to.
///
/// Serialized with the backend's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FeatureCategory {
    #[default]
    #[serde(rename = "rightEye")]
    RightEye,
    #[serde(rename = "leftEye")]
    LeftEye,
    #[serde(rename = "nose")]
    Nose,
    #[serde(rename = "mouth")]
    Mouth,
    #[serde(rename = "face_contour")]
    FaceContour,
    #[serde(rename = "other")]
    Other,
}

impl FeatureCategory {
    /// Get all categories in display order.
    pub fn all() -> &'static [FeatureCategory] {
        &[
            FeatureCategory::RightEye,
            FeatureCategory::LeftEye,
            FeatureCategory::Nose,
            FeatureCategory::Mouth,
            FeatureCategory::FaceContour,
            FeatureCategory::Other,
        ]
    }

    /// Get the display name used in point labels.
    pub fn name(&self) -> &'static str {
        match self {
            FeatureCategory::RightEye => "RightEye",
            FeatureCategory::LeftEye => "LeftEye",
            FeatureCategory::Nose => "Nose",
            FeatureCategory::Mouth => "Mouth",
            FeatureCategory::FaceContour => "FaceContour",
            FeatureCategory::Other => "Other",
        }
    }

    /// Get the name the backend uses for this category.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FeatureCategory::RightEye => "rightEye",
            FeatureCategory::LeftEye => "leftEye",
            FeatureCategory::Nose => "nose",
            FeatureCategory::Mouth => "mouth",
            FeatureCategory::FaceContour => "face_contour",
            FeatureCategory::Other => "other",
        }
    }

    /// Parse a backend category name. Unknown names map to `Other`.
    pub fn from_wire(name: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.wire_name() == name)
            .unwrap_or(FeatureCategory::Other)
    }

    /// Parse a backend category name strictly.
    pub fn parse_wire(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.wire_name() == name)
    }

    /// Marker color (RGB).
    pub fn color(&self) -> [u8; 3] {
        match self {
            FeatureCategory::RightEye => [0x34, 0x98, 0xdb],
            FeatureCategory::LeftEye => [0x9b, 0x59, 0xb6],
            FeatureCategory::Nose => [0xf3, 0x9c, 0x12],
            FeatureCategory::Mouth => [0xe7, 0x4c, 0x3c],
            FeatureCategory::FaceContour => [0x1a, 0xbc, 0x9c],
            FeatureCategory::Other => [0x95, 0xa5, 0xa6],
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
