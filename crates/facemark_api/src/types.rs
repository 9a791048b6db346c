//! Request and response bodies exchanged with the backend.
//!
//! Field names follow the backend's JSON exactly. Optional response fields
//! carry serde defaults so older or trimmed responses still parse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Feature points
// ============================================================================

/// A feature point as the backend stores it.
///
/// Automatic points carry `landmark_index` (and usually `confidence`);
/// manual points omit both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f32,
    pub y: f32,
    /// Category wire name (`rightEye`, `leftEye`, `nose`, `mouth`, `face_contour`, `other`)
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark_index: Option<u32>,
}

/// Full point set for one image (`POST /api/feature-points`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    pub image_id: String,
    pub points: Vec<WirePoint>,
}

/// Response to a point-set save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub points_count: Option<usize>,
}

// ============================================================================
// Upload and detection
// ============================================================================

/// Response to `POST /api/upload-image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Body of `POST /api/detect-face`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub image_id: String,
}

/// Detection statistics reported alongside a processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub detection_confidence: f32,
    pub landmarks_detected: u32,
    /// `[height, width]` of the processed image
    #[serde(default)]
    pub processed_size: Vec<u32>,
}

/// Response to `POST /api/detect-face`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Base64 image, usually as a `data:image/...;base64,` URL
    #[serde(default)]
    pub processed_image: Option<String>,
    #[serde(default)]
    pub processing_info: Option<ProcessingInfo>,
}

// ============================================================================
// Automatic extraction
// ============================================================================

/// Extraction parameters as the backend validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionParameters {
    pub feature_types: Vec<String>,
    pub points_per_type: BTreeMap<String, u32>,
    pub confidence_threshold: f32,
}

/// Body of `POST /api/extract-auto-features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub image_id: String,
    #[serde(flatten)]
    pub parameters: ExtractionParameters,
}

/// Response to `POST /api/extract-auto-features`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub feature_points: Vec<WirePoint>,
    #[serde(default)]
    pub total_landmarks_detected: Option<u32>,
}

/// Response to `POST /api/validate-extraction-parameters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Response to `GET /api/available-feature-types`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureTypeInfo {
    #[serde(default)]
    pub available_feature_types: Vec<String>,
    pub max_points_per_type: BTreeMap<String, u32>,
}

/// Response to `DELETE /api/auto-features/{image_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub remaining_points: Option<usize>,
}

/// Manual/automatic split for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub manual: usize,
    pub auto: usize,
    pub total: usize,
}

/// Response to `GET /api/extraction-status/{image_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStatus {
    pub image_id: String,
    pub total_points: usize,
    pub manual_points: usize,
    pub auto_points: usize,
    #[serde(default)]
    pub type_statistics: BTreeMap<String, TypeCount>,
    #[serde(default)]
    pub has_auto_features: bool,
    #[serde(default)]
    pub has_manual_features: bool,
}

// ============================================================================
// Comparison
// ============================================================================

/// Body of `POST /api/compare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub reference_id: String,
    pub compare_ids: Vec<String>,
}

/// Which comparison image scored closer to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloserImage {
    Image1,
    Image2,
}

/// Free-form details block of a comparison result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetails {
    #[serde(default)]
    pub reference_points_count: usize,
    #[serde(default)]
    pub distance_difference: f64,
    #[serde(default)]
    pub similarity_ratio: f64,
    #[serde(default)]
    pub feature_types_used: Vec<String>,
}

/// Response to `POST /api/compare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub closer_image: CloserImage,
    pub image1_score: f64,
    pub image2_score: f64,
    pub optimal_lambda1: f64,
    pub optimal_lambda2: f64,
    pub execution_time: f64,
    #[serde(default)]
    pub details: ComparisonDetails,
}
