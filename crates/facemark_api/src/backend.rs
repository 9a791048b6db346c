//! The backend trait the engine depends on.

use crate::error::ApiError;
use crate::types::{
    ClearResponse, ComparisonRequest, ComparisonResult, DetectionResponse, ExtractionParameters,
    ExtractionRequest, ExtractionResponse, ExtractionStatus, FeatureTypeInfo, ImageFeatures,
    SaveResponse, UploadResponse, ValidationResponse,
};

/// Endpoint paths, relative to the backend base URL.
pub mod endpoints {
    pub const UPLOAD_IMAGE: &str = "/api/upload-image";
    pub const DETECT_FACE: &str = "/api/detect-face";
    pub const EXTRACT_AUTO_FEATURES: &str = "/api/extract-auto-features";
    pub const AUTO_FEATURES: &str = "/api/auto-features";
    pub const VALIDATE_PARAMETERS: &str = "/api/validate-extraction-parameters";
    pub const AVAILABLE_FEATURE_TYPES: &str = "/api/available-feature-types";
    pub const EXTRACTION_STATUS: &str = "/api/extraction-status";
    pub const FEATURE_POINTS: &str = "/api/feature-points";
    pub const COMPARE: &str = "/api/compare";
}

/// Blocking access to the scoring backend.
///
/// Implementations must be shareable across threads: per-slot requests are
/// fanned out concurrently and saves run on a background worker.
pub trait Backend: Send + Sync {
    /// Register an image and return its identifier.
    fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse, ApiError>;

    /// Run face detection and normalization on an uploaded image.
    fn detect_face(&self, image_id: &str) -> Result<DetectionResponse, ApiError>;

    /// Request automatic landmark extraction for one image.
    fn extract_auto_features(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ApiError>;

    /// Remove server-side automatic points for one image.
    fn clear_auto_features(&self, image_id: &str) -> Result<ClearResponse, ApiError>;

    /// Pre-flight check of extraction parameters.
    fn validate_parameters(
        &self,
        parameters: &ExtractionParameters,
    ) -> Result<ValidationResponse, ApiError>;

    /// Capability discovery (maximum points per category).
    fn available_feature_types(&self) -> Result<FeatureTypeInfo, ApiError>;

    /// Poll the stored point statistics for one image.
    fn extraction_status(&self, image_id: &str) -> Result<ExtractionStatus, ApiError>;

    /// Replace the stored point set for one image.
    fn save_feature_points(&self, features: &ImageFeatures) -> Result<SaveResponse, ApiError>;

    /// Score both comparison images against the reference.
    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResult, ApiError>;
}
