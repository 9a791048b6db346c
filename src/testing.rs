//! Test doubles shared by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use facemark_api::{
    ApiError, Backend, ClearResponse, CloserImage, ComparisonDetails, ComparisonRequest,
    ComparisonResult, DetectionResponse, ExtractionParameters, ExtractionRequest,
    ExtractionResponse, ExtractionStatus, FeatureTypeInfo, ImageFeatures, ProcessingInfo,
    SaveResponse, UploadResponse, ValidationResponse, WirePoint,
};

/// Encode a blank RGBA image as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 40, 40, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// An automatic point as the extraction service returns it.
pub fn wire_auto(x: f32, y: f32, kind: &str, landmark_index: u32) -> WirePoint {
    WirePoint {
        x,
        y,
        kind: kind.to_string(),
        label: format!("{}_auto_{}", kind, landmark_index),
        confidence: Some(0.9),
        landmark_index: Some(landmark_index),
    }
}

#[derive(Default)]
struct MockState {
    next_upload: u32,
    uploads: Vec<String>,
    processed_size: (u32, u32),
    failing_detection: HashSet<String>,
    extraction_points: HashMap<String, Vec<WirePoint>>,
    failing_extraction: HashSet<String>,
    unsuccessful_extraction: HashSet<String>,
    extraction_calls: Vec<String>,
    validation_errors: Vec<String>,
    validation_unreachable: bool,
    validation_calls: usize,
    max_points: BTreeMap<String, u32>,
    failing_clear: HashSet<String>,
    cleared: Vec<String>,
    failing_save: HashSet<String>,
    refused_save: HashSet<String>,
    save_attempts: Vec<String>,
    saves: Vec<ImageFeatures>,
    comparisons: Vec<ComparisonRequest>,
}

/// In-memory backend with scripted per-image behavior.
///
/// Uploads are assigned ids `img-1`, `img-2`, ... in call order.
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        let mut max_points = BTreeMap::new();
        for (kind, max) in [
            ("rightEye", 16),
            ("leftEye", 16),
            ("nose", 9),
            ("mouth", 20),
            ("face_contour", 36),
        ] {
            max_points.insert(kind.to_string(), max);
        }
        Self {
            state: Mutex::new(MockState {
                processed_size: (64, 64),
                max_points,
                ..MockState::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().expect("mock state poisoned");
        f(&mut state)
    }

    pub fn fail_detection(&self, image_id: &str) {
        self.with(|s| s.failing_detection.insert(image_id.to_string()));
    }

    pub fn set_extraction(&self, image_id: &str, points: Vec<WirePoint>) {
        self.with(|s| s.extraction_points.insert(image_id.to_string(), points));
    }

    /// Make extraction for an image fail with an HTTP error.
    pub fn fail_extraction(&self, image_id: &str) {
        self.with(|s| s.failing_extraction.insert(image_id.to_string()));
    }

    /// Make extraction for an image answer `success: false`.
    pub fn reject_extraction(&self, image_id: &str) {
        self.with(|s| s.unsuccessful_extraction.insert(image_id.to_string()));
    }

    pub fn set_validation_errors(&self, errors: &[&str]) {
        self.with(|s| s.validation_errors = errors.iter().map(|e| e.to_string()).collect());
    }

    pub fn make_validation_unreachable(&self) {
        self.with(|s| s.validation_unreachable = true);
    }

    pub fn fail_clear(&self, image_id: &str) {
        self.with(|s| s.failing_clear.insert(image_id.to_string()));
    }

    /// Make saves for an image fail with an HTTP error.
    pub fn fail_save(&self, image_id: &str) {
        self.with(|s| s.failing_save.insert(image_id.to_string()));
    }

    /// Make saves for an image answer `success: false`.
    pub fn refuse_save(&self, image_id: &str) {
        self.with(|s| s.refused_save.insert(image_id.to_string()));
    }

    pub fn extraction_calls(&self) -> Vec<String> {
        self.with(|s| s.extraction_calls.clone())
    }

    pub fn validation_calls(&self) -> usize {
        self.with(|s| s.validation_calls)
    }

    pub fn cleared(&self) -> Vec<String> {
        self.with(|s| s.cleared.clone())
    }

    /// Saves the backend accepted.
    pub fn saves(&self) -> Vec<ImageFeatures> {
        self.with(|s| s.saves.clone())
    }

    /// Image id of every save request received, accepted or not.
    pub fn save_attempts(&self) -> Vec<String> {
        self.with(|s| s.save_attempts.clone())
    }

    pub fn comparisons(&self) -> Vec<ComparisonRequest> {
        self.with(|s| s.comparisons.clone())
    }
}

impl Backend for MockBackend {
    fn upload_image(&self, filename: &str, _bytes: &[u8]) -> Result<UploadResponse, ApiError> {
        self.with(|s| {
            s.next_upload += 1;
            s.uploads.push(filename.to_string());
            Ok(UploadResponse {
                image_id: format!("img-{}", s.next_upload),
                url: None,
                filename: Some(filename.to_string()),
            })
        })
    }

    fn detect_face(&self, image_id: &str) -> Result<DetectionResponse, ApiError> {
        let (fail, (w, h)) = self.with(|s| (s.failing_detection.contains(image_id), s.processed_size));
        if fail {
            return Ok(DetectionResponse {
                success: false,
                message: "no face detected".to_string(),
                processed_image: None,
                processing_info: None,
            });
        }
        let encoded = BASE64.encode(png_bytes(w, h));
        Ok(DetectionResponse {
            success: true,
            message: "ok".to_string(),
            processed_image: Some(format!("data:image/png;base64,{}", encoded)),
            processing_info: Some(ProcessingInfo {
                detection_confidence: 0.97,
                landmarks_detected: 468,
                processed_size: vec![h, w],
            }),
        })
    }

    fn extract_auto_features(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ApiError> {
        self.with(|s| {
            s.extraction_calls.push(request.image_id.clone());
            if s.failing_extraction.contains(&request.image_id) {
                return Err(ApiError::status(
                    facemark_api::endpoints::EXTRACT_AUTO_FEATURES,
                    500,
                    "extraction crashed",
                ));
            }
            if s.unsuccessful_extraction.contains(&request.image_id) {
                return Ok(ExtractionResponse {
                    success: false,
                    message: "no landmarks".to_string(),
                    feature_points: Vec::new(),
                    total_landmarks_detected: None,
                });
            }
            let points = s
                .extraction_points
                .get(&request.image_id)
                .cloned()
                .unwrap_or_default();
            Ok(ExtractionResponse {
                success: true,
                message: "ok".to_string(),
                feature_points: points,
                total_landmarks_detected: Some(468),
            })
        })
    }

    fn clear_auto_features(&self, image_id: &str) -> Result<ClearResponse, ApiError> {
        self.with(|s| {
            if s.failing_clear.contains(image_id) {
                return Err(ApiError::status(facemark_api::endpoints::AUTO_FEATURES, 404, "gone"));
            }
            s.cleared.push(image_id.to_string());
            Ok(ClearResponse {
                success: true,
                message: "cleared".to_string(),
                remaining_points: None,
            })
        })
    }

    fn validate_parameters(
        &self,
        _parameters: &ExtractionParameters,
    ) -> Result<ValidationResponse, ApiError> {
        self.with(|s| {
            s.validation_calls += 1;
            if s.validation_unreachable {
                return Err(ApiError::transport(
                    facemark_api::endpoints::VALIDATE_PARAMETERS,
                    "connection refused",
                ));
            }
            Ok(ValidationResponse {
                valid: s.validation_errors.is_empty(),
                errors: s.validation_errors.clone(),
                warnings: Vec::new(),
            })
        })
    }

    fn available_feature_types(&self) -> Result<FeatureTypeInfo, ApiError> {
        self.with(|s| {
            Ok(FeatureTypeInfo {
                available_feature_types: s.max_points.keys().cloned().collect(),
                max_points_per_type: s.max_points.clone(),
            })
        })
    }

    fn extraction_status(&self, image_id: &str) -> Result<ExtractionStatus, ApiError> {
        self.with(|s| {
            let saved = s.saves.iter().rev().find(|f| f.image_id == image_id);
            let points = saved.map(|f| f.points.as_slice()).unwrap_or(&[]);
            let auto_points = points.iter().filter(|p| p.landmark_index.is_some()).count();
            Ok(ExtractionStatus {
                image_id: image_id.to_string(),
                total_points: points.len(),
                manual_points: points.len() - auto_points,
                auto_points,
                type_statistics: BTreeMap::new(),
                has_auto_features: auto_points > 0,
                has_manual_features: points.len() > auto_points,
            })
        })
    }

    fn save_feature_points(&self, features: &ImageFeatures) -> Result<SaveResponse, ApiError> {
        self.with(|s| {
            s.save_attempts.push(features.image_id.clone());
            if s.failing_save.contains(&features.image_id) {
                return Err(ApiError::status(
                    facemark_api::endpoints::FEATURE_POINTS,
                    500,
                    "database unavailable",
                ));
            }
            if s.refused_save.contains(&features.image_id) {
                return Ok(SaveResponse {
                    success: false,
                    message: "image not found".to_string(),
                    points_count: None,
                });
            }
            s.saves.push(features.clone());
            Ok(SaveResponse {
                success: true,
                message: "saved".to_string(),
                points_count: Some(features.points.len()),
            })
        })
    }

    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResult, ApiError> {
        self.with(|s| {
            s.comparisons.push(request.clone());
            Ok(ComparisonResult {
                closer_image: CloserImage::Image2,
                image1_score: 0.42,
                image2_score: 0.17,
                optimal_lambda1: 1.0,
                optimal_lambda2: 0.95,
                execution_time: 0.01,
                details: ComparisonDetails::default(),
            })
        })
    }
}
