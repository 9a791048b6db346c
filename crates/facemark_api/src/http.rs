//! Blocking HTTP implementation of [`Backend`] built on `ureq`.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::{Backend, endpoints};
use crate::error::ApiError;
use crate::types::{
    ClearResponse, ComparisonRequest, ComparisonResult, DetectionRequest, DetectionResponse,
    ExtractionParameters, ExtractionRequest, ExtractionResponse, ExtractionStatus,
    FeatureTypeInfo, ImageFeatures, SaveResponse, UploadResponse, ValidationResponse,
};

/// Multipart boundary used for uploads.
const BOUNDARY: &str = "----facemark-upload-3f9a7c21d0e84b56";

/// HTTP client for the scoring backend.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        log::debug!("HTTP backend at {}", base_url);
        Self { agent, base_url }
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|e| ApiError::from_ureq(endpoint, e))?;
        read_json(response)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ApiError::from_ureq(endpoint, e))?;
        read_json(response)
    }
}

fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
    let text = response.into_string()?;
    Ok(serde_json::from_str(&text)?)
}

/// Guess the MIME type of an upload from its file name.
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    match lower.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Build a single-file `multipart/form-data` body.
pub fn multipart_body(boundary: &str, field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field,
            filename.replace('"', "")
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type_for(filename)).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

impl Backend for HttpBackend {
    fn upload_image(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse, ApiError> {
        if filename.is_empty() {
            return Err(ApiError::InvalidRequest("upload needs a file name".to_string()));
        }
        let url = self.url(endpoints::UPLOAD_IMAGE);
        log::debug!("POST {} ({} bytes)", url, bytes.len());
        let body = multipart_body(BOUNDARY, "file", filename, bytes);
        let response = self
            .agent
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .send_bytes(&body)
            .map_err(|e| ApiError::from_ureq(endpoints::UPLOAD_IMAGE, e))?;
        read_json(response)
    }

    fn detect_face(&self, image_id: &str) -> Result<DetectionResponse, ApiError> {
        let request = DetectionRequest {
            image_id: image_id.to_string(),
        };
        self.post_json(endpoints::DETECT_FACE, endpoints::DETECT_FACE, &request)
    }

    fn extract_auto_features(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ApiError> {
        self.post_json(
            endpoints::EXTRACT_AUTO_FEATURES,
            endpoints::EXTRACT_AUTO_FEATURES,
            request,
        )
    }

    fn clear_auto_features(&self, image_id: &str) -> Result<ClearResponse, ApiError> {
        let url = self.url(&format!("{}/{}", endpoints::AUTO_FEATURES, image_id));
        log::debug!("DELETE {}", url);
        let response = self
            .agent
            .delete(&url)
            .call()
            .map_err(|e| ApiError::from_ureq(endpoints::AUTO_FEATURES, e))?;
        read_json(response)
    }

    fn validate_parameters(
        &self,
        parameters: &ExtractionParameters,
    ) -> Result<ValidationResponse, ApiError> {
        self.post_json(
            endpoints::VALIDATE_PARAMETERS,
            endpoints::VALIDATE_PARAMETERS,
            parameters,
        )
    }

    fn available_feature_types(&self) -> Result<FeatureTypeInfo, ApiError> {
        self.get_json(
            endpoints::AVAILABLE_FEATURE_TYPES,
            endpoints::AVAILABLE_FEATURE_TYPES,
        )
    }

    fn extraction_status(&self, image_id: &str) -> Result<ExtractionStatus, ApiError> {
        self.get_json(
            endpoints::EXTRACTION_STATUS,
            &format!("{}/{}", endpoints::EXTRACTION_STATUS, image_id),
        )
    }

    fn save_feature_points(&self, features: &ImageFeatures) -> Result<SaveResponse, ApiError> {
        self.post_json(endpoints::FEATURE_POINTS, endpoints::FEATURE_POINTS, features)
    }

    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResult, ApiError> {
        self.post_json(endpoints::COMPARE, endpoints::COMPARE, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(
            backend.url(endpoints::COMPARE),
            "http://localhost:8000/api/compare"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("face.PNG"), "image/png");
        assert_eq!(content_type_for("face.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("face.jpg"), "image/jpeg");
        assert_eq!(content_type_for("face.tiff"), "application/octet-stream");
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_body("XYZ", "file", "a.png", b"DATA");
        let text = String::from_utf8(body).expect("ascii body");
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"a.png\""));
        assert!(text.contains("Content-Type: image/png\r\n\r\nDATA\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }
}
