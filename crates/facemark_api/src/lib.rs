//! Facemark API - backend boundary for the feature-point annotation engine.
//!
//! This crate owns everything that crosses the wire to the scoring backend:
//! - Request/response DTOs mirroring the backend's JSON bodies
//! - The [`Backend`] trait the engine talks to
//! - [`HttpBackend`], a blocking HTTP implementation of that trait

mod backend;
mod error;
mod http;
mod types;

pub use backend::{Backend, endpoints};
pub use error::ApiError;
pub use http::{HttpBackend, content_type_for, multipart_body};
pub use types::{
    ClearResponse, CloserImage, ComparisonDetails, ComparisonRequest, ComparisonResult,
    DetectionRequest, DetectionResponse, ExtractionParameters, ExtractionRequest,
    ExtractionResponse, ExtractionStatus, FeatureTypeInfo, ImageFeatures, ProcessingInfo,
    SaveResponse, TypeCount, UploadResponse, ValidationResponse, WirePoint,
};
