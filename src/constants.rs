//! Global constants for the Facemark engine

/// Radius used for both drawing point markers and hit-testing them (image px)
pub const DEFAULT_MARKER_RADIUS: f32 = 10.0;

/// Width of the white outline drawn around each marker (image px)
pub const MARKER_OUTLINE_WIDTH: f32 = 3.0;

/// Largest image accepted for upload (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// File extensions accepted for upload
pub const UPLOAD_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Default backend location
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default timeout for a single backend request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default minimum landmark confidence for automatic extraction
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Check if a filename has an extension accepted for upload.
pub fn is_uploadable_image(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => UPLOAD_EXTENSIONS.contains(&ext),
        None => false,
    }
}
