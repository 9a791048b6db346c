//! The application context: three slots and the components that act on them.
//!
//! Every operation runs to completion on the caller's thread before the next
//! one starts. Slow work happens elsewhere: per-slot backend calls fan out on
//! scoped threads, saves go through the persistence worker, and image decoding
//! runs behind the render synchronizer's loader.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use facemark_api::{
    ApiError, Backend, ComparisonRequest, ComparisonResult, ExtractionStatus, ProcessingInfo,
};

use crate::config::AppConfig;
use crate::constants::{MAX_UPLOAD_BYTES, UPLOAD_EXTENSIONS, is_uploadable_image};
use crate::editor::{Editor, EditorEvent, Effect, MarkingMode};
use crate::fanout::fan_out;
use crate::gate::GateState;
use crate::merger::{AutoFeatureMerger, ExtractionParams, MergeError, MergeReport};
use crate::model::{FeatureCategory, ImageSource, SlotRole, Slots};
use crate::persistence::PersistenceGateway;
use crate::render::{DecoderThread, Frame, ImageLoader, RenderSynchronizer};
use crate::stats::SlotStatistics;

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The slot has no uploaded image
    #[error("No image uploaded for {0}")]
    NotUploaded(SlotRole),

    /// Comparison was requested before the gate opened
    #[error("Comparison not available: {0}")]
    NotReady(GateState),

    /// The file was rejected before upload
    #[error("Cannot upload {filename}: {reason}")]
    InvalidUpload { filename: String, reason: String },

    /// Image bytes could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The processed image was not valid base64
    #[error("Invalid processed image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Required state is missing
    #[error("{0}")]
    Precondition(String),

    /// A background worker could not be started
    #[error("Failed to start worker: {0}")]
    Worker(String),
}

/// Per-slot outcome of face detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    pub processed: Vec<(SlotRole, Option<ProcessingInfo>)>,
    pub failed: Vec<(SlotRole, String)>,
}

impl DetectionReport {
    pub fn success_count(&self) -> usize {
        self.processed.len()
    }

    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

/// One annotation session over the reference and two comparison images.
pub struct Session {
    backend: Arc<dyn Backend>,
    slots: Slots,
    editor: Editor,
    renderer: RenderSynchronizer,
    gateway: PersistenceGateway,
    merger: AutoFeatureMerger,
    extraction: ExtractionParams,
    gate: GateState,
}

impl Session {
    /// Create a session that decodes frames on a background thread.
    pub fn new(backend: Arc<dyn Backend>, config: &AppConfig) -> Result<Self, SessionError> {
        let loader = DecoderThread::spawn().map_err(SessionError::Worker)?;
        Self::with_loader(backend, config, Box::new(loader))
    }

    /// Create a session with a custom image loader.
    pub fn with_loader(
        backend: Arc<dyn Backend>,
        config: &AppConfig,
        loader: Box<dyn ImageLoader>,
    ) -> Result<Self, SessionError> {
        let radius = config.preferences.marker_radius;
        let gateway = PersistenceGateway::spawn(backend.clone()).map_err(SessionError::Worker)?;
        let slots = Slots::new();
        let gate = GateState::evaluate(&slots);

        Ok(Self {
            merger: AutoFeatureMerger::new(backend.clone()),
            backend,
            slots,
            editor: Editor::new(radius),
            renderer: RenderSynchronizer::new(loader, radius),
            gateway,
            extraction: config.extraction.clone(),
            gate,
        })
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    /// Default extraction parameters from the configuration.
    pub fn extraction_params(&self) -> &ExtractionParams {
        &self.extraction
    }

    pub fn select_category(&mut self, category: FeatureCategory) {
        self.editor.set_category(category);
    }

    pub fn set_mode(&mut self, mode: MarkingMode) {
        self.editor.set_mode(mode);
    }

    /// Feed one pointer event through the editor and carry out its effects.
    ///
    /// Returned effects include any advisory for the operator.
    pub fn handle_event(&mut self, event: EditorEvent) -> Vec<Effect> {
        let effects = self.editor.handle(&mut self.slots, event);
        self.apply_effects(&effects);
        effects
    }

    fn apply_effects(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::Redraw(role) => self.redraw(*role),
                Effect::Persist(role) => self.persist(*role),
                Effect::Advisory(message) => log::info!("{}", message),
            }
        }
        self.refresh_gate();
    }

    fn redraw(&mut self, role: SlotRole) {
        self.renderer.request(self.slots.get(role));
    }

    fn persist(&self, role: SlotRole) {
        let slot = self.slots.get(role);
        match slot.image_id() {
            Some(image_id) => self.gateway.save(image_id, &slot.points),
            None => log::debug!("{}: nothing uploaded, save skipped", role),
        }
    }

    fn refresh_gate(&mut self) {
        let gate = GateState::evaluate(&self.slots);
        if gate != self.gate {
            log::debug!("Comparison gate: {:?} -> {:?}", self.gate, gate);
            self.gate = gate;
        }
    }

    /// Validate and upload an image file into a slot.
    pub fn upload_file(&mut self, role: SlotRole, path: &Path) -> Result<(), SessionError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path).map_err(|e| SessionError::InvalidUpload {
            filename: filename.clone(),
            reason: e.to_string(),
        })?;
        self.upload(role, &filename, bytes)
    }

    /// Validate and upload image bytes into a slot.
    ///
    /// The slot's points are dropped and its original image becomes active.
    pub fn upload(&mut self, role: SlotRole, filename: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
        let invalid = |reason: String| SessionError::InvalidUpload {
            filename: filename.to_string(),
            reason,
        };
        if !is_uploadable_image(filename) {
            return Err(invalid(format!(
                "unsupported file type (expected one of {})",
                UPLOAD_EXTENSIONS.join(", ")
            )));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(invalid(format!(
                "file is {} bytes, limit is {} bytes",
                bytes.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let source = ImageSource::from_bytes(bytes)?;
        let response = self.backend.upload_image(filename, source.bytes())?;
        log::info!(
            "{}: uploaded {} as {} ({}x{})",
            role,
            filename,
            response.image_id,
            source.width(),
            source.height()
        );

        self.editor.cancel_drag_for(role);
        self.slots.get_mut(role).set_uploaded(response.image_id, source);
        self.redraw(role);
        self.refresh_gate();
        Ok(())
    }

    /// Run face detection on every uploaded slot, best-effort per slot.
    ///
    /// Successful slots switch to the processed image, which drops their points.
    pub fn detect_faces(&mut self) -> Result<DetectionReport, SessionError> {
        let targets = self.uploaded_targets();
        if targets.is_empty() {
            return Err(SessionError::Precondition("No images uploaded".to_string()));
        }

        let backend = &self.backend;
        let results = fan_out(targets, |image_id| backend.detect_face(image_id));

        let mut report = DetectionReport::default();
        for (role, result) in results {
            let outcome = result
                .map_err(SessionError::from)
                .and_then(|response| {
                    if !response.success {
                        return Err(SessionError::Precondition(response.message));
                    }
                    let data = response.processed_image.ok_or_else(|| {
                        SessionError::Precondition("no processed image returned".to_string())
                    })?;
                    let source = ImageSource::from_bytes(decode_image_data(&data)?)?;
                    Ok((source, response.processing_info))
                });

            match outcome {
                Ok((source, info)) => {
                    log::info!(
                        "{}: face detected, processed image {}x{}",
                        role,
                        source.width(),
                        source.height()
                    );
                    self.editor.cancel_drag_for(role);
                    let dropped = self.slots.get_mut(role).set_processed(source, info.clone());
                    self.redraw(role);
                    if dropped > 0 {
                        self.persist(role);
                    }
                    report.processed.push((role, info));
                }
                Err(e) => {
                    log::warn!("{}: face detection failed: {}", role, e);
                    report.failed.push((role, e.to_string()));
                }
            }
        }
        self.refresh_gate();
        Ok(report)
    }

    /// Fetch server feature limits ahead of validation.
    pub fn load_limits(&mut self) -> Result<(), SessionError> {
        self.merger.load_limits()?;
        Ok(())
    }

    /// Extract automatic features for every processed slot and merge them in.
    pub fn extract_auto_features(&mut self, params: &ExtractionParams) -> Result<MergeReport, SessionError> {
        let report = self.merger.extract(&mut self.slots, params)?;
        self.after_merge(&report, "Automatic extraction");
        Ok(report)
    }

    /// Extract with the configured default parameters.
    pub fn extract_with_defaults(&mut self) -> Result<MergeReport, SessionError> {
        let params = self.extraction.clone();
        self.extract_auto_features(&params)
    }

    /// Remove automatic points from every uploaded slot, server side and locally.
    pub fn clear_automatic_features(&mut self) -> Result<MergeReport, SessionError> {
        let report = self.merger.clear_automatic(&mut self.slots)?;
        self.after_merge(&report, "Clearing automatic points");
        Ok(report)
    }

    fn after_merge(&mut self, report: &MergeReport, action: &str) {
        let affected: Vec<SlotRole> = report.affected().collect();
        for role in affected {
            self.editor.cancel_drag_for(role);
            self.redraw(role);
            self.persist(role);
        }
        self.refresh_gate();
        if report.is_success() {
            log::info!("{}", report.summary(action));
        } else {
            log::warn!("{}", report.summary(action));
        }
    }

    /// Empty every point store.
    pub fn clear_all_points(&mut self) {
        for role in SlotRole::all() {
            self.editor.cancel_drag_for(*role);
            self.slots.get_mut(*role).points.clear();
            self.redraw(*role);
            self.persist(*role);
        }
        self.refresh_gate();
    }

    /// Server-side point status for one slot.
    pub fn extraction_status(&self, role: SlotRole) -> Result<ExtractionStatus, SessionError> {
        let image_id = self
            .slots
            .get(role)
            .image_id()
            .ok_or(SessionError::NotUploaded(role))?;
        self.gateway.flush();
        Ok(self.backend.extraction_status(image_id)?)
    }

    /// Score both comparison images against the reference.
    ///
    /// Pending saves are flushed first so the backend scores the current points.
    pub fn compare(&self) -> Result<ComparisonResult, SessionError> {
        if !self.gate.is_ready() {
            return Err(SessionError::NotReady(self.gate));
        }
        let id = |role| {
            self.slots
                .get(role)
                .image_id()
                .map(str::to_string)
                .ok_or(SessionError::NotUploaded(role))
        };
        let request = ComparisonRequest {
            reference_id: id(SlotRole::Reference)?,
            compare_ids: vec![id(SlotRole::CompareA)?, id(SlotRole::CompareB)?],
        };

        self.gateway.flush();
        let result = self.backend.compare(&request)?;
        log::info!(
            "Comparison finished in {:.3}s: closer image {:?}",
            result.execution_time,
            result.closer_image
        );
        Ok(result)
    }

    pub fn statistics(&self) -> Vec<SlotStatistics> {
        self.slots.iter().map(SlotStatistics::collect).collect()
    }

    /// Apply finished image loads. Returns the slots whose frame changed.
    pub fn poll_render(&mut self) -> Vec<SlotRole> {
        self.renderer.poll()
    }

    pub fn is_render_idle(&self) -> bool {
        self.renderer.is_idle()
    }

    pub fn frame(&self, role: SlotRole) -> Option<&Frame> {
        self.renderer.frame(role)
    }

    fn uploaded_targets(&self) -> Vec<(SlotRole, String)> {
        self.slots
            .iter()
            .filter_map(|slot| Some((slot.role(), slot.image_id()?.to_string())))
            .collect()
    }
}

/// Decode base64 image data, with or without a `data:` URL prefix.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = if data.starts_with("data:") {
        data.split_once(',').map_or(data, |(_, encoded)| encoded)
    } else {
        data
    };
    BASE64.decode(payload.trim())
}
