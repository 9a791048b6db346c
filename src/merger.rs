//! Automatic feature extraction and its merge into the point stores.
//!
//! Extraction is validated up front, then fanned out to every processed slot.
//! Each slot succeeds or fails on its own: a failing slot keeps its points
//! untouched while the others receive their automatic points.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use facemark_api::{
    ApiError, Backend, ExtractionParameters, ExtractionRequest, FeatureTypeInfo,
};

use crate::constants::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::fanout::fan_out;
use crate::model::{FeatureCategory, FeaturePoint, SlotRole, Slots};

/// Parameters of an automatic extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionParams {
    /// Categories to extract
    pub feature_types: Vec<FeatureCategory>,
    /// Requested number of points per category
    pub points_per_type: BTreeMap<FeatureCategory, u32>,
    /// Minimum detector confidence (0.0-1.0)
    pub confidence_threshold: f32,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        let points_per_type = BTreeMap::from([
            (FeatureCategory::RightEye, 4),
            (FeatureCategory::LeftEye, 4),
            (FeatureCategory::Nose, 3),
            (FeatureCategory::Mouth, 4),
            (FeatureCategory::FaceContour, 8),
        ]);
        Self {
            feature_types: vec![
                FeatureCategory::RightEye,
                FeatureCategory::LeftEye,
                FeatureCategory::Nose,
                FeatureCategory::Mouth,
            ],
            points_per_type,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ExtractionParams {
    /// Convert to the backend's parameter body.
    pub fn to_wire(&self) -> ExtractionParameters {
        ExtractionParameters {
            feature_types: self
                .feature_types
                .iter()
                .map(|c| c.wire_name().to_string())
                .collect(),
            points_per_type: self
                .points_per_type
                .iter()
                .map(|(c, n)| (c.wire_name().to_string(), *n))
                .collect(),
            confidence_threshold: self.confidence_threshold,
        }
    }
}

/// Server-declared capabilities: available categories and their point maximums.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureLimits {
    available: BTreeSet<FeatureCategory>,
    max_points: BTreeMap<FeatureCategory, u32>,
}

impl FeatureLimits {
    pub fn from_wire(info: &FeatureTypeInfo) -> Self {
        let mut max_points = BTreeMap::new();
        for (name, max) in &info.max_points_per_type {
            match FeatureCategory::parse_wire(name) {
                Some(category) => {
                    max_points.insert(category, *max);
                }
                None => log::debug!("Ignoring unknown feature type '{}' from server", name),
            }
        }

        let mut available: BTreeSet<_> = info
            .available_feature_types
            .iter()
            .filter_map(|name| FeatureCategory::parse_wire(name))
            .collect();
        if available.is_empty() {
            available = max_points.keys().copied().collect();
        }

        Self {
            available,
            max_points,
        }
    }

    pub fn is_available(&self, category: FeatureCategory) -> bool {
        self.available.contains(&category)
    }

    pub fn max_points(&self, category: FeatureCategory) -> Option<u32> {
        self.max_points.get(&category).copied()
    }
}

/// Every reason a parameter set was rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, error: String) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join("; "))
    }
}

/// Why a multi-slot operation did not run at all.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Required state is missing (nothing uploaded or processed yet)
    #[error("{0}")]
    Precondition(String),

    /// Parameters rejected before any extraction call was made
    #[error("Invalid extraction parameters: {0}")]
    Validation(ValidationReport),
}

/// Per-slot outcome of a multi-slot operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Slots that succeeded, with the number of points added or removed
    pub succeeded: Vec<(SlotRole, usize)>,
    /// Slots that failed, with the reason
    pub failed: Vec<(SlotRole, String)>,
}

impl MergeReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Any successful slot makes the whole operation a success.
    pub fn is_success(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Slots whose points changed.
    pub fn affected(&self) -> impl Iterator<Item = SlotRole> + '_ {
        self.succeeded.iter().map(|(role, _)| *role)
    }

    pub fn summary(&self, action: &str) -> String {
        if self.is_success() {
            format!(
                "{} completed for {} of {} images",
                action,
                self.success_count(),
                self.total()
            )
        } else {
            format!("{} failed for all {} images", action, self.total())
        }
    }
}

/// Runs extraction and clear-automatic against the backend.
pub struct AutoFeatureMerger {
    backend: Arc<dyn Backend>,
    limits: Option<FeatureLimits>,
}

impl AutoFeatureMerger {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            limits: None,
        }
    }

    /// Fetch and cache the server's feature type limits.
    pub fn load_limits(&mut self) -> Result<&FeatureLimits, ApiError> {
        let info = self.backend.available_feature_types()?;
        let limits = FeatureLimits::from_wire(&info);
        log::debug!("Loaded feature limits: {:?}", limits.max_points);
        Ok(self.limits.insert(limits))
    }

    pub fn limits(&self) -> Option<&FeatureLimits> {
        self.limits.as_ref()
    }

    /// Check parameters locally, then with the server. Errors from both are collected.
    pub fn validate(&mut self, params: &ExtractionParams) -> Result<(), ValidationReport> {
        if self.limits.is_none() {
            if let Err(e) = self.load_limits() {
                log::warn!("Could not load feature limits, relying on server validation: {}", e);
            }
        }

        let mut report = self.check_locally(params);

        match self.backend.validate_parameters(&params.to_wire()) {
            Ok(response) => {
                for warning in &response.warnings {
                    log::warn!("Extraction parameter warning: {}", warning);
                }
                if !response.valid && response.errors.is_empty() {
                    report.push("Parameters rejected by server".to_string());
                }
                for error in response.errors {
                    report.push(error);
                }
            }
            Err(e) => report.push(format!("Could not reach parameter validation: {}", e)),
        }

        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }

    fn check_locally(&self, params: &ExtractionParams) -> ValidationReport {
        let mut report = ValidationReport::default();

        if params.feature_types.is_empty() {
            report.push("Select at least one feature type".to_string());
        }
        if let Some(limits) = &self.limits {
            for category in &params.feature_types {
                if !limits.is_available(*category) {
                    report.push(format!("Unknown feature type: {}", category.wire_name()));
                }
            }
        }

        for (category, count) in &params.points_per_type {
            if *count == 0 {
                report.push(format!(
                    "{}: point count must be at least 1",
                    category.wire_name()
                ));
                continue;
            }
            let max = self.limits.as_ref().and_then(|l| l.max_points(*category));
            if let Some(max) = max {
                if *count > max {
                    report.push(format!(
                        "{}: point count exceeds maximum ({} > {})",
                        category.wire_name(),
                        count,
                        max
                    ));
                }
            }
        }

        let threshold = params.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            report.push(format!(
                "Confidence threshold must be between 0 and 1 (got {})",
                threshold
            ));
        }

        report
    }

    /// Validate, then extract for every processed slot and merge the results.
    pub fn extract(
        &mut self,
        slots: &mut Slots,
        params: &ExtractionParams,
    ) -> Result<MergeReport, MergeError> {
        let targets: Vec<(SlotRole, String)> = slots
            .iter()
            .filter(|slot| slot.is_processed())
            .filter_map(|slot| Some((slot.role(), slot.image_id()?.to_string())))
            .collect();
        if targets.is_empty() {
            return Err(MergeError::Precondition(
                "No processed images; run face detection first".to_string(),
            ));
        }

        self.validate(params).map_err(MergeError::Validation)?;

        let parameters = params.to_wire();
        let backend = &self.backend;
        let results = fan_out(targets, |image_id| {
            backend.extract_auto_features(&ExtractionRequest {
                image_id: image_id.to_string(),
                parameters: parameters.clone(),
            })
        });

        let mut report = MergeReport::default();
        for (role, result) in results {
            match result {
                Ok(response) if response.success => {
                    let returned = response.feature_points.len();
                    let points: Vec<FeaturePoint> = response
                        .feature_points
                        .iter()
                        .filter_map(FeaturePoint::from_extracted)
                        .collect();
                    if points.len() < returned {
                        log::warn!(
                            "{}: skipped {} extracted points without landmark index",
                            role,
                            returned - points.len()
                        );
                    }
                    let added = points.len();
                    slots.get_mut(role).points.replace_automatic(points);
                    log::info!("{}: merged {} automatic points", role, added);
                    report.succeeded.push((role, added));
                }
                Ok(response) => {
                    log::warn!("{}: extraction unsuccessful: {}", role, response.message);
                    report.failed.push((role, response.message));
                }
                Err(e) => {
                    log::warn!("{}: extraction failed: {}", role, e);
                    report.failed.push((role, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Delete server-side automatic points per slot and strip them locally where that worked.
    pub fn clear_automatic(&self, slots: &mut Slots) -> Result<MergeReport, MergeError> {
        let targets: Vec<(SlotRole, String)> = slots
            .iter()
            .filter_map(|slot| Some((slot.role(), slot.image_id()?.to_string())))
            .collect();
        if targets.is_empty() {
            return Err(MergeError::Precondition("No images uploaded".to_string()));
        }

        let backend = &self.backend;
        let results = fan_out(targets, |image_id| backend.clear_auto_features(image_id));

        let mut report = MergeReport::default();
        for (role, result) in results {
            match result {
                Ok(_) => {
                    let removed = slots.get_mut(role).points.clear_automatic();
                    log::info!("{}: cleared {} automatic points", role, removed);
                    report.succeeded.push((role, removed));
                }
                Err(e) => {
                    log::warn!("{}: clearing automatic points failed: {}", role, e);
                    report.failed.push((role, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}
