//! Per-image ordered point storage.
//!
//! The store owns the labeling rule: within each category, manual points are
//! labeled `<Category>_<n>` with `n` running 1..=count in insertion order.
//! Automatic points keep the label the extraction service gave them.

use facemark_api::WirePoint;

use super::category::FeatureCategory;
use super::point::{FeaturePoint, PointId, Provenance};
use crate::geometry::{self, ImagePoint};

/// Ordered collection of feature points for one slot.
#[derive(Debug, Clone)]
pub struct PointStore {
    points: Vec<FeaturePoint>,
    /// Counter for generating unique point IDs.
    next_id: PointId,
}

impl Default for PointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PointStore {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> PointId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Label for the `n`th manual point (1-based) of a category.
    pub fn manual_label(category: FeatureCategory, n: usize) -> String {
        format!("{}_{}", category.name(), n)
    }

    /// Append a manual point and return its ID.
    pub fn add(&mut self, x: f32, y: f32, category: FeatureCategory) -> PointId {
        let id = self.allocate_id();
        let n = self.manual_count_in(category) + 1;
        self.points.push(FeaturePoint {
            id,
            x,
            y,
            category,
            label: Self::manual_label(category, n),
            provenance: Provenance::Manual,
        });
        id
    }

    /// Move a point. The label is left unchanged.
    /// Returns false if the index is out of range.
    pub fn move_to(&mut self, index: usize, x: f32, y: f32) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                point.x = x;
                point.y = y;
                true
            }
            None => false,
        }
    }

    /// Remove a point and relabel the remaining manual points of its category.
    pub fn remove_at(&mut self, index: usize) -> Option<FeaturePoint> {
        if index >= self.points.len() {
            return None;
        }
        let removed = self.points.remove(index);
        if removed.is_manual() {
            self.relabel(removed.category);
        }
        Some(removed)
    }

    /// Drop every automatic point and append `new_points` after the manual ones.
    ///
    /// Manual points keep their count, order, coordinates and labels. Incoming
    /// points without automatic provenance are skipped.
    pub fn replace_automatic(&mut self, new_points: impl IntoIterator<Item = FeaturePoint>) {
        self.points.retain(FeaturePoint::is_manual);
        for mut point in new_points {
            if point.is_manual() {
                log::warn!("Ignoring manual point '{}' in automatic batch", point.label);
                continue;
            }
            point.id = self.allocate_id();
            self.points.push(point);
        }
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Remove only automatic points. Returns how many were removed.
    pub fn clear_automatic(&mut self) -> usize {
        let before = self.points.len();
        self.points.retain(FeaturePoint::is_manual);
        before - self.points.len()
    }

    /// Recompute manual labels of one category from the current ordering.
    fn relabel(&mut self, category: FeatureCategory) {
        let mut n = 0;
        for point in self
            .points
            .iter_mut()
            .filter(|p| p.is_manual() && p.category == category)
        {
            n += 1;
            point.label = Self::manual_label(category, n);
        }
    }

    /// Find the topmost point within `radius` of `query`.
    ///
    /// Later points are drawn on top, so the search runs newest first.
    pub fn hit_test(&self, query: ImagePoint, radius: f32) -> Option<usize> {
        self.points
            .iter()
            .rposition(|p| geometry::hit_test(query, p.position(), radius))
    }

    pub fn get(&self, index: usize) -> Option<&FeaturePoint> {
        self.points.get(index)
    }

    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeaturePoint> {
        self.points.iter()
    }

    pub fn points(&self) -> &[FeaturePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn manual_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_manual()).count()
    }

    pub fn automatic_count(&self) -> usize {
        self.len() - self.manual_count()
    }

    pub fn manual_count_in(&self, category: FeatureCategory) -> usize {
        self.points
            .iter()
            .filter(|p| p.is_manual() && p.category == category)
            .count()
    }

    /// Export the full point list in backend form.
    pub fn to_wire(&self) -> Vec<WirePoint> {
        self.points.iter().map(FeaturePoint::to_wire).collect()
    }
}
