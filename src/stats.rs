//! Per-slot point statistics.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{FeatureCategory, ImageSlot, SlotRole};

/// How the points of one category were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMix {
    Manual,
    Automatic,
    Mixed,
}

/// Manual and automatic point counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCount {
    pub manual: usize,
    pub automatic: usize,
}

impl CategoryCount {
    pub fn total(&self) -> usize {
        self.manual + self.automatic
    }

    pub fn mix(&self) -> Option<CategoryMix> {
        match (self.manual, self.automatic) {
            (0, 0) => None,
            (_, 0) => Some(CategoryMix::Manual),
            (0, _) => Some(CategoryMix::Automatic),
            _ => Some(CategoryMix::Mixed),
        }
    }
}

/// Point counts of one slot, overall and per category.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotStatistics {
    pub role: SlotRole,
    pub total: usize,
    pub manual: usize,
    pub automatic: usize,
    pub by_category: BTreeMap<FeatureCategory, CategoryCount>,
}

impl SlotStatistics {
    pub fn collect(slot: &ImageSlot) -> Self {
        let mut by_category: BTreeMap<FeatureCategory, CategoryCount> = BTreeMap::new();
        for point in slot.points.iter() {
            let count = by_category.entry(point.category).or_default();
            if point.is_manual() {
                count.manual += 1;
            } else {
                count.automatic += 1;
            }
        }

        Self {
            role: slot.role(),
            total: slot.points.len(),
            manual: slot.points.manual_count(),
            automatic: slot.points.automatic_count(),
            by_category,
        }
    }
}

impl fmt::Display for SlotStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} points ({} manual, {} automatic)",
            self.role, self.total, self.manual, self.automatic
        )?;
        for (category, count) in &self.by_category {
            let mix = match count.mix() {
                Some(CategoryMix::Manual) => "manual",
                Some(CategoryMix::Automatic) => "auto",
                Some(CategoryMix::Mixed) => "mixed",
                None => continue,
            };
            write!(f, "\n  {}: {} [{}]", category, count.total(), mix)?;
        }
        Ok(())
    }
}
