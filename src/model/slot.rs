//! The three image slots and their displayable images.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use facemark_api::ProcessingInfo;

use super::store::PointStore;

/// One of the three fixed image roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotRole {
    Reference,
    CompareA,
    CompareB,
}

impl SlotRole {
    /// Get all roles in slot order.
    pub fn all() -> &'static [SlotRole; 3] {
        &[SlotRole::Reference, SlotRole::CompareA, SlotRole::CompareB]
    }

    /// Position of this role in slot order.
    pub fn index(&self) -> usize {
        match self {
            SlotRole::Reference => 0,
            SlotRole::CompareA => 1,
            SlotRole::CompareB => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SlotRole::Reference => "reference",
            SlotRole::CompareA => "compareA",
            SlotRole::CompareB => "compareB",
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded image bytes plus their pixel dimensions.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct ImageSource {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl ImageSource {
    /// Wrap encoded image bytes, reading only the header for dimensions.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let (width, height) = image::ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()?;
        Ok(Self {
            bytes: bytes.into(),
            width,
            height,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Which image a slot currently displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// The image as uploaded
    Original,
    /// The normalized image returned by face detection
    Processed,
}

/// One image role with its identifier, images and points.
///
/// Point coordinates are always relative to the active image. Every time the
/// active image changes, `image_generation` is bumped and the points are
/// dropped, since they cannot be carried across coordinate spaces.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    role: SlotRole,
    image_id: Option<String>,
    original: Option<ImageSource>,
    processed: Option<ImageSource>,
    processing_info: Option<ProcessingInfo>,
    image_generation: u64,
    pub points: PointStore,
}

impl ImageSlot {
    pub fn new(role: SlotRole) -> Self {
        Self {
            role,
            image_id: None,
            original: None,
            processed: None,
            processing_info: None,
            image_generation: 0,
            points: PointStore::new(),
        }
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }

    /// Backend identifier, absent until the upload succeeds.
    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn is_uploaded(&self) -> bool {
        self.image_id.is_some()
    }

    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }

    pub fn processing_info(&self) -> Option<&ProcessingInfo> {
        self.processing_info.as_ref()
    }

    /// Counter bumped whenever the active image (and so the coordinate space) changes.
    pub fn image_generation(&self) -> u64 {
        self.image_generation
    }

    /// The image points are placed against: processed if present, else original.
    pub fn active_image(&self) -> Option<&ImageSource> {
        self.processed.as_ref().or(self.original.as_ref())
    }

    pub fn active_kind(&self) -> Option<ImageKind> {
        if self.processed.is_some() {
            Some(ImageKind::Processed)
        } else if self.original.is_some() {
            Some(ImageKind::Original)
        } else {
            None
        }
    }

    /// Whether manual editing is allowed: uploaded and displaying an image.
    pub fn is_editable(&self) -> bool {
        self.is_uploaded() && self.active_image().is_some()
    }

    /// Record a completed upload. Returns the number of points dropped.
    pub fn set_uploaded(&mut self, image_id: String, original: ImageSource) -> usize {
        self.image_id = Some(image_id);
        self.original = Some(original);
        self.processed = None;
        self.processing_info = None;
        self.swap_coordinate_space()
    }

    /// Record a successful detection. Returns the number of points dropped.
    pub fn set_processed(&mut self, processed: ImageSource, info: Option<ProcessingInfo>) -> usize {
        self.processed = Some(processed);
        self.processing_info = info;
        self.swap_coordinate_space()
    }

    fn swap_coordinate_space(&mut self) -> usize {
        self.image_generation += 1;
        let dropped = self.points.len();
        if dropped > 0 {
            log::info!(
                "{}: active image changed, dropping {} points from previous image",
                self.role,
                dropped
            );
        }
        self.points.clear();
        dropped
    }
}

/// The three slots of a session, indexed by role.
#[derive(Debug, Clone)]
pub struct Slots {
    slots: [ImageSlot; 3],
}

impl Default for Slots {
    fn default() -> Self {
        Self::new()
    }
}

impl Slots {
    pub fn new() -> Self {
        Self {
            slots: [
                ImageSlot::new(SlotRole::Reference),
                ImageSlot::new(SlotRole::CompareA),
                ImageSlot::new(SlotRole::CompareB),
            ],
        }
    }

    pub fn get(&self, role: SlotRole) -> &ImageSlot {
        &self.slots[role.index()]
    }

    pub fn get_mut(&mut self, role: SlotRole) -> &mut ImageSlot {
        &mut self.slots[role.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ImageSlot> {
        self.slots.iter_mut()
    }

    pub fn all_uploaded(&self) -> bool {
        self.slots.iter().all(ImageSlot::is_uploaded)
    }

    /// Point counts in slot order.
    pub fn counts(&self) -> [usize; 3] {
        [
            self.slots[0].points.len(),
            self.slots[1].points.len(),
            self.slots[2].points.len(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureCategory;
    use crate::testing::png_bytes;

    #[test]
    fn test_image_source_reads_dimensions() {
        let source = ImageSource::from_bytes(png_bytes(40, 30)).expect("valid png");
        assert_eq!((source.width(), source.height()), (40, 30));
    }

    #[test]
    fn test_image_source_rejects_garbage() {
        assert!(ImageSource::from_bytes(vec![1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_new_slot_is_not_editable() {
        let slot = ImageSlot::new(SlotRole::CompareA);
        assert!(!slot.is_uploaded());
        assert!(!slot.is_editable());
        assert_eq!(slot.active_kind(), None);
    }

    #[test]
    fn test_processed_image_replaces_coordinate_space() {
        let mut slot = ImageSlot::new(SlotRole::Reference);
        let original = ImageSource::from_bytes(png_bytes(100, 100)).expect("png");
        slot.set_uploaded("img-1".to_string(), original);
        assert_eq!(slot.active_kind(), Some(ImageKind::Original));
        assert!(slot.is_editable());

        slot.points.add(10.0, 10.0, FeatureCategory::Nose);
        let generation = slot.image_generation();

        let processed = ImageSource::from_bytes(png_bytes(64, 64)).expect("png");
        let dropped = slot.set_processed(processed, None);

        assert_eq!(dropped, 1);
        assert!(slot.points.is_empty());
        assert_eq!(slot.active_kind(), Some(ImageKind::Processed));
        assert_eq!(slot.active_image().map(ImageSource::width), Some(64));
        assert!(slot.image_generation() > generation);
    }

    #[test]
    fn test_reupload_discards_processed_image() {
        let mut slot = ImageSlot::new(SlotRole::CompareB);
        let png = || ImageSource::from_bytes(png_bytes(8, 8)).expect("png");
        slot.set_uploaded("a".to_string(), png());
        slot.set_processed(png(), None);
        slot.set_uploaded("b".to_string(), png());
        assert_eq!(slot.image_id(), Some("b"));
        assert!(!slot.is_processed());
    }

    #[test]
    fn test_slots_indexed_by_role() {
        let mut slots = Slots::new();
        slots.get_mut(SlotRole::CompareB).points.add(1.0, 1.0, FeatureCategory::Mouth);
        assert_eq!(slots.counts(), [0, 0, 1]);
        for role in SlotRole::all() {
            assert_eq!(slots.get(*role).role(), *role);
        }
        assert!(!slots.all_uploaded());
    }
}
