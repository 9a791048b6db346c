//! Coordinate transforms and hit-testing.
//!
//! Pointer positions arrive in display space (CSS pixels of the rendered
//! canvas). Everything stored in a point store lives in image pixel space of
//! the slot's active image, so every pointer event passes through
//! [`to_image_coordinates`] first.

/// A 2D point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &ImagePoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Pointer position in display space (e.g. `clientX`/`clientY`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPosition {
    pub x: f32,
    pub y: f32,
}

impl ScreenPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where a canvas sits on screen and how large its backing image is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    /// Left edge of the rendered canvas in display space
    pub left: f32,
    /// Top edge of the rendered canvas in display space
    pub top: f32,
    /// On-screen width of the canvas
    pub rendered_width: f32,
    /// On-screen height of the canvas
    pub rendered_height: f32,
    /// Intrinsic canvas resolution (image pixels)
    pub intrinsic_width: u32,
    pub intrinsic_height: u32,
}

impl CanvasMetrics {
    /// Metrics for a canvas drawn 1:1 at the display origin.
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            rendered_width: width as f32,
            rendered_height: height as f32,
            intrinsic_width: width,
            intrinsic_height: height,
        }
    }

    /// Scale factors from display space to image space.
    /// Returns None if the canvas is not rendered (zero size).
    pub fn scale(&self) -> Option<(f32, f32)> {
        if self.rendered_width <= 0.0 || self.rendered_height <= 0.0 {
            return None;
        }
        Some((
            self.intrinsic_width as f32 / self.rendered_width,
            self.intrinsic_height as f32 / self.rendered_height,
        ))
    }
}

/// Map a display-space pointer position into image pixel coordinates.
///
/// The offset from the canvas origin is scaled by the ratio of intrinsic
/// resolution to rendered size. Returns None for an unrendered canvas.
pub fn to_image_coordinates(pointer: ScreenPosition, canvas: &CanvasMetrics) -> Option<ImagePoint> {
    let (scale_x, scale_y) = canvas.scale()?;
    Some(ImagePoint::new(
        (pointer.x - canvas.left) * scale_x,
        (pointer.y - canvas.top) * scale_y,
    ))
}

/// True iff `query` lies within `radius` (inclusive) of `target`.
pub fn hit_test(query: ImagePoint, target: ImagePoint, radius: f32) -> bool {
    let dx = query.x - target.x;
    let dy = query.y - target.y;
    dx * dx + dy * dy <= radius * radius
}
