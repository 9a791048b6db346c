//! Frame composition: base image plus point markers, drawn with tiny-skia.

use image::RgbaImage;
use tiny_skia::{ColorU8, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::constants::MARKER_OUTLINE_WIDTH;
use crate::model::{FeatureCategory, FeaturePoint, PointId, SlotRole};

use super::Generation;

/// A marker as it was drawn into a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point_id: PointId,
    pub x: f32,
    pub y: f32,
    pub label: String,
    pub category: FeatureCategory,
    pub automatic: bool,
}

impl From<&FeaturePoint> for Marker {
    fn from(point: &FeaturePoint) -> Self {
        Self {
            point_id: point.id,
            x: point.x,
            y: point.y,
            label: point.label.clone(),
            category: point.category,
            automatic: point.is_automatic(),
        }
    }
}

/// The rendered state of one slot.
#[derive(Debug, Clone)]
pub struct Frame {
    pub slot: SlotRole,
    /// Generation of the redraw request that produced this frame
    pub generation: Generation,
    pub image: RgbaImage,
    pub markers: Vec<Marker>,
}

impl Frame {
    /// Draw `points` onto `image` and wrap the result.
    pub fn compose(
        slot: SlotRole,
        generation: Generation,
        mut image: RgbaImage,
        points: &[FeaturePoint],
        radius: f32,
    ) -> Self {
        draw_markers(&mut image, points, radius);
        Self {
            slot,
            generation,
            image,
            markers: points.iter().map(Marker::from).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back.
///
/// Pixmaps hold premultiplied alpha while `RgbaImage` holds straight alpha,
/// so pixels are converted on the way in and out.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let premultiplied = img
        .pixels()
        .flat_map(|pixel| {
            let [r, g, b, a] = pixel.0;
            let color = ColorU8::from_rgba(r, g, b, a).premultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();
    let Some(mut pixmap) = Pixmap::from_vec(premultiplied, size) else {
        return;
    };

    f(&mut pixmap);

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
}

/// Draw one filled, white-outlined circle per point in its category color.
pub fn draw_markers(img: &mut RgbaImage, points: &[FeaturePoint], radius: f32) {
    if points.is_empty() || radius <= 0.0 {
        return;
    }

    with_pixmap(img, |pixmap| {
        let mut outline = Paint::default();
        outline.set_color_rgba8(255, 255, 255, 255);
        outline.anti_alias = true;
        let stroke = Stroke {
            width: MARKER_OUTLINE_WIDTH,
            ..Stroke::default()
        };

        for point in points {
            let Some(path) = PathBuilder::from_circle(point.x, point.y, radius) else {
                continue;
            };
            let [r, g, b] = point.category.color();
            let mut fill = Paint::default();
            fill.set_color_rgba8(r, g, b, 255);
            fill.anti_alias = true;

            pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
            pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        }
    });
}
