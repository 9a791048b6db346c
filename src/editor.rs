//! Pointer-driven point editing.
//!
//! The editor turns pointer events into point store mutations and reports what
//! the session has to do afterwards as a list of [`Effect`]s. It owns the one
//! drag session of the whole application.

use crate::geometry::{CanvasMetrics, ImagePoint, ScreenPosition, to_image_coordinates};
use crate::model::{FeatureCategory, PointId, SlotRole, Slots};

/// A pointer position on one slot's canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub slot: SlotRole,
    pub position: ScreenPosition,
    pub canvas: CanvasMetrics,
}

/// Input events consumed by the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    PointerDown(Pointer),
    PointerMove(Pointer),
    PointerUp(Pointer),
    /// Alternate action (right click) deleting the point under the pointer
    SecondaryAction(Pointer),
}

impl EditorEvent {
    pub fn pointer(&self) -> &Pointer {
        match self {
            EditorEvent::PointerDown(p)
            | EditorEvent::PointerMove(p)
            | EditorEvent::PointerUp(p)
            | EditorEvent::SecondaryAction(p) => p,
        }
    }
}

/// Follow-up work requested by an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The slot's frame is out of date
    Redraw(SlotRole),
    /// The slot's point set should be pushed to the backend
    Persist(SlotRole),
    /// Transient message for the operator
    Advisory(String),
}

/// The point currently being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub slot: SlotRole,
    pub point_id: PointId,
    /// Image position of the pointer-down that started the drag
    pub origin: ImagePoint,
}

/// How pointer clicks on a canvas are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkingMode {
    /// Clicks add, drag and delete points
    #[default]
    Manual,
    /// Points come from automatic extraction; clicks only show an advisory
    Auto,
}

/// Editor state machine: `Idle` when `drag` is `None`, `Dragging` otherwise.
#[derive(Debug, Clone)]
pub struct Editor {
    drag: Option<DragSession>,
    category: FeatureCategory,
    mode: MarkingMode,
    radius: f32,
}

impl Editor {
    pub fn new(radius: f32) -> Self {
        Self {
            drag: None,
            category: FeatureCategory::default(),
            mode: MarkingMode::default(),
            radius,
        }
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn category(&self) -> FeatureCategory {
        self.category
    }

    /// Category used by subsequent manual adds.
    pub fn set_category(&mut self, category: FeatureCategory) {
        self.category = category;
    }

    pub fn mode(&self) -> MarkingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MarkingMode) {
        self.mode = mode;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Drop the drag session if it belongs to `slot`. Returns `true` if one was dropped.
    pub fn cancel_drag_for(&mut self, slot: SlotRole) -> bool {
        if self.drag.is_some_and(|d| d.slot == slot) {
            log::debug!("{}: drag cancelled", slot);
            self.drag = None;
            true
        } else {
            false
        }
    }

    /// Apply one event to the slots.
    pub fn handle(&mut self, slots: &mut Slots, event: EditorEvent) -> Vec<Effect> {
        match event {
            EditorEvent::PointerDown(pointer) => self.pointer_down(slots, pointer),
            EditorEvent::PointerMove(pointer) => self.pointer_move(slots, pointer),
            EditorEvent::PointerUp(pointer) => self.pointer_up(pointer),
            EditorEvent::SecondaryAction(pointer) => self.secondary_action(slots, pointer),
        }
    }

    fn pointer_down(&mut self, slots: &mut Slots, pointer: Pointer) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(drag) = self.drag {
            if drag.slot != pointer.slot {
                log::debug!(
                    "{}: pointer down ignored, {} is mid-drag",
                    pointer.slot,
                    drag.slot
                );
                return effects;
            }
            // The pointer-up for the previous drag never arrived
            log::warn!("{}: pointer down during drag, ending previous drag", drag.slot);
            self.drag = None;
            effects.push(Effect::Persist(drag.slot));
        }

        let Some(query) = self.locate(slots, &pointer, &mut effects) else {
            return effects;
        };

        let store = &mut slots.get_mut(pointer.slot).points;
        match store.hit_test(query, self.radius) {
            Some(index) => {
                if let Some(point) = store.get(index) {
                    log::debug!("{}: start dragging {}", pointer.slot, point.label);
                    self.drag = Some(DragSession {
                        slot: pointer.slot,
                        point_id: point.id,
                        origin: query,
                    });
                }
            }
            None => {
                store.add(query.x, query.y, self.category);
                effects.push(Effect::Redraw(pointer.slot));
                push_persist(&mut effects, pointer.slot);
            }
        }
        effects
    }

    fn pointer_move(&mut self, slots: &mut Slots, pointer: Pointer) -> Vec<Effect> {
        let Some(drag) = self.drag else {
            return Vec::new();
        };
        if drag.slot != pointer.slot {
            return Vec::new();
        }
        let Some(target) = map_to_image(slots, &pointer) else {
            return Vec::new();
        };

        let store = &mut slots.get_mut(drag.slot).points;
        let Some(index) = store.index_of(drag.point_id) else {
            log::debug!("{}: dragged point no longer exists", drag.slot);
            self.drag = None;
            return Vec::new();
        };
        if store.move_to(index, target.x, target.y) {
            vec![Effect::Redraw(drag.slot)]
        } else {
            Vec::new()
        }
    }

    fn pointer_up(&mut self, pointer: Pointer) -> Vec<Effect> {
        match self.drag {
            Some(drag) if drag.slot == pointer.slot => {
                self.drag = None;
                vec![Effect::Persist(drag.slot)]
            }
            _ => Vec::new(),
        }
    }

    fn secondary_action(&mut self, slots: &mut Slots, pointer: Pointer) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.drag.is_some() {
            return effects;
        }
        let Some(query) = self.locate(slots, &pointer, &mut effects) else {
            return effects;
        };

        let store = &mut slots.get_mut(pointer.slot).points;
        if let Some(index) = store.hit_test(query, self.radius) {
            if let Some(removed) = store.remove_at(index) {
                log::debug!("{}: removed {}", pointer.slot, removed.label);
                effects.push(Effect::Redraw(pointer.slot));
                effects.push(Effect::Persist(pointer.slot));
            }
        }
        effects
    }

    /// Gate an edit on the slot and mode, then map the pointer into image space.
    fn locate(&self, slots: &Slots, pointer: &Pointer, effects: &mut Vec<Effect>) -> Option<ImagePoint> {
        let slot = slots.get(pointer.slot);
        if !slot.is_editable() {
            log::debug!("{}: no image yet, edit ignored", pointer.slot);
            return None;
        }
        if self.mode == MarkingMode::Auto {
            effects.push(Effect::Advisory(
                "Automatic marking mode is active; switch to manual mode to edit points".to_string(),
            ));
            return None;
        }
        map_to_image(slots, pointer)
    }
}

/// Map a pointer into the slot's active image.
///
/// The canvas must describe the image the slot displays now; a canvas still
/// sized for a replaced image, or a position off the image, maps to nothing.
fn map_to_image(slots: &Slots, pointer: &Pointer) -> Option<ImagePoint> {
    let image = slots.get(pointer.slot).active_image()?;
    let (width, height) = (image.width(), image.height());
    let canvas = &pointer.canvas;
    if (canvas.intrinsic_width, canvas.intrinsic_height) != (width, height) {
        log::debug!(
            "{}: canvas is {}x{} but the active image is {}x{}, edit ignored",
            pointer.slot,
            canvas.intrinsic_width,
            canvas.intrinsic_height,
            width,
            height
        );
        return None;
    }

    let point = to_image_coordinates(pointer.position, canvas)?;
    if point.x < 0.0 || point.y < 0.0 || point.x > width as f32 || point.y > height as f32 {
        log::debug!(
            "{}: ({:.1}, {:.1}) lies outside the image, edit ignored",
            pointer.slot,
            point.x,
            point.y
        );
        return None;
    }
    Some(point)
}

fn push_persist(effects: &mut Vec<Effect>, slot: SlotRole) {
    if !effects.contains(&Effect::Persist(slot)) {
        effects.push(Effect::Persist(slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageSource;
    use crate::testing::png_bytes;

    fn slots_with_images() -> Slots {
        let mut slots = Slots::new();
        for (i, role) in SlotRole::all().iter().enumerate() {
            let source = ImageSource::from_bytes(png_bytes(200, 200)).expect("png");
            slots.get_mut(*role).set_uploaded(format!("img-{}", i + 1), source);
        }
        slots
    }

    fn at(slot: SlotRole, x: f32, y: f32) -> Pointer {
        Pointer {
            slot,
            position: ScreenPosition::new(x, y),
            canvas: CanvasMetrics::unscaled(200, 200),
        }
    }

    #[test]
    fn test_click_on_empty_area_adds_point() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        editor.set_category(FeatureCategory::Nose);

        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::Reference, 50.0, 60.0)));

        assert_eq!(
            effects,
            vec![Effect::Redraw(SlotRole::Reference), Effect::Persist(SlotRole::Reference)]
        );
        let point = slots.get(SlotRole::Reference).points.get(0).expect("added");
        assert_eq!((point.x, point.y), (50.0, 60.0));
        assert_eq!(point.label, "Nose_1");
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_scaled_canvas_maps_to_image_space() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let pointer = Pointer {
            slot: SlotRole::CompareA,
            position: ScreenPosition::new(60.0, 35.0),
            canvas: CanvasMetrics {
                left: 10.0,
                top: 10.0,
                rendered_width: 100.0,
                rendered_height: 100.0,
                intrinsic_width: 200,
                intrinsic_height: 200,
            },
        };
        editor.handle(&mut slots, EditorEvent::PointerDown(pointer));
        let point = slots.get(SlotRole::CompareA).points.get(0).expect("added");
        assert_eq!((point.x, point.y), (100.0, 50.0));
    }

    #[test]
    fn test_drag_moves_point_then_persists() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::CompareB;
        editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 50.0, 50.0)));

        assert!(editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 55.0, 52.0))).is_empty());
        assert!(editor.is_dragging());

        let effects = editor.handle(&mut slots, EditorEvent::PointerMove(at(slot, 120.0, 80.0)));
        assert_eq!(effects, vec![Effect::Redraw(slot)]);
        let effects = editor.handle(&mut slots, EditorEvent::PointerUp(at(slot, 120.0, 80.0)));
        assert_eq!(effects, vec![Effect::Persist(slot)]);
        assert!(!editor.is_dragging());

        let store = &slots.get(slot).points;
        assert_eq!(store.len(), 1);
        let point = store.get(0).expect("point");
        assert_eq!((point.x, point.y), (120.0, 80.0));
        assert_eq!(point.label, "RightEye_1");
    }

    #[test]
    fn test_topmost_point_wins_on_overlap() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::Reference;
        slots.get_mut(slot).points.add(50.0, 50.0, FeatureCategory::Nose);
        let top = slots.get_mut(slot).points.add(54.0, 50.0, FeatureCategory::Nose);

        editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 52.0, 50.0)));
        assert_eq!(editor.drag().map(|d| d.point_id), Some(top));
    }

    #[test]
    fn test_drag_is_exclusive_to_one_slot() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        slots.get_mut(SlotRole::Reference).points.add(50.0, 50.0, FeatureCategory::Mouth);
        editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::Reference, 50.0, 50.0)));

        // Another slot cannot add or start dragging while the drag is active
        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::CompareA, 10.0, 10.0)));
        assert!(effects.is_empty());
        assert!(slots.get(SlotRole::CompareA).points.is_empty());

        // Moves and ups from other slots are ignored
        assert!(editor.handle(&mut slots, EditorEvent::PointerMove(at(SlotRole::CompareA, 90.0, 90.0))).is_empty());
        assert!(editor.handle(&mut slots, EditorEvent::PointerUp(at(SlotRole::CompareA, 90.0, 90.0))).is_empty());
        assert_eq!(editor.drag().map(|d| d.slot), Some(SlotRole::Reference));

        let point = slots.get(SlotRole::Reference).points.get(0).expect("point");
        assert_eq!((point.x, point.y), (50.0, 50.0));
    }

    #[test]
    fn test_secondary_action_deletes_and_relabels_category() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::Reference;
        {
            let store = &mut slots.get_mut(slot).points;
            store.add(10.0, 10.0, FeatureCategory::Nose);
            store.add(40.0, 10.0, FeatureCategory::Mouth);
            store.add(70.0, 10.0, FeatureCategory::Nose);
            store.add(100.0, 10.0, FeatureCategory::Nose);
        }

        let effects = editor.handle(&mut slots, EditorEvent::SecondaryAction(at(slot, 12.0, 12.0)));

        assert_eq!(effects, vec![Effect::Redraw(slot), Effect::Persist(slot)]);
        assert!(!editor.is_dragging());
        let labels: Vec<_> = slots.get(slot).points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Mouth_1", "Nose_1", "Nose_2"]);
    }

    #[test]
    fn test_secondary_action_on_empty_area_is_noop() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        slots.get_mut(SlotRole::CompareA).points.add(10.0, 10.0, FeatureCategory::Nose);
        let effects = editor.handle(&mut slots, EditorEvent::SecondaryAction(at(SlotRole::CompareA, 150.0, 150.0)));
        assert!(effects.is_empty());
        assert_eq!(slots.get(SlotRole::CompareA).points.len(), 1);
    }

    #[test]
    fn test_edit_without_image_is_silent_noop() {
        let mut slots = Slots::new();
        let mut editor = Editor::new(10.0);
        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::Reference, 5.0, 5.0)));
        assert!(effects.is_empty());
        assert!(slots.get(SlotRole::Reference).points.is_empty());
    }

    #[test]
    fn test_auto_mode_rejects_manual_edits_with_advisory() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        editor.set_mode(MarkingMode::Auto);
        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::Reference, 5.0, 5.0)));
        assert!(matches!(effects.as_slice(), [Effect::Advisory(_)]));
        assert!(slots.get(SlotRole::Reference).points.is_empty());
    }

    #[test]
    fn test_pointer_down_during_same_slot_drag_ends_previous_drag() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::Reference;
        slots.get_mut(slot).points.add(50.0, 50.0, FeatureCategory::Nose);
        editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 50.0, 50.0)));

        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 150.0, 150.0)));

        assert_eq!(effects, vec![Effect::Persist(slot), Effect::Redraw(slot)]);
        assert_eq!(slots.get(slot).points.len(), 2);
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_stale_canvas_after_image_swap_is_ignored() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::Reference;
        let processed = ImageSource::from_bytes(png_bytes(64, 64)).expect("png");
        slots.get_mut(slot).set_processed(processed, None);

        // Canvas still sized for the 200x200 original
        let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 90.0, 90.0)));
        assert!(effects.is_empty());
        assert!(slots.get(slot).points.is_empty());

        let pointer = Pointer {
            canvas: CanvasMetrics::unscaled(64, 64),
            ..at(slot, 30.0, 30.0)
        };
        editor.handle(&mut slots, EditorEvent::PointerDown(pointer));
        let point = slots.get(slot).points.get(0).expect("added");
        assert_eq!((point.x, point.y), (30.0, 30.0));
    }

    #[test]
    fn test_pointer_outside_image_is_ignored() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        let slot = SlotRole::CompareA;

        for (x, y) in [(-5.0, 20.0), (20.0, -1.0), (230.0, 20.0), (20.0, 200.5)] {
            let effects = editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, x, y)));
            assert!(effects.is_empty(), "({}, {}) accepted", x, y);
        }
        assert!(slots.get(slot).points.is_empty());

        // A drag never leaves the image either
        editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 190.0, 190.0)));
        editor.handle(&mut slots, EditorEvent::PointerDown(at(slot, 190.0, 190.0)));
        assert!(editor.is_dragging());
        assert!(editor.handle(&mut slots, EditorEvent::PointerMove(at(slot, 250.0, 190.0))).is_empty());
        let point = slots.get(slot).points.get(0).expect("point");
        assert_eq!((point.x, point.y), (190.0, 190.0));
    }

    #[test]
    fn test_cancel_drag_for_other_slot_keeps_drag() {
        let mut slots = slots_with_images();
        let mut editor = Editor::new(10.0);
        slots.get_mut(SlotRole::CompareB).points.add(50.0, 50.0, FeatureCategory::Nose);
        editor.handle(&mut slots, EditorEvent::PointerDown(at(SlotRole::CompareB, 50.0, 50.0)));

        assert!(!editor.cancel_drag_for(SlotRole::Reference));
        assert!(editor.cancel_drag_for(SlotRole::CompareB));
        assert!(!editor.is_dragging());
    }
}
