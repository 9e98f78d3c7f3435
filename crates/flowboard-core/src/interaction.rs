//! Pointer interaction state machine.
//!
//! Exactly one [`Interaction`] is active at a time. Every pointer-move commits straight
//! into the store, so cancelling an interaction never rolls anything back.

use crate::elements::{Element, ElementId};
use crate::input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::scene::SceneState;
use crate::selection::{DragState, ResizeState, hit_test_handles};
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A completed region selection over an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSelection {
    pub element_id: ElementId,
    /// Rectangle in element-local units, clamped to the element box.
    pub pixel_rect: Rect,
    /// `pixel_rect` divided by the element size.
    pub normalized_rect: Rect,
    /// Top-right corner of the region in screen coordinates, for anchoring a popup.
    pub anchor_screen: Point,
}

/// Events the host forwards to its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    RegionSelected(RegionSelection),
    PathCreated(ElementId),
    ElementsDeleted(Vec<ElementId>),
}

/// The transient interaction in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Panning {
        /// `pointer - pan` captured on pointer-down.
        grab_offset: Vec2,
    },
    Dragging(DragState),
    Resizing(ResizeState),
    PathDrawing {
        /// Captured points in scene coordinates.
        points: Vec<Point>,
    },
    RegionSelecting {
        element_id: ElementId,
        /// Corners in element-local coordinates.
        anchor: Point,
        current: Point,
    },
}

/// Read-only view of an in-progress gesture, for drawing feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionPreview<'a> {
    Path(&'a [Point]),
    /// Region in scene coordinates over the given element.
    Region { element_id: ElementId, rect: Rect },
}

/// Interprets pointer and key events against a [`SceneState`].
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: Interaction,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active interaction.
    pub fn interaction(&self) -> &Interaction {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, Interaction::Idle)
    }

    /// Drop the active interaction. Already committed moves stay.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("Interaction cancelled");
        }
        self.state = Interaction::Idle;
    }

    /// Switch tools, clearing any transient interaction.
    pub fn set_tool(&mut self, scene: &mut SceneState, tool: ToolKind) {
        self.cancel();
        scene.set_tool(tool);
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer_event(
        &mut self,
        scene: &mut SceneState,
        event: PointerEvent,
    ) -> Option<CanvasEvent> {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                self.pointer_down(scene, position, button, modifiers);
                None
            }
            PointerEvent::Move { position } => {
                self.pointer_move(scene, position);
                None
            }
            PointerEvent::Up { position, .. } => self.pointer_up(scene, position),
            PointerEvent::Scroll { position, delta } => {
                self.scroll(scene, position, delta);
                None
            }
        }
    }

    /// Dispatch a key event.
    pub fn handle_key_event(
        &mut self,
        scene: &mut SceneState,
        event: &KeyEvent,
    ) -> Option<CanvasEvent> {
        let key = event.pressed_key()?;
        match key {
            "Escape" => {
                self.cancel();
                None
            }
            "Delete" | "Backspace" => self.delete_selected(scene),
            _ => {
                if let Some(tool) = ToolKind::from_shortcut(key) {
                    self.set_tool(scene, tool);
                }
                None
            }
        }
    }

    pub fn pointer_down(
        &mut self,
        scene: &mut SceneState,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) {
        // A second press while a gesture is active restarts from idle.
        self.cancel();

        let tool = scene.tool();
        if button == MouseButton::Middle || (button == MouseButton::Left && tool == ToolKind::Hand)
        {
            self.state = Interaction::Panning {
                grab_offset: position.to_vec2() - scene.camera.offset,
            };
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let scene_point = scene.camera.screen_to_world(position);
        match tool {
            ToolKind::Select => self.begin_select(scene, position, scene_point, modifiers),
            ToolKind::Draw => {
                self.state = Interaction::PathDrawing {
                    points: vec![scene_point],
                };
            }
            ToolKind::RegionEdit => self.begin_region(scene, scene_point),
            ToolKind::Hand => {}
        }
    }

    fn begin_select(
        &mut self,
        scene: &mut SceneState,
        screen_point: Point,
        scene_point: Point,
        modifiers: Modifiers,
    ) {
        let zoom = scene.camera.zoom;

        // Resize handles of a single selected element take priority over hit-testing.
        if let Some(element) = scene
            .selection
            .single()
            .and_then(|id| scene.store.get(id))
            .filter(|e| !e.locked && e.is_interactive())
        {
            let tolerance = scene.config.handle_tolerance / zoom;
            if let Some(handle) = hit_test_handles(element.bounds(), scene_point, tolerance) {
                self.state = Interaction::Resizing(ResizeState::new(
                    element.id(),
                    handle,
                    scene_point,
                    element.bounds(),
                ));
                return;
            }
        }

        let tolerance = 1.0 / zoom;
        let Some(hit) = scene.store.element_at_point(scene_point, tolerance) else {
            if !modifiers.additive() {
                scene.selection.clear();
            }
            log::debug!("Click on empty canvas at {screen_point:?}");
            return;
        };

        if modifiers.additive() {
            scene.selection.toggle(hit);
        } else if scene.selection.contains(hit) {
            scene.selection.promote(hit);
        } else {
            scene.selection.select_only(hit);
        }

        if !scene.selection.contains(hit) {
            return;
        }
        if let Some(primary) = scene.store.get(hit).filter(|e| !e.locked) {
            self.state = Interaction::Dragging(DragState {
                primary: hit,
                grab_offset: scene_point - primary.position,
            });
        }
    }

    fn begin_region(&mut self, scene: &SceneState, scene_point: Point) {
        let Some(image) = scene
            .store
            .element_at_point(scene_point, 0.0)
            .and_then(|id| scene.store.get(id))
            .filter(|e| e.is_image())
        else {
            log::debug!("Region selection needs an image under the pointer");
            return;
        };
        let anchor = local_point(image, scene_point);
        self.state = Interaction::RegionSelecting {
            element_id: image.id(),
            anchor,
            current: anchor,
        };
    }

    pub fn pointer_move(&mut self, scene: &mut SceneState, position: Point) {
        let scene_point = scene.camera.screen_to_world(position);
        match &mut self.state {
            Interaction::Idle => {}
            Interaction::Panning { grab_offset } => {
                scene.camera.offset = position.to_vec2() - *grab_offset;
            }
            Interaction::Dragging(drag) => {
                let Some(primary) = scene.store.get(drag.primary) else {
                    self.cancel();
                    return;
                };
                let new_position = scene_point - drag.grab_offset;
                let delta = new_position - primary.position;
                if delta == Vec2::ZERO {
                    return;
                }
                let primary_id = drag.primary;
                for &id in scene.selection.ids() {
                    if id == primary_id {
                        scene.store.modify(id, |e| e.position = new_position);
                        continue;
                    }
                    let movable = scene.store.get(id).is_some_and(|e| !e.locked);
                    if movable {
                        scene.store.modify(id, |e| e.translate(delta));
                    }
                }
            }
            Interaction::Resizing(resize) => {
                resize.current_point = scene_point;
                let bounds = resize.resized(scene.config.min_element_size);
                if !scene.store.modify(resize.element_id, |e| e.set_bounds(bounds)) {
                    self.cancel();
                }
            }
            Interaction::PathDrawing { points } => {
                if points.last() != Some(&scene_point) {
                    points.push(scene_point);
                }
            }
            Interaction::RegionSelecting {
                element_id,
                current,
                ..
            } => match scene.store.get(*element_id) {
                Some(image) => *current = local_point(image, scene_point),
                None => self.cancel(),
            },
        }
    }

    pub fn pointer_up(&mut self, scene: &mut SceneState, position: Point) -> Option<CanvasEvent> {
        self.pointer_move(scene, position);
        match std::mem::take(&mut self.state) {
            Interaction::PathDrawing { points } => finish_path(scene, &points),
            Interaction::RegionSelecting {
                element_id,
                anchor,
                current,
            } => finish_region(scene, element_id, anchor, current),
            _ => None,
        }
    }

    /// Wheel zoom about the cursor. An active pan keeps the grabbed point under the cursor.
    pub fn scroll(&mut self, scene: &mut SceneState, position: Point, delta: Vec2) {
        let step = scene.config.zoom_step;
        let factor = if delta.y < 0.0 {
            step
        } else if delta.y > 0.0 {
            1.0 / step
        } else {
            return;
        };
        scene.camera.zoom_at(position, factor);
        if let Interaction::Panning { grab_offset } = &mut self.state {
            *grab_offset = position.to_vec2() - scene.camera.offset;
        }
    }

    fn delete_selected(&mut self, scene: &mut SceneState) -> Option<CanvasEvent> {
        if !self.is_idle() || scene.selection.is_empty() {
            return None;
        }
        let ids: Vec<ElementId> = scene.selection.ids().to_vec();
        let deleted: Vec<ElementId> = ids
            .into_iter()
            .filter(|&id| scene.remove_element(id).is_some())
            .collect();
        log::info!("Deleted {} selected elements", deleted.len());
        (!deleted.is_empty()).then_some(CanvasEvent::ElementsDeleted(deleted))
    }

    /// The in-progress path or region, if any.
    pub fn preview(&self, scene: &SceneState) -> Option<InteractionPreview<'_>> {
        match &self.state {
            Interaction::PathDrawing { points } => Some(InteractionPreview::Path(points)),
            Interaction::RegionSelecting {
                element_id,
                anchor,
                current,
            } => {
                let origin = scene.store.get(*element_id)?.position.to_vec2();
                Some(InteractionPreview::Region {
                    element_id: *element_id,
                    rect: Rect::from_points(*anchor + origin, *current + origin),
                })
            }
            _ => None,
        }
    }
}

/// Scene point relative to the element origin, clamped to `[0, w] x [0, h]`.
fn local_point(element: &Element, scene_point: Point) -> Point {
    let size = element.size();
    let local = scene_point - element.position;
    Point::new(
        local.x.clamp(0.0, size.width),
        local.y.clamp(0.0, size.height),
    )
}

fn finish_path(scene: &mut SceneState, points: &[Point]) -> Option<CanvasEvent> {
    let tools = &scene.tools;
    let Some(path) = Element::path(points, tools.stroke_width, tools.stroke_color) else {
        log::debug!("Discarding path with {} point(s)", points.len());
        return None;
    };
    let id = scene.add_element(path)?;
    log::info!("Created path {id} from {} points", points.len());
    Some(CanvasEvent::PathCreated(id))
}

fn finish_region(
    scene: &SceneState,
    element_id: ElementId,
    anchor: Point,
    current: Point,
) -> Option<CanvasEvent> {
    let image = scene.store.get(element_id)?;
    let pixel_rect = Rect::from_points(anchor, current);
    let min = scene.config.min_region_size;
    if pixel_rect.width() <= min || pixel_rect.height() <= min {
        log::debug!(
            "Region {:.0}x{:.0} below minimum, discarded",
            pixel_rect.width(),
            pixel_rect.height()
        );
        return None;
    }

    let normalized_rect = normalize(pixel_rect, image.size());
    let corner = image.position + Vec2::new(pixel_rect.x1, pixel_rect.y0);
    Some(CanvasEvent::RegionSelected(RegionSelection {
        element_id,
        pixel_rect,
        normalized_rect,
        anchor_screen: scene.camera.world_to_screen(corner),
    }))
}

fn normalize(rect: Rect, size: Size) -> Rect {
    Rect::new(
        rect.x0 / size.width,
        rect.y0 / size.height,
        rect.x1 / size.width,
        rect.y1 / size.height,
    )
}
