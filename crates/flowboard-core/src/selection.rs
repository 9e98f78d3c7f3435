//! Selection set and resize handle system.

use crate::elements::ElementId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;

/// Ordered set of selected element ids. The last entry is the primary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection, dropping duplicates but keeping the last occurrence order.
    pub fn set(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids.clear();
        for id in ids {
            self.ids.retain(|&existing| existing != id);
            self.ids.push(id);
        }
    }

    /// Select exactly one element.
    pub fn select_only(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Toggle membership. A newly added id becomes the primary.
    pub fn toggle(&mut self, id: ElementId) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.ids.push(id);
        }
    }

    /// Make an already-selected id the primary without changing membership.
    pub fn promote(&mut self, id: ElementId) {
        if self.contains(id) {
            self.ids.retain(|&existing| existing != id);
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ElementId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        self.ids.len() != before
    }

    pub fn retain(&mut self, f: impl FnMut(&ElementId) -> bool) {
        self.ids.retain(f);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// The most recently selected element.
    pub fn primary(&self) -> Option<ElementId> {
        self.ids.last().copied()
    }

    /// The single selected element, if exactly one is selected.
    pub fn single(&self) -> Option<ElementId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of resize handle: four corners (NW, NE, SW, SE) and four edges (N, E, S, W).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

impl HandleKind {
    /// All eight handles, corners first so they win over edges on overlap.
    pub const ALL: [HandleKind; 8] = [
        HandleKind::Corner(Corner::TopLeft),
        HandleKind::Corner(Corner::TopRight),
        HandleKind::Corner(Corner::BottomLeft),
        HandleKind::Corner(Corner::BottomRight),
        HandleKind::Edge(Edge::Top),
        HandleKind::Edge(Edge::Right),
        HandleKind::Edge(Edge::Bottom),
        HandleKind::Edge(Edge::Left),
    ];

    fn moves_west(self) -> bool {
        matches!(
            self,
            HandleKind::Edge(Edge::Left)
                | HandleKind::Corner(Corner::TopLeft)
                | HandleKind::Corner(Corner::BottomLeft)
        )
    }

    fn moves_east(self) -> bool {
        matches!(
            self,
            HandleKind::Edge(Edge::Right)
                | HandleKind::Corner(Corner::TopRight)
                | HandleKind::Corner(Corner::BottomRight)
        )
    }

    fn moves_north(self) -> bool {
        matches!(
            self,
            HandleKind::Edge(Edge::Top)
                | HandleKind::Corner(Corner::TopLeft)
                | HandleKind::Corner(Corner::TopRight)
        )
    }

    fn moves_south(self) -> bool {
        matches!(
            self,
            HandleKind::Edge(Edge::Bottom)
                | HandleKind::Corner(Corner::BottomLeft)
                | HandleKind::Corner(Corner::BottomRight)
        )
    }

    /// Where this handle sits on a bounding box.
    pub fn anchor(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            HandleKind::Corner(Corner::TopLeft) => Point::new(bounds.x0, bounds.y0),
            HandleKind::Corner(Corner::TopRight) => Point::new(bounds.x1, bounds.y0),
            HandleKind::Corner(Corner::BottomLeft) => Point::new(bounds.x0, bounds.y1),
            HandleKind::Corner(Corner::BottomRight) => Point::new(bounds.x1, bounds.y1),
            HandleKind::Edge(Edge::Top) => Point::new(center.x, bounds.y0),
            HandleKind::Edge(Edge::Right) => Point::new(bounds.x1, center.y),
            HandleKind::Edge(Edge::Bottom) => Point::new(center.x, bounds.y1),
            HandleKind::Edge(Edge::Left) => Point::new(bounds.x0, center.y),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in scene coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in scene coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx.abs() <= tolerance && dy.abs() <= tolerance
    }
}

/// The eight resize handles of a bounding box.
pub fn handles_for(bounds: Rect) -> Vec<Handle> {
    HandleKind::ALL
        .iter()
        .map(|&kind| Handle::new(kind.anchor(bounds), kind))
        .collect()
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles_for(bounds)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// Apply a handle drag to an original box.
///
/// West/north handles move the origin so the opposite edge stays fixed. Width and height
/// never drop below `min_size`; when clamped, the opposite edge still stays put.
pub fn resize_bounds(original: Rect, handle: HandleKind, delta: Vec2, min_size: f64) -> Rect {
    let mut x0 = original.x0;
    let mut y0 = original.y0;
    let mut width = original.width();
    let mut height = original.height();

    if handle.moves_east() {
        width = (width + delta.x).max(min_size);
    } else if handle.moves_west() {
        width = (width - delta.x).max(min_size);
        x0 = original.x1 - width;
    }

    if handle.moves_south() {
        height = (height + delta.y).max(min_size);
    } else if handle.moves_north() {
        height = (height - delta.y).max(min_size);
        y0 = original.y1 - height;
    }

    Rect::new(x0, y0, x0 + width, y0 + height)
}

/// State of an in-progress multi-element drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Element whose position follows the pointer.
    pub primary: ElementId,
    /// `pointer_scene - primary.position` captured on pointer-down.
    pub grab_offset: Vec2,
}

/// State of an in-progress single-element resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub element_id: ElementId,
    pub handle: HandleKind,
    /// Pointer position at pointer-down, in scene coordinates.
    pub start_point: Point,
    /// Current pointer position, in scene coordinates.
    pub current_point: Point,
    /// Bounds at pointer-down.
    pub original_bounds: Rect,
}

impl ResizeState {
    pub fn new(
        element_id: ElementId,
        handle: HandleKind,
        start_point: Point,
        original_bounds: Rect,
    ) -> Self {
        Self {
            element_id,
            handle,
            start_point,
            current_point: start_point,
            original_bounds,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Bounds for the current pointer position.
    pub fn resized(&self, min_size: f64) -> Rect {
        resize_bounds(self.original_bounds, self.handle, self.delta(), min_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_selection_primary_is_last() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut selection = Selection::new();
        selection.select_only(a);
        selection.toggle(b);
        assert_eq!(selection.primary(), Some(b));
        assert_eq!(selection.single(), None);

        selection.toggle(b);
        assert_eq!(selection.ids(), &[a]);
        assert_eq!(selection.single(), Some(a));
    }

    #[test]
    fn test_selection_set_dedupes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut selection = Selection::new();
        selection.set([a, b, a]);
        assert_eq!(selection.ids(), &[b, a]);
    }

    #[test]
    fn test_eight_handles() {
        let handles = handles_for(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(handles.len(), 8);
        let top = handles
            .iter()
            .find(|h| h.kind == HandleKind::Edge(Edge::Top))
            .unwrap();
        assert_eq!(top.position, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_hit_test_handles() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            hit_test_handles(bounds, Point::new(98.0, 103.0), 8.0),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
        assert_eq!(
            hit_test_handles(bounds, Point::new(-4.0, 50.0), 8.0),
            Some(HandleKind::Edge(Edge::Left))
        );
        assert_eq!(hit_test_handles(bounds, Point::new(50.0, 50.0), 8.0), None);
    }

    #[test]
    fn test_west_resize_pins_east_edge() {
        let original = Rect::new(100.0, 100.0, 200.0, 150.0);
        let left = HandleKind::Edge(Edge::Left);
        for dx in [-50.0, -5.0, 0.0, 30.0, 79.0, 500.0] {
            let r = resize_bounds(original, left, Vec2::new(dx, 0.0), 20.0);
            assert!(approx(r.x1, 200.0), "east edge moved for dx={dx}");
            assert!(r.width() >= 20.0);
        }
    }

    #[test]
    fn test_north_resize_clamps_and_pins() {
        let original = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_bounds(original, HandleKind::Edge(Edge::Top), Vec2::new(0.0, 95.0), 20.0);
        assert!(approx(r.height(), 20.0));
        assert!(approx(r.y1, 100.0));
        assert!(approx(r.y0, 80.0));
    }

    #[test]
    fn test_diagonal_resize() {
        let original = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_bounds(
            original,
            HandleKind::Corner(Corner::TopLeft),
            Vec2::new(10.0, -20.0),
            20.0,
        );
        assert_eq!(r, Rect::new(10.0, -20.0, 100.0, 100.0));

        let r = resize_bounds(
            original,
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(-200.0, 25.0),
            20.0,
        );
        assert_eq!(r, Rect::new(0.0, 0.0, 20.0, 125.0));
    }

    #[test]
    fn test_resize_state_delta() {
        let mut state = ResizeState::new(
            Uuid::new_v4(),
            HandleKind::Edge(Edge::Right),
            Point::new(100.0, 50.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        state.current_point = Point::new(130.0, 70.0);
        assert_eq!(state.delta(), Vec2::new(30.0, 20.0));
        assert_eq!(state.resized(20.0), Rect::new(0.0, 0.0, 130.0, 100.0));
    }
}
