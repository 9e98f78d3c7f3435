//! Presentation contract: scene state in, ordered display list out.
//!
//! Nothing here draws. A backend walks the [`DisplayList`] back to front, applying
//! [`DisplayList::transform`] to every scene-space item.

use crate::elements::{Element, ElementId, LineStyle};
use crate::interaction::{InteractionController, InteractionPreview};
use crate::scene::SceneState;
use crate::selection::{HANDLE_SIZE, HandleKind, handles_for};
use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Selection highlight color.
pub const SELECTION_COLOR: Color = Color::from_rgba8(59, 130, 246, 255);
/// Region selection and analysis highlight color.
pub const HIGHLIGHT_COLOR: Color = Color::from_rgba8(245, 158, 11, 255);

/// One drawing command. Geometry is in scene coordinates unless noted.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem<'a> {
    /// A visible element; the backend draws it from its content.
    Element(&'a Element),
    /// A connector with both endpoints present.
    Connector {
        id: ElementId,
        from: Point,
        to: Point,
        style: LineStyle,
    },
    SelectionOutline {
        id: ElementId,
        bounds: Rect,
        primary: bool,
    },
    Handle {
        kind: HandleKind,
        /// Handle square, sized to stay constant on screen.
        rect: Rect,
    },
    AnalysisHighlight {
        element_id: ElementId,
        rect: Rect,
        label: &'a str,
    },
    PathPreview {
        points: &'a [Point],
        stroke_width: f64,
        color: Color,
    },
    RegionPreview {
        element_id: ElementId,
        rect: Rect,
    },
}

/// Ordered drawing commands for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList<'a> {
    /// Scene to screen transform.
    pub transform: Affine,
    pub items: Vec<DrawItem<'a>>,
}

impl DisplayList<'_> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A drawing backend.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, list: &DisplayList<'_>);
}

/// Build the display list for the current state.
///
/// Hidden elements and connectors with a missing endpoint are skipped. Elements come in
/// z-order, followed by analysis highlights, selection chrome and gesture previews.
pub fn build_display_list<'a>(
    scene: &'a SceneState,
    controller: &'a InteractionController,
) -> DisplayList<'a> {
    let store = scene.store();
    let mut items = Vec::with_capacity(store.len() + scene.selection().len());

    for element in store.elements_ordered().filter(|e| !e.hidden) {
        match element.as_connector() {
            Some(connector) => {
                let endpoints = store.get(connector.from).zip(store.get(connector.to));
                let Some((from, to)) = endpoints.filter(|(f, t)| !f.hidden && !t.hidden) else {
                    continue;
                };
                let (start, end) = connector_endpoints(from.bounds(), to.bounds());
                items.push(DrawItem::Connector {
                    id: element.id(),
                    from: start,
                    to: end,
                    style: connector.style,
                });
            }
            None => items.push(DrawItem::Element(element)),
        }
    }

    for (element, analysis) in scene.analyses().filter(|(e, _)| !e.hidden) {
        for (rect, label) in analysis.highlight_rects(element.bounds()) {
            items.push(DrawItem::AnalysisHighlight {
                element_id: element.id(),
                rect,
                label,
            });
        }
    }

    let primary = scene.selection().last().copied();
    for &id in scene.selection() {
        let Some(element) = store.get(id).filter(|e| e.is_interactive()) else {
            continue;
        };
        items.push(DrawItem::SelectionOutline {
            id,
            bounds: element.bounds(),
            primary: Some(id) == primary,
        });
    }

    if let [id] = scene.selection() {
        if let Some(element) = store.get(*id).filter(|e| e.is_interactive() && !e.locked) {
            let half = HANDLE_SIZE / scene.scale() / 2.0;
            for handle in handles_for(element.bounds()) {
                items.push(DrawItem::Handle {
                    kind: handle.kind,
                    rect: Rect::from_center_size(handle.position, (half * 2.0, half * 2.0)),
                });
            }
        }
    }

    match controller.preview(scene) {
        Some(InteractionPreview::Path(points)) => items.push(DrawItem::PathPreview {
            points,
            stroke_width: scene.tools().stroke_width,
            color: scene.tools().stroke_color.into(),
        }),
        Some(InteractionPreview::Region { element_id, rect }) => {
            items.push(DrawItem::RegionPreview { element_id, rect })
        }
        None => {}
    }

    DisplayList {
        transform: scene.camera().transform(),
        items,
    }
}

/// Flow connectors run from the right-middle of the source to the left-middle of the
/// target.
fn connector_endpoints(from: Rect, to: Rect) -> (Point, Point) {
    (
        Point::new(from.x1, from.center().y),
        Point::new(to.x0, to.center().y),
    )
}
