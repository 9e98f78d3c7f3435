//! Owned scene state: the element store plus view, tool and selection.

use crate::camera::Camera;
use crate::config::CanvasConfig;
use crate::elements::{Element, ElementId};
use crate::error::SceneResult;
use crate::ingest::AnalysisResult;
use crate::selection::Selection;
use crate::store::{ElementPatch, ElementStore};
use crate::tools::{ToolKind, ToolManager};
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashMap;

/// Padding in screen pixels used by zoom-to-fit.
const FIT_PADDING: f64 = 50.0;

/// Runtime scene state.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub(crate) store: ElementStore,
    pub(crate) camera: Camera,
    pub(crate) tools: ToolManager,
    pub(crate) selection: Selection,
    pub(crate) config: CanvasConfig,
    viewport_size: Size,
    analyses: HashMap<ElementId, AnalysisResult>,
    pending_generations: usize,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::build(CanvasConfig::default())
    }
}

impl SceneState {
    /// Create an empty scene with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene with a validated configuration.
    pub fn with_config(config: CanvasConfig) -> SceneResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CanvasConfig) -> Self {
        Self {
            store: ElementStore::new(),
            camera: Camera::from_config(&config),
            tools: ToolManager::from_config(&config),
            selection: Selection::new(),
            viewport_size: Size::new(800.0, 600.0),
            analyses: HashMap::new(),
            pending_generations: 0,
            config,
        }
    }

    /// Add an element, returning its id. Connectors with a missing endpoint are
    /// rejected.
    pub fn add_element(&mut self, element: Element) -> Option<ElementId> {
        let id = self.store.add(element)?;
        log::debug!("Added element {id}");
        Some(id)
    }

    /// Merge a patch into an element. No-op for unknown ids.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        self.store.update(id, patch)
    }

    /// Delete an element, dropping it from the selection and analysis overlays.
    ///
    /// Connectors and generators that reference the element are kept.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.store.remove(id);
        if removed.is_some() {
            self.selection.remove(id);
            self.analyses.remove(&id);
            log::debug!("Removed element {id}");
        } else {
            log::debug!("Remove of missing element {id} ignored");
        }
        removed
    }

    /// Replace the selection. Unknown ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let store = &self.store;
        self.selection
            .set(ids.into_iter().filter(|&id| store.contains(id)));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    /// Set pan offset (screen pixels) and scale. The scale is clamped.
    pub fn set_pan_zoom(&mut self, pan: Vec2, scale: f64) {
        self.camera.set(pan, scale);
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    /// Zoom in by one step around the viewport center.
    pub fn zoom_in(&mut self) {
        self.camera.zoom_in(self.viewport_size, self.config.zoom_step);
    }

    /// Zoom out by one step around the viewport center.
    pub fn zoom_out(&mut self) {
        self.camera.zoom_out(self.viewport_size, self.config.zoom_step);
    }

    /// Fit the view to show all visible elements.
    pub fn zoom_to_fit(&mut self) {
        if let Some(bounds) = self.store.bounds() {
            self.camera.fit_to_bounds(bounds, self.viewport_size, FIT_PADDING);
        }
    }

    /// Elements in z-order (back to front).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.store.elements_ordered()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Selected ids; the last one is the primary.
    pub fn selection(&self) -> &[ElementId] {
        self.selection.ids()
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn pan(&self) -> Vec2 {
        self.camera.offset
    }

    pub fn scale(&self) -> f64 {
        self.camera.zoom
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Scene-space rectangle currently on screen.
    pub fn visible_rect(&self) -> Rect {
        self.camera.visible_rect(self.viewport_size)
    }

    /// Scene point under the center of the viewport.
    pub fn viewport_center(&self) -> Point {
        self.visible_rect().center()
    }

    /// Attach an analysis result to an element. No-op for unknown ids.
    pub fn set_analysis(&mut self, id: ElementId, analysis: AnalysisResult) -> bool {
        if !self.store.contains(id) {
            log::debug!("Analysis for missing element {id} dropped");
            return false;
        }
        self.analyses.insert(id, analysis);
        true
    }

    pub fn analysis(&self, id: ElementId) -> Option<&AnalysisResult> {
        self.analyses.get(&id)
    }

    pub fn clear_analysis(&mut self, id: ElementId) -> Option<AnalysisResult> {
        self.analyses.remove(&id)
    }

    /// Analyses of elements that still exist, in z-order.
    pub fn analyses(&self) -> impl Iterator<Item = (&Element, &AnalysisResult)> {
        self.store
            .elements_ordered()
            .filter_map(|e| self.analyses.get(&e.id()).map(|a| (e, a)))
    }

    /// Record that an external generation request was issued.
    pub fn begin_generation(&mut self) {
        self.pending_generations += 1;
    }

    /// Record that an external generation request finished, successfully or not.
    pub fn finish_generation(&mut self) {
        if self.pending_generations == 0 {
            log::warn!("finish_generation called with no pending generation");
        }
        self.pending_generations = self.pending_generations.saturating_sub(1);
    }

    /// Whether any generation request is in flight.
    pub fn is_generating(&self) -> bool {
        self.pending_generations > 0
    }

    /// Whether the scene changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.store.mark_clean();
    }

    /// Replace the store with a loaded snapshot, resetting selection and overlays.
    pub fn load_store(&mut self, store: ElementStore) {
        self.store = store;
        self.selection.clear();
        self.analyses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{MediaSource, ShapeKind, SerializableColor};
    use crate::ingest::DetectedObject;
    use uuid::Uuid;

    fn image(scene: &mut SceneState) -> ElementId {
        scene
            .add_element(Element::image(
                Point::ZERO,
                Size::new(100.0, 100.0),
                MediaSource::url("a.png"),
            ))
            .unwrap()
    }

    #[test]
    fn test_remove_clears_selection_and_analysis() {
        let mut scene = SceneState::new();
        let a = image(&mut scene);
        let b = image(&mut scene);
        scene.set_selection([a, b]);
        scene.set_analysis(
            a,
            AnalysisResult {
                objects: vec![DetectedObject::new(Rect::new(0.0, 0.0, 0.5, 0.5), "cat")],
                description: String::new(),
            },
        );

        assert!(scene.remove_element(a).is_some());
        assert_eq!(scene.selection(), &[b]);
        assert!(scene.analysis(a).is_none());
        assert!(scene.remove_element(a).is_none());
    }

    #[test]
    fn test_set_selection_filters_unknown() {
        let mut scene = SceneState::new();
        let a = image(&mut scene);
        scene.set_selection([Uuid::new_v4(), a]);
        assert_eq!(scene.selection(), &[a]);
    }

    #[test]
    fn test_set_pan_zoom_clamps() {
        let mut scene = SceneState::new();
        scene.set_pan_zoom(Vec2::new(10.0, 20.0), 50.0);
        assert_eq!(scene.pan(), Vec2::new(10.0, 20.0));
        assert!((scene.scale() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = CanvasConfig {
            min_scale: 2.0,
            max_scale: 1.0,
            ..CanvasConfig::default()
        };
        assert!(SceneState::with_config(config).is_err());
    }

    #[test]
    fn test_generation_counter() {
        let mut scene = SceneState::new();
        assert!(!scene.is_generating());
        scene.begin_generation();
        scene.begin_generation();
        scene.finish_generation();
        assert!(scene.is_generating());
        scene.finish_generation();
        scene.finish_generation();
        assert!(!scene.is_generating());
    }

    #[test]
    fn test_viewport_center_follows_camera() {
        let mut scene = SceneState::new();
        scene.set_viewport_size(Size::new(800.0, 600.0));
        scene.set_pan_zoom(Vec2::new(-400.0, -300.0), 1.0);
        assert_eq!(scene.viewport_center(), Point::new(800.0, 600.0));
    }

    #[test]
    fn test_zoom_to_fit_ignores_empty_scene() {
        let mut scene = SceneState::new();
        scene.zoom_to_fit();
        assert_eq!(scene.pan(), Vec2::ZERO);

        scene.add_element(Element::shape(
            Point::new(1000.0, 1000.0),
            Size::new(100.0, 100.0),
            ShapeKind::Ellipse,
            SerializableColor::white(),
        ));
        scene.zoom_to_fit();
        let center = scene.camera().world_to_screen(Point::new(1050.0, 1050.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }
}
