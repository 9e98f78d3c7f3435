//! The editor facade: scene state plus the interaction controller.

use crate::config::CanvasConfig;
use crate::elements::{Element, ElementId};
use crate::error::SceneResult;
use crate::flow::{FlowLink, GeneratorKind, attach_generator};
use crate::ingest::{AnalysisResult, GenerationResult, GenerationTarget, ingest_generation};
use crate::input::{KeyEvent, PointerEvent};
use crate::interaction::{CanvasEvent, InteractionController};
use crate::render::{DisplayList, build_display_list};
use crate::scene::SceneState;
use crate::store::{ElementPatch, ElementStore};
use crate::tools::ToolKind;
use kurbo::{Size, Vec2};

/// Entry point for hosts: every write goes through here.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    scene: SceneState,
    controller: InteractionController,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CanvasConfig) -> SceneResult<Self> {
        Ok(Self {
            scene: SceneState::with_config(config)?,
            controller: InteractionController::new(),
        })
    }

    /// Read access to the scene.
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Add an element. Connectors with a missing endpoint are rejected.
    pub fn add_element(&mut self, element: Element) -> Option<ElementId> {
        self.scene.add_element(element)
    }

    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        self.scene.update_element(id, patch)
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        self.scene.remove_element(id)
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.scene.set_selection(ids);
    }

    /// Switch tools. Any transient interaction is dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.controller.set_tool(&mut self.scene, tool);
    }

    pub fn set_pan_zoom(&mut self, pan: Vec2, scale: f64) {
        self.scene.set_pan_zoom(pan, scale);
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.scene.set_viewport_size(size);
    }

    pub fn zoom_in(&mut self) {
        self.scene.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.scene.zoom_out();
    }

    pub fn zoom_to_fit(&mut self) {
        self.scene.zoom_to_fit();
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Option<CanvasEvent> {
        self.controller.handle_pointer_event(&mut self.scene, event)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> Option<CanvasEvent> {
        self.controller.handle_key_event(&mut self.scene, event)
    }

    /// Attach a generator to a source image. See [`attach_generator`].
    pub fn attach_generator(
        &mut self,
        source_id: ElementId,
        kind: GeneratorKind,
    ) -> Option<FlowLink> {
        self.controller.cancel();
        attach_generator(&mut self.scene, source_id, kind)
    }

    pub fn begin_generation(&mut self) {
        self.scene.begin_generation();
    }

    /// Record a finished generation and write its result into the scene.
    pub fn complete_generation(
        &mut self,
        target: GenerationTarget,
        result: GenerationResult,
    ) -> SceneResult<Option<ElementId>> {
        self.scene.finish_generation();
        ingest_generation(&mut self.scene, target, result)
    }

    /// Record a failed generation. The target is left unchanged.
    pub fn fail_generation(&mut self) {
        self.scene.finish_generation();
    }

    pub fn is_generating(&self) -> bool {
        self.scene.is_generating()
    }

    pub fn apply_analysis(&mut self, id: ElementId, analysis: AnalysisResult) -> bool {
        self.scene.set_analysis(id, analysis)
    }

    /// Display list for the current frame.
    pub fn display_list(&self) -> DisplayList<'_> {
        build_display_list(&self.scene, &self.controller)
    }

    /// Snapshot of the whole scene as JSON.
    pub fn export_json(&self) -> SceneResult<String> {
        self.scene.store().to_json()
    }

    /// Snapshot of the selected elements as JSON.
    pub fn export_selection_json(&self) -> SceneResult<String> {
        self.scene.store().export_selection(self.scene.selection()).to_json()
    }

    /// Replace the scene contents with a JSON snapshot.
    pub fn import_json(&mut self, json: &str) -> SceneResult<()> {
        let store = ElementStore::from_json(json)?;
        self.controller.cancel();
        self.scene.load_store(store);
        log::info!("Loaded {} elements", self.scene.store().len());
        Ok(())
    }

    /// Copy the selected elements, offset by `offset`, and select the copies.
    pub fn duplicate_selection(&mut self, offset: Vec2) -> Vec<ElementId> {
        let copies: Vec<Element> = self
            .scene
            .selection()
            .iter()
            .filter_map(|&id| self.scene.element(id))
            .filter(|e| !e.is_connector())
            .map(|e| {
                let mut copy = e.duplicated();
                copy.translate(offset);
                copy
            })
            .collect();
        let ids: Vec<ElementId> = copies
            .into_iter()
            .filter_map(|copy| self.scene.add_element(copy))
            .collect();
        self.scene.set_selection(ids.iter().copied());
        ids
    }

    pub fn is_dirty(&self) -> bool {
        self.scene.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.scene.mark_saved();
    }
}
