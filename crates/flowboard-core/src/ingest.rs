//! Writing external generation and analysis results into the scene.
//!
//! Results can arrive long after the request was issued, so every entry point tolerates
//! a target that has since been deleted or already filled.

use crate::elements::{
    Element, ElementContent, ElementId, ElementKind, ImageContent, MediaSource, VideoContent,
    fit_within,
};
use crate::error::{SceneError, SceneResult};
use crate::scene::SceneState;
use crate::store::ElementPatch;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media a generation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedKind {
    #[default]
    Image,
    Video,
}

/// Output of an external image or video generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub source: MediaSource,
    #[serde(default)]
    pub kind: GeneratedKind,
    /// Intrinsic width in pixels.
    pub width: f64,
    /// Intrinsic height in pixels.
    pub height: f64,
}

impl GenerationResult {
    pub fn image(source: MediaSource, width: f64, height: f64) -> Self {
        Self {
            source,
            kind: GeneratedKind::Image,
            width,
            height,
        }
    }

    pub fn video(source: MediaSource, width: f64, height: f64) -> Self {
        Self {
            source,
            kind: GeneratedKind::Video,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Reject non-positive or non-finite dimensions.
    pub fn validate(&self) -> SceneResult<()> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(SceneError::InvalidGeneration(format!(
                "dimensions must be positive and finite, got {}x{}",
                self.width, self.height
            )))
        }
    }

    fn content(&self, generated_by: Option<ElementId>) -> ElementContent {
        let source = self.source.clone();
        match self.kind {
            GeneratedKind::Image => ElementContent::Image(ImageContent {
                source,
                generated_by,
            }),
            GeneratedKind::Video => ElementContent::Video(VideoContent {
                source,
                generated_by,
            }),
        }
    }
}

/// Where a generation result should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationTarget {
    /// The element the generation was requested for.
    Element(ElementId),
    /// No target: place the result in the middle of the viewport.
    AdHoc,
}

/// Write a generation result into the scene.
///
/// Returns the id of the element holding the result, or `None` when the target no
/// longer exists or holds no media (text, shapes, paths and connectors).
pub fn ingest_generation(
    scene: &mut SceneState,
    target: GenerationTarget,
    result: GenerationResult,
) -> SceneResult<Option<ElementId>> {
    result.validate()?;
    let id = match target {
        GenerationTarget::Element(target_id) => {
            let Some(element) = scene.store.get(target_id) else {
                log::debug!("Generation target {target_id} no longer exists, dropping result");
                return Ok(None);
            };
            match element.kind() {
                kind if kind.is_generator() => fill_placeholder(scene, target_id, &result),
                ElementKind::Image | ElementKind::Video => {
                    add_history_sibling(scene, target_id, &result)
                }
                kind => {
                    log::debug!("Generation target {target_id} is a {kind:?}, dropping result");
                    None
                }
            }
        }
        GenerationTarget::AdHoc => place_ad_hoc(scene, &result),
    };
    Ok(id)
}

/// Turn a generator placeholder into the generated media, keeping its slot and links.
fn fill_placeholder(
    scene: &mut SceneState,
    target_id: ElementId,
    result: &GenerationResult,
) -> Option<ElementId> {
    let content = result.content(None);
    let filled = scene.store.modify(target_id, |element| {
        let size = fit_within(result.size(), element.size());
        element.size = Some(size);
        element.content = content;
    });
    if filled {
        log::info!("Filled generator {target_id} with generated {:?}", result.kind);
    }
    filled.then_some(target_id)
}

/// Add a result for an already-filled target as a sibling in the history grid above it.
fn add_history_sibling(
    scene: &mut SceneState,
    target_id: ElementId,
    result: &GenerationResult,
) -> Option<ElementId> {
    let target = scene.store.get(target_id)?;
    let origin = target.position;
    let cell_width = target.size().width;
    let group_id = target.group_id().unwrap_or_else(Uuid::new_v4);

    let columns = scene.config.history_columns.max(1);
    let gap = scene.config.history_gap;
    let sibling_heights: Vec<f64> = scene
        .store
        .query(|e| e.generated_by() == Some(target_id))
        .into_iter()
        .map(|e| e.size().height)
        .collect();

    let index = sibling_heights.len();
    let column = index % columns;
    let row = index / columns;
    let height = cell_width * result.height / result.width;

    // Completed rows below this one, tallest member each.
    let rows_below: f64 = sibling_heights
        .chunks(columns)
        .take(row)
        .map(|chunk| chunk.iter().copied().fold(0.0, f64::max) + gap)
        .sum();
    let row_bottom = origin.y - gap - rows_below;
    let position = Point::new(
        origin.x + column as f64 * (cell_width + gap),
        row_bottom - height,
    );

    let sibling = Element::new(position, result.content(Some(target_id)))
        .with_size(Size::new(cell_width, height))
        .with_group(group_id);
    let sibling_id = scene.store.add(sibling)?;
    scene.store.update(
        target_id,
        ElementPatch::new().group(group_id).link([sibling_id]),
    );
    log::info!(
        "Added generation {sibling_id} to history of {target_id} (row {row}, column {column})"
    );
    Some(sibling_id)
}

/// Center an untargeted result in the viewport.
fn place_ad_hoc(scene: &mut SceneState, result: &GenerationResult) -> Option<ElementId> {
    let size = fit_within(result.size(), scene.config.max_ingest_size);
    let center = scene.viewport_center();
    let position = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
    let id = scene
        .store
        .add(Element::new(position, result.content(None)).with_size(size))?;
    log::info!("Placed generated {:?} {id} at viewport center", result.kind);
    Some(id)
}

/// An object found by image analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Bounding box in `[0, 1]` coordinates relative to the analyzed element.
    pub bounding_box_normalized: Rect,
    pub label: String,
    /// Free-form category reported by the analyzer.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub confidence: f64,
}

impl DetectedObject {
    pub fn new(bounding_box_normalized: Rect, label: impl Into<String>) -> Self {
        Self {
            bounding_box_normalized,
            label: label.into(),
            kind: String::new(),
            confidence: 1.0,
        }
    }

    /// Map the normalized box onto an element's scene bounds.
    pub fn scene_rect(&self, bounds: Rect) -> Rect {
        let n = self.bounding_box_normalized;
        Rect::new(
            bounds.x0 + n.x0 * bounds.width(),
            bounds.y0 + n.y0 * bounds.height(),
            bounds.x0 + n.x1 * bounds.width(),
            bounds.y0 + n.y1 * bounds.height(),
        )
    }
}

/// Output of an external image analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, alias = "elements")]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub description: String,
}

impl AnalysisResult {
    /// Scene-space highlight rectangles with their labels.
    pub fn highlight_rects(&self, bounds: Rect) -> Vec<(Rect, &str)> {
        self.objects
            .iter()
            .map(|object| (object.scene_rect(bounds), object.label.as_str()))
            .collect()
    }
}
