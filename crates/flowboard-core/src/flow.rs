//! Generation flows: generator nodes wired to a source image by connectors.

use crate::elements::{Element, ElementId, GroupId, LineStyle};
use crate::scene::SceneState;
use crate::store::ElementPatch;
use crate::tools::ToolKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which placeholder to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    #[default]
    Image,
    Video,
}

/// Elements created by [`attach_generator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLink {
    /// Handed to the generator configuration UI.
    pub generator_id: ElementId,
    pub connector_id: ElementId,
    pub group_id: GroupId,
}

/// Attach a generator to the right of a source image's flow.
///
/// The generator lands one spacing past the rightmost visible member of the source's
/// group, on the source's row and at the source's size. It is connected to the source
/// by a dashed connector, selected, and the tool switches to select. Returns `None`
/// when the source is missing or not an image.
pub fn attach_generator(
    scene: &mut SceneState,
    source_id: ElementId,
    kind: GeneratorKind,
) -> Option<FlowLink> {
    let Some(source) = scene.store.get(source_id).filter(|e| e.is_image()) else {
        log::debug!("Flow source {source_id} is missing or not an image");
        return None;
    };

    let group_id = source.group_id().unwrap_or_else(Uuid::new_v4);
    let extent = scene
        .store
        .group_members(group_id)
        .into_iter()
        .filter(|e| e.is_interactive())
        .map(Element::right_edge)
        .fold(source.right_edge(), f64::max);

    let position = Point::new(extent + scene.config.flow_spacing, source.position.y);
    let size = source.size();
    let generator = match kind {
        GeneratorKind::Image => Element::image_generator(position, size, Some(source_id)),
        GeneratorKind::Video => Element::video_generator(position, size, Some(source_id)),
    }
    .with_group(group_id);

    let generator_id = scene.store.add(generator)?;
    let connector = Element::connector(source_id, generator_id, LineStyle::Dashed);
    let connector_id = scene.store.add(connector.with_group(group_id))?;
    scene.store.update(
        source_id,
        ElementPatch::new()
            .group(group_id)
            .link([connector_id, generator_id]),
    );

    scene.selection.select_only(generator_id);
    scene.set_tool(ToolKind::Select);

    log::info!("Attached {kind:?} generator {generator_id} to {source_id} in group {group_id}");
    Some(FlowLink {
        generator_id,
        connector_id,
        group_id,
    })
}
