//! Element definitions for the canvas.
//!
//! An [`Element`] is a common identity/transform record wrapped around a per-kind
//! [`ElementContent`]. The kind is derived from the content, so a record can never
//! carry a payload that disagrees with its kind.

mod media;
mod path;

pub use media::{MediaFormat, MediaSource, fit_within};
pub use path::{PathContent, point_to_polyline_dist, point_to_segment_dist, points_bounds};

use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Tag shared by the elements of one generation chain.
pub type GroupId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Discriminator of an element, derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Image,
    Text,
    Shape,
    Path,
    ImageGenerator,
    VideoGenerator,
    Video,
    Connector,
}

impl ElementKind {
    /// Size used when an element has none of its own.
    pub fn default_size(self) -> Size {
        match self {
            ElementKind::Text => Size::new(200.0, 50.0),
            ElementKind::Connector => Size::ZERO,
            _ => Size::new(100.0, 100.0),
        }
    }

    /// Whether this is one of the generator placeholder kinds.
    pub fn is_generator(self) -> bool {
        matches!(self, ElementKind::ImageGenerator | ElementKind::VideoGenerator)
    }
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Triangle,
}

/// Stroke style of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// Raster image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub source: MediaSource,
    /// Element whose repeated generation produced this image, for history siblings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<ElementId>,
}

/// Video payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoContent {
    pub source: MediaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<ElementId>,
}

/// Inline text payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    pub font_size: f64,
    pub color: SerializableColor,
}

/// Shape payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeContent {
    pub shape: ShapeKind,
    pub fill: SerializableColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<SerializableColor>,
}

/// Generator placeholder payload (image or video).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorContent {
    /// Image supplying generation context. Non-owning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image_id: Option<ElementId>,
    /// Prompt configured by the generator UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Directed edge between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorContent {
    pub from: ElementId,
    pub to: ElementId,
    pub style: LineStyle,
}

/// Kind-specific payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ElementContent {
    Image(ImageContent),
    Text(TextContent),
    Shape(ShapeContent),
    Path(PathContent),
    ImageGenerator(GeneratorContent),
    VideoGenerator(GeneratorContent),
    Video(VideoContent),
    Connector(ConnectorContent),
}

impl ElementContent {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementContent::Image(_) => ElementKind::Image,
            ElementContent::Text(_) => ElementKind::Text,
            ElementContent::Shape(_) => ElementKind::Shape,
            ElementContent::Path(_) => ElementKind::Path,
            ElementContent::ImageGenerator(_) => ElementKind::ImageGenerator,
            ElementContent::VideoGenerator(_) => ElementKind::VideoGenerator,
            ElementContent::Video(_) => ElementKind::Video,
            ElementContent::Connector(_) => ElementKind::Connector,
        }
    }
}

/// A scene element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    /// Top-left anchor in scene coordinates.
    pub position: Point,
    /// Explicit size; `None` falls back to the kind default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Excluded from rendering and hit-testing.
    #[serde(default)]
    pub hidden: bool,
    /// Excluded from pointer-driven move/resize.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) linked_elements: Vec<ElementId>,
    pub content: ElementContent,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(position: Point, content: ElementContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size: None,
            hidden: false,
            locked: false,
            group_id: None,
            linked_elements: Vec::new(),
            content,
        }
    }

    /// Create an image element.
    pub fn image(position: Point, size: Size, source: MediaSource) -> Self {
        Self::new(
            position,
            ElementContent::Image(ImageContent {
                source,
                generated_by: None,
            }),
        )
        .with_size(size)
    }

    /// Create a video element.
    pub fn video(position: Point, size: Size, source: MediaSource) -> Self {
        Self::new(
            position,
            ElementContent::Video(VideoContent {
                source,
                generated_by: None,
            }),
        )
        .with_size(size)
    }

    /// Create a text element.
    pub fn text(position: Point, text: impl Into<String>) -> Self {
        Self::new(
            position,
            ElementContent::Text(TextContent {
                text: text.into(),
                font_size: 16.0,
                color: SerializableColor::black(),
            }),
        )
    }

    /// Create a shape element.
    pub fn shape(position: Point, size: Size, shape: ShapeKind, fill: SerializableColor) -> Self {
        Self::new(
            position,
            ElementContent::Shape(ShapeContent {
                shape,
                fill,
                stroke: None,
            }),
        )
        .with_size(size)
    }

    /// Create a path element from absolute scene points.
    ///
    /// Returns `None` for fewer than two points.
    pub fn path(
        points: &[Point],
        stroke_width: f64,
        stroke_color: SerializableColor,
    ) -> Option<Self> {
        let (origin, size, content) =
            PathContent::from_scene_points(points, stroke_width, stroke_color)?;
        Some(Self::new(origin, ElementContent::Path(content)).with_size(size))
    }

    /// Create an image generator placeholder.
    pub fn image_generator(
        position: Point,
        size: Size,
        reference_image_id: Option<ElementId>,
    ) -> Self {
        Self::new(
            position,
            ElementContent::ImageGenerator(GeneratorContent {
                reference_image_id,
                prompt: None,
            }),
        )
        .with_size(size)
    }

    /// Create a video generator placeholder.
    pub fn video_generator(
        position: Point,
        size: Size,
        reference_image_id: Option<ElementId>,
    ) -> Self {
        Self::new(
            position,
            ElementContent::VideoGenerator(GeneratorContent {
                reference_image_id,
                prompt: None,
            }),
        )
        .with_size(size)
    }

    /// Create a connector between two elements.
    pub fn connector(from: ElementId, to: ElementId, style: LineStyle) -> Self {
        Self::new(Point::ZERO, ElementContent::Connector(ConnectorContent { from, to, style }))
    }

    /// Set an explicit size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Mark the element locked.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Tag the element with a group at construction time.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Get the unique identifier.
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Effective size (explicit or kind default).
    pub fn size(&self) -> Size {
        self.size.unwrap_or_else(|| self.kind().default_size())
    }

    /// Bounding box in scene coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Right edge (`x + width`).
    pub fn right_edge(&self) -> f64 {
        self.position.x + self.size().width
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    /// Assign a group if the element has none yet.
    ///
    /// Returns whether the element ends up in `group_id`; an existing different group is
    /// left untouched.
    pub fn assign_group(&mut self, group_id: GroupId) -> bool {
        if self.group_id.is_some() {
            return self.group_id == Some(group_id);
        }
        self.group_id = Some(group_id);
        true
    }

    pub fn linked_elements(&self) -> &[ElementId] {
        &self.linked_elements
    }

    /// Merge an id into the linked set.
    pub fn link(&mut self, id: ElementId) {
        if id != self.id && !self.linked_elements.contains(&id) {
            self.linked_elements.push(id);
        }
    }

    /// Reference image of a generator, if any.
    pub fn reference_image_id(&self) -> Option<ElementId> {
        match &self.content {
            ElementContent::ImageGenerator(g) | ElementContent::VideoGenerator(g) => {
                g.reference_image_id
            }
            _ => None,
        }
    }

    /// Element whose repeated generation produced this one.
    pub fn generated_by(&self) -> Option<ElementId> {
        match &self.content {
            ElementContent::Image(image) => image.generated_by,
            ElementContent::Video(video) => video.generated_by,
            _ => None,
        }
    }

    /// Endpoints of a connector.
    pub fn as_connector(&self) -> Option<&ConnectorContent> {
        match &self.content {
            ElementContent::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.content, ElementContent::Connector(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, ElementContent::Image(_))
    }

    /// Whether the element takes part in pointer hit-testing.
    pub fn is_interactive(&self) -> bool {
        !self.hidden && !self.is_connector()
    }

    /// Check if a point (in scene coordinates) hits this element.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if !self.is_interactive() {
            return false;
        }
        match &self.content {
            ElementContent::Path(path) => path.hit_test(self.position, point, tolerance),
            _ => self.bounds().inflate(tolerance, tolerance).contains(point),
        }
    }

    /// Move the element by a delta. Connectors carry no transform and are unaffected.
    pub fn translate(&mut self, delta: Vec2) {
        if !self.is_connector() {
            self.position += delta;
        }
    }

    /// Place the element in a new box, rescaling path points to match.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if self.is_connector() {
            return;
        }
        let old_size = self.size();
        let new_size = bounds.size();
        if let ElementContent::Path(path) = &mut self.content {
            path.rescale(old_size, new_size);
        }
        self.position = bounds.origin();
        self.size = Some(new_size);
    }

    /// Clone with a fresh id, outside any flow group and with no flow links or
    /// generation history, for duplication.
    pub fn duplicated(&self) -> Self {
        let mut copy = Self {
            id: Uuid::new_v4(),
            group_id: None,
            linked_elements: Vec::new(),
            ..self.clone()
        };
        match &mut copy.content {
            ElementContent::Image(ImageContent { generated_by, .. })
            | ElementContent::Video(VideoContent { generated_by, .. }) => *generated_by = None,
            _ => {}
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_content() {
        let generator = Element::image_generator(Point::ZERO, Size::new(10.0, 10.0), None);
        assert_eq!(generator.kind(), ElementKind::ImageGenerator);
        assert!(generator.kind().is_generator());

        let text = Element::text(Point::ZERO, "hello");
        assert_eq!(text.kind(), ElementKind::Text);
        assert_eq!(text.size(), Size::new(200.0, 50.0));
    }

    #[test]
    fn test_default_size() {
        let shape = Element::new(
            Point::ZERO,
            ElementContent::Shape(ShapeContent {
                shape: ShapeKind::Ellipse,
                fill: SerializableColor::white(),
                stroke: None,
            }),
        );
        assert_eq!(shape.size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = Element::text(Point::ZERO, "a");
        let b = Element::text(Point::ZERO, "a");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), a.duplicated().id());
    }

    #[test]
    fn test_group_is_never_overwritten() {
        let mut element = Element::text(Point::ZERO, "x");
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        assert!(element.assign_group(first));
        assert!(!element.assign_group(second));
        assert_eq!(element.group_id(), Some(first));
    }

    #[test]
    fn test_link_is_a_set() {
        let mut element = Element::text(Point::ZERO, "x");
        let other = Uuid::new_v4();
        element.link(other);
        element.link(other);
        element.link(element.id());
        assert_eq!(element.linked_elements(), &[other]);
    }

    #[test]
    fn test_hidden_and_connectors_are_not_hit() {
        let mut image = Element::image(
            Point::ZERO,
            Size::new(100.0, 100.0),
            MediaSource::url("a.png"),
        );
        assert!(image.hit_test(Point::new(50.0, 50.0), 0.0));
        image.hidden = true;
        assert!(!image.hit_test(Point::new(50.0, 50.0), 0.0));

        let connector = Element::connector(Uuid::new_v4(), Uuid::new_v4(), LineStyle::Dashed);
        assert!(!connector.hit_test(Point::ZERO, 10.0));
    }

    #[test]
    fn test_set_bounds_rescales_path() {
        let mut path = Element::path(
            &[Point::new(0.0, 0.0), Point::new(40.0, 20.0)],
            2.0,
            SerializableColor::black(),
        )
        .unwrap();
        path.set_bounds(Rect::new(10.0, 10.0, 90.0, 50.0));
        assert_eq!(path.position, Point::new(10.0, 10.0));
        assert_eq!(path.size(), Size::new(80.0, 40.0));
        match &path.content {
            ElementContent::Path(p) => assert_eq!(p.points[1], Point::new(80.0, 40.0)),
            _ => panic!("Expected Path content"),
        }
    }

    #[test]
    fn test_duplicate_leaves_flow() {
        let mut image = Element::image(
            Point::ZERO,
            Size::new(10.0, 10.0),
            MediaSource::url("a.png"),
        )
        .with_group(Uuid::new_v4());
        image.link(Uuid::new_v4());
        if let ElementContent::Image(content) = &mut image.content {
            content.generated_by = Some(Uuid::new_v4());
        }

        let copy = image.duplicated();
        assert_ne!(copy.id(), image.id());
        assert_eq!(copy.group_id(), None);
        assert!(copy.linked_elements().is_empty());
        assert_eq!(copy.generated_by(), None);
        assert_eq!(copy.position, image.position);
        assert!(image.generated_by().is_some());
    }

    #[test]
    fn test_connector_ignores_transform() {
        let mut connector = Element::connector(Uuid::new_v4(), Uuid::new_v4(), LineStyle::Solid);
        connector.translate(Vec2::new(10.0, 10.0));
        assert_eq!(connector.position, Point::ZERO);
    }

    #[test]
    fn test_json_tagging() {
        let element = Element::image_generator(Point::new(1.0, 2.0), Size::new(3.0, 4.0), None);
        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"kind\":\"image-generator\""));
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_color_conversion() {
        let color = SerializableColor::new(10, 20, 30, 255);
        let peniko_color: Color = color.into();
        assert_eq!(SerializableColor::from(peniko_color), color);
    }
}
