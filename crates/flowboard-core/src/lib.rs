//! Flowboard Core Library
//!
//! Headless scene engine for a pannable, zoomable design canvas: typed elements,
//! selection and pointer interactions, generation flows, and ingestion of generated
//! content.

pub mod camera;
pub mod config;
pub mod editor;
pub mod elements;
pub mod error;
pub mod flow;
pub mod ingest;
pub mod input;
pub mod interaction;
pub mod render;
pub mod scene;
pub mod selection;
pub mod store;
pub mod tools;

pub use camera::Camera;
pub use config::CanvasConfig;
pub use editor::Editor;
pub use elements::{Element, ElementContent, ElementId, ElementKind, GroupId, MediaSource};
pub use error::{SceneError, SceneResult};
pub use flow::{FlowLink, GeneratorKind};
pub use ingest::{AnalysisResult, DetectedObject, GenerationResult, GenerationTarget};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{CanvasEvent, Interaction, InteractionController, RegionSelection};
pub use render::{DisplayList, DrawItem, Renderer};
pub use scene::SceneState;
pub use selection::{Handle, HandleKind};
pub use store::{ElementPatch, ElementStore};
pub use tools::ToolKind;
