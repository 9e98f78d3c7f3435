//! Tool modes for the canvas.

use crate::config::CanvasConfig;
use crate::elements::SerializableColor;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    /// Pan with the primary button.
    Hand,
    /// Freehand path capture.
    Draw,
    /// Rectangular region selection over an image.
    RegionEdit,
}

impl ToolKind {
    /// Get display name for the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Hand => "Hand",
            ToolKind::Draw => "Draw",
            ToolKind::RegionEdit => "Region",
        }
    }

    /// Keyboard shortcut for the tool.
    pub fn shortcut(&self) -> char {
        match self {
            ToolKind::Select => 'v',
            ToolKind::Hand => 'h',
            ToolKind::Draw => 'p',
            ToolKind::RegionEdit => 'r',
        }
    }

    pub fn from_shortcut(key: &str) -> Option<Self> {
        [ToolKind::Select, ToolKind::Hand, ToolKind::Draw, ToolKind::RegionEdit]
            .into_iter()
            .find(|tool| key.len() == 1 && key.eq_ignore_ascii_case(&tool.shortcut().to_string()))
    }
}

/// Manages the current tool and the style applied to new strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Stroke width for new paths.
    pub stroke_width: f64,
    /// Stroke color for new paths.
    pub stroke_color: SerializableColor,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            current_tool: ToolKind::default(),
            stroke_width: config.default_stroke_width,
            stroke_color: SerializableColor::black(),
        }
    }

    /// Switch to a different tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.current_tool != tool {
            log::debug!("Tool changed: {} -> {}", self.current_tool.name(), tool.name());
        }
        self.current_tool = tool;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool() {
        let manager = ToolManager::new();
        assert_eq!(manager.current_tool, ToolKind::Select);
        assert!((manager.stroke_width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(ToolKind::from_shortcut("h"), Some(ToolKind::Hand));
        assert_eq!(ToolKind::from_shortcut("P"), Some(ToolKind::Draw));
        assert_eq!(ToolKind::from_shortcut("Escape"), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ToolKind::RegionEdit).unwrap();
        assert_eq!(json, "\"region-edit\"");
    }
}
