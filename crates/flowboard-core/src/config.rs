//! Tunable constants for the canvas, loadable from JSON.

use crate::error::{SceneError, SceneResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Canvas configuration.
///
/// Every field has a default, so a partial JSON object only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Smallest allowed scale factor.
    pub min_scale: f64,
    /// Largest allowed scale factor.
    pub max_scale: f64,
    /// Multiplicative zoom factor applied per wheel notch or toolbar click.
    pub zoom_step: f64,
    /// Minimum width/height an element can be resized to.
    pub min_element_size: f64,
    /// Region selections must exceed this in both dimensions to be emitted.
    pub min_region_size: f64,
    /// Resize handle hit radius in screen pixels.
    pub handle_tolerance: f64,
    /// Horizontal gap between nodes placed by the flow builder.
    pub flow_spacing: f64,
    /// Number of columns in the generation history grid.
    pub history_columns: usize,
    /// Gap between cells of the generation history grid.
    pub history_gap: f64,
    /// Size given to elements created without one.
    pub default_element_size: Size,
    /// Stroke width for new freehand paths.
    pub default_stroke_width: f64,
    /// Ad-hoc generated images are scaled down to fit within this box.
    pub max_ingest_size: Size,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 1.1,
            min_element_size: 20.0,
            min_region_size: 10.0,
            handle_tolerance: 8.0,
            flow_spacing: 80.0,
            history_columns: 3,
            history_gap: 16.0,
            default_element_size: Size::new(100.0, 100.0),
            default_stroke_width: 2.0,
            max_ingest_size: Size::new(512.0, 512.0),
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the values describe a usable canvas.
    pub fn validate(&self) -> SceneResult<()> {
        if !(self.min_scale > 0.0) {
            return Err(SceneError::InvalidConfig(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if self.min_scale > self.max_scale {
            return Err(SceneError::InvalidConfig(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_step > 1.0) {
            return Err(SceneError::InvalidConfig(format!(
                "zoom_step must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        if self.history_columns == 0 {
            return Err(SceneError::InvalidConfig(
                "history_columns must be at least 1".to_string(),
            ));
        }
        if self.min_element_size < 0.0 || self.min_region_size < 0.0 {
            return Err(SceneError::InvalidConfig(
                "minimum sizes must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
