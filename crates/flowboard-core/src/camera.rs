//! Camera module for pan/zoom transforms.

use crate::config::CanvasConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Convert a screen point to scene coordinates: `(screen - pan) / scale`.
pub fn to_scene(screen: Point, pan: Vec2, scale: f64) -> Point {
    Point::new((screen.x - pan.x) / scale, (screen.y - pan.y) / scale)
}

/// Convert a scene point to screen coordinates: `scene * scale + pan`.
pub fn to_screen(scene: Point, pan: Vec2, scale: f64) -> Point {
    Point::new(scene.x * scale + pan.x, scene.y * scale + pan.y)
}

/// Camera manages the view transform for the canvas.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between screen coordinates and scene coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current scale factor
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera using the scale range from a configuration.
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: config.min_scale,
            max_zoom: config.max_scale,
        }
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts scene coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Convert a screen point to scene coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        to_scene(screen_point, self.offset, self.zoom)
    }

    /// Convert a scene point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        to_screen(world_point, self.offset, self.zoom)
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set pan and scale directly. The scale is clamped to the allowed range.
    pub fn set(&mut self, offset: Vec2, zoom: f64) {
        self.offset = offset;
        self.zoom = self.clamp_zoom(zoom);
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.zoom
        }
    }

    /// Set a new scale while keeping the scene point under `anchor` fixed on screen.
    ///
    /// `pan' = anchor - (anchor - pan) * (s' / s)`
    pub fn set_zoom_at(&mut self, anchor: Point, zoom: f64) {
        let new_zoom = self.clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let ratio = new_zoom / self.zoom;
        let anchor = anchor.to_vec2();
        self.offset = anchor - (anchor - self.offset) * ratio;
        self.zoom = new_zoom;
    }

    /// Zoom the camera by a multiplicative factor, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.set_zoom_at(screen_point, self.zoom * factor);
    }

    /// Toolbar zoom in, anchored at the viewport center.
    pub fn zoom_in(&mut self, viewport: Size, step: f64) {
        self.zoom_at(viewport_center(viewport), step);
    }

    /// Toolbar zoom out, anchored at the viewport center.
    pub fn zoom_out(&mut self, viewport: Size, step: f64) {
        self.zoom_at(viewport_center(viewport), 1.0 / step);
    }

    /// The scene-space rectangle currently visible in a viewport.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Rect::from_points(top_left, bottom_right)
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        let center = viewport_center(viewport);

        self.offset = Vec2::new(
            center.x - bounds_center.x * self.zoom,
            center.y - bounds_center.y * self.zoom,
        );
    }
}

fn viewport_center(viewport: Size) -> Point {
    Point::new(viewport.width / 2.0, viewport.height / 2.0)
}
