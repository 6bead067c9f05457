use crate::contact::Location;

/// Narrowest and widest visible longitude span, in degrees.
const MIN_SPAN: f64 = 0.5;
const MAX_SPAN: f64 = 360.0;

/// Span used after flying to a specific contact.
const FLY_SPAN: f64 = 10.0;

/// Fraction of the visible span moved per pan step.
const PAN_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// All located contacts rendered as markers.
    View,
    /// A single centered crosshair; the center is the picked coordinate.
    Select,
}

/// State of one map pane: center, visible span and mode. Rendering happens
/// on a ratatui canvas in the draw layer; this struct only answers "what is
/// centered where".
#[derive(Debug, Clone)]
pub struct MapView {
    mode: MapMode,
    center: Location,
    span: f64,
}

impl MapView {
    pub fn new(mode: MapMode, center: Location, span: f64) -> Self {
        let mut view = Self {
            mode,
            center,
            span: span.clamp(MIN_SPAN, MAX_SPAN),
        };
        view.clamp_center();
        view
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// The current center. In `Select` mode this is the continuously
    /// reported pick coordinate.
    pub fn center(&self) -> Location {
        self.center
    }

    pub fn span(&self) -> f64 {
        self.span
    }

    /// Recenter on an explicit location and zoom in on it.
    pub fn fly_to(&mut self, location: Location) {
        self.center = location;
        self.span = self.span.min(FLY_SPAN);
        self.clamp_center();
    }

    /// Pan by whole steps; a step is a fixed fraction of the visible span so
    /// panning stays usable at any zoom.
    pub fn pan(&mut self, steps_x: i16, steps_y: i16) {
        self.center.lng += f64::from(steps_x) * self.span * PAN_STEP;
        self.center.lat += f64::from(steps_y) * self.span * PAN_STEP;
        self.clamp_center();
    }

    pub fn zoom_in(&mut self) {
        self.span = (self.span * 0.5).max(MIN_SPAN);
    }

    pub fn zoom_out(&mut self) {
        self.span = (self.span * 2.0).min(MAX_SPAN);
    }

    /// Longitude bounds for the canvas.
    pub fn x_bounds(&self) -> [f64; 2] {
        [self.center.lng - self.span / 2.0, self.center.lng + self.span / 2.0]
    }

    /// Latitude bounds. Half the longitude span: terminal cells are roughly
    /// twice as tall as wide, so this keeps the projection near-square.
    pub fn y_bounds(&self) -> [f64; 2] {
        [self.center.lat - self.span / 4.0, self.center.lat + self.span / 4.0]
    }

    fn clamp_center(&mut self) {
        self.center.lat = self.center.lat.clamp(-85.0, 85.0);
        if self.center.lng > 180.0 {
            self.center.lng -= 360.0;
        } else if self.center.lng < -180.0 {
            self.center.lng += 360.0;
        }
    }
}
