use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::diff::{DEFAULT_SENSITIVITY, MAX_SENSITIVITY};
use crate::decoded::DecodedImage;

pub const DEFAULT_OPACITY: u8 = 100;
pub const MAX_OPACITY: u8 = 100;

pub const DEFAULT_ZOOM: u16 = 100;
pub const MIN_ZOOM: u16 = 25;
pub const MAX_ZOOM: u16 = 400;
pub const ZOOM_STEP: u16 = 25;

/// Which visualization is active while both sides are present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    OnionSkin,
    SideBySide,
    Diff,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::OnionSkin => "onion skin",
            Self::SideBySide => "side by side",
            Self::Diff => "diff",
        }
    }
}

/// Pan offset in view-space pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

impl Pan {
    pub const ZERO: Pan = Pan { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A drag in progress: the pan at gesture start plus the live pointer delta.
///
/// The presentation layer creates one on pointer-down and feeds it cumulative
/// deltas; the resulting pan is always `anchor + delta`, so intermediate
/// pointer-move events never accumulate rounding drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGesture {
    anchor: Pan,
}

impl PanGesture {
    pub fn start(anchor: Pan) -> Self {
        Self { anchor }
    }

    pub fn anchor(&self) -> Pan {
        self.anchor
    }

    /// Pan for a cumulative pointer delta since the gesture started.
    pub fn pan_for(&self, dx: f64, dy: f64) -> Pan {
        Pan::new(self.anchor.x + dx, self.anchor.y + dy)
    }
}

/// Controls relevant to the active mode. Each variant carries only its own
/// parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum View {
    OnionSkin { opacity: u8, zoom: u16, pan: Pan },
    SideBySide,
    Diff { sensitivity: u8 },
}

impl View {
    pub fn mode(&self) -> ViewMode {
        match self {
            Self::OnionSkin { .. } => ViewMode::OnionSkin,
            Self::SideBySide => ViewMode::SideBySide,
            Self::Diff { .. } => ViewMode::Diff,
        }
    }
}

/// The four mutually exclusive high-level states of a comparison.
#[derive(Clone, Debug)]
pub enum PresentationState {
    Empty,
    NewFile { current: Arc<DecodedImage> },
    Deleted { previous: Arc<DecodedImage> },
    Comparing {
        previous: Arc<DecodedImage>,
        current: Arc<DecodedImage>,
        view: View,
    },
}

impl PresentationState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NewFile { .. } => "new file",
            Self::Deleted { .. } => "deleted",
            Self::Comparing { .. } => "comparing",
        }
    }
}

/// Mutable state for one comparison. Every operation is total; out of range
/// inputs are clamped silently.
#[derive(Clone, Debug)]
pub struct ComparisonSession {
    previous: Option<Arc<DecodedImage>>,
    current: Option<Arc<DecodedImage>>,
    mode: ViewMode,
    opacity: u8,
    zoom: u16,
    pan: Pan,
    sensitivity: u8,
}

impl Default for ComparisonSession {
    fn default() -> Self {
        Self {
            previous: None,
            current: None,
            mode: ViewMode::OnionSkin,
            opacity: DEFAULT_OPACITY,
            zoom: DEFAULT_ZOOM,
            pan: Pan::ZERO,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

fn same_side(a: &Option<Arc<DecodedImage>>, b: &Option<Arc<DecodedImage>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    // -- images --

    /// Replace both sides at once.
    ///
    /// Switching to a different pair resets mode, opacity, zoom and pan.
    /// Re-supplying the same pair (same `Arc`s) leaves them untouched.
    /// Sensitivity survives either way.
    pub fn set_images(
        &mut self,
        previous: Option<Arc<DecodedImage>>,
        current: Option<Arc<DecodedImage>>,
    ) -> &mut Self {
        let switched =
            !same_side(&self.previous, &previous) || !same_side(&self.current, &current);
        self.previous = previous;
        self.current = current;
        if switched {
            self.mode = ViewMode::OnionSkin;
            self.opacity = DEFAULT_OPACITY;
            self.zoom = DEFAULT_ZOOM;
            self.pan = Pan::ZERO;
        }
        self
    }

    pub fn previous(&self) -> Option<&Arc<DecodedImage>> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&Arc<DecodedImage>> {
        self.current.as_ref()
    }

    pub fn has_pair(&self) -> bool {
        self.previous.is_some() && self.current.is_some()
    }

    // -- mode --

    /// Ignored unless both sides are present.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> &mut Self {
        if self.has_pair() {
            self.mode = mode;
        }
        self
    }

    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    // -- onion skin --

    pub fn set_opacity(&mut self, v: i32) -> &mut Self {
        self.opacity = v.clamp(0, i32::from(MAX_OPACITY)) as u8;
        self
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn zoom_in(&mut self) -> &mut Self {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
        self
    }

    pub fn zoom_out(&mut self) -> &mut Self {
        self.zoom = self.zoom.saturating_sub(ZOOM_STEP).max(MIN_ZOOM);
        self
    }

    /// Clamp into range, then snap to the nearest zoom step.
    pub fn set_zoom(&mut self, v: i32) -> &mut Self {
        let step = i32::from(ZOOM_STEP);
        let v = v.clamp(i32::from(MIN_ZOOM), i32::from(MAX_ZOOM));
        self.zoom = ((v + step / 2) / step * step) as u16;
        self
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    /// "Fit": zoom 100%, pan cleared.
    pub fn reset_zoom_and_pan(&mut self) -> &mut Self {
        self.zoom = DEFAULT_ZOOM;
        self.pan = Pan::ZERO;
        self
    }

    /// "100%": zoom 100%, pan kept.
    pub fn reset_zoom_only(&mut self) -> &mut Self {
        self.zoom = DEFAULT_ZOOM;
        self
    }

    pub fn set_pan(&mut self, x: f64, y: f64) -> &mut Self {
        self.pan = Pan::new(x, y);
        self
    }

    /// Apply a cumulative drag delta relative to `gesture`'s anchor.
    pub fn apply_gesture(&mut self, gesture: &PanGesture, dx: f64, dy: f64) -> &mut Self {
        let pan = gesture.pan_for(dx, dy);
        self.set_pan(pan.x, pan.y)
    }

    pub fn pan(&self) -> Pan {
        self.pan
    }

    // -- diff --

    pub fn set_sensitivity(&mut self, v: i32) -> &mut Self {
        self.sensitivity = v.clamp(0, i32::from(MAX_SENSITIVITY)) as u8;
        self
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    // -- derived --

    /// Controls for the active mode, or `None` when not comparing.
    pub fn view(&self) -> Option<View> {
        if !self.has_pair() {
            return None;
        }
        Some(match self.mode {
            ViewMode::OnionSkin => View::OnionSkin {
                opacity: self.opacity,
                zoom: self.zoom,
                pan: self.pan,
            },
            ViewMode::SideBySide => View::SideBySide,
            ViewMode::Diff => View::Diff {
                sensitivity: self.sensitivity,
            },
        })
    }

    pub fn state(&self) -> PresentationState {
        match (&self.previous, &self.current) {
            (None, None) => PresentationState::Empty,
            (None, Some(current)) => PresentationState::NewFile {
                current: current.clone(),
            },
            (Some(previous), None) => PresentationState::Deleted {
                previous: previous.clone(),
            },
            (Some(previous), Some(current)) => PresentationState::Comparing {
                previous: previous.clone(),
                current: current.clone(),
                view: self.view().unwrap_or(View::SideBySide),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img() -> Arc<DecodedImage> {
        Arc::new(DecodedImage::filled(2, 2, [1, 2, 3, 255]).unwrap())
    }

    fn paired() -> ComparisonSession {
        let mut s = ComparisonSession::new();
        s.set_images(Some(img()), Some(img()));
        s
    }

    // -- defaults --

    #[test]
    fn defaults() {
        let s = ComparisonSession::new();
        assert_eq!(s.view_mode(), ViewMode::OnionSkin);
        assert_eq!(s.opacity(), 100);
        assert_eq!(s.zoom(), 100);
        assert_eq!(s.pan(), Pan::ZERO);
        assert_eq!(s.sensitivity(), 10);
    }

    // -- zoom --

    #[test]
    fn zoom_in_twice_from_default() {
        let mut s = ComparisonSession::new();
        s.zoom_in().zoom_in();
        assert_eq!(s.zoom(), 150);
    }

    #[test]
    fn zoom_out_once_from_default() {
        let mut s = ComparisonSession::new();
        s.zoom_out();
        assert_eq!(s.zoom(), 75);
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut s = ComparisonSession::new();
        for _ in 0..40 {
            s.zoom_in();
        }
        assert_eq!(s.zoom(), MAX_ZOOM);
        for _ in 0..40 {
            s.zoom_out();
        }
        assert_eq!(s.zoom(), MIN_ZOOM);
    }

    #[test]
    fn set_zoom_snaps_and_clamps() {
        let mut s = ComparisonSession::new();
        assert_eq!(s.set_zoom(137).zoom(), 125);
        assert_eq!(s.set_zoom(138).zoom(), 150);
        assert_eq!(s.set_zoom(-80).zoom(), MIN_ZOOM);
        assert_eq!(s.set_zoom(9000).zoom(), MAX_ZOOM);
        assert_eq!(s.zoom() % ZOOM_STEP, 0);
    }

    #[test]
    fn set_zoom_handles_extreme_values() {
        let mut s = ComparisonSession::new();
        assert_eq!(s.set_zoom(i32::MAX).zoom(), MAX_ZOOM);
        assert_eq!(s.set_zoom(i32::MIN).zoom(), MIN_ZOOM);
        assert_eq!(s.set_zoom(i32::MAX - 1).zoom(), MAX_ZOOM);
    }

    #[test]
    fn fit_resets_zoom_and_pan() {
        let mut s = ComparisonSession::new();
        s.zoom_in().zoom_in().set_pan(40.0, -12.5).zoom_out();
        s.reset_zoom_and_pan();
        assert_eq!(s.zoom(), 100);
        assert_eq!(s.pan(), Pan::ZERO);
    }

    #[test]
    fn hundred_percent_keeps_pan() {
        let mut s = ComparisonSession::new();
        s.zoom_in().set_pan(7.0, 9.0);
        s.reset_zoom_only();
        assert_eq!(s.zoom(), 100);
        assert_eq!(s.pan(), Pan::new(7.0, 9.0));
    }

    // -- clamping --

    #[test]
    fn opacity_and_sensitivity_clamp() {
        let mut s = ComparisonSession::new();
        assert_eq!(s.set_opacity(-5).opacity(), 0);
        assert_eq!(s.set_opacity(250).opacity(), 100);
        assert_eq!(s.set_opacity(42).opacity(), 42);
        assert_eq!(s.set_sensitivity(-1).sensitivity(), 0);
        assert_eq!(s.set_sensitivity(51).sensitivity(), 50);
        assert_eq!(s.set_sensitivity(5).sensitivity(), 5);
    }

    // -- pan gesture --

    #[test]
    fn gesture_is_anchor_plus_cumulative_delta() {
        let mut s = ComparisonSession::new();
        s.set_pan(10.0, 20.0);
        let g = PanGesture::start(s.pan());
        s.apply_gesture(&g, 3.0, 4.0);
        s.apply_gesture(&g, 5.0, -6.0);
        assert_eq!(s.pan(), Pan::new(15.0, 14.0));
        assert_eq!(g.anchor(), Pan::new(10.0, 20.0));
    }

    // -- view mode --

    #[test]
    fn set_view_mode_is_noop_without_pair() {
        let mut s = ComparisonSession::new();
        s.set_images(None, Some(img()));
        s.set_view_mode(ViewMode::Diff);
        assert_eq!(s.view_mode(), ViewMode::OnionSkin);
        assert!(s.view().is_none());
    }

    #[test]
    fn switching_modes_keeps_parameters() {
        let mut s = paired();
        s.set_opacity(30).zoom_in().set_pan(1.0, 2.0).set_sensitivity(22);
        for mode in [
            ViewMode::Diff,
            ViewMode::SideBySide,
            ViewMode::OnionSkin,
            ViewMode::Diff,
        ] {
            s.set_view_mode(mode);
            assert_eq!(s.view_mode(), mode);
            assert_eq!(s.opacity(), 30);
            assert_eq!(s.zoom(), 125);
            assert_eq!(s.pan(), Pan::new(1.0, 2.0));
            assert_eq!(s.sensitivity(), 22);
        }
    }

    #[test]
    fn view_carries_only_mode_fields() {
        let mut s = paired();
        s.set_sensitivity(7);
        s.set_view_mode(ViewMode::Diff);
        assert_eq!(s.view(), Some(View::Diff { sensitivity: 7 }));
        s.set_view_mode(ViewMode::SideBySide);
        assert_eq!(s.view(), Some(View::SideBySide));
        s.set_view_mode(ViewMode::OnionSkin);
        assert_eq!(
            s.view(),
            Some(View::OnionSkin {
                opacity: 100,
                zoom: 100,
                pan: Pan::ZERO
            })
        );
    }

    // -- set_images --

    #[test]
    fn new_pair_resets_view_but_not_sensitivity() {
        let mut s = paired();
        s.set_view_mode(ViewMode::Diff)
            .set_opacity(10)
            .zoom_in()
            .set_pan(3.0, 3.0)
            .set_sensitivity(40);
        s.set_images(Some(img()), Some(img()));
        assert_eq!(s.view_mode(), ViewMode::OnionSkin);
        assert_eq!(s.opacity(), 100);
        assert_eq!(s.zoom(), 100);
        assert_eq!(s.pan(), Pan::ZERO);
        assert_eq!(s.sensitivity(), 40);
    }

    #[test]
    fn same_pair_keeps_view() {
        let mut s = paired();
        s.set_view_mode(ViewMode::SideBySide).set_opacity(10);
        let (p, c) = (s.previous().cloned(), s.current().cloned());
        s.set_images(p, c);
        assert_eq!(s.view_mode(), ViewMode::SideBySide);
        assert_eq!(s.opacity(), 10);
    }

    // -- presentation state --

    #[test]
    fn states_are_exhaustive() {
        let mut s = ComparisonSession::new();
        assert!(matches!(s.state(), PresentationState::Empty));
        s.set_images(None, Some(img()));
        assert!(matches!(s.state(), PresentationState::NewFile { .. }));
        s.set_images(Some(img()), None);
        assert!(matches!(s.state(), PresentationState::Deleted { .. }));
        s.set_images(Some(img()), Some(img()));
        assert!(matches!(
            s.state(),
            PresentationState::Comparing {
                view: View::OnionSkin { .. },
                ..
            }
        ));
    }
}
