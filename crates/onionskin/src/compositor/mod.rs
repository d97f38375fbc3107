//! Turns session state into a renderable description of the active view.
//!
//! Exactly one [`Composition`] variant is produced per call, chosen by the
//! session's presentation state and view mode. The diff itself is delegated
//! to [`crate::diff`] and only ever computed in diff mode.

pub mod raster;
pub mod transform;

use std::sync::Arc;

use tracing::debug;

use crate::diff::{self, DiffResult};
use crate::decoded::DecodedImage;
use crate::session::{ComparisonSession, PresentationState, View};

pub use self::transform::{Rect, Transform, Viewport, fit_contain};

/// Horizontal gap between the two side-by-side panels, in view pixels.
pub const PANEL_GUTTER: f64 = 8.0;

/// Onion skin: previous as base, current blended on top, one shared transform.
#[derive(Clone, Debug)]
pub struct OnionSkin {
    pub previous: Arc<DecodedImage>,
    pub current: Arc<DecodedImage>,
    /// Untransformed placement of each layer inside the viewport.
    pub base: Rect,
    pub overlay: Rect,
    /// Overlay alpha in 0.0..=1.0 (`opacity / 100`).
    pub alpha: f64,
    /// Applied identically to both layers so they stay registered.
    pub transform: Transform,
}

/// One side-by-side container and where its image sits inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Panel {
    pub bounds: Rect,
    pub image: Rect,
}

#[derive(Clone, Debug)]
pub struct SideBySide {
    pub previous: Arc<DecodedImage>,
    pub current: Arc<DecodedImage>,
    pub left: Panel,
    pub right: Panel,
}

#[derive(Clone, Debug)]
pub struct DiffView {
    pub result: Arc<DiffResult>,
    pub sensitivity: u8,
    pub placement: Rect,
}

#[derive(Clone, Debug)]
pub enum Composition {
    Empty,
    NewFile {
        current: Arc<DecodedImage>,
        placement: Rect,
    },
    Deleted {
        previous: Arc<DecodedImage>,
        placement: Rect,
    },
    OnionSkin(OnionSkin),
    SideBySide(SideBySide),
    Diff(DiffView),
}

impl Composition {
    /// Diff statistics, present only in diff mode.
    pub fn diff(&self) -> Option<&DiffResult> {
        match self {
            Self::Diff(view) => Some(&view.result),
            _ => None,
        }
    }
}

/// Identity of the inputs a cached diff was computed from.
struct CachedDiff {
    previous: Arc<DecodedImage>,
    current: Arc<DecodedImage>,
    sensitivity: u8,
    result: Arc<DiffResult>,
}

impl CachedDiff {
    fn matches(
        &self,
        previous: &Arc<DecodedImage>,
        current: &Arc<DecodedImage>,
        sensitivity: u8,
    ) -> bool {
        Arc::ptr_eq(&self.previous, previous)
            && Arc::ptr_eq(&self.current, current)
            && self.sensitivity == sensitivity
    }
}

/// Produces compositions and remembers the last diff it computed.
#[derive(Default)]
pub struct Compositor {
    cached: Option<CachedDiff>,
    diff_runs: u64,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times this compositor has run the diff engine.
    pub fn diff_runs(&self) -> u64 {
        self.diff_runs
    }

    /// Accept a diff computed elsewhere (e.g. by the async pipeline) so the
    /// next diff-mode composition does not recompute it.
    pub fn install_diff(
        &mut self,
        previous: &Arc<DecodedImage>,
        current: &Arc<DecodedImage>,
        sensitivity: u8,
        result: Arc<DiffResult>,
    ) {
        self.cached = Some(CachedDiff {
            previous: previous.clone(),
            current: current.clone(),
            sensitivity,
            result,
        });
    }

    pub fn compose(&mut self, session: &ComparisonSession, viewport: Viewport) -> Composition {
        let bounds = viewport.bounds();
        match session.state() {
            PresentationState::Empty => Composition::Empty,
            PresentationState::NewFile { current } => Composition::NewFile {
                placement: fit_contain(current.width(), current.height(), bounds),
                current,
            },
            PresentationState::Deleted { previous } => Composition::Deleted {
                placement: fit_contain(previous.width(), previous.height(), bounds),
                previous,
            },
            PresentationState::Comparing {
                previous,
                current,
                view,
            } => match view {
                View::OnionSkin { opacity, zoom, pan } => Composition::OnionSkin(OnionSkin {
                    base: fit_contain(previous.width(), previous.height(), bounds),
                    overlay: fit_contain(current.width(), current.height(), bounds),
                    alpha: f64::from(opacity) / 100.0,
                    transform: Transform::for_view(zoom, pan, viewport),
                    previous,
                    current,
                }),
                View::SideBySide => {
                    let (left, right) = split_panels(viewport);
                    Composition::SideBySide(SideBySide {
                        left: Panel {
                            bounds: left,
                            image: fit_contain(previous.width(), previous.height(), left),
                        },
                        right: Panel {
                            bounds: right,
                            image: fit_contain(current.width(), current.height(), right),
                        },
                        previous,
                        current,
                    })
                }
                View::Diff { sensitivity } => {
                    let result = self.diff_for(&previous, &current, sensitivity);
                    let (w, h) = result.image.dimensions();
                    Composition::Diff(DiffView {
                        placement: fit_contain(w, h, bounds),
                        result,
                        sensitivity,
                    })
                }
            },
        }
    }

    fn diff_for(
        &mut self,
        previous: &Arc<DecodedImage>,
        current: &Arc<DecodedImage>,
        sensitivity: u8,
    ) -> Arc<DiffResult> {
        if let Some(cached) = &self.cached
            && cached.matches(previous, current, sensitivity)
        {
            return cached.result.clone();
        }

        let result = Arc::new(diff::diff(previous, current, sensitivity));
        self.diff_runs += 1;
        debug!(
            changed = result.changed_pixels,
            total = result.total_pixels,
            sensitivity,
            "diff computed"
        );
        self.install_diff(previous, current, sensitivity, result.clone());
        result
    }
}

/// Two equal containers filling the viewport, separated by the gutter.
fn split_panels(viewport: Viewport) -> (Rect, Rect) {
    let h = f64::from(viewport.height);
    let w = ((f64::from(viewport.width) - PANEL_GUTTER) / 2.0).max(0.0);
    (
        Rect::new(0.0, 0.0, w, h),
        Rect::new(w + PANEL_GUTTER, 0.0, w, h),
    )
}
