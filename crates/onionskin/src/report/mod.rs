pub mod json;
pub mod terminal;

use std::time::Duration;

use onionskin::{Composition, ComparisonSession, DecodedImage, PresentationState, View};
use serde::Serialize;

/// One side of the comparison as shown to the user.
#[derive(Debug, Serialize)]
pub struct SideInfo {
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl SideInfo {
    fn new(source: &str, img: &DecodedImage) -> Self {
        Self {
            source: source.to_owned(),
            width: img.width(),
            height: img.height(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiffStats {
    pub sensitivity: u8,
    pub changed_pixels: u64,
    pub total_pixels: u64,
    pub change_ratio: f64,
    /// `Some((prev_w, prev_h, cur_w, cur_h))` when only the overlap was compared.
    pub dimension_mismatch: Option<(u32, u32, u32, u32)>,
}

/// Everything the presentation layer needs after one comparison.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub state: &'static str,
    pub view: Option<View>,
    pub previous: Option<SideInfo>,
    pub current: Option<SideInfo>,
    pub diff: Option<DiffStats>,
    /// Sources that could not be read or decoded and were treated as absent.
    pub notices: Vec<String>,
    pub output: Option<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Summary {
    pub fn new(
        session: &ComparisonSession,
        composition: &Composition,
        labels: (&str, &str),
        notices: Vec<String>,
    ) -> Self {
        let state = session.state();
        let previous = session.previous().map(|p| SideInfo::new(labels.0, p));
        let current = session.current().map(|c| SideInfo::new(labels.1, c));

        let diff = match (&state, composition.diff()) {
            (
                PresentationState::Comparing {
                    previous, current, ..
                },
                Some(result),
            ) => Some(DiffStats {
                sensitivity: session.sensitivity(),
                changed_pixels: result.changed_pixels,
                total_pixels: result.total_pixels,
                change_ratio: result.change_ratio(),
                dimension_mismatch: (previous.dimensions() != current.dimensions()).then(|| {
                    (
                        previous.width(),
                        previous.height(),
                        current.width(),
                        current.height(),
                    )
                }),
            }),
            _ => None,
        };

        Self {
            state: state.label(),
            view: session.view(),
            previous,
            current,
            diff,
            notices,
            output: None,
            elapsed: Duration::ZERO,
        }
    }
}
