//! Image comparison engine: onion-skin overlay, side-by-side panels and a
//! pixel-level difference map for a previous/current pair of rasters.
//!
//! - [`session`] holds the pair, the view mode and every mode parameter.
//! - [`compositor`] derives what to draw for the active mode.
//! - [`diff`] classifies changed pixels between two buffers.
//! - [`pipeline`] decodes and diffs off-thread, keeping only the newest result.

pub mod compositor;
pub mod decode;
pub mod decoded;
pub mod diff;
pub mod pipeline;
pub mod session;

pub use crate::compositor::{Composition, Compositor, Viewport};
pub use crate::decoded::{DecodedImage, ImageError};
pub use crate::diff::{DiffResult, diff};
pub use crate::session::{ComparisonSession, Pan, PanGesture, PresentationState, View, ViewMode};
