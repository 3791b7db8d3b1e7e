//! Core pipeline for the connect-the-dots icon game.
//!
//! Turns an arbitrary SVG icon into a playable puzzle in four synchronous
//! steps: normalize the element tree into path-only form, sample each path's
//! geometry in drawing order, lay numbered markers along the samples, and
//! drive the click-to-reveal state machine. No I/O happens here; the caller
//! fetches the SVG text and maps the emitted game events onto sounds and DOM
//! updates.

pub mod consts;
pub mod game;
pub mod markers;
pub mod matrix;
pub mod normalize;
pub mod path;
pub mod sampler;
pub mod shapes;
pub mod tree;

pub use game::{GameEvent, Puzzle, PuzzlePath, ViewBox};
pub use markers::{MarkerRecord, Rect};
pub use matrix::Matrix;
pub use path::PathData;
pub use sampler::SamplePoint;
pub use shapes::{CircleAlgorithm, Options};
pub use tree::{NodeId, SvgTree};

/// Errors raised while turning SVG text into a puzzle. A failed build rejects
/// the icon wholesale; the caller is expected to pick a different one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed path data: {0}")]
    Path(#[from] svgtypes::Error),
    #[error("malformed svg document: {0}")]
    Xml(#[from] roxmltree::Error),
}
