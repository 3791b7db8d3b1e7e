//! Tunables for marker layout.
//!
//! Lengths are in viewBox user units unless noted otherwise.

/// Fraction of the viewBox height a sample must travel from the previously
/// accepted sample before it earns its own marker.
pub const SKIP_FACTOR: f64 = 0.05;
/// Marker font size is the viewBox width divided by this.
pub const FONT_SIZE_DIVISOR: f64 = 40.0;
/// Extra label width reserved beyond the digits, in font-size units.
pub const LABEL_MARGIN: f64 = 1.0;
/// Spiral search bound, in grid steps per axis.
pub const SEARCH_RADIUS: i32 = 5;
/// Segment count for the quadratic-Bezier circle approximation.
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 8;
/// Paint substituted for unset fills and for `currentColor`.
pub const NEUTRAL_COLOR: &str = "gray";
