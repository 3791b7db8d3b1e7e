use std::fmt;

use svgtypes::{PathParser, PathSegment};

use crate::Error;
use crate::matrix::Matrix;

/// Parsed path-data mini-language: an ordered sequence of draw commands.
///
/// Commands keep their absolute/relative flag as parsed. Any prefix of the
/// sequence is itself a renderable path, which is what the incremental
/// reveal relies on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData {
    pub segments: Vec<PathSegment>,
}

impl PathData {
    pub fn parse(d: &str) -> Result<Self, Error> {
        let segments = PathParser::from(d).collect::<Result<Vec<_>, _>>()?;
        Ok(PathData { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First `count` commands as a new path. Cutting mid-subpath is fine;
    /// a truncated subpath is never re-closed.
    pub fn slice(&self, count: usize) -> PathData {
        PathData {
            segments: self.segments[..count.min(self.segments.len())].to_vec(),
        }
    }

    /// Rewrite every command as absolute. Horizontal and vertical line
    /// commands become plain `L` commands since they cannot express an
    /// off-axis endpoint after rotation or skew.
    pub fn to_absolute(&mut self) {
        let (mut cx, mut cy) = (0.0, 0.0);
        let (mut sx, mut sy) = (0.0, 0.0);
        for seg in &mut self.segments {
            *seg = match *seg {
                PathSegment::MoveTo { abs, x, y } => {
                    let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                    (cx, cy) = (x, y);
                    (sx, sy) = (x, y);
                    PathSegment::MoveTo { abs: true, x, y }
                }
                PathSegment::LineTo { abs, x, y } => {
                    let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                    (cx, cy) = (x, y);
                    PathSegment::LineTo { abs: true, x, y }
                }
                PathSegment::HorizontalLineTo { abs, x } => {
                    let x = if abs { x } else { cx + x };
                    cx = x;
                    PathSegment::LineTo { abs: true, x, y: cy }
                }
                PathSegment::VerticalLineTo { abs, y } => {
                    let y = if abs { y } else { cy + y };
                    cy = y;
                    PathSegment::LineTo { abs: true, x: cx, y }
                }
                PathSegment::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let (x1, y1, x2, y2, x, y) = if abs {
                        (x1, y1, x2, y2, x, y)
                    } else {
                        (cx + x1, cy + y1, cx + x2, cy + y2, cx + x, cy + y)
                    };
                    (cx, cy) = (x, y);
                    PathSegment::CurveTo {
                        abs: true,
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                    let (x2, y2, x, y) = if abs {
                        (x2, y2, x, y)
                    } else {
                        (cx + x2, cy + y2, cx + x, cy + y)
                    };
                    (cx, cy) = (x, y);
                    PathSegment::SmoothCurveTo {
                        abs: true,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                PathSegment::Quadratic { abs, x1, y1, x, y } => {
                    let (x1, y1, x, y) = if abs {
                        (x1, y1, x, y)
                    } else {
                        (cx + x1, cy + y1, cx + x, cy + y)
                    };
                    (cx, cy) = (x, y);
                    PathSegment::Quadratic {
                        abs: true,
                        x1,
                        y1,
                        x,
                        y,
                    }
                }
                PathSegment::SmoothQuadratic { abs, x, y } => {
                    let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                    (cx, cy) = (x, y);
                    PathSegment::SmoothQuadratic { abs: true, x, y }
                }
                PathSegment::EllipticalArc {
                    abs,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                    (cx, cy) = (x, y);
                    PathSegment::EllipticalArc {
                        abs: true,
                        rx,
                        ry,
                        x_axis_rotation,
                        large_arc,
                        sweep,
                        x,
                        y,
                    }
                }
                PathSegment::ClosePath { .. } => {
                    (cx, cy) = (sx, sy);
                    PathSegment::ClosePath { abs: true }
                }
            };
        }
    }

    /// Apply an affine transform to every coordinate. Relative commands are
    /// made absolute first; deltas do not commute with the matrix.
    pub fn transform(&mut self, m: &Matrix) {
        if m.is_identity() {
            return;
        }
        self.to_absolute();
        for seg in &mut self.segments {
            *seg = match *seg {
                PathSegment::MoveTo { x, y, .. } => {
                    let (x, y) = m.apply(x, y);
                    PathSegment::MoveTo { abs: true, x, y }
                }
                PathSegment::LineTo { x, y, .. } => {
                    let (x, y) = m.apply(x, y);
                    PathSegment::LineTo { abs: true, x, y }
                }
                PathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                    ..
                } => {
                    let (x1, y1) = m.apply(x1, y1);
                    let (x2, y2) = m.apply(x2, y2);
                    let (x, y) = m.apply(x, y);
                    PathSegment::CurveTo {
                        abs: true,
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                PathSegment::SmoothCurveTo { x2, y2, x, y, .. } => {
                    let (x2, y2) = m.apply(x2, y2);
                    let (x, y) = m.apply(x, y);
                    PathSegment::SmoothCurveTo {
                        abs: true,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                PathSegment::Quadratic { x1, y1, x, y, .. } => {
                    let (x1, y1) = m.apply(x1, y1);
                    let (x, y) = m.apply(x, y);
                    PathSegment::Quadratic {
                        abs: true,
                        x1,
                        y1,
                        x,
                        y,
                    }
                }
                PathSegment::SmoothQuadratic { x, y, .. } => {
                    let (x, y) = m.apply(x, y);
                    PathSegment::SmoothQuadratic { abs: true, x, y }
                }
                PathSegment::EllipticalArc {
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                    ..
                } => map_arc(m, rx, ry, x_axis_rotation, large_arc, sweep, x, y),
                // to_absolute never leaves H/V behind
                other => other,
            };
        }
    }
}

/// Transform an elliptical arc by mapping its underlying ellipse. The 2x2
/// SVD of the transformed axis matrix yields the new radii (singular values)
/// and axis rotation (left factor); a negative determinant mirrors the
/// plane, which flips the sweep direction.
#[allow(clippy::too_many_arguments)]
fn map_arc(
    m: &Matrix,
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
    x: f64,
    y: f64,
) -> PathSegment {
    let phi = x_axis_rotation.to_radians();
    let (sin_p, cos_p) = phi.sin_cos();
    let m11 = rx * (m.a * cos_p + m.c * sin_p);
    let m21 = rx * (m.b * cos_p + m.d * sin_p);
    let m12 = ry * (m.c * cos_p - m.a * sin_p);
    let m22 = ry * (m.d * cos_p - m.b * sin_p);

    let e = (m11 + m22) / 2.0;
    let f = (m11 - m22) / 2.0;
    let g = (m21 + m12) / 2.0;
    let h = (m21 - m12) / 2.0;
    let q = e.hypot(h);
    let r = f.hypot(g);

    let a1 = g.atan2(f);
    let a2 = h.atan2(e);
    let (x, y) = m.apply(x, y);

    PathSegment::EllipticalArc {
        abs: true,
        rx: q + r,
        ry: (q - r).abs(),
        x_axis_rotation: ((a2 + a1) / 2.0).to_degrees(),
        large_arc,
        sweep: if m.determinant() < 0.0 { !sweep } else { sweep },
        x,
        y,
    }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write_segment(f, seg)?;
        }
        Ok(())
    }
}

fn letter(upper: char, abs: bool) -> char {
    if abs {
        upper
    } else {
        upper.to_ascii_lowercase()
    }
}

fn write_segment(f: &mut fmt::Formatter<'_>, seg: &PathSegment) -> fmt::Result {
    match *seg {
        PathSegment::MoveTo { abs, x, y } => write!(f, "{} {} {}", letter('M', abs), x, y),
        PathSegment::LineTo { abs, x, y } => write!(f, "{} {} {}", letter('L', abs), x, y),
        PathSegment::HorizontalLineTo { abs, x } => write!(f, "{} {}", letter('H', abs), x),
        PathSegment::VerticalLineTo { abs, y } => write!(f, "{} {}", letter('V', abs), y),
        PathSegment::CurveTo {
            abs,
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => write!(
            f,
            "{} {} {} {} {} {} {}",
            letter('C', abs),
            x1,
            y1,
            x2,
            y2,
            x,
            y
        ),
        PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
            write!(f, "{} {} {} {} {}", letter('S', abs), x2, y2, x, y)
        }
        PathSegment::Quadratic { abs, x1, y1, x, y } => {
            write!(f, "{} {} {} {} {}", letter('Q', abs), x1, y1, x, y)
        }
        PathSegment::SmoothQuadratic { abs, x, y } => {
            write!(f, "{} {} {}", letter('T', abs), x, y)
        }
        PathSegment::EllipticalArc {
            abs,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        } => write!(
            f,
            "{} {} {} {} {} {} {} {}",
            letter('A', abs),
            rx,
            ry,
            x_axis_rotation,
            u8::from(large_arc),
            u8::from(sweep),
            x,
            y
        ),
        PathSegment::ClosePath { abs } => f.write_str(if abs { "Z" } else { "z" }),
    }
}
