use std::f64::consts::PI;

use svgtypes::{PathSegment, PointsParser};

use crate::consts::DEFAULT_CIRCLE_SEGMENTS;
use crate::path::PathData;
use crate::tree::{NodeId, SvgTree};

/// Strategy for turning circles and ellipses into path data. All three
/// produce geometrically closed outlines; they differ in command vocabulary
/// and therefore in how many markers end up on the ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CircleAlgorithm {
    #[default]
    TwoArcs,
    CubicBezier,
    QuadBezier,
}

/// Configuration accepted by the normalization entry point.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub circle_algorithm: CircleAlgorithm,
    /// Segment count for [`CircleAlgorithm::QuadBezier`]; ignored otherwise.
    pub circle_segments: u32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            circle_algorithm: CircleAlgorithm::TwoArcs,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
        }
    }
}

/// Cubic-Bezier circle constant, 4(sqrt(2)-1)/3.
const KAPPA: f64 = 4.0 * (std::f64::consts::SQRT_2 - 1.0) / 3.0;

pub fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64, options: &Options) -> PathData {
    match options.circle_algorithm {
        CircleAlgorithm::TwoArcs => two_arcs_ellipse(cx, cy, rx, ry),
        CircleAlgorithm::CubicBezier => cubic_ellipse(cx, cy, rx, ry),
        CircleAlgorithm::QuadBezier => quad_ellipse(cx, cy, rx, ry, options.circle_segments.max(1)),
    }
}

fn two_arcs_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
    let arc = |x: f64| PathSegment::EllipticalArc {
        abs: true,
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: true,
        sweep: false,
        x,
        y: cy,
    };
    PathData {
        segments: vec![
            PathSegment::MoveTo {
                abs: true,
                x: cx - rx,
                y: cy,
            },
            arc(cx + rx),
            arc(cx - rx),
        ],
    }
}

fn cubic_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
    let kx = KAPPA * rx;
    let ky = KAPPA * ry;
    let curve = |x1, y1, x2, y2, x, y| PathSegment::CurveTo {
        abs: true,
        x1,
        y1,
        x2,
        y2,
        x,
        y,
    };
    PathData {
        segments: vec![
            PathSegment::MoveTo {
                abs: true,
                x: cx - rx,
                y: cy,
            },
            curve(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry),
            curve(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy),
            curve(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry),
            curve(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy),
        ],
    }
}

/// N equal-angle quadratic segments. The control point sits on the tangent
/// at each anchor, offset by tan(angle/2), so every segment passes exactly
/// through its two endpoint anchors on the ellipse.
fn quad_ellipse(cx: f64, cy: f64, rx: f64, ry: f64, segments: u32) -> PathData {
    let angle = 2.0 * PI / f64::from(segments);
    let spread = (angle / 2.0).tan();
    let mut path = PathData {
        segments: vec![PathSegment::MoveTo {
            abs: true,
            x: cx + rx,
            y: cy,
        }],
    };
    for i in 1..=segments {
        let theta = f64::from(i) * angle;
        let ax = rx * theta.cos();
        let ay = ry * theta.sin();
        let cpx = ax + rx * spread * (theta - PI / 2.0).cos();
        let cpy = ay + ry * spread * (theta - PI / 2.0).sin();
        path.segments.push(PathSegment::Quadratic {
            abs: true,
            x1: cpx + cx,
            y1: cpy + cy,
            x: ax + cx,
            y: ay + cy,
        });
    }
    path
}

fn rect_path(x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64) -> PathData {
    if rx == 0.0 || ry == 0.0 {
        return PathData {
            segments: vec![
                PathSegment::MoveTo { abs: true, x, y },
                PathSegment::HorizontalLineTo { abs: false, x: width },
                PathSegment::VerticalLineTo {
                    abs: false,
                    y: height,
                },
                PathSegment::HorizontalLineTo {
                    abs: false,
                    x: -width,
                },
                PathSegment::ClosePath { abs: false },
            ],
        };
    }
    // 8-segment rounded outline: four corner arcs joined by straight runs
    let corner = |x: f64, y: f64| PathSegment::EllipticalArc {
        abs: false,
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: false,
        sweep: true,
        x,
        y,
    };
    PathData {
        segments: vec![
            PathSegment::MoveTo {
                abs: true,
                x,
                y: y + ry,
            },
            corner(rx, -ry),
            PathSegment::HorizontalLineTo {
                abs: false,
                x: width - rx - rx,
            },
            corner(rx, ry),
            PathSegment::VerticalLineTo {
                abs: false,
                y: height - ry - ry,
            },
            corner(-rx, ry),
            PathSegment::HorizontalLineTo {
                abs: false,
                x: rx + rx - width,
            },
            corner(-rx, -ry),
            PathSegment::ClosePath { abs: false },
        ],
    }
}

fn line_path(x1: f64, y1: f64, x2: f64, y2: f64) -> PathData {
    PathData {
        segments: vec![
            PathSegment::MoveTo {
                abs: true,
                x: x1,
                y: y1,
            },
            PathSegment::LineTo {
                abs: true,
                x: x2,
                y: y2,
            },
        ],
    }
}

fn poly_path(points: &str, close: bool) -> PathData {
    let mut segments = Vec::new();
    for (i, (x, y)) in PointsParser::from(points).enumerate() {
        segments.push(if i == 0 {
            PathSegment::MoveTo { abs: true, x, y }
        } else {
            PathSegment::LineTo { abs: true, x, y }
        });
    }
    if close && !segments.is_empty() {
        segments.push(PathSegment::ClosePath { abs: false });
    }
    PathData { segments }
}

fn num_attr(tree: &SvgTree, id: NodeId, name: &str) -> f64 {
    tree.attr(id, name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Replace every shape primitive in the tree with an equivalent `path`
/// element. The replacement keeps all attributes except the shape-specific
/// geometry ones.
pub fn convert_shapes(tree: &mut SvgTree, options: &Options) {
    for node in tree.descendants(tree.root()) {
        let (path, removed): (PathData, &[&str]) = match tree.tag(node) {
            "rect" => {
                let width = num_attr(tree, node, "width");
                let height = num_attr(tree, node, "height");
                let ax = num_attr(tree, node, "rx");
                let ay = num_attr(tree, node, "ry");
                // a missing radius defaults to the other one
                let rx = (if ax != 0.0 { ax } else { ay }).min(width / 2.0);
                let ry = (if ay != 0.0 { ay } else { ax }).min(height / 2.0);
                (
                    rect_path(
                        num_attr(tree, node, "x"),
                        num_attr(tree, node, "y"),
                        width,
                        height,
                        rx,
                        ry,
                    ),
                    &["x", "y", "width", "height", "rx", "ry"],
                )
            }
            "circle" => {
                let r = num_attr(tree, node, "r");
                (
                    ellipse_path(
                        num_attr(tree, node, "cx"),
                        num_attr(tree, node, "cy"),
                        r,
                        r,
                        options,
                    ),
                    &["cx", "cy", "r"],
                )
            }
            "ellipse" => (
                ellipse_path(
                    num_attr(tree, node, "cx"),
                    num_attr(tree, node, "cy"),
                    num_attr(tree, node, "rx"),
                    num_attr(tree, node, "ry"),
                    options,
                ),
                &["cx", "cy", "rx", "ry"],
            ),
            "line" => (
                line_path(
                    num_attr(tree, node, "x1"),
                    num_attr(tree, node, "y1"),
                    num_attr(tree, node, "x2"),
                    num_attr(tree, node, "y2"),
                ),
                &["x1", "y1", "x2", "y2"],
            ),
            "polyline" | "polygon" => (
                poly_path(
                    tree.attr(node, "points").unwrap_or(""),
                    tree.tag(node) == "polygon",
                ),
                &["points"],
            ),
            _ => continue,
        };

        let replacement = tree.new_node("path");
        for (name, value) in tree.attrs(node).to_vec() {
            if !removed.contains(&name.as_str()) {
                tree.set_attr(replacement, &name, &value);
            }
        }
        tree.set_attr(replacement, "d", &path.to_string());
        tree.replace(node, replacement);
    }
}
