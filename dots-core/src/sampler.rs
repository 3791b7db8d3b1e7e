use svgtypes::PathSegment;

use crate::path::PathData;

/// Endpoint of a drawing command, tagged with the index of the command that
/// produced it. Consumed immediately by marker placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub command: usize,
}

/// Walk the commands in drawing order and emit one sample per command. The
/// initial MoveTo draws nothing and gets no sample, but it still seeds the
/// cursor for the relative math that follows. ClosePath snaps the cursor
/// back to the subpath start and is sampled there, so the implicit closing
/// edge can carry a marker.
pub fn sample(path: &PathData) -> Vec<SamplePoint> {
    let mut samples = Vec::new();
    let (mut cx, mut cy) = (0.0, 0.0);
    let (mut sx, mut sy) = (0.0, 0.0);
    for (i, seg) in path.segments.iter().enumerate() {
        match *seg {
            PathSegment::MoveTo { abs, x, y } => {
                (cx, cy) = if abs { (x, y) } else { (cx + x, cy + y) };
                (sx, sy) = (cx, cy);
                if i == 0 {
                    continue;
                }
            }
            PathSegment::LineTo { abs, x, y }
            | PathSegment::SmoothQuadratic { abs, x, y } => {
                (cx, cy) = if abs { (x, y) } else { (cx + x, cy + y) };
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                cx = if abs { x } else { cx + x };
            }
            PathSegment::VerticalLineTo { abs, y } => {
                cy = if abs { y } else { cy + y };
            }
            PathSegment::CurveTo { abs, x, y, .. }
            | PathSegment::SmoothCurveTo { abs, x, y, .. }
            | PathSegment::Quadratic { abs, x, y, .. }
            | PathSegment::EllipticalArc { abs, x, y, .. } => {
                (cx, cy) = if abs { (x, y) } else { (cx + x, cy + y) };
            }
            PathSegment::ClosePath { .. } => {
                (cx, cy) = (sx, sy);
            }
        }
        samples.push(SamplePoint {
            x: cx,
            y: cy,
            command: i,
        });
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_move_is_not_sampled() {
        let path = PathData::parse("M 1 2 L 3 4 L 5 6").unwrap();
        let samples = sample(&path);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].command, 1);
        assert_eq!((samples[0].x, samples[0].y), (3.0, 4.0));
    }

    #[test]
    fn relative_commands_accumulate() {
        let path = PathData::parse("m 10 10 l 5 0 v 5 h -5").unwrap();
        let samples = sample(&path);
        let coords: Vec<_> = samples.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(coords, vec![(15.0, 10.0), (15.0, 15.0), (10.0, 15.0)]);
    }

    #[test]
    fn close_path_lands_on_subpath_start() {
        let path = PathData::parse("M 10 20 L 30 20 L 30 40 Z").unwrap();
        let samples = sample(&path);
        let last = samples.last().unwrap();
        assert_eq!((last.x, last.y), (10.0, 20.0));
        assert_eq!(last.command, 3);
    }

    #[test]
    fn second_subpath_move_is_sampled() {
        let path = PathData::parse("M 0 0 L 10 0 M 20 20 L 30 20").unwrap();
        let samples = sample(&path);
        assert_eq!(samples.len(), 3);
        assert_eq!((samples[1].x, samples[1].y), (20.0, 20.0));
    }

    #[test]
    fn curve_samples_use_endpoints_only() {
        let path = PathData::parse("M 0 0 C 1 1 2 2 3 3 Q 4 4 5 5 A 1 1 0 0 1 6 6").unwrap();
        let coords: Vec<_> = sample(&path).iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(coords, vec![(3.0, 3.0), (5.0, 5.0), (6.0, 6.0)]);
    }
}
