use crate::consts::{LABEL_MARGIN, SEARCH_RADIUS};
use crate::sampler::SamplePoint;

/// Axis-aligned label bounds in viewBox units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Open-interval intersection test: rectangles that merely share an
    /// edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right <= other.left
            || self.left >= other.right
            || self.bottom <= other.top
            || self.top >= other.bottom)
    }

    pub fn shifted(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width() / 2.0
    }
}

/// A placed, numbered marker. Labels run 1..N across the whole puzzle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerRecord {
    pub label: u32,
    pub rect: Rect,
    pub path_index: usize,
    pub command: usize,
}

/// Chooses which sample points earn a marker and where each label rectangle
/// sits. One placer instance spans the whole puzzle so collision checks and
/// numbering cross path boundaries.
pub struct MarkerPlacer {
    // offsets grouped by Manhattan distance, nearest ring first
    offsets: Vec<Vec<(i32, i32)>>,
    placed: Vec<Rect>,
    font_size: f64,
    skip_threshold: f64,
    next_label: u32,
}

impl MarkerPlacer {
    pub fn new(font_size: f64, skip_threshold: f64) -> Self {
        MarkerPlacer {
            offsets: access_list(SEARCH_RADIUS),
            placed: Vec::new(),
            font_size,
            skip_threshold,
            next_label: 1,
        }
    }

    /// Lay markers along one path's samples in order. A sample is accepted
    /// only when it has moved further than the skip threshold from the
    /// previously accepted one; the first sample of every path is always
    /// accepted.
    pub fn place_path(&mut self, path_index: usize, samples: &[SamplePoint]) -> Vec<MarkerRecord> {
        let mut records = Vec::new();
        let (mut px, mut py) = (f64::INFINITY, f64::INFINITY);
        for s in samples {
            // strict: the sample must move further than the threshold, so
            // even at a threshold of zero coincident repeats collapse
            if (s.x - px).hypot(s.y - py) <= self.skip_threshold {
                continue;
            }
            let rect = self.resolve(self.label_rect(s));
            self.placed.push(rect);
            records.push(MarkerRecord {
                label: self.next_label,
                rect,
                path_index,
                command: s.command,
            });
            self.next_label += 1;
            (px, py) = (s.x, s.y);
        }
        records
    }

    /// Label width grows with the digit count so "12" reserves more room
    /// than "3". The rectangle hangs below the sample point: top edge at
    /// the sample's y, one font size tall.
    fn label_rect(&self, s: &SamplePoint) -> Rect {
        let digits = self.next_label.checked_ilog10().unwrap_or(0) + 1;
        let w = (f64::from(digits) / 2.0 + LABEL_MARGIN) * self.font_size;
        Rect {
            left: s.x - w / 2.0,
            top: s.y,
            right: s.x + w / 2.0,
            bottom: s.y + self.font_size,
        }
    }

    /// Spiral collision search: try offsets ring by ring in increasing
    /// Manhattan distance, scaled to half the label's extent per step. When
    /// the whole radius is exhausted the furthest candidate is kept anyway;
    /// collision freedom is best-effort.
    fn resolve(&self, rect: Rect) -> Rect {
        let step_x = rect.width() / 2.0;
        let step_y = self.font_size / 2.0;
        let mut candidate = rect;
        for ring in &self.offsets {
            for &(dx, dy) in ring {
                candidate = rect.shifted(f64::from(dx) * step_x, f64::from(dy) * step_y);
                if !self.placed.iter().any(|r| r.overlaps(&candidate)) {
                    return candidate;
                }
            }
        }
        candidate
    }

    /// Union of every placed rectangle, for growing the viewBox.
    pub fn bounds(&self) -> Option<Rect> {
        self.placed
            .iter()
            .copied()
            .reduce(|acc, r| acc.union(&r))
    }
}

fn access_list(n: i32) -> Vec<Vec<(i32, i32)>> {
    let mut list = vec![Vec::new(); (n * 2 + 1) as usize];
    for x in -n..=n {
        for y in -n..=n {
            list[(x.abs() + y.abs()) as usize].push((x, y));
        }
    }
    list
}
