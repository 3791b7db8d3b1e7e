use log::debug;

use crate::consts::{FONT_SIZE_DIVISOR, SKIP_FACTOR};
use crate::markers::{MarkerPlacer, MarkerRecord, Rect};
use crate::normalize;
use crate::path::PathData;
use crate::sampler;
use crate::shapes::Options;
use crate::tree::{NodeId, SvgTree};
use crate::{Error, sampler::SamplePoint};

/// Outcome of a marker click, for the caller to map onto sounds and DOM
/// updates. Path indices refer to [`Puzzle::paths`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// Clicked out of order; nothing changed.
    MarkerRejected,
    /// Correct click, more markers remain on this path.
    SegmentRevealed { path: usize },
    /// The path's last marker was hit and the next path became active.
    PathCompleted { path: usize, next: usize },
    /// The final path finished; no further input is accepted.
    PuzzleCompleted { path: usize },
}

/// The rectangular coordinate window mapped onto the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ViewBox {
    fn parse(value: &str) -> Option<ViewBox> {
        let mut nums = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse::<f64>);
        let vb = ViewBox {
            x: nums.next()?.ok()?,
            y: nums.next()?.ok()?,
            w: nums.next()?.ok()?,
            h: nums.next()?.ok()?,
        };
        Some(vb)
    }

    fn to_attr(self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

/// One playable path: its normalized command sequence, the markers strung
/// along it, and how much of it has been revealed so far.
#[derive(Clone, Debug)]
pub struct PuzzlePath {
    pub node: NodeId,
    pub data: PathData,
    pub markers: Vec<MarkerRecord>,
    pub revealed_commands: usize,
}

/// A built puzzle instance. Constructed fresh per icon; all progress state
/// lives here rather than in globals so a new puzzle simply replaces the
/// value.
#[derive(Debug)]
pub struct Puzzle {
    pub tree: SvgTree,
    pub paths: Vec<PuzzlePath>,
    pub view_box: ViewBox,
    pub font_size: f64,
    next_label: u32,
    active_path: usize,
}

impl Puzzle {
    /// Run the whole pipeline: parse, normalize into path-only form, sample
    /// the geometry, and lay the numbered markers. Fails on malformed XML
    /// or path data; a bad icon is rejected wholesale.
    pub fn build(svg_text: &str, options: &Options) -> Result<Puzzle, Error> {
        let mut tree = SvgTree::parse(svg_text)?;
        normalize::normalize(&mut tree, options)?;

        let view_box = document_view_box(&tree);
        let font_size = view_box.w / FONT_SIZE_DIVISOR;
        let mut placer = MarkerPlacer::new(font_size, view_box.h * SKIP_FACTOR);

        let mut paths = Vec::new();
        for node in tree.descendants(tree.root()) {
            if tree.tag(node) != "path" {
                continue;
            }
            let data = PathData::parse(tree.attr(node, "d").unwrap_or(""))?;
            let samples = sampler::sample(&data);
            let markers = placer.place_path(paths.len(), &samples);
            if markers.is_empty() {
                // nothing clickable, nothing to reveal
                debug!("dropping path without markers ({} commands)", data.len());
                continue;
            }
            paths.push(PuzzlePath {
                node,
                data,
                markers,
                revealed_commands: 0,
            });
        }

        let view_box = grow_view_box(view_box, placer.bounds());
        tree.set_attr(tree.root(), "viewBox", &view_box.to_attr());

        Ok(Puzzle {
            tree,
            paths,
            view_box,
            font_size,
            next_label: 1,
            active_path: 0,
        })
    }

    pub fn next_label(&self) -> u32 {
        self.next_label
    }

    /// Index of the path whose markers are currently clickable.
    pub fn active_path(&self) -> usize {
        self.active_path
    }

    pub fn is_complete(&self) -> bool {
        self.active_path >= self.paths.len()
    }

    /// Validate a marker click against the expected sequence and advance
    /// the reveal state. Wrong labels are game feedback, not errors.
    pub fn click(&mut self, label: u32) -> GameEvent {
        if self.is_complete() || label != self.next_label {
            return GameEvent::MarkerRejected;
        }
        let index = self.active_path;
        let Some(position) = self.paths[index]
            .markers
            .iter()
            .position(|m| m.label == label)
        else {
            return GameEvent::MarkerRejected;
        };

        self.next_label += 1;
        let path = &mut self.paths[index];
        path.revealed_commands = path.markers[position].command + 1;

        if position + 1 < path.markers.len() {
            return GameEvent::SegmentRevealed { path: index };
        }
        // last marker of this path: reveal it fully and move on
        path.revealed_commands = path.data.len();
        self.active_path += 1;
        if self.active_path < self.paths.len() {
            GameEvent::PathCompleted {
                path: index,
                next: self.active_path,
            }
        } else {
            GameEvent::PuzzleCompleted { path: index }
        }
    }

    /// The currently revealed prefix of a path, for incremental redraw.
    /// Always a valid, independently renderable path; `None` for an index
    /// with no path behind it.
    pub fn revealed_data(&self, path: usize) -> Option<PathData> {
        let p = self.paths.get(path)?;
        Some(p.data.slice(p.revealed_commands))
    }
}

/// Document viewBox, falling back to the root width/height lengths and
/// finally to the bounds of the sampled geometry.
fn document_view_box(tree: &SvgTree) -> ViewBox {
    let root = tree.root();
    if let Some(vb) = tree.attr(root, "viewBox").and_then(ViewBox::parse) {
        return vb;
    }
    let w = tree.attr(root, "width").and_then(parse_length);
    let h = tree.attr(root, "height").and_then(parse_length);
    if let (Some(w), Some(h)) = (w, h) {
        return ViewBox { x: 0.0, y: 0.0, w, h };
    }
    geometry_view_box(tree).unwrap_or_default()
}

fn geometry_view_box(tree: &SvgTree) -> Option<ViewBox> {
    let mut bounds: Option<Rect> = None;
    for node in tree.descendants(tree.root()) {
        if tree.tag(node) != "path" {
            continue;
        }
        let Ok(data) = PathData::parse(tree.attr(node, "d").unwrap_or("")) else {
            continue;
        };
        for SamplePoint { x, y, .. } in sampler::sample(&data) {
            let r = Rect {
                left: x,
                top: y,
                right: x,
                bottom: y,
            };
            bounds = Some(bounds.map_or(r, |b| b.union(&r)));
        }
    }
    bounds.map(|b| ViewBox {
        x: b.left,
        y: b.top,
        w: b.width().max(1.0),
        h: (b.bottom - b.top).max(1.0),
    })
}

/// CSS length to pixels; untagged numbers pass through.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| c.is_ascii_alphabetic()) {
        Some(split) => value.split_at(split),
        None => (value, ""),
    };
    let x: f64 = number.trim().parse().ok()?;
    let px = match unit {
        "cm" => x * 96.0 / 2.54,
        "mm" => x * 96.0 / 25.4,
        "in" => x * 96.0,
        "pc" => x * 16.0,
        "pt" => x * 96.0 / 72.0,
        "" | "px" => x,
        _ => return None,
    };
    Some(px)
}

/// Final viewBox: the original window grown to cover every marker label,
/// snapped outward to integer bounds.
fn grow_view_box(vb: ViewBox, markers: Option<Rect>) -> ViewBox {
    let doc = Rect {
        left: vb.x,
        top: vb.y,
        right: vb.x + vb.w,
        bottom: vb.y + vb.h,
    };
    let total = match markers {
        Some(m) => doc.union(&m),
        None => doc,
    };
    let left = total.left.floor();
    let top = total.top.floor();
    ViewBox {
        x: left,
        y: top,
        w: total.right.ceil() - left,
        h: total.bottom.ceil() - top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_parses_commas_and_spaces() {
        assert_eq!(
            ViewBox::parse("0, 0 24,24"),
            Some(ViewBox {
                x: 0.0,
                y: 0.0,
                w: 24.0,
                h: 24.0
            })
        );
        assert_eq!(ViewBox::parse("0 0 24"), None);
    }

    #[test]
    fn lengths_convert_to_pixels() {
        assert_eq!(parse_length("96"), Some(96.0));
        assert_eq!(parse_length("96px"), Some(96.0));
        assert_eq!(parse_length("1in"), Some(96.0));
        assert_eq!(parse_length("72pt"), Some(96.0));
        assert_eq!(parse_length("2.54cm"), Some(96.0));
        assert_eq!(parse_length("bogus"), None);
    }

    #[test]
    fn grow_view_box_unions_and_snaps() {
        let vb = ViewBox {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let grown = grow_view_box(
            vb,
            Some(Rect {
                left: -1.2,
                top: 2.0,
                right: 12.7,
                bottom: 9.0,
            }),
        );
        assert_eq!(
            grown,
            ViewBox {
                x: -2.0,
                y: 0.0,
                w: 15.0,
                h: 10.0
            }
        );
    }

    #[test]
    fn labels_are_contiguous_across_paths() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <path d="M 0 0 L 50 0 L 50 50"/>
            <path d="M 0 80 L 50 80"/>
        </svg>"#;
        let puzzle = Puzzle::build(svg, &Options::default()).unwrap();
        let labels: Vec<u32> = puzzle
            .paths
            .iter()
            .flat_map(|p| p.markers.iter().map(|m| m.label))
            .collect();
        let expected: Vec<u32> = (1..=labels.len() as u32).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn paths_without_markers_are_dropped() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <path d="M 5 5"/>
            <path d="M 0 0 L 50 0"/>
        </svg>"#;
        let puzzle = Puzzle::build(svg, &Options::default()).unwrap();
        assert_eq!(puzzle.paths.len(), 1);
    }

    #[test]
    fn malformed_path_rejects_the_icon() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
            <path d="M 1"/>
        </svg>"#;
        assert!(Puzzle::build(svg, &Options::default()).is_err());
    }
}
