use dots_core::{GameEvent, Options, Puzzle};

const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
    <path d="M 0 0 L 30 0 L 30 30 L 0 30 Z"/>
</svg>"#;

const TWO_STROKES: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
    <path d="M 0 0 L 30 0 L 30 30 L 0 30 Z"/>
    <path d="M 50 50 L 90 50"/>
</svg>"#;

#[test]
fn square_plays_through_in_order() {
    let mut puzzle = Puzzle::build(SQUARE, &Options::default()).unwrap();
    assert_eq!(puzzle.paths.len(), 1);
    assert_eq!(puzzle.paths[0].markers.len(), 4);

    assert_eq!(puzzle.click(1), GameEvent::SegmentRevealed { path: 0 });
    assert_eq!(puzzle.click(2), GameEvent::SegmentRevealed { path: 0 });
    assert_eq!(puzzle.click(3), GameEvent::SegmentRevealed { path: 0 });
    assert_eq!(puzzle.click(4), GameEvent::PuzzleCompleted { path: 0 });
    assert!(puzzle.is_complete());
}

#[test]
fn out_of_order_clicks_are_rejected_without_state_change() {
    let mut puzzle = Puzzle::build(SQUARE, &Options::default()).unwrap();
    assert_eq!(puzzle.click(2), GameEvent::MarkerRejected);
    assert_eq!(puzzle.click(99), GameEvent::MarkerRejected);
    assert_eq!(puzzle.next_label(), 1);
    assert_eq!(puzzle.paths[0].revealed_commands, 0);

    // the correct click still works afterwards
    assert_eq!(puzzle.click(1), GameEvent::SegmentRevealed { path: 0 });
}

#[test]
fn revealed_prefix_grows_with_each_click() {
    let mut puzzle = Puzzle::build(SQUARE, &Options::default()).unwrap();
    assert!(puzzle.revealed_data(0).unwrap().is_empty());
    assert!(puzzle.revealed_data(99).is_none());

    puzzle.click(1);
    let partial = puzzle.revealed_data(0).unwrap();
    assert_eq!(partial.len(), puzzle.paths[0].markers[0].command + 1);
    assert!(partial.to_string().starts_with("M 0 0"));

    puzzle.click(2);
    puzzle.click(3);
    puzzle.click(4);
    assert_eq!(
        puzzle.revealed_data(0).unwrap().len(),
        puzzle.paths[0].data.len()
    );
}

#[test]
fn finishing_a_path_activates_the_next() {
    let mut puzzle = Puzzle::build(TWO_STROKES, &Options::default()).unwrap();
    assert_eq!(puzzle.paths.len(), 2);
    assert_eq!(puzzle.active_path(), 0);

    // the second path's marker is not playable yet
    assert_eq!(puzzle.click(5), GameEvent::MarkerRejected);

    puzzle.click(1);
    puzzle.click(2);
    puzzle.click(3);
    assert_eq!(
        puzzle.click(4),
        GameEvent::PathCompleted { path: 0, next: 1 }
    );
    assert_eq!(puzzle.active_path(), 1);
    assert_eq!(puzzle.click(5), GameEvent::PuzzleCompleted { path: 1 });
}

#[test]
fn clicks_after_completion_do_nothing() {
    let mut puzzle = Puzzle::build(TWO_STROKES, &Options::default()).unwrap();
    for label in 1..=5 {
        puzzle.click(label);
    }
    assert!(puzzle.is_complete());
    assert_eq!(puzzle.click(6), GameEvent::MarkerRejected);
    assert_eq!(puzzle.click(1), GameEvent::MarkerRejected);
}

#[test]
fn markers_do_not_overlap() {
    let puzzle = Puzzle::build(TWO_STROKES, &Options::default()).unwrap();
    let rects: Vec<_> = puzzle
        .paths
        .iter()
        .flat_map(|p| p.markers.iter().map(|m| m.rect))
        .collect();
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} intersects {b:?}");
        }
    }
}

#[test]
fn shapes_play_like_paths() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <rect x="10" y="10" width="40" height="40"/>
    </svg>"#;
    let mut puzzle = Puzzle::build(svg, &Options::default()).unwrap();
    assert_eq!(puzzle.paths.len(), 1);
    let total = puzzle.paths[0].markers.len() as u32;
    assert!(total >= 4);
    for label in 1..total {
        assert_eq!(puzzle.click(label), GameEvent::SegmentRevealed { path: 0 });
    }
    assert_eq!(puzzle.click(total), GameEvent::PuzzleCompleted { path: 0 });
}

#[test]
fn final_view_box_covers_every_marker() {
    let puzzle = Puzzle::build(SQUARE, &Options::default()).unwrap();
    let vb = puzzle.view_box;
    for path in &puzzle.paths {
        for marker in &path.markers {
            assert!(marker.rect.left >= vb.x);
            assert!(marker.rect.top >= vb.y);
            assert!(marker.rect.right <= vb.x + vb.w);
            assert!(marker.rect.bottom <= vb.y + vb.h);
        }
    }
}
