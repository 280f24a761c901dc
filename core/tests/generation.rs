use jigsaw_core::{
    build_boundary, build_cut_preview, generate_cuts, generate_puzzle_pieces, BoardGeometry,
    Difficulty, Outline, PieceSide, Point, PuzzleError,
};

fn cut_of(side: &PieceSide) -> jigsaw_core::SegmentParams {
    match side {
        PieceSide::Cut(params) => *params,
        PieceSide::Flat => panic!("expected a tabbed side"),
    }
}

/// Flattens the cubic run `commands[range]` that starts at `start`.
fn side_polyline(outline: &Outline, start: Point, range: std::ops::Range<usize>) -> Vec<Point> {
    let mut side = Outline::new();
    side.move_to(start);
    for command in &outline.commands()[range] {
        side.push(*command);
    }
    side.flatten(16)
}

fn assert_same_polyline(a: &[Point], b: &[Point]) {
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(b.iter()) {
        assert!(
            (p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9,
            "{p:?} != {q:?}"
        );
    }
}

#[test]
fn seed_12345_two_by_two_is_stable() {
    let difficulty = Difficulty::new(2, 2);
    let first = generate_puzzle_pieces(&difficulty, 12345).expect("pieces");
    let second = generate_puzzle_pieces(&difficulty, 12345).expect("pieces");
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    let right = cut_of(&first[0].right);
    let left = cut_of(&first[1].left);
    assert!(left.is_mirror_of(&right));
    let bottom = cut_of(&first[0].bottom);
    let top = cut_of(&first[2].top);
    assert!(top.is_mirror_of(&bottom));

    let other = generate_puzzle_pieces(&difficulty, 12346).expect("pieces");
    assert_ne!(first, other);
}

#[test]
fn every_cell_appears_once() {
    let difficulty = Difficulty::new(4, 6);
    let pieces = generate_puzzle_pieces(&difficulty, 3).expect("pieces");
    assert_eq!(pieces.len(), 24);
    for (idx, piece) in pieces.iter().enumerate() {
        assert_eq!(piece.id, idx);
        assert_eq!(piece.row as usize, idx / 6);
        assert_eq!(piece.col as usize, idx % 6);
        assert_eq!(piece.group_id, idx);
        assert!(!piece.is_locked);
    }
}

#[test]
fn single_piece_puzzle_is_all_flat() {
    let pieces = generate_puzzle_pieces(&Difficulty::new(1, 1), 99).expect("pieces");
    assert_eq!(pieces.len(), 1);
    let piece = &pieces[0];
    assert!(piece.top.is_flat() && piece.right.is_flat());
    assert!(piece.bottom.is_flat() && piece.left.is_flat());
}

#[test]
fn empty_grid_is_rejected() {
    let err = generate_cuts(&Difficulty::new(0, 3), 1).unwrap_err();
    assert!(matches!(err, PuzzleError::InvalidDifficulty { rows: 0, cols: 3 }));
    assert!(generate_puzzle_pieces(&Difficulty::new(2, 0), 1).is_err());
}

#[test]
fn neighbouring_outlines_share_the_vertical_cut() {
    let difficulty = Difficulty::new(2, 2);
    let mut pieces = generate_puzzle_pieces(&difficulty, 12345).expect("pieces");
    pieces[1].x = 100.0;

    let left = build_boundary(&pieces[0], 100.0, 100.0);
    let right = build_boundary(&pieces[1], 100.0, 100.0);
    // Piece 0: move, top line, right cubics 2..5. Piece 1: move, top line,
    // right line, bottom cubics 3..6, left cubics 6..9.
    let mut from_left = side_polyline(&left, Point::new(100.0, 0.0), 2..5);
    let from_right = side_polyline(&right, Point::new(100.0, 100.0), 6..9);
    from_left.reverse();
    assert_same_polyline(&from_left, &from_right);
}

#[test]
fn neighbouring_outlines_share_the_horizontal_cut() {
    let difficulty = Difficulty::new(2, 2);
    let mut pieces = generate_puzzle_pieces(&difficulty, 12345).expect("pieces");
    pieces[2].y = 100.0;

    let upper = build_boundary(&pieces[0], 100.0, 100.0);
    let lower = build_boundary(&pieces[2], 100.0, 100.0);
    // Piece 0 bottom cubics 5..8 run right to left; piece 2 top cubics 1..4
    // run left to right.
    let mut from_upper = side_polyline(&upper, Point::new(100.0, 100.0), 5..8);
    let from_lower = side_polyline(&lower, Point::new(0.0, 100.0), 1..4);
    from_upper.reverse();
    assert_same_polyline(&from_upper, &from_lower);
}

#[test]
fn preview_matches_piece_outlines() {
    let difficulty = Difficulty::new(2, 2);
    let board = BoardGeometry::new(0.0, 0.0, 200.0, 200.0);
    let cuts = generate_cuts(&difficulty, 12345).expect("cuts");
    let preview = build_cut_preview(&cuts, &difficulty, &board);
    assert_eq!(preview.len(), cuts.cut_count());
    assert!(preview.iter().all(|line| !line.is_closed()));

    let pieces = generate_puzzle_pieces(&difficulty, 12345).expect("pieces");
    let lower = build_boundary(&pieces[2], 100.0, 100.0);
    let mut expected = pieces[2].clone();
    expected.y = 100.0;
    let lower_at_final = build_boundary(&expected, 100.0, 100.0);
    assert_ne!(lower, lower_at_final);

    // First horizontal preview line is the top of piece 2 at its final spot.
    let from_piece = side_polyline(&lower_at_final, Point::new(0.0, 100.0), 1..4);
    assert_same_polyline(&preview[0].flatten(16), &from_piece);
}

#[test]
fn outline_contains_its_center_but_not_far_points() {
    let difficulty = Difficulty::new(3, 3);
    let mut pieces = generate_puzzle_pieces(&difficulty, 2024).expect("pieces");
    let center = &mut pieces[4];
    center.x = 300.0;
    center.y = 300.0;
    let outline = build_boundary(center, 100.0, 100.0);
    assert!(outline.is_closed());
    assert_eq!(outline.cubic_count(), 12);
    assert!(outline.contains(Point::new(350.0, 350.0)));
    assert!(!outline.contains(Point::new(200.0, 200.0)));
    assert!(!outline.contains(Point::new(350.0, 500.0)));

    let bounds = outline.bounds().expect("bounds");
    assert!(bounds.contains(Point::new(350.0, 350.0)));
    assert!(bounds.min_x > 250.0 && bounds.max_x < 450.0);
    assert!(outline.to_svg_path().starts_with("M 300.000 300.000 C "));
}
