use std::fmt::Write;

use crate::cuts::{CutField, SegmentParams};
use crate::grid::{BoardGeometry, Difficulty, Point};
use crate::piece::{PieceSide, PuzzlePiece};

pub const TAB_SHAPE: f64 = 0.60;
pub const TAB_DEPTH: f64 = 0.60;
pub const FLATTEN_STEPS: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    commands: Vec<PathCommand>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    pub fn move_to(&mut self, to: Point) {
        self.commands.push(PathCommand::MoveTo(to));
    }

    pub fn line_to(&mut self, to: Point) {
        self.commands.push(PathCommand::LineTo(to));
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.commands.push(PathCommand::CubicTo { c1, c2, to });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close))
    }

    pub fn cubic_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, PathCommand::CubicTo { .. }))
            .count()
    }

    /// Polyline approximation of the outline, curves sampled at `steps`
    /// points each.
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut points = Vec::new();
        let mut current = Point::default();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(to) | PathCommand::LineTo(to) => {
                    points.push(to);
                    current = to;
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    for step in 1..=steps {
                        let t = step as f64 / steps as f64;
                        points.push(cubic_point(current, c1, c2, to, t));
                    }
                    current = to;
                }
                PathCommand::Close => {}
            }
        }
        points
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let points = self.flatten(FLATTEN_STEPS);
        let first = points.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in &points[1..] {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.max_y = bounds.max_y.max(point.y);
        }
        Some(bounds)
    }

    /// Non-zero winding containment against the flattened outline.
    pub fn contains(&self, point: Point) -> bool {
        let polygon = self.flatten(FLATTEN_STEPS);
        if polygon.len() < 3 {
            return false;
        }
        let mut winding = 0i32;
        for (idx, a) in polygon.iter().enumerate() {
            let b = polygon[(idx + 1) % polygon.len()];
            let side = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);
            if a.y <= point.y {
                if b.y > point.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= point.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding != 0
    }

    pub fn to_svg_path(&self) -> String {
        let mut path = String::new();
        for command in &self.commands {
            if !path.is_empty() {
                path.push(' ');
            }
            let _ = match *command {
                PathCommand::MoveTo(p) => write!(path, "M {} {}", fmt_coord(p.x), fmt_coord(p.y)),
                PathCommand::LineTo(p) => write!(path, "L {} {}", fmt_coord(p.x), fmt_coord(p.y)),
                PathCommand::CubicTo { c1, c2, to } => write!(
                    path,
                    "C {} {} {} {} {} {}",
                    fmt_coord(c1.x),
                    fmt_coord(c1.y),
                    fmt_coord(c2.x),
                    fmt_coord(c2.y),
                    fmt_coord(to.x),
                    fmt_coord(to.y)
                ),
                PathCommand::Close => write!(path, "Z"),
            };
        }
        path
    }
}

pub fn fmt_coord(value: f64) -> String {
    format!("{:.3}", value)
}

pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let tt = t * t;
    let uu = u * u;
    let uuu = uu * u;
    let ttt = tt * t;
    Point::new(
        uuu * p0.x + 3.0 * uu * t * p1.x + 3.0 * u * tt * p2.x + ttt * p3.x,
        uuu * p0.y + 3.0 * uu * t * p1.y + 3.0 * u * tt * p2.y + ttt * p3.y,
    )
}

/// The ten control positions of a tabbed cut from `p1` to `p2`, in board
/// space. Index 0 is `p1` and index 9 is `p2`.
pub fn cut_control_points(
    p1: Point,
    p2: Point,
    params: &SegmentParams,
    piece_width: f64,
    piece_height: f64,
) -> [Point; 10] {
    let tab_shape = TAB_SHAPE * 2.0;
    let t = TAB_DEPTH * 0.2;
    let SegmentParams { a, b, c, d, e, flip } = *params;
    let local = [
        (0.0, 0.0),
        (0.2, a),
        (0.5 + b + d, -t + c),
        (0.5 - t * tab_shape + b, t + c),
        (0.5 - 2.0 * t * tab_shape + b - d, 3.0 * t + c),
        (0.5 + 2.0 * t * tab_shape + b - d, 3.0 * t + c),
        (0.5 + t * tab_shape + b, t + c),
        (0.5 + b + d, -t + c),
        (0.8, e),
        (1.0, 0.0),
    ];

    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let len = (dx * dx + dy * dy).sqrt();
    let (sin, cos) = dy.atan2(dx).sin_cos();
    let influence = piece_width.min(piece_height);

    local.map(|(l, w)| {
        let lx = l.clamp(0.0, 1.0) * len;
        let ly = flip.sign() * w * influence;
        Point::new(p1.x + lx * cos - ly * sin, p1.y + lx * sin + ly * cos)
    })
}

/// Appends the side from the current point (`from`) to `to`.
///
/// Cuts are always traced canonically (left to right, top to bottom). When
/// `against_canonical` is set the side walks the cut the other way, so the
/// canonical curve of the neighbour's view is built and emitted in reverse;
/// both pieces then share one silhouette along the cut.
pub fn append_side(
    outline: &mut Outline,
    from: Point,
    to: Point,
    side: &PieceSide,
    piece_width: f64,
    piece_height: f64,
    against_canonical: bool,
) {
    let params = match side {
        PieceSide::Flat => {
            outline.line_to(to);
            return;
        }
        PieceSide::Cut(params) => params,
    };
    if !against_canonical {
        let pts = cut_control_points(from, to, params, piece_width, piece_height);
        outline.cubic_to(pts[1], pts[2], pts[3]);
        outline.cubic_to(pts[4], pts[5], pts[6]);
        outline.cubic_to(pts[7], pts[8], pts[9]);
    } else {
        let pts = cut_control_points(to, from, &params.mirror(), piece_width, piece_height);
        outline.cubic_to(pts[8], pts[7], pts[6]);
        outline.cubic_to(pts[5], pts[4], pts[3]);
        outline.cubic_to(pts[2], pts[1], pts[0]);
    }
}

/// Closed outline of a piece at its live position.
pub fn build_boundary(piece: &PuzzlePiece, piece_width: f64, piece_height: f64) -> Outline {
    let top_left = Point::new(piece.x, piece.y);
    let top_right = Point::new(piece.x + piece_width, piece.y);
    let bottom_right = Point::new(piece.x + piece_width, piece.y + piece_height);
    let bottom_left = Point::new(piece.x, piece.y + piece_height);

    let sides = [
        (top_left, top_right, &piece.top, false),
        (top_right, bottom_right, &piece.right, false),
        (bottom_right, bottom_left, &piece.bottom, true),
        (bottom_left, top_left, &piece.left, true),
    ];
    let mut outline = Outline::new();
    outline.move_to(top_left);
    for (from, to, side, against_canonical) in sides {
        append_side(
            &mut outline,
            from,
            to,
            side,
            piece_width,
            piece_height,
            against_canonical,
        );
    }
    outline.close();
    outline
}

/// Open cut lines for the solved-board preview overlay, one per interior cut.
pub fn build_cut_preview(
    cuts: &CutField,
    difficulty: &Difficulty,
    board: &BoardGeometry,
) -> Vec<Outline> {
    let (piece_width, piece_height) = board.piece_size(difficulty);
    let mut lines = Vec::with_capacity(cuts.cut_count());

    for (row, cut_row) in cuts.horizontal.iter().enumerate() {
        let y = board.y + (row + 1) as f64 * piece_height;
        for (col, params) in cut_row.iter().enumerate() {
            let p1 = Point::new(board.x + col as f64 * piece_width, y);
            let p2 = Point::new(board.x + (col + 1) as f64 * piece_width, y);
            let mut line = Outline::new();
            line.move_to(p1);
            let side = PieceSide::Cut(params.mirror());
            append_side(&mut line, p1, p2, &side, piece_width, piece_height, false);
            lines.push(line);
        }
    }

    for (col, cut_col) in cuts.vertical.iter().enumerate() {
        let x = board.x + (col + 1) as f64 * piece_width;
        for (row, params) in cut_col.iter().enumerate() {
            let p1 = Point::new(x, board.y + row as f64 * piece_height);
            let p2 = Point::new(x, board.y + (row + 1) as f64 * piece_height);
            let mut line = Outline::new();
            line.move_to(p1);
            let side = PieceSide::Cut(*params);
            append_side(&mut line, p1, p2, &side, piece_width, piece_height, false);
            lines.push(line);
        }
    }
    lines
}
