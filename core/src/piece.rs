use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::cuts::{generate_cuts, CutField, SegmentParams};
use crate::error::Result;
use crate::grid::Difficulty;

pub type PieceId = usize;
pub type GroupId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Neighbour scan order. The first neighbour in this order wins a snap
    /// when several are within tolerance at once.
    pub const SCAN_ORDER: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

pub fn neighbor_id(id: PieceId, cols: usize, rows: usize, dir: Direction) -> Option<PieceId> {
    if cols == 0 || id >= cols * rows {
        return None;
    }
    let col = id % cols;
    let row = id / cols;
    match dir {
        Direction::Up if row > 0 => Some(id - cols),
        Direction::Right if col + 1 < cols => Some(id + 1),
        Direction::Down if row + 1 < rows => Some(id + cols),
        Direction::Left if col > 0 => Some(id - 1),
        _ => None,
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[serde(from = "SideRepr", into = "SideRepr")]
pub enum PieceSide {
    Flat,
    Cut(SegmentParams),
}

impl PieceSide {
    pub fn is_flat(&self) -> bool {
        matches!(self, PieceSide::Flat)
    }

    pub fn mirror(&self) -> Self {
        match self {
            PieceSide::Flat => PieceSide::Flat,
            PieceSide::Cut(params) => PieceSide::Cut(params.mirror()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum FlatKind {
    #[serde(rename = "flat")]
    Flat,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SideRepr {
    Flat {
        #[serde(rename = "type")]
        kind: FlatKind,
    },
    Cut(SegmentParams),
}

impl From<SideRepr> for PieceSide {
    fn from(repr: SideRepr) -> Self {
        match repr {
            SideRepr::Flat { .. } => PieceSide::Flat,
            SideRepr::Cut(params) => PieceSide::Cut(params),
        }
    }
}

impl From<PieceSide> for SideRepr {
    fn from(side: PieceSide) -> Self {
        match side {
            PieceSide::Flat => SideRepr::Flat {
                kind: FlatKind::Flat,
            },
            PieceSide::Cut(params) => SideRepr::Cut(params),
        }
    }
}

#[derive(
    Clone, Debug, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct PuzzlePiece {
    pub id: PieceId,
    pub row: u32,
    pub col: u32,
    pub x: f64,
    pub y: f64,
    pub final_x: f64,
    pub final_y: f64,
    pub top: PieceSide,
    pub right: PieceSide,
    pub bottom: PieceSide,
    pub left: PieceSide,
    pub group_id: GroupId,
    pub is_locked: bool,
}

impl PuzzlePiece {
    pub fn side(&self, dir: Direction) -> &PieceSide {
        match dir {
            Direction::Up => &self.top,
            Direction::Right => &self.right,
            Direction::Down => &self.bottom,
            Direction::Left => &self.left,
        }
    }

    pub fn is_border(&self) -> bool {
        Direction::SCAN_ORDER
            .iter()
            .any(|dir| self.side(*dir).is_flat())
    }

    pub fn is_at_final(&self) -> bool {
        self.x == self.final_x && self.y == self.final_y
    }

    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub(crate) fn pin_to_final(&mut self) {
        self.x = self.final_x;
        self.y = self.final_y;
    }
}

/// Builds the full piece set from an existing cut field. Positions are left at
/// zero for the caller to place once board geometry is known.
pub fn assemble_pieces(difficulty: &Difficulty, cuts: &CutField) -> Vec<PuzzlePiece> {
    let (rows, cols) = (difficulty.rows, difficulty.cols);
    let side_or_flat = |cut: Option<&SegmentParams>, mirrored: bool| match cut {
        Some(params) if mirrored => PieceSide::Cut(params.mirror()),
        Some(params) => PieceSide::Cut(*params),
        None => PieceSide::Flat,
    };

    let mut pieces = Vec::with_capacity(difficulty.piece_count());
    for row in 0..rows {
        for col in 0..cols {
            let id = difficulty.piece_id(row, col);
            let top = if row > 0 {
                side_or_flat(cuts.horizontal_cut(row - 1, col), true)
            } else {
                PieceSide::Flat
            };
            let bottom = if row + 1 < rows {
                side_or_flat(cuts.horizontal_cut(row, col), false)
            } else {
                PieceSide::Flat
            };
            let left = if col > 0 {
                side_or_flat(cuts.vertical_cut(col - 1, row), true)
            } else {
                PieceSide::Flat
            };
            let right = if col + 1 < cols {
                side_or_flat(cuts.vertical_cut(col, row), false)
            } else {
                PieceSide::Flat
            };
            pieces.push(PuzzlePiece {
                id,
                row,
                col,
                x: 0.0,
                y: 0.0,
                final_x: 0.0,
                final_y: 0.0,
                top,
                right,
                bottom,
                left,
                group_id: id,
                is_locked: false,
            });
        }
    }
    pieces
}

pub fn generate_puzzle_pieces(difficulty: &Difficulty, seed: u32) -> Result<Vec<PuzzlePiece>> {
    let cuts = generate_cuts(difficulty, seed)?;
    Ok(assemble_pieces(difficulty, &cuts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::TabSide;

    #[test]
    fn corner_piece_has_two_flat_sides() {
        let pieces = generate_puzzle_pieces(&Difficulty::new(3, 3), 5).expect("pieces");
        let corner = &pieces[0];
        assert!(corner.top.is_flat());
        assert!(corner.left.is_flat());
        assert!(!corner.right.is_flat());
        assert!(!corner.bottom.is_flat());
        let center = &pieces[4];
        assert!(!center.is_border());
    }

    #[test]
    fn neighbor_lookup_respects_grid_edges() {
        assert_eq!(neighbor_id(0, 3, 2, Direction::Up), None);
        assert_eq!(neighbor_id(0, 3, 2, Direction::Left), None);
        assert_eq!(neighbor_id(0, 3, 2, Direction::Right), Some(1));
        assert_eq!(neighbor_id(0, 3, 2, Direction::Down), Some(3));
        assert_eq!(neighbor_id(5, 3, 2, Direction::Right), None);
        assert_eq!(neighbor_id(5, 3, 2, Direction::Down), None);
        assert_eq!(neighbor_id(9, 3, 2, Direction::Up), None);
    }

    #[test]
    fn sides_serialize_in_save_file_shape() {
        let flat = serde_json::to_value(PieceSide::Flat).expect("flat");
        assert_eq!(flat, serde_json::json!({ "type": "flat" }));

        let cut = PieceSide::Cut(SegmentParams {
            a: 0.5,
            b: 0.25,
            c: 0.0,
            d: -0.25,
            e: -0.5,
            flip: TabSide::Blank,
        });
        let value = serde_json::to_value(cut).expect("cut");
        assert_eq!(
            value,
            serde_json::json!({ "a": 0.5, "b": 0.25, "c": 0.0, "d": -0.25, "e": -0.5, "flip": -1 })
        );
        let back: PieceSide = serde_json::from_value(value).expect("decode");
        assert_eq!(back, cut);
        let back: PieceSide = serde_json::from_value(flat).expect("decode flat");
        assert_eq!(back, PieceSide::Flat);
    }

    #[test]
    fn piece_fields_use_camel_case() {
        let pieces = generate_puzzle_pieces(&Difficulty::new(1, 2), 1).expect("pieces");
        let value = serde_json::to_value(&pieces[1]).expect("piece");
        assert!(value.get("finalX").is_some());
        assert!(value.get("groupId").is_some());
        assert_eq!(value.get("isLocked"), Some(&serde_json::Value::Bool(false)));
    }
}
