use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::Difficulty;
use crate::rng::{cut_chain_seed, CutAxis, SeededRandom};

pub const JITTER_AMPLITUDE: f64 = 0.05;
pub const RIP_SCALE: f64 = 0.05;

/// Which side of the cut baseline the knob bulges toward, as seen by the
/// piece that owns this copy of the cut. Serialized as `1` / `-1`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Archive, RkyvSerialize,
    RkyvDeserialize,
)]
#[serde(try_from = "i8", into = "i8")]
pub enum TabSide {
    Tab,
    Blank,
}

impl TabSide {
    pub fn sign(self) -> f64 {
        match self {
            TabSide::Tab => 1.0,
            TabSide::Blank => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            TabSide::Tab => TabSide::Blank,
            TabSide::Blank => TabSide::Tab,
        }
    }
}

impl From<TabSide> for i8 {
    fn from(side: TabSide) -> Self {
        match side {
            TabSide::Tab => 1,
            TabSide::Blank => -1,
        }
    }
}

impl TryFrom<i8> for TabSide {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(TabSide::Tab),
            -1 => Ok(TabSide::Blank),
            other => Err(format!("flip must be 1 or -1, got {other}")),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
pub struct SegmentParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub flip: TabSide,
}

impl SegmentParams {
    /// The same cut as seen from the neighbouring piece.
    pub fn mirror(&self) -> Self {
        Self {
            flip: self.flip.flipped(),
            ..*self
        }
    }

    pub fn is_mirror_of(&self, other: &SegmentParams) -> bool {
        self.a == other.a
            && self.b == other.b
            && self.c == other.c
            && self.d == other.d
            && self.e == other.e
            && self.flip == other.flip.flipped()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CutField {
    /// `horizontal[r][c]`: cut between rows `r` and `r + 1` in column `c`.
    pub horizontal: Vec<Vec<SegmentParams>>,
    /// `vertical[c][r]`: cut between columns `c` and `c + 1` in row `r`.
    pub vertical: Vec<Vec<SegmentParams>>,
}

impl CutField {
    pub fn horizontal_cut(&self, row: u32, col: u32) -> Option<&SegmentParams> {
        self.horizontal.get(row as usize)?.get(col as usize)
    }

    pub fn vertical_cut(&self, col: u32, row: u32) -> Option<&SegmentParams> {
        self.vertical.get(col as usize)?.get(row as usize)
    }

    pub fn cut_count(&self) -> usize {
        self.horizontal.iter().map(Vec::len).sum::<usize>()
            + self.vertical.iter().map(Vec::len).sum::<usize>()
    }
}

fn jitter(rng: &mut SeededRandom) -> f64 {
    rng.uniform(-JITTER_AMPLITUDE, JITTER_AMPLITUDE) * RIP_SCALE
}

/// One row (or column) of cuts from a single stream. Consecutive cuts are
/// correlated: the leading `a` of a cut reuses the trailing `e` of the one
/// before it, negated when both bulge the same way.
pub fn cut_chain(len: u32, seed: u32) -> Vec<SegmentParams> {
    let mut rng = SeededRandom::new(seed);
    let mut e = jitter(&mut rng);
    let mut flip_prev = TabSide::Tab;
    let mut chain = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let flip = if rng.next() > 0.5 {
            TabSide::Tab
        } else {
            TabSide::Blank
        };
        let a = if flip == flip_prev { -e } else { e };
        let b = jitter(&mut rng);
        let c = jitter(&mut rng);
        let d = jitter(&mut rng);
        e = jitter(&mut rng);
        chain.push(SegmentParams { a, b, c, d, e, flip });
        flip_prev = flip;
    }
    chain
}

pub fn generate_cuts(difficulty: &Difficulty, seed: u32) -> Result<CutField> {
    difficulty.validate()?;
    let (rows, cols) = (difficulty.rows, difficulty.cols);

    let horizontal = (0..rows - 1)
        .map(|row| {
            let chain_seed = cut_chain_seed(seed, CutAxis::Horizontal, row, rows, cols);
            cut_chain(cols, chain_seed)
        })
        .collect();

    let vertical = (0..cols - 1)
        .map(|col| {
            let chain_seed = cut_chain_seed(seed, CutAxis::Vertical, col, rows, cols);
            cut_chain(rows, chain_seed)
        })
        .collect();

    tracing::trace!(rows, cols, seed, "generated cut field");
    Ok(CutField {
        horizontal,
        vertical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_has_one_cut_per_interior_edge() {
        let cuts = generate_cuts(&Difficulty::new(3, 4), 9).expect("cuts");
        assert_eq!(cuts.horizontal.len(), 2);
        assert!(cuts.horizontal.iter().all(|row| row.len() == 4));
        assert_eq!(cuts.vertical.len(), 3);
        assert!(cuts.vertical.iter().all(|col| col.len() == 3));
        assert_eq!(cuts.cut_count(), 2 * 4 + 3 * 3);
    }

    #[test]
    fn single_cell_has_no_cuts() {
        let cuts = generate_cuts(&Difficulty::new(1, 1), 1).expect("cuts");
        assert!(cuts.horizontal.is_empty());
        assert!(cuts.vertical.is_empty());
    }

    #[test]
    fn chain_links_leading_and_trailing_jitter() {
        let chain = cut_chain(64, 4242);
        for pair in chain.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev.flip == next.flip {
                assert_eq!(next.a, -prev.e);
            } else {
                assert_eq!(next.a, prev.e);
            }
        }
    }

    #[test]
    fn jitter_stays_within_rip_bounds() {
        let bound = JITTER_AMPLITUDE * RIP_SCALE;
        for segment in cut_chain(256, 31337) {
            for value in [segment.a, segment.b, segment.c, segment.d, segment.e] {
                assert!(value.abs() <= bound);
            }
        }
    }

    #[test]
    fn tab_side_rejects_other_integers() {
        assert_eq!(TabSide::try_from(1i8), Ok(TabSide::Tab));
        assert_eq!(TabSide::try_from(-1i8), Ok(TabSide::Blank));
        assert!(TabSide::try_from(0i8).is_err());
        assert_eq!(i8::from(TabSide::Blank), -1);
    }
}
