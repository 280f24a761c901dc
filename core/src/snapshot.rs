use std::collections::HashSet;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{PuzzleError, Result};
use crate::grid::Difficulty;
use crate::piece::PuzzlePiece;
use crate::rng::wrap_seed_f64;

/// Persisted puzzle: everything needed to rebuild the engine. Pieces are kept
/// in draw order, back to front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[serde(try_from = "RawSavedGame")]
pub struct SavedGame {
    #[serde(rename = "puzzleImageUrl")]
    pub image_ref: String,
    pub difficulty: Difficulty,
    #[serde(rename = "puzzleSeed")]
    pub seed: u32,
    pub pieces: Vec<PuzzlePiece>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSavedGame {
    #[serde(default, alias = "imageReference")]
    puzzle_image_url: Option<String>,
    #[serde(default)]
    difficulty: Option<serde_json::Value>,
    #[serde(default, alias = "seed")]
    puzzle_seed: Option<f64>,
    #[serde(default)]
    pieces: Option<Vec<serde_json::Value>>,
}

impl TryFrom<RawSavedGame> for SavedGame {
    type Error = PuzzleError;

    fn try_from(raw: RawSavedGame) -> Result<Self> {
        let image_ref = raw
            .puzzle_image_url
            .ok_or_else(|| PuzzleError::malformed("missing image reference"))?;
        let difficulty = raw
            .difficulty
            .ok_or_else(|| PuzzleError::malformed("missing difficulty"))?;
        let difficulty: Difficulty = serde_json::from_value(difficulty)
            .map_err(|err| PuzzleError::malformed(format!("difficulty: {err}")))?;
        let seed = raw
            .puzzle_seed
            .map(wrap_seed_f64)
            .ok_or_else(|| PuzzleError::malformed("missing seed"))?;
        let pieces = raw
            .pieces
            .ok_or_else(|| PuzzleError::malformed("missing pieces"))?
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                serde_json::from_value::<PuzzlePiece>(value)
                    .map_err(|err| PuzzleError::malformed(format!("piece {idx}: {err}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let game = SavedGame {
            image_ref,
            difficulty,
            seed,
            pieces,
        };
        game.validate()?;
        Ok(game)
    }
}

impl SavedGame {
    pub fn new(
        image_ref: impl Into<String>,
        difficulty: Difficulty,
        seed: u32,
        pieces: Vec<PuzzlePiece>,
    ) -> Self {
        Self {
            image_ref: image_ref.into(),
            difficulty,
            seed,
            pieces,
        }
    }

    /// Structural checks a snapshot must pass before an engine is built from it.
    pub fn validate(&self) -> Result<()> {
        self.difficulty.validate()?;
        let expected = self.difficulty.piece_count();
        if self.pieces.len() != expected {
            return Err(PuzzleError::malformed(format!(
                "expected {} pieces for a {}x{} grid, found {}",
                expected,
                self.difficulty.cols,
                self.difficulty.rows,
                self.pieces.len()
            )));
        }

        let mut seen = HashSet::with_capacity(expected);
        for piece in &self.pieces {
            if !self.difficulty.contains_cell(piece.row, piece.col) {
                return Err(PuzzleError::malformed(format!(
                    "piece {} at row {} col {} is outside the grid",
                    piece.id, piece.row, piece.col
                )));
            }
            if piece.id != self.difficulty.piece_id(piece.row, piece.col) {
                return Err(PuzzleError::malformed(format!(
                    "piece id {} does not match row {} col {}",
                    piece.id, piece.row, piece.col
                )));
            }
            if !seen.insert(piece.id) {
                return Err(PuzzleError::malformed(format!("duplicate piece {}", piece.id)));
            }
            if piece.group_id >= expected {
                return Err(PuzzleError::malformed(format!(
                    "piece {} has unknown group {}",
                    piece.id, piece.group_id
                )));
            }
            if !piece.x.is_finite() || !piece.y.is_finite() {
                return Err(PuzzleError::malformed(format!(
                    "piece {} has a non-finite position",
                    piece.id
                )));
            }
        }

        // Every id is now known to be present exactly once.
        let mut by_id = vec![0; expected];
        for (idx, piece) in self.pieces.iter().enumerate() {
            by_id[piece.id] = idx;
        }
        for piece in &self.pieces {
            let root = &self.pieces[by_id[piece.group_id]];
            if root.group_id != piece.group_id {
                return Err(PuzzleError::malformed(format!(
                    "piece {} is in group {} but piece {} is in group {}",
                    piece.id, piece.group_id, root.id, root.group_id
                )));
            }
            if root.is_locked != piece.is_locked {
                return Err(PuzzleError::malformed(format!(
                    "group {} is only partly locked",
                    piece.group_id
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawSavedGame = serde_json::from_str(text)?;
        SavedGame::try_from(raw)
    }

    pub fn to_storage_string(&self) -> Result<String> {
        codec::encode_storage_string(self)
    }

    pub fn from_storage_string(text: &str) -> Result<Self> {
        let game: SavedGame = codec::decode_storage_string(text)?;
        game.validate()?;
        Ok(game)
    }
}
