pub mod boundary;
pub mod codec;
pub mod cuts;
pub mod engine;
pub mod error;
pub mod grid;
pub mod piece;
pub mod rng;
pub mod rules;
pub mod snapshot;

pub use boundary::{build_boundary, build_cut_preview, Bounds, Outline, PathCommand};
pub use codec::{decode, decode_storage_string, encode, encode_storage_string};
pub use cuts::{generate_cuts, CutField, SegmentParams, TabSide};
pub use engine::{AssemblyEngine, EngineEvent, InitMode, Selection};
pub use error::{PuzzleError, Result};
pub use grid::{
    default_difficulty, fit_board, preset_by_name, source_crop, BoardGeometry, Difficulty,
    DifficultyPreset, Point, SourceCrop, DIFFICULTY_PRESETS,
};
pub use piece::{
    generate_puzzle_pieces, neighbor_id, Direction, GroupId, PieceId, PieceSide, PuzzlePiece,
};
pub use rng::{wrap_seed, SeededRandom};
pub use rules::EngineRules;
pub use snapshot::SavedGame;
