use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, Result};

#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
pub struct Difficulty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rows: u32,
    pub cols: u32,
}

impl Difficulty {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            name: None,
            rows,
            cols,
        }
    }

    pub fn named(name: &str, rows: u32, cols: u32) -> Self {
        Self {
            name: Some(name.to_string()),
            rows,
            cols,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows < 1 || self.cols < 1 {
            return Err(PuzzleError::InvalidDifficulty {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn piece_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.cols as f64 / self.rows.max(1) as f64
    }

    pub fn contains_cell(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn piece_id(&self, row: u32, col: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!(
                "{} ({}x{}, {} pieces)",
                name,
                self.cols,
                self.rows,
                self.piece_count()
            ),
            None => format!("{}x{} ({} pieces)", self.cols, self.rows, self.piece_count()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyPreset {
    pub name: &'static str,
    pub rows: u32,
    pub cols: u32,
}

impl DifficultyPreset {
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::named(self.name, self.rows, self.cols)
    }
}

pub const DIFFICULTY_PRESETS: [DifficultyPreset; 4] = [
    DifficultyPreset {
        name: "Easy",
        rows: 4,
        cols: 5,
    },
    DifficultyPreset {
        name: "Medium",
        rows: 8,
        cols: 10,
    },
    DifficultyPreset {
        name: "Hard",
        rows: 12,
        cols: 15,
    },
    DifficultyPreset {
        name: "Expert",
        rows: 16,
        cols: 20,
    },
];

pub const DEFAULT_PRESET_INDEX: usize = 1;

pub fn default_difficulty() -> Difficulty {
    DIFFICULTY_PRESETS[DEFAULT_PRESET_INDEX].difficulty()
}

pub fn preset_by_name(name: &str) -> Option<&'static DifficultyPreset> {
    let trimmed = name.trim();
    DIFFICULTY_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(trimmed))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle of the solved board (or of the play area around it).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoardGeometry {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn piece_size(&self, difficulty: &Difficulty) -> (f64, f64) {
        (
            self.width / difficulty.cols.max(1) as f64,
            self.height / difficulty.rows.max(1) as f64,
        )
    }

    pub fn cell_origin(&self, difficulty: &Difficulty, row: u32, col: u32) -> Point {
        let (piece_width, piece_height) = self.piece_size(difficulty);
        Point::new(
            self.x + col as f64 * piece_width,
            self.y + row as f64 * piece_height,
        )
    }
}

/// Largest board with the grid's aspect ratio that fits the available area,
/// centered inside it.
pub fn fit_board(
    available_width: f64,
    available_height: f64,
    difficulty: &Difficulty,
) -> BoardGeometry {
    let available_width = available_width.max(0.0);
    let available_height = available_height.max(0.0);
    let aspect = difficulty.aspect_ratio();
    let mut width = available_width;
    let mut height = width / aspect;
    if height > available_height {
        height = available_height;
        width = height * aspect;
    }
    BoardGeometry {
        x: (available_width - width) * 0.5,
        y: (available_height - height) * 0.5,
        width,
        height,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCrop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Center crop of a source image to the grid's aspect ratio.
pub fn source_crop(image_width: u32, image_height: u32, difficulty: &Difficulty) -> SourceCrop {
    let natural_width = image_width as f64;
    let natural_height = image_height.max(1) as f64;
    let board_aspect = difficulty.aspect_ratio();
    let image_aspect = natural_width / natural_height;
    if image_aspect > board_aspect {
        let width = natural_height * board_aspect;
        SourceCrop {
            x: (natural_width - width) / 2.0,
            y: 0.0,
            width,
            height: natural_height,
        }
    } else {
        let height = natural_width / board_aspect;
        SourceCrop {
            x: 0.0,
            y: (natural_height - height) / 2.0,
            width: natural_width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(Difficulty::new(0, 4).validate().is_err());
        assert!(Difficulty::new(4, 0).validate().is_err());
        assert!(Difficulty::new(1, 1).validate().is_ok());
    }

    #[test]
    fn presets_resolve_case_insensitively() {
        let preset = preset_by_name(" hard ").expect("preset");
        assert_eq!((preset.rows, preset.cols), (12, 15));
        assert!(preset_by_name("impossible").is_none());
        assert_eq!(default_difficulty().piece_count(), 80);
    }

    #[test]
    fn board_fit_keeps_grid_aspect() {
        let difficulty = Difficulty::new(8, 10);
        let wide = fit_board(1000.0, 400.0, &difficulty);
        assert_eq!(wide.height, 400.0);
        assert_eq!(wide.width, 500.0);
        assert_eq!(wide.x, 250.0);
        let tall = fit_board(500.0, 1000.0, &difficulty);
        assert_eq!(tall.width, 500.0);
        assert_eq!(tall.height, 400.0);
        assert_eq!(tall.y, 300.0);
    }

    #[test]
    fn crop_trims_the_longer_axis() {
        let difficulty = Difficulty::new(1, 1);
        let crop = source_crop(200, 100, &difficulty);
        assert_eq!(crop, SourceCrop { x: 50.0, y: 0.0, width: 100.0, height: 100.0 });
        let crop = source_crop(100, 300, &difficulty);
        assert_eq!(crop, SourceCrop { x: 0.0, y: 100.0, width: 100.0, height: 100.0 });
    }
}
