use std::collections::BTreeSet;

use crate::boundary::{build_boundary, Outline};
use crate::error::Result;
use crate::grid::{BoardGeometry, Difficulty, Point};
use crate::piece::{
    generate_puzzle_pieces, neighbor_id, Direction, GroupId, PieceId, PuzzlePiece,
};
use crate::rng::rand_range;
use crate::rules::EngineRules;
use crate::snapshot::SavedGame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitMode {
    /// Scatter every piece inside `area`, reproducibly from `scatter_seed`.
    Playing {
        area: BoardGeometry,
        scatter_seed: u32,
    },
    /// Every piece pinned at its final position and locked.
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    pub piece_id: PieceId,
    pub grab_offset: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Grabbed { piece_id: PieceId, group_id: GroupId },
    Merged { group_id: GroupId, absorbed: GroupId },
    Locked { group_id: GroupId, pieces: usize },
    Completed,
}

/// Owned play state of one puzzle instance. Every handler runs to completion
/// on `&mut self`; the host drains events and the redraw flag afterwards.
#[derive(Clone, Debug)]
pub struct AssemblyEngine {
    difficulty: Difficulty,
    seed: u32,
    board: BoardGeometry,
    rules: EngineRules,
    pieces: Vec<PuzzlePiece>,
    draw_order: Vec<PieceId>,
    selection: Option<Selection>,
    completed: bool,
    events: Vec<EngineEvent>,
    needs_redraw: bool,
}

impl AssemblyEngine {
    pub fn new(
        difficulty: Difficulty,
        seed: u32,
        board: BoardGeometry,
        rules: EngineRules,
        mode: InitMode,
    ) -> Result<Self> {
        let pieces = generate_puzzle_pieces(&difficulty, seed)?;
        let draw_order = (0..pieces.len()).collect();
        let mut engine = Self {
            difficulty,
            seed,
            board,
            rules,
            pieces,
            draw_order,
            selection: None,
            completed: false,
            events: Vec::new(),
            needs_redraw: true,
        };
        engine.refresh_finals();

        match mode {
            InitMode::Playing { area, scatter_seed } => engine.scatter(area, scatter_seed),
            InitMode::Complete => {
                for piece in &mut engine.pieces {
                    piece.pin_to_final();
                    piece.is_locked = true;
                }
                // Shown solved from the start; completion is never signalled.
                engine.completed = true;
            }
        }
        tracing::debug!(
            rows = engine.difficulty.rows,
            cols = engine.difficulty.cols,
            seed,
            "engine initialized"
        );
        Ok(engine)
    }

    /// Rebuilds an engine from a saved game. Stored positions, groups and
    /// locks are kept; final positions follow the given board.
    pub fn restore(saved: &SavedGame, board: BoardGeometry, rules: EngineRules) -> Result<Self> {
        saved.validate()?;
        let mut pieces = saved.pieces.clone();
        let draw_order: Vec<PieceId> = pieces.iter().map(|piece| piece.id).collect();
        pieces.sort_by_key(|piece| piece.id);

        let mut engine = Self {
            difficulty: saved.difficulty.clone(),
            seed: saved.seed,
            board,
            rules,
            pieces,
            draw_order,
            selection: None,
            completed: false,
            events: Vec::new(),
            needs_redraw: true,
        };
        engine.refresh_finals();
        for piece in &mut engine.pieces {
            if piece.is_locked {
                piece.pin_to_final();
            }
        }
        engine.completed = engine.all_locked();
        tracing::debug!(
            rows = engine.difficulty.rows,
            cols = engine.difficulty.cols,
            locked = engine.locked_count(),
            "engine restored"
        );
        Ok(engine)
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn board(&self) -> BoardGeometry {
        self.board
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    pub fn piece_size(&self) -> (f64, f64) {
        self.board.piece_size(&self.difficulty)
    }

    pub fn pieces(&self) -> &[PuzzlePiece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&PuzzlePiece> {
        self.pieces.get(id)
    }

    pub fn draw_order(&self) -> &[PieceId] {
        &self.draw_order
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn outline(&self, id: PieceId) -> Option<Outline> {
        let (piece_width, piece_height) = self.piece_size();
        self.pieces
            .get(id)
            .map(|piece| build_boundary(piece, piece_width, piece_height))
    }

    /// Back-to-front paint order: locked pieces first, then the free ones in
    /// draw order.
    pub fn paint_order(&self) -> Vec<PieceId> {
        let locked = self
            .draw_order
            .iter()
            .copied()
            .filter(|id| self.pieces[*id].is_locked);
        let free = self
            .draw_order
            .iter()
            .copied()
            .filter(|id| !self.pieces[*id].is_locked);
        locked.chain(free).collect()
    }

    pub fn group_members(&self, group_id: GroupId) -> Vec<PieceId> {
        self.pieces
            .iter()
            .filter(|piece| piece.group_id == group_id)
            .map(|piece| piece.id)
            .collect()
    }

    pub fn group_count(&self) -> usize {
        self.pieces
            .iter()
            .map(|piece| piece.group_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn locked_count(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.is_locked).count()
    }

    pub fn progress(&self) -> f64 {
        if self.pieces.is_empty() {
            return 0.0;
        }
        self.locked_count() as f64 / self.pieces.len() as f64
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns whether a redraw is due and clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Pieces in draw order, ready to persist.
    pub fn snapshot_pieces(&self) -> Vec<PuzzlePiece> {
        self.draw_order
            .iter()
            .map(|id| self.pieces[*id].clone())
            .collect()
    }

    pub fn to_saved_game(&self, image_ref: impl Into<String>) -> SavedGame {
        SavedGame::new(
            image_ref,
            self.difficulty.clone(),
            self.seed,
            self.snapshot_pieces(),
        )
    }

    /// Starts a drag on the topmost free piece under `point`.
    pub fn select_at(&mut self, point: Point) -> bool {
        let (piece_width, piece_height) = self.piece_size();
        let hit = self.draw_order.iter().rev().copied().find(|id| {
            let piece = &self.pieces[*id];
            !piece.is_locked && build_boundary(piece, piece_width, piece_height).contains(point)
        });
        let Some(piece_id) = hit else {
            return false;
        };

        let piece = &self.pieces[piece_id];
        let group_id = piece.group_id;
        self.selection = Some(Selection {
            piece_id,
            grab_offset: Point::new(point.x - piece.x, point.y - piece.y),
        });
        let members: Vec<PieceId> = self
            .draw_order
            .iter()
            .copied()
            .filter(|id| self.pieces[*id].group_id == group_id)
            .collect();
        bring_members_to_front(&mut self.draw_order, &members);
        self.events.push(EngineEvent::Grabbed { piece_id, group_id });
        self.needs_redraw = true;
        tracing::trace!(piece_id, group_id, "piece grabbed");
        true
    }

    /// Moves the dragged group so the grab point follows `point`. Returns
    /// whether the move ended in a snap, which also ends the drag.
    pub fn drag_to(&mut self, point: Point) -> bool {
        let Some(selection) = self.selection else {
            return false;
        };
        let piece = &self.pieces[selection.piece_id];
        let dx = point.x - selection.grab_offset.x - piece.x;
        let dy = point.y - selection.grab_offset.y - piece.y;
        let group_id = piece.group_id;
        self.translate_group(group_id, dx, dy);
        self.needs_redraw = true;

        let snapped = self.try_snap(selection.piece_id);
        if snapped {
            self.selection = None;
        }
        snapped
    }

    /// Tries to join `piece_id`'s group to a neighbour or to the board.
    /// Neighbours are scanned up, right, down, left and the first match wins.
    pub fn try_snap(&mut self, piece_id: PieceId) -> bool {
        let Some(piece) = self.pieces.get(piece_id) else {
            return false;
        };
        if piece.is_locked {
            return false;
        }
        let (piece_width, piece_height) = self.piece_size();
        let tolerance = self.rules.snap_tolerance(piece_width);
        let cols = self.difficulty.cols as usize;
        let rows = self.difficulty.rows as usize;
        let (x, y) = (piece.x, piece.y);
        let group_id = piece.group_id;

        for dir in Direction::SCAN_ORDER {
            let Some(other_id) = neighbor_id(piece_id, cols, rows, dir) else {
                continue;
            };
            let other = &self.pieces[other_id];
            if other.group_id == group_id {
                continue;
            }
            let (off_x, off_y) = dir.offset();
            let target_x = other.x - off_x as f64 * piece_width;
            let target_y = other.y - off_y as f64 * piece_height;
            if (x - target_x).abs() < tolerance && (y - target_y).abs() < tolerance {
                let merged_into = other.group_id;
                let join_locked = other.is_locked;
                self.translate_group(group_id, target_x - x, target_y - y);
                self.relabel_group(group_id, merged_into);
                self.events.push(EngineEvent::Merged {
                    group_id: merged_into,
                    absorbed: group_id,
                });
                tracing::debug!(
                    piece_id,
                    neighbor = other_id,
                    group_id = merged_into,
                    "groups merged"
                );
                if join_locked {
                    self.lock_group(merged_into);
                    self.check_win();
                }
                self.needs_redraw = true;
                return true;
            }
        }

        let piece = &self.pieces[piece_id];
        if (piece.x - piece.final_x).abs() < tolerance
            && (piece.y - piece.final_y).abs() < tolerance
        {
            self.lock_group(group_id);
            self.check_win();
            self.needs_redraw = true;
            return true;
        }
        false
    }

    /// Ends the current drag, giving the dragged piece one more snap attempt.
    pub fn release(&mut self) -> bool {
        let Some(selection) = self.selection.take() else {
            return false;
        };
        let snapped = self.try_snap(selection.piece_id);
        self.needs_redraw = true;
        snapped
    }

    /// True once every piece is locked. `Completed` is emitted the first time
    /// only.
    pub fn check_win(&mut self) -> bool {
        let won = self.all_locked();
        if won && !self.completed {
            self.completed = true;
            self.events.push(EngineEvent::Completed);
            tracing::info!(pieces = self.pieces.len(), "puzzle completed");
        }
        won
    }

    /// Re-fits the puzzle to a new board. Locked pieces sit on their new
    /// finals; free pieces keep their place relative to the board origin.
    pub fn resize(&mut self, board: BoardGeometry) {
        let old = self.board;
        let scale_x = if old.width > 0.0 { board.width / old.width } else { 1.0 };
        let scale_y = if old.height > 0.0 { board.height / old.height } else { 1.0 };
        self.board = board;
        self.refresh_finals();
        for piece in &mut self.pieces {
            if piece.is_locked {
                piece.pin_to_final();
            } else {
                piece.x = board.x + (piece.x - old.x) * scale_x;
                piece.y = board.y + (piece.y - old.y) * scale_y;
            }
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.grab_offset.x *= scale_x;
            selection.grab_offset.y *= scale_y;
        }
        self.needs_redraw = true;
        tracing::debug!(width = board.width, height = board.height, "board resized");
    }

    pub fn pointer_down(&mut self, point: Point) -> bool {
        self.select_at(point)
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        self.drag_to(point)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.release()
    }

    fn all_locked(&self) -> bool {
        self.pieces.iter().all(|piece| piece.is_locked)
    }

    fn refresh_finals(&mut self) {
        for piece in &mut self.pieces {
            let origin = self.board.cell_origin(&self.difficulty, piece.row, piece.col);
            piece.final_x = origin.x;
            piece.final_y = origin.y;
        }
    }

    fn scatter(&mut self, area: BoardGeometry, scatter_seed: u32) {
        let (piece_width, piece_height) = self.piece_size();
        let margin = area.width.min(area.height) * self.rules.scatter_margin;
        let min_x = area.x + margin;
        let min_y = area.y + margin;
        let max_x = (area.x + area.width - piece_width - margin).max(min_x);
        let max_y = (area.y + area.height - piece_height - margin).max(min_y);
        for piece in &mut self.pieces {
            let salt = (piece.id as u32) << 1;
            piece.x = rand_range(scatter_seed, salt, min_x, max_x);
            piece.y = rand_range(scatter_seed, salt + 1, min_y, max_y);
        }
    }

    fn translate_group(&mut self, group_id: GroupId, dx: f64, dy: f64) {
        for piece in self.pieces.iter_mut().filter(|piece| piece.group_id == group_id) {
            piece.translate(dx, dy);
        }
    }

    fn relabel_group(&mut self, from: GroupId, to: GroupId) {
        for piece in self.pieces.iter_mut().filter(|piece| piece.group_id == from) {
            piece.group_id = to;
        }
    }

    fn lock_group(&mut self, group_id: GroupId) {
        let mut count = 0;
        for piece in self.pieces.iter_mut().filter(|piece| piece.group_id == group_id) {
            piece.pin_to_final();
            piece.is_locked = true;
            count += 1;
        }
        self.events.push(EngineEvent::Locked {
            group_id,
            pieces: count,
        });
        tracing::debug!(group_id, pieces = count, "group locked");
    }
}

/// Moves `members` to the top of `order`, keeping everyone else's relative
/// order.
pub fn bring_members_to_front(order: &mut Vec<PieceId>, members: &[PieceId]) {
    if order.is_empty() || members.is_empty() {
        return;
    }
    let mut keep = Vec::with_capacity(order.len());
    for id in order.iter().copied() {
        if !members.contains(&id) {
            keep.push(id);
        }
    }
    keep.extend_from_slice(members);
    *order = keep;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardGeometry {
        BoardGeometry::new(0.0, 0.0, 200.0, 200.0)
    }

    fn playing(seed: u32) -> AssemblyEngine {
        AssemblyEngine::new(
            Difficulty::new(2, 2),
            seed,
            board(),
            EngineRules::default(),
            InitMode::Playing {
                area: BoardGeometry::new(0.0, 0.0, 1000.0, 800.0),
                scatter_seed: 9,
            },
        )
        .expect("engine")
    }

    #[test]
    fn bring_to_front_keeps_other_order() {
        let mut order = vec![0, 1, 2, 3, 4];
        bring_members_to_front(&mut order, &[3, 1]);
        assert_eq!(order, vec![0, 2, 4, 3, 1]);
    }

    #[test]
    fn scatter_is_reproducible_and_inside_area() {
        let a = playing(1);
        let b = playing(1);
        assert_eq!(a.pieces(), b.pieces());
        for piece in a.pieces() {
            assert!(piece.x >= 0.0 && piece.x <= 1000.0 - 100.0);
            assert!(piece.y >= 0.0 && piece.y <= 800.0 - 100.0);
        }
    }

    #[test]
    fn complete_mode_is_locked_without_completion_event() {
        let mut engine = AssemblyEngine::new(
            Difficulty::new(2, 2),
            3,
            board(),
            EngineRules::default(),
            InitMode::Complete,
        )
        .expect("engine");
        assert!(engine.pieces().iter().all(|piece| piece.is_locked && piece.is_at_final()));
        assert!(engine.check_win());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn select_misses_empty_space() {
        let mut engine = playing(1);
        assert!(!engine.select_at(Point::new(-500.0, -500.0)));
        assert!(engine.selection().is_none());
        assert!(!engine.drag_to(Point::new(10.0, 10.0)));
        assert!(!engine.release());
    }

    #[test]
    fn select_brings_piece_to_front() {
        let mut engine = playing(1);
        let piece = engine.piece(0).cloned().expect("piece");
        let grab = Point::new(piece.x + 50.0, piece.y + 50.0);
        assert!(engine.select_at(grab));
        let selection = engine.selection().expect("selection");
        assert_eq!(engine.draw_order().last(), Some(&selection.piece_id));
        assert!(engine.take_redraw());
        assert!(!engine.take_redraw());
    }

    #[test]
    fn paint_order_puts_locked_pieces_first() {
        let mut engine = playing(1);
        engine.pieces[3].is_locked = true;
        let order = engine.paint_order();
        assert_eq!(order[0], 3);
        assert_eq!(order.len(), 4);
    }
}
