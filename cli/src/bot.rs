use jigsaw_core::{AssemblyEngine, EngineEvent, PieceId, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug)]
pub(super) struct BotConfig {
    /// Largest miss from the final position, as a fraction of the snap
    /// tolerance. Values below 1 always land a snap.
    pub miss_ratio: f64,
    /// Drags allowed per piece before the bot gives up.
    pub moves_per_piece: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            miss_ratio: 0.6,
            moves_per_piece: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct BotReport {
    pub moves: usize,
    pub merges: usize,
    pub locks: usize,
    pub completed: bool,
}

/// Plays the puzzle through the pointer handlers only, the way a person at
/// the board would: grab a free piece, drop it near where it belongs.
pub(super) fn solve(engine: &mut AssemblyEngine, seed: u64, config: BotConfig) -> BotReport {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut report = BotReport::default();
    let max_moves = engine.pieces().len() * config.moves_per_piece.max(1);

    while !engine.is_complete() && report.moves < max_moves {
        let candidates = candidate_pieces(engine);
        if candidates.is_empty() {
            break;
        }
        let anchor = choose_anchor(engine, &candidates, &mut rng);
        let Some(grab) = piece_center(engine, anchor) else {
            break;
        };
        if !engine.pointer_down(grab) {
            tracing::warn!(anchor, "bot missed its piece");
            break;
        }
        report.moves += 1;

        let Some(selection) = engine.selection() else {
            break;
        };
        let Some(piece) = engine.piece(selection.piece_id) else {
            break;
        };
        let (piece_width, _) = engine.piece_size();
        let tolerance = engine.rules().snap_tolerance(piece_width);
        let radius = rng.random_range(0.0..=tolerance * config.miss_ratio.clamp(0.0, 0.95));
        let theta = rng.random_range(0.0..std::f64::consts::TAU);
        let target = Point::new(
            piece.final_x + radius * theta.cos() * std::f64::consts::FRAC_1_SQRT_2,
            piece.final_y + radius * theta.sin() * std::f64::consts::FRAC_1_SQRT_2,
        );
        let pointer = Point::new(
            target.x + selection.grab_offset.x,
            target.y + selection.grab_offset.y,
        );
        if !engine.pointer_move(pointer) {
            engine.pointer_up();
        }

        for event in engine.drain_events() {
            match event {
                EngineEvent::Merged { .. } => report.merges += 1,
                EngineEvent::Locked { .. } => report.locks += 1,
                EngineEvent::Completed => report.completed = true,
                EngineEvent::Grabbed { .. } => {}
            }
        }
        tracing::debug!(
            moves = report.moves,
            progress = engine.progress(),
            "bot move finished"
        );
    }
    report
}

fn candidate_pieces(engine: &AssemblyEngine) -> Vec<PieceId> {
    engine
        .pieces()
        .iter()
        .filter(|piece| !piece.is_locked)
        .map(|piece| piece.id)
        .collect()
}

/// Border pieces first, like most people start.
fn choose_anchor(engine: &AssemblyEngine, candidates: &[PieceId], rng: &mut StdRng) -> PieceId {
    let border: Vec<PieceId> = candidates
        .iter()
        .copied()
        .filter(|id| engine.piece(*id).is_some_and(|piece| piece.is_border()))
        .collect();
    let pool = if border.is_empty() { candidates } else { &border };
    pool[rng.random_range(0..pool.len())]
}

fn piece_center(engine: &AssemblyEngine, id: PieceId) -> Option<Point> {
    let (piece_width, piece_height) = engine.piece_size();
    engine
        .piece(id)
        .map(|piece| Point::new(piece.x + piece_width * 0.5, piece.y + piece_height * 0.5))
}
