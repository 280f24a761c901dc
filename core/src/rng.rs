//! Seeded random streams used by cut generation and piece scattering.
//!
//! Every constant in this module is part of the save-file format: a puzzle is
//! stored as `(difficulty, seed)` and its cut field is regenerated on load, so
//! changing any of these values silently changes every saved puzzle.

pub const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
pub const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
pub const FNV_PRIME: u32 = 0x0100_0193;

const UNIT_SCALE: f64 = 4_294_967_296.0;

/// Mulberry32 stream. `next` yields `[0, 1)` with 32 bits of resolution.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(s | 1);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61)) ^ t;
        (t ^ (t >> 14)) as f64 / UNIT_SCALE
    }

    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next()
    }
}

/// 32-bit FNV-1a over the UTF-16 code units of `label`.
pub fn hash_label(label: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in label.encode_utf16() {
        hash ^= unit as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutAxis {
    Horizontal,
    Vertical,
}

impl CutAxis {
    pub fn label(self) -> &'static str {
        match self {
            CutAxis::Horizontal => "H",
            CutAxis::Vertical => "V",
        }
    }
}

/// Seed of the stream that generates one row (or column) of cuts.
pub fn cut_chain_seed(seed: u32, axis: CutAxis, index: u32, rows: u32, cols: u32) -> u32 {
    let label = format!("{}_{}_{}_{}", axis.label(), index, cols, rows);
    seed ^ hash_label(&label)
}

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

pub fn rand_unit(seed: u32, salt: u32) -> f64 {
    let mixed = splitmix32(seed ^ salt);
    (mixed >> 8) as f64 / (1u32 << 24) as f64
}

pub fn rand_range(seed: u32, salt: u32, min: f64, max: f64) -> f64 {
    min + (max - min) * rand_unit(seed, salt)
}

/// Reduces a wide integer seed (for example a millisecond timestamp) to 32 bits.
pub fn wrap_seed(value: u64) -> u32 {
    value as u32
}

/// Reduces a JSON number to 32 bits the way `ToUint32` does: truncate, then
/// take the value modulo 2^32. Non-finite input maps to zero.
pub fn wrap_seed_f64(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(UNIT_SCALE) as u32
}
