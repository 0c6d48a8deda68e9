//! Deterministic luck
//!
//! `luck` maps a key (a short sequence of ints and strings) to a value in
//! [0, 1). It has no seed and no state: the key bytes are hashed with SHA-256
//! and the first eight digest bytes seed a PCG32 stream, so the same key
//! yields the same value in every process on every platform.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sha2::{Digest, Sha256};

use crate::grid::Cell;

/// Purpose tag mixed into the key when sizing a fresh cache
pub const INITIAL_VALUE_TAG: &str = "initialValue";

/// One component of a luck key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuckKey<'a> {
    Int(i64),
    Str(&'a str),
}

impl From<i32> for LuckKey<'_> {
    fn from(v: i32) -> Self {
        LuckKey::Int(i64::from(v))
    }
}

impl From<i64> for LuckKey<'_> {
    fn from(v: i64) -> Self {
        LuckKey::Int(v)
    }
}

impl<'a> From<&'a str> for LuckKey<'a> {
    fn from(s: &'a str) -> Self {
        LuckKey::Str(s)
    }
}

/// Pure pseudo-random value in [0, 1) for `key`
pub fn luck(key: &[LuckKey<'_>]) -> f64 {
    let mut hasher = Sha256::new();
    for part in key {
        // Tag + length prefix keep ["1", 2] and ["12"] apart
        match part {
            LuckKey::Int(v) => {
                hasher.update([0u8]);
                hasher.update(v.to_le_bytes());
            }
            LuckKey::Str(s) => {
                hasher.update([1u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
        }
    }
    let digest = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);

    let mut rng = Pcg32::seed_from_u64(u64::from_le_bytes(seed));
    rng.random::<f64>()
}

/// Does `cell` hold a cache?
pub fn spawns_cache(cell: Cell, spawn_probability: f64) -> bool {
    luck(&[cell.i.into(), cell.j.into()]) < spawn_probability
}

/// How many coins a freshly spawned cache at `cell` starts with
pub fn initial_coin_count(cell: Cell, max_initial_coins: u32) -> u32 {
    let roll = luck(&[cell.i.into(), cell.j.into(), INITIAL_VALUE_TAG.into()]);
    // roll < 1.0, so the product stays below max_initial_coins
    (roll * f64::from(max_initial_coins)).floor() as u32
}
