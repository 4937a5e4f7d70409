//! Short ID - compact, URL-safe identifier tokens
//!
//! Tokens are 14 characters over `0-9A-Za-z_-`. Each one packs 84 bits:
//!
//! | bits | content                                   |
//! |------|-------------------------------------------|
//! | 41   | milliseconds since 2024-01-01 UTC         |
//! | 5    | worker id                                 |
//! | 16   | per-generator sequence (atomic increment) |
//! | 22   | thread-local random bits                  |
//!
//! Two tokens from the same generator can only collide when they are produced
//! in the same millisecond, 65536 sequence steps apart, with identical random
//! bits. Generation never takes a lock.
//!
//! ```rust
//! let id = short_id::generate_short_id();
//! assert_eq!(id.len(), short_id::SHORT_ID_LEN);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Length of every generated token
pub const SHORT_ID_LEN: usize = 14;

/// Number of distinct worker ids
pub const MAX_WORKERS: u8 = 32;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";

/// 2024-01-01T00:00:00Z
const EPOCH_MS: u64 = 1_704_067_200_000;

const TIME_BITS: u32 = 41;
const WORKER_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 16;
const RANDOM_BITS: u32 = 22;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortIdError {
    #[error("worker id {0} is out of range (must be below 32)")]
    InvalidWorker(u8),
}

/// Lock-free short id generator
#[derive(Debug)]
pub struct ShortIdGenerator {
    worker: u8,
    sequence: AtomicU64,
}

static DEFAULT_GENERATOR: ShortIdGenerator = ShortIdGenerator::default_worker();

/// Generate a token with the process-wide default generator (worker 0)
pub fn generate_short_id() -> String {
    DEFAULT_GENERATOR.generate()
}

impl ShortIdGenerator {
    /// Create a generator for a worker id below [`MAX_WORKERS`]
    pub fn new(worker: u8) -> Result<Self, ShortIdError> {
        if worker >= MAX_WORKERS {
            return Err(ShortIdError::InvalidWorker(worker));
        }
        Ok(Self {
            worker,
            sequence: AtomicU64::new(0),
        })
    }

    const fn default_worker() -> Self {
        Self {
            worker: 0,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn worker(&self) -> u8 {
        self.worker
    }

    pub fn generate(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.compose(now_millis(), sequence, rand::random::<u32>())
    }

    fn compose(&self, millis: u64, sequence: u64, random: u32) -> String {
        let time = u128::from(millis & mask(TIME_BITS));
        let worker = u128::from(u64::from(self.worker) & mask(WORKER_BITS));
        let sequence = u128::from(sequence & mask(SEQUENCE_BITS));
        let random = u128::from(u64::from(random) & mask(RANDOM_BITS));

        let packed = (time << (WORKER_BITS + SEQUENCE_BITS + RANDOM_BITS))
            | (worker << (SEQUENCE_BITS + RANDOM_BITS))
            | (sequence << RANDOM_BITS)
            | random;

        encode(packed)
    }
}

impl Default for ShortIdGenerator {
    fn default() -> Self {
        Self::default_worker()
    }
}

fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

fn now_millis() -> u64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(since_unix)
        .unwrap_or(u64::MAX)
        .saturating_sub(EPOCH_MS)
}

fn encode(packed: u128) -> String {
    (0..SHORT_ID_LEN)
        .rev()
        .map(|i| char::from(ALPHABET[((packed >> (6 * i)) & 0x3f) as usize]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn generates_non_empty_tokens() {
        let id = generate_short_id();
        assert!(!id.is_empty());
        assert_eq!(id.len(), SHORT_ID_LEN);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn layout_fits_token_length() {
        assert_eq!(
            (TIME_BITS + WORKER_BITS + SEQUENCE_BITS + RANDOM_BITS) as usize,
            SHORT_ID_LEN * 6
        );
    }

    #[test]
    fn compose_is_deterministic_for_fixed_inputs() {
        let generator = ShortIdGenerator::new(3).unwrap();
        let a = generator.compose(1_000, 7, 42);
        let b = generator.compose(1_000, 7, 42);
        assert_eq!(a, b);

        assert_ne!(a, generator.compose(1_000, 8, 42));
        assert_ne!(a, generator.compose(1_001, 7, 42));
        assert_ne!(a, ShortIdGenerator::new(4).unwrap().compose(1_000, 7, 42));
    }

    #[test]
    fn zero_inputs_encode_to_zeros() {
        let generator = ShortIdGenerator::default();
        assert_eq!(generator.compose(0, 0, 0), "0".repeat(SHORT_ID_LEN));
    }

    #[test]
    fn rejects_out_of_range_worker() {
        assert_eq!(
            ShortIdGenerator::new(MAX_WORKERS).unwrap_err(),
            ShortIdError::InvalidWorker(MAX_WORKERS)
        );
        assert_eq!(ShortIdGenerator::new(31).unwrap().worker(), 31);
    }

    #[test]
    fn concurrent_generation_has_no_duplicates() {
        const THREADS: usize = 50;
        const TOTAL: usize = 10_000;

        let seen = Mutex::new(HashSet::with_capacity(TOTAL));
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    let ids: Vec<String> =
                        (0..TOTAL / THREADS).map(|_| generate_short_id()).collect();
                    seen.lock().unwrap().extend(ids);
                });
            }
        });

        assert_eq!(seen.into_inner().unwrap().len(), TOTAL);
    }
}
