//! Injectable randomness for tie-breaking.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Source of uniform choices, shared by every request
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Uniform index in `0..len`. `len` is always at least 1.
    fn pick_index(&self, len: usize) -> usize;
}

/// Pick an element uniformly, `None` for an empty slice
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    match items.len() {
        0 => None,
        1 => items.first(),
        len => items.get(random.pick_index(len).min(len - 1)),
    }
}

/// `StdRng` behind a mutex; seed it for reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seeded when `seed` is set, entropy-backed otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(0..len)
    }
}

/// Replays a fixed list of picks (each taken modulo `len`), then picks 0
#[derive(Debug, Default)]
pub struct SequenceRandom {
    picks: Mutex<VecDeque<usize>>,
}

impl SequenceRandom {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn pick_index(&self, len: usize) -> usize {
        let mut picks = self.picks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        picks.pop_front().map_or(0, |pick| pick % len.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::from_seed(42);
        let b = SeededRandom::from_seed(42);
        let picks_a: Vec<_> = (0..20).map(|_| a.pick_index(7)).collect();
        let picks_b: Vec<_> = (0..20).map(|_| b.pick_index(7)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|&i| i < 7));
    }

    #[test]
    fn test_seeded_random_covers_range() {
        let random = SeededRandom::from_seed(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[random.pick_index(3)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_sequence_random_wraps_and_falls_back() {
        let random = SequenceRandom::new([4, 1]);
        assert_eq!(random.pick_index(3), 1);
        assert_eq!(random.pick_index(3), 1);
        assert_eq!(random.pick_index(3), 0);
    }

    #[test]
    fn test_choose() {
        let random = SequenceRandom::new([2]);
        assert_eq!(choose::<u8>(&random, &[]), None);
        assert_eq!(choose(&random, &["only"]), Some(&"only"));
        assert_eq!(choose(&random, &["a", "b", "c"]), Some(&"c"));
    }
}
