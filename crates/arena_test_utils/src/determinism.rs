//! Run-twice-and-compare helpers.
//!
//! The arena core promises identical state for identical inputs: it uses
//! fixed-point math only, visits entities in id order and draws no random
//! numbers. These helpers replay a setup several times and compare
//! [`Simulation::state_hash`] (or any caller-supplied hash) across runs.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use arena_core::math::Fixed;
use arena_core::simulation::Simulation;

/// Outcome of replaying one setup several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Every run ended with the same hash.
    pub is_deterministic: bool,
    /// Final hash of each run, in run order.
    pub hashes: Vec<u64>,
    /// Steps taken per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Distinct final hashes, sorted.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let unique: BTreeSet<u64> = self.hashes.iter().copied().collect();
        unique.into_iter().collect()
    }

    /// Fail the calling test when the runs disagree.
    ///
    /// # Panics
    ///
    /// Panics with every run's hash when the runs disagree.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "arena runs are non-deterministic after {} ticks: {} distinct hashes in {:?}",
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Build a fresh state with `setup`, advance it `ticks` times with `step`,
/// and hash the result; repeat `runs` times.
///
/// # Example
///
/// ```
/// use arena_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 10, || 0u64, |n| *n += 2, |n| *n);
/// result.assert_deterministic();
/// assert_eq!(result.hashes, vec![20, 20, 20]);
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|pair| pair[0] == pair[1]),
        hashes,
        ticks,
    }
}

/// Two runs of `setup_fn` ticked `num_ticks` times end in the same state.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| sim.tick(dt),
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Step two runs side by side and report the first tick whose hashes differ.
///
/// Tick 0 is the freshly built state.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut left = setup_fn();
    let mut right = setup_fn();

    (0..=num_ticks).find(|&tick| {
        if tick > 0 {
            left.tick(dt);
            right.tick(dt);
        }
        left.state_hash() != right.state_hash()
    })
}

/// Hash any value with the std hasher, for ad hoc state comparisons.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
