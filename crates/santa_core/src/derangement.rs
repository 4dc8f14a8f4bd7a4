//! Derangement generation for gift assignments
//!
//! A derangement is a permutation with no fixed points: every participant
//! gives to exactly one other participant and receives from exactly one.
//!
//! Generation uses rejection sampling over uniformly shuffled permutations,
//! which yields every derangement with equal probability. Sampling succeeds
//! after roughly `e` attempts on average, but the loop is still capped; when
//! the cap is hit the generator falls back to a cyclic shift of a shuffled
//! order by a random non-zero offset so it always terminates.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::{CoreError, Result};

/// Default cap on rejection-sampling attempts before using the fallback.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

/// Tuning for [`DerangementGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Rejection-sampling attempts before the cyclic fallback is used
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// A giver → receiver mapping produced by a single generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing<T: Ord> {
    assignments: BTreeMap<T, T>,
}

impl<T: Ord> Pairing<T> {
    /// The receiver assigned to `giver`, if the giver took part in the run.
    pub fn receiver_of(&self, giver: &T) -> Option<&T> {
        self.assignments.get(giver)
    }

    /// Iterate `(giver, receiver)` pairs ordered by giver.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn givers(&self) -> impl Iterator<Item = &T> {
        self.assignments.keys()
    }

    pub fn receivers(&self) -> impl Iterator<Item = &T> {
        self.assignments.values()
    }

    /// Check that this pairing is a derangement over exactly `participants`:
    /// each participant gives once, receives once, and never to themselves.
    pub fn is_derangement_of(&self, participants: &[T]) -> bool {
        let expected: BTreeSet<&T> = participants.iter().collect();
        let givers: BTreeSet<&T> = self.givers().collect();
        let receivers: BTreeSet<&T> = self.receivers().collect();

        givers == expected
            && receivers == expected
            && receivers.len() == self.len()
            && self.iter().all(|(giver, receiver)| giver != receiver)
    }
}

impl<T: Ord> FromIterator<(T, T)> for Pairing<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        Self {
            assignments: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord> IntoIterator for Pairing<T> {
    type Item = (T, T);
    type IntoIter = std::collections::btree_map::IntoIter<T, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.into_iter()
    }
}

/// Produces uniformly random derangements over a participant set.
#[derive(Debug, Clone, Default)]
pub struct DerangementGenerator {
    config: GeneratorConfig,
}

impl DerangementGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a derangement over `participants` using the thread-local RNG.
    ///
    /// Duplicate ids are collapsed; fewer than two distinct participants fails
    /// with [`CoreError::InsufficientParticipants`].
    pub fn generate<T: Clone + Ord>(&self, participants: &[T]) -> Result<Pairing<T>> {
        self.generate_with_rng(participants, &mut rand::thread_rng())
    }

    /// Generate a derangement driven by the supplied RNG.
    pub fn generate_with_rng<T, R>(&self, participants: &[T], rng: &mut R) -> Result<Pairing<T>>
    where
        T: Clone + Ord,
        R: Rng + ?Sized,
    {
        let givers = distinct(participants);
        let n = givers.len();
        if n < 2 {
            return Err(CoreError::InsufficientParticipants { found: n });
        }

        let mut receivers = givers.clone();
        for attempt in 1..=self.config.max_attempts {
            receivers.shuffle(rng);
            if has_no_fixed_points(&givers, &receivers) {
                debug!(participants = n, attempts = attempt, "sampled derangement");
                return Ok(seal(&givers, givers.iter().cloned().zip(receivers)));
            }
        }

        warn!(
            participants = n,
            attempts = self.config.max_attempts,
            "rejection sampling did not converge, using cyclic fallback"
        );

        let mut order = givers.clone();
        order.shuffle(rng);
        let offset = rng.gen_range(1..n);
        let fallback: Vec<(T, T)> = (0..n)
            .map(|i| (order[i].clone(), order[(i + offset) % n].clone()))
            .collect();

        if fallback.iter().any(|(giver, receiver)| giver == receiver) {
            return Err(CoreError::GenerationRetryExhausted {
                attempts: self.config.max_attempts,
            });
        }

        Ok(seal(&givers, fallback))
    }
}

/// Final postcondition check; a pairing that is not a derangement is a bug
/// and must never reach a caller.
fn seal<T: Ord>(participants: &[T], pairs: impl IntoIterator<Item = (T, T)>) -> Pairing<T> {
    let pairing: Pairing<T> = pairs.into_iter().collect();
    assert!(
        pairing.is_derangement_of(participants),
        "generated pairing is not a derangement over its participants"
    );
    pairing
}

fn has_no_fixed_points<T: PartialEq>(givers: &[T], receivers: &[T]) -> bool {
    givers.iter().zip(receivers).all(|(g, r)| g != r)
}

/// Distinct values, first occurrence order preserved.
fn distinct<T: Clone + Ord>(values: &[T]) -> Vec<T> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}
