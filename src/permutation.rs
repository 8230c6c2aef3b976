//! # Box assignments
//!
//! This module provides the [`Permutation`] struct: the box→prisoner
//! assignment drawn at the start of every trial, together with the newtype
//! identifiers used throughout the crate.
//!
//! ## Key Features:
//!
//! - **Identifiers**: [`BoxId`] and [`PrisonerId`] wrap the `1..=n` integer
//!   ranges so that box positions and slip numbers cannot be confused at API
//!   boundaries, even though both ranges are numerically identical.
//! - **Representation**: a `Permutation` is stored by its direct mapping
//!   (`slips[i]` is the prisoner number hidden in box `i + 1`).
//! - **Construction**:
//!   - Identity assignment: `Permutation::identity(n)`.
//!   - From an explicit mapping: `Permutation::from_assignment(vec![...])`,
//!     which rejects anything that is not a bijection on `1..=n`.
//!   - Uniformly at random: `Permutation::random(n, rng)`, the per-trial
//!     entry point. The random source is always passed in by the caller so
//!     runs are reproducible under a fixed seed.
//! - **Lookup**: `p.slip(b)` reads the slip in box `b`; `p.iter()` walks the
//!   whole assignment in box order.
//!
//! The cycle structure of an assignment lives in [`crate::cycles`].

use std::fmt;

use rand::Rng;
use thiserror::Error;

/// A box position, in `1..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxId(pub usize);

impl From<usize> for BoxId {
    fn from(x: usize) -> Self {
        BoxId(x)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A prisoner number, in `1..=n`. Also the number written on a slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrisonerId(pub usize);

impl From<usize> for PrisonerId {
    fn from(x: usize) -> Self {
        PrisonerId(x)
    }
}

impl fmt::Display for PrisonerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from constructing a [`Permutation`].
///
/// A failed bijection check on input we generated ourselves is an internal
/// invariant violation and must be surfaced, never papered over.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermutationError {
    #[error("an assignment needs at least one box")]
    Empty,
    #[error("prisoner number {0} is outside 1..={1}")]
    OutOfRange(usize, usize),
    #[error("prisoner number {0} appears in more than one box")]
    Duplicate(usize),
}

/// A bijective box→prisoner assignment over `1..=n`.
///
/// Built once per trial (or per analysis) and immutable afterwards.
///
/// # Examples
///
/// ```
/// use cellblock::permutation::{BoxId, Permutation, PrisonerId};
///
/// // Box 1 holds slip 2, box 2 holds slip 1, boxes 3 and 4 hold their own.
/// let p = Permutation::from_assignment(vec![2, 1, 3, 4]).unwrap();
/// assert_eq!(p.slip(BoxId(1)), PrisonerId(2));
/// assert_eq!(p.slip(BoxId(3)), PrisonerId(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation {
    slips: Vec<usize>,
}

impl Permutation {
    // --------------------------------------------------------------------------------------------
    // Constructors
    // --------------------------------------------------------------------------------------------

    /// Creates the identity assignment of length `n`: box `i` holds slip `i`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cellblock::permutation::{BoxId, Permutation, PrisonerId};
    /// let p = Permutation::identity(4);
    /// assert_eq!(p.slip(BoxId(3)), PrisonerId(3));
    /// assert!(p.is_identity());
    /// ```
    pub fn identity(n: usize) -> Self {
        Permutation {
            slips: (1..=n).collect(),
        }
    }

    /// Creates an assignment from an explicit mapping vector.
    /// `slips[i]` is the prisoner number hidden in box `i + 1`.
    ///
    /// Rejects anything that is not a bijection on `1..=n`: every prisoner
    /// number must appear in exactly one box.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cellblock::permutation::{Permutation, PermutationError};
    /// assert!(Permutation::from_assignment(vec![2, 3, 1]).is_ok());
    /// assert_eq!(
    ///     Permutation::from_assignment(vec![2, 2, 1]),
    ///     Err(PermutationError::Duplicate(2)),
    /// );
    /// ```
    pub fn from_assignment(slips: Vec<usize>) -> Result<Self, PermutationError> {
        let n = slips.len();
        if n == 0 {
            return Err(PermutationError::Empty);
        }
        let mut seen = vec![false; n];
        for &slip in &slips {
            if slip == 0 || slip > n {
                return Err(PermutationError::OutOfRange(slip, n));
            }
            if std::mem::replace(&mut seen[slip - 1], true) {
                return Err(PermutationError::Duplicate(slip));
            }
        }
        Ok(Permutation { slips })
    }

    /// Draws an assignment uniformly at random over all `n!` bijections.
    ///
    /// For each box in increasing order, one prisoner number is picked
    /// without replacement from the pool of numbers not yet assigned.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cellblock::permutation::Permutation;
    /// use rand::{rngs::SmallRng, SeedableRng};
    ///
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let p = Permutation::random(10, &mut rng).unwrap();
    /// assert_eq!(p.len(), 10);
    /// ```
    pub fn random(n: usize, rng: &mut impl Rng) -> Result<Self, PermutationError> {
        if n == 0 {
            return Err(PermutationError::Empty);
        }
        let mut pool: Vec<usize> = (1..=n).collect();
        let mut slips = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.gen_range(0..pool.len());
            slips.push(pool.swap_remove(idx));
        }
        Ok(Permutation { slips })
    }

    /// Test-only escape hatch: builds an assignment without the bijection
    /// check, so the defensive paths downstream can be exercised.
    #[cfg(test)]
    pub(crate) fn from_raw(slips: Vec<usize>) -> Self {
        Permutation { slips }
    }

    // --------------------------------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------------------------------

    /// The number of boxes (equivalently, prisoners).
    pub fn len(&self) -> usize {
        self.slips.len()
    }

    /// True only for the degenerate zero-box assignment, which the public
    /// constructors never produce.
    pub fn is_empty(&self) -> bool {
        self.slips.is_empty()
    }

    /// Reads the slip hidden in box `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` is outside `1..=n`.
    pub fn slip(&self, b: BoxId) -> PrisonerId {
        PrisonerId(self.slips[b.0 - 1])
    }

    /// Iterates over the full assignment in box order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cellblock::permutation::{BoxId, Permutation, PrisonerId};
    /// let p = Permutation::from_assignment(vec![2, 1]).unwrap();
    /// let pairs: Vec<_> = p.iter().collect();
    /// assert_eq!(pairs, vec![(BoxId(1), PrisonerId(2)), (BoxId(2), PrisonerId(1))]);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = (BoxId, PrisonerId)> + '_ {
        self.slips
            .iter()
            .enumerate()
            .map(|(i, &slip)| (BoxId(i + 1), PrisonerId(slip)))
    }

    /// Iterates over every box position, `1..=n`.
    pub fn boxes(&self) -> impl Iterator<Item = BoxId> {
        (1..=self.slips.len()).map(BoxId)
    }

    /// Checks whether every box holds its own number.
    pub fn is_identity(&self) -> bool {
        self.slips.iter().enumerate().all(|(i, &slip)| slip == i + 1)
    }
}

impl fmt::Display for Permutation {
    /// One-line notation: `[2 1 4 3]` lists the slips in box order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &slip) in self.slips.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{slip}")?;
        }
        write!(f, "]")
    }
}
