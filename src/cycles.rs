//! # Cycle decomposition
//!
//! Every box→prisoner assignment splits the boxes into disjoint cycles:
//! starting anywhere and repeatedly following "open the box, go to the box
//! numbered by its slip" returns to the start after exactly one lap. This
//! module computes that decomposition, which is the whole explanation for
//! the loop strategy's success rate: a trial with budget `k` succeeds iff
//! the longest cycle has length at most `k`.
//!
//! Cycles are identified by their canonical key (the sorted list of member
//! boxes), so the same cycle discovered from two different starting boxes is
//! recognized as one. The first discovery wins; later rediscoveries are
//! skipped. [`decompose`] checks the partition invariant before returning:
//! the cycle lengths must sum to exactly `n`.

use std::fmt;

use bitvec::{bitvec, vec::BitVec};
use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;

use crate::permutation::{BoxId, Permutation};

/// Decomposition failures.
///
/// These indicate a bug in assignment generation or in the walk itself, not
/// a recoverable runtime condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecomposeError {
    #[error("cycle lengths sum to {total}, expected {expected}: boxes are not partitioned")]
    LengthMismatch { total: usize, expected: usize },
}

/// One cycle of an assignment, in traversal order from its discovery start.
///
/// `boxes[i + 1]` is the box numbered by the slip in `boxes[i]`, and the
/// slip in the last box leads back to `boxes[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cycle {
    boxes: Vec<BoxId>,
}

impl Cycle {
    fn new(boxes: Vec<BoxId>) -> Self {
        Cycle { boxes }
    }

    /// The number of boxes on this cycle.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// A cycle always has at least one box.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Whether box `b` lies on this cycle.
    pub fn contains(&self, b: BoxId) -> bool {
        self.boxes.contains(&b)
    }

    /// The member boxes in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.boxes.iter().copied()
    }

    /// The canonical identity of this cycle: its member boxes, sorted.
    ///
    /// Two traversals of the same cycle from different starts share a key.
    pub fn canonical_key(&self) -> Vec<BoxId> {
        self.boxes.iter().copied().sorted().collect()
    }
}

impl fmt::Display for Cycle {
    /// Cycle notation: `(1 5 2)` lists the traversal in order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, b) in self.boxes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b}")?;
        }
        write!(f, ")")
    }
}

/// The disjoint cycles of one assignment, keyed by canonical identity.
///
/// Insertion order is discovery order (lowest start box first); the map is
/// read-only once [`decompose`] returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CycleSet {
    cycles: IndexMap<Vec<BoxId>, Cycle>,
}

impl CycleSet {
    /// Inserts a cycle unless one with the same canonical key is already
    /// present. Returns whether the cycle was new.
    fn insert(&mut self, cycle: Cycle) -> bool {
        let key = cycle.canonical_key();
        if self.cycles.contains_key(&key) {
            return false;
        }
        self.cycles.insert(key, cycle);
        true
    }

    /// The number of distinct cycles.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Iterates over the cycles in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Cycle> {
        self.cycles.values()
    }

    /// The sum of all cycle lengths. Equals `n` for a valid decomposition.
    pub fn total_len(&self) -> usize {
        self.cycles.values().map(Cycle::len).sum()
    }

    /// The length of the longest cycle, or 0 when the set is empty.
    ///
    /// A trial under the loop strategy with budget `k` succeeds exactly when
    /// this is at most `k`.
    pub fn longest_len(&self) -> usize {
        self.cycles.values().map(Cycle::len).max().unwrap_or(0)
    }

    /// The cycle that box `b` lies on, if any.
    pub fn cycle_containing(&self, b: BoxId) -> Option<&Cycle> {
        self.cycles.values().find(|c| c.contains(b))
    }
}

impl fmt::Display for CycleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cycle) in self.cycles.values().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{cycle}")?;
        }
        Ok(())
    }
}

/// Decomposes an assignment into its disjoint cycles.
///
/// For each start box not yet absorbed into a discovered cycle, walks
/// box → slip → next box until the walk closes on the start, recording the
/// traversal. The walk also stops if it runs into an already-absorbed box,
/// which cannot happen for a bijective assignment; the partition check below
/// then reports the breakage instead of looping forever.
///
/// # Errors
///
/// [`DecomposeError::LengthMismatch`] if the distinct cycle lengths do not
/// sum to exactly `n`. That means the input was not a bijection or the walk
/// is broken, and the result would be meaningless.
///
/// # Examples
///
/// ```
/// use cellblock::cycles::decompose;
/// use cellblock::permutation::Permutation;
///
/// let p = Permutation::from_assignment(vec![2, 1, 4, 3]).unwrap();
/// let cycles = decompose(&p).unwrap();
/// assert_eq!(cycles.len(), 2);
/// assert_eq!(cycles.to_string(), "(1 2) (3 4)");
/// ```
pub fn decompose(perm: &Permutation) -> Result<CycleSet, DecomposeError> {
    let n = perm.len();
    let mut absorbed: BitVec = bitvec![0; n];
    let mut set = CycleSet::default();

    for start in perm.boxes() {
        if absorbed[start.0 - 1] {
            continue;
        }
        let mut walk = Vec::new();
        let mut current = start;
        loop {
            absorbed.set(current.0 - 1, true);
            walk.push(current);
            let next = BoxId(perm.slip(current).0);
            if next == start {
                break;
            }
            if absorbed[next.0 - 1] {
                // Walk re-entered a closed cycle without reaching its start:
                // the assignment is not a bijection. Stop here and let the
                // partition check flag it.
                break;
            }
            current = next;
        }
        if !set.insert(Cycle::new(walk)) {
            tracing::debug!(start = start.0, "cycle already found, skipping");
        }
    }

    let total = set.total_len();
    if total != n {
        return Err(DecomposeError::LengthMismatch { total, expected: n });
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{rngs::SmallRng, SeedableRng};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::permutation::Permutation;

    #[test]
    fn two_transpositions_decompose_into_two_pairs() {
        let p = Permutation::from_assignment(vec![2, 1, 4, 3]).unwrap();
        let cycles = decompose(&p).unwrap();

        let keys: Vec<Vec<usize>> = cycles
            .iter()
            .map(|c| c.canonical_key().iter().map(|b| b.0).collect())
            .collect();
        assert_eq!(keys, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn identity_decomposes_into_fixed_points() {
        let p = Permutation::identity(6);
        let cycles = decompose(&p).unwrap();
        assert_eq!(cycles.len(), 6);
        assert!(cycles.iter().all(|c| c.len() == 1));
        assert_eq!(cycles.longest_len(), 1);
    }

    #[test]
    fn single_long_cycle() {
        // 1→2→3→4→5→1
        let p = Permutation::from_assignment(vec![2, 3, 4, 5, 1]).unwrap();
        let cycles = decompose(&p).unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles.longest_len(), 5);
        let traversal: Vec<usize> = cycles.iter().next().unwrap().iter().map(|b| b.0).collect();
        assert_eq!(traversal, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rediscovered_cycle_is_recognized_not_re_added() {
        let mut set = CycleSet::default();
        assert!(set.insert(Cycle::new(vec![BoxId(1), BoxId(3), BoxId(2)])));
        // Same cycle, traversed from a different start.
        assert!(!set.insert(Cycle::new(vec![BoxId(3), BoxId(2), BoxId(1)])));

        assert_eq!(set.len(), 1);
        // First discovery wins: the stored traversal is the original one.
        let traversal: Vec<usize> = set.iter().next().unwrap().iter().map(|b| b.0).collect();
        assert_eq!(traversal, vec![1, 3, 2]);
    }

    #[test]
    fn non_bijective_input_fails_the_partition_check() {
        // Box 1 and box 3 both hold slip 3; slip 2 is missing.
        let p = Permutation::from_raw(vec![3, 1, 3]);
        assert!(matches!(
            decompose(&p),
            Err(DecomposeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn cycle_containing_finds_the_right_cycle() {
        let p = Permutation::from_assignment(vec![2, 1, 4, 3]).unwrap();
        let cycles = decompose(&p).unwrap();
        assert!(cycles.cycle_containing(BoxId(4)).unwrap().contains(BoxId(3)));
        assert!(cycles.cycle_containing(BoxId(1)).unwrap().contains(BoxId(2)));
    }

    proptest! {
        #[test]
        fn cycles_partition_the_boxes(n in 1usize..96, seed in any::<u64>()) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let p = Permutation::random(n, &mut rng).unwrap();
            let cycles = decompose(&p).unwrap();

            prop_assert_eq!(cycles.total_len(), n);
            // Union over all cycles is exactly {1..=n}, no overlaps.
            let mut seen = vec![false; n];
            for cycle in cycles.iter() {
                for b in cycle.iter() {
                    prop_assert!(!seen[b.0 - 1]);
                    seen[b.0 - 1] = true;
                }
            }
            prop_assert!(seen.into_iter().all(|s| s));
        }

        #[test]
        fn each_cycle_closes_on_itself(n in 1usize..64, seed in any::<u64>()) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let p = Permutation::random(n, &mut rng).unwrap();
            let cycles = decompose(&p).unwrap();

            for cycle in cycles.iter() {
                let boxes: Vec<BoxId> = cycle.iter().collect();
                for (i, &b) in boxes.iter().enumerate() {
                    let next = BoxId(p.slip(b).0);
                    prop_assert_eq!(next, boxes[(i + 1) % boxes.len()]);
                }
            }
        }
    }
}
