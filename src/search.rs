//! # Search strategies
//!
//! A prisoner may open at most `budget` boxes and wins by finding the box
//! that holds their own number. Two strategies are implemented:
//!
//! - [`Strategy::RandomIndependent`]: open `budget` distinct boxes chosen
//!   uniformly at random. Each prisoner's chance is `budget / n`,
//!   independent of everyone else, so a whole trial succeeds with
//!   probability `(budget / n)^n`.
//! - [`Strategy::CycleFollowing`]: open the box of your own number, then
//!   keep following the slip you just read. The walk stays on the cycle
//!   through your own box and reaches your number after exactly
//!   `cycle length` opens, so the trial succeeds iff no cycle is longer
//!   than the budget.
//!
//! Searches never fail with an error: given a valid assignment they always
//! terminate with a boolean, since each box is opened at most once.

use std::fmt;

use bitvec::{bitvec, slice::BitSlice, vec::BitVec};
use rand::Rng;

use crate::permutation::{BoxId, Permutation, PrisonerId};

/// How a prisoner picks which boxes to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// `budget` distinct boxes, uniformly at random.
    RandomIndependent,
    /// Start at your own number and follow the slips.
    CycleFollowing,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::RandomIndependent => write!(f, "random"),
            Strategy::CycleFollowing => write!(f, "loop"),
        }
    }
}

/// Runs one prisoner's search and reports whether they found their number.
///
/// Opens at most `budget` boxes (capped at the number of boxes; callers that
/// want a hard rejection of oversized budgets validate through
/// [`crate::experiment::ExperimentConfig`]). The random source drives box
/// selection for [`Strategy::RandomIndependent`] and is untouched on the
/// happy path of [`Strategy::CycleFollowing`].
///
/// # Examples
///
/// ```
/// use cellblock::permutation::{Permutation, PrisonerId};
/// use cellblock::search::{search, Strategy};
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let p = Permutation::from_assignment(vec![2, 1, 4, 3]).unwrap();
/// let mut rng = SmallRng::seed_from_u64(1);
/// // Prisoner 1 sits on a 2-cycle: two opens always suffice.
/// assert!(search(&p, PrisonerId(1), 2, Strategy::CycleFollowing, &mut rng));
/// assert!(!search(&p, PrisonerId(1), 1, Strategy::CycleFollowing, &mut rng));
/// ```
pub fn search(
    perm: &Permutation,
    agent: PrisonerId,
    budget: usize,
    strategy: Strategy,
    rng: &mut impl Rng,
) -> bool {
    match strategy {
        Strategy::RandomIndependent => open_at_random(perm, agent, budget, rng),
        Strategy::CycleFollowing => follow_slips(perm, agent, budget, rng),
    }
}

/// Opens `budget` distinct boxes drawn uniformly without replacement.
fn open_at_random(
    perm: &Permutation,
    agent: PrisonerId,
    budget: usize,
    rng: &mut impl Rng,
) -> bool {
    let n = perm.len();
    rand::seq::index::sample(rng, n, budget.min(n))
        .into_iter()
        .any(|i| perm.slip(BoxId(i + 1)) == agent)
}

/// Starts at the box of the agent's own number and follows the slips.
///
/// Tracks unopened boxes in a bitmap; the budget is spent one unit per box
/// opened. If the walk ever lands on an already-opened box (impossible while
/// traversing the agent's own cycle of a bijective assignment, but kept as a
/// safety net for broken input) it restarts from a random unopened box
/// instead of aborting.
fn follow_slips(perm: &Permutation, agent: PrisonerId, budget: usize, rng: &mut impl Rng) -> bool {
    let n = perm.len();
    let mut unopened: BitVec = bitvec![1; n];
    let mut current = BoxId(agent.0);
    let mut left = budget.min(n);

    while left > 0 {
        if !unopened[current.0 - 1] {
            let Some(fresh) = pick_unopened(&unopened, rng) else {
                return false;
            };
            tracing::trace!(
                prisoner = agent.0,
                reopened = current.0,
                restart = fresh.0,
                "walk hit an opened box, restarting"
            );
            current = fresh;
        }
        unopened.set(current.0 - 1, false);
        left -= 1;

        let slip = perm.slip(current);
        if slip == agent {
            return true;
        }
        current = BoxId(slip.0);
    }
    false
}

/// Picks a uniformly random still-unopened box, if any remain.
fn pick_unopened(unopened: &BitSlice, rng: &mut impl Rng) -> Option<BoxId> {
    let remaining = unopened.count_ones();
    if remaining == 0 {
        return None;
    }
    let k = rng.gen_range(0..remaining);
    unopened.iter_ones().nth(k).map(|i| BoxId(i + 1))
}
