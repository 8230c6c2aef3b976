//! # Trials and experiments
//!
//! One trial: draw a fresh assignment, let every prisoner search with the
//! shared budget, succeed iff all of them do. An experiment repeats that and
//! aggregates the empirical success rate. [`analyze_cycles`] instead skips
//! the searches entirely and hands back the cycle structure of one fresh
//! assignment, for callers that want to display or study it.
//!
//! The functions here expose raw counts and mappings only; rendering is the
//! caller's job.

use rand::Rng;
use thiserror::Error;

use crate::cycles::{decompose, CycleSet, DecomposeError};
use crate::permutation::{Permutation, PermutationError, PrisonerId};
use crate::search::{search, Strategy};

/// Rejected configurations, caught before any trial runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one prisoner is required")]
    NoPrisoners,
    #[error("at least one trial is required")]
    NoTrials,
    #[error("prisoners must be allowed to open at least one box")]
    ZeroBudget,
    #[error("budget {budget} exceeds the {boxes} available boxes")]
    BudgetExceedsBoxes { budget: usize, boxes: usize },
}

/// Anything a trial or experiment can fail with.
///
/// Everything past configuration is an internal invariant violation: the
/// generator produced a non-bijection or the decomposition lost boxes.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("assignment generation failed: {0}")]
    Permutation(#[from] PermutationError),
    #[error("cycle decomposition failed: {0}")]
    Decompose(#[from] DecomposeError),
}

/// Parameters shared by every trial of an experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    /// Number of prisoners (and boxes).
    pub prisoners: usize,
    /// Number of independent trials to run.
    pub trials: usize,
    /// Boxes each prisoner may open.
    pub budget: usize,
    /// How prisoners pick boxes.
    pub strategy: Strategy,
}

impl ExperimentConfig {
    /// Builds a configuration with the conventional budget of half the
    /// boxes (integer division).
    ///
    /// # Examples
    ///
    /// ```
    /// use cellblock::experiment::ExperimentConfig;
    /// use cellblock::search::Strategy;
    ///
    /// let config = ExperimentConfig::new(100, 10_000, Strategy::CycleFollowing);
    /// assert_eq!(config.budget, 50);
    /// ```
    pub fn new(prisoners: usize, trials: usize, strategy: Strategy) -> Self {
        ExperimentConfig {
            prisoners,
            trials,
            budget: prisoners / 2,
            strategy,
        }
    }

    /// Replaces the default budget.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Rejects degenerate configurations before anything runs.
    ///
    /// A budget above the number of boxes is refused outright: every box
    /// would be opened, so exhaustion could never legitimately fail and the
    /// experiment would measure nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prisoners == 0 {
            return Err(ConfigError::NoPrisoners);
        }
        if self.trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.budget == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.budget > self.prisoners {
            return Err(ConfigError::BudgetExceedsBoxes {
                budget: self.budget,
                boxes: self.prisoners,
            });
        }
        Ok(())
    }
}

/// Aggregate result of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentOutcome {
    /// Trials in which every prisoner found their number.
    pub successes: usize,
    /// Total trials run. Never zero: [`ExperimentConfig::validate`] rejects
    /// empty experiments.
    pub trials: usize,
}

impl ExperimentOutcome {
    /// Fraction of trials in which every prisoner succeeded.
    pub fn success_rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}

/// Runs a single trial: one fresh assignment, every prisoner searches.
///
/// Succeeds iff all prisoners find their number. The loop short-circuits on
/// the first failure, since one lost prisoner already decides the trial.
pub fn run_trial(config: &ExperimentConfig, rng: &mut impl Rng) -> Result<bool, ExperimentError> {
    config.validate()?;
    trial(config, rng)
}

fn trial(config: &ExperimentConfig, rng: &mut impl Rng) -> Result<bool, ExperimentError> {
    let perm = Permutation::random(config.prisoners, rng)?;
    for agent in 1..=config.prisoners {
        let agent = PrisonerId(agent);
        if !search(&perm, agent, config.budget, config.strategy, rng) {
            tracing::debug!(prisoner = agent.0, "prisoner failed to find their number");
            return Ok(false);
        }
    }
    tracing::trace!("all prisoners found their number");
    Ok(true)
}

/// Runs the configured number of trials and aggregates the success count.
///
/// # Examples
///
/// ```
/// use cellblock::experiment::{run_experiment, ExperimentConfig};
/// use cellblock::search::Strategy;
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let config = ExperimentConfig::new(10, 200, Strategy::CycleFollowing);
/// let mut rng = SmallRng::seed_from_u64(3);
/// let outcome = run_experiment(&config, &mut rng).unwrap();
/// assert_eq!(outcome.trials, 200);
/// assert!(outcome.success_rate() <= 1.0);
/// ```
pub fn run_experiment(
    config: &ExperimentConfig,
    rng: &mut impl Rng,
) -> Result<ExperimentOutcome, ExperimentError> {
    config.validate()?;
    let mut successes = 0;
    for _ in 0..config.trials {
        if trial(config, rng)? {
            successes += 1;
        }
    }
    tracing::debug!(
        successes,
        trials = config.trials,
        strategy = %config.strategy,
        "experiment finished"
    );
    Ok(ExperimentOutcome {
        successes,
        trials: config.trials,
    })
}

/// Draws one fresh assignment and returns it with its cycle decomposition,
/// without running any searches.
pub fn analyze_cycles(
    n: usize,
    rng: &mut impl Rng,
) -> Result<(Permutation, CycleSet), ExperimentError> {
    if n == 0 {
        return Err(ConfigError::NoPrisoners.into());
    }
    let perm = Permutation::random(n, rng)?;
    let cycles = decompose(&perm)?;
    Ok((perm, cycles))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    #[test]
    fn degenerate_configurations_are_rejected() {
        let base = ExperimentConfig::new(10, 100, Strategy::CycleFollowing);
        assert_eq!(base.validate(), Ok(()));

        let mut no_prisoners = base.clone();
        no_prisoners.prisoners = 0;
        assert_eq!(no_prisoners.validate(), Err(ConfigError::NoPrisoners));

        let mut no_trials = base.clone();
        no_trials.trials = 0;
        assert_eq!(no_trials.validate(), Err(ConfigError::NoTrials));

        assert_eq!(
            base.clone().with_budget(0).validate(),
            Err(ConfigError::ZeroBudget)
        );
        assert_eq!(
            base.with_budget(11).validate(),
            Err(ConfigError::BudgetExceedsBoxes {
                budget: 11,
                boxes: 10
            })
        );
    }

    #[test]
    fn zero_trials_never_divides_by_zero() {
        let config = ExperimentConfig::new(10, 0, Strategy::CycleFollowing);
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            run_experiment(&config, &mut rng),
            Err(ExperimentError::Config(ConfigError::NoTrials))
        ));
    }

    #[test]
    fn default_budget_is_half_the_boxes() {
        assert_eq!(ExperimentConfig::new(100, 1, Strategy::CycleFollowing).budget, 50);
        assert_eq!(ExperimentConfig::new(7, 1, Strategy::CycleFollowing).budget, 3);
    }

    #[test]
    fn full_budget_trials_always_succeed() {
        let config = ExperimentConfig::new(8, 50, Strategy::CycleFollowing).with_budget(8);
        let mut rng = SmallRng::seed_from_u64(5);
        let outcome = run_experiment(&config, &mut rng).unwrap();
        assert_eq!(outcome.successes, outcome.trials);
    }

    #[test]
    fn loop_strategy_converges_to_the_known_limit() {
        // For n prisoners with budget n/2, the trial success probability
        // tends to 1 - ln 2 ≈ 0.3118 as n grows. At n = 100 the exact value
        // is within a percent of the limit, so a seeded run of 10k trials
        // lands close to it.
        let config = ExperimentConfig::new(100, 10_000, Strategy::CycleFollowing);
        let mut rng = SmallRng::seed_from_u64(100);
        let outcome = run_experiment(&config, &mut rng).unwrap();
        let rate = outcome.success_rate();
        assert!((rate - 0.3118).abs() < 0.025, "observed success rate {rate}");
    }

    #[test]
    fn random_strategy_rarely_wins_a_whole_trial() {
        // Each prisoner wins with probability 1/2 independently, so a full
        // 10-prisoner trial succeeds with probability 2^-10.
        let config = ExperimentConfig::new(10, 1_000, Strategy::RandomIndependent);
        let mut rng = SmallRng::seed_from_u64(11);
        let outcome = run_experiment(&config, &mut rng).unwrap();
        assert!(outcome.success_rate() < 0.02, "rate {}", outcome.success_rate());
    }

    #[test]
    fn analyze_cycles_partitions_the_boxes() {
        let mut rng = SmallRng::seed_from_u64(21);
        let (perm, cycles) = analyze_cycles(32, &mut rng).unwrap();
        assert_eq!(perm.len(), 32);
        assert_eq!(cycles.total_len(), 32);
        assert!(cycles.longest_len() >= 1);
    }

    #[test]
    fn analyze_cycles_rejects_zero_prisoners() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            analyze_cycles(0, &mut rng),
            Err(ExperimentError::Config(ConfigError::NoPrisoners))
        ));
    }
}
