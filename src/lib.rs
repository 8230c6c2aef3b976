//! # Cellblock
//!
//! Cellblock is a Rust library for simulating the 100 prisoners problem:
//! each of `n` prisoners must find the box holding their own number while
//! opening at most a fixed budget of boxes.
//!
//! The crate provides uniform random box assignments, the two classic
//! search strategies (independent-random and cycle-following), Monte Carlo
//! experiments over many trials, and the cycle decomposition that explains
//! why the cycle-following strategy succeeds about `1 - ln 2 ≈ 31%` of the
//! time where independent guessing is hopeless.
//!
//! All randomness flows through caller-supplied [`rand::Rng`] handles, so
//! every simulation is reproducible under a fixed seed.

pub mod cycles;
pub mod experiment;
pub mod permutation;
pub mod search;
