//! # Discrete MH
//!
//! A compact Rust library for **Metropolis–Hastings** sampling of a discrete random
//! variable with an unnormalized target mass distribution, running many independent
//! chains in lockstep.
//!
//! The crate is organized bottom-up:
//!
//! 1. [`acceptance`]: the acceptance-probability matrix `α` for a target `π` and a
//!    proposal matrix `Q`.
//! 2. [`stationary`]: the transition matrix the sampler implies, and checks that `π`
//!    is stationary under it.
//! 3. [`simulator`]: the multi-chain simulation producing a `K × n` matrix of states.
//!
//! [`stats`] compares a run's visit frequencies with the target, and `io::csv` (behind
//! the `csv` feature) writes results to disk.
//!
//! ## Example
//!
//! ```rust
//! use discrete_mh::simulator::simulate_with_seed;
//! use discrete_mh::stats::TargetComparison;
//! use ndarray::arr1;
//!
//! let pi = [15.0, 5.0, 1.0, 3.0, 6.0, 0.05, 18.0, 9.0, 1.0, 2.0];
//!
//! // 5000 chains, 20 iterations, seeded for reproducibility.
//! let states = simulate_with_seed(5_000, &pi, 20, 42).unwrap();
//! assert_eq!(states.dim(), (20, 5_000));
//!
//! // Compare the last 10 iterations with the target.
//! let cmp = TargetComparison::new(states.view(), arr1(&pi).view(), 10).unwrap();
//! assert!(cmp.spearman.unwrap() > 0.8);
//! ```
//!
//! ## Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber; the `demo`
//! binary shows one way to do that.

pub mod acceptance;
pub mod core;
pub mod distributions;
pub mod error;
pub mod io;
pub mod simulator;
pub mod stationary;
pub mod stats;
