//! Chain abstractions and the lockstep runner shared by the samplers.
//!
//! All chains advance one iteration at a time: within an iteration every chain is
//! stepped in parallel, and the next iteration only starts once the whole row of
//! states has been recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::error::{McmcError, Result};

pub trait MarkovChain<S> {
    /// Does one iteration of the chain, returning the new current state.
    fn step(&mut self) -> &S;

    /// Get the current state without stepping.
    fn current_state(&self) -> &S;
}

/// A trait for "anything that owns multiple MarkovChains".
/// - `S` is the state type of a single chain (e.g. a `usize` state index).
/// - `Chain` is the MarkovChain type stored by this struct.
pub trait HasChains<S> {
    type Chain: MarkovChain<S> + Send;

    /// Returns a mutable reference to the vector of chains.
    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

/// A cloneable flag checked by [`ChainRunner`] between iterations.
///
/// ```rust
/// use discrete_mh::core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Advances every chain `n_steps` times and records the state of all chains after each
/// step as one row of the returned `n_steps × n_chains` matrix.
pub fn run_lockstep<S, C>(
    chains: &mut [C],
    n_steps: usize,
    pb: Option<&ProgressBar>,
    token: Option<&CancellationToken>,
) -> Result<Array2<S>>
where
    S: Copy + Default + Send,
    C: MarkovChain<S> + Send,
{
    if chains.is_empty() {
        return Err(McmcError::InvalidConfig("at least one chain is required"));
    }
    if n_steps == 0 {
        return Err(McmcError::InvalidConfig("at least one iteration is required"));
    }
    debug!(n_chains = chains.len(), n_steps, "running chains in lockstep");

    let mut out = Array2::<S>::default((n_steps, chains.len()));
    for k in 0..n_steps {
        if token.is_some_and(CancellationToken::is_cancelled) {
            warn!(iteration = k, "run cancelled");
            return Err(McmcError::Cancelled { iteration: k });
        }
        let row: Vec<S> = chains.par_iter_mut().map(|chain| *chain.step()).collect();
        out.row_mut(k).assign(&Array1::from(row));
        trace!(iteration = k, "iteration complete");
        if let Some(pb) = pb {
            pb.inc(1);
        }
    }
    Ok(out)
}

pub trait ChainRunner<S>: HasChains<S>
where
    S: Copy + Default + Send,
{
    /// Runs all chains for `n_steps` iterations and returns the `n_steps × n_chains` state history.
    fn run(&mut self, n_steps: usize) -> Result<Array2<S>> {
        run_lockstep(self.chains_mut(), n_steps, None, None)
    }

    /// Same as [`ChainRunner::run`], drawing a progress bar over the iterations.
    fn run_progress(&mut self, n_steps: usize) -> Result<Array2<S>> {
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        let pb = ProgressBar::new(n_steps as u64);
        pb.set_prefix("Iterations");
        pb.set_style(pb_style);

        let out = run_lockstep(self.chains_mut(), n_steps, Some(&pb), None);
        pb.finish_with_message("Done!");
        out
    }

    /// Same as [`ChainRunner::run`], but stops with [`McmcError::Cancelled`] as soon as
    /// `token` is cancelled. The token is checked before every iteration.
    ///
    /// Iterations completed before the cancellation are not undone: the chains keep
    /// their advanced states and counters, and the next run continues from there.
    /// Reseed the owner (e.g. `ChainSimulator::set_seed`) to start over.
    fn run_cancellable(&mut self, n_steps: usize, token: &CancellationToken) -> Result<Array2<S>> {
        run_lockstep(self.chains_mut(), n_steps, None, Some(token))
    }
}

impl<S: Copy + Default + Send, T: HasChains<S>> ChainRunner<S> for T {}
