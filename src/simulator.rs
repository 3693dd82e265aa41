/*!
# Discrete Metropolis–Hastings Simulator

Runs `n` independent Metropolis–Hastings chains over the states `0..m` of a discrete
target and records the state of every chain after every iteration.

Each chain starts in a state drawn uniformly from `0..m` (not from the target; the
chain is expected to forget its start). One iteration of a chain in state `i`:

1. proposes `y` from row `i` of the proposal matrix,
2. draws `u ~ Uniform[0, 1)` and moves to `y` if `u < α[i, y]`, else stays at `i`.

The acceptance matrix `α` is computed once when the simulator is built and shared
read-only by all chains. Every chain owns its random number generator, seeded with
`seed + chain_index`, so a seeded run gives the same result on any number of threads.

## Example

```rust
use discrete_mh::core::ChainRunner;
use discrete_mh::distributions::TargetWeights;
use discrete_mh::simulator::ChainSimulator;

let target = TargetWeights::new(vec![1.0, 2.0, 7.0]).unwrap();
let mut sim = ChainSimulator::uniform(target, 100).unwrap().set_seed(42);

// 20 iterations of 100 chains.
let states = sim.run(20).unwrap();
assert_eq!(states.dim(), (20, 100));
assert!(states.iter().all(|&s| s < 3));
```
*/

use std::sync::Arc;

use ndarray::{s, Array2};
use num_traits::Float;
use rand::prelude::*;
use rand_distr::Uniform;
use tracing::debug;

use crate::acceptance::AcceptanceMatrix;
use crate::core::{CancellationToken, ChainRunner, HasChains, MarkovChain};
use crate::distributions::{Categorical, ProposalMatrix, TargetWeights};
use crate::error::{McmcError, Result};
use crate::stats::RunStats;

/// Number of iterations used when none is given.
pub const DEFAULT_ITERATIONS: usize = 20;

/// Shape and seeding of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of independent chains `n`.
    pub n_chains: usize,
    /// Number of iterations `K`, i.e. rows of the returned state matrix.
    pub n_iterations: usize,
    /// Leading rows dropped by [`run_config`] and ignored when summarizing a run.
    pub discard: usize,
    /// Global seed; `None` draws one from the thread's entropy source.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_chains: 5_000,
            n_iterations: DEFAULT_ITERATIONS,
            discard: 0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns [`McmcError::InvalidConfig`] if there are no chains, no iterations,
    /// or nothing left after discarding.
    pub fn validate(&self) -> Result<()> {
        if self.n_chains == 0 {
            return Err(McmcError::InvalidConfig("n_chains must be positive"));
        }
        if self.n_iterations == 0 {
            return Err(McmcError::InvalidConfig("n_iterations must be positive"));
        }
        if self.discard >= self.n_iterations {
            return Err(McmcError::InvalidConfig(
                "discard must be smaller than n_iterations",
            ));
        }
        Ok(())
    }
}

/// A single Metropolis–Hastings chain over the states `0..m`.
///
/// The acceptance matrix and the per-row proposal distributions are shared with the
/// other chains of the same simulator.
#[derive(Debug, Clone)]
pub struct DiscreteMHChain<T: Float> {
    acceptance: Arc<AcceptanceMatrix<T>>,
    proposal: Arc<Vec<Categorical<T>>>,
    /// The current state of the chain.
    pub current_state: usize,
    /// The chain-specific random seed.
    pub seed: u64,
    /// The random number generator for this chain.
    pub rng: SmallRng,
    /// Iterations performed so far.
    pub n_steps: u64,
    /// Iterations whose acceptance test passed.
    pub n_accepted: u64,
}

impl<T> DiscreteMHChain<T>
where
    T: Float,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /// Creates a chain seeded with `seed`, starting from a uniformly drawn state.
    pub fn new(
        acceptance: Arc<AcceptanceMatrix<T>>,
        proposal: Arc<Vec<Categorical<T>>>,
        seed: u64,
    ) -> Self {
        let mut chain = Self {
            acceptance,
            proposal,
            current_state: 0,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            n_steps: 0,
            n_accepted: 0,
        };
        chain.reseed(seed);
        chain
    }

    /// Resets the generator to `seed` and redraws the starting state from it.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self.current_state = Uniform::new(0, self.proposal.len()).sample(&mut self.rng);
        self.n_steps = 0;
        self.n_accepted = 0;
    }

    /// Number of states `m`.
    pub fn n_states(&self) -> usize {
        self.proposal.len()
    }
}

impl<T> MarkovChain<usize> for DiscreteMHChain<T>
where
    T: Float,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /// Proposes a candidate from the current state's proposal row and accepts it with
    /// probability `α[current, candidate]`.
    fn step(&mut self) -> &usize {
        let from = self.current_state;
        let candidate = self.proposal[from].sample(&mut self.rng);
        let u: T = self.rng.gen();
        if u < self.acceptance.get(from, candidate) {
            self.current_state = candidate;
            self.n_accepted += 1;
        }
        self.n_steps += 1;
        &self.current_state
    }

    fn current_state(&self) -> &usize {
        &self.current_state
    }
}

/**
Runs many [`DiscreteMHChain`]s in lockstep.

Construction validates the target and proposal, computes the acceptance matrix and
prepares one categorical distribution per proposal row. Any invalid input is reported
at this point, before a single chain is stepped.

Use [`ChainRunner::run`], [`ChainRunner::run_progress`] or
[`ChainRunner::run_cancellable`] to obtain the `K × n` matrix of states.
*/
#[derive(Debug, Clone)]
pub struct ChainSimulator<T: Float> {
    /// The target weights.
    pub target: TargetWeights<T>,
    /// The proposal matrix.
    pub proposal: ProposalMatrix<T>,
    /// Acceptance probabilities, shared with every chain.
    pub acceptance: Arc<AcceptanceMatrix<T>>,
    /// The independent chains.
    pub chains: Vec<DiscreteMHChain<T>>,
    /// The global random seed.
    pub seed: u64,
}

impl<T> ChainSimulator<T>
where
    T: Float + Send + Sync,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /**
    Creates a simulator with `n_chains` chains for `target` and `proposal`.

    # Errors

    - [`McmcError::InvalidConfig`] if `n_chains` is zero.
    - Any validation error of [`AcceptanceMatrix::new`].
    - [`McmcError::InvalidDistribution`] if a proposal row has no positive mass.
    - [`McmcError::NotRowStochastic`] if a proposal row does not sum to one.

    # Examples

    ```rust
    use discrete_mh::distributions::{ProposalMatrix, TargetWeights};
    use discrete_mh::simulator::ChainSimulator;
    use ndarray::arr2;

    let target = TargetWeights::new(vec![1.0, 4.0]).unwrap();
    let proposal = ProposalMatrix::new(arr2(&[[0.3, 0.7], [0.7, 0.3]])).unwrap();
    let sim = ChainSimulator::new(target, proposal, 8).unwrap().set_seed(1);
    assert_eq!(sim.chains.len(), 8);
    assert_eq!(sim.chains[3].seed, 4);
    ```
    */
    pub fn new(
        target: TargetWeights<T>,
        proposal: ProposalMatrix<T>,
        n_chains: usize,
    ) -> Result<Self> {
        if n_chains == 0 {
            return Err(McmcError::InvalidConfig("n_chains must be positive"));
        }
        let acceptance = Arc::new(AcceptanceMatrix::new(&target, &proposal)?);
        let rows = Arc::new(proposal.row_distributions()?);
        let seed = thread_rng().gen::<u64>();
        let chains = (0..n_chains)
            .map(|i| {
                DiscreteMHChain::new(
                    Arc::clone(&acceptance),
                    Arc::clone(&rows),
                    seed.wrapping_add(i as u64),
                )
            })
            .collect();
        debug!(
            n_states = target.len(),
            n_chains, seed, "built discrete Metropolis-Hastings simulator"
        );

        Ok(Self {
            target,
            proposal,
            acceptance,
            chains,
            seed,
        })
    }

    /// Creates a simulator whose proposal picks each of the `m` states with probability `1/m`.
    pub fn uniform(target: TargetWeights<T>, n_chains: usize) -> Result<Self> {
        let proposal = ProposalMatrix::uniform(target.len());
        Self::new(target, proposal, n_chains)
    }

    /**
    Sets a new global seed and updates the seed for each chain accordingly.

    Chain `i` is reseeded with `seed + i` and draws a fresh starting state from its
    new generator.
    */
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        for (i, chain) in self.chains.iter_mut().enumerate() {
            chain.reseed(seed.wrapping_add(i as u64));
        }
        self
    }

    /// Current state of every chain.
    pub fn current_states(&self) -> Vec<usize> {
        self.chains.iter().map(|c| c.current_state).collect()
    }

    /// Proposal and acceptance counts accumulated over all chains since the last reseed.
    pub fn stats(&self) -> RunStats {
        RunStats {
            n_chains: self.chains.len(),
            n_steps: self.chains.iter().map(|c| c.n_steps).sum(),
            n_accepted: self.chains.iter().map(|c| c.n_accepted).sum(),
        }
    }

    /// Runs `n_iterations` iterations and returns the states together with the counts of
    /// this run alone.
    pub fn run_with_stats(&mut self, n_iterations: usize) -> Result<(Array2<usize>, RunStats)> {
        let before = self.stats();
        let states = self.run(n_iterations)?;
        let stats = self.stats().since(&before);
        debug!(
            n_iterations,
            acceptance_rate = stats.acceptance_rate(),
            "run finished"
        );
        Ok((states, stats))
    }
}

impl<T> HasChains<usize> for ChainSimulator<T>
where
    T: Float + Send + Sync,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type Chain = DiscreteMHChain<T>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

/**
Samples `pi` with `n` chains for `k` iterations under the uniform proposal.

Returns the `k × n` matrix whose row `r` holds the states of all chains after
iteration `r + 1`. A fresh seed is drawn for every call; see [`simulate_with_seed`]
for reproducible runs.

# Examples

```rust
use discrete_mh::simulator::{simulate, DEFAULT_ITERATIONS};

let states = simulate(50, &[15.0, 5.0, 1.0], DEFAULT_ITERATIONS).unwrap();
assert_eq!(states.dim(), (20, 50));
```
*/
pub fn simulate<T>(n: usize, pi: &[T], k: usize) -> Result<Array2<usize>>
where
    T: Float + Send + Sync,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    run_config(
        pi,
        &SimulationConfig {
            n_chains: n,
            n_iterations: k,
            discard: 0,
            seed: None,
        },
        None,
    )
}

/// Like [`simulate`], with every chain seeded from `seed`.
pub fn simulate_with_seed<T>(n: usize, pi: &[T], k: usize, seed: u64) -> Result<Array2<usize>>
where
    T: Float + Send + Sync,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    run_config(
        pi,
        &SimulationConfig {
            n_chains: n,
            n_iterations: k,
            discard: 0,
            seed: Some(seed),
        },
        None,
    )
}

/// Runs the uniform-proposal simulation described by `config`, optionally cancellable.
///
/// The first `config.discard` iterations are dropped, so the result has
/// `n_iterations - discard` rows.
pub fn run_config<T>(
    pi: &[T],
    config: &SimulationConfig,
    token: Option<&CancellationToken>,
) -> Result<Array2<usize>>
where
    T: Float + Send + Sync,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    let target = TargetWeights::try_from(pi)?;
    config.validate()?;
    let mut sim = ChainSimulator::uniform(target, config.n_chains)?;
    if let Some(seed) = config.seed {
        sim = sim.set_seed(seed);
    }
    let states = match token {
        Some(token) => sim.run_cancellable(config.n_iterations, token)?,
        None => sim.run(config.n_iterations)?,
    };
    Ok(states.slice_move(s![config.discard.., ..]))
}
