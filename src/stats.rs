//! Summaries of a finished run: visit frequencies, and how closely they follow the target.

use ndarray::prelude::*;
use ndarray_stats::CorrelationExt;
use num_traits::Float;

use crate::distributions::check_weights;
use crate::error::{McmcError, Result};

/// Proposal and acceptance counts of one or more runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub n_chains: usize,
    /// Iterations summed over all chains.
    pub n_steps: u64,
    /// Iterations whose acceptance test passed, summed over all chains.
    pub n_accepted: u64,
}

impl RunStats {
    /// Fraction of proposals that were accepted, or `0.0` before the first step.
    pub fn acceptance_rate(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_steps as f64
        }
    }

    /// Counts accumulated after `earlier` was taken.
    pub fn since(&self, earlier: &RunStats) -> RunStats {
        RunStats {
            n_chains: self.n_chains,
            n_steps: self.n_steps.saturating_sub(earlier.n_steps),
            n_accepted: self.n_accepted.saturating_sub(earlier.n_accepted),
        }
    }
}

/// Number of visits to each of the states `0..m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    pub counts: Array1<usize>,
}

impl FrequencyTable {
    /**
    Counts the states of all rows of `states` from row `discard` onwards.

    # Errors

    [`McmcError::InvalidInput`] if an entry is not a state in `0..n_states`, and
    [`McmcError::InvalidConfig`] if `discard` leaves no rows.

    # Examples

    ```rust
    use discrete_mh::stats::FrequencyTable;
    use ndarray::arr2;

    let states = arr2(&[[0, 0, 2], [1, 2, 2]]);
    let table = FrequencyTable::from_states(states.view(), 3, 1).unwrap();
    assert_eq!(table.counts.to_vec(), vec![0, 1, 2]);
    ```
    */
    pub fn from_states(states: ArrayView2<usize>, n_states: usize, discard: usize) -> Result<Self> {
        if discard >= states.nrows() {
            return Err(McmcError::InvalidConfig(
                "discard must be smaller than the number of rows",
            ));
        }
        let mut counts = Array1::<usize>::zeros(n_states);
        for ((row, col), &s) in states.slice(s![discard.., ..]).indexed_iter() {
            match counts.get_mut(s) {
                Some(c) => *c += 1,
                None => {
                    return Err(McmcError::InvalidInput {
                        what: "state",
                        location: format!("[{}, {col}]", row + discard),
                        value: s as f64,
                    })
                }
            }
        }
        Ok(Self { counts })
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Visit counts divided by the total number of visits.
    pub fn proportions(&self) -> Array1<f64> {
        let total = self.total().max(1) as f64;
        self.counts.mapv(|c| c as f64 / total)
    }
}

/// Ranks of `x` starting at 1, with tied values sharing the mean of their ranks.
pub fn average_ranks<T: Float>(x: ArrayView1<T>) -> Array1<f64> {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = Array1::<f64>::zeros(x.len());
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && x[order[end]] == x[order[start]] {
            end += 1;
        }
        // Positions start..end hold ties; their 1-based ranks average to this.
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/**
Spearman rank correlation between `a` and `b`.

Returns `None` if the lengths differ, there are fewer than two values, or either side
is constant.

# Examples

```rust
use discrete_mh::stats::spearman_correlation;
use ndarray::arr1;

let rho = spearman_correlation(arr1(&[1.0, 5.0, 3.0]).view(), arr1(&[10.0, 90.0, 20.0]).view());
assert!((rho.unwrap() - 1.0).abs() < 1e-12);
```
*/
pub fn spearman_correlation<T: Float>(a: ArrayView1<T>, b: ArrayView1<T>) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ra, rb) = (average_ranks(a), average_ranks(b));
    let ranked = ndarray::stack(Axis(0), &[ra.view(), rb.view()]).ok()?;
    let rho = ranked.pearson_correlation().ok()?[[0, 1]];
    rho.is_finite().then_some(rho)
}

/// Total variation distance between two mass vectors, each normalized to sum to one first.
pub fn total_variation<T: Float>(p: ArrayView1<T>, q: ArrayView1<T>) -> Option<f64> {
    if p.len() != q.len() {
        return None;
    }
    let normalize = |v: ArrayView1<T>| -> Option<Array1<f64>> {
        let v = v.mapv(|x| x.to_f64().unwrap_or(f64::NAN));
        let total = v.sum();
        (total > 0.0 && total.is_finite()).then(|| v / total)
    };
    let (p, q) = (normalize(p)?, normalize(q)?);
    Some(0.5 * (&p - &q).mapv(f64::abs).sum())
}

/// Side-by-side comparison of a run's visit frequencies with the target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetComparison {
    pub frequencies: FrequencyTable,
    /// Target weights normalized to sum to one.
    pub target: Array1<f64>,
    /// Empirical proportions, aligned with `target`.
    pub empirical: Array1<f64>,
    pub spearman: Option<f64>,
    pub total_variation: Option<f64>,
}

impl TargetComparison {
    /// Compares the states of `states` (after dropping `discard` rows) with the target `pi`.
    ///
    /// `pi` is validated like [`TargetWeights`](crate::distributions::TargetWeights).
    pub fn new<T: Float>(states: ArrayView2<usize>, pi: ArrayView1<T>, discard: usize) -> Result<Self> {
        check_weights(pi)?;
        let frequencies = FrequencyTable::from_states(states, pi.len(), discard)?;
        let empirical = frequencies.proportions();
        let raw = pi.mapv(|x| x.to_f64().unwrap_or(f64::NAN));
        let total = raw.sum();
        let target = raw / total;
        let spearman = spearman_correlation(empirical.view(), target.view());
        let total_variation = total_variation(empirical.view(), target.view());
        Ok(Self {
            frequencies,
            target,
            empirical,
            spearman,
            total_variation,
        })
    }
}
