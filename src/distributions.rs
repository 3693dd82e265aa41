/*!
Defines the inputs of a discrete Metropolis–Hastings run: the unnormalized target
weights, the proposal matrix, and a categorical distribution used to draw
candidate states from a proposal row.

This module is generic over the floating-point precision (e.g., `f32` or `f64`) using
the [`num_traits::Float`] trait.

# Examples

```rust
use discrete_mh::distributions::{Categorical, ProposalMatrix, TargetWeights};
use rand::rngs::SmallRng;
use rand::SeedableRng;

// Unnormalized target over three states.
let target = TargetWeights::new(vec![1.0, 2.0, 3.0]).unwrap();
assert_eq!(target.len(), 3);

// From any state, each of the three states is proposed with probability 1/3.
let proposal: ProposalMatrix<f64> = ProposalMatrix::uniform(3);
assert_eq!(proposal.dim(), 3);

// Draw a category from the weights [0.2, 0.3, 0.5].
let cat = Categorical::new(&[0.2f64, 0.3, 0.5]).unwrap();
let mut rng = SmallRng::seed_from_u64(42);
let sample = cat.sample(&mut rng);
assert!(sample < 3);
```
*/

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::Float;
use rand::Rng;

use crate::error::{McmcError, Result};

/// Absolute tolerance used when comparing sums and products that should be equal.
///
/// `1e-9` for `f64`; wider for lower precision types so that rounding alone never
/// trips a check.
pub fn default_tolerance<T: Float>() -> T {
    let floor = T::from(1e-9).unwrap_or_else(T::epsilon);
    let scaled = T::epsilon() * T::from(64.0).unwrap_or_else(T::one);
    floor.max(scaled)
}

/// Tolerance for a sum of `n` terms that should equal one.
///
/// Grows with `n` as the rounding error of a running sum does, and never drops below
/// [`default_tolerance`].
pub fn sum_tolerance<T: Float>(n: usize) -> T {
    let n = T::from(n.saturating_mul(4)).unwrap_or_else(T::max_value);
    default_tolerance::<T>().max(T::epsilon() * n)
}

fn lossy<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Checks that every weight is finite and strictly positive.
pub(crate) fn check_weights<T: Float>(pi: ArrayView1<T>) -> Result<()> {
    if pi.is_empty() {
        return Err(McmcError::InvalidConfig("target weights must not be empty"));
    }
    for (i, &w) in pi.iter().enumerate() {
        if !w.is_finite() || w <= T::zero() {
            return Err(McmcError::InvalidInput {
                what: "target weight",
                location: format!("[{i}]"),
                value: lossy(w),
            });
        }
    }
    Ok(())
}

/// Checks shape, entries and column sums of a proposal matrix against `m` states.
pub(crate) fn check_proposal<T: Float>(q: ArrayView2<T>, m: usize) -> Result<()> {
    let (rows, cols) = q.dim();
    if rows != cols || rows != m {
        return Err(McmcError::DimensionMismatch {
            expected: m,
            rows,
            cols,
        });
    }
    for ((i, j), &x) in q.indexed_iter() {
        if !x.is_finite() || x < T::zero() {
            return Err(McmcError::InvalidInput {
                what: "proposal entry",
                location: format!("[{i}, {j}]"),
                value: lossy(x),
            });
        }
    }
    let tol = sum_tolerance::<T>(rows);
    for (j, sum) in q.sum_axis(Axis(0)).iter().enumerate() {
        if (*sum - T::one()).abs() > tol {
            return Err(McmcError::NotStochastic {
                column: j,
                sum: lossy(*sum),
            });
        }
    }
    Ok(())
}

/**
Unnormalized target masses `b_0, ..., b_{m-1}` of a discrete distribution.

The weights need not sum to one; only their ratios matter to the sampler.

# Examples

```rust
use discrete_mh::distributions::TargetWeights;
use discrete_mh::error::McmcError;

let target = TargetWeights::new(vec![2.0, 6.0]).unwrap();
assert_eq!(target.normalized().to_vec(), vec![0.25, 0.75]);

let err = TargetWeights::new(vec![1.0, -1.0, 2.0]).unwrap_err();
assert!(matches!(err, McmcError::InvalidInput { .. }));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeights<T: Float> {
    weights: Array1<T>,
}

impl<T: Float> TargetWeights<T> {
    /// Validates and wraps the given weights. Zero, negative and non-finite weights are rejected.
    pub fn new(weights: Vec<T>) -> Result<Self> {
        let weights = Array1::from_vec(weights);
        check_weights(weights.view())?;
        Ok(Self { weights })
    }

    /// Number of states `m`.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, state: usize) -> Option<T> {
        self.weights.get(state).copied()
    }

    pub fn view(&self) -> ArrayView1<'_, T> {
        self.weights.view()
    }

    /// Returns the weights scaled to sum to one.
    pub fn normalized(&self) -> Array1<T> {
        let total = self.weights.iter().fold(T::zero(), |acc, &w| acc + w);
        self.weights.mapv(|w| w / total)
    }
}

impl<T: Float> TryFrom<&[T]> for TargetWeights<T> {
    type Error = McmcError;

    fn try_from(weights: &[T]) -> Result<Self> {
        Self::new(weights.to_vec())
    }
}

/**
Proposal matrix `Q` of a discrete Metropolis–Hastings chain.

Row `i` is the distribution of candidate states given the current state `i`.
Entries must be finite and non-negative, and every column must sum to one. A
simulator additionally needs every row to sum to one; see
[`ProposalMatrix::row_distributions`].

# Examples

```rust
use discrete_mh::distributions::ProposalMatrix;
use discrete_mh::error::McmcError;
use ndarray::arr2;

let q = ProposalMatrix::new(arr2(&[[0.5, 0.5], [0.5, 0.5]])).unwrap();
assert_eq!(q.dim(), 2);

let err = ProposalMatrix::new(arr2(&[[0.5, 0.6], [0.5, 0.3]])).unwrap_err();
assert!(matches!(err, McmcError::NotStochastic { column: 1, .. }));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalMatrix<T: Float> {
    q: Array2<T>,
}

impl<T: Float> ProposalMatrix<T> {
    /// Validates and wraps `q`. The number of states is taken from its row count.
    pub fn new(q: Array2<T>) -> Result<Self> {
        check_proposal(q.view(), q.nrows())?;
        Ok(Self { q })
    }

    /// Builds a proposal matrix from nested rows.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let m = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(McmcError::DimensionMismatch {
                expected: m,
                rows: m,
                cols: bad.len(),
            });
        }
        let flat: Vec<T> = rows.iter().flatten().copied().collect();
        let q = Array2::from_shape_vec((m, cols), flat).map_err(|_| {
            McmcError::DimensionMismatch {
                expected: m,
                rows: m,
                cols,
            }
        })?;
        Self::new(q)
    }

    /// The proposal that picks every state with probability `1/m`, regardless of the current state.
    pub fn uniform(m: usize) -> Self {
        let p = T::one() / T::from(m).unwrap_or_else(T::one);
        Self {
            q: Array2::from_elem((m, m), p),
        }
    }

    /// Number of states `m`.
    pub fn dim(&self) -> usize {
        self.q.nrows()
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.q.view()
    }

    pub fn row(&self, state: usize) -> ArrayView1<'_, T> {
        self.q.row(state)
    }

    /**
    One categorical distribution per row, i.e. the distribution of candidates the
    sampler draws from in each state.

    The rows are sampled exactly as given, so each must already sum to one: the
    acceptance matrix is built from the same entries, and rescaling a row would
    change the stationary distribution of the chain.

    # Errors

    - [`McmcError::InvalidDistribution`] if a row has no positive mass (checked for
      all rows first).
    - [`McmcError::NotRowStochastic`] if a row does not sum to one within tolerance.
    */
    pub fn row_distributions(&self) -> Result<Vec<Categorical<T>>> {
        let dists = self
            .q
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                Categorical::from_view(row).ok_or(McmcError::InvalidDistribution { row: i })
            })
            .collect::<Result<Vec<_>>>()?;

        let tol = sum_tolerance::<T>(self.q.ncols());
        for (i, sum) in self.q.sum_axis(Axis(1)).iter().enumerate() {
            if (*sum - T::one()).abs() > tol {
                return Err(McmcError::NotRowStochastic {
                    row: i,
                    sum: lossy(*sum),
                });
            }
        }
        Ok(dists)
    }
}

/**
A categorical distribution over `0..k`.

The weights are normalized on construction. Sampling walks the cumulative
distribution with a binary search, so a draw costs `O(log k)`.

# Examples

```rust
use discrete_mh::distributions::Categorical;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let cat = Categorical::new(&[0.0f64, 3.0, 1.0]).unwrap();
assert_eq!(cat.probs(), &[0.0, 0.75, 0.25]);
assert_eq!(cat.log_prob(0), f64::NEG_INFINITY);

let mut rng = SmallRng::seed_from_u64(1);
assert_ne!(cat.sample(&mut rng), 0);

assert!(Categorical::new(&[0.0f64, 0.0]).is_none());
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical<T: Float> {
    probs: Vec<T>,
    cumulative: Vec<T>,
}

impl<T: Float> Categorical<T> {
    /// Creates a categorical distribution from non-negative weights.
    ///
    /// Returns `None` when the weights are empty, contain a negative or non-finite
    /// entry, or sum to zero.
    pub fn new(weights: &[T]) -> Option<Self> {
        Self::from_view(ArrayView1::from(weights))
    }

    fn from_view(weights: ArrayView1<T>) -> Option<Self> {
        if weights.iter().any(|w| !w.is_finite() || *w < T::zero()) {
            return None;
        }
        let sum = weights.iter().fold(T::zero(), |acc, &w| acc + w);
        if sum <= T::zero() {
            return None;
        }
        let probs: Vec<T> = weights.iter().map(|&w| w / sum).collect();
        let cumulative = probs
            .iter()
            .scan(T::zero(), |acc, &p| {
                *acc = *acc + p;
                Some(*acc)
            })
            .collect();
        Some(Self { probs, cumulative })
    }

    pub fn probs(&self) -> &[T] {
        &self.probs
    }

    /// Draws an index using `rng`. Zero-probability categories are never returned.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r = T::from(rng.gen::<f64>()).unwrap_or_else(T::zero);
        let idx = self.cumulative.partition_point(|&c| c <= r);
        if idx < self.probs.len() {
            return idx;
        }
        // Rounding left the last cumulative value slightly below `r`.
        self.probs
            .iter()
            .rposition(|&p| p > T::zero())
            .unwrap_or(self.probs.len() - 1)
    }

    pub fn log_prob(&self, index: usize) -> f64 {
        match self.probs.get(index) {
            Some(p) => lossy(*p).ln(),
            None => f64::NEG_INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_non_positive_weights() {
        for bad in [vec![1.0, -1.0, 2.0], vec![1.0, 0.0], vec![f64::NAN]] {
            let err = TargetWeights::new(bad).unwrap_err();
            assert!(matches!(err, McmcError::InvalidInput { .. }), "{err}");
        }
        assert!(matches!(
            TargetWeights::<f64>::new(vec![]),
            Err(McmcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_weight_reports_position() {
        let err = TargetWeights::new(vec![1.0, 2.0, -3.0]).unwrap_err();
        assert_eq!(
            err,
            McmcError::InvalidInput {
                what: "target weight",
                location: "[2]".to_string(),
                value: -3.0,
            }
        );
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let target = TargetWeights::new(vec![15.0, 5.0, 1.0, 3.0]).unwrap();
        let sum: f64 = target.normalized().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn proposal_checks_shape_entries_and_columns() {
        let not_square = arr2(&[[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]]);
        assert_eq!(
            check_proposal(not_square.view(), 2),
            Err(McmcError::DimensionMismatch {
                expected: 2,
                rows: 3,
                cols: 2
            })
        );

        let negative = arr2(&[[1.5, 0.5], [-0.5, 0.5]]);
        assert!(matches!(
            ProposalMatrix::new(negative),
            Err(McmcError::InvalidInput { .. })
        ));

        let short_column = arr2(&[[0.5, 0.5], [0.4, 0.5]]);
        match ProposalMatrix::new(short_column) {
            Err(McmcError::NotStochastic { column, sum }) => {
                assert_eq!(column, 0);
                assert_abs_diff_eq!(sum, 0.9, epsilon = 1e-12);
            }
            other => panic!("expected NotStochastic, got {other:?}"),
        }
    }

    #[test]
    fn column_sums_use_tolerance() {
        // 0.1 + 0.2 + 0.7 is not exactly 1.0 in binary floating point.
        let q = arr2(&[[0.1, 0.1, 0.1], [0.2, 0.2, 0.2], [0.7, 0.7, 0.7]]);
        assert!(ProposalMatrix::new(q).is_ok());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![0.5, 0.5], vec![0.5]];
        assert!(matches!(
            ProposalMatrix::from_rows(&rows),
            Err(McmcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn uniform_proposal_is_valid() {
        let q: ProposalMatrix<f64> = ProposalMatrix::uniform(10);
        assert!(check_proposal(q.view(), 10).is_ok());
        assert_eq!(q.row_distributions().unwrap().len(), 10);
    }

    #[test]
    fn zero_row_has_no_distribution() {
        // Columns sum to one, but row 1 has no mass.
        let q = ProposalMatrix::new(arr2(&[[1.0, 1.0], [0.0, 0.0]])).unwrap();
        assert_eq!(
            q.row_distributions().unwrap_err(),
            McmcError::InvalidDistribution { row: 1 }
        );
    }

    #[test]
    fn rows_must_sum_to_one_for_sampling() {
        // Columns sum to one; rows 1 and 2 do not.
        let q = ProposalMatrix::new(arr2(&[[0.2, 0.5, 0.3], [0.3, 0.1, 0.3], [0.5, 0.4, 0.4]]))
            .unwrap();
        match q.row_distributions() {
            Err(McmcError::NotRowStochastic { row, sum }) => {
                assert_eq!(row, 1);
                assert_abs_diff_eq!(sum, 0.7, epsilon = 1e-12);
            }
            other => panic!("expected NotRowStochastic, got {other:?}"),
        }

        let circulant = ProposalMatrix::new(arr2(&[[0.2, 0.5, 0.3], [0.3, 0.2, 0.5], [0.5, 0.3, 0.2]]))
            .unwrap();
        assert_eq!(circulant.row_distributions().unwrap().len(), 3);
    }

    #[test]
    fn large_single_precision_uniform_is_valid() {
        for m in [1_000, 2_000] {
            let q: ProposalMatrix<f32> = ProposalMatrix::uniform(m);
            assert!(check_proposal(q.view(), m).is_ok(), "m = {m}");
            assert_eq!(q.row_distributions().unwrap().len(), m);
        }
        // The wider tolerance still catches a real deficit.
        let mut short = Array2::from_elem((1_000, 1_000), 1.0f32 / 1_000.0);
        short[[0, 0]] = 0.0;
        assert!(matches!(
            check_proposal(short.view(), 1_000),
            Err(McmcError::NotStochastic { column: 0, .. })
        ));
    }

    #[test]
    fn sum_tolerance_grows_with_terms() {
        assert_eq!(sum_tolerance::<f64>(10), 1e-9);
        assert!(sum_tolerance::<f32>(1_000) > default_tolerance::<f32>());
        assert!(sum_tolerance::<f32>(1_000) < 1e-3);
    }

    #[test]
    fn categorical_frequencies_match_probs() {
        let cat = Categorical::new(&[0.2f64, 0.3, 0.5]).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let n = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[cat.sample(&mut rng)] += 1;
        }
        for (count, p) in counts.iter().zip(cat.probs()) {
            assert_abs_diff_eq!(*count as f64 / n as f64, *p, epsilon = 0.01);
        }
    }

    #[test]
    fn categorical_log_prob() {
        let cat = Categorical::new(&[1.0f32, 1.0]).unwrap();
        assert_abs_diff_eq!(cat.log_prob(0), 0.5f64.ln(), epsilon = 1e-6);
        assert_eq!(cat.log_prob(2), f64::NEG_INFINITY);
    }
}
