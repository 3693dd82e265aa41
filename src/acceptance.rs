/*!
# Metropolis–Hastings Acceptance Matrix

For a discrete target `π` and a proposal matrix `Q`, the probability of accepting a
move from state `i` to a proposed state `j` is

\[
\alpha_{ij} = \min\left(1, \frac{\pi_j \, q_{ji}}{\pi_i \, q_{ij}}\right)
\]

The normalizing constant of `π` cancels in the ratio, so unnormalized weights can be
used directly. The whole matrix is formed at once as the elementwise ratio of
`W = π ⊙ Q` (row `i` scaled by `π_i`) and its transpose.

Two degenerate cells get a fixed value:

- `0 / 0` (neither direction is ever proposed) is `0`.
- `x / 0` with `x > 0` is clamped to `1`.

The diagonal is always exactly `1`.

## Example

```rust
use discrete_mh::acceptance::AcceptanceMatrix;
use discrete_mh::distributions::{ProposalMatrix, TargetWeights};

let target = TargetWeights::new(vec![1.0, 3.0]).unwrap();
let proposal = ProposalMatrix::uniform(2);
let alpha: AcceptanceMatrix<f64> = AcceptanceMatrix::new(&target, &proposal).unwrap();

// Moving up the weight is always accepted, moving down only a third of the time.
assert_eq!(alpha.get(0, 1), 1.0);
assert!((alpha.get(1, 0) - 1.0 / 3.0).abs() < 1e-12);
```
*/

use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip};
use num_traits::Float;

use crate::distributions::{check_proposal, check_weights, ProposalMatrix, TargetWeights};
use crate::error::Result;

/**
Computes the Metropolis–Hastings acceptance matrix for target weights `pi` and proposal `q`.

Inputs are validated before any arithmetic, in this order:

1. every weight must be finite and strictly positive ([`McmcError::InvalidInput`]),
2. `q` must be `m × m` with `m = pi.len()` ([`McmcError::DimensionMismatch`]),
3. every entry of `q` must be finite and non-negative ([`McmcError::InvalidInput`]),
4. every column of `q` must sum to one ([`McmcError::NotStochastic`]).

[`McmcError::InvalidInput`]: crate::error::McmcError::InvalidInput
[`McmcError::DimensionMismatch`]: crate::error::McmcError::DimensionMismatch
[`McmcError::NotStochastic`]: crate::error::McmcError::NotStochastic

# Examples

```rust
use discrete_mh::acceptance::compute;
use discrete_mh::error::McmcError;
use ndarray::{arr1, arr2};

let q = arr2(&[[0.5, 0.5], [0.5, 0.5]]);
let alpha = compute(arr1(&[2.0, 1.0]).view(), q.view()).unwrap();
assert_eq!(alpha[[1, 0]], 1.0);
assert_eq!(alpha[[0, 1]], 0.5);

let err = compute(arr1(&[1.0, -1.0]).view(), q.view()).unwrap_err();
assert!(matches!(err, McmcError::InvalidInput { .. }));
```
*/
pub fn compute<T: Float>(pi: ArrayView1<T>, q: ArrayView2<T>) -> Result<Array2<T>> {
    check_weights(pi)?;
    check_proposal(q, pi.len())?;
    Ok(ratio_matrix(pi, q))
}

fn ratio_matrix<T: Float>(pi: ArrayView1<T>, q: ArrayView2<T>) -> Array2<T> {
    // w[i, j] = pi_i * q_ij
    let w = &q * &pi.insert_axis(Axis(1));
    let mut alpha = Array2::zeros(w.raw_dim());
    Zip::from(&mut alpha)
        .and(&w)
        .and(w.t())
        .for_each(|a, &forward, &backward| {
            *a = if forward > T::zero() {
                (backward / forward).min(T::one())
            } else if backward > T::zero() {
                T::one()
            } else {
                T::zero()
            };
        });
    alpha.diag_mut().fill(T::one());
    alpha
}

/// Acceptance probabilities of a validated `(target, proposal)` pair.
///
/// Computed once and then read-only; a simulator owns one of these for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceMatrix<T: Float> {
    alpha: Array2<T>,
}

impl<T: Float> AcceptanceMatrix<T> {
    pub fn new(target: &TargetWeights<T>, proposal: &ProposalMatrix<T>) -> Result<Self> {
        let alpha = compute(target.view(), proposal.view())?;
        Ok(Self { alpha })
    }

    /// Acceptance probability of a move from `from` to `to`.
    ///
    /// # Panics
    ///
    /// If either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> T {
        self.alpha[[from, to]]
    }

    pub fn dim(&self) -> usize {
        self.alpha.nrows()
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.alpha.view()
    }

    pub fn into_inner(self) -> Array2<T> {
        self.alpha
    }
}
