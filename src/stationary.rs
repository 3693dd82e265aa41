//! Checks that a target distribution is stationary under the chain a sampler actually runs.
//!
//! The Metropolis–Hastings chain moves from `i` to `j ≠ i` with probability
//! `P[i, j] = Q[i, j] · α[i, j]` and stays put with the remaining mass,
//! `P[i, i] = 1 - Σ_{k≠i} P[i, k]`. None of this is needed to run the sampler;
//! it is a diagnostic for hand-built proposals and for tests.
//!
//! Target weights may be unnormalized, so stationarity is checked up to scale:
//! the weights are normalized first and `π̂ · P ≈ π̂` is tested entrywise.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, LinalgScalar, Zip};
use ndarray_stats::QuantileExt;
use num_traits::Float;

use crate::distributions::{check_proposal, check_weights, default_tolerance};
use crate::error::{McmcError, Result};

/// Builds the transition matrix implied by proposal `q` and acceptance matrix `alpha`.
///
/// This is the chain a [`ChainSimulator`](crate::simulator::ChainSimulator) runs
/// only when every row of `q` sums to one, which the simulator enforces.
///
/// # Examples
///
/// ```rust
/// use discrete_mh::acceptance::compute;
/// use discrete_mh::stationary::{implied_transition, verify_stationary};
/// use ndarray::{arr1, Array2};
///
/// let pi = arr1(&[1.0, 2.0, 5.0]);
/// let q = Array2::from_elem((3, 3), 1.0 / 3.0);
/// let alpha = compute(pi.view(), q.view()).unwrap();
/// let p = implied_transition(pi.view(), q.view(), alpha.view()).unwrap();
/// assert!(verify_stationary(pi.view(), p.view()));
/// ```
pub fn implied_transition<T: Float>(
    pi: ArrayView1<T>,
    q: ArrayView2<T>,
    alpha: ArrayView2<T>,
) -> Result<Array2<T>> {
    check_weights(pi)?;
    let m = pi.len();
    check_proposal(q, m)?;
    if alpha.dim() != (m, m) {
        return Err(McmcError::DimensionMismatch {
            expected: m,
            rows: alpha.nrows(),
            cols: alpha.ncols(),
        });
    }
    if let Some(((i, j), &a)) = alpha
        .indexed_iter()
        .find(|&(_, &a)| !(a >= T::zero() && a <= T::one()))
    {
        return Err(McmcError::InvalidInput {
            what: "acceptance probability",
            location: format!("[{i}, {j}]"),
            value: a.to_f64().unwrap_or(f64::NAN),
        });
    }

    let mut p = Array2::zeros((m, m));
    Zip::from(&mut p)
        .and(&q)
        .and(&alpha)
        .for_each(|out, &qij, &aij| *out = qij * aij);
    for (i, mut row) in p.rows_mut().into_iter().enumerate() {
        row[i] = T::zero();
        let moved = row.iter().fold(T::zero(), |acc, &x| acc + x);
        row[i] = T::one() - moved;
    }
    Ok(p)
}

/// Largest entrywise gap between `π̂ · P` and `π̂`, where `π̂` is `pi` normalized.
pub fn stationary_residual<T>(pi: ArrayView1<T>, p: ArrayView2<T>) -> Result<T>
where
    T: Float + LinalgScalar,
{
    check_weights(pi)?;
    let m = pi.len();
    if p.dim() != (m, m) {
        return Err(McmcError::DimensionMismatch {
            expected: m,
            rows: p.nrows(),
            cols: p.ncols(),
        });
    }
    let total = pi.iter().fold(T::zero(), |acc, &w| acc + w);
    let pi_hat = pi.mapv(|w| w / total);
    let gaps = (&pi_hat.dot(&p) - &pi_hat).mapv(T::abs);
    Ok(gaps.max().copied().unwrap_or_else(|_| T::infinity()))
}

/// Returns `true` if `pi` (up to scale) is stationary under `p` within the default tolerance.
///
/// Invalid weights or a transition matrix of the wrong size count as "not stationary".
pub fn verify_stationary<T>(pi: ArrayView1<T>, p: ArrayView2<T>) -> bool
where
    T: Float + LinalgScalar,
{
    verify_stationary_with_tolerance(pi, p, default_tolerance())
}

pub fn verify_stationary_with_tolerance<T>(pi: ArrayView1<T>, p: ArrayView2<T>, tol: T) -> bool
where
    T: Float + LinalgScalar,
{
    stationary_residual(pi, p).is_ok_and(|gap| gap <= tol)
}

/// Largest violation of `π_i Q_ij α_ij = π_j Q_ji α_ji` over all pairs of states.
pub fn detailed_balance_residual<T: Float>(
    pi: ArrayView1<T>,
    q: ArrayView2<T>,
    alpha: ArrayView2<T>,
) -> Result<T> {
    let p = implied_transition(pi, q, alpha)?;
    let m = pi.len();
    let mut worst = T::zero();
    for i in 0..m {
        for j in (i + 1)..m {
            let gap = (pi[i] * p[[i, j]] - pi[j] * p[[j, i]]).abs();
            worst = worst.max(gap);
        }
    }
    Ok(worst)
}

/// Stationary distribution of the row-stochastic matrix `p` by power iteration.
///
/// Starts from the uniform distribution and stops once successive iterates differ by
/// less than `tol` in L1 norm. Returns `None` if `p` is not square or the iteration
/// does not settle within `max_iter` steps (e.g. for a periodic chain).
pub fn stationary_distribution<T>(p: ArrayView2<T>, max_iter: usize, tol: T) -> Option<Array1<T>>
where
    T: Float + LinalgScalar,
{
    let (rows, cols) = p.dim();
    if rows != cols || rows == 0 {
        return None;
    }
    let mut dist = Array1::from_elem(rows, T::one() / T::from(rows)?);
    for _ in 0..max_iter {
        let next = dist.dot(&p);
        let diff = Zip::from(&dist)
            .and(&next)
            .fold(T::zero(), |acc, &a, &b| acc + (a - b).abs());
        dist = next;
        if diff < tol {
            return Some(dist);
        }
    }
    None
}
