//! Input validation and reproducibility through the public API.

use discrete_mh::acceptance::{compute, AcceptanceMatrix};
use discrete_mh::core::{CancellationToken, ChainRunner};
use discrete_mh::distributions::{ProposalMatrix, TargetWeights};
use discrete_mh::error::McmcError;
use discrete_mh::simulator::{simulate, simulate_with_seed, ChainSimulator};
use discrete_mh::stationary::{implied_transition, verify_stationary};
use ndarray::{arr1, arr2, Array2};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_weight_is_invalid_input() {
        let q = Array2::from_elem((3, 3), 1.0 / 3.0);
        let err = compute(arr1(&[1.0, -1.0, 2.0]).view(), q.view()).unwrap_err();
        assert!(matches!(err, McmcError::InvalidInput { .. }));
        assert!(err.to_string().contains("[1]"), "message: {err}");
    }

    #[test]
    fn non_square_proposal_is_dimension_mismatch() {
        let q = arr2(&[[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]]);
        let err = compute(arr1(&[1.0, 2.0]).view(), q.view()).unwrap_err();
        assert_eq!(
            err,
            McmcError::DimensionMismatch {
                expected: 2,
                rows: 3,
                cols: 2
            }
        );
    }

    #[test]
    fn short_column_is_not_stochastic() {
        let q = arr2(&[[0.5, 0.5, 0.2], [0.25, 0.25, 0.4], [0.25, 0.25, 0.3]]);
        match compute(arr1(&[1.0, 2.0, 3.0]).view(), q.view()) {
            Err(McmcError::NotStochastic { column, sum }) => {
                assert_eq!(column, 2);
                assert!((sum - 0.9).abs() < 1e-12);
            }
            other => panic!("Expected NotStochastic, got {other:?}"),
        }
    }

    #[test]
    fn simulator_rejects_rows_not_summing_to_one() {
        // Column-stochastic only: the sampled chain would not keep the target.
        let target = TargetWeights::new(vec![2.0, 1.0, 4.0]).unwrap();
        let q = ProposalMatrix::new(arr2(&[[0.2, 0.5, 0.3], [0.3, 0.1, 0.3], [0.5, 0.4, 0.4]]))
            .unwrap();
        assert!(AcceptanceMatrix::new(&target, &q).is_ok());
        match ChainSimulator::new(target, q, 10) {
            Err(McmcError::NotRowStochastic { row, sum }) => {
                assert_eq!(row, 1);
                assert!((sum - 0.7).abs() < 1e-12);
            }
            other => panic!("Expected NotRowStochastic, got {other:?}"),
        }
    }

    #[test]
    fn single_precision_uniform_with_many_states() {
        let pi = vec![1.0f32; 1_000];
        let states = simulate_with_seed(2, &pi, 2, 1).unwrap();
        assert_eq!(states.dim(), (2, 2));
        assert!(states.iter().all(|&s| s < 1_000));
    }

    #[test]
    fn zero_proposal_row_is_invalid_distribution() {
        let target = TargetWeights::new(vec![1.0, 1.0, 1.0]).unwrap();
        let q = ProposalMatrix::new(arr2(&[
            [0.5, 0.5, 0.5],
            [0.0, 0.0, 0.0],
            [0.5, 0.5, 0.5],
        ]))
        .unwrap();
        assert!(AcceptanceMatrix::new(&target, &q).is_ok());
        assert_eq!(
            ChainSimulator::new(target, q, 10).unwrap_err(),
            McmcError::InvalidDistribution { row: 1 }
        );
    }

    #[test]
    fn simulate_rejects_bad_arguments() {
        assert!(matches!(
            simulate(5, &[0.0, 1.0], 3),
            Err(McmcError::InvalidInput { .. })
        ));
        assert!(matches!(
            simulate(0, &[1.0, 1.0], 3),
            Err(McmcError::InvalidConfig(_))
        ));
        assert!(matches!(
            simulate::<f64>(5, &[], 3),
            Err(McmcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn identical_seeds_identical_matrices() {
        let pi = [3.0, 1.0, 4.0, 1.0, 5.0];
        let a = simulate_with_seed(1_000, &pi, 15, 7).unwrap();
        let b = simulate_with_seed(1_000, &pi, 15, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| s < pi.len()));
    }

    #[test]
    fn simulator_alpha_is_stationary_for_target() {
        let target = TargetWeights::new(vec![15.0, 5.0, 1.0, 3.0]).unwrap();
        let sim = ChainSimulator::uniform(target.clone(), 1).unwrap();
        let p = implied_transition(target.view(), sim.proposal.view(), sim.acceptance.view())
            .unwrap();
        assert!(verify_stationary(target.view(), p.view()));
    }

    #[test]
    fn cancellation_from_another_handle() {
        let target = TargetWeights::new(vec![1.0, 2.0]).unwrap();
        let mut sim = ChainSimulator::uniform(target, 10).unwrap().set_seed(3);
        let token = CancellationToken::new();
        let handle = token.clone();

        assert_eq!(sim.run_cancellable(4, &token).unwrap().nrows(), 4);
        handle.cancel();
        assert_eq!(
            sim.run_cancellable(4, &token),
            Err(McmcError::Cancelled { iteration: 0 })
        );
    }
}
