//! Statistical checks that simulated chains settle on the target distribution.

use discrete_mh::core::ChainRunner;
use discrete_mh::distributions::{ProposalMatrix, TargetWeights};
use discrete_mh::simulator::{simulate_with_seed, ChainSimulator, DEFAULT_ITERATIONS};
use discrete_mh::stats::{FrequencyTable, TargetComparison};
use ndarray::{arr1, arr2};

#[cfg(test)]
mod tests {
    use super::*;

    const PI: [f64; 10] = [15.0, 5.0, 1.0, 3.0, 6.0, 0.05, 18.0, 9.0, 1.0, 2.0];
    const SEED: u64 = 42;

    /// The reference scenario: 5000 chains, 20 iterations, uniform proposal.
    #[test]
    fn final_rows_rank_like_target() {
        let states = simulate_with_seed(5_000, &PI, DEFAULT_ITERATIONS, SEED).unwrap();
        assert_eq!(states.dim(), (DEFAULT_ITERATIONS, 5_000));

        let last = states.slice(ndarray::s![DEFAULT_ITERATIONS - 1.., ..]);
        let cmp = TargetComparison::new(last, arr1(&PI).view(), 0).unwrap();
        let rho = cmp.spearman.expect("Expected a defined rank correlation");
        assert!(rho > 0.8, "Spearman correlation too low: {rho}");
    }

    #[test]
    fn later_rows_are_close_in_total_variation() {
        let states = simulate_with_seed(5_000, &PI, DEFAULT_ITERATIONS, SEED).unwrap();
        let cmp = TargetComparison::new(states.view(), arr1(&PI).view(), 10).unwrap();
        let tv = cmp.total_variation.unwrap();
        assert!(tv < 0.05, "Total variation distance too large: {tv}");
        assert!(cmp.spearman.unwrap() > 0.9);
    }

    /// A non-uniform, asymmetric proposal still leads to the target.
    #[test]
    fn asymmetric_proposal_converges() {
        let target = TargetWeights::new(vec![2.0, 1.0, 4.0]).unwrap();
        let proposal =
            ProposalMatrix::new(arr2(&[[0.2, 0.5, 0.3], [0.3, 0.2, 0.5], [0.5, 0.3, 0.2]]))
                .unwrap();
        let mut sim = ChainSimulator::new(target.clone(), proposal, 4_000)
            .unwrap()
            .set_seed(SEED);
        let states = sim.run(60).unwrap();

        let table = FrequencyTable::from_states(states.view(), target.len(), 30).unwrap();
        let empirical = table.proportions();
        let expected = target.normalized();
        for (e, t) in empirical.iter().zip(expected.iter()) {
            assert!((e - t).abs() < 0.02, "empirical {e} vs target {t}");
        }
    }

    /// Running with the weights reversed must not reproduce the original ranking.
    #[test]
    fn wrong_target_is_detected() {
        let reversed: Vec<f64> = PI.iter().rev().copied().collect();
        let states = simulate_with_seed(5_000, &reversed, DEFAULT_ITERATIONS, SEED).unwrap();
        let cmp = TargetComparison::new(states.view(), arr1(&PI).view(), 10).unwrap();
        assert!(cmp.spearman.unwrap() < 0.5);
        assert!(cmp.total_variation.unwrap() > 0.2);
    }
}
