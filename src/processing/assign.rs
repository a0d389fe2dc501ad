/*! Random subset assignment

Assigns `n` identifiers to `K` subsets following (possibly unnormalized) ratios.

Ratios are normalized and accumulated into `c_0 <= c_1 <= ... <= c_{K-1} = 1`.
Each identifier gets a uniform draw `r` in `[0, 1)` and goes to the first subset `j` with `r <= c_j`.
Subset 0 thus wins every draw `r <= c_0`, subset 1 every draw `c_0 < r <= c_1`, and so on.

The random source is owned by the caller, so that the same seed yields the same assignments.
!*/
use rand::Rng;

use crate::error::Error;

/// Check ratios and build the cumulative distribution.
///
/// Fails on negative or non finite ratios, and when every ratio is zero.
fn cumulative(ratios: &[f64]) -> Result<Vec<f64>, Error> {
    if let Some(r) = ratios.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(Error::InvalidRatio(format!("ratio {} is not positive", r)));
    }

    let max = ratios.iter().cloned().fold(0.0, f64::max);
    if max <= 0.0 {
        return Err(Error::InvalidRatio(format!(
            "ratios {:?} sum to zero",
            ratios
        )));
    }

    // scaled by the largest ratio first so that the sum cannot overflow
    let scaled: Vec<f64> = ratios.iter().map(|r| r / max).collect();
    let total: f64 = scaled.iter().sum();

    let cumulative = scaled
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r / total;
            Some(*acc)
        })
        .collect();

    Ok(cumulative)
}

/// Assign each of the provided `draws` (expected in `[0, 1)`) to a subset index.
///
/// Output order follows `draws` order.
pub fn assign_draws(ratios: &[f64], draws: &[f64]) -> Result<Vec<usize>, Error> {
    if draws.is_empty() && ratios.is_empty() {
        return Ok(Vec::new());
    }
    if ratios.is_empty() {
        return Err(Error::InvalidRatio(
            "no ratios provided for a non-empty set of identifiers".to_string(),
        ));
    }

    let cumulative = cumulative(ratios)?;

    // rounding can leave c_{K-1} slightly under 1.
    // draws above it go to the last subset that can receive anything.
    let fallback = ratios
        .iter()
        .rposition(|r| *r > 0.0)
        .unwrap_or(ratios.len() - 1);

    let assignments = draws
        .iter()
        .map(|r| {
            cumulative
                .iter()
                .position(|c| r <= c)
                .unwrap_or(fallback)
        })
        .collect();

    Ok(assignments)
}

/// Draw `n` uniform values from `rng` and assign them to subsets following `ratios`.
///
/// See [assign_draws] for the assignment rule.
pub fn assign<R: Rng + ?Sized>(ratios: &[f64], n: usize, rng: &mut R) -> Result<Vec<usize>, Error> {
    let draws: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    assign_draws(ratios, &draws)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn length_and_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for ratios in [vec![0.7, 0.15, 0.15], vec![3.0, 1.0], vec![1.0], vec![0.2; 7]] {
            for n in [0, 1, 10, 1000] {
                let a = assign(&ratios, n, &mut rng).unwrap();
                assert_eq!(a.len(), n);
                assert!(a.iter().all(|j| *j < ratios.len()));
            }
        }
    }

    #[test]
    fn deterministic() {
        let ratios = [0.7, 0.15, 0.15];
        let a = assign(&ratios, 500, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = assign(&ratios, 500, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn first_ratio_takes_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = assign(&[1.0, 0.0, 0.0], 1000, &mut rng).unwrap();
        assert!(a.iter().all(|j| *j == 0));

        let a = assign_draws(&[1.0, 0.0, 0.0], &[0.0, 0.5, 0.999_999, 1.0]).unwrap();
        assert_eq!(a, vec![0, 0, 0, 0]);
    }

    #[test]
    fn proportional() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = assign(&[0.5, 0.5], 100_000, &mut rng).unwrap();
        let zeros = a.iter().filter(|j| **j == 0).count();

        // 2% of 100_000
        assert!((48_000..=52_000).contains(&zeros), "got {} zeros", zeros);
    }

    #[test]
    fn unnormalized_ratios() {
        // [2, 1, 1] is [0.5, 0.25, 0.25]
        let a = assign_draws(&[2.0, 1.0, 1.0], &[0.4, 0.5, 0.6, 0.76, 0.99]).unwrap();
        assert_eq!(a, vec![0, 0, 1, 2, 2]);
    }

    #[test]
    fn huge_ratios() {
        // their sum overflows f64
        let a = assign_draws(&[1e308, 1e308], &[0.1, 0.2, 0.3, 0.9]).unwrap();
        assert_eq!(a, vec![0, 0, 0, 1]);

        let a = assign_draws(&[f64::MAX, f64::MAX, f64::MAX, f64::MAX], &[0.2, 0.3, 0.6, 0.8]).unwrap();
        assert_eq!(a, vec![0, 1, 2, 3]);
    }

    #[test]
    fn train_dev_test() {
        let a = assign_draws(&[0.7, 0.15, 0.15], &[0.05, 0.75, 0.9]).unwrap();
        assert_eq!(a, vec![0, 1, 2]);
    }

    #[test]
    fn boundaries_go_to_smallest_index() {
        // exact binary fractions: c = [0.5, 0.75, 1.0]
        let a = assign_draws(&[0.5, 0.25, 0.25], &[0.0, 0.5, 0.500_001, 0.75, 0.750_001]).unwrap();
        assert_eq!(a, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn zero_ratio_in_the_middle() {
        let a = assign_draws(&[0.5, 0.0, 0.5], &[0.25, 0.5, 0.51, 0.99]).unwrap();
        assert_eq!(a, vec![0, 0, 2, 2]);
    }

    #[test]
    fn empty() {
        assert!(assign_draws(&[0.7, 0.3], &[]).unwrap().is_empty());
        assert!(assign_draws(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn invalid_ratios() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            assign(&[0.5, -0.1], 10, &mut rng),
            Err(Error::InvalidRatio(_))
        ));
        assert!(matches!(
            assign(&[0.0, 0.0], 10, &mut rng),
            Err(Error::InvalidRatio(_))
        ));
        assert!(matches!(
            assign(&[], 10, &mut rng),
            Err(Error::InvalidRatio(_))
        ));
        assert!(matches!(
            assign(&[f64::NAN, 1.0], 10, &mut rng),
            Err(Error::InvalidRatio(_))
        ));
    }
}
