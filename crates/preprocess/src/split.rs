//! Stratified Train/Validation/Test Splitting

use crate::error::PreprocessError;
use crate::EPS;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Partition of sample indices, computed once per pipeline instance.
///
/// The test list is present only when a test proportion was requested;
/// callers check presence rather than absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Option<Vec<usize>>,
}

/// Draw a stratified random subset of `frac` of the pool, preserving the
/// positive/negative balance of the stratification label.
///
/// Returns the drawn indices and the remainder, both in ascending order.
/// Each stratum contributes `round(frac * stratum_size)` members. A stratum
/// with fewer than 2 members makes stratified sampling undefined and fails.
pub fn stratified_draw<R: Rng>(
    pool: &[usize],
    stratify: &[bool],
    frac: f64,
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>), PreprocessError> {
    if let Some(&sample) = pool.iter().find(|&&i| i >= stratify.len()) {
        return Err(PreprocessError::StratifyLength {
            labels: stratify.len(),
            pool: sample + 1,
        });
    }
    let mut drawn = Vec::new();
    let mut rest = Vec::new();
    // Negative stratum first, then positive: fixed order keeps the random
    // stream reproducible
    for positive in [false, true] {
        let mut stratum: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&i| stratify[i] == positive)
            .collect();
        if stratum.len() < 2 {
            return Err(PreprocessError::StratumTooSmall {
                positive,
                size: stratum.len(),
            });
        }
        let take = ((frac * stratum.len() as f64).round() as usize).min(stratum.len());
        stratum.shuffle(rng);
        drawn.extend_from_slice(&stratum[..take]);
        rest.extend_from_slice(&stratum[take..]);
    }
    drawn.sort_unstable();
    rest.sort_unstable();
    Ok((drawn, rest))
}

/// Partition all samples into train/validation/(test) splits.
///
/// `val_frac` is the validation fraction of the non-test remainder. When
/// `test_prop` is above tolerance the test subset is drawn first, so that a
/// fixed seed yields identical splits regardless of which one is consumed.
pub fn split_samples<R: Rng>(
    stratify: &[bool],
    val_frac: f64,
    test_prop: f64,
    rng: &mut R,
) -> Result<SplitAssignment, PreprocessError> {
    let all: Vec<usize> = (0..stratify.len()).collect();
    let (test, remainder) = if test_prop > EPS {
        let (test, remainder) = stratified_draw(&all, stratify, test_prop, rng)?;
        (Some(test), remainder)
    } else {
        (None, all)
    };
    let (val, train) = stratified_draw(&remainder, stratify, val_frac, rng)?;
    debug!(
        train = train.len(),
        val = val.len(),
        test = test.as_ref().map_or(0, Vec::len),
        "assigned data splits"
    );
    Ok(SplitAssignment { train, val, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 40% positive labels over n samples
    fn labels(n: usize) -> Vec<bool> {
        (0..n).map(|i| i % 5 < 2).collect()
    }

    fn positive_rate(idx: &[usize], stratify: &[bool]) -> f64 {
        idx.iter().filter(|&&i| stratify[i]).count() as f64 / idx.len() as f64
    }

    #[test]
    fn test_split_proportions_and_balance() {
        let stratify = labels(1000);
        let mut rng = StdRng::seed_from_u64(456789);
        // train_prop = 0.7, val_prop = 0.2: test 10%, val 2/9 of remainder
        let assignment = split_samples(&stratify, 0.2 / 0.9, 0.1, &mut rng).unwrap();
        let test = assignment.test.as_ref().unwrap();
        assert!((assignment.train.len() as i64 - 700).abs() <= 1);
        assert!((assignment.val.len() as i64 - 200).abs() <= 1);
        assert!((test.len() as i64 - 100).abs() <= 1);
        assert_eq!(
            assignment.train.len() + assignment.val.len() + test.len(),
            1000
        );
        for idx in [&assignment.train, &assignment.val, test] {
            assert!((positive_rate(idx, &stratify) - 0.4).abs() < 0.02);
        }
    }

    #[test]
    fn test_no_test_split_when_prop_zero() {
        let stratify = labels(100);
        let mut rng = StdRng::seed_from_u64(1);
        let assignment = split_samples(&stratify, 0.3, 0.0, &mut rng).unwrap();
        assert!(assignment.test.is_none());
        assert_eq!(assignment.train.len() + assignment.val.len(), 100);
        assert_eq!(assignment.val.len(), 30);
    }

    #[test]
    fn test_reproducible_for_fixed_seed() {
        let stratify = labels(200);
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let a = split_samples(&stratify, 0.25, 0.2, &mut rng_a).unwrap();
        let b = split_samples(&stratify, 0.25, 0.2, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_splits_are_disjoint_and_exhaustive() {
        let stratify = labels(97);
        let mut rng = StdRng::seed_from_u64(3);
        let assignment = split_samples(&stratify, 0.3, 0.15, &mut rng).unwrap();
        let mut seen = vec![0u8; 97];
        for &i in assignment
            .train
            .iter()
            .chain(&assignment.val)
            .chain(assignment.test.as_deref().unwrap_or(&[]))
        {
            seen[i] += 1;
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_stratum_too_small_fails_loudly() {
        // A single positive sample cannot be split preserving balance
        let mut stratify = vec![false; 50];
        stratify[7] = true;
        let mut rng = StdRng::seed_from_u64(0);
        let err = split_samples(&stratify, 0.3, 0.0, &mut rng).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::StratumTooSmall {
                positive: true,
                size: 1
            }
        );
    }
}
