//! Channel Standardization
//!
//! Z-scores continuous channels using training-split statistics, applied
//! identically to every split. Missing entries are ignored when estimating
//! the statistics and left missing by the transform.

use ndarray::{Array2, Array3, Axis};
use tracing::warn;

use crate::EPS;

/// Per-channel training-split mean and standard deviation.
///
/// Computed once from the training split; never recomputed on validation or
/// test data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    idx: Vec<usize>,
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ChannelStats {
    /// Channels the statistics cover
    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    /// Per-channel means, parallel to `idx`
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-channel standard deviations, parallel to `idx`
    pub fn std(&self) -> &[f64] {
        &self.std
    }
}

/// Estimate nan-aware mean and unbiased standard deviation for the selected
/// channels of a training tensor.
pub fn fit_channel_stats(x_train: &Array3<f64>, idx: &[usize]) -> ChannelStats {
    let (mean, std) = idx
        .iter()
        .map(|&channel| {
            let column = x_train.index_axis(Axis(2), channel);
            let stats = nan_mean_std(column.iter().copied());
            if stats.0.is_nan() {
                warn!(channel, "channel has no observed training values");
            }
            stats
        })
        .unzip();
    ChannelStats {
        idx: idx.to_vec(),
        mean,
        std,
    }
}

/// Estimate statistics for static channels (one value per sample).
pub fn fit_static_stats(x_static_train: &Array2<f64>, idx: &[usize]) -> ChannelStats {
    let (mean, std) = idx
        .iter()
        .map(|&column| nan_mean_std(x_static_train.index_axis(Axis(1), column).iter().copied()))
        .unzip();
    ChannelStats {
        idx: idx.to_vec(),
        mean,
        std,
    }
}

/// Apply `(x - mean) / (std + EPS)` to the covered channels.
pub fn standardize(x: &mut Array3<f64>, stats: &ChannelStats) {
    for ((&channel, &mean), &std) in stats.idx.iter().zip(&stats.mean).zip(&stats.std) {
        for entry in x.index_axis_mut(Axis(2), channel).iter_mut() {
            *entry = (*entry - mean) / (std + EPS);
        }
    }
}

/// Apply the transform to static channels.
pub fn standardize_static(x_static: &mut Array2<f64>, stats: &ChannelStats) {
    for ((&column, &mean), &std) in stats.idx.iter().zip(&stats.mean).zip(&stats.std) {
        for entry in x_static.index_axis_mut(Axis(1), column).iter_mut() {
            *entry = (*entry - mean) / (std + EPS);
        }
    }
}

/// Nan-aware mean and unbiased (n - 1) standard deviation.
fn nan_mean_std(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let observed: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    if observed.len() < 2 {
        return (mean, f64::NAN);
    }
    let sum_sq: f64 = observed.iter().map(|v| (v - mean) * (v - mean)).sum();
    (mean, (sum_sq / (observed.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array3};

    fn training_tensor() -> Array3<f64> {
        // Channel 0: time stamps; channel 1: varying data with a missing
        // value; channel 2: constant
        let mut x = Array3::zeros((3, 4, 3));
        for i in 0..3 {
            for t in 0..4 {
                x[[i, t, 0]] = t as f64;
                x[[i, t, 1]] = (i * 4 + t) as f64;
                x[[i, t, 2]] = 7.0;
            }
        }
        x[[1, 2, 1]] = f64::NAN;
        x
    }

    #[test]
    fn test_training_split_standardizes_to_unit_scale() {
        let mut x = training_tensor();
        let stats = fit_channel_stats(&x, &[1]);
        standardize(&mut x, &stats);
        let column = x.index_axis(Axis(2), 1);
        let observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        let var = observed.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
            / (observed.len() - 1) as f64;
        assert!(mean.abs() < 1e-10);
        assert!((var.sqrt() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_constant_channel_maps_to_zero() {
        let mut x = training_tensor();
        let stats = fit_channel_stats(&x, &[2]);
        standardize(&mut x, &stats);
        assert!(x.index_axis(Axis(2), 2).iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_missing_entries_stay_missing() {
        let mut x = training_tensor();
        let stats = fit_channel_stats(&x, &[1]);
        standardize(&mut x, &stats);
        assert!(x[[1, 2, 1]].is_nan());
    }

    #[test]
    fn test_train_statistics_applied_to_other_splits() {
        let train = training_tensor();
        let stats = fit_channel_stats(&train, &[1]);
        let mut val = Array3::from_elem((2, 4, 3), 100.0);
        standardize(&mut val, &stats);
        let expected = (100.0 - stats.mean()[0]) / (stats.std()[0] + EPS);
        assert!((val[[0, 0, 1]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_static_standardization() {
        let mut x_static = arr2(&[[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]]);
        let stats = fit_static_stats(&x_static, &[0, 1]);
        standardize_static(&mut x_static, &stats);
        assert!(x_static[[1, 0]].abs() < 1e-10); // mean of column 0
        assert!(x_static[[0, 1]].abs() < 1e-10); // constant column
        assert!((x_static[[2, 0]] - 1.0).abs() < 1e-5);
    }
}
