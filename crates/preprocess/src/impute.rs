//! Missing-Data Imputation
//!
//! Fill values are computed once from the training split and reused verbatim
//! for the validation and test splits. Violating this is data leakage, the
//! single most important correctness property of the pipeline.

use crate::error::PreprocessError;
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Built-in imputation methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeMethod {
    /// Leave missing values in place
    #[default]
    None,
    /// Replace missing values with zero
    Zero,
    /// Replace missing values with the precomputed channel fill value
    Mean,
    /// Replace missing values with the most recent observation, falling back
    /// to the channel fill value before the first observation
    Forward,
}

/// Imputation strategy contract.
///
/// `fill` holds one precomputed fill value per selected channel, in order.
/// After a successful call no NaN remains in the selected channels of `x`,
/// provided the fill values themselves are not NaN.
pub trait Imputer: Send + Sync {
    fn apply(
        &self,
        x: &mut Array3<f64>,
        y: &mut Array2<f64>,
        fill: &[f64],
        select: &[usize],
    ) -> Result<(), PreprocessError>;
}

/// Replace missing values with zeros
pub struct ZeroImputer;

impl Imputer for ZeroImputer {
    fn apply(
        &self,
        x: &mut Array3<f64>,
        _y: &mut Array2<f64>,
        fill: &[f64],
        select: &[usize],
    ) -> Result<(), PreprocessError> {
        replace_missing(x, &vec![0.0; fill.len()], select)
    }
}

/// Replace missing values with the channel fill value
pub struct MeanImputer;

impl Imputer for MeanImputer {
    fn apply(
        &self,
        x: &mut Array3<f64>,
        _y: &mut Array2<f64>,
        fill: &[f64],
        select: &[usize],
    ) -> Result<(), PreprocessError> {
        replace_missing(x, fill, select)
    }
}

/// Carry the most recent observation forward
pub struct ForwardImputer;

impl Imputer for ForwardImputer {
    fn apply(
        &self,
        x: &mut Array3<f64>,
        _y: &mut Array2<f64>,
        fill: &[f64],
        select: &[usize],
    ) -> Result<(), PreprocessError> {
        forward_impute(x, fill, select)
    }
}

/// One fill value per data channel, computed from the training split
#[derive(Debug, Clone, PartialEq)]
pub struct FillProfile {
    values: Vec<f64>,
}

impl FillProfile {
    /// Fill values, parallel to the data channel index list
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Compute the fill value for each data channel from training data only.
///
/// The default is the channel nan-mean. Channels flagged categorical (by
/// original channel number) use the channel mode instead, and explicit
/// overrides win over both. A channel with no observed training values yields
/// a NaN fill, which is flagged as a likely misconfiguration but not fatal.
pub fn fill_profile(
    x_train: &Array3<f64>,
    data_idx: &[usize],
    source_channels: &[usize],
    categorical: &[usize],
    overrides: &BTreeMap<usize, f64>,
) -> FillProfile {
    let values = data_idx
        .iter()
        .zip(source_channels)
        .map(|(&position, &source)| {
            let column = x_train.index_axis(Axis(2), position);
            let value = if let Some(&fixed) = overrides.get(&source) {
                fixed
            } else if categorical.contains(&source) {
                nan_mode(column.iter().copied())
            } else {
                nan_mean(column.iter().copied())
            };
            if value.is_nan() {
                warn!(
                    channel = source,
                    "fill value is NaN: channel has no observed training values"
                );
            }
            value
        })
        .collect();
    FillProfile { values }
}

/// Fill values for static channels, one per extracted channel.
pub fn static_fill_profile(
    x_static_train: &Array2<f64>,
    static_channels: &[usize],
    categorical: &[usize],
    overrides: &BTreeMap<usize, f64>,
) -> FillProfile {
    let values = static_channels
        .iter()
        .enumerate()
        .map(|(column, &source)| {
            let values = x_static_train.index_axis(Axis(1), column);
            let value = if let Some(&fixed) = overrides.get(&source) {
                fixed
            } else if categorical.contains(&source) {
                nan_mode(values.iter().copied())
            } else {
                nan_mean(values.iter().copied())
            };
            if value.is_nan() {
                warn!(
                    channel = source,
                    "static fill value is NaN: channel has no observed training values"
                );
            }
            value
        })
        .collect();
    FillProfile { values }
}

/// Replace NaN entries in the selected channels with per-channel fill values.
pub fn replace_missing(
    x: &mut Array3<f64>,
    fill: &[f64],
    select: &[usize],
) -> Result<(), PreprocessError> {
    check_selection(x.len_of(Axis(2)), fill, select)?;
    for (&channel, &value) in select.iter().zip(fill) {
        for entry in x.index_axis_mut(Axis(2), channel).iter_mut() {
            if entry.is_nan() {
                *entry = value;
            }
        }
    }
    Ok(())
}

/// Replace each NaN with the most recent observation in that channel for that
/// sample; entries before the first observation use the channel fill value.
pub fn forward_impute(
    x: &mut Array3<f64>,
    fill: &[f64],
    select: &[usize],
) -> Result<(), PreprocessError> {
    check_selection(x.len_of(Axis(2)), fill, select)?;
    for (&channel, &value) in select.iter().zip(fill) {
        for mut series in x
            .index_axis_mut(Axis(2), channel)
            .axis_iter_mut(Axis(0))
        {
            let mut last = value;
            for entry in series.iter_mut() {
                if entry.is_nan() {
                    *entry = last;
                } else {
                    last = *entry;
                }
            }
        }
    }
    Ok(())
}

/// Replace NaN entries in every static channel with per-channel fill values.
pub fn replace_missing_static(
    x_static: &mut Array2<f64>,
    fill: &[f64],
) -> Result<(), PreprocessError> {
    let columns = x_static.len_of(Axis(1));
    if fill.len() != columns {
        return Err(PreprocessError::FillCount {
            expected: columns,
            actual: fill.len(),
        });
    }
    for (column, &value) in fill.iter().enumerate() {
        for entry in x_static.index_axis_mut(Axis(1), column).iter_mut() {
            if entry.is_nan() {
                *entry = value;
            }
        }
    }
    Ok(())
}

fn check_selection(total: usize, fill: &[f64], select: &[usize]) -> Result<(), PreprocessError> {
    if fill.len() != select.len() {
        return Err(PreprocessError::FillCount {
            expected: select.len(),
            actual: fill.len(),
        });
    }
    if let Some(&channel) = select.iter().find(|&&c| c >= total) {
        return Err(PreprocessError::ChannelOutOfBounds { channel, total });
    }
    Ok(())
}

/// Mean ignoring NaN; NaN if nothing is observed.
pub(crate) fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Most frequent value ignoring NaN, ties resolved to the smallest value;
/// NaN if nothing is observed.
pub(crate) fn nan_mode(values: impl Iterator<Item = f64>) -> f64 {
    let mut observed: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return f64::NAN;
    }
    observed.sort_by(f64::total_cmp);
    let mut mode = observed[0];
    let mut best = 0usize;
    let mut run = 0usize;
    let mut current = observed[0];
    for &v in &observed {
        if v == current {
            run += 1;
        } else {
            current = v;
            run = 1;
        }
        if run > best {
            best = run;
            mode = current;
        }
    }
    mode
}
