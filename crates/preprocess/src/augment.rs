//! Observation Mask and Time-Delta Augmentation
//!
//! Derived channels are computed from the tensor as it stands immediately
//! before imputation, so they reflect true and simulated missingness rather
//! than imputed values.

use ndarray::{s, Array3};

/// Observation mask for each data channel: 1 where a value is present, else 0.
///
/// Padded steps carry NaN and therefore mask to 0, so the mask sum of a fully
/// observed channel equals the sample's true length.
pub fn missing_mask(x: &Array3<f64>, data_idx: &[usize]) -> Array3<f64> {
    let (n, steps, _) = x.dim();
    let mut mask = Array3::zeros((n, steps, data_idx.len()));
    for i in 0..n {
        for t in 0..steps {
            for (c, &channel) in data_idx.iter().enumerate() {
                if !x[[i, t, channel]].is_nan() {
                    mask[[i, t, c]] = 1.0;
                }
            }
        }
    }
    mask
}

/// Time since the most recent observation of each data channel, following
/// Che et al (2018), see https://doi.org/10.1038/s41598-018-24271-9.
///
/// `delta[t = 0] = 0` by definition. For `t > 0`,
/// `delta[t] = time[t] - time[j]` where `j` is the most recent step at or
/// before `t - 1` at which the channel was observed. Step 0 counts as
/// observed regardless of the mask and its time stamp contributes as 0
/// (loaders emit time stamps starting at 0, so the two readings coincide).
/// Deltas over padded steps are NaN because the padded time stamps are NaN.
pub fn time_delta(x: &Array3<f64>, time_channel: usize, data_idx: &[usize]) -> Array3<f64> {
    let (n, steps, _) = x.dim();
    let mut delta = Array3::zeros((n, steps, data_idx.len()));
    for i in 0..n {
        let time = x.slice(s![i, .., time_channel]);
        for (c, &channel) in data_idx.iter().enumerate() {
            // Time stamp of the latest observation seen so far; step 0 is
            // treated as observed with time stamp 0
            let mut previous = 0.0;
            for t in 1..steps {
                delta[[i, t, c]] = time[t] - previous;
                if !x[[i, t, channel]].is_nan() {
                    previous = time[t];
                }
            }
        }
    }
    delta
}
