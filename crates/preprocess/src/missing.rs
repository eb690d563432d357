//! Missing-Data Simulation

use crate::error::PreprocessError;
use crate::EPS;
use ndarray::{Array3, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Proportion of observed values to drop, per data channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissingSpec {
    /// One rate applied to every data channel
    Uniform(f64),
    /// One rate per data channel
    PerChannel(Vec<f64>),
}

impl Default for MissingSpec {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl MissingSpec {
    /// Whether any channel has a rate worth simulating
    pub fn is_active(&self) -> bool {
        match self {
            Self::Uniform(rate) => *rate > EPS,
            Self::PerChannel(rates) => rates.iter().sum::<f64>() > EPS,
        }
    }

    /// Expand to one rate per data channel, validating the specification
    pub fn rates(&self, n_channels: usize) -> Result<Vec<f64>, PreprocessError> {
        let rates = match self {
            Self::Uniform(rate) => vec![*rate; n_channels],
            Self::PerChannel(rates) => {
                if rates.len() != n_channels {
                    return Err(PreprocessError::RateCount {
                        expected: n_channels,
                        actual: rates.len(),
                    });
                }
                rates.clone()
            }
        };
        for (channel, &rate) in rates.iter().enumerate() {
            if rate < 0.0 {
                return Err(PreprocessError::NegativeRate { channel, rate });
            }
        }
        Ok(rates)
    }
}

/// Drop observed values to NaN, independently per data channel.
///
/// For each channel, a uniformly random subset of the currently observed
/// entries of size `round(rate * observed)` is set to NaN. Padding and
/// previously missing entries are not eligible, and the time channel is never
/// touched. A rate of 1 or more drops every observed value in the channel.
/// The drop positions are fully determined by the generator state.
///
/// Returns the number of values dropped.
pub fn simulate_missing<R: Rng>(
    x: &mut Array3<f64>,
    data_idx: &[usize],
    spec: &MissingSpec,
    rng: &mut R,
) -> Result<usize, PreprocessError> {
    let total = x.len_of(Axis(2));
    if let Some(&channel) = data_idx.iter().find(|&&c| c >= total) {
        return Err(PreprocessError::ChannelOutOfBounds { channel, total });
    }
    let rates = spec.rates(data_idx.len())?;
    let mut dropped = 0;
    for (c, &channel) in data_idx.iter().enumerate() {
        let rate = rates[c];
        if rate <= EPS {
            continue;
        }
        let mut column = x.index_axis_mut(Axis(2), channel);
        let observed: Vec<(usize, usize)> = column
            .indexed_iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|(pos, _)| pos)
            .collect();
        let n_drop = ((rate * observed.len() as f64).round() as usize).min(observed.len());
        for i in rand::seq::index::sample(rng, observed.len(), n_drop) {
            column[observed[i]] = f64::NAN;
        }
        dropped += n_drop;
    }
    debug!(dropped, "simulated missing data");
    Ok(dropped)
}
