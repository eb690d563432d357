//! Loader Contract
//!
//! Dataset-specific parsers live outside this crate. They hand over three
//! aligned arrays and the pipeline takes it from there.

use crate::error::DatasetError;
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Raw arrays produced by a loader.
///
/// `x` has shape (samples, max_steps, channels) with the time stamp in
/// channel 0 and NaN padding beyond each sample's true length. `y` holds one
/// label vector per sample and `length` the true step counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub x: Array3<f64>,
    pub y: Array2<f64>,
    pub length: Array1<usize>,
}

impl RawData {
    /// Check the arrays are mutually consistent.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let (samples, steps, channels) = self.x.dim();
        if channels < 2 {
            return Err(DatasetError::MalformedData {
                reason: format!(
                    "expected a time channel and at least one data channel, got {channels} channels"
                ),
            });
        }
        if self.y.nrows() != samples {
            return Err(DatasetError::MalformedData {
                reason: format!(
                    "'y' has {} rows for {samples} samples",
                    self.y.nrows()
                ),
            });
        }
        if self.length.len() != samples {
            return Err(DatasetError::MalformedData {
                reason: format!(
                    "'length' has {} entries for {samples} samples",
                    self.length.len()
                ),
            });
        }
        if let Some(&bad) = self.length.iter().find(|&&l| l == 0 || l > steps) {
            return Err(DatasetError::MalformedData {
                reason: format!("sequence length {bad} outside [1, {steps}]"),
            });
        }
        Ok(())
    }
}

/// Source of raw time series arrays.
///
/// Implementations parse dataset-specific raw files (or generate data) and
/// are the only boundary between this crate and on-disk formats.
pub trait Loader {
    /// Dataset name, used as the cache directory key
    fn dataset(&self) -> &str;

    /// Produce the raw arrays
    fn load(&self) -> Result<RawData, DatasetError>;
}
