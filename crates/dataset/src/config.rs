//! Dataset Configuration

use preprocess::{ImputeMethod, MissingSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Data split identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Val => write!(f, "val"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Which channel groups to standardize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standardise {
    /// No standardization
    #[default]
    None,
    /// Time, data and delta channels
    All,
    /// Data channels only
    Data,
}

/// Pipeline configuration
///
/// `categorical`, `static_channels` and `channel_means` are keyed by original
/// channel number, where channel 0 is the time stamp and data channels count
/// from 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Split exposed by the `X`/`y`/`length` accessors
    pub split: Split,
    /// Proportion of data in the training set
    pub train_prop: f64,
    /// Proportion of data in the validation set; when omitted the data is
    /// split train/validation only
    pub val_prop: Option<f64>,
    /// Proportion of observed data to drop at random
    pub missing: MissingSpec,
    /// Imputation method for missing data
    pub impute: ImputeMethod,
    /// Channels extracted as non-time-varying, one value per sample
    pub static_channels: Vec<usize>,
    /// Channels imputed with the channel mode rather than the mean
    pub categorical: Vec<usize>,
    /// Explicit overrides for the calculated fill values
    pub channel_means: BTreeMap<usize, f64>,
    /// Keep the time stamp as the first channel
    pub time: bool,
    /// Append an observation mask channel per data channel
    pub mask: bool,
    /// Append a time-delta channel per data channel
    pub delta: bool,
    /// Standardization mode
    pub standardise: Standardise,
    /// Rebuild the cache from the loader even if a valid cache exists
    pub overwrite_cache: bool,
    /// Seed for missing-data simulation and splitting; unseeded runs are not
    /// reproducible
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            split: Split::Train,
            train_prop: 0.8,
            val_prop: None,
            missing: MissingSpec::default(),
            impute: ImputeMethod::None,
            static_channels: Vec::new(),
            categorical: Vec::new(),
            channel_means: BTreeMap::new(),
            time: true,
            mask: false,
            delta: false,
            standardise: Standardise::None,
            overwrite_cache: false,
            seed: None,
        }
    }
}
