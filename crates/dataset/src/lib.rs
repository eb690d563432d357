//! Time Series Dataset Pipeline
//!
//! Turns raw, irregularly sampled multi-channel time series into fixed-shape
//! tensors ready for modeling. Raw arrays come from a pluggable loader and
//! are cached on disk; the preprocessing pipeline then splits out static
//! channels, simulates missing data, appends mask/delta channels, forms
//! stratified train/validation/test splits and imputes and standardizes
//! using training-split statistics only.

mod cache;
mod config;
mod error;
mod loader;
mod pipeline;

pub use cache::ArrayCache;
pub use config::{DatasetConfig, Split, Standardise};
pub use error::DatasetError;
pub use loader::{Loader, RawData};
pub use pipeline::{Sample, SplitData, TimeSeriesDataset};

pub use preprocess::{ImputeMethod, Imputer, MissingSpec};
