//! Time Series Preprocessing Stages
//!
//! Bulk array transforms that turn irregular, partially observed time series
//! tensors into model-ready inputs: missing-data simulation, observation mask
//! and time-delta augmentation, stratified splitting, imputation and
//! standardization. Statistics are always computed from the training split
//! only and reused verbatim for validation/test data.

mod augment;
mod error;
mod impute;
mod missing;
mod split;
mod standardize;

pub use augment::{missing_mask, time_delta};
pub use error::PreprocessError;
pub use impute::{
    fill_profile, forward_impute, replace_missing, replace_missing_static, static_fill_profile,
    FillProfile, ForwardImputer, ImputeMethod, Imputer, MeanImputer, ZeroImputer,
};
pub use missing::{simulate_missing, MissingSpec};
pub use split::{split_samples, stratified_draw, SplitAssignment};
pub use standardize::{fit_channel_stats, fit_static_stats, standardize, standardize_static, ChannelStats};

/// Numerical tolerance shared across the pipeline. Also the epsilon added to
/// standard deviations so constant channels standardize to zero.
pub const EPS: f64 = 1e-7;
