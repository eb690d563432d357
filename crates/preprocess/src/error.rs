//! Preprocessing Error Types

use thiserror::Error;

/// Errors raised by the preprocessing stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessError {
    /// Per-channel missing rates do not match the number of data channels
    #[error("argument 'missing' has {actual} rates but there are {expected} data channels")]
    RateCount { expected: usize, actual: usize },

    /// A missing rate is negative
    #[error("argument 'missing' rate for channel {channel} must be non-negative, got {rate}")]
    NegativeRate { channel: usize, rate: f64 },

    /// A stratum is too small for stratified sampling
    #[error("stratified sampling is undefined: stratum (positive = {positive}) has {size} members, need at least 2")]
    StratumTooSmall { positive: bool, size: usize },

    /// Stratification labels do not match the sample pool
    #[error("stratify labels cover {labels} samples but the pool has {pool}")]
    StratifyLength { labels: usize, pool: usize },

    /// Fill values do not match the selected channels
    #[error("got {actual} fill values for {expected} selected channels")]
    FillCount { expected: usize, actual: usize },

    /// A channel index is outside the tensor
    #[error("channel {channel} is outside the tensor ({total} channels)")]
    ChannelOutOfBounds { channel: usize, total: usize },
}
