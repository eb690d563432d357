//! Dataset Error Types

use crate::config::Split;
use channel_layout::LayoutError;
use preprocess::PreprocessError;
use thiserror::Error;

/// Errors raised while building or querying a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Training proportion outside (0, 1)
    #[error("argument 'train_prop' must be in range (0, 1), got {value}")]
    InvalidTrainProp { value: f64 },

    /// Validation proportion outside (0, 1 - train_prop)
    #[error("argument 'val_prop' must be in range (0, {max}), got {value}")]
    InvalidValProp { value: f64, max: f64 },

    /// Requested split was not materialised
    #[error("split '{split}' is not available; supply 'val_prop' to create a test split")]
    SplitNotAvailable { split: Split },

    /// An argument references a channel that is not in the data
    #[error("channels in argument '{argument}' are not included in the data: channel {channel}")]
    UnknownChannel {
        argument: &'static str,
        channel: usize,
    },

    /// Cache exists but failed validation
    #[error("cache is corrupted, use 'overwrite_cache' to rebuild it")]
    CacheCorrupted,

    /// Cache file system error
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache payload could not be encoded or decoded
    #[error("cache encoding error: {0}")]
    Encoding(String),

    /// Loader arrays are inconsistent
    #[error("loader returned malformed data: {reason}")]
    MalformedData { reason: String },

    /// Loader failure
    #[error("loader error: {0}")]
    Loader(String),

    /// Channel bookkeeping failure
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Preprocessing stage failure
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// Tensor shape mismatch while assembling channels
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl From<postcard::Error> for DatasetError {
    fn from(err: postcard::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
