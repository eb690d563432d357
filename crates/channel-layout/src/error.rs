//! Layout Error Types

use thiserror::Error;

/// Errors raised by structural layout operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Tensor has too few channels to carry a time stamp and data
    #[error("tensor must have a time channel and at least one data channel, got {total} channels")]
    TooFewChannels { total: usize },

    /// Referenced channel is not a current data channel
    #[error("channel {channel} is not a data channel in the current layout")]
    UnknownDataChannel { channel: usize },

    /// Channel referenced more than once in one operation
    #[error("channel {channel} referenced more than once")]
    DuplicateChannel { channel: usize },

    /// A derived channel group was appended twice
    #[error("{group} channels have already been appended")]
    GroupAlreadyPresent { group: &'static str },

    /// Time channel operation without a time channel
    #[error("layout has no time channel")]
    TimeChannelMissing,

    /// Index groups no longer partition the channel axis
    #[error("index groups do not partition the {total} tensor channels")]
    BrokenPartition { total: usize },
}
