//! Channel Index Bookkeeping
//!
//! Tracks the partition of the channel axis into time/data/mask/delta groups
//! as channels are extracted, appended or removed during preprocessing.

mod error;
mod layout;

pub use error::LayoutError;
pub use layout::ChannelLayout;
