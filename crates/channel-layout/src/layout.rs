//! Channel Layout Tracker

use crate::error::LayoutError;

/// Partition of the channel axis into time/data/mask/delta index groups.
///
/// A freshly loaded tensor has the time stamp in channel 0 and data channels
/// from 1. Structural operations (extracting static channels, appending mask
/// or delta channels, dropping the time channel) update all four index lists
/// atomically so they always address the current tensor layout. Downstream
/// stages address channels exclusively through these indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    time_idx: Vec<usize>,
    data_idx: Vec<usize>,
    mask_idx: Vec<usize>,
    delta_idx: Vec<usize>,
    /// Original channel number of each current data channel, parallel to
    /// `data_idx`. Survives static extraction and time removal, so per-channel
    /// settings keyed by original channel number can always be resolved.
    source_channels: Vec<usize>,
    total: usize,
}

impl ChannelLayout {
    /// Create a layout for a raw tensor with `total` channels.
    ///
    /// Channel 0 is the time stamp; the rest are data channels.
    pub fn new(total: usize) -> Result<Self, LayoutError> {
        if total < 2 {
            return Err(LayoutError::TooFewChannels { total });
        }
        Ok(Self {
            time_idx: vec![0],
            data_idx: (1..total).collect(),
            mask_idx: Vec::new(),
            delta_idx: Vec::new(),
            source_channels: (1..total).collect(),
            total,
        })
    }

    /// Remove the given data channels (by original channel number) from the
    /// layout, compacting the remaining indices.
    ///
    /// Returns the current tensor positions of the extracted channels, in the
    /// order given, so the caller can select the matching columns before the
    /// layout change takes effect.
    pub fn extract_static(&mut self, channels: &[usize]) -> Result<Vec<usize>, LayoutError> {
        let mut positions = Vec::with_capacity(channels.len());
        for (i, &channel) in channels.iter().enumerate() {
            if channels[..i].contains(&channel) {
                return Err(LayoutError::DuplicateChannel { channel });
            }
            positions.push(self.position_of(channel)?);
        }
        let retained: Vec<usize> = self
            .source_channels
            .iter()
            .copied()
            .filter(|c| !channels.contains(c))
            .collect();
        // Surviving channels shift left to close the gaps
        self.data_idx = (1..=retained.len()).collect();
        self.source_channels = retained;
        self.total = 1 + self.data_idx.len();
        Ok(positions)
    }

    /// Append one mask channel per data channel.
    pub fn append_mask(&mut self) -> Result<(), LayoutError> {
        if !self.mask_idx.is_empty() {
            return Err(LayoutError::GroupAlreadyPresent { group: "mask" });
        }
        let n = self.data_idx.len();
        self.mask_idx = (self.total..self.total + n).collect();
        self.total += n;
        Ok(())
    }

    /// Append one time-delta channel per data channel.
    pub fn append_delta(&mut self) -> Result<(), LayoutError> {
        if !self.delta_idx.is_empty() {
            return Err(LayoutError::GroupAlreadyPresent { group: "delta" });
        }
        let n = self.data_idx.len();
        self.delta_idx = (self.total..self.total + n).collect();
        self.total += n;
        Ok(())
    }

    /// Drop the time channel, shifting every other index down by one.
    pub fn drop_time(&mut self) -> Result<(), LayoutError> {
        if self.time_idx.is_empty() {
            return Err(LayoutError::TimeChannelMissing);
        }
        self.time_idx.clear();
        for idx in self
            .data_idx
            .iter_mut()
            .chain(self.mask_idx.iter_mut())
            .chain(self.delta_idx.iter_mut())
        {
            *idx -= 1;
        }
        self.total -= 1;
        Ok(())
    }

    /// Current tensor position of a data channel, by original channel number.
    pub fn position_of(&self, channel: usize) -> Result<usize, LayoutError> {
        self.source_channels
            .iter()
            .position(|&c| c == channel)
            .map(|p| self.data_idx[p])
            .ok_or(LayoutError::UnknownDataChannel { channel })
    }

    /// Check that the four groups partition `[0, total)` exactly once.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = vec![false; self.total];
        for &idx in self
            .time_idx
            .iter()
            .chain(&self.data_idx)
            .chain(&self.mask_idx)
            .chain(&self.delta_idx)
        {
            if idx >= self.total || seen[idx] {
                return Err(LayoutError::BrokenPartition { total: self.total });
            }
            seen[idx] = true;
        }
        if seen.iter().all(|&s| s) {
            Ok(())
        } else {
            Err(LayoutError::BrokenPartition { total: self.total })
        }
    }

    /// Time channel indices (empty or one entry)
    pub fn time_idx(&self) -> &[usize] {
        &self.time_idx
    }

    /// Data channel indices
    pub fn data_idx(&self) -> &[usize] {
        &self.data_idx
    }

    /// Mask channel indices (empty unless appended)
    pub fn mask_idx(&self) -> &[usize] {
        &self.mask_idx
    }

    /// Delta channel indices (empty unless appended)
    pub fn delta_idx(&self) -> &[usize] {
        &self.delta_idx
    }

    /// Original channel numbers of the current data channels
    pub fn source_channels(&self) -> &[usize] {
        &self.source_channels
    }

    /// Total channels in the current tensor
    pub fn total_channels(&self) -> usize {
        self.total
    }

    /// Number of data channels
    pub fn n_data(&self) -> usize {
        self.data_idx.len()
    }

    /// Whether the time channel is present
    pub fn has_time(&self) -> bool {
        !self.time_idx.is_empty()
    }
}
