//! On-Disk Array Cache
//!
//! Flat cache of the loader's three arrays, one directory per dataset,
//! validated by a SHA-256 digest of the encoded payload. A cache that fails
//! validation is never silently rebuilt.

use crate::error::DatasetError;
use crate::loader::RawData;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DATA_FILE: &str = "arrays.bin";
const DIGEST_FILE: &str = "arrays.sha256";

/// Cache of raw arrays keyed by dataset name
#[derive(Debug, Clone)]
pub struct ArrayCache {
    root: PathBuf,
}

impl ArrayCache {
    /// Create a cache rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a dataset's cached arrays
    pub fn path(&self, dataset: &str) -> PathBuf {
        self.root.join(dataset)
    }

    /// Whether a cache entry exists for the dataset
    pub fn exists(&self, dataset: &str) -> bool {
        let dir = self.path(dataset);
        dir.join(DATA_FILE).is_file() && dir.join(DIGEST_FILE).is_file()
    }

    /// Check the stored digest against the payload
    pub fn validate(&self, dataset: &str) -> Result<bool, DatasetError> {
        let dir = self.path(dataset);
        let payload = fs::read(dir.join(DATA_FILE))?;
        let recorded = fs::read_to_string(dir.join(DIGEST_FILE))?;
        Ok(digest(&payload) == recorded.trim())
    }

    /// Load cached arrays
    pub fn load(&self, dataset: &str) -> Result<RawData, DatasetError> {
        let payload = fs::read(self.path(dataset).join(DATA_FILE))?;
        let data = postcard::from_bytes(&payload)?;
        debug!(dataset, "loaded arrays from cache");
        Ok(data)
    }

    /// Save arrays and their digest, replacing any previous entry
    pub fn save(&self, dataset: &str, data: &RawData) -> Result<(), DatasetError> {
        let dir = self.path(dataset);
        fs::create_dir_all(&dir)?;
        let payload = postcard::to_allocvec(data)?;
        fs::write(dir.join(DATA_FILE), &payload)?;
        fs::write(dir.join(DIGEST_FILE), digest(&payload))?;
        debug!(dataset, bytes = payload.len(), "saved arrays to cache");
        Ok(())
    }
}

fn digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}
