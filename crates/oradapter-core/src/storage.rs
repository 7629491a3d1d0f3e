//! Storage lifecycle vocabulary.

use std::fmt;

use crate::config::StorageConfig;
use crate::error::Result;

/// Whether the storage area currently holds anything.
///
/// Never persisted; recomputed from live catalog counts on every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    /// At least one table or named object exists
    Up,
    /// No tables and no named objects exist
    Down,
}

impl StorageState {
    /// Classify from live counts.
    pub const fn from_counts(relations: u64, objects: u64) -> Self {
        if relations > 0 || objects > 0 {
            StorageState::Up
        } else {
            StorageState::Down
        }
    }

    pub const fn is_up(self) -> bool {
        matches!(self, StorageState::Up)
    }
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageState::Up => write!(f, "up"),
            StorageState::Down => write!(f, "down"),
        }
    }
}

/// Storage lifecycle operations a framework adapter exposes.
///
/// All calls block the caller until the operation finishes or fails.
pub trait StorageAdapter {
    /// Create the storage area. Fails with `AlreadyUp` if it holds anything.
    fn storage_up(&self, config: &StorageConfig) -> Result<()>;

    /// Tear the storage area down. Fails with `AlreadyDown` if it is empty.
    fn storage_down(&self, config: &StorageConfig) -> Result<()>;

    /// Report whether the storage area is up or down.
    fn storage_status(&self, config: &StorageConfig) -> Result<StorageState>;
}
