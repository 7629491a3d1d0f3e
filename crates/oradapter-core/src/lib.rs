//! Core types and traits for the Oracle storage adapter.
//!
//! This crate provides the vocabulary shared between the adapter and the
//! framework that hosts it:
//!
//! - `Value` for wire and domain values
//! - `Driver` trait, the seam to the external wire driver
//! - `StorageConfig` for connection parameters
//! - `LogicalType` tags for loader/dumper selection
//! - `StorageAdapter` trait and `StorageState` for lifecycle operations
//! - `Outcome` re-export from asupersync for cancel-aware driver results

// Re-export asupersync primitives used at the driver seam
pub use asupersync::Outcome;

pub mod config;
pub mod driver;
pub mod error;
pub mod storage;
pub mod types;
pub mod value;

pub use config::{Backoff, StorageConfig};
pub use driver::{Driver, QueryOptions, QueryResult};
pub use error::{Error, Result, StorageError, StorageErrorKind};
pub use storage::{StorageAdapter, StorageState};
pub use types::{Cardinality, Direction, EmbeddedShape, LogicalType};
pub use value::Value;
