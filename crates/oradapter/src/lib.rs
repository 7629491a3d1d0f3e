//! Oracle storage adapter.
//!
//! Administrative storage operations and value coercion for an Oracle
//! backend, on top of an external wire driver implementing
//! [`oradapter_core::Driver`].
//!
//! # Storage lifecycle
//!
//! ```ignore
//! use oradapter::OracleStorage;
//! use oradapter_core::StorageConfig;
//!
//! let storage = OracleStorage::new(driver);
//! let config = StorageConfig::new("db.internal", "scott", "ORCLPDB1").password("tiger");
//!
//! match storage.status(&config)? {
//!     StorageState::Up => storage.destroy(&config)?,
//!     StorageState::Down => {}
//! }
//! ```
//!
//! Every statement runs on a fresh connection inside an isolated task on the
//! storage [`Supervisor`], bounded by the config's `timeout`. A statement that
//! misses its deadline fails with `"command timed out"`.
//!
//! # Coercion
//!
//! [`coerce::load`] and [`coerce::dump`] convert between wire values and
//! domain values for a [`LogicalType`](oradapter_core::LogicalType).

pub mod coerce;
pub mod executor;
pub mod inspect;
pub mod storage;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use coerce::{Coercions, JsonLibrary, SerdeJson};
pub use executor::{Execute, IsolatedExecutor};
pub use inspect::{OBJECT_KINDS, OBJECTS_PROBE, RELATIONS_PROBE};
pub use storage::{DropCommand, OBJECT_DROPS_PROBE, OracleStorage, Phase, TABLE_DROPS_PROBE};
pub use supervisor::{STORAGE_SUPERVISOR, Supervisor, TaskHandle};
