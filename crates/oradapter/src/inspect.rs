//! Storage inspection.
//!
//! The storage area is the set of tables and named objects owned by the
//! connecting user. Counting them tells whether the storage is up.

use oradapter_core::error::Result;
use oradapter_core::{Error, StorageConfig, StorageError, StorageErrorKind, StorageState};

use crate::executor::Execute;

/// Named object kinds that make up the storage area besides tables.
pub const OBJECT_KINDS: [&str; 6] = [
    "VIEW",
    "PACKAGE",
    "SEQUENCE",
    "PROCEDURE",
    "FUNCTION",
    "INDEX",
];

/// Lists every table owned by the current user.
pub const RELATIONS_PROBE: &str = "SELECT table_name FROM user_tables";

/// Lists every object of the [`OBJECT_KINDS`] owned by the current user.
pub const OBJECTS_PROBE: &str = "SELECT object_name FROM user_objects \
     WHERE object_type IN ('VIEW', 'PACKAGE', 'SEQUENCE', 'PROCEDURE', 'FUNCTION', 'INDEX')";

/// Count the tables owned by the current user.
pub fn count_relations<E: Execute + ?Sized>(executor: &E, config: &StorageConfig) -> Result<u64> {
    probe_count(executor, RELATIONS_PROBE, config)
}

/// Count the views, packages, sequences, procedures, functions and indexes
/// owned by the current user.
pub fn count_objects<E: Execute + ?Sized>(executor: &E, config: &StorageConfig) -> Result<u64> {
    probe_count(executor, OBJECTS_PROBE, config)
}

/// Classify the storage area from live counts.
///
/// Relations are probed first; the first failing probe's error is returned
/// and the second probe is not run.
#[tracing::instrument(level = "debug", skip(executor, config))]
pub fn status<E: Execute + ?Sized>(executor: &E, config: &StorageConfig) -> Result<StorageState> {
    let relations = count_relations(executor, config)?;
    let objects = count_objects(executor, config)?;
    let state = StorageState::from_counts(relations, objects);
    tracing::debug!(relations, objects, state = %state, "storage status");
    Ok(state)
}

fn probe_count<E: Execute + ?Sized>(
    executor: &E,
    sql: &'static str,
    config: &StorageConfig,
) -> Result<u64> {
    executor
        .run(sql, config)
        .map(|result| result.row_count)
        .map_err(|e| probe_error(sql, e))
}

/// Wrap a failed probe. Deadline expiry stays a plain timeout.
pub(crate) fn probe_error(sql: &str, err: Error) -> Error {
    match err {
        Error::Timeout => Error::Timeout,
        other => Error::Storage(StorageError::wrap(StorageErrorKind::Probe, sql, other)),
    }
}
