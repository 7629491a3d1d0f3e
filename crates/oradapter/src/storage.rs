//! Storage lifecycle: create, destroy and status of the storage area.
//!
//! Oracle has no `CREATE DATABASE` reachable from a user session, so
//! "creating" only checks that nothing is there yet. Destroying drops every
//! table, then every named object, each statement generated by the catalog and
//! run through its own isolated execution.

use std::fmt;

use oradapter_core::error::Result;
use oradapter_core::{
    Driver, Error, QueryResult, StorageAdapter, StorageConfig, StorageError, StorageErrorKind,
    StorageState, Value,
};

use crate::executor::{Execute, IsolatedExecutor};
use crate::inspect::{self, probe_error};

/// Generates one `DROP TABLE` per table owned by the current user.
pub const TABLE_DROPS_PROBE: &str =
    "SELECT 'DROP TABLE ' || table_name || ' CASCADE CONSTRAINTS' FROM user_tables";

/// Generates one `DROP <kind> <name>` per named object owned by the current user.
pub const OBJECT_DROPS_PROBE: &str = "SELECT 'DROP ' || object_type || ' ' || object_name \
     FROM user_objects \
     WHERE object_type IN ('VIEW', 'PACKAGE', 'SEQUENCE', 'PROCEDURE', 'FUNCTION', 'INDEX')";

/// One generated destructive statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropCommand(String);

impl DropCommand {
    /// Take the statement from the first column of a generated row.
    pub fn from_row(probe: &str, row: &[Value]) -> Result<Self> {
        match row.first() {
            Some(Value::Text(sql)) if sql.starts_with("DROP ") => Ok(Self(sql.clone())),
            Some(other) => Err(Error::Storage(StorageError::unexpected_shape(
                probe,
                format!("expected a DROP statement, got {}", describe(other)),
            ))),
            None => Err(Error::Storage(StorageError::unexpected_shape(
                probe,
                "generated row has no columns",
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DropCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("{s:?}"),
        other => other.type_name().to_string(),
    }
}

/// Teardown phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tables,
    Objects,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Tables, Phase::Objects];

    /// The catalog query that generates this phase's statements.
    pub const fn probe(self) -> &'static str {
        match self {
            Phase::Tables => TABLE_DROPS_PROBE,
            Phase::Objects => OBJECT_DROPS_PROBE,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Tables => "tables",
            Phase::Objects => "objects",
        }
    }
}

/// Oracle implementation of the storage lifecycle.
#[derive(Debug)]
pub struct OracleStorage<E> {
    executor: E,
}

impl<D: Driver> OracleStorage<IsolatedExecutor<D>> {
    /// Run every statement in an isolated task on `driver`.
    pub fn new(driver: D) -> Self {
        Self::with_executor(IsolatedExecutor::new(driver))
    }
}

impl<E: Execute> OracleStorage<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Is the storage area up?
    pub fn status(&self, config: &StorageConfig) -> Result<StorageState> {
        inspect::status(&self.executor, config)
    }

    /// Succeeds only when the storage area is empty. Issues no statements.
    #[tracing::instrument(level = "info", skip(self, config))]
    pub fn create(&self, config: &StorageConfig) -> Result<()> {
        match self.status(config)? {
            StorageState::Up => Err(Error::Storage(StorageError::already_up())),
            StorageState::Down => {
                tracing::info!("storage is empty; nothing to create");
                Ok(())
            }
        }
    }

    /// Drop every table, then every named object.
    ///
    /// The first failing statement stops the teardown. Statements that
    /// already ran are not undone, so a failure can leave the storage area
    /// partially dropped.
    #[tracing::instrument(level = "info", skip(self, config))]
    pub fn destroy(&self, config: &StorageConfig) -> Result<()> {
        if self.status(config)? == StorageState::Down {
            return Err(Error::Storage(StorageError::already_down()));
        }

        for phase in Phase::ALL {
            let commands = self.generate(phase, config)?;
            tracing::debug!(phase = phase.as_str(), count = commands.len(), "dropping");
            for (index, command) in commands.iter().enumerate() {
                if let Err(e) = self.execute(command, config) {
                    tracing::warn!(
                        phase = phase.as_str(),
                        index,
                        remaining = commands.len() - index - 1,
                        sql = %command,
                        error = %e,
                        "teardown halted"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!("storage dropped");
        Ok(())
    }

    /// Run a phase's probe and collect its statements in the order returned.
    fn generate(&self, phase: Phase, config: &StorageConfig) -> Result<Vec<DropCommand>> {
        let sql = phase.probe();
        let result = self
            .executor
            .run(sql, config)
            .map_err(|e| probe_error(sql, e))?;
        result
            .rows
            .iter()
            .map(|row| DropCommand::from_row(sql, row))
            .collect()
    }

    fn execute(&self, command: &DropCommand, config: &StorageConfig) -> Result<()> {
        let sql = command.as_str();
        let result = self.executor.run(sql, config).map_err(|e| match e {
            Error::Timeout => Error::Timeout,
            other => Error::Storage(StorageError::wrap(StorageErrorKind::Execution, sql, other)),
        })?;
        check_dropped(sql, &result)?;
        tracing::trace!(sql = %command, "dropped");
        Ok(())
    }
}

/// A successful drop reports one affected row and returns none.
fn check_dropped(sql: &str, result: &QueryResult) -> Result<()> {
    if result.is_single_affected() {
        return Ok(());
    }
    Err(Error::Storage(StorageError::unexpected_shape(
        sql,
        format!(
            "unexpected result: {} row(s) returned, row count {}",
            result.rows.len(),
            result.row_count
        ),
    )))
}

impl<E: Execute> StorageAdapter for OracleStorage<E> {
    fn storage_up(&self, config: &StorageConfig) -> Result<()> {
        self.create(config)
    }

    fn storage_down(&self, config: &StorageConfig) -> Result<()> {
        self.destroy(config)
    }

    fn storage_status(&self, config: &StorageConfig) -> Result<StorageState> {
        self.status(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{OBJECTS_PROBE, RELATIONS_PROBE};
    use crate::testing::ScriptedExecutor;

    fn populated() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .rows(RELATIONS_PROBE, &["EMP", "DEPT", "BONUS"])
            .rows(OBJECTS_PROBE, &["EMP_SEQ", "EMP_V"])
            .rows(
                TABLE_DROPS_PROBE,
                &[
                    "DROP TABLE EMP CASCADE CONSTRAINTS",
                    "DROP TABLE DEPT CASCADE CONSTRAINTS",
                    "DROP TABLE BONUS CASCADE CONSTRAINTS",
                ],
            )
            .rows(OBJECT_DROPS_PROBE, &["DROP SEQUENCE EMP_SEQ", "DROP VIEW EMP_V"])
            .otherwise_affected(1)
    }

    fn empty() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .rows(RELATIONS_PROBE, &[])
            .rows(OBJECTS_PROBE, &[])
    }

    #[test]
    fn object_drops_probe_covers_the_object_kinds() {
        for kind in inspect::OBJECT_KINDS {
            assert!(OBJECT_DROPS_PROBE.contains(&format!("'{kind}'")), "{kind}");
        }
        assert!(TABLE_DROPS_PROBE.contains("CASCADE CONSTRAINTS"));
    }

    #[test]
    fn destroy_drops_tables_then_objects_in_probe_order() {
        let exec = populated();
        let storage = OracleStorage::with_executor(exec);
        storage.destroy(&StorageConfig::default()).unwrap();

        assert_eq!(
            storage.executor().executed(),
            vec![
                RELATIONS_PROBE,
                OBJECTS_PROBE,
                TABLE_DROPS_PROBE,
                "DROP TABLE EMP CASCADE CONSTRAINTS",
                "DROP TABLE DEPT CASCADE CONSTRAINTS",
                "DROP TABLE BONUS CASCADE CONSTRAINTS",
                OBJECT_DROPS_PROBE,
                "DROP SEQUENCE EMP_SEQ",
                "DROP VIEW EMP_V",
            ]
        );
    }

    #[test]
    fn destroy_on_empty_storage_is_already_down() {
        let storage = OracleStorage::with_executor(empty());
        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::AlreadyDown));
        assert_eq!(
            storage.executor().executed(),
            vec![RELATIONS_PROBE, OBJECTS_PROBE]
        );
    }

    #[test]
    fn create_on_populated_storage_is_already_up() {
        let storage = OracleStorage::with_executor(populated());
        let err = storage.create(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::AlreadyUp));
        assert_eq!(storage.executor().executed().len(), 2);
    }

    #[test]
    fn create_on_empty_storage_runs_no_statements() {
        let storage = OracleStorage::with_executor(empty());
        storage.create(&StorageConfig::default()).unwrap();
        assert_eq!(
            storage.executor().executed(),
            vec![RELATIONS_PROBE, OBJECTS_PROBE]
        );
    }

    #[test]
    fn first_failing_drop_halts_everything_after_it() {
        let exec = populated().fail(
            "DROP TABLE DEPT CASCADE CONSTRAINTS",
            "ORA-00054",
            "resource busy and acquire with NOWAIT specified or timeout expired",
        );
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::Execution));
        assert_eq!(err.code(), Some("ORA-00054"));
        assert_eq!(err.sql(), Some("DROP TABLE DEPT CASCADE CONSTRAINTS"));
        assert_eq!(
            err.to_string(),
            "ORA-00054: resource busy and acquire with NOWAIT specified or timeout expired"
        );

        let executed = storage.executor().executed();
        assert_eq!(executed.last().unwrap(), "DROP TABLE DEPT CASCADE CONSTRAINTS");
        assert!(!executed.iter().any(|s| s.contains("BONUS")));
        assert!(!executed.iter().any(|s| s == OBJECT_DROPS_PROBE));
    }

    #[test]
    fn failing_object_drop_keeps_table_drops() {
        let exec = populated().fail("DROP SEQUENCE EMP_SEQ", "ORA-02289", "sequence does not exist");
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "ORA-02289: sequence does not exist");
        let executed = storage.executor().executed();
        assert_eq!(
            executed.iter().filter(|s| s.starts_with("DROP TABLE")).count(),
            3
        );
        assert!(!executed.iter().any(|s| s == "DROP VIEW EMP_V"));
    }

    #[test]
    fn drop_timeout_is_reported_as_timeout() {
        let exec = populated().timeout("DROP TABLE EMP CASCADE CONSTRAINTS");
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "command timed out");
        assert_eq!(
            storage.executor().executed().last().unwrap(),
            "DROP TABLE EMP CASCADE CONSTRAINTS"
        );
    }

    #[test]
    fn drop_with_wrong_shape_halts() {
        let exec = populated().result(
            "DROP TABLE EMP CASCADE CONSTRAINTS",
            QueryResult::affected(0),
        );
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::UnexpectedShape));
        assert_eq!(
            storage.executor().executed().last().unwrap(),
            "DROP TABLE EMP CASCADE CONSTRAINTS"
        );
    }

    #[test]
    fn drop_returning_rows_is_unexpected() {
        let exec = populated().rows("DROP TABLE EMP CASCADE CONSTRAINTS", &["surprise"]);
        let storage = OracleStorage::with_executor(exec);
        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::UnexpectedShape));
    }

    #[test]
    fn generating_probe_failure_is_a_probe_error() {
        let exec = populated().fail(OBJECT_DROPS_PROBE, "ORA-00942", "table or view does not exist");
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::Probe));
        assert_eq!(err.sql(), Some(OBJECT_DROPS_PROBE));
        let executed = storage.executor().executed();
        assert_eq!(
            executed.iter().filter(|s| s.starts_with("DROP TABLE")).count(),
            3
        );
    }

    #[test]
    fn generated_row_must_be_a_drop_statement() {
        let exec = populated().rows(TABLE_DROPS_PROBE, &["TRUNCATE TABLE EMP"]);
        let storage = OracleStorage::with_executor(exec);

        let err = storage.destroy(&StorageConfig::default()).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::UnexpectedShape));
        assert_eq!(storage.executor().executed().last().unwrap(), TABLE_DROPS_PROBE);
    }

    #[test]
    fn drop_command_from_row() {
        let ok = DropCommand::from_row("probe", &[Value::from("DROP VIEW V1")]).unwrap();
        assert_eq!(ok.as_str(), "DROP VIEW V1");
        assert_eq!(ok.to_string(), "DROP VIEW V1");

        let err = DropCommand::from_row("probe", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageErrorKind::UnexpectedShape));
        assert!(DropCommand::from_row("probe", &[]).is_err());
    }

    #[test]
    fn adapter_trait_delegates() {
        let storage = OracleStorage::with_executor(populated());
        let adapter: &dyn StorageAdapter = &storage;
        assert_eq!(
            adapter.storage_status(&StorageConfig::default()).unwrap(),
            StorageState::Up
        );
        assert!(adapter.storage_up(&StorageConfig::default()).is_err());
    }
}
