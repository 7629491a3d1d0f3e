//! The wire driver seam.
//!
//! The adapter never speaks the wire protocol itself. It needs exactly three
//! things from a driver:
//!
//! - [`Driver::connect`] - open one connection from a [`StorageConfig`]
//! - [`Driver::query`] - run one statement on that connection
//! - [`Driver::close`] - release the connection
//!
//! Operations return asupersync's [`Outcome`], so a driver can report
//! cancellation and crashes distinctly from ordinary errors. The adapter
//! folds all four variants into a plain `Result` before anything leaves it.

use std::future::Future;
use std::time::Duration;

use asupersync::Outcome;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::value::Value;

/// Rows and affected-row count returned by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column names in order (may be empty for DDL)
    pub columns: Vec<String>,
    /// Result rows in the order the server returned them
    pub rows: Vec<Vec<Value>>,
    /// Rows returned for queries, rows affected for statements
    pub row_count: u64,
}

impl QueryResult {
    /// Build a result for a query that returned `rows`.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Build a result for a statement that affected `count` rows.
    pub fn affected(count: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: count,
        }
    }

    /// Did this statement report exactly one affected row and no row payload?
    pub fn is_single_affected(&self) -> bool {
        self.row_count == 1 && self.rows.is_empty()
    }
}

/// Per-statement options handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Deadline the caller enforces; drivers may use it for server-side limits
    pub timeout: Duration,
    /// Whether the framework's query logging applies
    pub log: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: crate::config::DEFAULT_TIMEOUT,
            log: true,
        }
    }
}

/// A wire driver capable of opening connections and running statements.
///
/// Connections are owned values: [`close`](Driver::close) consumes them.
/// If a connection is dropped without `close` (its task was torn down), the
/// driver's `Drop` for the connection is responsible for releasing it.
pub trait Driver: Send + Sync + 'static {
    /// A live connection.
    type Conn: Send + 'static;

    /// Start the driver's runtime dependencies.
    ///
    /// Must be idempotent. The default does nothing.
    fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Open one connection.
    fn connect(
        &self,
        config: &StorageConfig,
    ) -> impl Future<Output = Outcome<Self::Conn, Error>> + Send;

    /// Run one statement.
    fn query(
        &self,
        conn: &mut Self::Conn,
        sql: &str,
        params: &[Value],
        opts: &QueryOptions,
    ) -> impl Future<Output = Outcome<QueryResult, Error>> + Send;

    /// Close a connection.
    fn close(&self, conn: Self::Conn) -> impl Future<Output = ()> + Send;
}
