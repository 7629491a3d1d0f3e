//! Isolated query execution.
//!
//! Administrative statements run on a private connection opened for that one
//! statement, inside a detached task on the storage [`Supervisor`], under a
//! deadline. Nothing here touches the application's connection pool.

use std::any::TypeId;
use std::fmt;
use std::pin::pin;
use std::sync::Arc;

use futures::future::{Either, select};
use oradapter_core::error::{ConnectionError, ConnectionErrorKind, ProtocolError, Result};
use oradapter_core::{Driver, Error, Outcome, QueryOptions, QueryResult, StorageConfig};

use crate::supervisor::{CancelSignal, Supervisor};

/// Runs one administrative statement and reports its result.
///
/// This is the seam the inspector and the lifecycle orchestrator run every
/// statement through.
pub trait Execute {
    fn run(&self, sql: &str, config: &StorageConfig) -> Result<QueryResult>;
}

/// Executes each statement on its own connection inside an isolated task.
pub struct IsolatedExecutor<D: Driver> {
    driver: Arc<D>,
    supervisor: Arc<Supervisor>,
}

impl<D: Driver> IsolatedExecutor<D> {
    /// Create an executor on the shared storage supervisor.
    pub fn new(driver: D) -> Self {
        Self::with_supervisor(driver, Supervisor::storage())
    }

    /// Create an executor on a specific supervision boundary.
    pub fn with_supervisor(driver: D, supervisor: Arc<Supervisor>) -> Self {
        Self {
            driver: Arc::new(driver),
            supervisor,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Start the driver's runtime dependencies once per driver type on the
    /// supervisor, shared by every executor on it.
    ///
    /// A failed start is not remembered, so the next call tries again.
    pub fn ensure_started(&self) -> Result<()> {
        self.supervisor
            .start_once(TypeId::of::<D>(), || self.start_driver())
    }

    fn start_driver(&self) -> Result<()> {
        self.driver.start().map_err(|e| {
            tracing::error!(error = %e, "driver failed to start");
            match e {
                Error::Connection(_) => e,
                other => Error::Connection(ConnectionError {
                    kind: ConnectionErrorKind::Startup,
                    message: format!("driver failed to start: {other}"),
                    source: Some(Box::new(other)),
                }),
            }
        })
    }
}

impl<D: Driver> Execute for IsolatedExecutor<D> {
    #[tracing::instrument(level = "debug", skip(self, config), fields(timeout_ms = tracing::field::Empty))]
    fn run(&self, sql: &str, config: &StorageConfig) -> Result<QueryResult> {
        self.ensure_started()?;

        let admin = config.admin();
        let deadline = admin.timeout;
        tracing::Span::current().record("timeout_ms", deadline.as_millis() as u64);

        let driver = Arc::clone(&self.driver);
        let statement = sql.to_string();
        let handle = self
            .supervisor
            .spawn(move |cancel| run_isolated(driver, admin, statement, cancel))?;

        let result = handle.wait(deadline);
        match &result {
            Ok(r) => tracing::trace!(row_count = r.row_count, "statement finished"),
            Err(e) => tracing::debug!(error = %e, "statement failed"),
        }
        result
    }
}

impl<D: Driver> fmt::Debug for IsolatedExecutor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedExecutor")
            .field("supervisor", &self.supervisor.name())
            .finish_non_exhaustive()
    }
}

/// The unit of work: connect, run one statement, always close.
async fn run_isolated<D: Driver>(
    driver: Arc<D>,
    config: StorageConfig,
    sql: String,
    mut cancel: CancelSignal,
) -> Result<QueryResult> {
    let opts = QueryOptions {
        timeout: config.timeout,
        log: false,
    };

    let connect = pin!(driver.connect(&config));
    let mut conn = match select(connect, &mut cancel).await {
        Either::Left((outcome, _)) => outcome_to_result(outcome)?,
        Either::Right(_) => {
            tracing::debug!("cancelled while connecting");
            return Err(Error::Cancelled);
        }
    };

    let result = {
        let query = pin!(driver.query(&mut conn, &sql, &[], &opts));
        match select(query, &mut cancel).await {
            Either::Left((outcome, _)) => outcome_to_result(outcome),
            Either::Right(_) => {
                tracing::debug!(sql = %sql, "cancelled while running statement");
                Err(Error::Cancelled)
            }
        }
    };

    driver.close(conn).await;
    result
}

/// Fold a driver outcome into a plain result.
fn outcome_to_result<T>(outcome: Outcome<T, Error>) -> Result<T> {
    match outcome {
        Outcome::Ok(v) => Ok(v),
        Outcome::Err(e) => Err(e),
        Outcome::Cancelled(r) => {
            tracing::debug!(reason = ?r, "driver reported cancellation");
            Err(Error::Cancelled)
        }
        Outcome::Panicked(p) => Err(Error::Protocol(ProtocolError {
            message: format!("driver crashed: {p:?}"),
            source: None,
        })),
    }
}
