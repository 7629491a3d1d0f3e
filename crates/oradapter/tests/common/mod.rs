//! In-memory driver used by the integration tests.
//!
//! Keeps a tiny catalog of tables and named objects, answers the catalog
//! probes from it, applies generated drops to it, and records everything the
//! adapter asks of it.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use oradapter::{OBJECT_DROPS_PROBE, OBJECTS_PROBE, RELATIONS_PROBE, TABLE_DROPS_PROBE};
use oradapter_core::error::{ConnectionError, ConnectionErrorKind, QueryError};
use oradapter_core::{Driver, Error, Outcome, QueryOptions, QueryResult, StorageConfig, Value};

#[derive(Debug, Default)]
struct Catalog {
    tables: Vec<String>,
    /// `(kind, name)` pairs
    objects: Vec<(String, String)>,
    executed: Vec<String>,
    configs: Vec<StorageConfig>,
    drops_seen: usize,
    fail_drop_at: Option<usize>,
    hang_on: Option<String>,
    panic_on: Option<String>,
    refuse_connect: bool,
    start_error: Option<String>,
}

#[derive(Debug, Default)]
struct Counters {
    starts: AtomicUsize,
    connects: AtomicUsize,
    closes: AtomicUsize,
    released: AtomicUsize,
}

/// Cheap to clone; clones share one catalog.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    catalog: Arc<Mutex<Catalog>>,
    counters: Arc<Counters>,
}

/// A connection. Dropping it counts as releasing it.
#[derive(Debug)]
pub struct FakeConn {
    counters: Arc<Counters>,
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

enum Reply {
    Done(Outcome<QueryResult, Error>),
    Hang,
    Panic,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(self, names: &[&str]) -> Self {
        self.catalog().tables.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_object(self, kind: &str, name: &str) -> Self {
        self.catalog()
            .objects
            .push((kind.to_string(), name.to_string()));
        self
    }

    /// Fail the drop statement at `index` (zero-based, counted across phases).
    pub fn fail_drop_at(self, index: usize) -> Self {
        self.catalog().fail_drop_at = Some(index);
        self
    }

    /// Never answer the statement `sql`.
    pub fn hang_on(self, sql: &str) -> Self {
        self.catalog().hang_on = Some(sql.to_string());
        self
    }

    /// Panic while running the statement `sql`.
    pub fn panic_on(self, sql: &str) -> Self {
        self.catalog().panic_on = Some(sql.to_string());
        self
    }

    pub fn refuse_connections(self) -> Self {
        self.catalog().refuse_connect = true;
        self
    }

    pub fn set_start_error(&self, message: Option<&str>) {
        self.catalog().start_error = message.map(str::to_string);
    }

    pub fn tables(&self) -> Vec<String> {
        self.catalog().tables.clone()
    }

    pub fn objects(&self) -> Vec<(String, String)> {
        self.catalog().objects.clone()
    }

    /// Every statement run, in order.
    pub fn executed(&self) -> Vec<String> {
        self.catalog().executed.clone()
    }

    /// Only the drop statements, in order.
    pub fn drops(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|sql| sql.starts_with("DROP "))
            .collect()
    }

    pub fn configs(&self) -> Vec<StorageConfig> {
        self.catalog().configs.clone()
    }

    pub fn starts(&self) -> usize {
        self.counters.starts.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    fn catalog(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().expect("catalog lock")
    }

    fn respond(&self, sql: &str) -> Reply {
        let mut catalog = self.catalog();
        catalog.executed.push(sql.to_string());

        if catalog.hang_on.as_deref() == Some(sql) {
            return Reply::Hang;
        }
        if catalog.panic_on.as_deref() == Some(sql) {
            return Reply::Panic;
        }

        let result = match sql {
            RELATIONS_PROBE => rows(catalog.tables.iter().cloned()),
            OBJECTS_PROBE => rows(catalog.objects.iter().map(|(_, name)| name.clone())),
            TABLE_DROPS_PROBE => rows(
                catalog
                    .tables
                    .iter()
                    .map(|t| format!("DROP TABLE {t} CASCADE CONSTRAINTS")),
            ),
            OBJECT_DROPS_PROBE => rows(
                catalog
                    .objects
                    .iter()
                    .map(|(kind, name)| format!("DROP {kind} {name}")),
            ),
            stmt if stmt.starts_with("DROP ") => {
                let index = catalog.drops_seen;
                catalog.drops_seen += 1;
                if catalog.fail_drop_at == Some(index) {
                    return Reply::Done(Outcome::Err(ora_error(
                        sql,
                        "ORA-00054",
                        "resource busy and acquire with NOWAIT specified or timeout expired",
                    )));
                }
                match apply_drop(&mut catalog, stmt) {
                    Some(()) => QueryResult::affected(1),
                    None => {
                        return Reply::Done(Outcome::Err(ora_error(
                            sql,
                            "ORA-00942",
                            "table or view does not exist",
                        )));
                    }
                }
            }
            _ => {
                return Reply::Done(Outcome::Err(ora_error(
                    sql,
                    "ORA-00900",
                    "invalid SQL statement",
                )));
            }
        };
        Reply::Done(Outcome::Ok(result))
    }
}

fn rows(values: impl Iterator<Item = String>) -> QueryResult {
    QueryResult::with_rows(
        vec!["NAME".to_string()],
        values.map(|v| vec![Value::Text(v)]).collect(),
    )
}

fn apply_drop(catalog: &mut Catalog, sql: &str) -> Option<()> {
    if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
        let name = rest.strip_suffix(" CASCADE CONSTRAINTS").unwrap_or(rest);
        let pos = catalog.tables.iter().position(|t| t == name)?;
        catalog.tables.remove(pos);
        return Some(());
    }
    let rest = sql.strip_prefix("DROP ")?;
    let (kind, name) = rest.split_once(' ')?;
    let pos = catalog
        .objects
        .iter()
        .position(|(k, n)| k == kind && n == name)?;
    catalog.objects.remove(pos);
    Some(())
}

pub fn ora_error(sql: &str, code: &str, message: &str) -> Error {
    Error::Query(QueryError {
        sql: Some(sql.to_string()),
        code: Some(code.to_string()),
        message: message.to_string(),
        source: None,
    })
}

impl Driver for FakeDriver {
    type Conn = FakeConn;

    fn start(&self) -> oradapter_core::Result<()> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        match self.catalog().start_error.clone() {
            Some(message) => Err(Error::Custom(message)),
            None => Ok(()),
        }
    }

    fn connect(
        &self,
        config: &StorageConfig,
    ) -> impl Future<Output = Outcome<FakeConn, Error>> + Send {
        let refused = {
            let mut catalog = self.catalog();
            catalog.configs.push(config.clone());
            catalog.refuse_connect
        };
        let counters = Arc::clone(&self.counters);
        async move {
            if refused {
                return Outcome::Err(Error::Connection(ConnectionError {
                    kind: ConnectionErrorKind::Refused,
                    message: "ORA-12541: TNS:no listener".to_string(),
                    source: None,
                }));
            }
            counters.connects.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(FakeConn { counters })
        }
    }

    fn query(
        &self,
        _conn: &mut FakeConn,
        sql: &str,
        _params: &[Value],
        _opts: &QueryOptions,
    ) -> impl Future<Output = Outcome<QueryResult, Error>> + Send {
        let reply = self.respond(sql);
        let sql = sql.to_string();
        async move {
            match reply {
                Reply::Done(outcome) => outcome,
                Reply::Hang => std::future::pending().await,
                Reply::Panic => panic!("fake driver blew up on {sql}"),
            }
        }
    }

    fn close(&self, conn: FakeConn) -> impl Future<Output = ()> + Send {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        async move { drop(conn) }
    }
}

/// Poll `check` until it holds or two seconds pass.
pub fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

/// A config whose statements give up quickly.
pub fn quick_config() -> StorageConfig {
    StorageConfig::new("db.test", "scott", "ORCLPDB1")
        .password("tiger")
        .timeout(Duration::from_millis(500))
}
