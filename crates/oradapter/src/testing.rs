//! In-process executor double for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use oradapter_core::error::{QueryError, Result};
use oradapter_core::{Error, QueryResult, StorageConfig, Value};

use crate::executor::Execute;

#[derive(Debug, Clone)]
enum Response {
    Result(QueryResult),
    Fail { code: String, message: String },
    Timeout,
}

/// Answers statements from a script and records what was run, in order.
#[derive(Debug, Default)]
pub(crate) struct ScriptedExecutor {
    script: HashMap<String, Response>,
    fallback: Option<Response>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with one text column holding `values`.
    pub(crate) fn rows(self, sql: &str, values: &[&str]) -> Self {
        let rows = values.iter().map(|v| vec![Value::from(*v)]).collect();
        self.result(sql, QueryResult::with_rows(vec!["COLUMN".to_string()], rows))
    }

    pub(crate) fn result(mut self, sql: &str, result: QueryResult) -> Self {
        self.script
            .insert(sql.to_string(), Response::Result(result));
        self
    }

    pub(crate) fn fail(mut self, sql: &str, code: &str, message: &str) -> Self {
        self.script.insert(
            sql.to_string(),
            Response::Fail {
                code: code.to_string(),
                message: message.to_string(),
            },
        );
        self
    }

    pub(crate) fn timeout(mut self, sql: &str) -> Self {
        self.script.insert(sql.to_string(), Response::Timeout);
        self
    }

    /// Answer any unscripted statement with `count` affected rows.
    pub(crate) fn otherwise_affected(mut self, count: u64) -> Self {
        self.fallback = Some(Response::Result(QueryResult::affected(count)));
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }
}

impl Execute for ScriptedExecutor {
    fn run(&self, sql: &str, _config: &StorageConfig) -> Result<QueryResult> {
        self.executed
            .lock()
            .expect("executed lock")
            .push(sql.to_string());

        let response = self
            .script
            .get(sql)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Response::Fail {
                code: "ORA-00900".to_string(),
                message: format!("unscripted statement: {sql}"),
            });

        match response {
            Response::Result(result) => Ok(result),
            Response::Fail { code, message } => Err(Error::Query(QueryError {
                sql: Some(sql.to_string()),
                code: Some(code),
                message,
                source: None,
            })),
            Response::Timeout => Err(Error::Timeout),
        }
    }
}
