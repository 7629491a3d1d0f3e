//! Storage connection configuration.
//!
//! `StorageConfig` is the parameter bag the framework passes to every storage
//! operation. The adapter never mutates it; administrative calls work on a
//! derived copy (see [`StorageConfig::admin`]).

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ConfigError, Error, Result};

/// Default deadline for a single administrative statement.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Default Oracle listener port.
pub const DEFAULT_PORT: u16 = 1521;

/// Reconnection strategy the driver applies when a connection drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Exponentially growing delay between attempts
    #[default]
    Exponential,
    /// Random delay between attempts
    Random,
    /// Never reconnect
    Stop,
}

impl Backoff {
    /// Parse the option spelling used in framework config maps.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exp" | "exponential" => Some(Backoff::Exponential),
            "rand" | "random" => Some(Backoff::Random),
            "stop" | "none" | "false" => Some(Backoff::Stop),
            _ => None,
        }
    }
}

/// Connection configuration for storage operations.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Hostname or IP address
    pub host: String,
    /// Listener port (default: 1521)
    pub port: u16,
    /// Service name or SID
    pub database: String,
    /// Username; its schema is the storage area
    pub user: String,
    /// Password
    pub password: Option<String>,
    /// Deadline for each administrative statement
    pub timeout: Duration,
    /// Name the application pool registers under
    pub pool_name: Option<String>,
    /// Size of the application pool
    pub pool_size: Option<usize>,
    /// Query logging level requested by the framework
    pub log: Option<String>,
    /// Reconnection strategy
    pub backoff: Backoff,
    /// How many times a crashed connection process may be restarted
    pub max_restarts: u32,
    /// Driver-specific options, forwarded untouched
    pub options: HashMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: String::new(),
            user: String::new(),
            password: None,
            timeout: DEFAULT_TIMEOUT,
            pool_name: None,
            pool_size: None,
            log: None,
            backoff: Backoff::default(),
            max_restarts: 3,
            options: HashMap::new(),
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given connection components.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from the framework's keyword map.
    ///
    /// Recognized keys are lifted into typed fields; everything else lands
    /// in `options` and is forwarded to the driver.
    pub fn from_options<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "hostname" | "host" => config.host = value,
                "port" => config.port = parse_number(&key, &value)?,
                "database" | "service_name" | "sid" => config.database = value,
                "username" | "user" => config.user = value,
                "password" => config.password = Some(value),
                "timeout" => config.timeout = Duration::from_millis(parse_number(&key, &value)?),
                "pool_size" => config.pool_size = Some(parse_number(&key, &value)?),
                "name" | "pool_name" => config.pool_name = Some(value),
                "log" => config.log = Some(value),
                "backoff" | "backoff_type" => {
                    config.backoff = Backoff::parse(&value).ok_or_else(|| {
                        Error::Config(ConfigError {
                            message: format!("unknown backoff '{}'", value),
                            source: None,
                        })
                    })?;
                }
                "max_restarts" => config.max_restarts = parse_number(&key, &value)?,
                _ => {
                    tracing::trace!(option = %key, "forwarding option to driver");
                    config.options.insert(key, value);
                }
            }
        }
        Ok(config)
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the per-statement deadline for administrative calls.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the application pool name.
    pub fn pool_name(mut self, name: impl Into<String>) -> Self {
        self.pool_name = Some(name.into());
        self
    }

    /// Set the application pool size.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// Set the query logging level.
    pub fn log(mut self, level: impl Into<String>) -> Self {
        self.log = Some(level.into());
        self
    }

    /// Set the reconnection strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the restart budget.
    pub fn max_restarts(mut self, n: u32) -> Self {
        self.max_restarts = n;
        self
    }

    /// Set an additional driver option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Derive the configuration used for one administrative connection.
    ///
    /// Pool identity and logging are stripped, reconnection is disabled and
    /// the restart budget is zero: a failed probe must fail, not retry.
    pub fn admin(&self) -> Self {
        Self {
            pool_name: None,
            pool_size: None,
            log: None,
            backoff: Backoff::Stop,
            max_restarts: 0,
            ..self.clone()
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e: T::Err| {
        Error::Config(ConfigError {
            message: format!("invalid value '{}' for option '{}'", value, key),
            source: Some(Box::new(e)),
        })
    })
}
