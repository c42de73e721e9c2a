//! Configuration loading
//!
//! Connection parameters come from command-line values first and fall back to
//! environment variables, optionally read from a .env file. The result is one
//! immutable [`RunConfig`] built at startup and passed to every component.

use crate::codegen::CodeGenConfig;
use crate::introspect::Driver;
use crate::prelude::SqlgoError;
use std::{env, path::Path};
use tracing::{debug, error, trace};

pub const ENV_DRIVER: &str = "DB_DRIVER";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_SCHEMA: &str = "DB_SCHEMA";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_SCHEMA: &str = "public";

/// Connection values supplied explicitly (e.g. from the command line)
///
/// Anything left as `None` is looked up in the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub driver: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub driver: Driver,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Namespace to read tables from. Only PostgreSQL uses it; MySQL reads the
    /// connected database.
    pub schema: String,
}

impl DbConfig {
    /// Load a .env file and then resolve `args` against the environment
    pub fn load(args: &ConnectionArgs, env_file: &Path) -> Result<Self, SqlgoError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                SqlgoError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            debug!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Resolve every parameter from `args`, falling back to `lookup`
    ///
    /// Required: driver, port, database, user, password. Empty values count
    /// as missing.
    pub fn resolve<F>(args: &ConnectionArgs, lookup: F) -> Result<Self, SqlgoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Resolving database configuration");

        let pick = |explicit: &Option<String>, key: &str| -> Option<String> {
            explicit
                .clone()
                .or_else(|| lookup(key))
                .filter(|value| !value.is_empty())
        };

        let require = |explicit: &Option<String>, key: &str, flag: &str| {
            pick(explicit, key).ok_or_else(|| {
                error!(variable = key, "Required connection parameter is missing");
                SqlgoError::Config(format!("--{flag} or {key} is required"))
            })
        };

        let driver_name = require(&args.driver, ENV_DRIVER, "driver")?;
        let driver: Driver = driver_name.parse()?;

        let host = pick(&args.host, ENV_HOST).unwrap_or_else(|| {
            trace!("{} not set, using default", ENV_HOST);
            DEFAULT_HOST.to_string()
        });

        let port_str = require(&args.port, ENV_PORT, "port")?;
        let port = port_str.parse::<u16>().map_err(|e| {
            error!(port = ?port_str, error = ?e, "Invalid port value");
            SqlgoError::Config(format!("{ENV_PORT} must be a valid port number"))
        })?;

        let database = require(&args.database, ENV_NAME, "database")?;
        let user = require(&args.user, ENV_USER, "user")?;
        let password = require(&args.password, ENV_PASSWORD, "password")?;

        let schema = pick(&args.schema, ENV_SCHEMA).unwrap_or_else(|| {
            trace!("{} not set, using default", ENV_SCHEMA);
            DEFAULT_SCHEMA.to_string()
        });

        debug!(
            driver = ?driver,
            host = ?host,
            port = ?port,
            database = ?database,
            user = ?user,
            schema = ?schema,
            "Configuration resolved"
        );

        Ok(Self {
            driver,
            host,
            port,
            database,
            user,
            password,
            schema,
        })
    }

    /// Build a connection description with password redacted (for logs and errors)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "driver={} host={} port={} dbname={} user={} password=***",
            self.driver, self.host, self.port, self.database, self.user
        )
    }
}

/// Everything one run needs, built once and never mutated
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub db: DbConfig,
    /// Only generate this table; `None` means every table
    pub table: Option<String>,
    pub codegen: CodeGenConfig,
}

impl RunConfig {
    pub fn new(db: DbConfig, codegen: CodeGenConfig) -> Self {
        Self {
            db,
            table: None,
            codegen,
        }
    }

    pub fn with_table(mut self, table: Option<String>) -> Self {
        self.table = table.filter(|t| !t.is_empty());
        self
    }

    pub fn driver(&self) -> Driver {
        self.db.driver
    }
}
