//! Database introspection
//!
//! This module provides functionality for reading table metadata from
//! databases. Each supported engine has its own feature-gated adapter; the
//! rest of the crate only sees the [`DriverAdapter`] trait.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, trace};

use crate::config::DbConfig;
use crate::prelude::SqlgoError;
use crate::schema::{Column, RawColumn};

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    MySql,
    Postgres,
}

impl Driver {
    pub fn name(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Driver {
    type Err = SqlgoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pgsql" | "pg" => Ok(Driver::Postgres),
            other => Err(SqlgoError::Config(format!(
                "unsupported driver '{other}', expected one of: mysql, postgres"
            ))),
        }
    }
}

/// Metadata queries for one database engine
///
/// An adapter starts disconnected; [`DriverAdapter::connect`] must succeed
/// before the `list_*` methods are used.
pub trait DriverAdapter {
    fn driver(&self) -> Driver;

    /// Open the connection
    fn connect(&mut self, config: &DbConfig) -> Result<(), SqlgoError>;

    /// Base tables of the target schema in name order, system catalogs excluded
    fn list_tables(&mut self) -> Result<Vec<String>, SqlgoError>;

    /// Columns of `table` in ordinal order; fails if the table does not exist
    fn list_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, SqlgoError>;

    /// Release the connection. Idempotent and best-effort.
    fn close(&mut self);
}

/// Build a disconnected adapter for `driver`
pub fn adapter_for(driver: Driver) -> Result<Box<dyn DriverAdapter>, SqlgoError> {
    debug!(driver = ?driver, "Selecting driver adapter");
    match driver {
        Driver::MySql => mysql_adapter(),
        Driver::Postgres => postgres_adapter(),
    }
}

#[cfg(feature = "mysql")]
fn mysql_adapter() -> Result<Box<dyn DriverAdapter>, SqlgoError> {
    Ok(Box::new(MySqlAdapter::new()))
}

#[cfg(not(feature = "mysql"))]
fn mysql_adapter() -> Result<Box<dyn DriverAdapter>, SqlgoError> {
    Err(SqlgoError::Config(
        "MySQL support not enabled. Rebuild with --features mysql".to_string(),
    ))
}

#[cfg(feature = "postgres")]
fn postgres_adapter() -> Result<Box<dyn DriverAdapter>, SqlgoError> {
    Ok(Box::new(PostgresAdapter::new()))
}

#[cfg(not(feature = "postgres"))]
fn postgres_adapter() -> Result<Box<dyn DriverAdapter>, SqlgoError> {
    Err(SqlgoError::Config(
        "PostgreSQL support not enabled. Rebuild with --features postgres".to_string(),
    ))
}

/// A connected adapter that is closed when dropped
pub struct Connection {
    adapter: Box<dyn DriverAdapter>,
}

impl Connection {
    /// Connect `adapter`. On failure the adapter is closed before returning.
    pub fn open(mut adapter: Box<dyn DriverAdapter>, config: &DbConfig) -> Result<Self, SqlgoError> {
        info!(connection = ?config.redacted_connection_string(), "Connecting to database");
        if let Err(e) = adapter.connect(config) {
            adapter.close();
            return Err(e);
        }
        info!(driver = ?adapter.driver(), "Connected to database");
        Ok(Self { adapter })
    }

    pub fn driver(&self) -> Driver {
        self.adapter.driver()
    }

    pub fn reader(&mut self) -> SchemaReader<'_> {
        SchemaReader::new(self.adapter.as_mut())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!(driver = ?self.adapter.driver(), "Closing database connection");
        self.adapter.close();
    }
}

/// Table and column lookups on top of a connected adapter
pub struct SchemaReader<'a> {
    adapter: &'a mut dyn DriverAdapter,
}

impl<'a> SchemaReader<'a> {
    pub fn new(adapter: &'a mut dyn DriverAdapter) -> Self {
        Self { adapter }
    }

    /// All table names, exactly as the adapter reports them
    pub fn find_tables(&mut self) -> Result<Vec<String>, SqlgoError> {
        let tables = self.adapter.list_tables()?;
        debug!(count = ?tables.len(), "Found tables");
        trace!(tables = ?tables, "Tables found");
        Ok(tables)
    }

    /// Normalized columns of `table`, sorted by ordinal position
    pub fn find_columns(&mut self, table: &str) -> Result<Vec<Column>, SqlgoError> {
        let raw = self.adapter.list_columns(table)?;

        let mut columns: Vec<Column> = raw.into_iter().map(Column::from).collect();
        columns.sort_by_key(|col| col.ordinal_position);

        for col in &columns {
            trace!(
                table = ?table,
                column = ?col.name,
                sql_type = ?col.sql_type,
                is_nullable = ?col.is_nullable,
                is_primary_key = ?col.is_primary_key,
                ordinal = ?col.ordinal_position,
                "Column"
            );
        }
        debug!(table = ?table, columns = ?columns.len(), "Found columns");

        Ok(columns)
    }
}

// Feature-gated database implementations
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "mysql")]
pub use mysql::MySqlAdapter;
#[cfg(feature = "postgres")]
pub use postgres::PostgresAdapter;


#[cfg(test)]
mod tests {
    use super::fake::{raw_column, FakeAdapter};
    use super::*;

    fn db_config() -> DbConfig {
        DbConfig {
            driver: Driver::MySql,
            host: "localhost".to_string(),
            port: 3306,
            database: "shop".to_string(),
            user: "root".to_string(),
            password: "secret".to_string(),
            schema: "public".to_string(),
        }
    }

    #[test]
    fn test_driver_from_str() {
        assert_eq!("mysql".parse::<Driver>().unwrap(), Driver::MySql);
        assert_eq!("MySQL".parse::<Driver>().unwrap(), Driver::MySql);
        assert_eq!("pgsql".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("postgresql".parse::<Driver>().unwrap(), Driver::Postgres);
        assert!(matches!(
            "sqlite".parse::<Driver>(),
            Err(SqlgoError::Config(_))
        ));
    }

    #[test]
    fn test_find_tables_passthrough() {
        let mut adapter = FakeAdapter::new(Driver::MySql)
            .with_table("users", vec![])
            .with_table("orders", vec![]);
        adapter.connect(&db_config()).unwrap();

        let mut reader = SchemaReader::new(&mut adapter);

        assert_eq!(reader.find_tables().unwrap(), vec!["users", "orders"]);
    }

    #[test]
    fn test_find_columns_sorted_by_ordinal() {
        let mut adapter = FakeAdapter::new(Driver::MySql).with_table(
            "users",
            vec![
                raw_column("email", "varchar(255)", true, false, 3),
                raw_column("id", "int", false, true, 1),
                raw_column("name", "text", false, false, 2),
            ],
        );
        adapter.connect(&db_config()).unwrap();

        let columns = SchemaReader::new(&mut adapter).find_columns("users").unwrap();

        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert!(columns[0].is_primary_key);
        assert!(columns[2].is_nullable);
    }

    #[test]
    fn test_find_columns_missing_table() {
        let mut adapter = FakeAdapter::new(Driver::MySql);
        adapter.connect(&db_config()).unwrap();

        let result = SchemaReader::new(&mut adapter).find_columns("ghost");

        assert!(matches!(result, Err(SqlgoError::Schema { .. })));
    }

    #[test]
    fn test_connection_closes_on_drop() {
        let adapter = FakeAdapter::new(Driver::MySql);
        let closes = adapter.closes.clone();

        {
            let mut conn = Connection::open(Box::new(adapter), &db_config()).unwrap();
            assert_eq!(conn.driver(), Driver::MySql);
            assert!(conn.reader().find_tables().unwrap().is_empty());
            assert_eq!(closes.get(), 0);
        }

        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_connection_open_failure_closes_adapter() {
        let mut adapter = FakeAdapter::new(Driver::Postgres);
        adapter.fail_connect = true;
        let closes = adapter.closes.clone();

        let result = Connection::open(Box::new(adapter), &db_config());

        assert!(matches!(result, Err(SqlgoError::Connection(_))));
        assert_eq!(closes.get(), 1);
    }
}
