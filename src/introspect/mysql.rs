use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};
use tracing::{debug, error, trace};

use super::{Driver, DriverAdapter};
use crate::config::DbConfig;
use crate::prelude::SqlgoError;
use crate::schema::RawColumn;

/// MySQL adapter, reads from the connected database
#[derive(Default)]
pub struct MySqlAdapter {
    conn: Option<Conn>,
    database: String,
}

impl MySqlAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(&mut self) -> Result<&mut Conn, SqlgoError> {
        self.conn
            .as_mut()
            .ok_or_else(|| SqlgoError::Connection("MySQL adapter is not connected".to_string()))
    }

    fn query_error(&self, what: &str, e: mysql::Error) -> SqlgoError {
        error!(database = ?self.database, error = ?e, "Failed to query {}", what);
        SqlgoError::Schema {
            database: self.database.clone(),
            message: format!("Failed to query {what}: {e}"),
        }
    }
}

impl DriverAdapter for MySqlAdapter {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn connect(&mut self, config: &DbConfig) -> Result<(), SqlgoError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.as_str()))
            .tcp_port(config.port)
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            .db_name(Some(config.database.as_str()));

        let conn = Conn::new(opts).map_err(|e| {
            error!(error = ?e, "Failed to connect to MySQL");
            SqlgoError::Connection(format!(
                "MySQL at {}: {}",
                config.redacted_connection_string(),
                e
            ))
        })?;

        self.conn = Some(conn);
        self.database = config.database.clone();
        Ok(())
    }

    fn list_tables(&mut self) -> Result<Vec<String>, SqlgoError> {
        trace!(database = ?self.database, "Querying tables");

        let sql = r#"
            SELECT TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
                AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let tables: Vec<String> = self
            .conn()?
            .query(sql)
            .map_err(|e| self.query_error("tables", e))?;

        trace!(tables = ?tables, "Tables found");
        Ok(tables)
    }

    fn list_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, SqlgoError> {
        trace!(database = ?self.database, table = ?table, "Querying columns");

        let exists_sql = r#"
            SELECT COUNT(*)
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
                AND TABLE_TYPE = 'BASE TABLE'
                AND TABLE_NAME = ?
        "#;

        let sql = r#"
            SELECT
                COLUMN_NAME,
                COLUMN_TYPE,
                IS_NULLABLE,
                COLUMN_KEY,
                COLUMN_COMMENT,
                ORDINAL_POSITION
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE()
                AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let found: Option<u64> = self
            .conn()?
            .exec_first(exists_sql, (table,))
            .map_err(|e| self.query_error("table existence", e))?;
        if found.unwrap_or(0) == 0 {
            debug!(database = ?self.database, table = ?table, "Table does not exist");
            return Err(SqlgoError::Schema {
                database: self.database.clone(),
                message: format!("table '{table}' does not exist"),
            });
        }

        let rows: Vec<(String, String, String, String, Option<String>, i64)> = self
            .conn()?
            .exec(sql, (table,))
            .map_err(|e| self.query_error(&format!("columns for table '{table}'"), e))?;

        let columns = rows
            .into_iter()
            .map(
                |(name, sql_type, nullable, key, comment, ordinal_position)| RawColumn {
                    name,
                    sql_type,
                    nullable,
                    key,
                    comment,
                    ordinal_position,
                },
            )
            .collect();

        Ok(columns)
    }

    fn close(&mut self) {
        // Dropping the connection sends COM_QUIT
        if self.conn.take().is_some() {
            debug!(database = ?self.database, "MySQL connection released");
        }
    }
}
