use postgres::{Client, NoTls};
use tracing::{debug, error, trace, warn};

use super::{Driver, DriverAdapter};
use crate::config::DbConfig;
use crate::prelude::SqlgoError;
use crate::schema::RawColumn;

/// PostgreSQL adapter, reads from a single schema (`public` by default)
#[derive(Default)]
pub struct PostgresAdapter {
    client: Option<Client>,
    schema: String,
}

impl PostgresAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&mut self) -> Result<&mut Client, SqlgoError> {
        self.client
            .as_mut()
            .ok_or_else(|| SqlgoError::Connection("PostgreSQL adapter is not connected".to_string()))
    }

    fn query_error(&self, what: &str, e: postgres::Error) -> SqlgoError {
        error!(schema = ?self.schema, error = ?e, "Failed to query {}", what);
        SqlgoError::Schema {
            database: self.schema.clone(),
            message: format!("Failed to query {what}: {e}"),
        }
    }
}

impl DriverAdapter for PostgresAdapter {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn connect(&mut self, config: &DbConfig) -> Result<(), SqlgoError> {
        let client = postgres::Config::new()
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.database)
            .connect(NoTls)
            .map_err(|e| {
                error!(error = ?e, "Failed to connect to PostgreSQL");
                SqlgoError::Connection(format!(
                    "PostgreSQL at {}: {}",
                    config.redacted_connection_string(),
                    e
                ))
            })?;

        self.client = Some(client);
        self.schema = config.schema.clone();
        Ok(())
    }

    fn list_tables(&mut self) -> Result<Vec<String>, SqlgoError> {
        trace!(schema = ?self.schema, "Querying tables");

        let sql = r#"
            SELECT c.relname AS table_name
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
                AND n.nspname = $1
            ORDER BY c.relname
        "#;

        let schema = self.schema.clone();
        let rows = self
            .client()?
            .query(sql, &[&schema])
            .map_err(|e| self.query_error("tables", e))?;

        let tables: Vec<String> = rows.iter().map(|row| row.get("table_name")).collect();
        trace!(tables = ?tables, "Tables found");
        Ok(tables)
    }

    fn list_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, SqlgoError> {
        trace!(schema = ?self.schema, table = ?table, "Querying columns");

        let exists_sql = r#"
            SELECT EXISTS (
                SELECT 1
                FROM pg_class c
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE c.relkind IN ('r', 'p')
                    AND c.relname = $1
                    AND n.nspname = $2
            ) AS found
        "#;

        let sql = r#"
            SELECT
                a.attname AS column_name,
                format_type(a.atttypid, a.atttypmod) AS data_type,
                CASE WHEN a.attnotnull THEN 'NO' ELSE 'YES' END AS is_nullable,
                CASE WHEN EXISTS (
                    SELECT 1
                    FROM pg_constraint con
                    WHERE con.conrelid = c.oid
                        AND con.contype = 'p'
                        AND a.attnum = ANY(con.conkey)
                ) THEN 'PRI' ELSE '' END AS column_key,
                col_description(c.oid, a.attnum) AS column_comment,
                a.attnum::int8 AS ordinal_position
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relname = $1
                AND n.nspname = $2
                AND a.attnum > 0
                AND NOT a.attisdropped
            ORDER BY a.attnum
        "#;

        let schema = self.schema.clone();

        let found: bool = self
            .client()?
            .query_one(exists_sql, &[&table, &schema])
            .map_err(|e| self.query_error("table existence", e))?
            .get("found");
        if !found {
            debug!(schema = ?schema, table = ?table, "Table does not exist");
            return Err(SqlgoError::Schema {
                database: schema,
                message: format!("table '{table}' does not exist"),
            });
        }

        let rows = self
            .client()?
            .query(sql, &[&table, &schema])
            .map_err(|e| self.query_error(&format!("columns for table '{table}'"), e))?;

        let columns = rows
            .iter()
            .map(|row| RawColumn {
                name: row.get("column_name"),
                sql_type: row.get("data_type"),
                nullable: row.get("is_nullable"),
                key: row.get("column_key"),
                comment: row.get("column_comment"),
                ordinal_position: row.get("ordinal_position"),
            })
            .collect();

        Ok(columns)
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close() {
                warn!(error = ?e, "Error while closing PostgreSQL connection");
            }
        }
    }
}
