//! Run orchestration
//!
//! Drives one sequential run: list tables, then for each selected table read
//! its columns, render it and write it. The first error stops the run; files
//! written before it stay on disk.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::codegen::CodeGenerator;
use crate::config::RunConfig;
use crate::error::SqlgoError;
use crate::introspect::Connection;
use crate::output::{file_name_for, write_table_file};
use crate::schema::Table;

/// Generate files for the configured tables, returning the paths written
pub fn run<G>(
    config: &RunConfig,
    connection: &mut Connection,
    generator: &G,
) -> Result<Vec<PathBuf>, SqlgoError>
where
    G: CodeGenerator + ?Sized,
{
    let mut reader = connection.reader();

    let tables = reader.find_tables()?;
    if tables.is_empty() {
        info!(database = ?config.db.database, "Database has no tables, nothing to generate");
        return Ok(Vec::new());
    }

    let selected = match &config.table {
        Some(name) => {
            if !tables.iter().any(|t| t == name) {
                return Err(SqlgoError::Schema {
                    database: config.db.database.clone(),
                    message: format!("table '{name}' not found"),
                });
            }
            vec![name.clone()]
        }
        None => {
            warn!(count = tables.len(), "No table selected, generating every table");
            tables
        }
    };

    check_file_names(&config.db.database, &selected)?;

    let out_dir = &config.codegen.output_path;
    let mut written = Vec::with_capacity(selected.len());
    for name in selected {
        debug!(table = ?name, "Processing table");

        let columns = reader.find_columns(&name)?;
        let table = Table { name, columns };

        let code = generator.render_table(config.driver(), &table, &config.codegen)?;
        let path = write_table_file(&table.name, &code, out_dir)?;

        info!(table = ?table.name, path = ?path, "Generated");
        written.push(path);
    }

    info!(files = written.len(), output = ?out_dir, "Code generation complete");
    Ok(written)
}

/// Fail before writing anything if two tables would share one output file
fn check_file_names(database: &str, tables: &[String]) -> Result<(), SqlgoError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(tables.len());
    for table in tables {
        let file_name = file_name_for(table);
        if let Some(previous) = seen.get(&file_name) {
            return Err(SqlgoError::Schema {
                database: database.to_string(),
                message: format!(
                    "tables '{previous}' and '{table}' would both be written to '{file_name}'"
                ),
            });
        }
        seen.insert(file_name, table);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::codegen::{CodeGenConfig, GoGenerator};
    use crate::config::DbConfig;
    use crate::introspect::fake::{raw_column, FakeAdapter};
    use crate::introspect::Driver;

    fn run_config(out_dir: &Path, table: Option<&str>) -> RunConfig {
        let db = DbConfig {
            driver: Driver::MySql,
            host: "localhost".to_string(),
            port: 3306,
            database: "shop".to_string(),
            user: "root".to_string(),
            password: "secret".to_string(),
            schema: "public".to_string(),
        };
        let codegen = CodeGenConfig::new(out_dir.to_path_buf()).with_tag_mode(true);
        RunConfig::new(db, codegen).with_table(table.map(str::to_string))
    }

    fn shop_adapter() -> FakeAdapter {
        FakeAdapter::new(Driver::MySql)
            .with_table(
                "users",
                vec![
                    raw_column("user_id", "int(11)", false, true, 1),
                    raw_column("email", "varchar(255)", true, false, 2),
                ],
            )
            .with_table(
                "order_items",
                vec![
                    raw_column("price", "decimal(10,2)", false, false, 2),
                    raw_column("id", "bigint unsigned", false, true, 1),
                ],
            )
    }

    fn generate(adapter: FakeAdapter, config: &RunConfig) -> Result<Vec<PathBuf>, SqlgoError> {
        let mut connection = Connection::open(Box::new(adapter), &config.db)?;
        run(config, &mut connection, &GoGenerator::new())
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn test_all_tables_into_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("go_output");
        let config = run_config(&out_dir, None);

        let written = generate(shop_adapter(), &config).unwrap();

        assert_eq!(
            written,
            vec![out_dir.join("users.go"), out_dir.join("order_items.go")]
        );
        assert_eq!(file_count(&out_dir), 2);

        let items = fs::read_to_string(out_dir.join("order_items.go")).unwrap();
        assert!(items.contains("type OrderItems struct {"));
        let id = items.find("\tId ").unwrap();
        let price = items.find("\tPrice ").unwrap();
        assert!(id < price);
        assert!(items.contains("uint64"));
    }

    #[test]
    fn test_single_table() {
        let tmp = tempfile::tempdir().unwrap();
        let config = run_config(tmp.path(), Some("users"));

        let written = generate(shop_adapter(), &config).unwrap();

        assert_eq!(written, vec![tmp.path().join("users.go")]);
        let users = fs::read_to_string(&written[0]).unwrap();
        assert!(users.contains("UserId int32"));
        assert!(users.contains("Email  *string"));
        assert_eq!(file_count(tmp.path()), 1);
    }

    #[test]
    fn test_missing_table_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("out");
        let config = run_config(&out_dir, Some("ghosts"));

        let err = generate(shop_adapter(), &config).unwrap_err();

        assert!(matches!(err, SqlgoError::Schema { .. }));
        assert!(err.to_string().contains("ghosts"));
        assert_eq!(file_count(&out_dir), 0);
    }

    #[test]
    fn test_empty_database_succeeds_without_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("out");
        let config = run_config(&out_dir, None);

        let written = generate(FakeAdapter::new(Driver::MySql), &config).unwrap();

        assert!(written.is_empty());
        assert_eq!(file_count(&out_dir), 0);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let config = run_config(tmp.path(), Some("users"));

        let first = generate(shop_adapter(), &config).unwrap();
        let before = fs::read(&first[0]).unwrap();
        let second = generate(shop_adapter(), &config).unwrap();
        let after = fs::read(&second[0]).unwrap();

        assert_eq!(first, second);
        assert_eq!(before, after);
        assert_eq!(file_count(tmp.path()), 1);
    }

    #[test]
    fn test_unicode_tables_get_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = run_config(tmp.path(), None);
        let adapter = FakeAdapter::new(Driver::MySql)
            .with_table("用户", vec![raw_column("id", "int", false, true, 1)])
            .with_table("订单", vec![raw_column("id", "int", false, true, 1)]);

        let written = generate(adapter, &config).unwrap();

        assert_eq!(
            written,
            vec![tmp.path().join("用户.go"), tmp.path().join("订单.go")]
        );
        assert_eq!(file_count(tmp.path()), 2);
        let orders = fs::read_to_string(tmp.path().join("订单.go")).unwrap();
        assert!(orders.contains("Source table: 订单"));
    }

    #[test]
    fn test_colliding_file_names_write_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("out");
        let config = run_config(&out_dir, None);
        let adapter = FakeAdapter::new(Driver::MySql)
            .with_table("order-items", vec![raw_column("id", "int", false, true, 1)])
            .with_table("Order_Items", vec![raw_column("id", "int", false, true, 1)]);

        let err = generate(adapter, &config).unwrap_err();

        assert!(matches!(err, SqlgoError::Schema { .. }));
        assert!(err.to_string().contains("order_items.go"));
        assert_eq!(file_count(&out_dir), 0);
    }

    #[test]
    fn test_connection_released_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = run_config(tmp.path(), Some("ghosts"));
        let adapter = shop_adapter();
        let closes = adapter.closes.clone();

        assert!(generate(adapter, &config).is_err());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_stops_at_first_failing_table() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RunConfig {
            codegen: CodeGenConfig::new(tmp.path().to_path_buf()).with_strict_types(true),
            ..run_config(tmp.path(), None)
        };
        let adapter = FakeAdapter::new(Driver::MySql)
            .with_table("a_ok", vec![raw_column("id", "int", false, true, 1)])
            .with_table("b_bad", vec![raw_column("shape", "geometry", true, false, 1)])
            .with_table("c_never", vec![raw_column("id", "int", false, true, 1)]);

        let err = generate(adapter, &config).unwrap_err();

        assert!(matches!(err, SqlgoError::TypeMapping { ref table, .. } if table == "b_bad"));
        assert!(tmp.path().join("a_ok.go").exists());
        assert!(!tmp.path().join("c_never.go").exists());
    }
}
