use std::path::PathBuf;

use thiserror::Error;

/// sqlgo errors
#[derive(Error, Debug)]
pub enum SqlgoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Schema error in '{database}': {message}")]
    Schema { database: String, message: String },

    #[error("No Go type for column '{column}' of table '{table}' (SQL type '{sql_type}')")]
    TypeMapping {
        table: String,
        column: String,
        sql_type: String,
    },

    #[error("Code generation failed for table '{table}': {message}")]
    CodeGen { table: String, message: String },

    #[error("Failed to write output '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
}
