//! # sqlgo
//!
//! Generate Go struct definitions from database schemas
//!
//! This crate provides a CLI tool and library for reading MySQL or PostgreSQL
//! table metadata and emitting one Go type per table.

pub mod codegen;
pub mod config;
pub mod error;
pub mod generate;
pub mod introspect;
pub mod output;
pub mod schema;

pub mod prelude {
    pub use crate::codegen::go::{map_type, GoGenerator, GoType};
    pub use crate::codegen::{CodeGenConfig, CodeGenerator};
    pub use crate::config::{DbConfig, RunConfig};
    pub use crate::error::SqlgoError;
    pub use crate::introspect::{adapter_for, Connection, Driver, DriverAdapter, SchemaReader};
    pub use crate::schema::{Column, RawColumn, Table};
}

#[cfg(feature = "mysql")]
pub use introspect::MySqlAdapter;
#[cfg(feature = "postgres")]
pub use introspect::PostgresAdapter;
