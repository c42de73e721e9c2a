//! Code generation
//!
//! This module turns introspected tables into source code for the target
//! language. Rendering is pure: generators return text and never touch the
//! filesystem.

use std::path::PathBuf;

use crate::introspect::Driver;
use crate::prelude::{SqlgoError, Table};

pub mod go;

pub use go::GoGenerator;

const DEFAULT_PACKAGE: &str = "model";

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    /// Output directory
    pub output_path: PathBuf,
    /// Go package clause of every generated file
    pub package_name: String,
    /// Emit struct tags carrying the original column names
    pub tag_mode: bool,
    /// Fail on SQL types without a mapping instead of falling back
    pub strict_types: bool,
}

impl CodeGenConfig {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            package_name: DEFAULT_PACKAGE.to_string(),
            tag_mode: false,
            strict_types: false,
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    pub fn with_tag_mode(mut self, tag_mode: bool) -> Self {
        self.tag_mode = tag_mode;
        self
    }

    pub fn with_strict_types(mut self, strict_types: bool) -> Self {
        self.strict_types = strict_types;
        self
    }
}

/// Trait for language-specific code generators
pub trait CodeGenerator {
    /// Render one complete source file for `table`
    fn render_table(
        &self,
        driver: Driver,
        table: &Table,
        config: &CodeGenConfig,
    ) -> Result<String, SqlgoError>;
}
