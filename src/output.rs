//! Writing generated files
//!
//! The only place that touches the filesystem. Files are named after their
//! table and overwritten unconditionally.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SqlgoError;

/// Extension of every generated file
pub const FILE_EXTENSION: &str = "go";

/// File name for `table_name`: lower-cased, non-alphanumerics replaced by `_`
///
/// The go tool skips files starting with `_` and treats `*_test.go` as tests,
/// so such stems get a `t` prefix or a `_model` suffix.
pub fn file_name_for(table_name: &str) -> String {
    let mut stem = String::with_capacity(table_name.len());
    for ch in table_name.chars() {
        if ch.is_alphanumeric() {
            stem.extend(ch.to_lowercase());
        } else {
            stem.push('_');
        }
    }

    if stem.is_empty() || stem.starts_with('_') {
        stem.insert(0, 't');
    }
    if stem.ends_with("_test") {
        stem.push_str("_model");
    }

    format!("{stem}.{FILE_EXTENSION}")
}

/// Write `source` for `table_name` into `out_dir`, creating the directory if needed
pub fn write_table_file(
    table_name: &str,
    source: &str,
    out_dir: &Path,
) -> Result<PathBuf, SqlgoError> {
    fs::create_dir_all(out_dir).map_err(|e| SqlgoError::FileSystem {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let path = out_dir.join(file_name_for(table_name));
    fs::write(&path, source).map_err(|e| SqlgoError::FileSystem {
        path: path.clone(),
        source: e,
    })?;
    debug!(table = ?table_name, path = ?path, bytes = source.len(), "Wrote table file");

    Ok(path)
}
