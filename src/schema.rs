//! Schema data structures
//!
//! These types represent table metadata and form the contract between
//! introspection (produces) and code generation (consumes). They are
//! read-only snapshots of a single run.

/// A column row as reported by a driver adapter, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    /// Type descriptor exactly as the engine reports it, e.g. `int(10) unsigned`
    pub sql_type: String,
    /// Engine nullability text, `YES` / `NO`
    pub nullable: String,
    /// Engine key text, `PRI` marks a primary key column
    pub key: String,
    pub comment: Option<String>,
    pub ordinal_position: i64,
}

/// A table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub ordinal_position: i64,
    /// Informational only
    pub comment: Option<String>,
}

impl From<RawColumn> for Column {
    fn from(raw: RawColumn) -> Self {
        let is_nullable = matches!(
            raw.nullable.trim().to_ascii_uppercase().as_str(),
            "YES" | "TRUE" | "T" | "1"
        );
        let is_primary_key = raw.key.trim().eq_ignore_ascii_case("PRI");
        let comment = raw
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Self {
            name: raw.name,
            sql_type: raw.sql_type,
            is_nullable,
            is_primary_key,
            ordinal_position: raw.ordinal_position,
            comment,
        }
    }
}

/// Database table with columns in ordinal order
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// Returns PascalCase type name from the table name
    pub fn type_name(&self) -> String {
        to_pascal_case(&self.name)
    }
}

/// Convert snake_case or kebab-case to PascalCase
///
/// Each `_`/`-` separated segment gets its first character upper-cased; the
/// rest of the segment is kept as is.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let first_upper = first.to_uppercase().to_string();
                    first_upper + chars.as_str()
                }
            }
        })
        .collect()
}
