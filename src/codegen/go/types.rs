//! SQL to Go type mapping
//!
//! Driver-reported descriptors are normalized first (case, whitespace,
//! length/precision qualifiers, `unsigned`) and the base name is then looked
//! up in a per-driver table. Anything without an entry falls back to
//! [`FALLBACK_TYPE`].

use std::fmt;

use crate::introspect::Driver;

/// Go types a column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Bytes,
    Time,
}

/// Substituted when no mapping exists for a SQL type
pub const FALLBACK_TYPE: GoType = GoType::String;

impl GoType {
    pub fn name(&self) -> &'static str {
        match self {
            GoType::Bool => "bool",
            GoType::Int8 => "int8",
            GoType::Int16 => "int16",
            GoType::Int32 => "int32",
            GoType::Int64 => "int64",
            GoType::Uint8 => "uint8",
            GoType::Uint16 => "uint16",
            GoType::Uint32 => "uint32",
            GoType::Uint64 => "uint64",
            GoType::Float32 => "float32",
            GoType::Float64 => "float64",
            GoType::String => "string",
            GoType::Bytes => "[]byte",
            GoType::Time => "time.Time",
        }
    }

    /// Package the type lives in, if it is not predeclared
    pub fn import_path(&self) -> Option<&'static str> {
        match self {
            GoType::Time => Some("time"),
            _ => None,
        }
    }

    /// Whether the zero value can already represent NULL
    pub fn is_nilable(&self) -> bool {
        matches!(self, GoType::Bytes)
    }

    /// Go spelling for a column with the given nullability
    pub fn field_type(&self, is_nullable: bool) -> String {
        if is_nullable && !self.is_nilable() {
            format!("*{}", self.name())
        } else {
            self.name().to_string()
        }
    }

    fn unsigned(self) -> Self {
        match self {
            GoType::Int8 => GoType::Uint8,
            GoType::Int16 => GoType::Uint16,
            GoType::Int32 => GoType::Uint32,
            GoType::Int64 => GoType::Uint64,
            other => other,
        }
    }
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A SQL type descriptor reduced to what the mapping needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    /// Lower-cased base name with qualifiers removed, e.g. `character varying`
    pub base: String,
    /// First number of the first qualifier, e.g. 255 in `varchar(255)`
    pub width: Option<u32>,
    pub unsigned: bool,
    pub array: bool,
}

impl NormalizedType {
    pub fn parse(descriptor: &str) -> Self {
        let lower = descriptor.trim().to_lowercase();

        let (lower, array) = match lower.strip_suffix("[]") {
            Some(inner) => (inner.trim_end().to_string(), true),
            None => (lower, false),
        };

        let mut stripped = String::with_capacity(lower.len());
        let mut qualifiers = Vec::new();
        let mut depth = 0usize;
        let mut quoted = false;
        let mut current = String::new();
        // Parens inside quoted enum/set members are literal; '' toggles twice
        for ch in lower.chars() {
            match ch {
                '\'' if depth > 0 => {
                    quoted = !quoted;
                    current.push(ch);
                }
                _ if quoted => current.push(ch),
                '(' => {
                    depth += 1;
                    stripped.push(' ');
                }
                ')' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        qualifiers.push(std::mem::take(&mut current));
                    }
                }
                _ if depth > 0 => current.push(ch),
                _ => stripped.push(ch),
            }
        }

        let mut unsigned = false;
        let words: Vec<&str> = stripped
            .split_whitespace()
            .filter(|word| match *word {
                "unsigned" => {
                    unsigned = true;
                    false
                }
                "signed" | "zerofill" => false,
                _ => true,
            })
            .collect();

        let width = qualifiers
            .first()
            .and_then(|q| q.split(',').next())
            .and_then(|n| n.trim().parse().ok());

        Self {
            base: words.join(" "),
            width,
            unsigned,
            array,
        }
    }
}

const MYSQL_TYPES: &[(&str, GoType)] = &[
    ("tinyint", GoType::Int8),
    ("smallint", GoType::Int16),
    ("mediumint", GoType::Int32),
    ("int", GoType::Int32),
    ("integer", GoType::Int32),
    ("bigint", GoType::Int64),
    ("float", GoType::Float32),
    ("double", GoType::Float64),
    ("double precision", GoType::Float64),
    ("real", GoType::Float64),
    ("decimal", GoType::Float64),
    ("numeric", GoType::Float64),
    ("dec", GoType::Float64),
    ("fixed", GoType::Float64),
    ("bool", GoType::Bool),
    ("boolean", GoType::Bool),
    ("char", GoType::String),
    ("varchar", GoType::String),
    ("tinytext", GoType::String),
    ("text", GoType::String),
    ("mediumtext", GoType::String),
    ("longtext", GoType::String),
    ("enum", GoType::String),
    ("set", GoType::String),
    ("json", GoType::String),
    ("time", GoType::String),
    ("binary", GoType::Bytes),
    ("varbinary", GoType::Bytes),
    ("tinyblob", GoType::Bytes),
    ("blob", GoType::Bytes),
    ("mediumblob", GoType::Bytes),
    ("longblob", GoType::Bytes),
    ("bit", GoType::Bytes),
    ("date", GoType::Time),
    ("datetime", GoType::Time),
    ("timestamp", GoType::Time),
    ("year", GoType::Int16),
];

const POSTGRES_TYPES: &[(&str, GoType)] = &[
    ("smallint", GoType::Int16),
    ("int2", GoType::Int16),
    ("smallserial", GoType::Int16),
    ("serial2", GoType::Int16),
    ("integer", GoType::Int32),
    ("int", GoType::Int32),
    ("int4", GoType::Int32),
    ("serial", GoType::Int32),
    ("serial4", GoType::Int32),
    ("bigint", GoType::Int64),
    ("int8", GoType::Int64),
    ("bigserial", GoType::Int64),
    ("serial8", GoType::Int64),
    ("real", GoType::Float32),
    ("float4", GoType::Float32),
    ("double precision", GoType::Float64),
    ("float8", GoType::Float64),
    ("numeric", GoType::Float64),
    ("decimal", GoType::Float64),
    ("boolean", GoType::Bool),
    ("bool", GoType::Bool),
    ("character", GoType::String),
    ("char", GoType::String),
    ("bpchar", GoType::String),
    ("character varying", GoType::String),
    ("varchar", GoType::String),
    ("text", GoType::String),
    ("citext", GoType::String),
    ("name", GoType::String),
    ("uuid", GoType::String),
    ("json", GoType::String),
    ("jsonb", GoType::String),
    ("xml", GoType::String),
    ("money", GoType::String),
    ("inet", GoType::String),
    ("cidr", GoType::String),
    ("macaddr", GoType::String),
    ("interval", GoType::String),
    ("time", GoType::String),
    ("time without time zone", GoType::String),
    ("time with time zone", GoType::String),
    ("timetz", GoType::String),
    ("bytea", GoType::Bytes),
    ("date", GoType::Time),
    ("timestamp", GoType::Time),
    ("timestamp without time zone", GoType::Time),
    ("timestamp with time zone", GoType::Time),
    ("timestamptz", GoType::Time),
];

/// The mapping table for `driver`
pub fn mapping_table(driver: Driver) -> &'static [(&'static str, GoType)] {
    match driver {
        Driver::MySql => MYSQL_TYPES,
        Driver::Postgres => POSTGRES_TYPES,
    }
}

/// Map a descriptor to a Go type, or `None` when there is no mapping
pub fn resolve_type(driver: Driver, descriptor: &str) -> Option<GoType> {
    let ty = NormalizedType::parse(descriptor);
    if ty.array {
        return None;
    }

    // MySQL reports BOOL columns as tinyint(1)
    if driver == Driver::MySql && ty.width == Some(1) && matches!(ty.base.as_str(), "tinyint" | "bit")
    {
        return Some(GoType::Bool);
    }

    let go_type = mapping_table(driver)
        .iter()
        .find(|(sql, _)| *sql == ty.base)
        .map(|(_, go)| *go)?;

    Some(if ty.unsigned { go_type.unsigned() } else { go_type })
}

/// Map a descriptor to a Go type, falling back to [`FALLBACK_TYPE`]
pub fn map_type(driver: Driver, descriptor: &str) -> GoType {
    resolve_type(driver, descriptor).unwrap_or(FALLBACK_TYPE)
}
