//! Go code generator
//!
//! Generates one Go struct per table.

use std::collections::{BTreeSet, HashSet};

use minijinja::Environment;
use tracing::{debug, warn};

use crate::codegen::{CodeGenConfig, CodeGenerator};
use crate::error::SqlgoError;
use crate::introspect::Driver;
use crate::schema::{to_pascal_case, Column, Table};

mod types;

pub use types::{map_type, mapping_table, resolve_type, GoType, NormalizedType, FALLBACK_TYPE};

const TABLE_NAME_METHOD: &str = "TableName";

/// Go code generator
pub struct GoGenerator {
    env: Environment<'static>,
}

impl GoGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_template("struct.go", include_str!("templates/struct.go.jinja"))
            .expect("Failed to load go struct template");

        Self { env }
    }
}

impl Default for GoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for GoGenerator {
    fn render_table(
        &self,
        driver: Driver,
        table: &Table,
        config: &CodeGenConfig,
    ) -> Result<String, SqlgoError> {
        let template = self
            .env
            .get_template("struct.go")
            .map_err(|e| SqlgoError::CodeGen {
                table: table.name.clone(),
                message: format!("Template error: {}", e),
            })?;

        let mut fields = table
            .columns
            .iter()
            .map(|col| build_field(driver, table, col, config))
            .collect::<Result<Vec<_>, _>>()?;
        dedupe_field_names(&mut fields, config.tag_mode);

        let imports: BTreeSet<&str> = fields.iter().filter_map(|f| f.go_type.import_path()).collect();

        let ctx = minijinja::context! {
            package => &config.package_name,
            table_comment => comment_text(&table.name),
            table_literal => go_string_literal(&table.name),
            type_name => go_identifier(&table.name),
            imports => imports,
            fields => align_fields(&fields),
            tag_mode => config.tag_mode,
        };

        let code = template.render(ctx).map_err(|e| SqlgoError::CodeGen {
            table: table.name.clone(),
            message: format!("Render error: {}", e),
        })?;

        debug!(table = ?table.name, fields = fields.len(), "Rendered Go struct");
        Ok(code)
    }
}

/// One struct field before alignment
#[derive(Debug)]
struct Field {
    name: String,
    go_type: GoType,
    type_name: String,
    tag: Option<String>,
    comment: Option<String>,
}

fn build_field(
    driver: Driver,
    table: &Table,
    col: &Column,
    config: &CodeGenConfig,
) -> Result<Field, SqlgoError> {
    let go_type = match resolve_type(driver, &col.sql_type) {
        Some(go_type) => go_type,
        None if config.strict_types => {
            return Err(SqlgoError::TypeMapping {
                table: table.name.clone(),
                column: col.name.clone(),
                sql_type: col.sql_type.clone(),
            });
        }
        None => {
            warn!(
                table = ?table.name,
                column = ?col.name,
                sql_type = ?col.sql_type,
                fallback = %FALLBACK_TYPE,
                "No Go type mapping, using fallback"
            );
            FALLBACK_TYPE
        }
    };

    let tag = config.tag_mode.then(|| struct_tag(col));
    let comment = col
        .comment
        .as_deref()
        .map(comment_text)
        .filter(|c| !c.is_empty());

    Ok(Field {
        name: go_identifier(&col.name),
        go_type,
        type_name: go_type.field_type(col.is_nullable),
        tag,
        comment,
    })
}

/// `gorm` and `json` tags keyed by the raw column name
///
/// Tag values are Go-quoted. A name containing a backtick cannot live in a raw
/// string, so the whole tag becomes an interpreted literal instead.
fn struct_tag(col: &Column) -> String {
    let primary_key = if col.is_primary_key { ";primaryKey" } else { "" };
    let tag = format!(
        "gorm:{} json:{}",
        go_string_literal(&format!("column:{}{primary_key}", col.name)),
        go_string_literal(&col.name)
    );
    if tag.contains('`') {
        go_string_literal(&tag)
    } else {
        format!("`{tag}`")
    }
}

/// Make field names unique; in tag mode none may collide with the
/// `TableName` method either
fn dedupe_field_names(fields: &mut [Field], tag_mode: bool) {
    let mut taken: HashSet<String> = HashSet::with_capacity(fields.len() + 1);
    if tag_mode {
        taken.insert(TABLE_NAME_METHOD.to_string());
    }
    for field in fields {
        while taken.contains(&field.name) {
            field.name.push('_');
        }
        taken.insert(field.name.clone());
    }
}

/// Lay fields out in columns the way gofmt does
///
/// Names share one column. Type and tag cells are padded per run of
/// consecutive lines that have something after them.
fn align_fields(fields: &[Field]) -> Vec<String> {
    let name_width = fields
        .iter()
        .map(|f| display_width(&f.name))
        .max()
        .unwrap_or(0);
    let type_widths = run_widths(fields, |f| {
        (f.tag.is_some() || f.comment.is_some()).then(|| display_width(&f.type_name))
    });
    let tag_widths = run_widths(fields, |f| {
        f.comment.as_ref().and(f.tag.as_deref()).map(display_width)
    });

    fields
        .iter()
        .zip(type_widths.iter().zip(&tag_widths))
        .map(|(f, (&type_width, &tag_width))| {
            let mut line = if f.tag.is_some() || f.comment.is_some() {
                format!("{:<name_width$} {:<type_width$}", f.name, f.type_name)
            } else {
                format!("{:<name_width$} {}", f.name, f.type_name)
            };
            if let Some(tag) = &f.tag {
                line.push(' ');
                match f.comment {
                    Some(_) => line.push_str(&format!("{tag:<tag_width$}")),
                    None => line.push_str(tag),
                }
            }
            if let Some(comment) = &f.comment {
                line.push_str(" // ");
                line.push_str(comment);
            }
            line.trim_end().to_string()
        })
        .collect()
}

/// Per-line width of a cell, the max over each run of consecutive lines
/// where `cell` is `Some`; 0 where it is `None`
fn run_widths<F>(fields: &[Field], cell: F) -> Vec<usize>
where
    F: Fn(&Field) -> Option<usize>,
{
    let cells: Vec<Option<usize>> = fields.iter().map(cell).collect();
    let mut widths = vec![0; cells.len()];
    let mut start = 0;
    while start < cells.len() {
        if cells[start].is_none() {
            start += 1;
            continue;
        }
        let end = cells[start..]
            .iter()
            .position(Option::is_none)
            .map_or(cells.len(), |offset| start + offset);
        let width = cells[start..end].iter().flatten().copied().max().unwrap_or(0);
        widths[start..end].fill(width);
        start = end;
    }
    widths
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// PascalCase identifier that is legal in Go
///
/// Characters that cannot appear in an identifier act as word separators.
pub fn go_identifier(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == '-' { ch } else { '_' })
        .collect();
    let ident = to_pascal_case(&cleaned);
    match ident.chars().next() {
        Some(first) if first.is_alphabetic() => ident,
        _ => format!("X{ident}"),
    }
}

/// Single-line text safe to put after `//`
fn comment_text(s: &str) -> String {
    s.split(char::is_control)
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn go_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
