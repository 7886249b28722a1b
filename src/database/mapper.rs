// ABOUTME: Generic result-to-record mapper turning raw SQLite rows into typed records
// ABOUTME: Resolves columns to field setters by name and coerces driver-native cell values
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Row Mapper
//!
//! Every repository read in this crate goes through [`RowMapper`]: one
//! mechanism that executes a parameterized query and converts the untyped
//! tabular result into a sequence of strongly-typed records, without
//! per-entity scanning code.
//!
//! Record types declare a static binding table ([`TableRecord::bindings`])
//! mapping each column (by the capitalized-word form of its name, see
//! [`pascal_case`]) to a typed setter. Per-cell coercion is a pure function
//! over the driver's native value representations: encoded text bytes,
//! 64-bit integers, floats, booleans and timestamps.
//!
//! A malformed or unmappable cell never fails the call. It is recorded as a
//! [`SkippedField`] diagnostic so callers and tests can observe silent data
//! loss; [`RowMapper::map_all`] logs the diagnostics, [`RowMapper::map_rows`]
//! returns them alongside each record.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteColumn, SqlitePool, SqliteRow};
use sqlx::{Column, Decode, Executor, Row, Sqlite, Statement, TypeInfo, ValueRef};
use thiserror::Error;

/// Failures that abort a mapping call. Per-cell coercion problems are never
/// one of these; they surface as [`SkippedField`] diagnostics instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// Column metadata could not be obtained for the query. Statement
    /// preparation is the step that yields column names in this driver
    /// stack, so statements that fail to prepare land here.
    #[error("could not obtain column metadata: {0}")]
    Metadata(#[source] sqlx::Error),

    /// The query could not be run, or fetching faulted before any row was
    /// delivered.
    #[error("query execution failed: {0}")]
    Execute(#[source] sqlx::Error),

    /// One row's raw cell values could not be read into buffers.
    #[error("failed to scan row {row}: {source}")]
    RowScan {
        /// Zero-based index of the row that failed.
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    /// The row cursor reported a fault after delivering rows.
    #[error("row iteration failed after {rows} rows: {source}")]
    Cursor {
        /// Number of rows successfully mapped before the fault.
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    /// Strict mode only: a null cell targeted a non-optional field.
    #[error("null value in column `{column}` mapped to a non-optional field")]
    NullForRequired {
        /// Name of the offending column.
        column: String,
    },
}

/// One untyped cell value as delivered by the driver for a (row, column)
/// pair.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// SQL NULL.
    Null,
    /// Native 64-bit signed integer.
    Integer(i64),
    /// Native double-precision float.
    Float(f64),
    /// Native boolean.
    Bool(bool),
    /// Encoded text bytes. SQLite delivers TEXT, declared-DATETIME and BLOB
    /// cells this way, so logically numeric, boolean and temporal data can
    /// arrive as bytes and is parsed by the coercion grammar.
    Bytes(Vec<u8>),
    /// Driver-native timestamp. SQLite stores temporal values as text and
    /// never produces this variant, but the coercion layer accepts it.
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// SQL NULL.
    Null,
    /// Text value.
    Text(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// Double-precision float.
    Float(f64),
    /// Boolean (stored as 0/1).
    Bool(bool),
    /// Timestamp, stored in the mapper's canonical text format.
    Timestamp(DateTime<Utc>),
}

impl SqlParam {
    fn bind_to<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            Self::Null => query.bind(None::<String>),
            Self::Text(value) => query.bind(value.clone()),
            Self::Integer(value) => query.bind(*value),
            Self::Float(value) => query.bind(*value),
            Self::Bool(value) => query.bind(*value),
            Self::Timestamp(value) => query.bind(format_timestamp(*value)),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Destination field categories the mapper can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// Signed integer.
    Integer,
    /// Unsigned integer.
    Unsigned,
    /// Floating point.
    Float,
    /// Boolean.
    Bool,
    /// UTC timestamp.
    Timestamp,
}

impl FieldKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed setter for one record field. For optional fields the `Option`
/// wrapping happens inside the setter body; the binding's `nullable` flag
/// tells the mapper how to treat null cells.
pub enum FieldSetter<T> {
    /// Assign a text value.
    Text(fn(&mut T, String)),
    /// Assign a signed integer.
    Integer(fn(&mut T, i64)),
    /// Assign an unsigned integer.
    Unsigned(fn(&mut T, u64)),
    /// Assign a float.
    Float(fn(&mut T, f64)),
    /// Assign a boolean.
    Bool(fn(&mut T, bool)),
    /// Assign a UTC timestamp.
    Timestamp(fn(&mut T, DateTime<Utc>)),
}

impl<T> FieldSetter<T> {
    const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Integer(_) => FieldKind::Integer,
            Self::Unsigned(_) => FieldKind::Unsigned,
            Self::Float(_) => FieldKind::Float,
            Self::Bool(_) => FieldKind::Bool,
            Self::Timestamp(_) => FieldKind::Timestamp,
        }
    }
}

/// Associates one column with one record field.
pub struct ColumnBinding<T: 'static> {
    /// Capitalized-word form of the record field, as produced by
    /// [`pascal_case`] from the column name (`first_name` -> `FirstName`).
    pub field: &'static str,
    /// Whether the destination field is optional. Null cells leave optional
    /// fields absent; for non-optional fields the null policy is decided by
    /// [`MapperOptions::strict_nulls`].
    pub nullable: bool,
    /// Typed setter invoked on successful coercion.
    pub setter: FieldSetter<T>,
}

/// A record type that rows of one table (or query result) map onto.
pub trait TableRecord: Default + Send + Unpin + 'static {
    /// Table the record canonically maps to; repositories use it to build
    /// queries.
    const TABLE: &'static str;

    /// Static column-to-setter binding table for this record type.
    fn bindings() -> &'static [ColumnBinding<Self>];
}

/// Why a cell was skipped instead of populating its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Byte-encoded text could not be parsed as the destination type.
    Parse {
        /// Destination field category.
        target: FieldKind,
        /// Parser error detail.
        detail: String,
    },
    /// A natively-typed cell had no coercion rule for the destination.
    TypeMismatch {
        /// Cell value category as delivered by the driver.
        cell: &'static str,
        /// Destination field category.
        target: FieldKind,
    },
    /// A null cell targeted a non-optional field (lenient mode).
    NullForRequired,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { target, detail } => {
                write!(f, "could not parse text as {target}: {detail}")
            }
            Self::TypeMismatch { cell, target } => {
                write!(f, "no coercion from {cell} cell to {target} field")
            }
            Self::NullForRequired => f.write_str("null cell for non-optional field"),
        }
    }
}

/// Diagnostic for one field left unset while mapping a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    /// Column the cell came from.
    pub column: String,
    /// Why the field was not populated.
    pub reason: SkipReason,
}

/// One mapped record together with its skipped-field diagnostics.
#[derive(Debug)]
pub struct MappedRow<T> {
    /// The populated record.
    pub record: T,
    /// Fields left at their default, with the reason each was skipped.
    pub skipped: Vec<SkippedField>,
}

/// Mapper behavior knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperOptions {
    /// When set, a null cell targeting a non-optional field aborts the call
    /// with [`MapError::NullForRequired`] instead of leaving the field at
    /// its default.
    pub strict_nulls: bool,
}

/// Executes queries and maps their results to typed records. The pool is
/// injected at construction; the mapper holds no other state, so one
/// instance may be shared across concurrent callers.
#[derive(Clone)]
pub struct RowMapper {
    pool: SqlitePool,
    options: MapperOptions,
}

impl RowMapper {
    /// Create a mapper over the given pool with lenient null handling.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_options(pool, MapperOptions::default())
    }

    /// Create a mapper with explicit options.
    #[must_use]
    pub const fn with_options(pool: SqlitePool, options: MapperOptions) -> Self {
        Self {
            pool,
            options,
        }
    }

    /// Execute `sql` with `params` and map every result row to a `T`,
    /// logging skipped-field diagnostics.
    ///
    /// Returns exactly one record per row, in driver delivery order; a
    /// query matching zero rows yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the query cannot be prepared or run, a row
    /// cannot be scanned, or the cursor faults. No partial result is ever
    /// returned on failure.
    pub async fn map_all<T: TableRecord>(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<T>, MapError> {
        let rows = self.map_rows(sql, params).await?;
        Ok(rows
            .into_iter()
            .map(|mapped| {
                for skip in &mapped.skipped {
                    tracing::warn!(
                        table = T::TABLE,
                        column = %skip.column,
                        reason = %skip.reason,
                        "skipped field while mapping row"
                    );
                }
                mapped.record
            })
            .collect())
    }

    /// Like [`map_all`](Self::map_all) but returns the skipped-field
    /// diagnostics alongside each record instead of logging them.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`map_all`](Self::map_all).
    pub async fn map_rows<T: TableRecord>(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<MappedRow<T>>, MapError> {
        let mut conn = self.pool.acquire().await.map_err(MapError::Execute)?;

        // Preparing the statement yields the column metadata; the
        // column-to-field mapping is derived once per result set, before
        // any row is scanned.
        let statement = (&mut *conn).prepare(sql).await.map_err(MapError::Metadata)?;
        let fields = resolve_columns::<T>(statement.columns());

        let mut query = statement.query();
        for param in params {
            query = param.bind_to(query);
        }

        let mut results = Vec::new();
        {
            let mut rows = query.fetch(&mut *conn);
            loop {
                match rows.try_next().await {
                    Ok(Some(row)) => {
                        let mapped = map_row(&row, &fields, results.len(), self.options)?;
                        results.push(mapped);
                    }
                    Ok(None) => break,
                    Err(source) => {
                        return Err(if results.is_empty() {
                            MapError::Execute(source)
                        } else {
                            MapError::Cursor {
                                rows: results.len(),
                                source,
                            }
                        });
                    }
                }
            }
            // Cursor dropped here, on every exit path, before the
            // connection goes back to the pool.
        }

        Ok(results)
    }
}

/// Translate a delimiter-separated column name into the capitalized-word
/// form used by binding tables: split on `_`, capitalize each word's first
/// character, concatenate.
///
/// Resolution is purely delimiter-driven; digits or existing uppercase
/// characters adjacent to delimiters get no special handling.
#[must_use]
pub fn pascal_case(column: &str) -> String {
    column
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// Render a timestamp in the mapper's canonical storage format. All write
/// paths use this so stored values stay inside the read grammar.
#[must_use]
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Resolve each result column to a binding of `T`, by position. Columns
/// with no matching binding are kept as `None` so cell buffers still line
/// up with ordinals; they are ignored during assignment.
fn resolve_columns<T: TableRecord>(
    columns: &[SqliteColumn],
) -> Vec<(String, Option<&'static ColumnBinding<T>>)> {
    columns
        .iter()
        .map(|column| {
            let name = column.name().to_owned();
            let field = pascal_case(&name);
            let binding = T::bindings().iter().find(|b| b.field == field);
            (name, binding)
        })
        .collect()
}

fn map_row<T: TableRecord>(
    row: &SqliteRow,
    fields: &[(String, Option<&'static ColumnBinding<T>>)],
    row_index: usize,
    options: MapperOptions,
) -> Result<MappedRow<T>, MapError> {
    // Scan all raw cells into fresh buffers first; a failure here aborts
    // the whole call.
    let mut cells = Vec::with_capacity(fields.len());
    for index in 0..fields.len() {
        cells.push(read_cell(row, index).map_err(|source| MapError::RowScan {
            row: row_index,
            source,
        })?);
    }

    let mut record = T::default();
    let mut skipped = Vec::new();
    for ((column, binding), cell) in fields.iter().zip(cells) {
        if let Some(binding) = *binding {
            apply_cell(
                &mut record,
                binding,
                cell,
                column,
                options.strict_nulls,
                &mut skipped,
            )?;
        }
    }

    Ok(MappedRow {
        record,
        skipped,
    })
}

/// Read one raw cell into the driver-value model.
fn read_cell(row: &SqliteRow, index: usize) -> Result<CellValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }

    let type_name = raw.type_info().name().to_owned();
    let decode_error = |source| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source,
    };

    let cell = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" => {
            CellValue::Integer(<i64 as Decode<Sqlite>>::decode(raw).map_err(decode_error)?)
        }
        "REAL" | "NUMERIC" => {
            CellValue::Float(<f64 as Decode<Sqlite>>::decode(raw).map_err(decode_error)?)
        }
        "BOOLEAN" => CellValue::Bool(<bool as Decode<Sqlite>>::decode(raw).map_err(decode_error)?),
        // TEXT, BLOB and declared temporal types all arrive as bytes; the
        // coercion grammar sorts them out per destination field.
        _ => CellValue::Bytes(<Vec<u8> as Decode<Sqlite>>::decode(raw).map_err(decode_error)?),
    };
    Ok(cell)
}

/// Coerce one non-positional cell into one destination field. Pure per-cell
/// dispatch: the only side effect is setting (or not setting) the field and
/// pushing a diagnostic.
fn apply_cell<T>(
    record: &mut T,
    binding: &ColumnBinding<T>,
    cell: CellValue,
    column: &str,
    strict_nulls: bool,
    skipped: &mut Vec<SkippedField>,
) -> Result<(), MapError> {
    let target = binding.setter.kind();

    // Null never triggers a coercion attempt. Optional fields stay absent;
    // non-optional fields keep their default unless strict mode is on.
    if matches!(cell, CellValue::Null) {
        if !binding.nullable {
            if strict_nulls {
                return Err(MapError::NullForRequired {
                    column: column.to_owned(),
                });
            }
            skipped.push(SkippedField {
                column: column.to_owned(),
                reason: SkipReason::NullForRequired,
            });
        }
        return Ok(());
    }

    let cell_kind = cell.kind_name();
    let parse_failure = |detail: String, skipped: &mut Vec<SkippedField>| {
        skipped.push(SkippedField {
            column: column.to_owned(),
            reason: SkipReason::Parse {
                target,
                detail,
            },
        });
    };

    match cell {
        CellValue::Null => {}
        CellValue::Bytes(data) => {
            let text = String::from_utf8_lossy(&data).into_owned();
            match binding.setter {
                FieldSetter::Text(set) => set(record, text),
                FieldSetter::Integer(set) => match text.parse::<i64>() {
                    Ok(value) => set(record, value),
                    Err(e) => parse_failure(e.to_string(), skipped),
                },
                FieldSetter::Unsigned(set) => match text.parse::<u64>() {
                    Ok(value) => set(record, value),
                    Err(e) => parse_failure(e.to_string(), skipped),
                },
                FieldSetter::Float(set) => match text.parse::<f64>() {
                    Ok(value) => set(record, value),
                    Err(e) => parse_failure(e.to_string(), skipped),
                },
                FieldSetter::Bool(set) => match parse_bool_text(&text) {
                    Some(value) => set(record, value),
                    None => parse_failure(format!("`{text}` is not a boolean"), skipped),
                },
                FieldSetter::Timestamp(set) => match parse_timestamp_text(&text) {
                    Ok(value) => set(record, value),
                    Err(detail) => parse_failure(detail, skipped),
                },
            }
        }
        CellValue::Integer(value) => match binding.setter {
            FieldSetter::Integer(set) => set(record, value),
            FieldSetter::Unsigned(set) => {
                if let Ok(unsigned) = u64::try_from(value) {
                    set(record, unsigned);
                } else {
                    parse_failure(format!("negative value {value}"), skipped);
                }
            }
            // Boolean columns surface as integers; nonzero means true.
            FieldSetter::Bool(set) => set(record, value != 0),
            _ => skipped.push(SkippedField {
                column: column.to_owned(),
                reason: SkipReason::TypeMismatch {
                    cell: cell_kind,
                    target,
                },
            }),
        },
        CellValue::Float(value) => match binding.setter {
            FieldSetter::Float(set) => set(record, value),
            _ => skipped.push(SkippedField {
                column: column.to_owned(),
                reason: SkipReason::TypeMismatch {
                    cell: cell_kind,
                    target,
                },
            }),
        },
        CellValue::Bool(value) => match binding.setter {
            FieldSetter::Bool(set) => set(record, value),
            _ => skipped.push(SkippedField {
                column: column.to_owned(),
                reason: SkipReason::TypeMismatch {
                    cell: cell_kind,
                    target,
                },
            }),
        },
        CellValue::Timestamp(value) => match binding.setter {
            FieldSetter::Timestamp(set) => set(record, value),
            _ => skipped.push(SkippedField {
                column: column.to_owned(),
                reason: SkipReason::TypeMismatch {
                    cell: cell_kind,
                    target,
                },
            }),
        },
    }

    Ok(())
}

/// Canonical boolean text grammar, case-insensitive.
fn parse_bool_text(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Timestamp text grammar: one space-separated token is a date
/// (`YYYY-MM-DD`, mapped to midnight UTC), two tokens are a full
/// `YYYY-MM-DD HH:MM:SS` timestamp, anything else is malformed.
fn parse_timestamp_text(text: &str) -> Result<DateTime<Utc>, String> {
    match text.split(' ').count() {
        1 => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .map_err(|e| e.to_string()),
        2 => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .map(|datetime| datetime.and_utc())
            .map_err(|e| e.to_string()),
        tokens => Err(format!("unexpected token count {tokens} in `{text}`")),
    }
}
