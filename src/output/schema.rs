//! Output table schema and value conversion
//!
//! Maps SAP column types to output column types and converts positional JSON
//! rows into typed cells, Arrow record batches, and back.

use crate::error::{Error, Result};
use crate::sap::ResourceSchema;
use crate::types::{JsonValue, RawRow};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int64Array,
    StringArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use std::fmt;
use std::sync::Arc;

/// Maximum precision of decimal columns
pub const DECIMAL_PRECISION: u8 = 38;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

// ============================================================================
// Column Types
// ============================================================================

/// Type of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Text
    String,
    /// Fixed point number with `scale` fractional digits
    Decimal {
        /// Fractional digits
        scale: u8,
    },
    /// 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// UTC timestamp
    Timestamp,
}

impl ColumnType {
    /// Map an SAP ABAP type; unknown types are kept as text
    pub fn from_sap(sap_type: &str, decimals: Option<u32>) -> Self {
        match sap_type.trim().to_ascii_uppercase().as_str() {
            "NUM" | "PACKED" => Self::Decimal {
                scale: decimals.unwrap_or(0).min(u32::from(DECIMAL_PRECISION)) as u8,
            },
            "INT" | "INT8" => Self::Integer,
            "FLOAT" | "DECFLOAT16" | "DECFLOAT34" => Self::Float,
            "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "UTCLONG" => Self::Timestamp,
            _ => Self::String,
        }
    }

    /// DuckDB column type
    pub fn sql_type(&self) -> String {
        match self {
            Self::String => "VARCHAR".to_string(),
            Self::Decimal { scale } => format!("DECIMAL({DECIMAL_PRECISION}, {scale})"),
            Self::Integer => "BIGINT".to_string(),
            Self::Float => "DOUBLE".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time => "TIME".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Arrow data type
    pub fn arrow_type(&self) -> DataType {
        match self {
            Self::String => DataType::Utf8,
            Self::Decimal { scale } => DataType::Decimal128(DECIMAL_PRECISION, *scale as i8),
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Boolean => DataType::Boolean,
            Self::Date => DataType::Date32,
            Self::Time => DataType::Time64(TimeUnit::Microsecond),
            Self::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        }
    }

    /// Inverse of [`ColumnType::arrow_type`] for columns read back from files
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => Some(Self::String),
            DataType::Decimal128(_, scale) if *scale >= 0 => Some(Self::Decimal {
                scale: *scale as u8,
            }),
            DataType::Int64 => Some(Self::Integer),
            DataType::Float64 => Some(Self::Float),
            DataType::Boolean => Some(Self::Boolean),
            DataType::Date32 => Some(Self::Date),
            DataType::Time64(TimeUnit::Microsecond) => Some(Self::Time),
            DataType::Timestamp(TimeUnit::Microsecond, _) => Some(Self::Timestamp),
            _ => None,
        }
    }
}

/// A column of the output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Column name
    pub name: String,
    /// Column type
    pub column_type: ColumnType,
}

impl OutputColumn {
    /// Create a column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Shape of the output table for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name
    pub name: String,
    /// Columns in row order
    pub columns: Vec<OutputColumn>,
    /// Primary key for new tables; empty means none
    pub primary_key: Vec<String>,
}

impl TableSpec {
    /// Derive the table from resource metadata.
    ///
    /// `primary_key` overrides the source key columns when non-empty.
    pub fn from_resource(
        name: impl Into<String>,
        schema: &ResourceSchema,
        primary_key: &[String],
    ) -> Result<Self> {
        let columns: Vec<OutputColumn> = schema
            .columns
            .iter()
            .map(|c| OutputColumn::new(&c.alias, ColumnType::from_sap(&c.sap_type, c.decimals)))
            .collect();

        let primary_key = if primary_key.is_empty() {
            schema.key_columns()
        } else {
            primary_key.iter().map(|k| k.trim().to_string()).collect()
        };

        if let Some(missing) = primary_key
            .iter()
            .find(|k| !columns.iter().any(|c| &c.name == *k))
        {
            return Err(Error::invalid_value(
                "destination.primary_key",
                format!("'{missing}' is not a column of '{}'", schema.alias),
            ));
        }

        Ok(Self {
            name: name.into(),
            columns,
            primary_key,
        })
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Positions of the given key columns
    pub fn key_indices(&self, key: &[String]) -> Result<Vec<usize>> {
        key.iter()
            .map(|k| {
                self.column_index(k).ok_or_else(|| {
                    Error::output(format!("key column '{k}' is not a column of '{}'", self.name))
                })
            })
            .collect()
    }

    /// Arrow schema of the table
    pub fn arrow_schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(&c.name, c.column_type.arrow_type(), true))
                .collect::<Vec<_>>(),
        )
    }

    /// Convert positional JSON rows into typed cells
    pub fn convert_rows(&self, rows: &[RawRow]) -> Result<Vec<Vec<Cell>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.columns.len() {
                    return Err(Error::output(format!(
                        "row has {} values, table '{}' has {} columns",
                        row.len(),
                        self.name,
                        self.columns.len()
                    )));
                }
                row.iter()
                    .zip(&self.columns)
                    .map(|(value, column)| Cell::from_json(column, value))
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// Cells
// ============================================================================

/// A typed value of one output column
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Unscaled decimal value with its scale
    Decimal(i128, u8),
    /// Text
    Text(String),
    /// Date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
}

impl Cell {
    /// Convert a JSON value for the given column
    pub fn from_json(column: &OutputColumn, value: &JsonValue) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidValue {
            column: column.name.clone(),
            value: value.to_string(),
            message: message.to_string(),
        };

        if value.is_null() {
            return Ok(Self::Null);
        }

        match column.column_type {
            ColumnType::String => Ok(Self::Text(match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })),

            ColumnType::Decimal { scale } => {
                let text = scalar_text(value).ok_or_else(|| invalid("expected a number"))?;
                if text.trim().is_empty() {
                    return Ok(Self::Null);
                }
                parse_decimal(&text, scale)
                    .map(|v| Self::Decimal(v, scale))
                    .ok_or_else(|| invalid(&format!("not a decimal with scale {scale}")))
            }

            ColumnType::Integer => match value {
                JsonValue::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .map(Self::Int)
                    .ok_or_else(|| invalid("not an integer")),
                JsonValue::String(s) if s.trim().is_empty() => Ok(Self::Null),
                JsonValue::String(s) => parse_signed(s)
                    .and_then(|s| s.parse::<i64>().ok())
                    .map(Self::Int)
                    .ok_or_else(|| invalid("not an integer")),
                _ => Err(invalid("not an integer")),
            },

            ColumnType::Float => match value {
                JsonValue::Number(n) => n.as_f64().map(Self::Float).ok_or_else(|| invalid("not a number")),
                JsonValue::String(s) if s.trim().is_empty() => Ok(Self::Null),
                JsonValue::String(s) => parse_signed(s)
                    .and_then(|s| s.parse::<f64>().ok())
                    .map(Self::Float)
                    .ok_or_else(|| invalid("not a number")),
                _ => Err(invalid("not a number")),
            },

            ColumnType::Boolean => match value {
                JsonValue::Bool(b) => Ok(Self::Bool(*b)),
                JsonValue::Number(n) => Ok(Self::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
                JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "x" | "true" | "1" | "y" => Ok(Self::Bool(true)),
                    "" | "false" | "0" | "n" | "-" => Ok(Self::Bool(false)),
                    _ => Err(invalid("not a boolean")),
                },
                _ => Err(invalid("not a boolean")),
            },

            ColumnType::Date => {
                let text = scalar_text(value).ok_or_else(|| invalid("expected a date"))?;
                parse_date(&text)
                    .map(|d| d.map_or(Self::Null, Self::Date))
                    .ok_or_else(|| invalid("expected YYYYMMDD or YYYY-MM-DD"))
            }

            ColumnType::Time => {
                let text = scalar_text(value).ok_or_else(|| invalid("expected a time"))?;
                parse_time(&text)
                    .map(|t| t.map_or(Self::Null, Self::Time))
                    .ok_or_else(|| invalid("expected HHMMSS or HH:MM:SS"))
            }

            ColumnType::Timestamp => {
                let text = scalar_text(value).ok_or_else(|| invalid("expected a timestamp"))?;
                parse_timestamp(&text)
                    .map(|t| t.map_or(Self::Null, Self::Timestamp))
                    .ok_or_else(|| invalid("expected RFC 3339 or YYYYMMDDhhmmss"))
            }
        }
    }

    /// Whether the cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(v, scale) => f.write_str(&format_decimal(*v, *scale)),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize a number that may carry the ABAP trailing sign (`"12.50-"`)
fn parse_signed(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.strip_suffix('-') {
        Some(rest) if !rest.starts_with('-') => Some(format!("-{}", rest.trim())),
        Some(_) => None,
        None => Some(text.strip_prefix('+').unwrap_or(text).to_string()),
    }
}

/// Parse a decimal string into an unscaled integer, rounding half away from
/// zero beyond `scale` digits
pub fn parse_decimal(text: &str, scale: u8) -> Option<i128> {
    let normalized = parse_signed(text)?;
    let (negative, digits) = match normalized.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, normalized.as_str()),
    };

    let (mantissa, exponent) = match digits.find(['e', 'E']) {
        Some(pos) => (&digits[..pos], digits[pos + 1..].parse::<i32>().ok()?),
        None => (digits, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Significant digits with the decimal point moved by the exponent
    let all_digits = format!("{int_part}{frac_part}");
    let leading_zeros = all_digits.bytes().take_while(|b| *b == b'0').count();
    let all_digits = &all_digits[leading_zeros..];
    if all_digits.is_empty() {
        return Some(0);
    }
    let point = i32::try_from(int_part.len())
        .ok()?
        .checked_add(exponent)?
        .checked_sub(i32::try_from(leading_zeros).ok()?)?;
    let wanted = point.checked_add(i32::from(scale))?;
    if wanted > i32::from(DECIMAL_PRECISION) {
        return None;
    }

    let mut unscaled: i128 = 0;
    for i in 0..wanted.max(0) {
        let digit = usize::try_from(i)
            .ok()
            .and_then(|i| all_digits.as_bytes().get(i))
            .map_or(0, |b| i128::from(b - b'0'));
        unscaled = unscaled.checked_mul(10)?.checked_add(digit)?;
    }

    let next_digit = usize::try_from(wanted)
        .ok()
        .and_then(|i| all_digits.as_bytes().get(i))
        .map_or(0, |b| b - b'0');
    if wanted >= 0 && next_digit >= 5 {
        unscaled = unscaled.checked_add(1)?;
    }

    if unscaled >= 10_i128.pow(u32::from(DECIMAL_PRECISION)) {
        return None;
    }
    Some(if negative { -unscaled } else { unscaled })
}

/// Render an unscaled decimal
pub fn format_decimal(value: i128, scale: u8) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let sign = if value < 0 { "-" } else { "" };
    let digits = format!("{:0>width$}", value.unsigned_abs(), width = usize::from(scale) + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - usize::from(scale));
    format!("{sign}{int_part}.{frac_part}")
}

/// `YYYYMMDD` or ISO date; blank and `00000000` are null
pub fn parse_date(text: &str) -> Option<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() || text.chars().all(|c| c == '0') {
        return Some(None);
    }
    NaiveDate::parse_from_str(text, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
        .map(Some)
}

/// `HHMMSS` or `HH:MM:SS[.f]`; blank is null
pub fn parse_time(text: &str) -> Option<Option<NaiveTime>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    NaiveTime::parse_from_str(text, "%H%M%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S%.f"))
        .ok()
        .map(Some)
}

/// RFC 3339, ISO without offset (UTC assumed), or `YYYYMMDDhhmmss`; blank and
/// all-zero values are null
pub fn parse_timestamp(text: &str) -> Option<Option<DateTime<Utc>>> {
    let text = text.trim();
    if text.is_empty() || text.chars().all(|c| c == '0') {
        return Some(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(Some(ts.with_timezone(&Utc)));
    }
    ["%Y%m%d%H%M%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
}

// ============================================================================
// Arrow Conversion
// ============================================================================

/// Build a record batch from typed rows
pub fn cells_to_batch(columns: &[OutputColumn], rows: &[Vec<Cell>]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|c| Field::new(&c.name, c.column_type.arrow_type(), true))
            .collect::<Vec<_>>(),
    ));

    let arrays = columns
        .iter()
        .enumerate()
        .map(|(i, column)| build_array(column, rows.iter().map(|row| &row[i])))
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(schema, arrays).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

fn build_array<'a>(
    column: &OutputColumn,
    cells: impl Iterator<Item = &'a Cell>,
) -> Result<ArrayRef> {
    let mismatch = |cell: &Cell| {
        Error::output(format!(
            "value {cell:?} does not fit column '{}' ({:?})",
            column.name, column.column_type
        ))
    };

    Ok(match column.column_type {
        ColumnType::String => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    other => Ok(Some(other.to_string())),
                })
                .collect::<Result<StringArray>>()?,
        ),
        ColumnType::Decimal { scale } => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Decimal(v, s) if *s == scale => Ok(Some(*v)),
                    Cell::Int(i) => Ok(Some(i128::from(*i) * 10_i128.pow(u32::from(scale)))),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Decimal128Array>>()?
                .with_precision_and_scale(DECIMAL_PRECISION, scale as i8)?,
        ),
        ColumnType::Integer => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Int(i) => Ok(Some(*i)),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Int64Array>>()?,
        ),
        ColumnType::Float => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Float(x) => Ok(Some(*x)),
                    #[allow(clippy::cast_precision_loss)]
                    Cell::Int(i) => Ok(Some(*i as f64)),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Float64Array>>()?,
        ),
        ColumnType::Boolean => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Bool(b) => Ok(Some(*b)),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<BooleanArray>>()?,
        ),
        ColumnType::Date => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Date(d) => Ok(Some(date_to_days(*d))),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Date32Array>>()?,
        ),
        ColumnType::Time => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Time(t) => Ok(Some(time_to_micros(*t))),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Time64MicrosecondArray>>()?,
        ),
        ColumnType::Timestamp => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Null => Ok(None),
                    Cell::Timestamp(ts) => Ok(Some(ts.timestamp_micros())),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<TimestampMicrosecondArray>>()?
                .with_timezone("UTC"),
        ),
    })
}

/// Read typed rows back out of a record batch, one cell per requested column.
///
/// Columns missing from the batch read as null.
pub fn batch_to_cells(batch: &RecordBatch, columns: &[OutputColumn]) -> Result<Vec<Vec<Cell>>> {
    let readers = columns
        .iter()
        .map(|column| {
            batch
                .column_by_name(&column.name)
                .map(|array| (column, Arc::clone(array)))
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let cells = readers
            .iter()
            .map(|reader| match reader {
                None => Ok(Cell::Null),
                Some((column, array)) => read_cell(column, array.as_ref(), row),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(cells);
    }
    Ok(rows)
}

fn read_cell(column: &OutputColumn, array: &dyn Array, row: usize) -> Result<Cell> {
    if array.is_null(row) {
        return Ok(Cell::Null);
    }

    let unexpected = || {
        Error::output(format!(
            "column '{}' has type {} in the existing file",
            column.name,
            array.data_type()
        ))
    };
    let any = array.as_any();

    Ok(match column.column_type {
        ColumnType::String => Cell::Text(
            any.downcast_ref::<StringArray>()
                .ok_or_else(unexpected)?
                .value(row)
                .to_string(),
        ),
        ColumnType::Decimal { scale } => {
            let value = any
                .downcast_ref::<Decimal128Array>()
                .ok_or_else(unexpected)?
                .value(row);
            Cell::Decimal(value, scale)
        }
        ColumnType::Integer => Cell::Int(
            any.downcast_ref::<Int64Array>()
                .ok_or_else(unexpected)?
                .value(row),
        ),
        ColumnType::Float => Cell::Float(
            any.downcast_ref::<Float64Array>()
                .ok_or_else(unexpected)?
                .value(row),
        ),
        ColumnType::Boolean => Cell::Bool(
            any.downcast_ref::<BooleanArray>()
                .ok_or_else(unexpected)?
                .value(row),
        ),
        ColumnType::Date => {
            let days = any
                .downcast_ref::<Date32Array>()
                .ok_or_else(unexpected)?
                .value(row);
            Cell::Date(days_to_date(days).ok_or_else(unexpected)?)
        }
        ColumnType::Time => {
            let micros = any
                .downcast_ref::<Time64MicrosecondArray>()
                .ok_or_else(unexpected)?
                .value(row);
            Cell::Time(micros_to_time(micros).ok_or_else(unexpected)?)
        }
        ColumnType::Timestamp => {
            let micros = any
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(unexpected)?
                .value(row);
            Cell::Timestamp(DateTime::from_timestamp_micros(micros).ok_or_else(unexpected)?)
        }
    })
}

fn date_to_days(date: NaiveDate) -> i32 {
    chrono::Datelike::num_days_from_ce(&date) - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn time_to_micros(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond() / 1_000)
}

fn micros_to_time(micros: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000)).ok()? * 1_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}
