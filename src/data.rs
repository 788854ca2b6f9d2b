use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

// 2^63, the first whole float an i64 cannot hold.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < I64_LIMIT {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Numeric view of the value. Booleans widen to 0/1; text and temporal
    /// values have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Decimal(d) => d.to_f64(),
            Value::String(_) | Value::Date(_) | Value::DateTime(_) => None,
        }
    }

    /// Identity used when counting distinct values. Numbers match across
    /// kinds (1 and 1.0) but never match text.
    pub fn distinct_key(&self) -> DistinctKey {
        match self {
            Value::Integer(i) => DistinctKey::number(*i as f64),
            Value::Float(f) => DistinctKey::number(*f),
            Value::Boolean(b) => DistinctKey::number(if *b { 1.0 } else { 0.0 }),
            Value::Decimal(d) => match d.to_f64() {
                Some(number) => DistinctKey::number(number),
                None => DistinctKey::Decimal(d.normalize()),
            },
            Value::String(s) => DistinctKey::Text(s.clone()),
            Value::Date(d) => DistinctKey::Date(*d),
            Value::DateTime(dt) => DistinctKey::DateTime(*dt),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Decimal(_)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistinctKey {
    /// Bit pattern of the numeric view.
    Number(u64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl DistinctKey {
    fn number(value: f64) -> Self {
        // -0.0 folds into 0.0.
        DistinctKey::Number(if value == 0.0 { 0 } else { value.to_bits() })
    }
}

/// A NaN float counts as missing, the same as an absent cell.
pub fn is_missing(cell: &Option<Value>) -> bool {
    match cell {
        None => true,
        Some(Value::Float(f)) => f.is_nan(),
        Some(_) => false,
    }
}

/// Storage type of a column as the fetch layer handed it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Integer,
    Float,
    Boolean,
    Text,
    Temporal,
    /// Mixed, decimal or entirely missing cells.
    Object,
}

impl DeclaredType {
    pub fn infer(values: &[Option<Value>]) -> Self {
        let mut inferred: Option<DeclaredType> = None;
        for value in values.iter().flatten() {
            let current = match value {
                Value::Integer(_) => DeclaredType::Integer,
                Value::Float(_) => DeclaredType::Float,
                Value::Boolean(_) => DeclaredType::Boolean,
                Value::String(_) => DeclaredType::Text,
                Value::Date(_) | Value::DateTime(_) => DeclaredType::Temporal,
                Value::Decimal(_) => return DeclaredType::Object,
            };
            inferred = Some(match (inferred, current) {
                (None, ty) => ty,
                (Some(prev), ty) if prev == ty => ty,
                (Some(DeclaredType::Integer), DeclaredType::Float)
                | (Some(DeclaredType::Float), DeclaredType::Integer) => DeclaredType::Float,
                _ => return DeclaredType::Object,
            });
        }
        inferred.unwrap_or(DeclaredType::Object)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DeclaredType::Integer | DeclaredType::Float | DeclaredType::Boolean
        )
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclaredType::Integer => "integer",
            DeclaredType::Float => "float",
            DeclaredType::Boolean => "boolean",
            DeclaredType::Text => "text",
            DeclaredType::Temporal => "temporal",
            DeclaredType::Object => "object",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    declared: DeclaredType,
    values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        let declared = DeclaredType::infer(&values);
        Self {
            name: name.into(),
            declared,
            values,
        }
    }

    pub fn with_type(
        name: impl Into<String>,
        declared: DeclaredType,
        values: Vec<Option<Value>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared,
            values,
        }
    }

    pub fn from_f64(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|f| !f.is_nan()).map(Value::Float))
            .collect();
        Self::with_type(name, DeclaredType::Float, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> DeclaredType {
        self.declared
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|cell| is_missing(cell)).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(is_missing)
    }

    pub fn first_present(&self) -> Option<&Value> {
        self.values
            .iter()
            .find(|cell| !is_missing(cell))
            .and_then(|cell| cell.as_ref())
    }

    /// Cell-aligned numeric view; non-numeric cells read as missing.
    pub fn f64_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|cell| cell.as_ref().and_then(Value::as_f64))
            .collect()
    }

    /// Numeric values with missing cells dropped, booleans widened to 0/1.
    pub fn present_f64(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|cell| cell.as_ref().and_then(Value::as_f64))
            .collect()
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: self.declared,
            values: self.values.clone(),
        }
    }

    pub(crate) fn replace_values(&mut self, declared: DeclaredType, values: Vec<Option<Value>>) {
        self.declared = declared;
        self.values = values;
    }
}

/// Column-oriented query result. Names are unique and every column holds
/// `row_count` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Builds a table from row tuples aligned to `names`.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Option<Value>>>) -> Result<Self, TableError> {
        let width = names.len();
        let mut cells: Vec<Vec<Option<Value>>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(TableError::RowWidth {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for (column, value) in cells.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::from_columns(columns)
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.contains(column.name()) {
            return Err(TableError::DuplicateColumn(column.name().to_string()));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(TableError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                found: column.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }
}
