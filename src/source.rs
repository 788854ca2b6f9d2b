//! Query execution against the warehouse stand-in.
//!
//! A [`TableSource`] turns SQL text into a fully materialized [`Table`].
//! [`DuckDbSource`] runs the query with DuckDB; closures work as sources for
//! callers that already hold their data.

use std::{fs, path::Path};

use chrono::{DateTime, NaiveDate};
use clap::ValueEnum;
use duckdb::{
    Connection,
    types::{TimeUnit, Value as DuckValue},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Column, Table, Value},
    error::FetchError,
};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub trait TableSource {
    /// Runs `query` and returns every row. No partial results.
    fn fetch_table(&self, query: &str) -> Result<Table, FetchError>;
}

impl<F> TableSource for F
where
    F: Fn(&str) -> Result<Table, FetchError>,
{
    fn fetch_table(&self, query: &str) -> Result<Table, FetchError> {
        self(query)
    }
}

/// How result sets are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Column-major accumulation.
    #[default]
    Columnar,
    /// Row tuples pivoted into columns afterwards.
    Rows,
}

/// What the running process can do, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub columnar_engine: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            columnar_engine: true,
        }
    }
}

impl Capabilities {
    /// The engine actually used when `requested` is asked for.
    pub fn resolve(self, requested: Engine) -> Engine {
        match requested {
            Engine::Columnar if !self.columnar_engine => {
                warn!("Columnar engine unavailable; collecting rows instead");
                Engine::Rows
            }
            other => other,
        }
    }
}

pub struct DuckDbSource {
    conn: Connection,
    engine: Engine,
}

impl DuckDbSource {
    pub fn in_memory(engine: Engine, capabilities: Capabilities) -> Result<Self, FetchError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(conn, engine, capabilities))
    }

    pub fn open(
        path: &Path,
        engine: Engine,
        capabilities: Capabilities,
    ) -> Result<Self, FetchError> {
        let conn = Connection::open(path)?;
        debug!("Opened DuckDB database {path:?}");
        Ok(Self::with_connection(conn, engine, capabilities))
    }

    pub fn with_connection(conn: Connection, engine: Engine, capabilities: Capabilities) -> Self {
        Self {
            conn,
            engine: capabilities.resolve(engine),
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Direct access for seeding tables before a run.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TableSource for DuckDbSource {
    fn fetch_table(&self, query: &str) -> Result<Table, FetchError> {
        let sql = query.trim().trim_end_matches(';').trim();
        if sql.is_empty() {
            return Err(FetchError::Other(String::from("query is empty")));
        }
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let names = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();
        let width = names.len();

        let table = match self.engine {
            Engine::Columnar => {
                let mut columns: Vec<Vec<Option<Value>>> = vec![Vec::new(); width];
                while let Some(row) = rows.next()? {
                    for (idx, column) in columns.iter_mut().enumerate() {
                        column.push(convert(row.get::<_, DuckValue>(idx)?));
                    }
                }
                Table::from_columns(
                    names
                        .into_iter()
                        .zip(columns)
                        .map(|(name, values)| Column::new(name, values))
                        .collect(),
                )?
            }
            Engine::Rows => {
                let mut tuples = Vec::new();
                while let Some(row) = rows.next()? {
                    let tuple = (0..width)
                        .map(|idx| row.get::<_, DuckValue>(idx).map(convert))
                        .collect::<Result<Vec<_>, _>>()?;
                    tuples.push(tuple);
                }
                Table::from_rows(names, tuples)?
            }
        };
        info!(
            "Fetched {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

/// Loads the SQL text of a query file.
pub fn read_query(path: &Path) -> Result<String, FetchError> {
    let sql = fs::read_to_string(path)?;
    debug!("Loaded query from {path:?} ({} bytes)", sql.len());
    Ok(sql)
}

fn convert(value: DuckValue) -> Option<Value> {
    let converted = match value {
        DuckValue::Null => return None,
        DuckValue::Boolean(v) => Value::Boolean(v),
        DuckValue::TinyInt(v) => Value::Integer(v.into()),
        DuckValue::SmallInt(v) => Value::Integer(v.into()),
        DuckValue::Int(v) => Value::Integer(v.into()),
        DuckValue::BigInt(v) => Value::Integer(v),
        DuckValue::UTinyInt(v) => Value::Integer(v.into()),
        DuckValue::USmallInt(v) => Value::Integer(v.into()),
        DuckValue::UInt(v) => Value::Integer(v.into()),
        DuckValue::UBigInt(v) => match i64::try_from(v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Float(v as f64),
        },
        DuckValue::HugeInt(v) => match i64::try_from(v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Float(v as f64),
        },
        DuckValue::Float(v) => Value::Float(v.into()),
        DuckValue::Double(v) => Value::Float(v),
        DuckValue::Decimal(v) => Value::Decimal(v),
        DuckValue::Text(v) | DuckValue::Enum(v) => Value::String(v),
        DuckValue::Date32(days) => {
            match NaiveDate::from_num_days_from_ce_opt(days.saturating_add(UNIX_EPOCH_DAYS_FROM_CE)) {
                Some(date) => Value::Date(date),
                None => Value::String(days.to_string()),
            }
        }
        DuckValue::Timestamp(unit, raw) => match DateTime::from_timestamp_micros(to_micros(unit, raw)) {
            Some(ts) => Value::DateTime(ts.naive_utc()),
            None => Value::String(raw.to_string()),
        },
        other => Value::String(format!("{other:?}")),
    };
    Some(converted)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}
