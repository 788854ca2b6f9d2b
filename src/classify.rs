//! Per-column chart strategy selection.
//!
//! Classification is a pure function of one column's missing count, distinct
//! count and numeric-ness, recomputed on every pass.

use std::{collections::HashSet, fmt};

use crate::data::{Column, Value, is_missing};

/// Numeric columns with more distinct values than this switch to ranged bars;
/// non-numeric columns above it are skipped.
pub const MAX_DISTINCT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Histogram,
    RangedBar,
    CategoricalBar,
}

impl ChartKind {
    pub fn filename(self, column: &str) -> String {
        match self {
            ChartKind::Histogram => format!("{column}_histogram.png"),
            ChartKind::RangedBar => format!("{column}_ranges_barchart.png"),
            ChartKind::CategoricalBar => format!("{column}_barchart.png"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    AllMissing,
    Cardinality { distinct: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AllMissing => f.write_str("all values are null"),
            SkipReason::Cardinality { distinct } => {
                write!(f, "{distinct} unique value(s) cannot be visualized")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Histogram,
    RangedBar,
    CategoricalBar,
    Skip(SkipReason),
}

impl Strategy {
    pub fn chart_kind(self) -> Option<ChartKind> {
        match self {
            Strategy::Histogram => Some(ChartKind::Histogram),
            Strategy::RangedBar => Some(ChartKind::RangedBar),
            Strategy::CategoricalBar => Some(ChartKind::CategoricalBar),
            Strategy::Skip(_) => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Histogram => "histogram",
            Strategy::RangedBar => "ranged-bar",
            Strategy::CategoricalBar => "categorical-bar",
            Strategy::Skip(_) => "skip",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    pub rows: usize,
    pub missing: usize,
    pub distinct: usize,
    pub numeric: bool,
}

pub fn profile(column: &Column) -> ColumnProfile {
    let numeric = column.declared().is_numeric();
    let distinct = column
        .values()
        .iter()
        .filter(|cell| !is_missing(cell))
        .flatten()
        .map(Value::distinct_key)
        .collect::<HashSet<_>>()
        .len();
    ColumnProfile {
        rows: column.len(),
        missing: column.missing_count(),
        distinct,
        numeric,
    }
}

pub fn classify(column: &Column) -> Strategy {
    classify_profile(&profile(column))
}

pub fn classify_profile(profile: &ColumnProfile) -> Strategy {
    if profile.missing == profile.rows {
        return Strategy::Skip(SkipReason::AllMissing);
    }
    if profile.numeric {
        return if profile.distinct > MAX_DISTINCT {
            Strategy::RangedBar
        } else {
            Strategy::Histogram
        };
    }
    if profile.distinct > 1 && profile.distinct <= MAX_DISTINCT {
        Strategy::CategoricalBar
    } else {
        Strategy::Skip(SkipReason::Cardinality {
            distinct: profile.distinct,
        })
    }
}
