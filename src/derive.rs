//! Monitoring ratios derived from raw warehouse columns.
//!
//! The ratio definitions live in one table ([`RATIOS`]). The dashboard-facing
//! and actual-facing metric sets differ only in their output prefix, so both
//! call sites resolve their specs from the same definitions.

use log::{debug, info, warn};

use crate::{
    data::{Column, DeclaredType, Table, Value, is_missing},
    error::{DeriveError, DeriveSkip},
};

pub const CREDIT_LIMIT_OPEN_ACCOUNTS: &str = "CREDIT_LIMIT_OPEN_ACCOUNTS";
pub const PRINCIPAL_BALANCE_OPEN_ACCOUNTS: &str = "PRINCIPAL_BALANCE_OPEN_ACCOUNTS";
pub const TOTAL_BALANCE_OPEN_ACCOUNTS: &str = "TOTAL_BALANCE_OPEN_ACCOUNTS";
pub const OPEN_STATEMENTS: &str = "OPEN_STATEMENTS";

/// Which naming convention the derived columns use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    /// Assumption-facing names matching the monitoring dashboard.
    Dashboard,
    /// Actual-facing names compared against the assumption columns.
    Actual,
}

impl MetricFamily {
    pub fn prefix(self) -> &'static str {
        match self {
            MetricFamily::Dashboard => "TABLEAU_",
            MetricFamily::Actual => "ACTUAL_",
        }
    }

    pub fn output_name(self, metric: &str) -> String {
        format!("{}{metric}", self.prefix())
    }
}

/// One ratio definition. Numerators are tried in order; the first one present
/// in the table wins.
#[derive(Debug, Clone, Copy)]
pub struct RatioDefinition {
    pub metric: &'static str,
    pub numerators: &'static [&'static str],
    pub denominator: Option<&'static str>,
}

pub const RATIOS: [RatioDefinition; 10] = [
    RatioDefinition {
        metric: "PBAD_PER_OPEN",
        numerators: &["CHARGED_OFF_STATEMENTS"],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "SEVERITY",
        numerators: &["PRINCIPAL_BALANCE_CHARGEDOFF_ACCOUNTS"],
        denominator: Some("CREDIT_LIMIT_CHARGEDOFF_ACCOUNTS"),
    },
    RatioDefinition {
        metric: "UTIL",
        numerators: &[PRINCIPAL_BALANCE_OPEN_ACCOUNTS, TOTAL_BALANCE_OPEN_ACCOUNTS],
        denominator: Some(CREDIT_LIMIT_OPEN_ACCOUNTS),
    },
    RatioDefinition {
        metric: "DQ30",
        numerators: &["BKT2_ACCOUNTS"],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "CREDIT_LINE",
        numerators: &[CREDIT_LIMIT_OPEN_ACCOUNTS],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "CASH_ADVANCE",
        numerators: &["CASH_ADVANCE_TAKERS"],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "PENALTY",
        numerators: &["LATE_FEES"],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "PVOL",
        numerators: &["PURCHASE_BALANCE_OPEN_ACCOUNTS"],
        denominator: Some(TOTAL_BALANCE_OPEN_ACCOUNTS),
    },
    RatioDefinition {
        metric: "ATTRITION",
        numerators: &["VOLUNTARY_CLOSURES"],
        denominator: Some(OPEN_STATEMENTS),
    },
    RatioDefinition {
        metric: "OUTSTANDING",
        numerators: &["AVERAGE_OUTSTANDING_BALANCE_OPEN_ACCOUNTS"],
        denominator: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub output_name: String,
    pub numerator: String,
    pub denominator: Option<String>,
}

impl MetricSpec {
    pub fn ratio(output_name: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            output_name: output_name.to_string(),
            numerator: numerator.to_string(),
            denominator: Some(denominator.to_string()),
        }
    }

    pub fn passthrough(output_name: &str, numerator: &str) -> Self {
        Self {
            output_name: output_name.to_string(),
            numerator: numerator.to_string(),
            denominator: None,
        }
    }
}

/// Resolves [`RATIOS`] against `table` for one naming family.
///
/// Multi-numerator definitions pick the first numerator present in the table
/// and are omitted when none is. Single-numerator definitions are always
/// emitted so a missing column surfaces as a skip during [`derive`].
pub fn metric_specs(family: MetricFamily, table: &Table) -> Vec<MetricSpec> {
    let mut specs = Vec::with_capacity(RATIOS.len());
    for ratio in &RATIOS {
        let numerator = if ratio.numerators.len() > 1 {
            match ratio.numerators.iter().find(|name| table.contains(name)) {
                Some(name) => *name,
                None => {
                    debug!(
                        "Omitting {}: none of {:?} present",
                        family.output_name(ratio.metric),
                        ratio.numerators
                    );
                    continue;
                }
            }
        } else {
            ratio.numerators[0]
        };
        specs.push(MetricSpec {
            output_name: family.output_name(ratio.metric),
            numerator: numerator.to_string(),
            denominator: ratio.denominator.map(str::to_string),
        });
    }
    specs
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMetric {
    pub output_name: String,
    pub reason: DeriveSkip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub table: Table,
    pub added: Vec<String>,
    pub skipped: Vec<SkippedMetric>,
}

impl Derivation {
    fn unchanged(table: &Table) -> Self {
        Self {
            table: table.clone(),
            added: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Appends every metric in `specs` to a copy of `table`.
///
/// Missing inputs skip one metric. A non-numeric ratio operand abandons the
/// whole pass and hands back the input unchanged.
pub fn derive(table: &Table, specs: &[MetricSpec]) -> Derivation {
    match try_derive(table, specs) {
        Ok(derivation) => {
            info!(
                "Added {} metric column(s), skipped {}",
                derivation.added.len(),
                derivation.skipped.len()
            );
            for name in &derivation.added {
                debug!("  - {name}");
            }
            derivation
        }
        Err(err) => {
            warn!("Error calculating metrics: {err}. Proceeding with original table");
            Derivation::unchanged(table)
        }
    }
}

fn try_derive(table: &Table, specs: &[MetricSpec]) -> Result<Derivation, DeriveError> {
    let mut working = table.clone();
    normalize_decimals(&mut working);

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for spec in specs {
        if let Some(reason) = missing_input(&working, spec) {
            warn!("Skipping {}: {reason}", spec.output_name);
            skipped.push(SkippedMetric {
                output_name: spec.output_name.clone(),
                reason,
            });
            continue;
        }
        let column = compute(&working, spec)?;
        working.push_column(column)?;
        added.push(spec.output_name.clone());
    }
    Ok(Derivation {
        table: working,
        added,
        skipped,
    })
}

fn missing_input(table: &Table, spec: &MetricSpec) -> Option<DeriveSkip> {
    if table.contains(&spec.output_name) {
        return Some(DeriveSkip::NameTaken(spec.output_name.clone()));
    }
    std::iter::once(&spec.numerator)
        .chain(spec.denominator.as_ref())
        .find(|name| !table.contains(name))
        .map(|name| DeriveSkip::MissingColumn(name.clone()))
}

fn compute(table: &Table, spec: &MetricSpec) -> Result<Column, DeriveError> {
    let numerator = lookup(table, &spec.numerator)?;
    let Some(denominator_name) = &spec.denominator else {
        return Ok(numerator.renamed(spec.output_name.as_str()));
    };
    let denominator = lookup(table, denominator_name)?;
    let quotient = safe_divide(
        &numeric_operand(numerator)?,
        &numeric_operand(denominator)?,
    );
    Ok(Column::from_f64(spec.output_name.as_str(), quotient))
}

fn lookup<'a>(table: &'a Table, name: &str) -> Result<&'a Column, DeriveError> {
    table
        .column(name)
        .ok_or_else(|| DeriveError::MissingOperand(name.to_string()))
}

fn numeric_operand(column: &Column) -> Result<Vec<Option<f64>>, DeriveError> {
    if let Some(value) = column
        .values()
        .iter()
        .flatten()
        .find(|value| !value.is_numeric())
    {
        return Err(DeriveError::NonNumericOperand {
            column: column.name().to_string(),
            value: value.as_display(),
        });
    }
    Ok(column.f64_values())
}

/// Element-wise division where a zero or missing denominator, or a missing
/// numerator, yields a missing result.
pub fn safe_divide(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(num, den)| {
            let den = den.filter(|d| *d != 0.0 && !d.is_nan())?;
            let num = num.filter(|n| !n.is_nan())?;
            Some(num / den)
        })
        .collect()
}

/// Converts object columns whose first present value is a decimal into float
/// columns. Cells that cannot be read as a number become missing.
pub fn normalize_decimals(table: &mut Table) {
    for column in table.columns_mut() {
        if column.declared() != DeclaredType::Object {
            continue;
        }
        if !matches!(column.first_present(), Some(Value::Decimal(_))) {
            continue;
        }
        let converted = column
            .values()
            .iter()
            .map(|cell| {
                if is_missing(cell) {
                    return None;
                }
                cell.as_ref().and_then(coerce_f64).map(Value::Float)
            })
            .collect();
        column.replace_values(DeclaredType::Float, converted);
        info!("Converted {} from Decimal to float", column.name());
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        other => other.as_f64(),
    }
}
