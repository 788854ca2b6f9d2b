//! Summary statistics and binning for numeric chart panels.

/// Bins used by every histogram panel.
pub const HISTOGRAM_BINS: usize = 30;
/// Buckets used by ranged bar charts.
pub const RANGE_BUCKETS: usize = 8;
/// Nudge applied to the last range edge so the maximum is counted.
pub const RANGE_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in values {
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        Some(Self {
            count: values.len(),
            mean: sum / values.len() as f64,
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over the observed range. Each bin is half-open except the
/// last, which also takes the maximum. A zero-width range is widened by half a
/// unit on each side. No bins come back when the range is not finite.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some(summary) = Summary::of(values) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let (lo, hi) = if summary.min == summary.max {
        (summary.min - 0.5, summary.max + 0.5)
    } else {
        (summary.min, summary.max)
    };
    // Divided before subtracting so ranges wider than f64::MAX stay finite.
    let width = hi / bins as f64 - lo / bins as f64;
    if !lo.is_finite() || !hi.is_finite() || !width.is_finite() {
        return Vec::new();
    }
    let mut counts = vec![0usize; bins];
    for &value in values {
        let idx = (((value - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| Bin {
            start: lo + idx as f64 * width,
            end: if idx + 1 == bins {
                hi
            } else {
                lo + (idx + 1) as f64 * width
            },
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    pub label: String,
    pub count: usize,
}

/// Splits `[min, max]` into `buckets` equal sub-ranges labelled with their
/// integer-rounded bounds. Buckets are right-closed; the first also includes
/// its lower edge. Returns `None` when there is nothing to partition.
pub fn range_buckets(values: &[f64], buckets: usize) -> Option<Vec<RangeBucket>> {
    let summary = Summary::of(values)?;
    let buckets = buckets.max(1);
    let step = summary.max / buckets as f64 - summary.min / buckets as f64;
    if step <= 0.0 || !step.is_finite() {
        return None;
    }
    let mut edges = (0..=buckets)
        .map(|idx| summary.min + idx as f64 * step)
        .collect::<Vec<_>>();
    edges[buckets] = summary.max + RANGE_EPSILON;

    let mut counts = vec![0usize; buckets];
    for &value in values {
        if let Some(idx) = (0..buckets).find(|&idx| value <= edges[idx + 1]) {
            counts[idx] += 1;
        }
    }
    Some(
        counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| {
                let start = summary.min + idx as f64 * step;
                let end = summary.min + (idx + 1) as f64 * step;
                RangeBucket {
                    label: format!("{start:.0}-{end:.0}"),
                    count,
                }
            })
            .collect(),
    )
}

/// Four decimals for fractional values, integer text otherwise.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
