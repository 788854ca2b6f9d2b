use std::collections::HashMap;

use itertools::Itertools;

use crate::data::{Column, DistinctKey, is_missing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Occurrence counts of each present value, most frequent first. Ties are
/// ordered by value text so repeated runs agree. Values that print alike
/// but differ in kind, such as 1 and "1", are counted apart.
pub fn value_counts(column: &Column) -> Vec<ValueCount> {
    let mut counts: HashMap<DistinctKey, (String, usize)> = HashMap::new();
    for value in column
        .values()
        .iter()
        .filter(|cell| !is_missing(cell))
        .flatten()
    {
        counts
            .entry(value.distinct_key())
            .or_insert_with(|| (value.as_display(), 0))
            .1 += 1;
    }
    counts
        .into_iter()
        .sorted_by(|(a_key, (a_text, a_count)), (b_key, (b_text, b_count))| {
            b_count
                .cmp(a_count)
                .then_with(|| a_text.cmp(b_text))
                .then_with(|| a_key.cmp(b_key))
        })
        .map(|(_, (value, count))| ValueCount { value, count })
        .collect()
}
