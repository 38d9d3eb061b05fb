//! Month-bucketed aggregation and multi-series alignment for charts.

use std::collections::{BTreeMap, BTreeSet};

use crate::dates::{month_key, DateRange, MonthKey};

/// One numeric value per month, labels ascending with `Unknown` last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthSeries {
    pub labels: Vec<MonthKey>,
    pub values: Vec<f64>,
}

impl MonthSeries {
    pub fn get(&self, key: &MonthKey) -> Option<f64> {
        self.labels
            .binary_search(key)
            .ok()
            .map(|idx| self.values[idx])
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    fn from_buckets(buckets: BTreeMap<MonthKey, f64>) -> Self {
        let (labels, values) = buckets.into_iter().unzip();
        Self { labels, values }
    }
}

/// Several series laid over one shared label axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    pub labels: Vec<MonthKey>,
    pub values: Vec<Vec<f64>>,
}

/// Group records by month and category, summing `value_of` per cell.
///
/// Records whose date falls outside `range` are skipped. Records with an
/// unreadable date are kept under `MonthKey::Unknown` as long as the range is
/// unbounded.
pub fn aggregate_by_month<'a, T, K, D, V, C>(
    records: impl IntoIterator<Item = &'a T>,
    date_of: D,
    value_of: V,
    category_of: C,
    range: &DateRange,
) -> BTreeMap<K, MonthSeries>
where
    T: 'a,
    K: Ord,
    D: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
    C: Fn(&T) -> K,
{
    let mut cells: BTreeMap<K, BTreeMap<MonthKey, f64>> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        let date = date_of(record);
        if !range.contains(date) {
            skipped += 1;
            continue;
        }
        *cells
            .entry(category_of(record))
            .or_default()
            .entry(month_key(date))
            .or_insert(0.0) += value_of(record);
    }
    tracing::debug!(categories = cells.len(), skipped, "aggregated records by month");

    cells
        .into_iter()
        .map(|(category, buckets)| (category, MonthSeries::from_buckets(buckets)))
        .collect()
}

/// Single-category form of [`aggregate_by_month`].
pub fn aggregate_total<'a, T, D, V>(
    records: impl IntoIterator<Item = &'a T>,
    date_of: D,
    value_of: V,
    range: &DateRange,
) -> MonthSeries
where
    T: 'a,
    D: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    aggregate_by_month(records, date_of, value_of, |_| (), range)
        .remove(&())
        .unwrap_or_default()
}

/// Count occurrences per category instead of summing amounts.
pub fn count_by<'a, T, K, C>(records: impl IntoIterator<Item = &'a T>, category_of: C) -> BTreeMap<K, usize>
where
    T: 'a,
    K: Ord,
    C: Fn(&T) -> K,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(category_of(record)).or_insert(0) += 1;
    }
    counts
}

/// Merge independently-keyed series onto the sorted union of their labels,
/// filling months a series lacks with zero.
pub fn align(series: &[MonthSeries]) -> AlignedSeries {
    let labels: Vec<MonthKey> = series
        .iter()
        .flat_map(|s| s.labels.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let values = series
        .iter()
        .map(|s| {
            labels
                .iter()
                .map(|label| s.get(label).unwrap_or(0.0))
                .collect()
        })
        .collect();

    AlignedSeries { labels, values }
}
