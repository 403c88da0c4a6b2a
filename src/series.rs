//! Series Aggregation
//!
//! Reshapes flat `(category, group, value)` rows into a category axis and one
//! value sequence per group, ready for a clustered bar chart.
//!
//! Ordering is strictly first-seen: the category axis and the group keys keep
//! the order in which they first appear in the input. Nothing is sorted here;
//! chronological order is whatever the query's `ORDER BY` produced.
//!
//! Values are appended to their group's sequence in input order. A group that
//! has no row for some category simply has a shorter sequence; no
//! zero-filling or reindexing happens.

use std::collections::{HashMap, HashSet};

/// One named value sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Category axis plus one value sequence per group, both in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategorySeries {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl CategorySeries {
    /// Values for the given group label
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.series.iter().find(|s| s.label == label).map(|s| s.values.as_slice())
    }

    /// Group labels in first-seen order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.label.as_str())
    }
}

/// A group holding its own insertion-ordered subgroups
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup {
    pub label: String,
    pub series: Vec<Series>,
}

/// Category axis plus group → subgroup → values, each level in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NestedSeries {
    pub categories: Vec<String>,
    pub groups: Vec<SeriesGroup>,
}

impl NestedSeries {
    /// Flatten into one series per (group, subgroup), labelled `"<group><sep><subgroup>"`
    #[must_use]
    pub fn flatten(self, separator: &str) -> CategorySeries {
        let series = self
            .groups
            .into_iter()
            .flat_map(|group| {
                let prefix = group.label;
                group.series.into_iter().map(move |sub| Series {
                    label: format!("{prefix}{separator}{}", sub.label),
                    values: sub.values,
                })
            })
            .collect();

        CategorySeries { categories: self.categories, series }
    }
}

/// First-seen ordered set of labels
#[derive(Default)]
struct CategoryAxis {
    labels: Vec<String>,
    seen: HashSet<String>,
}

impl CategoryAxis {
    fn observe(&mut self, label: String) {
        if self.seen.insert(label.clone()) {
            self.labels.push(label);
        }
    }
}

/// Insertion-ordered map from label to a value sequence
#[derive(Default)]
struct OrderedSeries {
    series: Vec<Series>,
    index: HashMap<String, usize>,
}

impl OrderedSeries {
    fn push(&mut self, label: String, value: f64) {
        let idx = match self.index.get(&label) {
            Some(&idx) => idx,
            None => {
                let idx = self.series.len();
                self.index.insert(label.clone(), idx);
                self.series.push(Series { label, values: Vec::new() });
                idx
            }
        };
        self.series[idx].values.push(value);
    }
}

/// Aggregate `(category, group, value)` rows in a single pass
pub fn aggregate<I, C, G>(rows: I) -> CategorySeries
where
    I: IntoIterator<Item = (C, G, f64)>,
    C: Into<String>,
    G: Into<String>,
{
    let mut axis = CategoryAxis::default();
    let mut groups = OrderedSeries::default();

    for (category, group, value) in rows {
        axis.observe(category.into());
        groups.push(group.into(), value);
    }

    CategorySeries { categories: axis.labels, series: groups.series }
}

/// Aggregate `(category, group, subgroup, value)` rows in a single pass
pub fn aggregate_nested<I, C, G, S>(rows: I) -> NestedSeries
where
    I: IntoIterator<Item = (C, G, S, f64)>,
    C: Into<String>,
    G: Into<String>,
    S: Into<String>,
{
    let mut axis = CategoryAxis::default();
    let mut groups: Vec<(String, OrderedSeries)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for (category, group, subgroup, value) in rows {
        axis.observe(category.into());

        let group = group.into();
        let idx = match group_index.get(&group) {
            Some(&idx) => idx,
            None => {
                group_index.insert(group.clone(), groups.len());
                groups.push((group, OrderedSeries::default()));
                groups.len() - 1
            }
        };
        groups[idx].1.push(subgroup.into(), value);
    }

    NestedSeries {
        categories: axis.labels,
        groups: groups
            .into_iter()
            .map(|(label, subgroups)| SeriesGroup { label, series: subgroups.series })
            .collect(),
    }
}
