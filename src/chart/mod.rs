//! Clustered Bar Charts
//!
//! A `BarChart` is built from an aggregated `CategorySeries` and turned into a
//! `ChartLayout`: plain bar and tick geometry that a `ChartSink` draws.
//!
//! # Layout Rules
//! - Cluster `k` (one per category) has its base at x = `k`
//! - Bar of series `i` is centred at `k + i * bar_width`
//! - Ticks sit at `k + bar_width * groups / 2` for grouped charts, or at
//!   `k` when anchored to the base; `groups` is the series count unless a
//!   flattened nested chart sets its top-level group count
//! - Series `i` with fewer values than there are categories is drawn at
//!   clusters `0..values.len()`; values are never reindexed against the axis
//! - Legend entries follow series insertion order
//!
//! Non-finite values (NULL aggregates) keep their slot but produce no bar.

use std::path::PathBuf;

use crate::error::Result;
use crate::series::{CategorySeries, Series};

pub mod vegalite;

pub use vegalite::{HtmlChartWriter, VegaLiteWriter};

/// Default bar width for grouped charts
pub const DEFAULT_BAR_WIDTH: f64 = 0.2;

/// Where category ticks are placed relative to each cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAnchor {
    /// `base + bar_width * groups / 2`
    ClusterOffset,
    /// Directly under the cluster base
    Base,
}

/// A clustered bar chart description
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub bar_width: f64,
    pub tick_anchor: TickAnchor,
    /// Group count used for tick offsets; `None` means one group per series
    pub tick_groups: Option<usize>,
    /// Print each bar's value (one decimal) above it
    pub value_labels: bool,
}

impl BarChart {
    /// Grouped chart: one cluster per category, one bar per series
    pub fn grouped(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        data: CategorySeries,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            legend_title: None,
            categories: data.categories,
            series: data.series,
            bar_width: DEFAULT_BAR_WIDTH,
            tick_anchor: TickAnchor::ClusterOffset,
            tick_groups: None,
            value_labels: false,
        }
    }

    #[must_use]
    pub fn with_legend_title(mut self, title: impl Into<String>) -> Self {
        self.legend_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_bar_width(mut self, width: f64) -> Self {
        self.bar_width = width;
        self
    }

    #[must_use]
    pub fn with_tick_anchor(mut self, anchor: TickAnchor) -> Self {
        self.tick_anchor = anchor;
        self
    }

    /// Centre ticks over `groups` bars instead of every series
    #[must_use]
    pub fn with_tick_groups(mut self, groups: usize) -> Self {
        self.tick_groups = Some(groups);
        self
    }

    #[must_use]
    pub fn with_value_labels(mut self) -> Self {
        self.value_labels = true;
        self
    }

    /// Offset of each tick from its cluster base
    #[must_use]
    pub fn tick_offset(&self) -> f64 {
        match self.tick_anchor {
            TickAnchor::ClusterOffset => {
                let groups = self.tick_groups.unwrap_or(self.series.len());
                self.bar_width * groups as f64 / 2.0
            }
            TickAnchor::Base => 0.0,
        }
    }

    /// Compute bar and tick geometry
    #[must_use]
    pub fn layout(&self) -> ChartLayout {
        let mut bars = Vec::new();

        for (series_idx, series) in self.series.iter().enumerate() {
            let offset = series_idx as f64 * self.bar_width;

            for (slot, &value) in series.values.iter().enumerate() {
                if !value.is_finite() {
                    continue;
                }

                bars.push(Bar {
                    series: series_idx,
                    series_label: series.label.clone(),
                    category: self.categories.get(slot).cloned(),
                    center: slot as f64 + offset,
                    width: self.bar_width,
                    value,
                    value_label: self.value_labels.then(|| format_value_label(value)),
                });
            }
        }

        let offset = self.tick_offset();
        let ticks = self
            .categories
            .iter()
            .enumerate()
            .map(|(k, label)| Tick { position: k as f64 + offset, label: label.clone() })
            .collect();

        let legend = self.series.iter().map(|s| s.label.clone()).collect();

        ChartLayout { bars, ticks, legend }
    }
}

/// One drawn bar
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Index of the series in legend order
    pub series: usize,
    pub series_label: String,
    /// Category at this bar's slot, if the axis is long enough
    pub category: Option<String>,
    /// Bar centre on the x axis
    pub center: f64,
    pub width: f64,
    pub value: f64,
    pub value_label: Option<String>,
}

impl Bar {
    #[must_use]
    pub fn left(&self) -> f64 {
        self.center - self.width / 2.0
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.center + self.width / 2.0
    }
}

/// One category tick on the x axis
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Geometry handed to a chart surface
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartLayout {
    pub bars: Vec<Bar>,
    pub ticks: Vec<Tick>,
    pub legend: Vec<String>,
}

impl ChartLayout {
    /// Horizontal extent covering every bar and tick, padded by `pad`
    #[must_use]
    pub fn x_extent(&self, pad: f64) -> (f64, f64) {
        let lefts = self.bars.iter().map(Bar::left).chain(self.ticks.iter().map(|t| t.position));
        let rights = self.bars.iter().map(Bar::right).chain(self.ticks.iter().map(|t| t.position));

        let lo = lefts.fold(f64::INFINITY, f64::min);
        let hi = rights.fold(f64::NEG_INFINITY, f64::max);

        if lo.is_finite() && hi.is_finite() {
            (lo - pad, hi + pad)
        } else {
            (0.0, 1.0)
        }
    }
}

/// Format a bar value with one decimal, rounding halves away from zero
#[must_use]
pub fn format_value_label(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid "-0.0" for small negatives
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.1}")
}

/// A surface that displays or stores charts
pub trait ChartSink {
    /// Present one chart; returns where it was written, if anywhere
    fn present(&mut self, chart: &BarChart) -> Result<Option<PathBuf>>;
}

/// Sink that skips chart output entirely
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardCharts;

impl ChartSink for DiscardCharts {
    fn present(&mut self, chart: &BarChart) -> Result<Option<PathBuf>> {
        tracing::debug!(title = %chart.title, "Chart output disabled, skipping");
        Ok(None)
    }
}

/// Draw a grouped bar chart onto `sink`
pub fn render_grouped_bars<S: ChartSink + ?Sized>(
    sink: &mut S,
    data: CategorySeries,
    x_label: &str,
    y_label: &str,
    title: &str,
) -> Result<Option<PathBuf>> {
    let chart = BarChart::grouped(title, x_label, y_label, data);
    sink.present(&chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::aggregate;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn supplier_chart() -> BarChart {
        let data = aggregate(vec![
            ("01-2024", "Acme", 5.0),
            ("01-2024", "Globex", 3.0),
            ("02-2024", "Acme", 7.0),
        ]);
        BarChart::grouped("Delays", "Month", "Days", data)
    }

    #[test]
    fn test_bar_positions_offset_by_series_index() {
        let layout = supplier_chart().layout();

        let centers: Vec<(String, f64)> =
            layout.bars.iter().map(|b| (b.series_label.clone(), b.center)).collect();
        assert_eq!(centers.len(), 3);
        assert_eq!(centers[0].0, "Acme");
        assert!(approx(centers[0].1, 0.0));
        assert!(approx(centers[1].1, 1.0));
        assert_eq!(centers[2].0, "Globex");
        assert!(approx(centers[2].1, 0.2));
    }

    #[test]
    fn test_ticks_centred_by_series_count() {
        let layout = supplier_chart().layout();
        assert_eq!(layout.ticks.len(), 2);
        assert!(approx(layout.ticks[0].position, 0.2));
        assert!(approx(layout.ticks[1].position, 1.2));
        assert_eq!(layout.ticks[1].label, "02-2024");
    }

    #[test]
    fn test_tick_groups_override_series_count() {
        let data = aggregate(vec![
            ("01-2024", "Bottle Co - Merlot", 6.0),
            ("01-2024", "Bottle Co - Cabernet", 2.0),
            ("01-2024", "Vino Direct - Merlot", 10.0),
            ("01-2024", "Vino Direct - Cabernet", 4.0),
        ]);
        let chart = BarChart::grouped("Sales", "Month", "Sold", data).with_tick_groups(2);
        let layout = chart.layout();

        assert!(approx(layout.ticks[0].position, 0.2));
        let centers: Vec<f64> = layout.bars.iter().map(|b| b.center).collect();
        assert_eq!(centers.len(), 4);
        for (i, center) in centers.iter().enumerate() {
            assert!(approx(*center, i as f64 * 0.2));
        }
    }

    #[test]
    fn test_short_series_not_reindexed() {
        // Globex has no January row, so its only value lands in the first slot
        let data = aggregate(vec![("01-2024", "Acme", 5.0), ("02-2024", "Acme", 7.0), ("02-2024", "Globex", 3.0)]);
        let layout = BarChart::grouped("t", "x", "y", data).layout();

        let globex: Vec<&Bar> = layout.bars.iter().filter(|b| b.series_label == "Globex").collect();
        assert_eq!(globex.len(), 1);
        assert!(approx(globex[0].center, 0.2));
        assert_eq!(globex[0].category.as_deref(), Some("01-2024"));
    }

    #[test]
    fn test_legend_in_insertion_order() {
        let layout = supplier_chart().layout();
        assert_eq!(layout.legend, vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_base_anchor_and_value_labels() {
        let data = aggregate(vec![("Sales", "avg", 41.25), ("Production", "avg", 38.0)]);
        let chart = BarChart::grouped("Avg", "Department", "Hours", data)
            .with_bar_width(0.4)
            .with_tick_anchor(TickAnchor::Base)
            .with_value_labels();
        let layout = chart.layout();

        assert!(approx(layout.ticks[1].position, 1.0));
        assert!(approx(layout.bars[0].left(), -0.2));
        assert!(approx(layout.bars[0].right(), 0.2));
        assert_eq!(layout.bars[0].value_label.as_deref(), Some("41.3"));
        assert_eq!(layout.bars[1].value_label.as_deref(), Some("38.0"));
    }

    #[test]
    fn test_nan_values_keep_slot_without_bar() {
        let data = aggregate(vec![("a", "s", f64::NAN), ("b", "s", 2.0)]);
        let layout = BarChart::grouped("t", "x", "y", data).layout();
        assert_eq!(layout.bars.len(), 1);
        assert!(approx(layout.bars[0].center, 1.0));
    }

    #[test]
    fn test_format_value_label_rounds_half_away_from_zero() {
        assert_eq!(format_value_label(2.25), "2.3");
        assert_eq!(format_value_label(-2.25), "-2.3");
        assert_eq!(format_value_label(37.333), "37.3");
        assert_eq!(format_value_label(40.0), "40.0");
        assert_eq!(format_value_label(-0.01), "0.0");
    }

    #[test]
    fn test_x_extent() {
        let layout = supplier_chart().layout();
        let (lo, hi) = layout.x_extent(0.1);
        assert!(approx(lo, -0.2));
        assert!(approx(hi, 1.3));
        assert_eq!(ChartLayout::default().x_extent(0.5), (0.0, 1.0));
    }

    #[test]
    fn test_render_grouped_bars_presents_to_sink() {
        struct Collect(Vec<BarChart>);
        impl ChartSink for Collect {
            fn present(&mut self, chart: &BarChart) -> Result<Option<PathBuf>> {
                self.0.push(chart.clone());
                Ok(None)
            }
        }

        let mut sink = Collect(Vec::new());
        let data = aggregate(vec![("01-2024", "Acme", 5.0)]);
        render_grouped_bars(&mut sink, data, "Month", "Total Delay Days", "Delays").unwrap();
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].y_label, "Total Delay Days");
        assert_eq!(sink.0[0].tick_anchor, TickAnchor::ClusterOffset);
    }
}
