//! Vega-Lite chart surface
//!
//! Converts a `BarChart` layout into a Vega-Lite v5 specification and writes
//! it as a standalone HTML page that loads vega-embed from a CDN.
//!
//! # Mapping Strategy
//!
//! - Each bar -> one inline data row with explicit `x`/`x2` edges
//! - Category ticks -> quantitative axis `values` plus a `labelExpr` lookup
//! - Series -> nominal `color` channel, sorted in legend order
//! - Value labels -> a second `text` layer anchored at the bar centre

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::{BarChart, ChartLayout, ChartSink};
use crate::error::{Result, VintageError};

const SCHEMA_URL: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Builds Vega-Lite JSON for bar charts
#[derive(Debug, Clone)]
pub struct VegaLiteWriter {
    width: u32,
    height: u32,
}

impl Default for VegaLiteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VegaLiteWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self { width: 900, height: 450 }
    }

    /// Vega-Lite specification for `chart`
    #[must_use]
    pub fn spec(&self, chart: &BarChart) -> Value {
        let layout = chart.layout();
        let (lo, hi) = layout.x_extent(chart.bar_width);

        let mut layers = vec![bar_layer(chart, &layout, lo, hi)];
        if chart.value_labels {
            layers.push(text_layer());
        }

        json!({
            "$schema": SCHEMA_URL,
            "title": chart.title,
            "width": self.width,
            "height": self.height,
            "data": { "values": data_values(&layout) },
            "layer": layers,
        })
    }

    /// Standalone HTML page rendering `chart`
    #[must_use]
    pub fn html(&self, chart: &BarChart) -> String {
        // Labels come from the database; keep them from closing the script element
        let spec = self.spec(chart).to_string().replace("</", "<\\/");
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script type="text/javascript">
    vegaEmbed('#vis', {spec}, {{"actions": true}}).catch(console.error);
  </script>
</body>
</html>
"#,
            title = escape_html(&chart.title),
            spec = spec,
        )
    }
}

fn data_values(layout: &ChartLayout) -> Vec<Value> {
    layout
        .bars
        .iter()
        .map(|bar| {
            json!({
                "series": bar.series_label,
                "category": bar.category,
                "x": bar.left(),
                "x2": bar.right(),
                "center": bar.center,
                "value": bar.value,
                "value_label": bar.value_label,
            })
        })
        .collect()
}

fn bar_layer(chart: &BarChart, layout: &ChartLayout, lo: f64, hi: f64) -> Value {
    let positions: Vec<f64> = layout.ticks.iter().map(|t| t.position).collect();
    let labels: Vec<&str> = layout.ticks.iter().map(|t| t.label.as_str()).collect();

    let label_expr = format!(
        "{}[indexof({}, datum.value)]",
        Value::from(labels.clone()),
        Value::from(positions.clone())
    );

    let mut legend = json!({});
    if let Some(title) = &chart.legend_title {
        legend["title"] = json!(title);
    }

    json!({
        "mark": { "type": "bar" },
        "encoding": {
            "x": {
                "field": "x",
                "type": "quantitative",
                "title": chart.x_label,
                "scale": { "domain": [lo, hi], "nice": false, "zero": false },
                "axis": {
                    "values": positions,
                    "labelExpr": label_expr,
                    "labelAngle": -45,
                    "grid": false,
                },
            },
            "x2": { "field": "x2" },
            "y": {
                "field": "value",
                "type": "quantitative",
                "title": chart.y_label,
                "axis": { "grid": true, "gridDash": [4, 4], "gridOpacity": 0.7 },
            },
            "color": {
                "field": "series",
                "type": "nominal",
                "sort": layout.legend,
                "legend": legend,
            },
            "tooltip": [
                { "field": "series", "type": "nominal" },
                { "field": "category", "type": "nominal" },
                { "field": "value", "type": "quantitative" },
            ],
        },
    })
}

fn text_layer() -> Value {
    json!({
        "mark": {
            "type": "text",
            "align": "center",
            "baseline": "bottom",
            "dy": -2,
            "fontSize": 10,
            "fontWeight": "bold",
        },
        "encoding": {
            "x": { "field": "center", "type": "quantitative" },
            "y": { "field": "value", "type": "quantitative" },
            "text": { "field": "value_label" },
        },
    })
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// File stem for a chart title: lowercase alphanumerics joined by `-`
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "chart".to_string()
    } else {
        slug.to_string()
    }
}

/// Chart sink writing one HTML page per chart into a directory
#[derive(Debug, Clone)]
pub struct HtmlChartWriter {
    dir: PathBuf,
    writer: VegaLiteWriter,
}

impl HtmlChartWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), writer: VegaLiteWriter::new() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChartSink for HtmlChartWriter {
    fn present(&mut self, chart: &BarChart) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            VintageError::chart_failed(format!(
                "Could not create chart directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.dir.join(format!("{}.html", slugify(&chart.title)));
        fs::write(&path, self.writer.html(chart)).map_err(|e| {
            VintageError::chart_failed(format!("Could not write {}: {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), title = %chart.title, "Chart written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::TickAnchor;
    use crate::series::aggregate;

    fn sample_chart() -> BarChart {
        let data = aggregate(vec![
            ("01-2024", "Acme", 5.0),
            ("01-2024", "Globex", 3.0),
            ("02-2024", "Acme", 7.0),
        ]);
        BarChart::grouped("Monthly Supplier Delivery Delays", "Month", "Total Delay Days", data)
            .with_legend_title("Suppliers")
    }

    #[test]
    fn test_spec_structure() {
        let spec = VegaLiteWriter::new().spec(&sample_chart());

        assert_eq!(spec["$schema"], SCHEMA_URL);
        assert_eq!(spec["title"], "Monthly Supplier Delivery Delays");
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);
        assert_eq!(spec["layer"].as_array().unwrap().len(), 1);

        let encoding = &spec["layer"][0]["encoding"];
        assert_eq!(encoding["x"]["title"], "Month");
        assert_eq!(encoding["y"]["title"], "Total Delay Days");
        assert_eq!(encoding["color"]["legend"]["title"], "Suppliers");
        assert_eq!(encoding["color"]["sort"], json!(["Acme", "Globex"]));
        assert_eq!(encoding["x"]["axis"]["labelAngle"], -45);
    }

    #[test]
    fn test_tick_labels_lookup() {
        let spec = VegaLiteWriter::new().spec(&sample_chart());
        let axis = &spec["layer"][0]["encoding"]["x"]["axis"];

        let values = axis["values"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        let expr = axis["labelExpr"].as_str().unwrap();
        assert!(expr.starts_with(r#"["01-2024","02-2024"][indexof(["#));
        assert!(expr.ends_with("datum.value)]"));
    }

    #[test]
    fn test_value_label_layer() {
        let data = aggregate(vec![("Sales", "Avg Hours per Dept", 41.25)]);
        let chart = BarChart::grouped("Average Hours", "Department", "Hours", data)
            .with_bar_width(0.4)
            .with_tick_anchor(TickAnchor::Base)
            .with_value_labels();
        let spec = VegaLiteWriter::new().spec(&chart);

        assert_eq!(spec["layer"].as_array().unwrap().len(), 2);
        assert_eq!(spec["layer"][1]["mark"]["type"], "text");
        assert_eq!(spec["data"]["values"][0]["value_label"], "41.3");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Monthly Supplier Delivery Delays"), "monthly-supplier-delivery-delays");
        assert_eq!(slugify("  Sales: by Distributor & Type!"), "sales-by-distributor-type");
        assert_eq!(slugify("***"), "chart");
    }

    #[test]
    fn test_html_writer_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = HtmlChartWriter::new(dir.path().join("charts"));

        let path = sink.present(&sample_chart()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "monthly-supplier-delivery-delays.html");

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("vegaEmbed('#vis'"));
        assert!(html.contains("<title>Monthly Supplier Delivery Delays</title>"));
        assert!(html.contains(SCHEMA_URL));
    }

    #[test]
    fn test_html_escapes_closing_tags_in_labels() {
        let data = aggregate(vec![("01-2024", "Evil</script><b>x", 1.0)]);
        let chart = BarChart::grouped("Delays", "Month", "Days", data);
        let html = VegaLiteWriter::new().html(&chart);

        // Only the page's own script elements close
        assert_eq!(html.matches("</script>").count(), 4);
        assert!(html.contains(r"Evil<\/script><b>x"));
    }
}
