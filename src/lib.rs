//! Vintage - Console reports and charts over a winery MySQL database
//!
//! Vintage runs a fixed set of aggregate queries against a winery database
//! (inventory, suppliers, sales, staff hours) and presents each result as an
//! aligned text table, optionally followed by a clustered bar chart. A second
//! command lists the contents of a small film/studio database.
//!
//! # Core Principles
//! - Read-only: every query passes a guard that rejects anything but reads
//! - One connection per session, passed explicitly and always closed
//! - Results are materialised once, then rendered
//! - First-seen ordering: nothing is re-sorted after the query
//!
//! # Module Organization
//! - [`error`] - Error types and MySQL code classification
//! - [`engine`] - Query executor trait, cell values, MySQL implementation
//! - [`capability`] - Read-only query guard
//! - [`output`] - Aligned text tables
//! - [`series`] - Category/group aggregation for charts
//! - [`chart`] - Bar chart layout and the Vega-Lite HTML surface
//! - [`report`] - Menu, winery reports, film listings
//! - [`session`] - Connection lifecycle and failure reporting
//! - [`config`] - Profiles, environment and credential resolution
//! - [`logging`] - tracing-subscriber setup

pub mod capability;
pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod report;
pub mod series;
pub mod session;

pub use capability::{validate_query, QueryCategory};
pub use chart::{render_grouped_bars, BarChart, ChartSink, HtmlChartWriter, TickAnchor};
pub use config::{resolve_connection, ConfigFile, ConnectionOverrides, Profile};
pub use engine::{CellValue, ConnectionConfig, QueryExecutor, ResultRow, ResultSet};
pub use error::{Result, VintageError};
pub use output::{column_widths, render_table, write_table};
pub use report::ReportKind;
pub use series::{aggregate, aggregate_nested, CategorySeries, NestedSeries, Series};
pub use session::{run_session, SessionOutcome, SessionTask};

#[cfg(feature = "mysql")]
pub use engine::mysql::MySqlExecutor;
