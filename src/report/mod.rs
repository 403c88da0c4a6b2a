//! Report Menu
//!
//! The interactive loop maps numbered choices onto `ReportKind` and runs the
//! matching winery report. Every report receives the data-access handle, the
//! output writer and the chart sink explicitly.

use std::io::{BufRead, Write};

use crate::chart::ChartSink;
use crate::engine::QueryExecutor;
use crate::error::Result;
use crate::output::write_table;

pub mod movies;
pub mod winery;

/// Prompt shown after the menu
pub const PROMPT: &str = "Please make a selection 1-5: ";

/// One menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportKind {
    Inventory,
    Supplier,
    Wine,
    Employee,
    #[value(skip)]
    Exit,
}

impl ReportKind {
    /// All entries in menu order
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Inventory,
        ReportKind::Supplier,
        ReportKind::Wine,
        ReportKind::Employee,
        ReportKind::Exit,
    ];

    /// Parse one line of menu input; surrounding whitespace is ignored
    #[must_use]
    pub fn from_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(ReportKind::Inventory),
            "2" => Some(ReportKind::Supplier),
            "3" => Some(ReportKind::Wine),
            "4" => Some(ReportKind::Employee),
            "5" => Some(ReportKind::Exit),
            _ => None,
        }
    }

    /// Menu number for this entry
    #[must_use]
    pub const fn choice(self) -> u8 {
        match self {
            ReportKind::Inventory => 1,
            ReportKind::Supplier => 2,
            ReportKind::Wine => 3,
            ReportKind::Employee => 4,
            ReportKind::Exit => 5,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            ReportKind::Inventory => "Inventory Report",
            ReportKind::Supplier => "Supplier Report",
            ReportKind::Wine => "Wine Report",
            ReportKind::Employee => "Employee Report",
            ReportKind::Exit => "Exit",
        }
    }
}

/// Print the numbered menu
pub fn write_menu<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "\n Report Menu:")?;
    for kind in ReportKind::ALL {
        writeln!(out, "\n {}. {}", kind.choice(), kind.title())?;
    }
    writeln!(out)?;
    Ok(())
}

/// Run one report
pub async fn run_report<E, W, S>(
    kind: ReportKind,
    executor: &mut E,
    out: &mut W,
    charts: &mut S,
) -> Result<()>
where
    E: QueryExecutor,
    W: Write,
    S: ChartSink + ?Sized,
{
    tracing::info!(report = kind.title(), "Generating report");

    match kind {
        ReportKind::Inventory => winery::inventory_report(executor, out).await,
        ReportKind::Supplier => winery::supplier_report(executor, out, charts).await,
        ReportKind::Wine => winery::wine_report(executor, out, charts).await,
        ReportKind::Employee => winery::employee_report(executor, out, charts).await,
        ReportKind::Exit => Ok(()),
    }
}

/// Interactive loop: prompt, read a line, dispatch, repeat until `Exit` or
/// end of input. Database errors end the loop and are returned.
pub async fn run_menu<E, R, W, S>(
    executor: &mut E,
    input: &mut R,
    out: &mut W,
    charts: &mut S,
) -> Result<()>
where
    E: QueryExecutor,
    R: BufRead,
    W: Write,
    S: ChartSink + ?Sized,
{
    let mut line = String::new();

    loop {
        write_menu(out)?;
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            tracing::info!("Input closed, leaving menu");
            writeln!(out, "\n\nExiting... \n")?;
            return Ok(());
        }

        match ReportKind::from_choice(&line) {
            Some(ReportKind::Exit) => {
                tracing::info!("Menu exit selected");
                writeln!(out, "\nExiting... \n")?;
                return Ok(());
            }
            Some(kind) => {
                writeln!(out, "\nGenerating {}... \n", kind.title())?;
                run_report(kind, executor, out, charts).await?;
            }
            None => {
                tracing::warn!(input = line.trim(), "Invalid menu choice");
                writeln!(out, "\nInvalid choice! Please select a valid option... \n")?;
            }
        }
    }
}

/// Run `sql` and print the rows under `headers`
pub async fn print_query_table<E, W>(
    executor: &mut E,
    out: &mut W,
    headers: &[&str],
    sql: &str,
) -> Result<()>
where
    E: QueryExecutor,
    W: Write,
{
    let result = executor.fetch_all(sql).await?;
    tracing::debug!(rows = result.rows.len(), columns = headers.len(), "Rendering table");
    write_table(out, headers, &result.rows)
}

/// Print a chart's location, if the sink wrote one
pub(crate) fn announce_chart<W: Write>(
    out: &mut W,
    written: Option<std::path::PathBuf>,
) -> Result<()> {
    if let Some(path) = written {
        writeln!(out, "\nChart saved to {}", path.display())?;
    }
    Ok(())
}
