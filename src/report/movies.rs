//! Film database report
//!
//! Four fixed listings over the studio/genre/film schema. Headers are the
//! column names the server reports.

use std::io::Write;

use crate::engine::QueryExecutor;
use crate::error::Result;
use crate::output::write_table;

/// Default database for the film report
pub const MOVIES_DATABASE: &str = "movies";

/// One titled listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub sql: &'static str,
}

pub const SECTIONS: [Section; 4] = [
    Section { title: "All fields from the studio table", sql: "SELECT * FROM studio" },
    Section { title: "All fields from the genre table", sql: "SELECT * FROM genre" },
    Section {
        title: "Movie names with runtime less than 120 minutes",
        sql: "SELECT film_name FROM film WHERE film_runtime < 120",
    },
    Section {
        title: "Film names and directors grouped by director",
        sql: "SELECT director AS Director, MIN(film_name) AS Film \
              FROM film GROUP BY director ORDER BY director",
    },
];

/// Print every section in order
pub async fn movies_report<E: QueryExecutor, W: Write>(executor: &mut E, out: &mut W) -> Result<()> {
    for (idx, section) in SECTIONS.iter().enumerate() {
        let result = executor.fetch_all(section.sql).await?;
        tracing::debug!(section = section.title, rows = result.rows.len(), "Film listing fetched");

        writeln!(out, "\nOutput of Query {}: {}\n", idx + 1, section.title)?;
        write_table(out, result.columns.as_slice(), &result.rows)?;
    }
    Ok(())
}
