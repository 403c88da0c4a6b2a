//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vintage::chart::{BarChart, ChartSink};
use vintage::engine::{QueryExecutor, ResultRow, ResultSet};
use vintage::error::{Result, VintageError};

/// Executor that answers queries from a script, in order
pub struct ScriptedExecutor {
    responses: VecDeque<Result<ResultSet>>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<ResultSet>>) -> Self {
        Self {
            responses: responses.into(),
            queries: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    pub fn query_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queries)
    }
}

impl QueryExecutor for ScriptedExecutor {
    async fn fetch_all(&mut self, sql: &str) -> Result<ResultSet> {
        vintage::validate_query(sql)?;
        self.queries.lock().unwrap().push(sql.to_string());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(VintageError::database("script exhausted")))
    }

    async fn close(self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Result set with placeholder column names
pub fn result(rows: Vec<ResultRow>) -> Result<ResultSet> {
    let columns = rows
        .first()
        .map(|r| (0..r.len()).map(|i| format!("c{i}")).collect())
        .unwrap_or_default();
    Ok(ResultSet::new(columns, rows))
}

/// Chart sink that keeps every chart it is given
#[derive(Default)]
pub struct CollectCharts(pub Vec<BarChart>);

impl ChartSink for CollectCharts {
    fn present(&mut self, chart: &BarChart) -> Result<Option<PathBuf>> {
        self.0.push(chart.clone());
        Ok(None)
    }
}

/// Shared in-memory buffer usable as a tracing writer
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install a thread-local subscriber writing plain text into the returned buffer
pub fn capture_logs() -> (SharedBuf, tracing::subscriber::DefaultGuard) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}

/// Mark line ends so trailing padding survives snapshot comparison
pub fn visible(text: &str) -> String {
    text.lines().map(|l| format!("{l}$")).collect::<Vec<_>>().join("\n")
}
