//! Session orchestration
//!
//! Owns the data-access handle for one run: executes the requested task,
//! reports a failure on the console and in the log, and closes the
//! connection on every path.

use std::io::{BufRead, Write};

use crate::chart::ChartSink;
use crate::engine::QueryExecutor;
use crate::error::VintageError;
use crate::report::movies::movies_report;
use crate::report::{run_menu, run_report, ReportKind};

/// What a session runs once connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTask {
    /// Interactive winery menu
    Menu,
    /// One winery report, no menu
    Report(ReportKind),
    /// The film database listings
    Movies,
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    Completed,
    Failed(VintageError),
}

impl SessionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Process exit status: 0 after a normal session, 1 after a failed one
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Failed(_) => 1,
        }
    }
}

/// Run `task` against `executor`, then close it
///
/// The executor is closed exactly once whether the task succeeds or fails.
pub async fn run_session<E, R, W, S>(
    mut executor: E,
    task: SessionTask,
    input: &mut R,
    out: &mut W,
    charts: &mut S,
) -> SessionOutcome
where
    E: QueryExecutor,
    R: BufRead,
    W: Write,
    S: ChartSink + ?Sized,
{
    tracing::info!(?task, "Session started");

    let result = match task {
        SessionTask::Menu => run_menu(&mut executor, input, out, charts).await,
        SessionTask::Report(kind) => run_report(kind, &mut executor, out, charts).await,
        SessionTask::Movies => movies_report(&mut executor, out).await,
    };

    let outcome = match result {
        Ok(()) => SessionOutcome::Completed,
        Err(err) => {
            report_failure(out, &err);
            SessionOutcome::Failed(err)
        }
    };

    match executor.close().await {
        Ok(()) => {
            tracing::info!("Connection closed");
            // Console may already be gone; the log line above is enough
            let _ = writeln!(out, "\n  Connection closed safely.");
        }
        Err(err) => tracing::warn!(error = %err, "Closing the connection failed"),
    }

    outcome
}

/// Print the error for the user and log it with its diagnostics
pub fn report_failure<W: Write>(out: &mut W, err: &VintageError) {
    let _ = writeln!(out, "Error: {}", err.message());
    let _ = out.flush();

    let origin = if err.is_database() { "database" } else { "local" };
    tracing::error!(
        error_code = err.error_code(),
        server_code = ?err.server_code(),
        origin,
        "{}",
        err.message()
    );
    tracing::error!(diagnostic = ?err, "Session aborted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ER_BAD_DB_ERROR;

    #[test]
    fn test_outcome_exit_status() {
        assert_eq!(SessionOutcome::Completed.exit_status(), 0);
        assert!(SessionOutcome::Completed.is_success());

        let failed = SessionOutcome::Failed(VintageError::from_server_code(ER_BAD_DB_ERROR, "x"));
        assert_eq!(failed.exit_status(), 1);
        assert!(!failed.is_success());
    }

    #[test]
    fn test_report_failure_prints_code() {
        let mut buf = Vec::new();
        report_failure(&mut buf, &VintageError::from_server_code(ER_BAD_DB_ERROR, "Unknown database"));
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Error: The specified database or table does not exist. MySQL error code: 1049\n"
        );
    }
}
