//! Vintage CLI Entry Point
//!
//! Subcommands:
//! - `winery` - interactive report menu (the default)
//! - `report <name>` - run one winery report and exit
//! - `movies` - print the film database listings
//!
//! Tables and status messages go to stdout; logs go to the log file, and to
//! stderr as well with `--verbose`.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use vintage::chart::{ChartSink, DiscardCharts, HtmlChartWriter};
use vintage::config::{self, ConnectionOverrides};
use vintage::logging::{init_logging, LogOptions, DEFAULT_LOG_FILE};
use vintage::report::movies::MOVIES_DATABASE;
use vintage::session::{report_failure, run_session, SessionOutcome, SessionTask};
use vintage::{MySqlExecutor, ReportKind, VintageError};

/// Default database for the winery reports
const WINERY_DATABASE: &str = "winery";

/// Console reports and charts over a winery MySQL database
#[derive(Parser)]
#[command(name = "vintage")]
#[command(about = "Console reports and charts over a winery MySQL database")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Directory for chart HTML files [default: charts]
    #[arg(long, global = true)]
    chart_dir: Option<PathBuf>,

    /// Skip chart output
    #[arg(long, global = true)]
    no_charts: bool,

    /// Log file (appended)
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Log level or filter directive (falls back to RUST_LOG, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Named profile from .vintage/config.json or the global config
    #[arg(long, global = true)]
    profile: Option<String>,

    #[arg(long, global = true, env = "VINTAGE_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "VINTAGE_PORT")]
    port: Option<u16>,

    #[arg(long, global = true, env = "VINTAGE_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "VINTAGE_DATABASE")]
    database: Option<String>,

    /// Do not treat server warnings as errors
    #[arg(long, global = true)]
    no_strict_warnings: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive winery report menu
    Winery,

    /// Run a single winery report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
    },

    /// List the film database contents
    Movies,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_options = LogOptions {
        file: cli.log_file.clone(),
        level: cli.log_level.clone(),
        console: cli.verbose,
    };
    if let Err(err) = init_logging(&log_options) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(outcome) => ExitCode::from(outcome.exit_status()),
        Err(err) => {
            println!("Error: {err:#}");
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<SessionOutcome> {
    let task = match cli.command {
        None | Some(Commands::Winery) => SessionTask::Menu,
        Some(Commands::Report { kind }) => SessionTask::Report(kind),
        Some(Commands::Movies) => SessionTask::Movies,
    };
    let fallback_database = match task {
        SessionTask::Movies => MOVIES_DATABASE,
        SessionTask::Menu | SessionTask::Report(_) => WINERY_DATABASE,
    };

    let file = config::load_with_precedence().context("loading configuration")?;

    let overrides = ConnectionOverrides {
        profile: cli.connection.profile,
        host: cli.connection.host,
        port: cli.connection.port,
        user: cli.connection.user,
        password: std::env::var("VINTAGE_PASSWORD").ok(),
        database: cli.connection.database,
        strict_warnings: cli.connection.no_strict_warnings.then_some(false),
    };

    let interactive = std::io::stdin().is_terminal();
    let prompt = interactive.then_some(&prompt_password as &dyn Fn(&str) -> vintage::Result<String>);

    let connection = config::resolve_connection(&file, &overrides, fallback_database, prompt)
        .context("resolving connection settings")?;

    let mut stdout = std::io::stdout().lock();

    let executor = match MySqlExecutor::connect(&connection).await {
        Ok(executor) => executor,
        Err(err) => {
            report_failure(&mut stdout, &err);
            return Ok(SessionOutcome::Failed(err));
        }
    };

    match task {
        SessionTask::Movies => println!("Connected to MySQL database: {}", connection.database),
        SessionTask::Menu | SessionTask::Report(_) => {
            println!("\n You are connected to the Winery MySQL Database!\n");
        }
    }

    let mut charts: Box<dyn ChartSink> = if cli.no_charts {
        Box::new(DiscardCharts)
    } else {
        Box::new(HtmlChartWriter::new(config::resolve_chart_dir(&file, cli.chart_dir.as_deref())))
    };
    let mut stdin = std::io::stdin().lock();

    Ok(run_session(executor, task, &mut stdin, &mut stdout, &mut *charts).await)
}

fn prompt_password(label: &str) -> vintage::Result<String> {
    dialoguer::Password::new()
        .with_prompt(label)
        .interact()
        .map_err(|e| VintageError::config_error(format!("Could not read password: {e}")))
}
