use clap::{Parser, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabload::{
    PathArgs, RunSummary, Settings,
    etl::CancelFlag,
    storage::InputFormat,
};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Exit code for runs aborted before any file was loaded
const EXIT_ABORTED: u8 = 2;

/// Tabload: move CSV and Parquet files from source folders into a DuckDB warehouse
#[derive(Parser)]
#[command(name = "tabload", version, styles = STYLES)]
struct Cli {
    /// Source directory containing CSV or Parquet files (repeatable). Relative
    /// paths are resolved against the project path.
    #[arg(long = "source-path", value_name = "DIR")]
    source_paths: Vec<PathBuf>,

    /// Prefix prepended to every table name
    #[arg(long, value_name = "PREFIX")]
    table_prefix: Option<String>,

    /// Path to the DuckDB database file. Falls back to DATABASE_PATH.
    #[arg(long, value_name = "FILE")]
    database_path: Option<PathBuf>,

    /// Path to the project directory. Falls back to PROJECT_PATH.
    #[arg(long, value_name = "DIR")]
    project_path: Option<PathBuf>,

    /// Which file formats to load
    #[arg(long, value_enum, default_value_t = InputFormat::All)]
    input_format: InputFormat,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// The dotenv file to source DATABASE_PATH and PROJECT_PATH from
    #[arg(short, long, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = load_env_file(&cli.env) {
        eprintln!("{} {:#}", "error:".red(), e);
        return ExitCode::from(EXIT_ABORTED);
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let settings = Settings::from_env();
    let args = PathArgs {
        source_paths: cli.source_paths,
        table_prefix: cli.table_prefix,
        database_path: cli.database_path,
        project_path: cli.project_path,
    };
    let input_format = cli.input_format;

    let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
    tokio::spawn(listen_for_interrupt(cancel.clone()));

    let outcome = tokio::task::spawn_blocking(move || {
        tabload::cli::ingest(args, settings, input_format, Some(cancel))
    })
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            log::error!("Ingest task failed: {}", e);
            return ExitCode::from(EXIT_ABORTED);
        }
    };

    match &result {
        Ok(summary) if cli.json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize summary: {}", e),
        },
        Ok(summary) => print_summary(summary),
        Err(e) => log::error!("Aborted: {:#}", e),
    }
    ExitCode::from(exit_code(&result))
}

/// Map a finished run to the process exit code
fn exit_code(result: &Result<RunSummary>) -> u8 {
    match result {
        Ok(summary) => summary.exit_code(),
        Err(_) => EXIT_ABORTED,
    }
}

/// Source the dotenv file; only the default `.env` may be absent
fn load_env_file(path: &str) -> Result<()> {
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() && path == ".env" => Ok(()),
        Err(e) => Err(eyre::eyre!("Failed to load env file {}: {}", path, e)),
    }
}

/// Flip `cancel` on Ctrl-C so the run stops after the file in progress
async fn listen_for_interrupt(cancel: CancelFlag) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            log::warn!("Cannot listen for interrupts");
            return;
        }
        if cancel.swap(true, Ordering::SeqCst) {
            log::warn!("Already stopping, waiting for the current file to finish");
        } else {
            log::warn!("Interrupt received, stopping after the current file");
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} succeeded, {} skipped, {} failed{}",
        summary.succeeded.green(),
        summary.skipped.yellow(),
        summary.failed.red(),
        if summary.interrupted {
            " (interrupted)"
        } else {
            ""
        }
    );
    for failure in summary.failures() {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.target.source_file.absolute_path.display().bright_black(),
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
}
