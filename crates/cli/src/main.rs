// carfeed - aggregate vehicle listing feeds into one normalized JSON document

mod exit_codes;
mod fetch;
mod persist;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use carfeed_config::{env_vars, load_dotenv, FeedSettings, Overrides, RunConfig};
use carfeed_core::{RunReport, SourceOutcome};
use chrono::Utc;
use clap::Parser;

use exit_codes::{EXIT_ERROR, EXIT_NO_SOURCES, EXIT_SETTINGS, EXIT_SUCCESS, EXIT_USAGE};
use fetch::HttpFetcher;
use persist::JsonFilePersist;

#[derive(Parser)]
#[command(name = "carfeed")]
#[command(about = "Fetch dealer vehicle feeds (JSON or XML) and write one normalized JSON document")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Sources are taken from --url, then `sources` in the settings file, then
environment variables JSON_URL, JSON_URL_2, ..., XML_URL (a .env file in
the working directory is read first).

Examples:
  carfeed --url https://dealer.example/estoque.json
  JSON_URL=https://a.example/feed XML_URL=https://b.example/feed.xml carfeed -o stock.json
  carfeed --config carfeed.toml --print --quiet")]
struct Cli {
    /// Feed URL (repeatable). Replaces configured sources.
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH", env = "CARFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Output file [default: $JSON_FILE or vehicles.json]
    #[arg(long, short = 'o', value_name = "PATH", env = "CARFEED_OUT")]
    out: Option<PathBuf>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Also write the document to stdout
    #[arg(long)]
    print: bool,

    /// Suppress progress lines on stderr
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  carfeed-core ", env!("CARGO_PKG_VERSION"),
    )
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn no_sources(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_NO_SOURCES,
            message: message.into(),
            hint: Some("pass --url, set `sources` in the settings file, or export JSON_URL / XML_URL".into()),
        }
    }

    fn settings(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_SETTINGS,
            message: message.into(),
            hint: Some("allowed keys: sources, output, timeout_secs, env_prefixes".into()),
        }
    }

    fn io(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_ERROR,
            message: message.into(),
            hint: None,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };

    init_logging(&cli.log_level);

    match cmd_run(&cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(cli: &Cli) -> Result<(), CliError> {
    load_dotenv();

    let settings = FeedSettings::load_or_default(cli.config.as_deref())
        .map_err(|e| CliError::settings(e.to_string()))?;
    let overrides = Overrides {
        urls: cli.urls.clone(),
        output: cli.out.clone(),
        timeout_secs: cli.timeout,
    };
    let config = RunConfig::resolve(&overrides, &settings, &env_vars());
    log::debug!("resolved run config: {config:?}");

    let fetcher = HttpFetcher::new(config.timeout, cli.quiet)?;
    let persist = JsonFilePersist::new(&config.output);
    let report = carfeed_core::run(&fetcher, &persist, &config.sources, Utc::now());

    if !cli.quiet {
        print_summary(&report, &persist);
    }

    if cli.print {
        let json = report
            .document
            .to_json_pretty()
            .map_err(|e| CliError::io(format!("cannot render document: {e}")))?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", json).map_err(|e| CliError::io(e.to_string()))?;
    }

    match &report.document.error {
        Some(error) => Err(CliError::no_sources(error.clone())),
        None => Ok(()),
    }
}

fn print_summary(report: &RunReport, persist: &JsonFilePersist) {
    for outcome in &report.sources {
        match outcome {
            SourceOutcome::Collected { url, records, dropped: 0 } => {
                eprintln!("  {url}: {records} vehicles");
            }
            SourceOutcome::Collected { url, records, dropped } => {
                eprintln!("  {url}: {records} vehicles ({dropped} dropped)");
            }
            SourceOutcome::Failed { error, .. } => eprintln!("  failed: {error}"),
        }
    }

    if report.document.error.is_some() {
        return;
    }

    let total = report.document.total_count;
    match &report.persist_error {
        Some(e) => eprintln!("Done: {total} vehicles collected, but {e}"),
        None => eprintln!(
            "Done: {total} vehicles from {}/{} sources written to {}",
            report.sources.len() - report.failed_sources(),
            report.sources.len(),
            persist.path().display()
        ),
    }
}
