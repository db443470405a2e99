//! tradecall CLI: parse, replay, resolve and catalog commands.
//!
//! Commands:
//! - `parse`: handle one message and print the outcome as JSON
//! - `replay`: handle every message of a JSONL capture and print a summary
//! - `resolve`: show which catalog underlying a token resolves to
//! - `catalog status` / `catalog lookup`: inspect the loaded contract masters
//! - `config init`: print the default TOML configuration

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, FixedOffset, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use tradecall_core::{InstrumentCatalog, InstrumentFilter, MatchKind, OptionType, Timestamp};
use tradecall_runner::{
    read_messages, replay, AppConfig, CsvRecorder, Dispatcher, MemoryRecorder, OutcomeSink,
};

const DEFAULT_CONFIG_FILE: &str = "tradecall.toml";

#[derive(Parser)]
#[command(
    name = "tradecall",
    about = "tradecall CLI: turn channel trade alerts into structured signals"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./tradecall.toml, else the built-in config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one message and print the outcome as JSON.
    Parse {
        /// Registered channel name (e.g. "Premium jackpot").
        #[arg(long)]
        channel: String,

        /// Raw message text.
        #[arg(long)]
        text: String,

        /// Receipt time (RFC 3339). Defaults to now.
        #[arg(long)]
        timestamp: Option<String>,

        /// Keep outcomes in memory instead of appending to the logs.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Handle every message of a JSONL capture.
    Replay {
        /// JSONL file with {"channel", "timestamp", "text"} per line.
        #[arg(long)]
        input: PathBuf,

        /// Process distinct channels in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Keep outcomes in memory instead of appending to the logs.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Show which catalog underlying a token resolves to.
    Resolve {
        token: String,
    },
    /// Catalog inspection commands.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Report sources, instrument count, underlyings and fingerprint.
    Status,
    /// List contracts for an underlying.
    Lookup {
        /// Underlying symbol (e.g. NIFTY).
        #[arg(long)]
        symbol: String,

        #[arg(long)]
        strike: Option<f64>,

        /// CE or PE.
        #[arg(long)]
        option: Option<String>,

        /// Exchange code (e.g. NFO).
        #[arg(long)]
        exchange: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in configuration as TOML.
    Init {
        /// Year used for Paid-Call expiry dates. Defaults to the current year.
        #[arg(long)]
        expiry_year: Option<i32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Parse {
            channel,
            text,
            timestamp,
            dry_run,
        } => run_parse(cli.config.as_deref(), &channel, &text, timestamp.as_deref(), dry_run),
        Commands::Replay {
            input,
            parallel,
            dry_run,
        } => run_replay(cli.config.as_deref(), &input, parallel, dry_run),
        Commands::Resolve { token } => run_resolve(cli.config.as_deref(), &token),
        Commands::Catalog { action } => match action {
            CatalogAction::Status => run_catalog_status(cli.config.as_deref()),
            CatalogAction::Lookup {
                symbol,
                strike,
                option,
                exchange,
            } => run_catalog_lookup(
                cli.config.as_deref(),
                &symbol,
                strike,
                option.as_deref(),
                exchange.as_deref(),
            ),
        },
        Commands::Config { action } => match action {
            ConfigAction::Init { expiry_year } => {
                let year = expiry_year.unwrap_or_else(|| Local::now().year());
                print!("{}", AppConfig::default_channels(year).to_toml()?);
                Ok(())
            }
        },
    }
}

// Logs go to stderr so stdout stays machine-readable.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("load config {DEFAULT_CONFIG_FILE}"))
        }
        None => {
            info!("no config file; using built-in channel registrations");
            Ok(AppConfig::default_channels(Local::now().year()))
        }
    }
}

fn load_catalog(config: &AppConfig) -> Result<InstrumentCatalog> {
    InstrumentCatalog::load_dir(&config.catalog.dir, &config.catalog.exchanges)
        .with_context(|| format!("load instrument catalog from {}", config.catalog.dir.display()))
}

fn build_dispatcher(config: &AppConfig, dry_run: bool) -> Result<Dispatcher> {
    let catalog = load_catalog(config)?;
    let recorder: Box<dyn OutcomeSink> = if dry_run {
        Box::new(MemoryRecorder::new())
    } else {
        Box::new(CsvRecorder::new(&config.logs.signals, &config.logs.failures))
    };
    Ok(Dispatcher::from_config(config, catalog, recorder))
}

fn parse_timestamp(value: Option<&str>) -> Result<Timestamp> {
    match value {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("'{s}' is not an RFC 3339 timestamp")),
        None => Ok(DateTime::<FixedOffset>::from(Local::now())),
    }
}

fn run_parse(
    config_path: Option<&Path>,
    channel: &str,
    text: &str,
    timestamp: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let timestamp = parse_timestamp(timestamp)?;
    let dispatcher = build_dispatcher(&config, dry_run)?;

    let outcome = dispatcher.handle(channel, timestamp, text);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn run_replay(config_path: Option<&Path>, input: &Path, parallel: bool, dry_run: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let dispatcher = build_dispatcher(&config, dry_run)?;
    let captured = read_messages(input)?;

    let (_, summary) = replay(&dispatcher, &captured.messages, parallel);

    println!("Messages:  {}", summary.messages);
    println!("Signals:   {}", summary.signals);
    println!("Failures:  {}", summary.failures);
    if !captured.malformed_lines.is_empty() {
        println!("Malformed: {} line(s) skipped", captured.malformed_lines.len());
    }
    println!();
    println!("{:<24} {:>8} {:>8}", "Channel", "Signals", "Failures");
    println!("{}", "-".repeat(42));
    for (channel, tally) in &summary.per_channel {
        println!("{channel:<24} {:>8} {:>8}", tally.signals, tally.failures);
    }
    Ok(())
}

fn run_resolve(config_path: Option<&Path>, token: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(&config)?;
    let resolver = config.resolver.build();

    match resolver.resolve(token, catalog.underlyings()) {
        Some(resolved) => match resolved.kind {
            MatchKind::Exact => println!("{token} → {} (exact)", resolved.symbol),
            MatchKind::Approximate { score } => {
                println!("{token} → {} (similarity {score:.3})", resolved.symbol)
            }
        },
        None => bail!(
            "'{token}' matches no catalog underlying at cutoff {}",
            resolver.cutoff()
        ),
    }
    Ok(())
}

fn run_catalog_status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(&config)?;

    println!("Sources:");
    for source in catalog.sources() {
        println!("  {}", source.display());
    }
    println!("Instruments: {}", catalog.len());
    println!("Underlyings: {}", catalog.underlyings().len());
    println!("Fingerprint: {}", catalog.fingerprint());
    Ok(())
}

fn run_catalog_lookup(
    config_path: Option<&Path>,
    symbol: &str,
    strike: Option<f64>,
    option: Option<&str>,
    exchange: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(&config)?;

    let mut filter = InstrumentFilter::new().underlying(symbol);
    if let Some(strike) = strike {
        filter = filter.strike_price(strike);
    }
    if let Some(code) = option {
        let Some(option_type) = OptionType::from_code(code) else {
            bail!("option type must be CE or PE, got '{code}'");
        };
        filter = filter.option_type(option_type);
    }
    if let Some(exchange) = exchange {
        filter = filter.exchange(exchange);
    }

    let hits = catalog.filter(&filter);
    if hits.is_empty() {
        bail!("no contracts match");
    }
    let nearest = InstrumentCatalog::earliest_expiry(&hits).map(|r| r.trading_symbol());

    println!(
        "{:<28} {:<5} {:>10} {:<3} {:<10}",
        "Trading symbol", "Exch", "Strike", "Opt", "Expiry"
    );
    println!("{}", "-".repeat(60));
    for rec in &hits {
        let strike = rec.strike_price().map(|s| s.to_string()).unwrap_or_default();
        let expiry = rec.expiry_date().map(|d| d.to_string()).unwrap_or_default();
        let marker = if Some(rec.trading_symbol()) == nearest { " *" } else { "" };
        println!(
            "{:<28} {:<5} {:>10} {:<3} {:<10}{marker}",
            rec.trading_symbol(),
            rec.exchange(),
            strike,
            rec.option_type().code(),
            expiry
        );
    }
    println!("\n* nearest expiry");
    Ok(())
}
