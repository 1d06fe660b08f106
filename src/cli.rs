//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_document::{load_document, save_document, to_json};
use crate::adapters::mock_submission_adapter::MockSubmissionAdapter;
use crate::adapters::static_quote_adapter::StaticQuoteAdapter;
use crate::domain::asset::normalize_symbol;
use crate::domain::builder::{Step, StrategyBuilder};
use crate::domain::config_validation::{BuilderSettings, validate_settings};
use crate::domain::document::Document;
use crate::domain::error::BuilderError;
use crate::domain::outcome::SubmissionReceipt;
use crate::domain::symbols::parse_symbols;
use crate::logging::init_logging;
use crate::ports::quote_port::QuotePort;
use crate::quote_feed::{Quote, QuoteFeed};

#[derive(Parser, Debug)]
#[command(name = "stratbuilder", about = "Build, check and submit trading strategy documents")]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a default document for a comma-separated symbol list
    Template {
        #[arg(short, long)]
        symbols: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report every problem in a document
    Validate {
        #[arg(short, long)]
        document: PathBuf,
    },
    /// Walk a document through every step and submit it
    Run {
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the submission receipt as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Poll the configured quote table for one symbol
    Quote {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Price to serve for `symbol`, overriding `[quotes] prices`
        #[arg(long)]
        price: Option<f64>,
        /// Number of polls to print
        #[arg(long, default_value_t = 1)]
        polls: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose, cli.log_json);

    let result = match cli.command {
        Command::Template {
            symbols,
            config,
            output,
        } => run_template(&symbols, config.as_deref(), output.as_deref()),
        Command::Validate { document } => run_validate(&document),
        Command::Run {
            document,
            config,
            output,
        } => run_submit(&document, config.as_deref(), output.as_deref()),
        Command::Quote {
            symbol,
            config,
            price,
            polls,
        } => run_quote(&symbol, config.as_deref(), price, polls),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Settings from `path`, or the built-in defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<BuilderSettings, BuilderError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            validate_settings(&adapter)
        }
        None => Ok(BuilderSettings::default()),
    }
}

fn run_template(
    symbols: &str,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), BuilderError> {
    let settings = load_settings(config_path)?;
    let document = template_document(symbols, &settings)?;

    match output_path {
        Some(path) => {
            save_document(path, &document)?;
            eprintln!("Wrote {} asset(s) to {}", document.len(), path.display());
        }
        None => println!("{}", to_json(&document)?),
    }
    Ok(())
}

fn run_validate(document_path: &Path) -> Result<(), BuilderError> {
    eprintln!("Validating document: {}", document_path.display());
    let document = load_document(document_path)?;

    let problems = document.problems();
    for asset in document.assets() {
        eprintln!("\n{asset}");
        for rule in &asset.entry_rules {
            eprintln!("  entry: {rule}");
        }
        for exit in &asset.exit_conditions {
            eprintln!("  exit:  {exit}");
        }
    }

    if problems.is_empty() {
        eprintln!("\nDocument is valid.");
        return Ok(());
    }
    eprintln!();
    for problem in &problems {
        eprintln!("problem: {problem}");
    }
    match problems.into_iter().next() {
        Some(first) => Err(first.error),
        None => Ok(()),
    }
}

fn run_submit(
    document_path: &Path,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), BuilderError> {
    let settings = load_settings(config_path)?;
    let document = load_document(document_path)?;

    let mut builder = StrategyBuilder::new(settings.defaults);
    builder.import(document)?;
    walk_to_review(&mut builder)?;

    let adapter = MockSubmissionAdapter::from_settings(&settings.submission);
    let runtime = tokio::runtime::Runtime::new()?;
    let receipt = runtime.block_on(builder.submit(&adapter))?;

    print_receipt(&receipt);
    if let Some(path) = output_path {
        std::fs::write(path, serde_json::to_string_pretty(&receipt)?)?;
        eprintln!("Wrote receipt to {}", path.display());
    }
    Ok(())
}

fn run_quote(
    symbol: &str,
    config_path: Option<&Path>,
    price: Option<f64>,
    polls: usize,
) -> Result<(), BuilderError> {
    let settings = load_settings(config_path)?;
    let symbol = normalize_symbol(symbol)?;
    let mut prices = settings.quote_prices.clone();
    if let Some(price) = price {
        prices.push((symbol.clone(), price));
    }
    let port: Arc<dyn QuotePort> = Arc::new(StaticQuoteAdapter::new(prices));

    let runtime = tokio::runtime::Runtime::new()?;
    let quotes = runtime.block_on(poll_quotes(port, &symbol, &settings, polls))?;
    for quote in &quotes {
        println!("{} {:.2}", quote.symbol, quote.price);
    }
    Ok(())
}

/// First `polls` quotes for `symbol` at the configured interval. An
/// unknown symbol fails before polling starts.
pub async fn poll_quotes(
    port: Arc<dyn QuotePort>,
    symbol: &str,
    settings: &BuilderSettings,
    polls: usize,
) -> Result<Vec<Quote>, BuilderError> {
    port.latest_price(symbol).await?;
    let feed = QuoteFeed::spawn(port, symbol, settings.poll_interval);
    Ok(feed.next_quotes(polls).await)
}

/// Advance through every gate, reporting each step as it passes.
pub fn walk_to_review(builder: &mut StrategyBuilder) -> Result<(), BuilderError> {
    while builder.step() != Step::Review {
        let from = builder.step();
        builder.go_next()?;
        eprintln!("[{}/{}] {} ok", from.number(), Step::ALL.len(), from.title());
    }
    Ok(())
}

fn print_receipt(receipt: &SubmissionReceipt) {
    println!("Strategy {}", receipt.strategy_id);
    for result in &receipt.results {
        let s = &result.summary;
        println!(
            "  {:<8} trades {:>3}  win {:>6.2}%  profit {:>10.2}  return {:>7.2}%  end capital {:.2}",
            result.symbol,
            s.num_trades,
            s.win_rate,
            s.total_profit,
            s.cumulative_return_pct,
            s.end_capital,
        );
    }
}

/// Document for `symbols` with the given defaults, as `template` builds it.
pub fn template_document(
    symbols: &str,
    settings: &BuilderSettings,
) -> Result<Document, BuilderError> {
    let mut builder = StrategyBuilder::new(settings.defaults);
    for symbol in parse_symbols(symbols)? {
        builder.add_asset(&symbol)?;
    }
    Ok(builder.snapshot())
}
