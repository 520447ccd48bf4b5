//! ruleset-merge CLI
//!
//! Fetches remote domain rule lists, merges them and writes one rule file.

mod config;
mod fetch;
mod logging;
mod pipeline;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};

use rsm_compiler::{emit, parse_rule_list, Header};
use rsm_core::{Aggregator, MergeReport};

use config::{parse_source_arg, Config, ConfigError, Overrides, RuleSource};
use fetch::HttpFetcher;
use pipeline::PipelineError;

#[derive(Parser)]
#[command(name = "rsm-cli")]
#[command(about = "Merge remote domain rule lists into a single rule file")]
struct Cli {
    /// More log output (-v, -vv); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule source as NAME=URL; replaces the configured list
    #[arg(short, long = "source", value_name = "NAME=URL", value_parser = parse_source_arg)]
    sources: Vec<RuleSource>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all sources and write the merged rule file
    Merge {
        #[command(flatten)]
        source: SourceArgs,

        /// Output rule file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Maximum concurrent downloads
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify and merge local rule list files
    Classify {
        /// Input rule list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Write the merged rule file here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective source list
    Sources {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Failed to start tokio runtime: {0}")]
    Runtime(std::io::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Failed to read '{path}': {source}")]
    Read { path: String, source: std::io::Error },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No input files specified")]
    NoInput,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            source,
            output,
            timeout,
            jobs,
            json,
        } => cmd_merge(
            source,
            Overrides {
                sources: Vec::new(),
                output,
                timeout_secs: timeout,
                jobs,
            },
            json,
        ),
        Commands::Classify { input, output } => cmd_classify(&input, output.as_deref()),
        Commands::Sources { source } => cmd_sources(source),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn resolve_config(source: SourceArgs, mut overrides: Overrides) -> Result<Config, ConfigError> {
    overrides.sources = source.sources;
    Config::resolve(source.config.as_deref(), overrides)
}

fn cmd_merge(source: SourceArgs, overrides: Overrides, json: bool) -> Result<(), CliError> {
    let config = resolve_config(source, overrides)?;

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let fetcher = HttpFetcher::new(config.timeout).map_err(CliError::Client)?;

    let start = Instant::now();
    let summary = runtime.block_on(pipeline::run(&fetcher, &config, Local::now().naive_local()))?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Merged {} of {} sources into '{}'",
        summary.sources - summary.failed.len(),
        summary.sources,
        summary.output.display()
    );
    print_report(&summary.report);
    if !summary.failed.is_empty() {
        println!("  Failed:          {}", summary.failed.join(", "));
    }
    println!("  Time:            {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_classify(inputs: &[String], output: Option<&Path>) -> Result<(), CliError> {
    if inputs.is_empty() {
        return Err(CliError::NoInput);
    }

    let mut aggregator = Aggregator::new();

    for (index, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;

        let rules = parse_rule_list(&content);
        let recognized = rules.len();
        let added = aggregator.merge(rules);

        println!(
            "  [{}] {} - {} lines, {} rules, {} new",
            index,
            Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
            content.lines().count(),
            recognized,
            added
        );
    }

    let report = aggregator.report();
    println!("Classified {} files", inputs.len());
    print_report(&report);

    if let Some(output) = output {
        let header = Header::with_defaults(Local::now().naive_local());
        let text = emit(aggregator.snapshot(), &report, &header);
        pipeline::write_output(output, &text)?;
        println!("Wrote '{}'", output.display());
    }

    Ok(())
}

fn cmd_sources(source: SourceArgs) -> Result<(), CliError> {
    let config = resolve_config(source, Overrides::default())?;

    println!("Sources ({}):", config.sources.len());
    for (index, source) in config.sources.iter().enumerate() {
        println!("  [{}] {:<20} {}", index, source.name, source.url);
    }
    println!("Output:  {}", config.output.display());
    println!("Timeout: {}s", config.timeout.as_secs());
    println!("Jobs:    {}", config.jobs);

    Ok(())
}

fn print_report(report: &MergeReport) {
    println!("  DOMAIN:          {}", report.domains);
    println!("  DOMAIN-SUFFIX:   {}", report.domain_suffixes);
    println!("  DOMAIN-KEYWORD:  {}", report.domain_keywords);
    println!("  Total:           {}", report.total());
}
