//! # Gleaner CLI Application
//!
//! This module implements the command-line interface for gleaner.
//!
//! ## Subcommands
//!
//! - `run`: fetch every configured URL, extract records and save them per domain
//! - `chunk`: show how a text file would be split before extraction
//! - `parse`: run the response parser on a saved model answer
//!
//! `run` reads `config.txt`, `urls.txt` and `fields.txt` from the working
//! directory unless other paths are given. A run without URLs or fields stops
//! early with a message instead of doing any work.

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use gleaner::aggregator::ProvenanceMode;
use gleaner::config::{ConfigBuilder, ConfigError, ConfigPaths, Provider};
use gleaner::crawler::{CrawlerConfig, SpiderFetcher};
use gleaner::extraction::{ExtractionSettings, Extractor, try_parse_response};
use gleaner::model::client_from_config;
use gleaner::pipeline::{Pipeline, PipelineOptions, ProgressEvent};
use gleaner::processor::{ChunkOptions, chunk_text};
use gleaner::storage::FileStorage;
use indicatif::{ProgressBar, ProgressStyle};
use telemetry::OtelGuard;
use tokio::sync::mpsc;
use tracing::{instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Extract structured records from web pages with an LLM", long_about = None)]
struct Cli {
    /// Also write logs to a file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the configured URLs and extract records
    Run(RunArgs),

    /// Show the chunks a text file would be split into
    Chunk(ChunkArgs),

    /// Normalize a saved model answer into listings
    Parse(ParseArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Settings file (key=value lines)
    #[arg(long, default_value = "config.txt")]
    config: PathBuf,

    /// URL list, one per line
    #[arg(long, default_value = "urls.txt")]
    urls: PathBuf,

    /// Field list, one per line
    #[arg(long, default_value = "fields.txt")]
    fields: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Provider to use instead of the one in the settings file
    #[arg(long)]
    provider: Option<Provider>,

    /// Chat completion endpoint override
    #[arg(long)]
    endpoint: Option<String>,

    /// Chunk budget in estimated tokens
    #[arg(short, long)]
    chunk_size: Option<usize>,

    /// Concurrent extraction requests per page
    #[arg(long)]
    concurrency: Option<usize>,

    /// Minimum milliseconds between extraction requests
    #[arg(long)]
    request_interval_ms: Option<u64>,

    /// Page load timeout in seconds
    #[arg(long)]
    page_timeout: Option<u64>,

    /// How source URLs are attached to records
    #[arg(long, value_enum)]
    provenance: Option<ProvenanceMode>,

    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Text file to split
    #[arg(required = true)]
    file: PathBuf,

    /// Chunk budget in estimated tokens
    #[arg(short, long, default_value = "30000")]
    chunk_size: usize,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// File holding a raw model answer
    #[arg(required = true)]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let _otel: OtelGuard = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    // Execute the appropriate command
    match cli.command {
        Some(Commands::Run(args)) => {
            run_command(args).await?;
        }
        Some(Commands::Chunk(args)) => {
            chunk_command(args).await?;
        }
        Some(Commands::Parse(args)) => {
            parse_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["gleaner", "--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let paths = ConfigPaths {
        config: args.config.clone(),
        urls: args.urls.clone(),
        fields: args.fields.clone(),
    };

    let mut builder = ConfigBuilder::from_files(&paths).await?;
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }
    if let Some(provider) = args.provider {
        builder = builder.provider(provider);
    }
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(chunk_size) = args.chunk_size {
        builder = builder.chunk_size(chunk_size);
    }
    if let Some(concurrency) = args.concurrency {
        builder = builder.concurrency(concurrency);
    }
    if let Some(interval) = args.request_interval_ms {
        builder = builder.request_interval_ms(interval);
    }
    if let Some(secs) = args.page_timeout {
        builder = builder.page_timeout(Duration::from_secs(secs));
    }
    if let Some(provenance) = args.provenance {
        builder = builder.provenance(provenance);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e @ (ConfigError::MissingUrls | ConfigError::MissingFields)) => {
            eprintln!("{}. Nothing to do.", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if config.api_key().is_empty() {
        warn!(
            "No API key for {}; set {} in {} or the {} environment variable",
            config.provider,
            config.provider.config_key(),
            paths.config.display(),
            config.provider.api_key_env()
        );
    }

    println!(
        "Extracting {} fields from {} URLs with {}",
        config.fields.len(),
        config.urls.len(),
        config.provider
    );

    let extractor = Extractor::new(client_from_config(&config)?, ExtractionSettings::from(&config));
    let pipeline = Pipeline::new(
        SpiderFetcher::new(CrawlerConfig::from(&config)),
        extractor,
        FileStorage::new(&config.output_dir),
        PipelineOptions::from(&config),
    );

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel(100);
    let pipeline = pipeline.with_progress(progress_sender);

    let progress_bar = ProgressBar::new(config.urls.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    // Spawn a task to process progress updates
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            let mut chunks = 0;
            let mut chunks_done = 0;
            while let Some(event) = progress_receiver.recv().await {
                match event {
                    ProgressEvent::PageStarted { url, .. } => {
                        progress_bar.set_message(format!("fetching {}", url));
                    }
                    ProgressEvent::PageChunked { url, chunks: count } => {
                        chunks = count;
                        chunks_done = 0;
                        progress_bar.set_message(format!("{} (0/{} chunks)", url, chunks));
                    }
                    ProgressEvent::ChunkFinished { url, .. } => {
                        chunks_done += 1;
                        progress_bar
                            .set_message(format!("{} ({}/{} chunks)", url, chunks_done, chunks));
                    }
                    ProgressEvent::PageFinished { url, records } => {
                        progress_bar.inc(1);
                        progress_bar.println(format!("{}: {} records", url, records));
                    }
                    ProgressEvent::PageSkipped { url } => {
                        progress_bar.inc(1);
                        progress_bar.println(format!("{}: skipped", url));
                    }
                    ProgressEvent::DomainSaved { domain, records } => {
                        progress_bar.println(format!("Saved {} records for {}", records, domain));
                    }
                }
            }
            progress_bar.finish_with_message("done");
        }
    });

    let summary = pipeline.run(&config.urls).await;

    // The progress task ends once every sender is dropped
    drop(pipeline);
    let _ = progress_handle.await;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }

    Ok(())
}

#[instrument]
async fn chunk_command(args: ChunkArgs) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let options = ChunkOptions {
        max_chunk_tokens: args.chunk_size,
    };
    let chunks = chunk_text(&text, &options);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    println!(
        "{} chunks (budget {} tokens)",
        chunks.len(),
        options.max_chunk_tokens
    );
    for chunk in &chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "#{:<4} ~{:>8.1} tokens {:>8} chars  {}",
            chunk.position,
            chunk.estimated_tokens,
            chunk.text.chars().count(),
            preview
        );
    }

    Ok(())
}

#[instrument]
async fn parse_command(args: ParseArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.file).await?;

    let result = match try_parse_response(&raw) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Could not parse response: {}", e);
            Default::default()
        }
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
