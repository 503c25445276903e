use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use emailenrich::batch::{self, BatchSummary};
use emailenrich::cache_commands;
use emailenrich::cli::{CacheCommands, Cli, Commands};
use emailenrich::config::AppConfig;
use emailenrich::embedding::WordVectors;
use emailenrich::enricher::{Enricher, EnrichmentOutcome};
use emailenrich::export;
use emailenrich::logger::{self, BatchProgress, VerbosityLevel};
use emailenrich::web_source::HttpWebSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle --init flag first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run emailenrich again.");
                return Ok(());
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = cli.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    logger::init_tracing(verbosity, cli.log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load_or_default(),
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Cache subcommands never touch the network
    if let Some(Commands::Cache { action }) = &cli.command {
        return match action {
            CacheCommands::List => cache_commands::list_cached_domains(&config.cache),
            CacheCommands::Show { domain } => cache_commands::show_cache_entry(&config.cache, domain),
            CacheCommands::Clear { domain, all } => {
                if *all {
                    cache_commands::clear_all_cache(&config.cache)
                } else if let Some(d) = domain {
                    cache_commands::clear_domain_cache(&config.cache, d)
                } else {
                    eprintln!("Error: Either specify a domain or use --all to clear all cache entries.");
                    eprintln!("Usage: emailenrich cache clear <domain>");
                    eprintln!("       emailenrich cache clear --all");
                    std::process::exit(1);
                }
            }
        };
    }

    let vectors = match &config.embedding.vectors_path {
        Some(path) => match WordVectors::load(path) {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Word vectors unavailable, similarity fallback disabled: {:#}", e);
                WordVectors::empty()
            }
        },
        None => WordVectors::empty(),
    };

    let web = Arc::new(HttpWebSource::new(&config)?);
    let enricher = Enricher::new(&config, web, Arc::new(vectors));

    if let Some(email) = &cli.email {
        if cli.explain_name {
            let debug = enricher.explain_name(email).await;
            println!("{}", serde_json::to_string_pretty(&debug)?);
            return Ok(());
        }

        let outcome = enricher.enrich(email).await;
        return write_outcomes(&cli, std::slice::from_ref(&outcome), false);
    }

    if let Some(input) = &cli.input_file {
        let emails = batch::parse_email_file(input)?;
        info!("Loaded {} addresses from {}", emails.len(), input.display());

        let started = Instant::now();
        let mut summary = BatchSummary::start();
        let progress = BatchProgress::new(emails.len() as u64, verbosity);

        let mut outcomes = Vec::with_capacity(emails.len());
        for email in &emails {
            outcomes.push(enricher.enrich(email).await);
            progress.advance(email);
        }
        progress.finish();

        summary.finish(&outcomes, started.elapsed().as_secs_f64());
        info!(
            "Batch complete: {} enriched, {} invalid in {:.1}s",
            summary.enriched, summary.failed, summary.duration_secs
        );

        write_outcomes(&cli, &outcomes, true)?;
        if cli.output.is_some() && verbosity > VerbosityLevel::Silent {
            export::print_enrichment_summary(&outcomes);
        }
    }

    Ok(())
}

/// Write to `--output` in the chosen format, or print JSON to stdout
fn write_outcomes(cli: &Cli, outcomes: &[EnrichmentOutcome], batch_mode: bool) -> Result<()> {
    match (&cli.output, cli.output_format.as_str()) {
        (Some(path), "csv") => export::export_csv(outcomes, path),
        (Some(path), _) => export::export_json(outcomes, path),
        (None, "csv") => export::write_csv(outcomes, std::io::stdout().lock()).context("Failed to write CSV to stdout"),
        (None, _) => {
            let json = if batch_mode {
                serde_json::to_string_pretty(outcomes)?
            } else {
                serde_json::to_string_pretty(&outcomes[0])?
            };
            println!("{}", json);
            Ok(())
        }
    }
}
