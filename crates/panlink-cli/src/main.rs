//! PANLINK CLI - Command-line interface
//!
//! Usage:
//!   panlink extract <input.json> [-o report.json]
//!   panlink validate <VALUE>...
//!   panlink summary <report.json>

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use panlink_core::{AppConfig, ConfidenceBucket, LoggingConfig};
use panlink_extractor::{
    validate_identifier, DocumentInput, DocumentReport, LinkingEngine, PrecomputedSpans,
    RuleBasedSpans,
};

#[derive(Parser)]
#[command(name = "panlink")]
#[command(about = "Link PAN identifiers to people and organizations in document text")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract identifiers and relations from a JSON page dump
    Extract {
        /// Input document ({"pages": [{"text": ..., "ner_spans": [...]}]})
        input: PathBuf,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the proximity window (characters)
        #[arg(long)]
        window: Option<usize>,
        /// Where person/organization spans come from
        #[arg(long, value_enum, default_value_t = SpanMode::Precomputed)]
        spans: SpanMode,
    },
    /// Check identifier values against the structural format
    Validate {
        /// Values to check
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Print a summary of a previously written report
    Summary {
        /// Report produced by `extract`
        report: PathBuf,
        /// Number of relations to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SpanMode {
    /// Spans supplied in the input file
    Precomputed,
    /// Built-in name and organization rules
    Rules,
    /// Both of the above
    Both,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            input,
            output,
            window,
            spans,
        } => {
            let mut config = config;
            if let Some(window) = window {
                config.linking.window_size = window;
            }
            extract(config, &input, output.as_deref(), spans).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { values } => {
            let invalid = validate(&values);
            Ok(if invalid == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Summary { report, top } => {
            summary(&config, &report, top).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("panlink={0},panlink_extractor={0}", logging.level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn extract(
    config: AppConfig,
    input: &Path,
    output: Option<&Path>,
    mode: SpanMode,
) -> anyhow::Result<()> {
    let engine = build_engine(&config, mode)?;

    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let mut document: DocumentInput = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", input.display()))?;
    if document.source.is_none() {
        document.source = Some(input.display().to_string());
    }

    tracing::info!(
        "Processing {} pages from {} (span sources: {})",
        document.pages.len(),
        input.display(),
        engine.source_ids().join(", ")
    );

    let report = tokio::task::spawn_blocking(move || engine.process_document(&document))
        .await
        .context("linking task panicked")?;

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Report saved to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn build_engine(config: &AppConfig, mode: SpanMode) -> anyhow::Result<LinkingEngine> {
    config.validate()?;

    let engine = LinkingEngine::new(&config.linking)?;
    let engine = match mode {
        SpanMode::Precomputed => engine.with_source(PrecomputedSpans),
        SpanMode::Rules => engine.with_source(RuleBasedSpans::new()),
        SpanMode::Both => engine
            .with_source(PrecomputedSpans)
            .with_source(RuleBasedSpans::new()),
    };

    Ok(engine)
}

/// Print a verdict per value and return the number of invalid ones
fn validate(values: &[String]) -> usize {
    let mut valid = 0;
    for value in values {
        let result = validate_identifier(value);
        if result.is_valid {
            valid += 1;
            println!("  {value}: VALID");
        } else {
            println!("  {value}: INVALID ({})", result.reason);
        }
    }

    let invalid = values.len() - valid;
    println!();
    println!("Total: {}  Valid: {}  Invalid: {}", values.len(), valid, invalid);

    invalid
}

async fn summary(config: &AppConfig, path: &Path, top: usize) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let report: DocumentReport =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let stats = &report.stats;

    println!("Document {}", report.document_id);
    if let Some(source) = &report.source {
        println!("Source:   {source}");
    }
    println!("Generated {}", report.generated_at.to_rfc3339());
    println!();
    println!("Pages processed:   {}", stats.total_pages);
    println!("Degraded pages:    {}", stats.degraded_pages);
    println!("Entities found:    {}", stats.entities_found());
    println!("Relations found:   {}", report.relations.len());

    println!();
    println!("Top relations:");
    for relation in report.relations.iter().take(top) {
        println!(
            "  {} -> {} -> {}",
            relation.identifier_value, relation.relation_kind, relation.counterpart_value
        );
        println!(
            "      confidence {:.2} | method {} | page {}",
            relation.confidence,
            relation.method,
            relation.page_index + 1
        );
    }

    // Recomputed so the current thresholds apply to old reports
    let thresholds = &config.linking.confidence_thresholds;
    let total = report.relations.len().max(1) as f32;
    println!();
    println!("Confidence distribution:");
    for bucket in [ConfidenceBucket::High, ConfidenceBucket::Medium, ConfidenceBucket::Low] {
        let count = report
            .relations
            .iter()
            .filter(|r| ConfidenceBucket::classify(r.confidence, thresholds) == bucket)
            .count();
        println!(
            "  {:<6} {:>5} ({:.1}%)",
            bucket.as_str(),
            count,
            count as f32 / total * 100.0
        );
    }

    println!();
    println!("Entities by type:");
    for (entity_type, count) in &stats.entity_counts {
        println!("  {entity_type}: {count}");
    }

    println!();
    println!("Extraction methods:");
    for (method, count) in &stats.extraction_methods {
        println!("  {method}: {count}");
    }

    println!();
    println!(
        "Identifier validation: {} valid, {} invalid",
        stats.valid_identifiers, stats.invalid_identifiers
    );
    for verdict in report.validation.iter().filter(|v| !v.is_valid) {
        println!("  {}: {}", verdict.identifier_value, verdict.reason);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_extract() {
        let cli = Cli::parse_from([
            "panlink", "extract", "doc.json", "--window", "120", "--spans", "both",
        ]);

        match cli.command {
            Commands::Extract { input, window, spans, output } => {
                assert_eq!(input, PathBuf::from("doc.json"));
                assert_eq!(window, Some(120));
                assert_eq!(spans, SpanMode::Both);
                assert!(output.is_none());
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_validate_counts_invalid() {
        assert_eq!(validate(&["AAUFM6247N".to_string()]), 0);
        assert_eq!(
            validate(&["AAUFM6247N".to_string(), "AAUF12345N".to_string()]),
            1
        );
    }

    #[test]
    fn test_zero_window_rejected_before_processing() {
        let mut config = AppConfig::default();
        config.linking.window_size = 0;

        assert!(build_engine(&config, SpanMode::Precomputed).is_err());
    }
}
