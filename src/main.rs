use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clausetab::{AnnotationDocument, ParserConfig, WordOrderQuery};

/// Convert a clause table to an annotation graph and print its word orders
#[derive(Parser, Debug)]
#[command(name = "clausetab", version, about)]
struct Cli {
    /// Clause table (tab-separated, optionally .gz)
    file: PathBuf,

    /// TOML file with delimiter, skip_lines and tier_numbers
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore rows whose first cell is MARKER (repeatable)
    #[arg(long = "skip", value_name = "MARKER")]
    skip: Vec<String>,

    /// Relation labels to report, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    terms: Vec<String>,

    /// Report label FROM as TO (repeatable)
    #[arg(long, value_name = "FROM=TO", value_parser = parse_rename)]
    rename: Vec<(String, String)>,

    /// Also print agreement values
    #[arg(short, long)]
    agreement: bool,
}

fn parse_rename(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .ok_or_else(|| format!("expected FROM=TO, got {:?}", s))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ParserConfig::from_toml_file(path)?,
        None => ParserConfig::default(),
    };
    config.skip_lines.extend(cli.skip.iter().cloned());

    let doc = AnnotationDocument::from_file(&cli.file, &config)
        .with_context(|| format!("Failed to convert {}", cli.file.display()))?;

    let tiers: Vec<_> = doc.structure_type.tiers().iter().map(|t| t.name()).collect();
    println!(
        "{} clauses, {} annotations, tiers: {}",
        doc.clauses.len(),
        doc.graph.len(),
        tiers.join(" ")
    );

    if cli.terms.is_empty() {
        return Ok(());
    }

    let query = WordOrderQuery::new()
        .with_terms(cli.terms)
        .with_renames(cli.rename)
        .with_agreement(cli.agreement);

    for word_order in query.run(&doc.graph) {
        let word_order = word_order?;
        if cli.agreement {
            println!(
                "{}\t{}\t{}\t{}",
                word_order.clause_id,
                word_order.clause_type,
                word_order.relations.join(" "),
                word_order.agreements.join(" ")
            );
        } else {
            println!(
                "{}\t{}\t{}",
                word_order.clause_id,
                word_order.clause_type,
                word_order.relations.join(" ")
            );
        }
    }

    Ok(())
}
