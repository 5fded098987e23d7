//! qail-oracle - compile query/command IR into Oracle SQL
//!
//! # Usage
//!
//! ```bash
//! # Compile a command list into execution batches
//! qail-oracle compile commands.json --schema schema.json
//!
//! # Compile a single query, JSON output
//! qail-oracle compile query.json --schema schema.json --format json
//!
//! # Format an identifier with the configured conventions
//! qail-oracle format order_lines
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_oracle::engine::compile_batches;
use qail_oracle::prelude::*;
use serde::Deserialize;
use tracing::debug;

#[derive(Parser)]
#[command(name = "qail-oracle")]
#[command(version)]
#[command(about = "Oracle query translator and statement batcher", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-oracle compile commands.json --schema schema.json
    qail-oracle compile query.json --schema schema.json --format json
    qail-oracle format order_lines")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "QAIL_ORACLE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON query or command list
    Compile {
        /// IR file: a query object or an array of commands
        input: PathBuf,

        /// Entity list as JSON
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Format an identifier
    Format {
        identifier: String,
    },
}

/// Compile input: commands are batched, a query compiles to one statement.
#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Commands(Vec<Command>),
    Query(Box<Query>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "qail_oracle=debug" } else { "qail_oracle=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Compile { input, schema, format } => {
            compile(input, schema.as_deref(), *format, &config, cli.verbose)
        }
        Commands::Format { identifier } => {
            println!("{}", Formatter::new(config.oracle).format_identifier(identifier));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::load()?),
    }
}

fn load_schema(path: Option<&Path>) -> anyhow::Result<Schema> {
    let Some(path) = path else {
        return Ok(Schema::new());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let entities: Vec<Entity> = serde_json::from_str(&source)
        .with_context(|| format!("invalid schema {}", path.display()))?;
    Ok(entities.into_iter().collect())
}

fn compile(
    input: &Path,
    schema: Option<&Path>,
    format: OutputFormat,
    config: &Config,
    verbose: bool,
) -> anyhow::Result<()> {
    let schema = load_schema(schema)?;
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let parsed: Input = serde_json::from_str(&source)
        .with_context(|| format!("invalid IR in {}", input.display()))?;

    if verbose {
        eprintln!("{} {} entities", "Schema:".dimmed(), schema.len());
    }

    let builder = StatementBuilder::new(&schema, config.oracle);
    let statements = match parsed {
        Input::Query(query) => vec![builder.query(&query)?],
        Input::Commands(commands) => {
            let (batches, count) = compile_batches(&builder, config.batch, &commands)?;
            debug!(statements = count, batches = batches.len(), "commands compiled");
            batches
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&statements)?),
        OutputFormat::Text => print_statements(&statements),
    }
    Ok(())
}

fn print_statements(statements: &[ExecutionStatement]) {
    for (i, statement) in statements.iter().enumerate() {
        let mut flags = Vec::new();
        if statement.perform_alone {
            flags.push("alone");
        }
        if statement.must_affect_data {
            flags.push("must-affect");
        }
        let header = format!("-- batch {}", i + 1);
        let flags = flags.join(", ");
        println!("{} {}", header.as_str().cyan().bold(), flags.as_str().dimmed());
        println!("{}", statement.script.white());
        for parameter in statement.parameters.iter() {
            let direction = match parameter.direction {
                Direction::Input => "".normal(),
                Direction::Output => " (out)".yellow(),
            };
            println!("  :{} = {}{}", parameter.name.green(), parameter.value, direction);
        }
        println!();
    }
}
