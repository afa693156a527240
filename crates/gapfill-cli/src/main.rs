//! Gapfill CLI - Author fill-in-the-blank templates from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{blank, grade, history, infer, init, meta, show, Context};
use gapfill_session::GapfillConfig;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gapfill")]
#[command(about = "Turn text into fill-in-the-blank exercises and grade answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace directory
    #[arg(long, global = true, default_value = ".gapfill")]
    workspace: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a workspace from a text file
    Init {
        /// File holding the template text
        file: PathBuf,

        /// Replace an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Show the template and its blanks
    Show,

    /// Print the template with values filled in
    Render {
        /// Values as id=value pairs
        values: Vec<String>,
    },

    /// Turn a piece of the template into a blank
    Blank {
        /// Exact text to blank out
        text: String,

        /// Which occurrence of the text (1-based)
        #[arg(long, default_value = "1")]
        nth: usize,
    },

    /// Put a blank's answer back into the text
    Remove { id: String },

    /// Drop a blank's record, leaving its placeholder
    DeleteRecord { id: String },

    /// Give an orphaned placeholder a record
    Attach { id: String, answer: String },

    /// Rename a blank
    Rename { old: String, new: String },

    /// Renumber blanks 1..N in order of appearance
    Renumber,

    /// Replace the template text from a file, keeping matching blanks
    Edit { file: PathBuf },

    /// Select a blank, or clear the selection
    Select { id: Option<String> },

    /// Set a blank's description
    Describe { id: String, text: String },

    /// Change a blank's reference answer
    Answer { id: String, answer: String },

    /// Set or clear a blank's binding name
    Bind {
        id: String,
        /// Binding key; omit to clear
        key: Option<String>,
    },

    /// Override a blank's constraint with JSON, e.g. '{"kind":"number","min":0}'
    Constrain {
        id: String,
        /// Constraint JSON
        constraint: Option<String>,

        /// Drop the override and infer again
        #[arg(long, conflicts_with = "constraint")]
        clear: bool,
    },

    /// Show the constraint inferred for an answer
    Infer { answer: String },

    /// Grade submitted values against every blank
    Grade {
        /// Values as id=value pairs
        values: Vec<String>,

        /// JSON file mapping ids to values
        #[arg(long)]
        values_file: Option<PathBuf>,
    },

    /// Undo the last change
    Undo,

    /// Redo the last undone change
    Redo,
}

/// `GAPFILL_LOG` first, then `RUST_LOG`, then the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env("GAPFILL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_logging(config: &GapfillConfig, verbose: bool) {
    let log_level = if verbose { "debug" } else { config.logging.level.as_str() };

    let env_filter = env_filter(log_level);

    match config.logging.format.as_str() {
        "compact" => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    debug!("Logging initialized with level: {}", log_level);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GapfillConfig::load()?;
    init_logging(&config, cli.verbose);

    let ctx = Context::new(cli.workspace, cli.format, config);

    match cli.command {
        Commands::Init { file, force } => init::run(&ctx, &file, force),
        Commands::Show => show::run(&ctx),
        Commands::Render { values } => show::render(&ctx, &values),
        Commands::Blank { text, nth } => blank::create(&ctx, &text, nth),
        Commands::Remove { id } => blank::remove(&ctx, &id),
        Commands::DeleteRecord { id } => blank::delete_record(&ctx, &id),
        Commands::Attach { id, answer } => blank::attach(&ctx, &id, &answer),
        Commands::Rename { old, new } => blank::rename(&ctx, &old, &new),
        Commands::Renumber => blank::renumber(&ctx),
        Commands::Edit { file } => blank::edit(&ctx, &file),
        Commands::Select { id } => blank::select(&ctx, id.as_deref()),
        Commands::Describe { id, text } => meta::describe(&ctx, &id, &text),
        Commands::Answer { id, answer } => meta::answer(&ctx, &id, &answer),
        Commands::Bind { id, key } => meta::bind(&ctx, &id, key),
        Commands::Constrain { id, constraint, clear } => {
            meta::constrain(&ctx, &id, constraint.as_deref(), clear)
        }
        Commands::Infer { answer } => infer::run(&ctx, &answer),
        Commands::Grade { values, values_file } => {
            grade::run(&ctx, &values, values_file.as_deref())
        }
        Commands::Undo => history::undo(&ctx),
        Commands::Redo => history::redo(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_precedence() {
        std::env::remove_var("GAPFILL_LOG");
        std::env::set_var("RUST_LOG", "warn");
        assert_eq!(env_filter("debug").to_string(), "warn");

        std::env::set_var("GAPFILL_LOG", "trace");
        assert_eq!(env_filter("debug").to_string(), "trace");

        std::env::remove_var("GAPFILL_LOG");
        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter("debug").to_string(), "debug");
    }
}
