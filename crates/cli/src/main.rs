use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use berry_editor_core::{
    document_from_html, document_to_html, EditorCommand, EditorEngine, EditorValue,
    SelectionRange,
};
use berry_html::{PolicyConfig, Sanitizer};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Reads HTML or document JSON on stdin and writes the result to stdout.
#[derive(Parser)]
#[command(version, about = "Sanitize and convert berry editor content")]
struct Cli {
    /// JSON file overriding the sanitizer's numeric limits (`sanitize` only)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize untrusted HTML
    Sanitize {
        /// Print what was removed to stderr as JSON
        #[arg(long)]
        report: bool,
    },
    /// Convert HTML into a versioned document value
    ToJson,
    /// Convert a document value back into HTML
    ToHtml,
    /// Apply one editor command to an HTML document
    Apply {
        /// Command as JSON, e.g. '{"command":"toggle_mark","mark":{"mark":"bold"}}'
        #[arg(long)]
        command: String,

        /// Selection as JSON; defaults to the start of the document
        #[arg(long)]
        selection: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let input = read_stdin()?;

    let output = match cli.command {
        Commands::Sanitize { report } => {
            let config = load_policy(cli.policy.as_deref())?;
            let (html, summary) = Sanitizer::new(&config).sanitize_with_report(&input);
            if report {
                let summary =
                    serde_json::to_string(&summary).context("failed to encode sanitize report")?;
                eprintln!("{summary}");
            }
            html
        }
        Commands::ToJson => EditorValue::from_document(document_from_html(&input))
            .to_json_pretty()
            .context("failed to encode document")?,
        Commands::ToHtml => {
            let value = EditorValue::from_json_str(&input).context("invalid document json")?;
            document_to_html(&value.document)
        }
        Commands::Apply { command, selection } => {
            let command: EditorCommand =
                serde_json::from_str(&command).context("invalid command json")?;
            let selection: SelectionRange = match selection {
                Some(json) => serde_json::from_str(&json).context("invalid selection json")?,
                None => SelectionRange::in_block(0, 0, 0),
            };
            let document = document_from_html(&input);
            let applied = EditorEngine::default()
                .apply(&document, &selection, command)
                .context("command rejected")?;
            tracing::debug!(selection = ?applied.selection, "command applied");
            document_to_html(&applied.document)
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .context("failed to write stdout")?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn load_policy(path: Option<&Path>) -> Result<PolicyConfig> {
    let Some(path) = path else {
        return Ok(PolicyConfig::global().clone());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file: {}", path.display()))?;
    PolicyConfig::from_json_str(&text)
        .with_context(|| format!("invalid policy file: {}", path.display()))
}
