//! dt2c - Convert WinDbg `dt` dumps into C typedefs
//!
//! Usage:
//!   dt2c                         Paste dumps at an interactive prompt
//!   dt2c <dump.txt>              Convert a file, writing result.txt
//!   dt2c <dump.txt> -o -         Convert a file, printing to stdout
//!   dt2c <dump.txt> -f json      Emit the field tree as JSON

mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dt2c_types::{parse_structure, ParseError, RenderConfig, Renderer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use prompt::Prompt;

#[derive(Parser)]
#[command(name = "dt2c")]
#[command(version, about = "Convert WinDbg `dt` dumps into C typedefs", long_about = None)]
struct Cli {
    /// File holding a `dt` dump (omit for the interactive prompt)
    input: Option<PathBuf>,

    /// Where to write the result in file mode ("-" for stdout)
    #[arg(short, long, default_value = "result.txt")]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::C)]
    format: OutputFormat,

    /// Append bit widths to bitfield declarations
    #[arg(long)]
    bitfield_widths: bool,

    /// Column at which offset comments start
    #[arg(long, default_value_t = 40)]
    comment_column: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// C typedef
    C,
    /// Field tree as JSON
    Json,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = RenderConfig {
        comment_column: cli.comment_column,
        bitfield_widths: cli.bitfield_widths,
        ..RenderConfig::default()
    };
    let renderer = Renderer::new(config);

    match &cli.input {
        Some(input) => convert_file(input, &cli.output, cli.format, &renderer),
        None => {
            let mut prompt = Prompt::new().context("Failed to start the interactive prompt")?;
            prompt.run(|text| convert_text(text, cli.format, &renderer))
        }
    }
}

/// Convert one dump into the requested output format.
fn convert_text(text: &str, format: OutputFormat, renderer: &Renderer) -> Result<String> {
    let structure = parse_structure(text)?;
    debug!(
        name = structure.name.as_deref().unwrap_or("<none>"),
        fields = structure.leaf_count(),
        "parsed structure"
    );

    match format {
        OutputFormat::C => Ok(renderer.render(&structure)?),
        OutputFormat::Json => {
            if structure.name.is_none() {
                return Err(ParseError::UnknownHeader.into());
            }
            let mut json = serde_json::to_string_pretty(&structure)
                .context("Failed to serialize structure")?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn convert_file(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    renderer: &Renderer,
) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read dump: {}", input.display()))?;

    let result = convert_text(&text, format, renderer)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if output == Path::new("-") {
        print!("{}", result);
        return Ok(());
    }

    fs::write(output, &result)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), bytes = result.len(), "wrote declaration");
    println!("Wrote {}", output.display());
    Ok(())
}
