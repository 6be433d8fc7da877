use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use docmark::{ConvertOptions, Converter, Document, ScoreWeights};

/// Convert a structured document capture (JSON) into Markdown
#[derive(Debug, Parser)]
#[command(name = "docmark", version, about)]
struct Args {
    /// Input document JSON
    input: PathBuf,

    /// Output Markdown file (defaults to the input with a .md extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// TOML file overriding the image placement scoring weights
    #[arg(long, value_name = "FILE")]
    weights: Option<PathBuf>,

    /// Skip the table of contents even when the document qualifies
    #[arg(long)]
    no_toc: bool,

    /// Write the list of referenced image paths, one per line
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let weights = match &args.weights {
        Some(path) => ScoreWeights::from_toml_file(path)
            .with_context(|| format!("failed to load weights from {}", path.display()))?,
        None => ScoreWeights::default(),
    };

    let doc = Document::from_json_file(&args.input)
        .with_context(|| format!("failed to load document from {}", args.input.display()))?;

    let converter = Converter::new(ConvertOptions {
        weights,
        emit_toc: !args.no_toc,
    });
    let result = converter.convert(&doc);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("md"));
    std::fs::write(&output, &result.markdown)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!("wrote {}", output.display());

    if let Some(manifest) = &args.manifest {
        let mut lines = String::new();
        for path in &result.referenced_images {
            lines.push_str(&path.display().to_string());
            lines.push('\n');
        }
        std::fs::write(manifest, lines)
            .with_context(|| format!("failed to write {}", manifest.display()))?;
        log::info!("wrote image manifest {}", manifest.display());
    }

    Ok(())
}
