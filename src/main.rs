//! # Barstamp CLI
//!
//! Command-line front-end for writing and reading barcodes.
//!
//! ## Usage
//!
//! ```bash
//! # One QR code in the middle of a blank 600x800 canvas
//! barstamp write -o output/output.png --blank --position middle "hello"
//!
//! # Two QR codes as output/code-001.png and output/code-002.png
//! barstamp write -o output/code.png "first" "second"
//!
//! # Stamp a Code 128 barcode onto an existing photo
//! barstamp write -o out.jpeg --base photo.jpeg --format code128 --size 300x80 "ABC-123"
//!
//! # Full control from a JSON list of symbol specs
//! barstamp write -o output/output.png --blank --specs symbols.json
//!
//! # Read every symbol in an image
//! barstamp read output/output.png
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use barstamp::{
    Base, BarstampError, Engine, EngineConfig, Position, ReaderOptions, SymbolFormat, SymbolSpec,
};

/// Barstamp - render barcodes onto images and read them back
#[derive(Parser, Debug)]
#[command(name = "barstamp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON engine configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one or more symbols
    Write {
        /// Content of each symbol
        contents: Vec<String>,

        /// Output image path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Composite onto an existing image
        #[arg(long, value_name = "FILE", conflicts_with = "blank")]
        base: Option<PathBuf>,

        /// Composite onto a blank 600x800 white canvas
        #[arg(long)]
        blank: bool,

        /// JSON file holding a list of symbol specs (added after CONTENTS)
        #[arg(long, value_name = "FILE")]
        specs: Option<PathBuf>,

        /// Symbology for CONTENTS
        #[arg(long, default_value = "QRCode")]
        format: SymbolFormat,

        /// Position for CONTENTS: top-left, top-right, bottom-left, bottom-right, middle
        #[arg(long)]
        position: Option<String>,

        /// Symbol size for CONTENTS as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,
    },

    /// Read every symbol in an image
    Read {
        /// Image to scan
        image: PathBuf,

        /// Only report these formats
        #[arg(long)]
        format: Vec<SymbolFormat>,

        /// Also look for light-on-dark symbols
        #[arg(long)]
        invert: bool,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BarstampError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::from_config(&config);

    match cli.command {
        Commands::Write {
            contents,
            output,
            base,
            blank,
            specs,
            format,
            position,
            size,
        } => {
            let mut symbols: Vec<SymbolSpec> = contents
                .into_iter()
                .map(|content| {
                    let mut spec = SymbolSpec::new(content).format(format);
                    if let Some(tag) = &position {
                        spec = spec.position(Position::parse_lenient(tag));
                    }
                    if let Some((w, h)) = size {
                        spec = spec.size(w, h);
                    }
                    spec
                })
                .collect();
            if let Some(path) = specs {
                symbols.extend(read_specs(&path)?);
            }

            let base = match (base, blank) {
                (Some(path), _) => Some(Base::Path(path)),
                (None, true) => Some(Base::blank()),
                (None, false) => None,
            };

            let result = engine.write_symbols(&symbols, &output, base.as_ref()).await?;
            print_json(&result)?;
        }
        Commands::Read {
            image,
            format,
            invert,
        } => {
            let options = ReaderOptions {
                formats: format,
                try_invert: invert,
                ..config.reader.clone()
            };
            let found = engine.read_symbols(&image, Some(&options)).await?;
            print_json(&found)?;
        }
    }

    Ok(())
}

/// Load a JSON array of symbol specs
fn read_specs(path: &PathBuf) -> Result<Vec<SymbolSpec>, BarstampError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        BarstampError::validation(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        BarstampError::validation(format!("invalid specs in {}: {}", path.display(), e))
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), BarstampError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BarstampError::validation(format!("failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
