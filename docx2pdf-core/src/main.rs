//! docx2pdf – convert a single DOCX file from the command line.
//!
//! ```text
//! docx2pdf <input.docx> [output_dir]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use docx2pdf_core::{convert_docx_file, ConverterKind, ConverterOptions, DEFAULT_TIMEOUT};

#[derive(Debug, Parser)]
#[command(name = "docx2pdf", version, about = "Convert a DOCX document to PDF")]
struct Cli {
    /// Path to the input .docx file.
    input: PathBuf,

    /// Directory for the PDF; defaults to the input's directory.
    output_dir: Option<PathBuf>,

    /// Converter to run: `libreoffice` or `pandoc`.
    #[arg(long, default_value_t = ConverterKind::LibreOffice)]
    converter: ConverterKind,

    /// Converter executable, if not the default one on PATH.
    #[arg(long)]
    program: Option<String>,

    /// LaTeX engine for the pandoc converter.
    #[arg(long)]
    pdf_engine: Option<String>,

    /// Give up on the converter after this many seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Log converter activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(pdf) => {
            println!("✓ Successfully converted to: {}", pdf.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<PathBuf> {
    let converter = cli.converter.build(ConverterOptions {
        program: cli.program,
        pdf_engine: cli.pdf_engine,
    });
    let pdf = convert_docx_file(
        converter.as_ref(),
        &cli.input,
        cli.output_dir.as_deref(),
        Duration::from_secs(cli.timeout_secs),
    )
    .await?;
    Ok(pdf)
}
