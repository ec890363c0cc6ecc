//! coverx - derive cover images from PDF, EPUB and TXT files

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use coverx::{
    BatchRunner, CoverEngine, ErrorKind, ExtractConfig, ExtractionOutcome, FormatHint,
    ImageEncoding, RasterBackend, SourceDocument, Strategy, artifact_path,
};

#[derive(Parser)]
#[command(name = "coverx")]
#[command(version, about = "Derive cover images from PDF, EPUB and TXT files", long_about = None)]
#[command(after_help = "EXAMPLES:
    coverx book.epub              Write book.jpg (or .png, ...) next to the book
    coverx -j 4 uploads/*         Process a directory of uploads on 4 threads
    coverx --type txt notes.dat   Treat the input as plain text")]
struct Cli {
    /// Input files (PDF, EPUB or TXT)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Declared format, overriding the file extension
    #[arg(short = 't', long = "type", value_name = "FORMAT")]
    format: Option<FormatHint>,

    /// Resolution for the first PDF page
    #[arg(long, default_value_t = 150)]
    dpi: u16,

    /// Text cover width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Text cover height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Text cover wrap column
    #[arg(long, default_value_t = 50)]
    wrap: usize,

    /// Lines of text drawn on a text cover
    #[arg(long, default_value_t = 20)]
    max_lines: usize,

    /// Documents processed at once
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Per-document time limit in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print one JSON object per input instead of plain text
    #[arg(long)]
    json: bool,

    /// Directory containing the pdfium shared library
    #[arg(long, value_name = "DIR")]
    pdfium_lib: Option<PathBuf>,

    /// Log extraction details
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report failures
    #[arg(short, long)]
    quiet: bool,
}

/// One line of `--json` output.
#[derive(Serialize)]
struct Report {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<ImageEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<String>,
}

impl Report {
    fn failure(path: &Path, kind: Option<ErrorKind>, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            status: "error",
            kind,
            error: Some(error),
            strategy: None,
            encoding: None,
            bytes: None,
            artifact: None,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: cannot install logger: {e}");
    }

    let engine = match build_engine(&cli) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut runner = BatchRunner::new(engine).with_workers(cli.jobs);
    if let Some(secs) = cli.timeout {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }

    let reports = run(&cli, &runner);
    let failures = reports.iter().filter(|r| r.status != "ok").count();

    for report in &reports {
        if cli.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("error: cannot serialize report for {}: {e}", report.path),
            }
        } else if report.status == "ok" {
            if !cli.quiet {
                println!(
                    "{} -> {} ({})",
                    report.path,
                    report.artifact.as_deref().unwrap_or("-"),
                    report.strategy.map_or("-", Strategy::as_str)
                );
            }
        } else {
            eprintln!(
                "{}: {}: {}",
                report.path,
                report.kind.map_or("IoError", ErrorKind::as_str),
                report.error.as_deref().unwrap_or("")
            );
        }
    }

    debug!(total = reports.len(), failures, "done");
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_engine(cli: &Cli) -> Result<CoverEngine, String> {
    let config = ExtractConfig::default()
        .with_dpi(cli.dpi)
        .with_canvas(cli.width, cli.height)
        .with_wrap_width(cli.wrap)
        .with_max_lines(cli.max_lines);

    let backend = raster_backend(cli.pdfium_lib.as_deref())?;
    match backend {
        Some(backend) => CoverEngine::with_raster_backend(config, backend),
        None => CoverEngine::new(config),
    }
    .map_err(|e| e.to_string())
}

#[cfg(feature = "pdfium")]
fn raster_backend(dir: Option<&Path>) -> Result<Option<Arc<dyn RasterBackend>>, String> {
    Ok(dir.map(|dir| Arc::new(coverx::PdfiumBackend::with_library_dir(dir)) as Arc<dyn RasterBackend>))
}

#[cfg(not(feature = "pdfium"))]
fn raster_backend(dir: Option<&Path>) -> Result<Option<Arc<dyn RasterBackend>>, String> {
    match dir {
        Some(_) => Err("--pdfium-lib requires a build with the `pdfium` feature".into()),
        None => Ok(None),
    }
}

/// Open every input, extract the readable ones and write their covers.
fn run(cli: &Cli, runner: &BatchRunner) -> Vec<Report> {
    let mut reports: Vec<Option<Report>> = Vec::with_capacity(cli.inputs.len());
    let mut docs = Vec::new();
    let mut doc_slots = Vec::new();

    for path in &cli.inputs {
        match SourceDocument::open(path) {
            Ok(doc) => {
                let doc = match cli.format {
                    Some(hint) => doc.with_hint(hint),
                    None => doc,
                };
                docs.push(doc);
                doc_slots.push(reports.len());
                reports.push(None);
            }
            Err(e) => reports.push(Some(Report::failure(path, None, format!("cannot read: {e}")))),
        }
    }

    let outcomes = runner.run_all(&docs);
    let mut written = HashSet::new();
    for (slot, outcome) in doc_slots.into_iter().zip(outcomes) {
        reports[slot] = Some(finish(&cli.inputs[slot], outcome, &mut written));
    }

    reports.into_iter().flatten().collect()
}

/// Write one cover, never replacing a cover another input wrote this run
/// (`book.pdf` and `book.txt` both map to `book.png`).
fn finish(path: &Path, outcome: ExtractionOutcome, written: &mut HashSet<PathBuf>) -> Report {
    let cover = match outcome {
        Ok(cover) => cover,
        Err(e) => return Report::failure(path, Some(e.kind()), e.to_string()),
    };

    let target = artifact_path(path, cover.encoding);
    if written.contains(&target) {
        return Report::failure(
            path,
            None,
            format!("cannot write cover: {} was already written for another input", target.display()),
        );
    }

    match cover.write_beside(path) {
        Ok(artifact) => {
            written.insert(artifact.clone());
            info!(input = %path.display(), output = %artifact.display(), strategy = %cover.strategy, "wrote cover");
            Report {
                path: path.display().to_string(),
                status: "ok",
                kind: None,
                error: None,
                strategy: Some(cover.strategy),
                encoding: Some(cover.encoding),
                bytes: Some(cover.data.len()),
                artifact: Some(artifact.display().to_string()),
            }
        }
        Err(e) => Report::failure(path, None, format!("cannot write cover: {e}")),
    }
}
