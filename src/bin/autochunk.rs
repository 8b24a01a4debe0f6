//! CLI binary for pdf-autochunk.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ProcessingConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_autochunk::pipeline::input::find_pdf_files;
use pdf_autochunk::{
    inspect, process_files, select, Artifact, ArtifactKind, BatchOutput, DocumentOutcome,
    ProcessingConfig, ProcessingProgressCallback, ProgressCallback, SampledPagesDetector,
    SelectionMode, SplitGranularity, StepKind, Strategy, Thresholds,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the batch, with the current
/// step's page progress shown as the bar message.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} PDF file(s)…"))
        ));
    }

    fn on_document_start(&self, input: &Path, index: usize, total: usize) {
        self.bar
            .set_message(format!("{index}/{total} {}", file_label(input)));
    }

    fn on_strategy_selected(&self, input: &Path, strategy: Strategy, reason: &str) {
        self.bar.println(format!(
            "  {} {}  {}  {}",
            cyan("→"),
            file_label(input),
            bold(strategy.as_str()),
            dim(reason)
        ));
    }

    fn on_step_progress(&self, step: StepKind, done: usize, total: usize) {
        self.bar.set_message(format!("{step}: {done}/{total} pages"));
    }

    fn on_document_complete(&self, input: &Path, artifacts: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            file_label(input),
            dim(&format!("{artifacts} artifact(s)"))
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, input: &Path, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let first_line = error.lines().next().unwrap_or(error);
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            file_label(input),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} file(s) processed successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) processed  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                succeeded + failed,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process every PDF in the current directory
  autochunk

  # Process one file without the confirmation prompt
  autochunk -y scan.pdf

  # Show what would happen, without writing anything
  autochunk --inspect-only ./papers

  # Force a strategy and a compression quality
  autochunk --strategy compress --quality 50 brochure.pdf

  # Only split, into 25-page parts (written to <stem>_split/)
  autochunk --split-pages 25 book.pdf

  # Split-aggressive with 5 MB parts instead of 8 MB
  autochunk --strategy split-aggressive --split-size 5 archive.pdf

  # Machine-readable result
  autochunk -y --json ./papers > result.json

STRATEGIES (default thresholds):
  Size           Text   Strategy
  ─────────────  ─────  ──────────────────────
  ≤ 10 MB        any    none (file is used as-is)
  10–30 MB       yes    extract-text
  10–30 MB       no     compress
  30–100 MB      yes    extract-text-and-split
  30–100 MB      no     compress-and-split
  > 100 MB       any    split-aggressive

OUTPUT:
  <dir>/processed/<stem>_text.txt        extracted text
  <dir>/processed/<stem>_compressed.pdf  JPEG re-encoded pages
  <dir>/processed/<stem>_partNNN.pdf     split parts, numbered from 001

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override log filtering
  AUTOCHUNK_*             Every flag, e.g. AUTOCHUNK_QUALITY=50
"#;

/// Shrink PDFs by extracting text, compressing pages, or splitting them.
#[derive(Parser, Debug)]
#[command(
    name = "autochunk",
    version,
    about = "Shrink PDFs by extracting text, compressing pages, or splitting them",
    long_about = "Inspect each PDF (size, page count, text presence) and pick the cheapest way \
to bring it under a per-file size limit: keep it, extract its text, re-encode its pages as \
JPEG, split it into parts, or a combination.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file or directory of PDFs.
    #[arg(default_value = ".")]
    input: PathBuf,

    /// Output directory. Default: <input dir>/processed.
    #[arg(short, long, env = "AUTOCHUNK_OUTPUT")]
    output: Option<PathBuf>,

    /// Use this strategy for every file instead of selecting one.
    #[arg(long, env = "AUTOCHUNK_STRATEGY", value_enum)]
    strategy: Option<StrategyArg>,

    /// JPEG quality for compression (1–100).
    #[arg(long, env = "AUTOCHUNK_QUALITY", default_value_t = 40,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Split into parts of this many pages (output goes to <stem>_split/).
    ///
    /// Without --strategy every file is only split. With a splitting
    /// strategy this replaces its part size; other strategies are rejected.
    #[arg(long, env = "AUTOCHUNK_SPLIT_PAGES", conflicts_with = "split_size",
          value_parser = clap::value_parser!(u64).range(1..))]
    split_pages: Option<u64>,

    /// Split into parts of about this many MB (output goes to <stem>_split/).
    ///
    /// Same rules as --split-pages.
    #[arg(long, env = "AUTOCHUNK_SPLIT_SIZE")]
    split_size: Option<f64>,

    /// Files at or below this size (MB) are left alone.
    #[arg(long, env = "AUTOCHUNK_SMALL_MB", default_value_t = 10.0)]
    small_mb: f64,

    /// Upper bound (MB) for single-step strategies.
    #[arg(long, env = "AUTOCHUNK_MEDIUM_MB", default_value_t = 30.0)]
    medium_mb: f64,

    /// Above this size (MB) files are split aggressively.
    #[arg(long, env = "AUTOCHUNK_LARGE_MB", default_value_t = 100.0)]
    large_mb: f64,

    /// Compressed output above this size (MB) is split further.
    #[arg(long, env = "AUTOCHUNK_RECHECK_MB", default_value_t = 15.0)]
    recheck_mb: f64,

    /// Number of files processed at once.
    #[arg(short, long, env = "AUTOCHUNK_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Decide text presence from N evenly spaced pages instead of page 1.
    #[arg(long, env = "AUTOCHUNK_TEXT_SAMPLE_PAGES")]
    text_sample_pages: Option<usize>,

    /// Print the inspection report and selected strategy only.
    #[arg(long)]
    inspect_only: bool,

    /// Output the batch result as JSON.
    #[arg(long, env = "AUTOCHUNK_JSON")]
    json: bool,

    /// Do not ask for confirmation before processing several files.
    #[arg(short, long, env = "AUTOCHUNK_YES")]
    yes: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AUTOCHUNK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AUTOCHUNK_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "AUTOCHUNK_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    None,
    ExtractText,
    Compress,
    ExtractTextAndSplit,
    CompressAndSplit,
    SplitAggressive,
}

impl From<StrategyArg> for Strategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::None => Strategy::None,
            StrategyArg::ExtractText => Strategy::ExtractText,
            StrategyArg::Compress => Strategy::Compress,
            StrategyArg::ExtractTextAndSplit => Strategy::ExtractTextAndSplit,
            StrategyArg::CompressAndSplit => Strategy::CompressAndSplit,
            StrategyArg::SplitAggressive => Strategy::SplitAggressive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Discover input ───────────────────────────────────────────────────
    let files = find_pdf_files(&cli.input)
        .with_context(|| format!("Cannot read input {}", cli.input.display()))?;

    if files.is_empty() {
        if !cli.quiet {
            eprintln!("No PDF files to process in {}", cli.input.display());
        }
        return Ok(());
    }

    if !cli.quiet && !cli.json {
        eprintln!("{} Found {} PDF file(s):", cyan("◆"), files.len());
        for f in &files {
            let size_mb = std::fs::metadata(f)
                .map(|m| m.len() as f64 / pdf_autochunk::BYTES_PER_MB)
                .unwrap_or(0.0);
            eprintln!("  - {} {}", file_label(f), dim(&format!("({size_mb:.1}MB)")));
        }
    }

    let mut config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return run_inspect_only(&cli, &files, &config).await;
    }

    // ── Confirmation ─────────────────────────────────────────────────────
    // Before the spinner starts: its ticks would redraw over the prompt.
    if files.len() > 1 && !cli.yes {
        let stdin = io::stdin();
        if !confirm(files.len(), &mut stdin.lock(), &mut io::stderr())? {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        config.progress_callback = Some(cb);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let batch = process_files(files, &config)
        .await
        .context("Processing failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&batch.to_summary())
            .context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&batch, show_progress);
    }

    if batch.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ProcessingConfig`.
/// Validated configuration without a progress callback; the caller attaches
/// one once nothing else needs the terminal.
fn build_config(cli: &Cli) -> Result<ProcessingConfig> {
    let thresholds = Thresholds {
        small_mb: cli.small_mb,
        medium_mb: cli.medium_mb,
        large_mb: cli.large_mb,
        recheck_mb: cli.recheck_mb,
        ..Thresholds::default()
    };

    let mut builder = ProcessingConfig::builder()
        .thresholds(thresholds)
        .quality(cli.quality)
        .concurrency(cli.concurrency);

    if let Some(strategy) = cli.strategy {
        builder = builder.strategy(strategy.into());
    }
    if let Some(pages) = cli.split_pages {
        builder = builder.split(SplitGranularity::Pages(pages as usize));
    } else if let Some(mb) = cli.split_size {
        builder = builder.split(SplitGranularity::TargetMb(mb));
    }
    if let Some(ref dir) = cli.output {
        builder = builder.output_dir(dir);
    }
    if let Some(n) = cli.text_sample_pages.filter(|&n| n > 1) {
        builder = builder.text_detector(Arc::new(SampledPagesDetector::new(n)));
    }

    builder.build().context("Invalid configuration")
}

/// Ask `Process N files? (y/n)` on stderr; anything but `y`/`yes` declines.
fn confirm(count: usize, input: &mut impl BufRead, prompt: &mut impl Write) -> Result<bool> {
    write!(prompt, "\nProcess {count} files? (y/n): ").ok();
    prompt.flush().ok();

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn run_inspect_only(cli: &Cli, files: &[PathBuf], config: &ProcessingConfig) -> Result<()> {
    let mut reports = Vec::with_capacity(files.len());
    let mut failed = 0;

    for file in files {
        match inspect(file, config).await {
            Ok(doc) => {
                let strategy = config.strategy.unwrap_or_else(|| {
                    select(&doc.report, &config.thresholds, SelectionMode::Initial)
                });
                if cli.json {
                    reports.push(serde_json::json!({
                        "input": file,
                        "report": doc.report,
                        "strategy": strategy,
                    }));
                } else {
                    println!("File:         {}", file.display());
                    println!("Size:         {:.2} MB", doc.report.size_mb);
                    println!("Pages:        {}", doc.report.page_count);
                    println!("Per page:     {:.3} MB", doc.report.avg_page_size_mb);
                    println!(
                        "Text:         {} ({} chars on page 1)",
                        if doc.report.has_text { "yes" } else { "no" },
                        doc.report.first_page_text_length
                    );
                    println!("Strategy:     {}", strategy);
                    println!("              {}", strategy.reason(&doc.report));
                    println!();
                }
            }
            Err(e) => {
                failed += 1;
                if cli.json {
                    reports.push(serde_json::json!({
                        "input": file,
                        "error": e.to_string(),
                    }));
                } else {
                    eprintln!("{} {}: {}", red("✗"), file.display(), e);
                }
            }
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?
        );
    }
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn strategy_label(outcome: &DocumentOutcome) -> String {
    if outcome.split_only {
        "split".to_string()
    } else {
        outcome.strategy.to_string()
    }
}

fn print_summary(batch: &BatchOutput, show_progress: bool) {
    if !show_progress {
        for doc in &batch.documents {
            if let Err(ref e) = doc.result {
                eprintln!("{} {}: {}", red("✗"), doc.input.display(), e);
            }
        }
    }

    let artifacts: Vec<&Artifact> = batch.artifacts().collect();
    eprintln!();
    eprintln!(
        "{}  {} file(s) processed, {} artifact(s)  {}ms",
        if batch.failed() == 0 { green("✔") } else { cyan("⚠") },
        batch.documents.len(),
        artifacts.len(),
        batch.total_duration_ms
    );

    for doc in &batch.documents {
        let Ok(ref outcome) = doc.result else { continue };
        eprintln!(
            "\n  {}  {}",
            bold(&file_label(&doc.input)),
            dim(&format!("{} · {:.1}MB", strategy_label(outcome), outcome.report.size_mb))
        );
        if let Some(ref reason) = outcome.compression_fallback {
            eprintln!("    {} compression failed, original kept: {}", cyan("⚠"), reason);
        }
        if let Some(stats) = outcome.compression {
            eprintln!(
                "    {}",
                dim(&format!("compression: {:.0}% smaller", stats.reduction_percent))
            );
        }
        for a in &outcome.artifacts {
            let tag = match a.kind {
                ArtifactKind::Original => "original",
                ArtifactKind::Text => "text",
                ArtifactKind::Compressed => "compressed",
                ArtifactKind::Part(_) => "part",
            };
            eprintln!(
                "    {} {}  {}",
                green("•"),
                a.path.display(),
                dim(&format!("{tag}, {:.1}MB", a.size_mb()))
            );
        }
    }

    let written: Vec<&Artifact> = artifacts
        .iter()
        .copied()
        .filter(|a| a.kind != ArtifactKind::Original)
        .collect();
    if let Some(dir) = pdf_autochunk::output::common_output_dir(&written) {
        eprintln!("\n{} Output saved to {}", cyan("◆"), bold(&dir.display().to_string()));
        eprintln!("{}", dim("   Use _text.txt files first when present (smallest)."));
        eprintln!("{}", dim("   Upload split parts in order (part001, part002, …)."));
    }
}
