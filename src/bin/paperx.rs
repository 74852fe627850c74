//! CLI binary for paper-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs the batch stream, and prints JSON results.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use paper_extract::{extract_batch, ContentExtractor, ExtractionConfig, PaperReference};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract one paper (JSON to stdout)
  paperx 2401.12345

  # Several papers, results to a file
  paperx 2401.12345 2402.67890 -o results.json

  # Skip the HTML variant entirely
  paperx --pdf-only 2401.12345

  # Download figure image bytes (base64 in the JSON output)
  paperx --download-images --max-figures 5 2401.12345

  # Larger batch with more parallelism and a tighter timeout
  paperx -c 8 --timeout 15 $(cat reading_list.txt)

OUTPUT:
  A JSON array with one object per paper:
    { "arxiv_id": "...", "result": { "method": "structured"|"fallback",
      "structured_available": bool, "sections": {...}, "figures": [...],
      "full_text": "..." } }

  Empty section strings mean "not found" — a paper that could not be
  fetched at all still produces a result object, never an error.

ENVIRONMENT VARIABLES:
  PAPERX_OUTPUT        Default output path
  PAPERX_CONCURRENCY   Default concurrency
  RUST_LOG             Tracing filter (overrides -v/-q)
"#;

/// Extract sections and figures from arXiv papers.
#[derive(Parser, Debug)]
#[command(
    name = "paperx",
    version,
    about = "Extract structured sections and figures from research papers",
    long_about = "Extract introduction/methodology/conclusion sections and figures from \
arXiv papers. Tries the machine-rendered HTML variant first and falls back to the PDF; \
every paper yields a result object even when both paths fail.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// arXiv identifiers, e.g. 2401.12345 or 2401.12345v2.
    #[arg(required = true)]
    ids: Vec<String>,

    /// Write the JSON results to this file instead of stdout.
    #[arg(short, long, env = "PAPERX_OUTPUT")]
    output: Option<PathBuf>,

    /// Skip the HTML variant and extract from the PDF only.
    #[arg(long)]
    pdf_only: bool,

    /// Download figure image bytes (HTML path; PDF images are always embedded).
    #[arg(long)]
    download_images: bool,

    /// Drop figures whose image download failed instead of keeping the URL.
    #[arg(long, requires = "download_images")]
    drop_unfetched: bool,

    /// Maximum figures per paper.
    #[arg(long, default_value_t = 3)]
    max_figures: usize,

    /// Network timeout in seconds, applied to every request category.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Number of papers extracted concurrently.
    #[arg(short, long, env = "PAPERX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the JSON results.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Build extractor ──────────────────────────────────────────────────
    let config = ExtractionConfig::builder()
        .prefer_structured(!cli.pdf_only)
        .download_figure_bytes(cli.download_images)
        .drop_unfetched_figures(cli.drop_unfetched)
        .max_figures(cli.max_figures)
        .timeout_ms(cli.timeout.saturating_mul(1_000))
        .build()
        .context("Invalid configuration")?;
    let extractor =
        Arc::new(ContentExtractor::new(config).context("Failed to build extractor")?);

    let papers: Vec<PaperReference> = cli
        .ids
        .iter()
        .map(|id| PaperReference::from_arxiv_id(id.as_str()))
        .collect();
    let total = papers.len();

    let bar = if show_progress {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} papers  \
                 ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run the batch ────────────────────────────────────────────────────
    let mut stream = extract_batch(extractor, papers, cli.concurrency);
    let mut entries = Vec::with_capacity(total);
    let mut degraded = 0usize;

    while let Some((paper, result)) = stream.next().await {
        if let Some(ref bar) = bar {
            let mark = if result.has_content() {
                green("✓")
            } else {
                yellow("⚠")
            };
            bar.println(format!(
                "  {} {}  {}  {}",
                mark,
                paper.arxiv_id,
                dim(&format!("{:?}", result.method).to_lowercase()),
                dim(&format!(
                    "{} sections, {} figures",
                    result.sections.values().filter(|s| !s.is_empty()).count(),
                    result.figures.len()
                )),
            ));
            bar.inc(1);
        }
        if !result.has_content() {
            degraded += 1;
        }
        entries.push(json!({
            "arxiv_id": paper.arxiv_id,
            "result": result,
        }));
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // Batch order is completion order; restore input order for the output.
    entries.sort_by_key(|e| {
        cli.ids
            .iter()
            .position(|id| e["arxiv_id"] == id.as_str())
            .unwrap_or(usize::MAX)
    });

    // ── Write results ────────────────────────────────────────────────────
    let rendered =
        serde_json::to_string_pretty(&entries).context("Failed to serialise results")?;
    match cli.output {
        Some(ref path) => {
            tokio::fs::write(path, rendered.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{} {}/{} papers with content  →  {}",
                    if degraded == 0 {
                        green("✔")
                    } else {
                        yellow("⚠")
                    },
                    bold(&(total - degraded).to_string()),
                    total,
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
            if !cli.quiet && degraded > 0 {
                eprintln!(
                    "{} {} of {} papers produced no content",
                    yellow("⚠"),
                    degraded,
                    total
                );
            }
        }
    }

    Ok(())
}
