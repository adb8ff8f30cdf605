//! CLI binary for scanbinder.
//!
//! A thin shim over the library crate that maps CLI flags to `BinderConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scanbinder::{
    bind, inspect, BindProgressCallback, BinderConfig, Img2PdfAssembler, MagickTransformer,
    NativeTransformer, ProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
/// Pages complete out of order, so start times are keyed by position.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Looking for pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, position: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut times| times.remove(&position))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BindProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, position: usize, _total: usize, source: &Path) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(position, Instant::now());
        }
        self.bar.set_message(source.display().to_string());
    }

    fn on_page_complete(&self, position: usize, total: usize, source: &Path) {
        let secs = self.elapsed_secs(position);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            position,
            total,
            source.display(),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, position: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(position);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Tool output can be long; the full text is in the log.
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            position,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_transforms_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            self.bar.set_prefix("Bundling");
            self.bar.set_message(format!("{success_count} pages…"));
        } else {
            self.bar.println(format!(
                "{} {}/{} pages failed; not bundling",
                red("✘"),
                failed,
                total_pages
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Bind every JPEG under scans/ into book.pdf
  scanbinder --dir scans --output book.pdf

  # Stamp a watermark one third of the page size
  scanbinder --dir scans --output book.pdf --watermark stamp.png --size 3

  # A4 at 150 DPI, PNG and JPEG inputs
  scanbinder --dir scans --output book.pdf --width 1240 --height 1754 --ext .jpg,.jpeg,.png

  # Preview the page order only
  scanbinder --dir scans --list

  # No ImageMagick installed: use the built-in engine
  scanbinder --dir scans --output book.pdf --engine native

PAGE NUMBERS:
  The page number is the last run of digits in the file name, before the
  extension: scan-007.jpg → 7, page12b.jpg → 12. A matching file without
  digits (cover.jpg) aborts the run; rename it or narrow --ext.

REQUIREMENTS:
  img2pdf                   always (document assembly)
  ImageMagick 7 (magick)    with --engine magick (default)
"#;

/// Bind a directory of scanned page images into one ordered PDF.
#[derive(Parser, Debug)]
#[command(
    name = "scanbinder",
    version,
    about = "Bind a directory of scanned page images into one ordered, optionally watermarked PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input directory searched recursively for pages.
    #[arg(short, long, env = "SCANBINDER_DIR")]
    dir: PathBuf,

    /// Output PDF path. Not needed with --list.
    #[arg(short, long, env = "SCANBINDER_OUTPUT", required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Comma-separated list of accepted file extensions (case-sensitive).
    #[arg(long, env = "SCANBINDER_EXT", default_value = ".jpg,.jpeg", value_delimiter = ',')]
    ext: Vec<String>,

    /// Watermark image; enables watermarking.
    #[arg(short, long, env = "SCANBINDER_WATERMARK")]
    watermark: Option<PathBuf>,

    /// Watermark scale: watermark box is page size divided by this.
    #[arg(long, env = "SCANBINDER_SIZE", default_value_t = 4,
          value_parser = clap::value_parser!(u32).range(1..))]
    size: u32,

    /// Output page width in pixels.
    #[arg(long, env = "SCANBINDER_WIDTH", default_value_t = 1500,
          value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Output page height in pixels.
    #[arg(long, env = "SCANBINDER_HEIGHT", default_value_t = 1500,
          value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Output resolution in DPI.
    #[arg(long, env = "SCANBINDER_DENSITY", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(1..))]
    density: u32,

    /// Work directory for temporary files.
    #[arg(long, env = "SCANBINDER_WORKDIR", default_value = ".scanbinder-workdir")]
    workdir: PathBuf,

    /// Number of pages transformed at the same time.
    #[arg(short, long, env = "SCANBINDER_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Image transform engine.
    #[arg(long, env = "SCANBINDER_ENGINE", value_enum, default_value = "magick")]
    engine: EngineArg,

    /// ImageMagick binary (`convert` for ImageMagick 6).
    #[arg(long, env = "SCANBINDER_MAGICK_BIN", default_value = "magick")]
    magick_bin: String,

    /// img2pdf binary.
    #[arg(long, env = "SCANBINDER_IMG2PDF_BIN", default_value = "img2pdf")]
    img2pdf_bin: String,

    /// Print the resolved page order and exit.
    #[arg(long)]
    list: bool,

    /// Print a JSON report instead of the summary line.
    #[arg(long, env = "SCANBINDER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SCANBINDER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCANBINDER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCANBINDER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    /// ImageMagick child processes.
    Magick,
    /// Built-in engine on the `image` crate.
    Native,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-page feedback, so library INFO logs
    // are silenced while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list;
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

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list {
        let config = build_config(&cli, None)?;
        let pages = inspect(&config).context("Failed to index pages")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&pages).context("Failed to serialise page list")?
            );
        } else {
            for (i, page) in pages.iter().enumerate() {
                println!(
                    "{:>4}  {:>6}  {}",
                    i + 1,
                    page.page_number,
                    page.source_path.display()
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = bind(&config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let output = result.context("Binding failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            output.stats.total_pages,
            output.stats.total_duration_ms,
            bold(&output.output_path.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "scan {}ms  /  transform {}ms  /  bundle {}ms",
                output.stats.discovery_ms, output.stats.transform_ms, output.stats.bundle_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `BinderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BinderConfig> {
    // clap only lets `output` be absent together with --list, which never
    // writes; the builder still wants a path.
    let output = cli.output.clone().unwrap_or_else(|| PathBuf::from("-"));

    let mut builder = BinderConfig::builder()
        .search_root(&cli.dir)
        .output_path(output)
        .extensions(&cli.ext)
        .watermark_scale(cli.size)
        .page_size(cli.width, cli.height)
        .density(cli.density)
        .work_dir(&cli.workdir)
        .concurrency(cli.concurrency)
        .assembler(Arc::new(Img2PdfAssembler::new(&cli.img2pdf_bin)));

    builder = match cli.engine {
        EngineArg::Magick => builder.transformer(Arc::new(MagickTransformer::new(&cli.magick_bin))),
        EngineArg::Native => builder.transformer(Arc::new(NativeTransformer::new())),
    };

    if let Some(ref watermark) = cli.watermark {
        if !watermark.is_file() {
            anyhow::bail!("Watermark file not found: {}", watermark.display());
        }
        builder = builder.watermark(watermark);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_does_not_need_output() {
        let cli = Cli::try_parse_from(["scanbinder", "--dir", "scans", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.output.is_none());
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.search_root, PathBuf::from("scans"));
    }

    #[test]
    fn binding_still_needs_output() {
        let err = Cli::try_parse_from(["scanbinder", "--dir", "scans"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn ext_list_is_split_on_commas() {
        let cli = Cli::try_parse_from([
            "scanbinder", "--dir", "scans", "--output", "book.pdf", "--ext", "tif,.png",
        ])
        .unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.extensions, vec![".tif", ".png"]);
        assert_eq!(config.output_path, PathBuf::from("book.pdf"));
    }
}
