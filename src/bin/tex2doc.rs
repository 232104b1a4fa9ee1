//! CLI binary for tex2doc.
//!
//! A thin shim over the library crate that maps CLI flags
//! to a `ConversionRequest` + `ConversionConfig` and prints results.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tex2doc::{
    convert_async, convert_to_file, escape_latex, ConversionConfig, ConversionProgressCallback,
    ConversionRequest, ConversionStats, DestFormat, ProgressCallback, SourceFormat,
    DEFAULT_MAX_RUNS,
};
use tokio::io::AsyncReadExt;
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

/// Terminal progress callback: a spinner while the engine runs and one log
/// line per finished run.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Wall-clock start of the current run.
    run_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Validating request…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            run_started: Mutex::new(None),
        })
    }

    fn run_elapsed_secs(&self) -> f64 {
        self.run_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, engine: &str, max_runs: u32) {
        self.bar.set_prefix(engine.to_string());
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running {engine} (up to {max_runs} runs)…"))
        ));
    }

    fn on_run_start(&self, run: u32, max_runs: u32) {
        if let Ok(mut started) = self.run_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("run {run}/{max_runs}"));
    }

    fn on_run_complete(&self, run: u32, max_runs: u32, stable: bool) {
        let elapsed = self.run_elapsed_secs();
        let state = if stable { "aux stable" } else { "aux changed" };
        self.bar.println(format!(
            "  {} Run {:>2}/{:<2}  {:<12}  {}",
            green("✓"),
            run,
            max_runs,
            dim(state),
            dim(&format!("{elapsed:.1}s")),
        ));
    }

    fn on_conversion_complete(&self, success: bool, runs: u32) {
        self.bar.finish_and_clear();
        if success {
            eprintln!("{} converged after {} runs", green("✔"), bold(&runs.to_string()));
        } else {
            eprintln!("{} failed after {} runs", red("✘"), bold(&runs.to_string()));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # LaTeX to PDF (stdout)
  tex2doc paper.tex > paper.pdf

  # Write to a file
  tex2doc paper.tex -o paper.pdf

  # Plain TeX to DVI
  tex2doc --from tex --to dvi story.tex -o story.dvi

  # Allow more passes for long bibliographies
  tex2doc --max-runs 8 thesis.tex -o thesis.pdf

  # Read the source from stdin
  cat letter.tex | tex2doc - -o letter.pdf

  # Escape plain text for inclusion in a LaTeX document
  echo '100% & $5_free' | tex2doc --escape-only -

  # JSON report (diagnostic + stats)
  tex2doc --json paper.tex -o paper.pdf

ENGINES:
  From    To    Engine
  ─────   ───   ────────
  tex     dvi   tex
  tex     pdf   pdftex
  latex   dvi   latex
  latex   pdf   pdflatex

  Engines are looked up on PATH and run in batch mode with shell escape
  disabled. The engine log is included in the diagnostic.

ENVIRONMENT VARIABLES:
  TMPDIR                  Base directory for scratch workspaces (default /tmp)
  TEX2DOC_OUTPUT          Default for --output
  TEX2DOC_FROM            Default for --from
  TEX2DOC_TO              Default for --to
  TEX2DOC_MAX_RUNS        Default for --max-runs
  TEX2DOC_TEMP_DIR        Default for --temp-dir (overrides TMPDIR)
  RUST_LOG                Tracing filter, e.g. tex2doc=debug
"#;

/// Compile TeX/LaTeX documents to DVI or PDF.
#[derive(Parser, Debug)]
#[command(
    name = "tex2doc",
    version,
    about = "Compile TeX/LaTeX documents to DVI or PDF",
    long_about = "Compile TeX or LaTeX sources to DVI or PDF. The engine is rerun until the \
auxiliary file stops changing, so cross-references, citations and tables of contents are \
resolved in the output. All work happens in a private temporary directory that is removed \
afterwards.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file, or `-` for stdin.
    input: String,

    /// Write the document to this file instead of stdout.
    #[arg(short, long, env = "TEX2DOC_OUTPUT")]
    output: Option<PathBuf>,

    /// Source format.
    #[arg(long, env = "TEX2DOC_FROM", value_enum, default_value = "latex")]
    from: FromArg,

    /// Destination format.
    #[arg(long, env = "TEX2DOC_TO", value_enum, default_value = "pdf")]
    to: ToArg,

    /// Maximum engine runs (at least 2).
    #[arg(long, env = "TEX2DOC_MAX_RUNS", default_value_t = DEFAULT_MAX_RUNS,
          allow_negative_numbers = true)]
    max_runs: i32,

    /// Base directory for the scratch workspace.
    #[arg(long, env = "TEX2DOC_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Print the input text escaped for LaTeX instead of converting it.
    #[arg(long)]
    escape_only: bool,

    /// Output a JSON report (diagnostic + stats) on stdout.
    #[arg(long, env = "TEX2DOC_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "TEX2DOC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TEX2DOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TEX2DOC_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FromArg {
    Tex,
    Latex,
}

impl From<FromArg> for SourceFormat {
    fn from(v: FromArg) -> Self {
        match v {
            FromArg::Tex => SourceFormat::Tex,
            FromArg::Latex => SourceFormat::Latex,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ToArg {
    Dvi,
    Pdf,
}

impl From<ToArg> for DestFormat {
    fn from(v: ToArg) -> Self {
        match v {
            ToArg::Dvi => DestFormat::Dvi,
            ToArg::Pdf => DestFormat::Pdf,
        }
    }
}

/// Body of `--json`.
#[derive(Serialize)]
struct Report<'a> {
    success: bool,
    diagnostic: &'a str,
    output: Option<&'a PathBuf>,
    stats: &'a ConversionStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports each run; library INFO logs would
    // interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.escape_only;
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

    let source = read_input(&cli.input).await?;

    // ── Escape-only mode ─────────────────────────────────────────────────
    if cli.escape_only {
        let text = String::from_utf8(source).context("Input is not valid UTF-8")?;
        let mut handle = io::stdout().lock();
        handle
            .write_all(escape_latex(&text).as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let request = ConversionRequest::typed(source, cli.from.into(), cli.to.into(), cli.max_runs);

    // ── Run conversion ───────────────────────────────────────────────────
    if let (Some(output_path), false) = (cli.output.clone(), cli.json) {
        let written =
            tokio::task::spawn_blocking(move || convert_to_file(&request, &output_path, &config))
                .await
                .context("Conversion task panicked")?
                .context("Conversion failed")?;

        if cli.verbose {
            eprintln!("{}", written.diagnostic);
        }
        if !cli.quiet {
            let stats = &written.stats;
            eprintln!(
                "{}  {}  {}ms  →  {}",
                green("✔"),
                dim(written.diagnostic.lines().next().unwrap_or_default()),
                stats.total_duration_ms,
                bold(&written.path.display().to_string()),
            );
        }
        return Ok(());
    }

    let result = convert_async(request, config).await;

    if cli.json {
        if let (Some(bytes), Some(path)) = (&result.output, &cli.output) {
            tex2doc::write_file(path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        let report = Report {
            success: result.is_success(),
            diagnostic: &result.diagnostic,
            output: cli.output.as_ref(),
            stats: &result.stats,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        if !result.is_success() {
            anyhow::bail!("Conversion failed");
        }
        return Ok(());
    }

    let Some(bytes) = result.output else {
        return Err(anyhow!(result.diagnostic)).context("Conversion failed");
    };

    let mut handle = io::stdout().lock();
    handle
        .write_all(&bytes)
        .and_then(|()| handle.flush())
        .context("Failed to write to stdout")?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Converted {} bytes into {} bytes after {} runs in {}ms",
            result.stats.source_bytes,
            result.stats.output_bytes,
            result.stats.runs,
            result.stats.total_duration_ms
        );
    }

    Ok(())
}

/// Read the whole source from a file, or from stdin for `-`.
async fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("Failed to read source from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read source from {input:?}"))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder();

    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
