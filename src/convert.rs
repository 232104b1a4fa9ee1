//! The compile-until-stable conversion loop.
//!
//! ## Why run the engine more than once?
//!
//! TeX resolves cross-references (`\ref`, `\pageref`, tables of contents,
//! citations) through the auxiliary file: each pass reads the `.aux` left by
//! the previous pass and writes a new one. The document is only final once a
//! pass writes back exactly what it read. This module reruns the engine until
//! two consecutive passes leave byte-identical `.aux` content (a missing
//! `.aux` counts as empty), or the run budget is spent.
//!
//! ## Lifecycle
//!
//! ```text
//! validate ──▶ create workspace ──▶ stage source ──▶ run ×N ──▶ cleanup
//!    │                │                   │            │           │
//!    └─ reject ───────┴─ fail ────────────┴── fail ────┴── done ───┘
//! ```
//!
//! Once a workspace exists, every exit path goes through cleanup: the engine
//! log is appended to the diagnostic and the workspace is removed. A failed
//! removal replaces the outcome, output included, because a leaked directory
//! must never go unreported.

use crate::config::{ConversionConfig, DEFAULT_MAX_RUNS};
use crate::error::TexError;
use crate::output::{ConversionResult, ConversionStats, FileConversion};
use crate::pipeline::engine::{DestFormat, Engine, EngineRunner, SourceFormat};
use crate::pipeline::transfer::{read_file, write_file};
use crate::pipeline::workspace::Workspace;
use crate::progress::ConversionProgressCallback;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to convert.
///
/// Format names are kept exactly as the caller gave them so that an
/// unsupported pair can be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Source document bytes; written unchanged to `texput.tex`.
    pub source: Vec<u8>,
    /// `"TeX"` or `"LaTeX"`.
    pub source_format: String,
    /// `"DVI"` or `"PDF"`.
    pub dest_format: String,
    /// Upper bound on engine passes; must be at least 2.
    pub max_runs: i32,
}

impl ConversionRequest {
    pub fn new(
        source: impl Into<Vec<u8>>,
        source_format: impl Into<String>,
        dest_format: impl Into<String>,
        max_runs: i32,
    ) -> Self {
        Self {
            source: source.into(),
            source_format: source_format.into(),
            dest_format: dest_format.into(),
            max_runs,
        }
    }

    /// Build a request from typed formats.
    pub fn typed(
        source: impl Into<Vec<u8>>,
        source_format: SourceFormat,
        dest_format: DestFormat,
        max_runs: i32,
    ) -> Self {
        Self::new(source, source_format.as_str(), dest_format.as_str(), max_runs)
    }

    /// LaTeX → PDF with [`DEFAULT_MAX_RUNS`].
    pub fn latex_to_pdf(source: impl Into<Vec<u8>>) -> Self {
        Self::typed(source, SourceFormat::Latex, DestFormat::Pdf, DEFAULT_MAX_RUNS)
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, Copy)]
struct Plan {
    engine: Engine,
    source_format: SourceFormat,
    dest_format: DestFormat,
    max_runs: u32,
}

/// Convert a TeX or LaTeX source to DVI or PDF with the default config.
///
/// # Arguments
/// * `source`: document source
/// * `source_format`: `"TeX"` or `"LaTeX"`
/// * `dest_format`: `"DVI"` or `"PDF"`
/// * `max_runs`: maximum engine passes, at least 2
///
/// # Returns
/// Always a [`ConversionResult`]: check `output` for success and read
/// `diagnostic` either way.
///
/// # Example
/// ```rust,no_run
/// let result = tex2doc::convert(
///     b"\\documentclass{article}\\begin{document}Hi\\end{document}",
///     "LaTeX",
///     "PDF",
///     5,
/// );
/// match result.output {
///     Some(pdf) => std::fs::write("out.pdf", pdf).unwrap(),
///     None => eprintln!("{}", result.diagnostic),
/// }
/// ```
pub fn convert(
    source: &[u8],
    source_format: &str,
    dest_format: &str,
    max_runs: i32,
) -> ConversionResult {
    run_conversion(
        source,
        source_format,
        dest_format,
        max_runs,
        &ConversionConfig::default(),
    )
}

/// Convert a [`ConversionRequest`] under an explicit config.
pub fn convert_with(request: &ConversionRequest, config: &ConversionConfig) -> ConversionResult {
    run_conversion(
        &request.source,
        &request.source_format,
        &request.dest_format,
        request.max_runs,
        config,
    )
}

/// Async wrapper around [`convert_with`].
///
/// The conversion blocks on child processes, so it runs on tokio's blocking
/// pool rather than on a runtime worker.
pub async fn convert_async(request: ConversionRequest, config: ConversionConfig) -> ConversionResult {
    let source_bytes = request.source.len();
    tokio::task::spawn_blocking(move || convert_with(&request, &config))
        .await
        .unwrap_or_else(|e| {
            ConversionResult::failure(
                TexError::Internal(format!("Conversion task panicked: {e}")).to_string(),
                ConversionStats {
                    source_bytes,
                    ..Default::default()
                },
            )
        })
}

/// Convert and write the output directly to a file.
///
/// Uses atomic write (uniquely named temp sibling + rename) so `output_path`
/// never holds a partial document and concurrent writers to the same target
/// never share a temp file. Parent directories are created as needed. The
/// temp file is removed on every error path.
///
/// # Returns
/// The written path together with the full diagnostic (success line and
/// engine log) and the stats.
///
/// # Errors
/// [`TexError::ConversionFailed`] with the full diagnostic if the conversion
/// produced no output; [`TexError::OutputWriteFailed`] if the result could
/// not be written.
pub fn convert_to_file(
    request: &ConversionRequest,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<FileConversion, TexError> {
    let ConversionResult {
        output,
        diagnostic,
        stats,
    } = convert_with(request, config);
    let Some(output) = output else {
        return Err(TexError::ConversionFailed { diagnostic });
    };

    let path = output_path.as_ref();
    let write_failed = |source: std::io::Error| TexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    // Dropping `tmp` on any early return deletes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(".tex2doc-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_failed)?;
    tmp.write_all(&output).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    info!("Wrote {} bytes to {}", output.len(), path.display());
    Ok(FileConversion {
        path: path.to_path_buf(),
        diagnostic,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_conversion(
    source: &[u8],
    source_format: &str,
    dest_format: &str,
    max_runs: i32,
    config: &ConversionConfig,
) -> ConversionResult {
    let total_start = Instant::now();
    let mut stats = ConversionStats {
        source_bytes: source.len(),
        ..Default::default()
    };

    // ── Step 1: Validate ─────────────────────────────────────────────────
    let plan = match validate(source_format, dest_format, max_runs) {
        Ok(plan) => plan,
        Err(e) => {
            warn!("Rejected conversion request: {}", e);
            stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
            return ConversionResult::failure(e.to_string(), stats);
        }
    };
    stats.engine = Some(plan.engine.command().to_string());
    info!(
        "Starting conversion: {} → {} via {} (max {} runs)",
        plan.source_format, plan.dest_format, plan.engine, plan.max_runs
    );

    let callback = config.progress_callback.as_deref();
    if let Some(cb) = callback {
        cb.on_conversion_start(plan.engine.command(), plan.max_runs);
    }

    // ── Step 2: Create workspace ─────────────────────────────────────────
    let base = config.resolve_temp_base();
    let workspace = match Workspace::create(&base) {
        Ok(ws) => ws,
        Err(e) => {
            warn!("{}", e);
            stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
            if let Some(cb) = callback {
                cb.on_conversion_complete(false, 0);
            }
            return ConversionResult::failure(e.to_string(), stats);
        }
    };

    // ── Steps 3–5: Stage source, run until stable ────────────────────────
    let runner = config.engine_runner();
    let outcome = compile_until_stable(
        &workspace,
        runner.as_ref(),
        source,
        &plan,
        callback,
        &mut stats,
    );

    // ── Step 6: Cleanup ──────────────────────────────────────────────────
    if let Err(ref e) = outcome {
        warn!("Conversion failed after {} runs: {}", stats.runs, e);
    }
    let (output, diagnostic) = clean_up(workspace, outcome);

    stats.output_bytes = output.as_ref().map_or(0, Vec::len);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    if output.is_some() {
        info!(
            "Conversion complete: {} bytes after {} runs, {}ms total",
            stats.output_bytes, stats.runs, stats.total_duration_ms
        );
    }
    if let Some(cb) = callback {
        cb.on_conversion_complete(output.is_some(), stats.runs);
    }

    ConversionResult {
        output,
        diagnostic,
        stats,
    }
}

/// Append the engine log to the outcome and remove the workspace.
///
/// A failed removal replaces the outcome entirely, output included.
fn clean_up(
    workspace: Workspace,
    outcome: Result<(Vec<u8>, String), TexError>,
) -> (Option<Vec<u8>>, String) {
    let (output, diagnostic) = match outcome {
        Ok((bytes, message)) => (Some(bytes), Some(message)),
        Err(e) => (None, Some(e.to_string())),
    };

    let log = match read_file(&workspace.log_path()) {
        Ok(log) => Some(log),
        Err(e) => {
            debug!("No engine log: {}", e);
            None
        }
    };
    let diagnostic = append_log(diagnostic, log).unwrap_or_default();

    match workspace.remove() {
        Ok(()) => (output, diagnostic),
        Err(e) => (None, e.to_string()),
    }
}

/// Check the format pair, then the run budget. No side effects.
fn validate(source_format: &str, dest_format: &str, max_runs: i32) -> Result<Plan, TexError> {
    let (engine, source_format, dest_format) = Engine::select(source_format, dest_format)?;
    if max_runs < 2 {
        return Err(TexError::InvalidMaxRuns { max_runs });
    }
    Ok(Plan {
        engine,
        source_format,
        dest_format,
        max_runs: max_runs.unsigned_abs(),
    })
}

/// Stage the source and run the engine until the auxiliary file settles.
///
/// Returns the rendered bytes and the success message.
fn compile_until_stable(
    workspace: &Workspace,
    runner: &dyn EngineRunner,
    source: &[u8],
    plan: &Plan,
    callback: Option<&dyn ConversionProgressCallback>,
    stats: &mut ConversionStats,
) -> Result<(Vec<u8>, String), TexError> {
    write_file(&workspace.source_path(), source)?;

    let aux_path = workspace.aux_path();
    // Before the first run there is no auxiliary file.
    let mut previous_aux: Option<Vec<u8>> = None;

    for run in 1..=plan.max_runs {
        if let Some(cb) = callback {
            cb.on_run_start(run, plan.max_runs);
        }
        stats.runs = run;
        debug!("Run {}/{}", run, plan.max_runs);
        runner.run(plan.engine, workspace.root())?;

        // A missing aux file is normal (plain TeX rarely writes one).
        let aux = read_file(&aux_path).ok();
        let stable = aux_content(&aux) == aux_content(&previous_aux);
        if let Some(cb) = callback {
            cb.on_run_complete(run, plan.max_runs, stable);
        }

        if stable {
            let output = read_file(&workspace.dest_path(plan.dest_format))?;
            let message = format!(
                "Generated {} ({} bytes) from {} ({} bytes) after {} runs.",
                plan.dest_format,
                output.len(),
                plan.source_format,
                source.len(),
                run
            );
            return Ok((output, message));
        }

        debug!("Auxiliary file changed in run {}", run);
        previous_aux = aux;
    }

    Err(TexError::NotConverged {
        max_runs: plan.max_runs,
    })
}

/// Absent and empty auxiliary files compare equal.
fn aux_content(aux: &Option<Vec<u8>>) -> &[u8] {
    aux.as_deref().unwrap_or(&[])
}

/// Append the engine log to the diagnostic, separated by a blank line.
///
/// With no diagnostic yet, the log becomes the diagnostic. The log is decoded
/// lossily; engines write it in whatever encoding the document used.
fn append_log(diagnostic: Option<String>, log: Option<Vec<u8>>) -> Option<String> {
    let Some(log) = log else {
        return diagnostic;
    };
    let log = String::from_utf8_lossy(&log);
    Some(match diagnostic {
        Some(diagnostic) => format!("{diagnostic}\n\n{log}"),
        None => log.into_owned(),
    })
}
