//! # tex2doc
//!
//! Compile TeX and LaTeX sources to DVI or PDF, rerunning the engine until
//! cross-references settle.
//!
//! ## Why this crate?
//!
//! Shelling out to `pdflatex` once is easy; getting a *finished* document is
//! not. Labels, citations and tables of contents are resolved through the
//! `.aux` file, so a single pass leaves `??` where references should be.
//! Running the engine a fixed number of times wastes seconds on simple
//! documents and still undershoots on complex ones. This crate reruns the
//! engine until the `.aux` file stops changing, in a private scratch directory
//! that is always cleaned up, and hands back the bytes plus a diagnostic that
//! includes the engine log.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source bytes
//!  │
//!  ├─ 1. Validate   format pair → engine, max_runs ≥ 2
//!  ├─ 2. Workspace  <tmp>/tex2doc-temp-XXXXXX
//!  ├─ 3. Stage      write texput.tex
//!  ├─ 4. Run ×N     tex | pdftex | latex | pdflatex, until texput.aux is stable
//!  ├─ 5. Collect    read texput.dvi / texput.pdf, append texput.log
//!  └─ 6. Cleanup    recursive removal (failure overrides the result)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tex2doc::{convert, escape_latex};
//!
//! let body = escape_latex("Profit: 100% & rising");
//! let source = format!(
//!     "\\documentclass{{article}}\\begin{{document}}{body}\\end{{document}}"
//! );
//!
//! let result = convert(source.as_bytes(), "LaTeX", "PDF", 5);
//! match result.output {
//!     Some(pdf) => std::fs::write("profit.pdf", pdf).unwrap(),
//!     None => eprintln!("conversion failed:\n{}", result.diagnostic),
//! }
//! ```
//!
//! ## Engines
//!
//! | Source | Destination | Engine     |
//! |--------|-------------|------------|
//! | `TeX`   | `DVI`      | `tex`      |
//! | `TeX`   | `PDF`      | `pdftex`   |
//! | `LaTeX` | `DVI`      | `latex`    |
//! | `LaTeX` | `PDF`      | `pdflatex` |
//!
//! Engines are found on `PATH` and run with
//! `-interaction=batchmode -halt-on-error -no-shell-escape -file-line-error`.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tex2doc` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! tex2doc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod escape;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MAX_RUNS};
pub use convert::{convert, convert_async, convert_to_file, convert_with, ConversionRequest};
pub use error::TexError;
pub use escape::{escape_latex, escape_latex_char};
pub use output::{ConversionResult, ConversionStats, FileConversion};
pub use pipeline::engine::{DestFormat, Engine, EngineRunner, ProcessRunner, SourceFormat};
pub use pipeline::transfer::{read_file, write_file};
pub use pipeline::workspace::remove_dir_recursive;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
