//! Engine selection and invocation.
//!
//! A conversion is described by a (source format, destination format) pair.
//! Exactly four pairs are supported, each served by one engine:
//!
//! | Source | Destination | Engine     |
//! |--------|-------------|------------|
//! | TeX    | DVI         | `tex`      |
//! | TeX    | PDF         | `pdftex`   |
//! | LaTeX  | DVI         | `latex`    |
//! | LaTeX  | PDF         | `pdflatex` |
//!
//! One engine pass is run through an [`EngineRunner`]. The default
//! [`ProcessRunner`] launches the engine found on `PATH` inside the
//! workspace with every standard stream attached to the null device, so a
//! document that stops for input fails instead of hanging on a terminal.

use crate::error::TexError;
use crate::pipeline::workspace::SOURCE_FILE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;
use tracing::debug;

/// Flags passed to every engine pass, before the source file name.
///
/// Batch mode with halt-on-error makes the engine fail fast instead of
/// prompting; shell escape stays disabled for untrusted sources.
pub const ENGINE_ARGS: [&str; 4] = [
    "-interaction=batchmode",
    "-halt-on-error",
    "-no-shell-escape",
    "-file-line-error",
];

/// Markup dialect of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    #[serde(rename = "TeX")]
    Tex,
    #[serde(rename = "LaTeX")]
    Latex,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Tex => "TeX",
            SourceFormat::Latex => "LaTeX",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = ();

    /// Exact, case-sensitive match on `"TeX"` or `"LaTeX"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TeX" => Ok(SourceFormat::Tex),
            "LaTeX" => Ok(SourceFormat::Latex),
            _ => Err(()),
        }
    }
}

/// Rendered output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestFormat {
    #[serde(rename = "DVI")]
    Dvi,
    #[serde(rename = "PDF")]
    Pdf,
}

impl DestFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestFormat::Dvi => "DVI",
            DestFormat::Pdf => "PDF",
        }
    }

    /// File extension the engine writes for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            DestFormat::Dvi => "dvi",
            DestFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestFormat {
    type Err = ();

    /// Exact, case-sensitive match on `"DVI"` or `"PDF"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DVI" => Ok(DestFormat::Dvi),
            "PDF" => Ok(DestFormat::Pdf),
            _ => Err(()),
        }
    }
}

/// A TeX-family engine executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Tex,
    PdfTex,
    Latex,
    PdfLatex,
}

impl Engine {
    /// The engine serving a typed format pair. Every typed pair is supported.
    pub fn for_formats(source: SourceFormat, dest: DestFormat) -> Self {
        match (source, dest) {
            (SourceFormat::Tex, DestFormat::Dvi) => Engine::Tex,
            (SourceFormat::Tex, DestFormat::Pdf) => Engine::PdfTex,
            (SourceFormat::Latex, DestFormat::Dvi) => Engine::Latex,
            (SourceFormat::Latex, DestFormat::Pdf) => Engine::PdfLatex,
        }
    }

    /// Resolve caller-supplied format names to an engine.
    ///
    /// Either name being unknown makes the whole pair unsupported; the error
    /// repeats both names verbatim.
    pub fn select(source: &str, dest: &str) -> Result<(Self, SourceFormat, DestFormat), TexError> {
        match (source.parse::<SourceFormat>(), dest.parse::<DestFormat>()) {
            (Ok(s), Ok(d)) => Ok((Self::for_formats(s, d), s, d)),
            _ => Err(TexError::UnsupportedConversion {
                from: source.to_string(),
                to: dest.to_string(),
            }),
        }
    }

    /// Executable name, looked up on `PATH`.
    pub fn command(&self) -> &'static str {
        match self {
            Engine::Tex => "tex",
            Engine::PdfTex => "pdftex",
            Engine::Latex => "latex",
            Engine::PdfLatex => "pdflatex",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Runs one engine pass inside a workspace.
///
/// Implementations must block until the pass has finished and return `Ok(())`
/// only for a clean exit. Implementations must be `Send + Sync` so a config
/// holding one can move into [`crate::convert::convert_async`].
///
/// Replace [`ProcessRunner`] to add supervision the library does not provide,
/// such as a wall-clock limit.
pub trait EngineRunner: Send + Sync {
    fn run(&self, engine: Engine, workspace: &Path) -> Result<(), TexError>;
}

/// Launches the engine as a child process. The default runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl EngineRunner for ProcessRunner {
    fn run(&self, engine: Engine, workspace: &Path) -> Result<(), TexError> {
        run_command(engine.command(), workspace)
    }
}

/// Launch `command` on the workspace source and wait for it.
fn run_command(command: &str, workspace: &Path) -> Result<(), TexError> {
    debug!("Running {} in {}", command, workspace.display());

    let mut child = Command::new(command)
        .args(ENGINE_ARGS)
        .arg(SOURCE_FILE)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| TexError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let status = child.wait().map_err(|source| TexError::Wait { source })?;
    check_status(command, status)
}

/// Classify a finished process: signal, non-zero exit, or success.
fn check_status(command: &str, status: ExitStatus) -> Result<(), TexError> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(TexError::Signaled {
                command: command.to_string(),
                signal,
            });
        }
    }

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(TexError::ExitStatus {
            command: command.to_string(),
            code,
        }),
        None => Err(TexError::ExitStatus {
            command: command.to_string(),
            code: -1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_pairs_map_to_engines() {
        let cases = [
            ("TeX", "DVI", "tex"),
            ("TeX", "PDF", "pdftex"),
            ("LaTeX", "DVI", "latex"),
            ("LaTeX", "PDF", "pdflatex"),
        ];
        for (src, dest, cmd) in cases {
            let (engine, s, d) = Engine::select(src, dest).unwrap();
            assert_eq!(engine.command(), cmd);
            assert_eq!(s.as_str(), src);
            assert_eq!(d.as_str(), dest);
        }
    }

    #[test]
    fn unknown_destination_is_unsupported() {
        let err = Engine::select("TeX", "PostScript").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to convert from \"TeX\" to \"PostScript\"."
        );
    }

    #[test]
    fn format_names_are_case_sensitive() {
        assert!(Engine::select("latex", "PDF").is_err());
        assert!(Engine::select("LaTeX", "pdf").is_err());
        assert!(Engine::select("", "").is_err());
    }

    #[test]
    fn format_display_round_trips_through_from_str() {
        for f in [SourceFormat::Tex, SourceFormat::Latex] {
            assert_eq!(f.to_string().parse::<SourceFormat>(), Ok(f));
        }
        for f in [DestFormat::Dvi, DestFormat::Pdf] {
            assert_eq!(f.to_string().parse::<DestFormat>(), Ok(f));
        }
    }

    #[test]
    fn missing_engine_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command("tex2doc-definitely-not-an-engine", dir.path()).unwrap_err();
        assert!(matches!(err, TexError::Spawn { .. }));
        assert!(err.to_string().starts_with(
            "Unable to start command \"tex2doc-definitely-not-an-engine\""
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_of_child_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // `true` and `false` ignore the engine flags.
        assert!(run_command("true", dir.path()).is_ok());
        let err = run_command("false", dir.path()).unwrap_err();
        assert!(matches!(err, TexError::ExitStatus { code: 1, .. }), "got: {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_classification() {
        use std::os::unix::process::ExitStatusExt;

        assert!(check_status("tex", ExitStatus::from_raw(0)).is_ok());

        // Raw wait status: exit code lives in bits 8..16.
        let err = check_status("tex", ExitStatus::from_raw(1 << 8)).unwrap_err();
        assert_eq!(err.to_string(), "Command \"tex\" terminated with exit status 1.");

        // Low 7 bits hold the terminating signal.
        let err = check_status("pdftex", ExitStatus::from_raw(9)).unwrap_err();
        assert_eq!(err.to_string(), "Command \"pdftex\" was terminated by signal 9.");
    }
}
