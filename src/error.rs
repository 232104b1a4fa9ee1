//! Error types for the tex2doc library.
//!
//! Every failure the conversion can hit is a variant of [`TexError`]. The
//! variants are grouped the way a conversion fails:
//!
//! * **Argument**: the request itself is unusable (unknown format pair,
//!   too few runs). Detected before anything touches the filesystem.
//! * **Workspace**: the temporary directory could not be created or torn
//!   down.
//! * **I/O**: reading or writing one of the workspace files failed. Each
//!   message names the path and the step that failed.
//! * **Process**: the engine could not be launched, or it died or exited
//!   non-zero.
//! * **Convergence**: the run budget ran out before the auxiliary file
//!   settled.
//!
//! Internally every stage returns `Result<_, TexError>`. At the public
//! [`crate::convert()`] boundary the error is flattened into the diagnostic
//! string of [`crate::output::ConversionResult`], so the `Display` text of each
//! variant is part of the observable contract.

use std::collections::TryReserveError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tex2doc library.
#[derive(Debug, Error)]
pub enum TexError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// The (source, destination) format pair has no engine.
    #[error("Unable to convert from \"{from}\" to \"{to}\".")]
    UnsupportedConversion { from: String, to: String },

    /// `max_runs` below 2 can never prove the output stable.
    #[error("Argument max_runs is {max_runs}, but must be >= 2.")]
    InvalidMaxRuns { max_runs: i32 },

    // ── Workspace errors ──────────────────────────────────────────────────
    #[error("Unable to create temporary directory from template \"{}\": {source}.", template.display())]
    TempDirCreate {
        template: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read directory entries of \"{}\": {source}.", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to remove file \"{}\": {source}.", path.display())]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to remove directory \"{}\": {source}.", path.display())]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    #[error("Unable to open file \"{}\" for {mode}: {source}.", path.display())]
    Open {
        path: PathBuf,
        mode: AccessMode,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to seek {target} file \"{}\": {source}.", path.display())]
    Seek {
        path: PathBuf,
        target: SeekTarget,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to obtain size of file \"{}\": {source}.", path.display())]
    Size {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to allocate buffer of {size} bytes for reading file \"{}\": {source}.", path.display())]
    Alloc {
        path: PathBuf,
        size: u64,
        #[source]
        source: TryReserveError,
    },

    #[error("Unable to read {size} bytes from file \"{}\": {source}.", path.display())]
    Read {
        path: PathBuf,
        size: u64,
        #[source]
        source: std::io::Error,
    },

    /// The file shrank between measuring and reading it.
    #[error("Unable to read {expected} bytes from file \"{}\": Got only {got} bytes.", path.display())]
    ShortRead {
        path: PathBuf,
        expected: u64,
        got: u64,
    },

    #[error("Unable to write {size} bytes to file \"{}\": {source}.", path.display())]
    Write {
        path: PathBuf,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write {expected} bytes to file \"{}\": Only {written} bytes were written.", path.display())]
    ShortWrite {
        path: PathBuf,
        expected: usize,
        written: usize,
    },

    #[error("Unable to close file \"{}\" after writing: {source}.", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Process errors ────────────────────────────────────────────────────
    #[error("Unable to start command \"{command}\": {source}.")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to wait for child process: {source}.")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    #[error("Command \"{command}\" was terminated by signal {signal}.")]
    Signaled { command: String, signal: i32 },

    #[error("Command \"{command}\" terminated with exit status {code}.")]
    ExitStatus { command: String, code: i32 },

    // ── Convergence ───────────────────────────────────────────────────────
    #[error("Output didn't stabilize after {max_runs} runs.")]
    NotConverged { max_runs: u32 },

    // ── Result adaptors ───────────────────────────────────────────────────
    /// A finished conversion without output, carrying its full diagnostic.
    ///
    /// Returned by [`crate::output::ConversionResult::into_result`] and
    /// [`crate::convert::convert_to_file`].
    #[error("{diagnostic}")]
    ConversionFailed { diagnostic: String },

    /// Could not write the converted document to its final location.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Direction a file was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Reading,
    Writing,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Reading => f.write_str("reading"),
            AccessMode::Writing => f.write_str("writing"),
        }
    }
}

/// Which of the two seeks in [`crate::pipeline::transfer::read_file`] failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekTarget {
    End,
    Start,
}

impl fmt::Display for SeekTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekTarget::End => f.write_str("to end of"),
            SeekTarget::Start => f.write_str("back to start of"),
        }
    }
}
