//! Configuration types for TeX conversion.
//!
//! What to convert lives in [`crate::ConversionRequest`]; how to convert it
//! lives here: where workspaces are created, which [`EngineRunner`] launches
//! the engine, and who hears about progress. None of these change the
//! conversion's result for a working engine, so one config can be shared by
//! any number of requests and threads.

use crate::error::TexError;
use crate::pipeline::engine::{EngineRunner, ProcessRunner};
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default run budget used by the CLI and [`crate::ConversionRequest::latex_to_pdf`].
///
/// Most documents settle after two or three passes; five leaves room for
/// bibliographies and back-references.
pub const DEFAULT_MAX_RUNS: i32 = 5;

/// Environment variable naming the base directory for workspaces.
pub const TEMP_DIR_ENV: &str = "TMPDIR";

/// Base directory used when neither the config nor the environment names one.
pub const FALLBACK_TEMP_DIR: &str = "/tmp";

/// Configuration for a TeX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use tex2doc::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .temp_dir("/var/tmp")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Base directory for workspaces. If None, resolved per conversion from
    /// `$TMPDIR`, falling back to `/tmp`.
    pub temp_dir: Option<PathBuf>,

    /// Pre-constructed engine runner. If None, uses [`ProcessRunner`].
    pub runner: Option<Arc<dyn EngineRunner>>,

    /// Optional run-event callback. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("temp_dir", &self.temp_dir)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn EngineRunner>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Base directory for the next workspace.
    ///
    /// Order: configured `temp_dir`, then `$TMPDIR` if set and non-empty,
    /// then `/tmp`. Read fresh on every call.
    pub fn resolve_temp_base(&self) -> PathBuf {
        temp_base(self.temp_dir.as_deref(), std::env::var_os(TEMP_DIR_ENV))
    }

    /// The configured runner, or the process runner.
    pub(crate) fn engine_runner(&self) -> Arc<dyn EngineRunner> {
        match self.runner {
            Some(ref runner) => Arc::clone(runner),
            None => Arc::new(ProcessRunner),
        }
    }
}

/// An empty environment value counts as unset.
fn temp_base(configured: Option<&Path>, env: Option<OsString>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(FALLBACK_TEMP_DIR),
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn runner(mut self, runner: Arc<dyn EngineRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, TexError> {
        if let Some(ref dir) = self.config.temp_dir {
            if dir.as_os_str().is_empty() {
                return Err(TexError::InvalidConfig(
                    "temp_dir must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_temp_dir_wins() {
        let config = ConversionConfig::builder()
            .temp_dir("/srv/scratch")
            .build()
            .unwrap();
        assert_eq!(config.resolve_temp_base(), PathBuf::from("/srv/scratch"));
    }

    #[test]
    fn empty_temp_dir_is_rejected() {
        let err = ConversionConfig::builder().temp_dir("").build().unwrap_err();
        assert!(err.to_string().contains("temp_dir"));
    }

    #[test]
    fn default_has_no_overrides() {
        let config = ConversionConfig::default();
        assert!(config.temp_dir.is_none());
        assert!(config.runner.is_none());
        assert!(config.progress_callback.is_none());
        let dbg = format!("{config:?}");
        assert!(dbg.contains("ConversionConfig"));
    }

    #[test]
    fn tmpdir_overrides_fallback() {
        let base = temp_base(None, Some(OsString::from("/var/scratch")));
        assert_eq!(base, PathBuf::from("/var/scratch"));
    }

    #[test]
    fn empty_tmpdir_counts_as_unset() {
        assert_eq!(temp_base(None, Some(OsString::new())), PathBuf::from("/tmp"));
    }

    #[test]
    fn unset_tmpdir_falls_back_to_tmp() {
        assert_eq!(temp_base(None, None), PathBuf::from(FALLBACK_TEMP_DIR));
    }

    #[test]
    fn configured_dir_beats_tmpdir() {
        let base = temp_base(
            Some(Path::new("/srv/scratch")),
            Some(OsString::from("/var/scratch")),
        );
        assert_eq!(base, PathBuf::from("/srv/scratch"));
    }

    #[test]
    fn env_resolution_is_never_empty() {
        // $TMPDIR may or may not be set in the test environment; either way
        // the result is a usable, non-empty path.
        let base = ConversionConfig::default().resolve_temp_base();
        assert!(!base.as_os_str().is_empty());
    }
}
