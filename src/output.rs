//! Result types returned by a conversion.

use crate::error::TexError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The outcome of one conversion.
///
/// Exactly one of two shapes holds:
///
/// * **success**: `output` is `Some`, `diagnostic` describes what was
///   generated (followed by the engine log, if one was written);
/// * **failure**: `output` is `None`, `diagnostic` describes the cause
///   (again followed by the engine log when there is one).
///
/// The diagnostic is always meaningful, so callers should log it either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// The rendered DVI or PDF bytes, present only on success.
    pub output: Option<Vec<u8>>,
    /// Human-readable account of what happened.
    pub diagnostic: String,
    /// Counters describing the work done.
    pub stats: ConversionStats,
}

impl ConversionResult {
    pub(crate) fn failure(diagnostic: String, stats: ConversionStats) -> Self {
        Self {
            output: None,
            diagnostic,
            stats,
        }
    }

    /// Whether the conversion produced output.
    pub fn is_success(&self) -> bool {
        self.output.is_some()
    }

    /// Convert into a `Result`, turning a failed conversion into
    /// [`TexError::ConversionFailed`] with the full diagnostic.
    pub fn into_result(self) -> Result<Vec<u8>, TexError> {
        match self.output {
            Some(bytes) => Ok(bytes),
            None => Err(TexError::ConversionFailed {
                diagnostic: self.diagnostic,
            }),
        }
    }
}

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Engine command selected for the request; None if validation failed.
    pub engine: Option<String>,
    /// Engine passes that were started.
    pub runs: u32,
    /// Size of the source document.
    pub source_bytes: usize,
    /// Size of the rendered output; 0 on failure.
    pub output_bytes: usize,
    /// Wall-clock time of the whole conversion, including cleanup.
    pub total_duration_ms: u64,
}

/// A document written by [`crate::convert::convert_to_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileConversion {
    /// Where the document now lives.
    pub path: PathBuf,
    /// Success line followed by the engine log, as in [`ConversionResult`].
    pub diagnostic: String,
    pub stats: ConversionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_has_no_output() {
        let r = ConversionResult::failure("boom".into(), ConversionStats::default());
        assert!(!r.is_success());
        let err = r.into_result().unwrap_err();
        assert!(matches!(err, TexError::ConversionFailed { .. }));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn success_into_result_yields_bytes() {
        let r = ConversionResult {
            output: Some(b"%PDF-1.5".to_vec()),
            diagnostic: "Generated PDF (8 bytes) from LaTeX (10 bytes) after 2 runs.".into(),
            stats: ConversionStats::default(),
        };
        assert!(r.is_success());
        assert_eq!(r.into_result().unwrap(), b"%PDF-1.5");
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = ConversionStats {
            engine: Some("pdflatex".into()),
            runs: 2,
            source_bytes: 10,
            output_bytes: 8,
            total_duration_ms: 1500,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"engine\":\"pdflatex\""), "got: {json}");
        assert!(json.contains("\"runs\":2"), "got: {json}");
    }
}
