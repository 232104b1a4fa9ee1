//! Building blocks for one TeX conversion.
//!
//! ## Data Flow
//!
//! ```text
//! workspace ──▶ transfer ──▶ engine ──▶ transfer ──▶ workspace
//!  (create)     (stage .tex)  (run ×N)   (read .aux/.pdf/.log)  (remove)
//! ```
//!
//! 1. [`workspace`]: private temporary directory with fixed file names, plus
//!    the recursive removal used to tear it down
//! 2. [`transfer`]: whole-file reads and writes with path-specific errors
//! 3. [`engine`]: format pair → engine mapping and the child-process
//!    runner; the only stage that launches anything

pub mod engine;
pub mod transfer;
pub mod workspace;
