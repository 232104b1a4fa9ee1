//! Whole-file transfer between memory and the workspace.
//!
//! Both primitives are all-or-nothing from the caller's point of view:
//! [`read_file`] returns the complete content or an error, never a truncated
//! buffer, and [`write_file`] truncates on open so a failed write can never
//! leave stale content from an earlier run behind.
//!
//! Each error names the path and the step that failed so the message can be
//! shown to a user as-is.

use crate::error::{AccessMode, SeekTarget, TexError};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Read a file completely into memory.
///
/// The size is measured up front and the buffer reserved for exactly that
/// many bytes. Reading fewer bytes than measured is reported as
/// [`TexError::ShortRead`].
pub fn read_file(path: &Path) -> Result<Vec<u8>, TexError> {
    let mut file = File::open(path).map_err(|source| TexError::Open {
        path: path.to_path_buf(),
        mode: AccessMode::Reading,
        source,
    })?;

    let size = file.seek(SeekFrom::End(0)).map_err(|source| TexError::Seek {
        path: path.to_path_buf(),
        target: SeekTarget::End,
        source,
    })?;
    let len = usize::try_from(size).map_err(|_| TexError::Size {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, "file too large for address space"),
    })?;

    file.seek(SeekFrom::Start(0))
        .map_err(|source| TexError::Seek {
            path: path.to_path_buf(),
            target: SeekTarget::Start,
            source,
        })?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|source| TexError::Alloc {
        path: path.to_path_buf(),
        size,
        source,
    })?;

    let got = Read::by_ref(&mut file)
        .take(size)
        .read_to_end(&mut buf)
        .map_err(|source| TexError::Read {
            path: path.to_path_buf(),
            size,
            source,
        })?;
    if got != len {
        return Err(TexError::ShortRead {
            path: path.to_path_buf(),
            expected: size,
            got: got as u64,
        });
    }

    debug!("Read {} bytes from {}", len, path.display());
    Ok(buf)
}

/// Write `data` to `path`, creating or truncating the file.
///
/// The final `sync_all` stands in for the close step: it is where deferred
/// write errors surface, and it is reported as [`TexError::Close`].
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), TexError> {
    let mut file = File::create(path).map_err(|source| TexError::Open {
        path: path.to_path_buf(),
        mode: AccessMode::Writing,
        source,
    })?;

    let mut written = 0;
    while written < data.len() {
        match file.write(&data[written..]) {
            Ok(0) => {
                return Err(TexError::ShortWrite {
                    path: path.to_path_buf(),
                    expected: data.len(),
                    written,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(TexError::Write {
                    path: path.to_path_buf(),
                    size: data.len(),
                    source,
                })
            }
        }
    }

    file.sync_all().map_err(|source| TexError::Close {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
