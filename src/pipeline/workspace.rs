//! The per-conversion temporary directory and its teardown.
//!
//! ## Layout
//!
//! ```text
//! $TMPDIR/tex2doc-temp-XXXXXX/
//!  ├─ texput.tex   source, written before the first run
//!  ├─ texput.aux   cross-reference state (engine-produced, optional)
//!  ├─ texput.log   engine transcript (optional)
//!  └─ texput.dvi | texput.pdf
//! ```
//!
//! File names never depend on request content. `texput` is the job name the
//! engines use for input read from a file of that name, so nothing caller
//! supplied ever reaches a path.
//!
//! ## Why not let `TempDir` clean up?
//!
//! `tempfile::TempDir` removes itself on drop but swallows the error. A failed
//! removal is a leaked directory the caller must hear about, so the directory
//! is detached from `TempDir` right after creation and torn down explicitly by
//! [`Workspace::remove`], which reports through [`remove_dir_recursive`].

use crate::error::TexError;
use crate::pipeline::engine::DestFormat;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name prefix of every workspace directory.
pub const WORKSPACE_PREFIX: &str = "tex2doc-temp-";

/// Job name shared by all files in the workspace.
pub const JOB_NAME: &str = "texput";

/// File name the engine is invoked on, relative to the workspace.
pub const SOURCE_FILE: &str = "texput.tex";

const AUX_FILE: &str = "texput.aux";
const LOG_FILE: &str = "texput.log";

/// An exclusively owned temporary directory for one conversion.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a uniquely named workspace under `base`.
    pub fn create(base: &Path) -> Result<Self, TexError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(base)
            .map_err(|source| TexError::TempDirCreate {
                template: base.join(format!("{WORKSPACE_PREFIX}XXXXXX")),
                source,
            })?;
        let root = dir.keep();
        debug!("Created workspace {}", root.display());
        Ok(Self {
            root,
            removed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_path(&self) -> PathBuf {
        self.root.join(SOURCE_FILE)
    }

    pub fn aux_path(&self) -> PathBuf {
        self.root.join(AUX_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Path of the rendered document for the requested format.
    pub fn dest_path(&self, format: DestFormat) -> PathBuf {
        self.root.join(format!("{JOB_NAME}.{}", format.extension()))
    }

    /// Remove the workspace and everything in it.
    pub fn remove(mut self) -> Result<(), TexError> {
        self.removed = true;
        let result = remove_dir_recursive(&self.root);
        match &result {
            Ok(()) => debug!("Removed workspace {}", self.root.display()),
            Err(e) => warn!("Failed to remove workspace {}: {}", self.root.display(), e),
        }
        result
    }
}

impl Drop for Workspace {
    /// Last-resort cleanup when the conversion unwinds before [`Workspace::remove`].
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = remove_dir_recursive(&self.root) {
                warn!("Failed to remove abandoned workspace {}: {}", self.root.display(), e);
            }
        }
    }
}

/// Remove `dir` and its contents, like `rm -r`.
///
/// Errors on individual entries do not stop the walk; only the first one is
/// remembered. Whether it is reported depends on the final `rmdir`:
///
/// * `rmdir` succeeds → `Ok(())`. The directory is gone, so earlier glitches
///   no longer matter.
/// * `rmdir` fails → the earliest recorded error, or the `rmdir` error itself
///   if nothing failed before it.
pub fn remove_dir_recursive(dir: &Path) -> Result<(), TexError> {
    let mut first_error: Option<TexError> = None;

    match fs::read_dir(dir) {
        Err(source) => {
            first_error = Some(TexError::ReadDir {
                path: dir.to_path_buf(),
                source,
            });
        }
        Ok(entries) => {
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(source) => {
                        first_error.get_or_insert(TexError::ReadDir {
                            path: dir.to_path_buf(),
                            source,
                        });
                        continue;
                    }
                };
                let path = entry.path();
                // file_type() does not follow symlinks: a link to a
                // directory is unlinked, never descended into.
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let result = if is_dir {
                    remove_dir_recursive(&path)
                } else {
                    fs::remove_file(&path).map_err(|source| TexError::RemoveFile {
                        path: path.clone(),
                        source,
                    })
                };
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    match fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(source) => Err(first_error.unwrap_or(TexError::RemoveDir {
            path: dir.to_path_buf(),
            source,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn removes_nested_tree() {
        let base = tempdir().unwrap();
        let root = base.path().join("ws");
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("texput.tex"), b"\\bye").unwrap();
        fs::write(root.join("sub/a.aux"), b"x").unwrap();
        fs::write(root.join("sub/deeper/b.log"), b"y").unwrap();

        remove_dir_recursive(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn removes_empty_directory() {
        let base = tempdir().unwrap();
        let root = base.path().join("empty");
        fs::create_dir(&root).unwrap();

        remove_dir_recursive(&root).unwrap();
        assert!(!root.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_unlinked_not_followed() {
        let base = tempdir().unwrap();
        let outside = base.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();

        let root = base.path().join("ws");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        remove_dir_recursive(&root).unwrap();
        assert!(!root.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn missing_directory_reports_earliest_error() {
        let base = tempdir().unwrap();
        let root = base.path().join("never-created");

        // Listing fails first, then rmdir fails: the listing error wins.
        let err = remove_dir_recursive(&root).unwrap_err();
        assert!(matches!(err, TexError::ReadDir { .. }), "got: {err:?}");
        assert!(err.to_string().contains("Unable to read directory entries"));
    }

    #[cfg(unix)]
    #[test]
    fn undeletable_root_reports_rmdir_failure() {
        use std::os::unix::fs::PermissionsExt;

        let base = tempdir().unwrap();
        let parent = base.path().join("locked");
        let root = parent.join("ws");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("texput.tex"), b"x").unwrap();
        fs::write(root.join("sub/texput.aux"), b"y").unwrap();

        fs::set_permissions(&parent, fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users ignore directory permissions; nothing to observe then.
        let privileged = fs::write(parent.join("probe"), b"").is_ok();
        if !privileged {
            let err = remove_dir_recursive(&root).unwrap_err();
            assert!(matches!(err, TexError::RemoveDir { .. }), "got: {err:?}");
            assert!(root.exists());
            assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
        }
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn unremovable_root_is_reported_after_emptying_it() {
        let base = tempdir().unwrap();
        let root = base.path().join("ws");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("texput.tex"), b"x").unwrap();
        fs::write(root.join("sub/texput.aux"), b"y").unwrap();

        // rmdir refuses a path whose last component is `.`, even for root.
        let err = remove_dir_recursive(&root.join(".")).unwrap_err();

        assert!(matches!(err, TexError::RemoveDir { .. }), "got: {err:?}");
        assert!(root.exists());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn removing_vanished_workspace_fails() {
        let base = tempdir().unwrap();
        let ws = Workspace::create(base.path()).unwrap();
        fs::remove_dir_all(ws.root()).unwrap();

        let err = ws.remove().unwrap_err();
        assert!(matches!(err, TexError::ReadDir { .. }), "got: {err:?}");
    }

    #[test]
    fn workspace_paths_use_fixed_names() {
        let base = tempdir().unwrap();
        let ws = Workspace::create(base.path()).unwrap();

        let name = ws.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(WORKSPACE_PREFIX), "got: {name}");
        assert_eq!(ws.source_path(), ws.root().join("texput.tex"));
        assert_eq!(ws.aux_path(), ws.root().join("texput.aux"));
        assert_eq!(ws.log_path(), ws.root().join("texput.log"));
        assert_eq!(ws.dest_path(DestFormat::Pdf), ws.root().join("texput.pdf"));
        assert_eq!(ws.dest_path(DestFormat::Dvi), ws.root().join("texput.dvi"));

        let root = ws.root().to_path_buf();
        ws.remove().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn workspaces_are_unique() {
        let base = tempdir().unwrap();
        let a = Workspace::create(base.path()).unwrap();
        let b = Workspace::create(base.path()).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn dropped_workspace_is_removed() {
        let base = tempdir().unwrap();
        let root = {
            let ws = Workspace::create(base.path()).unwrap();
            fs::write(ws.source_path(), b"x").unwrap();
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn create_in_missing_base_fails_with_template() {
        let base = tempdir().unwrap();
        let missing = base.path().join("nope");

        let err = Workspace::create(&missing).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("tex2doc-temp-XXXXXX"), "got: {msg}");
        assert!(msg.starts_with("Unable to create temporary directory"), "got: {msg}");
    }
}
