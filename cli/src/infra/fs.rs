//! Filesystem infrastructure: implements the `LocalFs` port.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Production filesystem implementation of `LocalFs`.
pub struct LocalFs;

impl crate::application::ports::LocalFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        let mut entries =
            std::fs::read_dir(path).with_context(|| format!("listing {}", path.display()))?;
        Ok(entries.next().is_none())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("removing directory {}", path.display()))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()> {
        write_private(path, content, mode)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).with_context(|| format!("resolving {}", path.display()))
    }

    fn copy_tree(&self, from: &Path, to: &Path, exclude: fn(&str) -> bool) -> Result<u64> {
        copy_tree(from, to, exclude)
    }
}

/// Write `content` to a temporary file next to `path` with `mode`, then
/// rename it over `path`. Readers see either the old or the new file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// persisted.
pub fn write_private(path: &Path, content: &str, mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".zavod-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(mode));
    }
    #[cfg(not(unix))]
    let _ = mode;
    let mut file = builder
        .tempfile_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("writing temp file {}", file.path().display()))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("syncing temp file {}", file.path().display()))?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Recursively copy `from` into `to`. Entries whose file name matches
/// `exclude` are skipped together with everything below them. Symlinks are
/// recreated, not followed. File modes are preserved.
///
/// # Errors
///
/// Returns an error on the first entry that cannot be read or written.
pub fn copy_tree(from: &Path, to: &Path, exclude: fn(&str) -> bool) -> Result<u64> {
    let mut copied = 0;
    let walker = WalkDir::new(from)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(exclude));

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", from.display()))?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .unwrap_or(entry.path());
        let dest = to.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&dest)
                .with_context(|| format!("creating directory {}", dest.display()))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
            copied += 1;
        } else {
            std::fs::copy(entry.path(), &dest).with_context(|| {
                format!("copying {} to {}", entry.path().display(), dest.display())
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target =
        std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
    std::os::unix::fs::symlink(&target, dest)
        .with_context(|| format!("creating link {}", dest.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    std::fs::copy(src, dest)
        .map(|_| ())
        .with_context(|| format!("copying {} to {}", src.display(), dest.display()))
}
