use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Map a source path to its destination, preserving the directory structure
/// of `source` relative to `scan_root` under `output_root`. Falls back to the
/// bare file name when the source does not live under the scan root.
pub fn resolve(source: &Path, scan_root: &Path, output_root: &Path) -> PathBuf {
    match source.strip_prefix(scan_root) {
        Ok(relative) => output_root.join(relative),
        Err(_) => match source.file_name() {
            Some(name) => output_root.join(name),
            None => output_root.to_path_buf(),
        },
    }
}

/// Create the destination's parent directories. Safe under concurrent calls
/// from multiple workers: "already exists" is success.
pub fn ensure_parent_dirs(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create output directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Copy `source` to `destination` byte-for-byte without a window in which a
/// reader could observe a partial file: the bytes land in a temp file next to
/// the destination, then a rename moves them into place.
pub fn copy_atomic(source: &Path, destination: &Path) -> Result<()> {
    let staging = staging_path(destination);
    if let Err(err) = fs::copy(source, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), staging.display())
        });
    }
    commit(&staging, destination)
}

/// Stream encoded bytes to `destination` through a temp file plus rename.
/// On any error the temp file is removed, leaving the destination untouched.
pub fn write_atomic<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let staging = staging_path(destination);

    let result = File::create(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            // Surface flush errors here instead of losing them when the
            // writer drops
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", staging.display()))
        });

    match result {
        Ok(()) => commit(&staging, destination),
        Err(err) => {
            let _ = fs::remove_file(&staging);
            Err(err)
        }
    }
}

fn commit(staging: &Path, destination: &Path) -> Result<()> {
    fs::rename(staging, destination).map_err(|err| {
        let _ = fs::remove_file(staging);
        anyhow::Error::new(err).context(format!("Failed to move output into place: {}", destination.display()))
    })
}

/// Temp file in the destination's directory so the final rename stays on one
/// filesystem. The leading dot keeps it out of casual directory listings.
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    destination.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_preserves_relative_structure() {
        let dest = resolve(
            Path::new("/photos/2024/trip/img.jpg"),
            Path::new("/photos"),
            Path::new("/out"),
        );
        assert_eq!(dest, Path::new("/out/2024/trip/img.jpg"));
    }

    #[test]
    fn test_resolve_falls_back_to_file_name_outside_scan_root() {
        let dest = resolve(
            Path::new("/elsewhere/img.jpg"),
            Path::new("/photos"),
            Path::new("/out"),
        );
        assert_eq!(dest, Path::new("/out/img.jpg"));
    }

    #[test]
    fn test_ensure_parent_dirs_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a/b/c/img.jpg");

        ensure_parent_dirs(&dest).unwrap();
        ensure_parent_dirs(&dest).unwrap();

        assert!(dest.parent().unwrap().is_dir());
    }

    #[test]
    fn test_copy_atomic_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.bin");
        let dest = dir.path().join("dst.bin");
        fs::write(&source, b"pixel data").unwrap();

        copy_atomic(&source, &dest).unwrap();

        assert_eq!(fs::read(&source).unwrap(), fs::read(&dest).unwrap());
    }

    #[test]
    fn test_write_atomic_leaves_no_file_on_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");

        let result = write_atomic(&dest, |w| {
            w.write_all(b"partial")?;
            Err(anyhow::anyhow!("encoder failure"))
        });

        assert!(result.is_err());
        assert!(!dest.exists());
        // The staging file must be cleaned up too
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_atomic_writes_contents() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");

        write_atomic(&dest, |w| {
            w.write_all(b"encoded")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"encoded");
    }
}
