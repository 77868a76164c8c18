//! Atomic file replacement for generated outputs.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// Mode given to published files on unix; temp files are created `0o600`.
#[cfg(unix)]
const PUBLISHED_MODE: u32 = 0o644;

/// Create a temporary file in the directory that will receive `dest`.
///
/// Keeping the temp file on the same filesystem makes [`publish`] a rename.
pub fn staging_file(dest: &Path) -> Result<NamedTempFile> {
    Ok(NamedTempFile::new_in(parent_dir(dest))?)
}

/// Flush `tmp` to disk and rename it onto `dest`, replacing any existing file.
pub fn publish(tmp: NamedTempFile, dest: &Path) -> Result<File> {
    tmp.as_file().sync_all()?;
    let file = tmp.persist(dest).map_err(|e| e.error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(PUBLISHED_MODE))?;
    }

    Ok(file)
}

/// Directory containing `path`, `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("index.yaml")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/a/b.zip")), PathBuf::from("/a"));
    }

    #[test]
    fn test_publish_replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("index.yaml");
        fs::write(&dest, "old").unwrap();

        let mut staged = staging_file(&dest).unwrap();
        staged.write_all(b"new").unwrap();
        publish(staged, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_published_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.zip");
        publish(staging_file(&dest).unwrap(), &dest).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
