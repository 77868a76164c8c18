//! Deterministic zip packaging of plugin directories.
//!
//! Two directory trees with the same relative paths, contents and execute
//! bits produce byte-identical archives: entries are written in sorted
//! order, every entry carries the zip epoch as its timestamp, and
//! permissions are normalized to `0o755` / `0o644`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::Result;
use crate::utils::fs::{publish, staging_file};

/// File extension of packaged artifacts.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Version-control metadata directories never packaged, at any depth.
pub const EXCLUDED_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

const EXECUTABLE_MODE: u32 = 0o755;
const REGULAR_MODE: u32 = 0o644;

/// A regular file selected for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, relative to the packaged directory, `/`-separated.
    pub name: String,
    /// Location on disk.
    pub path: PathBuf,
}

/// Result of packaging one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Archive-internal names, in the order they were written.
    pub entries: Vec<String>,
    /// Size of the finished archive in bytes.
    pub size: u64,
}

/// `<key>-<version>.zip`
pub fn artifact_file_name(key: &str, version: &str) -> String {
    format!("{}-{}.{}", key, version, ARCHIVE_EXTENSION)
}

/// Collect every regular file under `root` in sorted traversal order.
///
/// Directory entries are sorted by file name at every level. Symlinks to
/// regular files are included; directory symlinks, other non-regular entries
/// and names that are not valid UTF-8 are skipped. [`EXCLUDED_DIRS`] are not
/// entered.
pub fn collect_entries(root: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    walk(root, "", &mut entries)?;
    Ok(entries)
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<ArchiveEntry>) -> Result<()> {
    let mut children = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let path = child.path();
        let Some(file_name) = child.file_name().to_str().map(str::to_string) else {
            warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };
        let name = if prefix.is_empty() {
            file_name.clone()
        } else {
            format!("{}/{}", prefix, file_name)
        };

        let file_type = child.file_type()?;
        if file_type.is_dir() {
            if EXCLUDED_DIRS.contains(&file_name.as_str()) {
                debug!(dir = %path.display(), "Skipping version-control directory");
                continue;
            }
            walk(&path, &name, out)?;
        } else if file_type.is_file() || is_file_symlink(&path, file_type) {
            out.push(ArchiveEntry { name, path });
        } else {
            debug!(path = %path.display(), "Skipping non-regular file");
        }
    }

    Ok(())
}

/// Symlinks to regular files are packaged with the target's contents under
/// the link's name. Directory links and dangling links are not followed.
fn is_file_symlink(path: &Path, file_type: fs::FileType) -> bool {
    file_type.is_symlink() && fs::metadata(path).is_ok_and(|target| target.is_file())
}

/// Package `src` into a zip archive at `dest`, replacing any existing file.
///
/// The archive is assembled in a temporary file next to `dest` and renamed
/// into place, so a failed run never leaves a truncated archive behind.
pub fn package_dir(src: &Path, dest: &Path) -> Result<ArchiveSummary> {
    let entries = collect_entries(src)?;

    let mut tmp = staging_file(dest)?;

    {
        let mut zip = ZipWriter::new(BufWriter::new(tmp.as_file_mut()));
        for entry in &entries {
            let mut input = File::open(&entry.path)?;
            let metadata = input.metadata()?;
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(DateTime::default())
                .unix_permissions(normalized_mode(&metadata))
                .large_file(metadata.len() >= u32::MAX as u64);

            zip.start_file(entry.name.as_str(), options)?;
            io::copy(&mut input, &mut zip)?;
        }
        let mut writer = zip.finish()?;
        writer.flush()?;
    }

    let file = publish(tmp, dest)?;
    let size = file.metadata()?.len();

    debug!(
        archive = %dest.display(),
        files = entries.len(),
        bytes = size,
        "Packaged plugin directory"
    );

    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        entries: entries.into_iter().map(|e| e.name).collect(),
        size,
    })
}

#[cfg(unix)]
fn normalized_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    }
}

#[cfg(not(unix))]
fn normalized_mode(_metadata: &fs::Metadata) -> u32 {
    REGULAR_MODE
}
