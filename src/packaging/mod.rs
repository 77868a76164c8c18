//! Artifact packaging and content hashing
//!
//! - **archive**: deterministic zip packaging of a plugin directory
//! - **digest**: streaming SHA-256 of the resulting artifact

pub mod archive;
pub mod digest;

pub use archive::{
    artifact_file_name, collect_entries, package_dir, ArchiveEntry, ArchiveSummary,
    ARCHIVE_EXTENSION, EXCLUDED_DIRS,
};
pub use digest::{is_valid_digest, sha256_bytes, sha256_file, sha256_reader, DIGEST_HEX_LEN};
