use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::RepositoryRecord;

/// Timestamp format used in snapshot file names.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// File name of a snapshot taken for `login` at `taken_at`.
pub fn snapshot_file_name(login: &str, taken_at: DateTime<Utc>) -> String {
    format!("{}-{}.json", login, taken_at.format(SNAPSHOT_TIMESTAMP_FORMAT))
}

/// Persist `records` as a pretty-printed JSON array in `directory`.
pub fn write(records: &[RepositoryRecord], directory: &Path, login: &str) -> Result<PathBuf> {
    write_at(records, directory, login, Utc::now())
}

/// Like [`write`] with an explicit timestamp. A snapshot taken for the same
/// login within the same second replaces the earlier file.
pub fn write_at(
    records: &[RepositoryRecord],
    directory: &Path,
    login: &str,
    taken_at: DateTime<Utc>,
) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(snapshot_file_name(login, taken_at));
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json)?;
    log::info!("wrote {} records to {}", records.len(), path.display());
    Ok(path)
}
