use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Aggregate, RepoSummary, RepositoryRecord, SummaryArtifact};

/// Decimal places kept for CI pass rates.
const PASS_RATE_PRECISION: f64 = 10_000.0;

/// The two accepted snapshot layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Records(Vec<RepositoryRecord>),
    Wrapped {
        #[serde(default)]
        repos: Vec<RepositoryRecord>,
    },
}

impl SnapshotFile {
    fn into_records(self) -> Vec<RepositoryRecord> {
        match self {
            SnapshotFile::Records(records) | SnapshotFile::Wrapped { repos: records } => records,
        }
    }
}

/// Every `*.json` file directly inside `data_dir`, in lexical order.
pub fn snapshot_paths(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(Error::NoData(data_dir.display().to_string()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Error::NoData(data_dir.display().to_string()));
    }
    Ok(paths)
}

/// Read and concatenate the records of every snapshot, without deduplication.
///
/// A record with an empty name fails the whole load with
/// [`Error::InvalidSnapshot`].
pub fn load_snapshots(paths: &[PathBuf]) -> Result<Vec<RepositoryRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)?;
        let snapshot: SnapshotFile = serde_json::from_str(&content)?;
        let loaded = snapshot.into_records();
        if let Some(position) = loaded.iter().position(|record| record.name.is_empty()) {
            return Err(Error::InvalidSnapshot {
                path: path.clone(),
                reason: format!("record {} has an empty name", position),
            });
        }
        log::debug!("loaded {} records from {}", loaded.len(), path.display());
        records.extend(loaded);
    }
    Ok(records)
}

fn round_pass_rate(rate: f64) -> f64 {
    (rate * PASS_RATE_PRECISION).round() / PASS_RATE_PRECISION
}

/// Compute the summary of an already loaded record set.
pub fn summarize_records(records: &[RepositoryRecord], generated_at: DateTime<Utc>) -> SummaryArtifact {
    let mut languages: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_stars = 0u64;

    for record in records {
        total_stars += record.stargazer_count;
        if let Some(language) = &record.primary_language {
            *languages.entry(language.clone()).or_insert(0) += 1;
        }
    }

    let repos = records
        .iter()
        .map(|record| RepoSummary {
            name: record.name.clone(),
            stars: record.stargazer_count,
            ci_pass_rate: record.ci_pass_rate().map(round_pass_rate),
        })
        .collect();

    SummaryArtifact {
        generated_at,
        repos,
        aggregate: Aggregate {
            repo_count: records.len(),
            total_stars,
            languages,
        },
    }
}

/// Load `snapshot_paths` and summarize them as one record set.
///
/// Fails with [`Error::NoData`] when the combined set is empty.
pub fn summarize(snapshot_paths: &[PathBuf], generated_at: Option<DateTime<Utc>>) -> Result<SummaryArtifact> {
    let records = load_snapshots(snapshot_paths)?;
    if records.is_empty() {
        let sources = snapshot_paths
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::NoData(if sources.is_empty() {
            "no snapshot files".to_string()
        } else {
            sources
        }));
    }

    Ok(summarize_records(&records, generated_at.unwrap_or_else(Utc::now)))
}

/// Write `summary` as pretty JSON, creating parent directories.
pub fn write_summary(summary: &SummaryArtifact, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}

/// Summarize every snapshot in `data_dir` into `output`.
pub fn analyze(data_dir: &Path, output: &Path, generated_at: Option<DateTime<Utc>>) -> Result<SummaryArtifact> {
    let paths = snapshot_paths(data_dir)?;
    let summary = summarize(&paths, generated_at)?;
    write_summary(&summary, output)?;
    log::info!(
        "summarized {} repositories from {} snapshots into {}",
        summary.aggregate.repo_count,
        paths.len(),
        output.display()
    );
    Ok(summary)
}
