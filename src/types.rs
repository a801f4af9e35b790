//! # Common Types
//!
//! This module contains the records collected from the GitHub GraphQL API and
//! the summary produced by aggregating them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The check-suite conclusion GitHub reports for a passing CI run.
pub const SUCCESS_CONCLUSION: &str = "SUCCESS";

/// One repository owned by the collected account.
///
/// Records are built from one page of the repository listing, annotated in
/// place by the enricher and then persisted. Deserialization also accepts the
/// provider's camelCase field names so that raw API dumps can be aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Repository name, unique within the account
    pub name: String,
    /// Free-form description, if the owner set one
    #[serde(default)]
    pub description: Option<String>,
    /// Number of stargazers
    #[serde(default, alias = "stargazerCount")]
    pub stargazer_count: u64,
    /// Number of forks
    #[serde(default, alias = "forkCount")]
    pub fork_count: u64,
    /// Name of the primary language detected by the provider
    #[serde(
        default,
        alias = "primaryLanguage",
        deserialize_with = "deserialize_language"
    )]
    pub primary_language: Option<String>,
    /// Whether the repository is private
    #[serde(default, alias = "isPrivate")]
    pub is_private: bool,
    /// Last push time as an ISO 8601 UTC string
    #[serde(default, alias = "pushedAt")]
    pub pushed_at: Option<String>,
    /// Commits on the default branch inside the history window
    #[serde(default, alias = "commitCount", skip_serializing_if = "Option::is_none")]
    pub commit_count: Option<u64>,
    /// Recent check-suite conclusions, most recent first
    #[serde(default, alias = "ciStatuses", skip_serializing_if = "Option::is_none")]
    pub ci_statuses: Option<Vec<String>>,
}

impl RepositoryRecord {
    /// Create an unenriched record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            stargazer_count: 0,
            fork_count: 0,
            primary_language: None,
            is_private: false,
            pushed_at: None,
            commit_count: None,
            ci_statuses: None,
        }
    }

    /// Whether the enricher has populated this record.
    pub fn is_enriched(&self) -> bool {
        self.commit_count.is_some() && self.ci_statuses.is_some()
    }

    /// Fraction of CI conclusions equal to [`SUCCESS_CONCLUSION`], or `None`
    /// when there are no conclusions to divide by.
    pub fn ci_pass_rate(&self) -> Option<f64> {
        let statuses = self.ci_statuses.as_deref().unwrap_or_default();
        if statuses.is_empty() {
            return None;
        }
        let successes = statuses
            .iter()
            .filter(|status| status.as_str() == SUCCESS_CONCLUSION)
            .count();
        Some(successes as f64 / statuses.len() as f64)
    }
}

/// Accepts a language either as a plain string or as the provider's
/// `{"name": ...}` object.
fn deserialize_language<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LanguageField {
        Name(String),
        Object { name: Option<String> },
    }

    let field = Option::<LanguageField>::deserialize(deserializer)?;
    Ok(match field {
        Some(LanguageField::Name(name)) => Some(name),
        Some(LanguageField::Object { name }) => name,
        None => None,
    }
    .filter(|name| !name.is_empty()))
}

/// Per-repository line of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub stars: u64,
    /// Present only when the source record had at least one CI status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_pass_rate: Option<f64>,
}

/// Cross-repository totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Total records across all loaded snapshots
    pub repo_count: usize,
    /// Sum of stargazer counts
    pub total_stars: u64,
    /// Records per primary language; records without a language are left out
    pub languages: BTreeMap<String, usize>,
}

/// The artifact written by one aggregation run and consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub generated_at: DateTime<Utc>,
    pub repos: Vec<RepoSummary>,
    pub aggregate: Aggregate,
}
