use chrono::{DateTime, Months, SecondsFormat, Utc};
use futures::future::join_all;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{spawn_blocking, JoinError, JoinHandle};

use super::queries::{CHECK_SUITE_CONCLUSIONS, CHECK_SUITE_LIMIT, COMMIT_HISTORY_COUNT};
use super::transport::{Transport, Variables};
use crate::error::{Error, Result};
use crate::types::RepositoryRecord;

/// How far back commit counts reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    /// Count the whole default-branch history
    Full,
    /// Count commits pushed within the last `n` years
    Years(u32),
}

impl HistoryWindow {
    /// The earliest commit time to count, or `None` for the full history.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            HistoryWindow::Full => None,
            HistoryWindow::Years(years) => now
                .checked_sub_months(Months::new(years.saturating_mul(12)))
                .or(Some(DateTime::<Utc>::MIN_UTC)),
        }
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        HistoryWindow::Years(3)
    }
}

/// The two secondary queries issued per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    CommitCount,
    CiStatuses,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::CommitCount => write!(f, "commit count"),
            QueryKind::CiStatuses => write!(f, "CI statuses"),
        }
    }
}

/// Result of one secondary query after the degrade-to-default policy.
#[derive(Debug)]
pub enum Outcome<T> {
    Fetched(T),
    /// The query failed; `fallback` is the value written to the record
    Degraded { fallback: T, cause: Error },
}

impl<T: Default> Outcome<T> {
    fn from_task(joined: std::result::Result<Result<T>, JoinError>) -> Self {
        match joined {
            Ok(Ok(value)) => Outcome::Fetched(value),
            Ok(Err(cause)) => Outcome::Degraded {
                fallback: T::default(),
                cause,
            },
            Err(join_error) => Outcome::Degraded {
                fallback: T::default(),
                cause: Error::transport("enrichment task aborted", join_error),
            },
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    /// Split into the value to store and the failure, if any.
    pub fn into_parts(self) -> (T, Option<Error>) {
        match self {
            Outcome::Fetched(value) => (value, None),
            Outcome::Degraded { fallback, cause } => (fallback, Some(cause)),
        }
    }
}

/// A secondary query that fell back to its default.
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub repository: String,
    pub query: QueryKind,
    pub cause: String,
}

/// What happened during one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub degraded: Vec<Degradation>,
}

impl EnrichmentReport {
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Default number of secondary queries in flight at once.
pub fn default_concurrency() -> usize {
    (num_cpus::get() * 2).max(4)
}

/// Count commits on the default branch of `login/repo`, optionally since `since`.
///
/// A repository without a default branch (empty repository) counts as zero.
pub fn fetch_commit_count<T>(
    transport: &T,
    login: &str,
    repo: &str,
    since: Option<DateTime<Utc>>,
) -> Result<u64>
where
    T: Transport + ?Sized,
{
    let mut variables = Variables::new();
    variables.insert("login".to_string(), json!(login));
    variables.insert("repo".to_string(), json!(repo));
    variables.insert(
        "since".to_string(),
        json!(since.map(|cutoff| cutoff.to_rfc3339_opts(SecondsFormat::Secs, true))),
    );

    let data = transport.execute(COMMIT_HISTORY_COUNT, &variables)?;
    let branch = default_branch(&data, repo)?;
    Ok(branch
        .and_then(|branch| branch.pointer("/target/history/totalCount"))
        .and_then(Value::as_u64)
        .unwrap_or(0))
}

/// Recent check-suite conclusions for `login/repo`, most recent first.
///
/// Suites without a conclusion (still running) are skipped and at most
/// `limit` conclusions are returned.
pub fn fetch_ci_statuses<T>(
    transport: &T,
    login: &str,
    repo: &str,
    limit: usize,
) -> Result<Vec<String>>
where
    T: Transport + ?Sized,
{
    let mut variables = Variables::new();
    variables.insert("login".to_string(), json!(login));
    variables.insert("repo".to_string(), json!(repo));
    variables.insert("limit".to_string(), json!(limit));

    let data = transport.execute(CHECK_SUITE_CONCLUSIONS, &variables)?;
    let Some(commits) = default_branch(&data, repo)?
        .and_then(|branch| branch.pointer("/target/history/nodes"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    Ok(commits
        .iter()
        .filter_map(|commit| commit.pointer("/checkSuites/nodes").and_then(Value::as_array))
        .flatten()
        .filter_map(|suite| suite.get("conclusion").and_then(Value::as_str))
        .map(str::to_string)
        .take(limit)
        .collect())
}

fn default_branch<'a>(data: &'a Value, repo: &str) -> Result<Option<&'a Value>> {
    let repository = data
        .get("repository")
        .filter(|repository| !repository.is_null())
        .ok_or_else(|| Error::MalformedResponse(format!("repository '{}' not found", repo)))?;
    Ok(repository
        .get("defaultBranchRef")
        .filter(|branch| !branch.is_null()))
}

/// Annotates records with commit counts and CI conclusions.
///
/// Every secondary query runs as its own task on a bounded pool. A failing
/// query never aborts the pass: the record gets the default value and the
/// failure is listed in the returned [`EnrichmentReport`].
pub struct Enricher<T: Transport> {
    transport: Arc<T>,
    login: String,
    history: HistoryWindow,
    ci_limit: usize,
    max_tasks: usize,
}

impl<T: Transport> Enricher<T> {
    pub fn new(transport: Arc<T>, login: impl Into<String>) -> Self {
        Self {
            transport,
            login: login.into(),
            history: HistoryWindow::default(),
            ci_limit: CHECK_SUITE_LIMIT,
            max_tasks: default_concurrency(),
        }
    }

    pub fn with_history(mut self, history: HistoryWindow) -> Self {
        self.history = history;
        self
    }

    /// Number of conclusions to request, clamped to `1..=20`.
    pub fn with_ci_window(mut self, window: u32) -> Self {
        self.ci_limit = (window as usize).clamp(1, CHECK_SUITE_LIMIT);
        self
    }

    pub fn with_concurrency(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks.max(1);
        self
    }

    /// Enrich `records` in place, keeping their order.
    pub async fn augment(&self, records: &mut [RepositoryRecord]) -> EnrichmentReport {
        let since = self.history.cutoff(Utc::now());
        let semaphore = Arc::new(Semaphore::new(self.max_tasks));

        let mut commit_tasks = Vec::with_capacity(records.len());
        let mut ci_tasks = Vec::with_capacity(records.len());

        for record in records.iter() {
            let transport = Arc::clone(&self.transport);
            let login = self.login.clone();
            let repo = record.name.clone();
            commit_tasks.push(spawn_query(Arc::clone(&semaphore), move || {
                fetch_commit_count(transport.as_ref(), &login, &repo, since)
            }));

            let transport = Arc::clone(&self.transport);
            let login = self.login.clone();
            let repo = record.name.clone();
            let limit = self.ci_limit;
            ci_tasks.push(spawn_query(Arc::clone(&semaphore), move || {
                fetch_ci_statuses(transport.as_ref(), &login, &repo, limit)
            }));
        }

        let commit_outcomes = join_all(commit_tasks).await.into_iter().map(Outcome::from_task);
        let ci_outcomes = join_all(ci_tasks).await.into_iter().map(Outcome::from_task);

        let mut report = EnrichmentReport::default();
        for ((record, commits), statuses) in records.iter_mut().zip(commit_outcomes).zip(ci_outcomes) {
            let (commit_count, commit_failure) = commits.into_parts();
            let (ci_statuses, ci_failure) = statuses.into_parts();
            record.commit_count = Some(commit_count);
            record.ci_statuses = Some(ci_statuses);

            for (query, failure) in [
                (QueryKind::CommitCount, commit_failure),
                (QueryKind::CiStatuses, ci_failure),
            ] {
                if let Some(cause) = failure {
                    log::warn!("{} for {} degraded to default: {}", query, record.name, cause);
                    report.degraded.push(Degradation {
                        repository: record.name.clone(),
                        query,
                        cause: cause.to_string(),
                    });
                }
            }
            report.enriched += 1;
        }

        report
    }
}

/// Run one blocking query on the pool once a permit is free.
fn spawn_query<V, F>(semaphore: Arc<Semaphore>, query: F) -> JoinHandle<Result<V>>
where
    V: Send + 'static,
    F: FnOnce() -> Result<V> + Send + 'static,
{
    tokio::spawn(async move {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| Error::transport("enrichment pool closed", e))?;
        spawn_blocking(query)
            .await
            .map_err(|e| Error::transport("enrichment task aborted", e))?
    })
}
