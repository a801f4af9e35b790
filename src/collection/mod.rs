//! Collection stage: list repositories, narrow them down, enrich the survivors
//! and persist a snapshot.

pub mod enricher;
pub mod filter;
pub mod paginator;
pub mod queries;
pub mod snapshot;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use enricher::{EnrichmentReport, Enricher, HistoryWindow, Outcome, QueryKind};
pub use paginator::fetch_all_repositories;
pub use transport::{HttpTransport, Transport, Variables};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::spawn_blocking;

use crate::config::Config;
use crate::error::{Error, Result};

/// Settings given on the command line; `None` falls back to the config file.
#[derive(Debug, Clone, Default)]
pub struct CollectOverrides {
    pub login: Option<String>,
    pub include_private: Option<bool>,
    pub since: Option<String>,
    pub full_history: bool,
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved settings for one collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectOptions {
    pub login: String,
    pub include_private: bool,
    pub since: Option<String>,
    pub history: HistoryWindow,
    pub ci_window: u32,
    pub data_dir: PathBuf,
    pub concurrency: Option<usize>,
}

impl CollectOptions {
    pub fn resolve(config: &Config, overrides: CollectOverrides) -> Result<Self> {
        let login = overrides
            .login
            .filter(|login| !login.trim().is_empty())
            .or_else(|| config.handle().map(str::to_string))
            .ok_or_else(|| Error::Configuration("user.handle".to_string()))?;

        let since = overrides
            .since
            .as_deref()
            .map(|raw| {
                filter::normalize_since(raw).ok_or_else(|| Error::Configuration("since".to_string()))
            })
            .transpose()?;

        let history = if overrides.full_history {
            HistoryWindow::Full
        } else {
            HistoryWindow::Years(config.metrics.commit_history_years)
        };

        Ok(Self {
            login,
            include_private: overrides
                .include_private
                .unwrap_or(config.user.include_private),
            since,
            history,
            ci_window: config.metrics.ci_pass_window,
            data_dir: overrides
                .data_dir
                .unwrap_or_else(|| config.paths.data_dir.clone()),
            concurrency: config.api.concurrency,
        })
    }
}

/// What one collection run produced.
#[derive(Debug, Clone)]
pub struct CollectReport {
    pub snapshot: PathBuf,
    pub listed: usize,
    pub written: usize,
    pub enrichment: EnrichmentReport,
}

/// Run the collection pipeline and write one snapshot.
///
/// Listing failures are fatal; secondary query failures only show up in the
/// returned report.
pub async fn collect<T: Transport>(transport: Arc<T>, options: &CollectOptions) -> Result<CollectReport> {
    let records = {
        let transport = Arc::clone(&transport);
        let login = options.login.clone();
        spawn_blocking(move || fetch_all_repositories(transport.as_ref(), &login))
            .await
            .map_err(|e| Error::transport("repository listing task aborted", e))??
    };
    let listed = records.len();
    log::info!("listed {} repositories for {}", listed, options.login);

    let mut records = filter::apply(records, options.since.as_deref(), options.include_private);
    log::info!("{} repositories left after filtering", records.len());

    let mut enricher = Enricher::new(transport, options.login.clone())
        .with_history(options.history)
        .with_ci_window(options.ci_window);
    if let Some(concurrency) = options.concurrency {
        enricher = enricher.with_concurrency(concurrency);
    }
    let enrichment = enricher.augment(&mut records).await;
    if !enrichment.is_clean() {
        log::warn!(
            "{} secondary queries fell back to defaults",
            enrichment.degraded.len()
        );
    }

    let snapshot = snapshot::write(&records, &options.data_dir, &options.login)?;

    Ok(CollectReport {
        snapshot,
        listed,
        written: records.len(),
        enrichment,
    })
}
