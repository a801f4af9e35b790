//! Pure predicates applied to the repository listing before enrichment.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::types::RepositoryRecord;

/// Parse an ISO 8601 time or a bare `YYYY-MM-DD` date and render it as a
/// UTC `Z` timestamp, the form `pushed_at` uses.
///
/// Returns `None` for anything that is not a valid time.
pub fn normalize_since(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let instant = DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })?;
    Some(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Keep the records that pass the visibility and recency predicates.
///
/// `since` is normalized to UTC and then compared lexicographically against
/// `pushed_at`; both are zero-padded UTC strings at that point, so this
/// matches chronological order. A record without `pushed_at` never passes a
/// `since` bound.
pub fn apply(
    records: Vec<RepositoryRecord>,
    since: Option<&str>,
    include_private: bool,
) -> Vec<RepositoryRecord> {
    let since = since.map(|raw| normalize_since(raw).unwrap_or_else(|| raw.to_string()));
    records
        .into_iter()
        .filter(|record| include_private || !record.is_private)
        .filter(|record| match since.as_deref() {
            Some(since) => record
                .pushed_at
                .as_deref()
                .is_some_and(|pushed_at| pushed_at >= since),
            None => true,
        })
        .collect()
}
