//! Cursor pagination over the owned-repository listing.

use serde::Deserialize;
use serde_json::{json, Value};

use super::queries::{PAGE_SIZE, REPOSITORY_LISTING};
use super::transport::{Transport, Variables};
use crate::error::{Error, Result};
use crate::types::RepositoryRecord;

#[derive(Deserialize)]
struct ListingData {
    user: Option<UserNode>,
}

#[derive(Deserialize)]
struct UserNode {
    repositories: RepositoryConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<RepositoryNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    description: Option<String>,
    #[serde(default)]
    stargazer_count: u64,
    #[serde(default)]
    fork_count: u64,
    primary_language: Option<LanguageNode>,
    #[serde(default)]
    is_private: bool,
    pushed_at: Option<String>,
}

#[derive(Deserialize)]
struct LanguageNode {
    name: String,
}

impl From<RepositoryNode> for RepositoryRecord {
    fn from(node: RepositoryNode) -> Self {
        Self {
            name: node.name,
            description: node.description,
            stargazer_count: node.stargazer_count,
            fork_count: node.fork_count,
            primary_language: node.primary_language.map(|language| language.name),
            is_private: node.is_private,
            pushed_at: node.pushed_at,
            commit_count: None,
            ci_statuses: None,
        }
    }
}

/// One page of the repository listing.
struct Page {
    records: Vec<RepositoryRecord>,
    next_cursor: Option<String>,
}

fn parse_page(login: &str, data: Value) -> Result<Page> {
    let listing: ListingData = serde_json::from_value(data)
        .map_err(|e| Error::MalformedResponse(format!("repository listing: {}", e)))?;
    let connection = listing
        .user
        .ok_or_else(|| Error::MalformedResponse(format!("user '{}' not found", login)))?
        .repositories;

    let mut records = Vec::with_capacity(connection.nodes.len());
    for node in connection.nodes.into_iter().flatten() {
        if node.name.is_empty() {
            return Err(Error::MalformedResponse(
                "repository without a name".to_string(),
            ));
        }
        records.push(RepositoryRecord::from(node));
    }

    let next_cursor = match (connection.page_info.has_next_page, connection.page_info.end_cursor) {
        (false, _) => None,
        (true, Some(cursor)) => Some(cursor),
        (true, None) => {
            return Err(Error::MalformedResponse(
                "hasNextPage is set but endCursor is missing".to_string(),
            ))
        }
    };

    Ok(Page {
        records,
        next_cursor,
    })
}

/// Fetch every repository owned by `login`, most recently pushed first.
///
/// Pages are requested one after another, each with the previous page's end
/// cursor, until the API reports no further page. There is no page cap. Any
/// failure discards the pages collected so far.
pub fn fetch_all_repositories<T>(transport: &T, login: &str) -> Result<Vec<RepositoryRecord>>
where
    T: Transport + ?Sized,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_number = 0usize;

    loop {
        let mut variables = Variables::new();
        variables.insert("login".to_string(), json!(login));
        variables.insert("first".to_string(), json!(PAGE_SIZE));
        variables.insert("after".to_string(), json!(cursor));

        let data = transport.execute(REPOSITORY_LISTING, &variables)?;
        let page = parse_page(login, data)?;
        page_number += 1;
        log::debug!(
            "repository page {} for {}: {} records",
            page_number,
            login,
            page.records.len()
        );

        records.extend(page.records);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(records)
}
