//! GraphQL documents sent to the GitHub API.

/// Records requested per page of the repository listing.
pub const PAGE_SIZE: u32 = 100;

/// Most check-suite conclusions kept per repository.
pub const CHECK_SUITE_LIMIT: usize = 20;

/// Owned repositories, most recently pushed first.
pub const REPOSITORY_LISTING: &str = r#"
query($login: String!, $first: Int!, $after: String) {
  user(login: $login) {
    repositories(
      first: $first
      after: $after
      ownerAffiliations: OWNER
      orderBy: { field: PUSHED_AT, direction: DESC }
    ) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        name
        description
        stargazerCount
        forkCount
        primaryLanguage {
          name
        }
        isPrivate
        pushedAt
      }
    }
  }
}
"#;

/// Commits on the default branch, optionally bounded by `$since`.
pub const COMMIT_HISTORY_COUNT: &str = r#"
query($login: String!, $repo: String!, $since: GitTimestamp) {
  repository(owner: $login, name: $repo) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(since: $since) {
            totalCount
          }
        }
      }
    }
  }
}
"#;

/// Check suites attached to the latest `$limit` commits of the default branch.
pub const CHECK_SUITE_CONCLUSIONS: &str = r#"
query($login: String!, $repo: String!, $limit: Int!) {
  repository(owner: $login, name: $repo) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: $limit) {
            nodes {
              checkSuites(first: 10) {
                nodes {
                  conclusion
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;
