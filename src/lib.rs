//! # Braggard
//!
//! `braggard` builds a profile dashboard from the repositories a GitHub
//! account owns. It collects repository metadata through the GitHub GraphQL
//! API, aggregates it into summary statistics and renders a static report
//! that can be published to a hosting branch.
//!
//! ## Stages
//!
//! - **collect**: page through the account's repositories, filter them,
//!   enrich each one with commit counts and CI conclusions, write a snapshot
//! - **analyze**: merge snapshots into a `summary.json`
//! - **render**: turn the summary into HTML or Markdown
//! - **deploy**: push the rendered report to `gh-pages`
//!
//! ## Example
//!
//! ```no_run
//! use braggard::analysis;
//! use std::path::Path;
//!
//! let summary = analysis::analyze(Path::new("data"), Path::new("summary.json"), None)?;
//! println!("{} repositories, {} stars", summary.aggregate.repo_count, summary.aggregate.total_stars);
//! # Ok::<(), braggard::Error>(())
//! ```

pub mod analysis;
pub mod collection;
pub mod config;
pub mod error;
pub mod plotting;
pub mod publish;
pub mod render;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use types::{RepositoryRecord, SummaryArtifact};
