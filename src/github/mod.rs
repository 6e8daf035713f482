// src/github/mod.rs
// =============================================================================
// This module handles all traffic with the GitHub API.
//
// Submodules:
// - rest: commit history per file via the paginated REST endpoint
// - graphql: last commit for many files via one aggregate query per batch
// - account: authenticated-user and rate-limit probes
// - raw: raw post content from raw.githubusercontent.com
//
// This file (mod.rs) is the module root. It holds what every submodule
// shares: the endpoint roots, the request headers, the error taxonomy and
// the CommitInfo result shape, plus the strategy front that lets callers
// pick REST or GraphQL without caring about the difference.
// =============================================================================

mod account;
mod graphql;
mod raw;
mod rest;

// Re-export the public API
pub use account::{get_rate_limit, get_user_info};
pub use graphql::fetch_file_commits_via_graphql;
pub use raw::fetch_post_content;
pub use rest::{batch_get_file_commits, get_file_commits, BatchFileCommits};
pub(crate) use rest::commit_info_from_record;

use chrono::{DateTime, Utc};
use reqwest::{header, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// Endpoint roots. The REST and GraphQL roots are the public github.com
// API; raw.githubusercontent.com serves file contents verbatim.
pub(crate) const API_ROOT: &str = "https://api.github.com";
pub(crate) const GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub(crate) const RAW_ROOT: &str = "https://raw.githubusercontent.com";

// GitHub rejects requests without a User-Agent, so every request carries
// this fixed client id
pub(crate) const USER_AGENT: &str = "blog-lens";

// Sentinel strings. Every lookup produces a well-formed CommitInfo even
// when the real data never arrived; listings print these instead of
// crashing or dropping rows.
pub const QUERY_FAILED: &str = "query failed";
pub const UNKNOWN_TIME: &str = "unknown time";
pub const UNKNOWN_AUTHOR: &str = "unknown author";
pub const NO_FILE_DATA: &str = "no file data found";
pub const NO_COMMIT_HISTORY: &str = "no commit history";
pub const NO_COMMIT_MESSAGE: &str = "no commit message";

// Error summaries embedded in a sentinel message are cut at this many
// characters so one long transport error doesn't flood a listing
const ERROR_SUMMARY_CHARS: usize = 30;

// Everything that can go wrong talking to GitHub
//
// 404, 403 and "some other status" are always three distinct cases - the
// caller can tell a missing path from a missing token from a flaky server.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The requested path has no object at the given branch (HTTP 404)
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// HTTP 403 - no token, or the token's scope is insufficient
    #[error("forbidden: authentication failed or the token scope is insufficient")]
    Forbidden,

    /// Any other non-success status
    #[error("failed to fetch {what}: {status}")]
    Status { what: &'static str, status: String },

    /// The user lookup failed; carries the API-supplied reason string
    #[error("could not fetch user info: {status} ({reason})")]
    UserInfo { status: String, reason: String },

    /// The GraphQL endpoint answered, but with errors instead of data
    #[error("graphql error: {message}")]
    GraphQl { message: String },

    /// Network-level failure, or a failure reading/decoding the body
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// Maps a non-success status code onto the taxonomy above
//
// Parameters:
//   what: short noun for the Status message ("commits", "post content", ...)
//   path: the path being looked up; lands in the NotFound message
pub(crate) fn error_for_status(
    what: &'static str,
    path: &str,
    status: StatusCode,
) -> GitHubError {
    match status {
        StatusCode::NOT_FOUND => GitHubError::NotFound {
            path: path.to_string(),
        },
        StatusCode::FORBIDDEN => GitHubError::Forbidden,
        other => GitHubError::Status {
            what,
            status: other.to_string(),
        },
    }
}

// Attaches the headers every API request carries
//
// Accept and User-Agent always; Authorization only when the caller
// supplied a token.
pub(crate) fn apply_headers(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    let request = request
        .header(header::ACCEPT, "application/json")
        .header(header::USER_AGENT, USER_AGENT);

    match token {
        Some(token) => request.header(header::AUTHORIZATION, format!("token {}", token)),
        None => request,
    }
}

// The result of one path's metadata lookup
//
// The fields are display strings on purpose: the listing prints them as-is,
// and sentinel values slot in where real data is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Long-form commit date, or a sentinel ("unknown time", "query failed")
    pub last_modified: String,
    /// Author display name, or "unknown author"
    pub author: String,
    /// Commit message, or a sentinel describing what went wrong
    pub message: String,
    /// Commit identifier when the lookup produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
}

impl CommitInfo {
    /// Whole-batch failure: the query itself never produced data.
    /// The message embeds a truncated summary of the underlying error.
    pub fn query_failed(error: &str) -> Self {
        CommitInfo {
            last_modified: QUERY_FAILED.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            message: format!(
                "{}: {}",
                QUERY_FAILED,
                truncate_chars(error, ERROR_SUMMARY_CHARS)
            ),
            oid: None,
        }
    }

    /// The response had no entry for this path (file missing at that ref)
    pub fn no_file_data() -> Self {
        CommitInfo {
            last_modified: UNKNOWN_TIME.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            message: NO_FILE_DATA.to_string(),
            oid: None,
        }
    }

    /// The path exists but has zero commit records
    pub fn no_commit_history() -> Self {
        CommitInfo {
            last_modified: UNKNOWN_TIME.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            message: NO_COMMIT_HISTORY.to_string(),
            oid: None,
        }
    }

    /// Builds the success shape, falling back to sentinels field by field
    pub fn from_parts(
        date: Option<&str>,
        author: Option<&str>,
        message: Option<&str>,
        oid: Option<String>,
    ) -> Self {
        CommitInfo {
            last_modified: date
                .map(format_commit_date)
                .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            author: author.unwrap_or(UNKNOWN_AUTHOR).to_string(),
            message: message.unwrap_or(NO_COMMIT_MESSAGE).to_string(),
            oid,
        }
    }

    /// True when the lookup produced real commit data (no failure sentinel)
    pub fn is_resolved(&self) -> bool {
        self.last_modified != QUERY_FAILED && self.last_modified != UNKNOWN_TIME
    }
}

// Mapping from post path to its CommitInfo; one entry per requested path
pub type CommitMap = HashMap<String, CommitInfo>;

// Which fetcher implementation the strategy front should run
//
// Both produce the same CommitMap shape; they differ in how many requests
// they make (one per page per path vs one per batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One paginated history request per path, all paths in parallel
    Rest,
    /// One aggregate query per batch of paths, batches in sequence
    GraphQl,
}

// Fetches the latest commit for every path, with the chosen strategy
//
// Parameters:
//   paths: the post paths to annotate
//   strategy: Rest or GraphQl
//   batch_size: paths per aggregate query (GraphQL strategy only)
//
// Returns: CommitMap with exactly one entry per requested path. Failures
// become sentinel entries; this function never errors as a whole.
pub async fn fetch_latest_commits(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
    branch: &str,
    paths: &[String],
    token: Option<&str>,
    strategy: FetchStrategy,
    batch_size: usize,
) -> CommitMap {
    match strategy {
        FetchStrategy::GraphQl => {
            fetch_file_commits_via_graphql(client, owner, repo, branch, paths, token, batch_size)
                .await
        }
        FetchStrategy::Rest => {
            // The listing only needs the newest commit, so per_page=1 keeps
            // each path to a single request
            let entries =
                batch_get_file_commits(client, owner, repo, paths, branch, token, 1).await;

            let mut map = CommitMap::new();
            for entry in entries {
                let info = commit_info_from_batch_entry(&entry);
                map.insert(entry.path, info);
            }
            map
        }
    }
}

// Shapes one per-path REST batch result into the display form
//
// The same sentinel ladder as the GraphQL path: a recorded error becomes
// the failure shape, an empty history its own sentinel, and a real record
// is formatted field by field.
fn commit_info_from_batch_entry(entry: &BatchFileCommits) -> CommitInfo {
    match &entry.error {
        Some(error) => CommitInfo::query_failed(error),
        None => match entry.commits.first() {
            Some(record) => rest::commit_info_from_record(record),
            None => CommitInfo::no_commit_history(),
        },
    }
}

// Formats an RFC 3339 commit timestamp as a long, readable date
//
// Example: "2024-01-02T03:04:05Z" -> "January 2, 2024, 3:04 AM UTC"
// A timestamp that doesn't parse is shown raw rather than dropped.
pub(crate) fn format_commit_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%B %-d, %Y, %-I:%M %p UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

// Cuts a string to at most `limit` characters (not bytes, so multi-byte
// text can't split mid-character)
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

// Parses a repository spec into (owner, repo)
//
// Supported formats:
//   - owner/repo
//   - https://github.com/owner/repo
//   - github.com/owner/repo.git
//
// Example:
//   "rust-lang/rust" -> ("rust-lang", "rust")
pub fn parse_repo_spec(spec: &str) -> Result<(String, String), GitHubError> {
    // Remove common prefixes so a pasted browser URL works too
    let trimmed = spec
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("github.com/");

    let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();

    if parts.len() != 2 {
        return Err(GitHubError::Status {
            what: "repository spec",
            status: format!("expected owner/repo, got '{}'", spec),
        });
    }

    let owner = parts[0].to_string();
    let repo = parts[1].trim_end_matches(".git").to_string();

    Ok((owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_spec() {
        let (owner, repo) = parse_repo_spec("rust-lang/rust").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
    }

    #[test]
    fn test_parse_repo_spec_from_url() {
        let (owner, repo) = parse_repo_spec("https://github.com/user/blog.git").unwrap();
        assert_eq!(owner, "user");
        assert_eq!(repo, "blog");
    }

    #[test]
    fn test_parse_repo_spec_rejects_garbage() {
        assert!(parse_repo_spec("just-a-name").is_err());
        assert!(parse_repo_spec("a/b/c").is_err());
    }

    #[test]
    fn test_error_for_status_distinguishes_causes() {
        let not_found = error_for_status("commits", "posts/a.md", StatusCode::NOT_FOUND);
        assert!(not_found.to_string().contains("posts/a.md"));

        let forbidden = error_for_status("commits", "posts/a.md", StatusCode::FORBIDDEN);
        assert!(forbidden.to_string().contains("forbidden"));

        let other = error_for_status("commits", "posts/a.md", StatusCode::INTERNAL_SERVER_ERROR);
        assert!(other.to_string().contains("500"));
    }

    #[test]
    fn test_query_failed_truncates_long_errors() {
        let long_error = "x".repeat(200);
        let info = CommitInfo::query_failed(&long_error);
        assert_eq!(info.last_modified, QUERY_FAILED);
        assert_eq!(info.author, UNKNOWN_AUTHOR);
        // "query failed: " prefix plus at most 30 summary characters
        assert_eq!(info.message, format!("query failed: {}", "x".repeat(30)));
    }

    #[test]
    fn test_from_parts_fills_sentinels() {
        let info = CommitInfo::from_parts(None, None, None, None);
        assert_eq!(info.last_modified, UNKNOWN_TIME);
        assert_eq!(info.author, UNKNOWN_AUTHOR);
        assert_eq!(info.message, NO_COMMIT_MESSAGE);
        assert_eq!(info.oid, None);
    }

    #[test]
    fn test_format_commit_date_long_form() {
        assert_eq!(
            format_commit_date("2024-01-02T03:04:05Z"),
            "January 2, 2024, 3:04 AM UTC"
        );
    }

    #[test]
    fn test_format_commit_date_keeps_unparseable_input() {
        assert_eq!(format_commit_date("yesterday-ish"), "yesterday-ish");
    }

    #[test]
    fn test_is_resolved() {
        assert!(!CommitInfo::query_failed("boom").is_resolved());
        assert!(!CommitInfo::no_file_data().is_resolved());
        assert!(!CommitInfo::no_commit_history().is_resolved());

        let real = CommitInfo::from_parts(
            Some("2024-01-02T03:04:05Z"),
            Some("Ada"),
            Some("fix typo"),
            Some("abc123".to_string()),
        );
        assert!(real.is_resolved());
    }

    #[test]
    fn test_truncate_chars_is_character_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 30), "short");
    }

    #[test]
    fn test_commit_info_from_batch_entry_covers_every_shape() {
        let errored = BatchFileCommits {
            path: "a.md".to_string(),
            commits: Vec::new(),
            total: 0,
            error: Some("path not found: a.md".to_string()),
        };
        let info = commit_info_from_batch_entry(&errored);
        assert_eq!(info.last_modified, QUERY_FAILED);
        assert!(info.message.contains("path not found"));

        let empty = BatchFileCommits {
            path: "b.md".to_string(),
            commits: Vec::new(),
            total: 0,
            error: None,
        };
        let info = commit_info_from_batch_entry(&empty);
        assert_eq!(info.last_modified, UNKNOWN_TIME);
        assert_eq!(info.message, NO_COMMIT_HISTORY);

        let real = BatchFileCommits {
            path: "c.md".to_string(),
            commits: vec![serde_json::json!({
                "sha": "abc123",
                "commit": {
                    "author": { "name": "Ada", "date": "2024-01-02T03:04:05Z" },
                    "message": "update post"
                }
            })],
            total: 1,
            error: None,
        };
        let info = commit_info_from_batch_entry(&real);
        assert!(info.is_resolved());
        assert_eq!(info.author, "Ada");
        assert_eq!(info.oid.as_deref(), Some("abc123"));
    }
}
