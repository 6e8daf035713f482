// src/github/rest.rs
// =============================================================================
// This module fetches commit history for files via the GitHub REST API.
//
// Key functionality:
// - get_file_commits: the single newest commit for one path
// - batch_get_file_commits: full history for many paths, with pagination
// - Percent-encoding of path segments so spaces and non-ASCII names work
// - Per-path failure isolation: one broken path never sinks the others
//
// Endpoint:
//   GET /repos/{owner}/{repo}/commits?path=...&ref=...&per_page=...&page=...
//
// Pagination ends when a page comes back empty or the Link response header
// no longer advertises a rel="next" page.
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - join_all: Launch every path's work together, await them jointly
// - serde_json::Value: Commit records pass through exactly as received
// =============================================================================

use futures::future::join_all;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;

use super::{apply_headers, error_for_status, CommitInfo, GitHubError, API_ROOT};

// The API accepts page sizes in this range; anything outside is clamped
const MIN_PER_PAGE: usize = 1;
const MAX_PER_PAGE: usize = 500;

// The outcome of fetching one path's full history
//
// `commits` holds the raw commit records exactly as the API returned them.
// On failure `commits` is empty, `total` is 0 and `error` carries the
// message; the other paths in the same batch are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFileCommits {
    pub path: String,
    pub commits: Vec<Value>,
    pub total: usize,
    pub error: Option<String>,
}

// One fetched page plus whether the API advertised another one
struct CommitPage {
    records: Vec<Value>,
    has_next: bool,
}

// Fetches the newest commit touching one path
//
// Parameters:
//   path: repo-relative file path (encoded per segment before the request)
//   branch: ref the history is read from
//   token: optional API token
//
// Returns: at most one raw commit record, newest first. Unlike the batch
// call, errors propagate to the caller here - a single lookup has no
// sibling results to protect.
pub async fn get_file_commits(
    client: &Client,
    owner: &str,
    repo: &str,
    path: &str,
    branch: &str,
    token: Option<&str>,
) -> Result<Vec<Value>, GitHubError> {
    let page = fetch_commit_page(client, owner, repo, path, branch, token, 1, 1).await?;
    Ok(page.records)
}

// Fetches the full commit history for every path
//
// All paths are launched together and awaited jointly; within one path the
// pages go strictly in sequence, because whether page N+1 exists is only
// known from page N's response.
//
// Parameters:
//   paths: the file paths to look up
//   per_page: records per page, clamped to [1, 500]
//
// Returns: one BatchFileCommits per input path, in input order. This
// function never errors as a whole - a failed path is recorded in its own
// entry and everything else proceeds.
pub async fn batch_get_file_commits(
    client: &Client,
    owner: &str,
    repo: &str,
    paths: &[String],
    branch: &str,
    token: Option<&str>,
    per_page: usize,
) -> Vec<BatchFileCommits> {
    let per_page = per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE);

    let tasks = paths
        .iter()
        .map(|path| fetch_full_history(client, owner, repo, path, branch, token, per_page));

    join_all(tasks).await
}

// Pages through one path's history until it runs dry
//
// Any error (HTTP status, network, decode) is caught here and converted
// into the error shape of the result - it never escapes to the caller.
async fn fetch_full_history(
    client: &Client,
    owner: &str,
    repo: &str,
    path: &str,
    branch: &str,
    token: Option<&str>,
    per_page: usize,
) -> BatchFileCommits {
    let mut commits = Vec::new();
    let mut page = 1;

    loop {
        match fetch_commit_page(client, owner, repo, path, branch, token, per_page, page).await {
            Ok(result) => {
                let count = result.records.len();
                commits.extend(result.records);

                // Stop on an empty page or when no next page is advertised
                if count == 0 || !result.has_next {
                    break;
                }
                page += 1;
            }
            Err(error) => {
                return BatchFileCommits {
                    path: path.to_string(),
                    commits: Vec::new(),
                    total: 0,
                    error: Some(error.to_string()),
                };
            }
        }
    }

    BatchFileCommits {
        path: path.to_string(),
        total: commits.len(),
        commits,
        error: None,
    }
}

// Fetches one page of commit history for a path
async fn fetch_commit_page(
    client: &Client,
    owner: &str,
    repo: &str,
    path: &str,
    branch: &str,
    token: Option<&str>,
    per_page: usize,
    page: usize,
) -> Result<CommitPage, GitHubError> {
    let url = format!(
        "{}/repos/{}/{}/commits?path={}&ref={}&per_page={}&page={}",
        API_ROOT,
        owner,
        repo,
        encode_path(path),
        branch,
        per_page,
        page
    );
    log::debug!("GET {}", url);

    let response = apply_headers(client.get(&url), token).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(error_for_status("commits", path, status));
    }

    // Read the Link header before the body consumes the response
    let has_next = has_next_page(
        response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok()),
    );

    let records: Vec<Value> = response.json().await?;
    Ok(CommitPage { records, has_next })
}

// Checks a Link response header for a rel="next" relation
//
// The header looks like:
//   <https://api.github.com/...&page=2>; rel="next", <...>; rel="last"
fn has_next_page(link_header: Option<&str>) -> bool {
    match link_header {
        Some(header) => header
            .split(',')
            .any(|relation| relation.contains("rel=\"next\"")),
        None => false,
    }
}

// Percent-encodes a repo-relative path for use in a URL
//
// Each '/'-separated segment is encoded on its own and the segments are
// rejoined with '/'. That keeps the path structure readable while spaces
// and non-ASCII characters become %XX escapes.
//
// Example: "my posts/旅行.md" -> "my%20posts/%E6%97%85%E8%A1%8C.md"
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

// Encodes one path segment, keeping the RFC 3986 unreserved set literal
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

// Shapes one raw REST commit record into the display form
//
// The interesting fields live under "commit" (author name/date, message);
// the identifier is the top-level "sha". Missing fields fall back to the
// usual sentinels.
pub(crate) fn commit_info_from_record(record: &Value) -> CommitInfo {
    let detail = &record["commit"];
    CommitInfo::from_parts(
        detail["author"]["date"].as_str(),
        detail["author"]["name"].as_str(),
        detail["message"].as_str(),
        record["sha"].as_str().map(str::to_string),
    )
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why join_all instead of a loop of .await?
//    - A loop would fetch path after path, one at a time
//    - join_all starts every path's future at once and waits for all of
//      them together, so the slowest path sets the pace, not the sum
//
// 2. Why does fetch_full_history return a struct instead of a Result?
//    - The batch contract is "one entry per path, always"
//    - Converting the error into a field keeps a broken path from taking
//      its siblings down with it
//
// 3. What is serde_json::Value?
//    - A dynamically-typed JSON value (object, array, string, ...)
//    - Indexing with ["key"] never panics - missing keys yield Null
//    - We use it so commit records pass through without reshaping
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("posts/hello.md"), "posts/hello.md");
    }

    #[test]
    fn test_encode_path_escapes_spaces_and_unicode() {
        assert_eq!(
            encode_path("my posts/旅行.md"),
            "my%20posts/%E6%97%85%E8%A1%8C.md"
        );
    }

    #[test]
    fn test_encode_path_escapes_reserved_characters() {
        assert_eq!(encode_path("a&b/c?d.md"), "a%26b/c%3Fd.md");
    }

    #[test]
    fn test_has_next_page() {
        let header = "<https://api.github.com/x?page=2>; rel=\"next\", <https://api.github.com/x?page=9>; rel=\"last\"";
        assert!(has_next_page(Some(header)));

        let last_only = "<https://api.github.com/x?page=9>; rel=\"last\"";
        assert!(!has_next_page(Some(last_only)));

        assert!(!has_next_page(None));
    }

    #[test]
    fn test_commit_info_from_record() {
        let record = json!({
            "sha": "abc123",
            "commit": {
                "author": { "name": "Ada", "date": "2024-01-02T03:04:05Z" },
                "message": "update post"
            }
        });
        let info = commit_info_from_record(&record);
        assert_eq!(info.author, "Ada");
        assert_eq!(info.message, "update post");
        assert_eq!(info.oid.as_deref(), Some("abc123"));
        assert_eq!(info.last_modified, "January 2, 2024, 3:04 AM UTC");
    }

    #[test]
    fn test_commit_info_from_record_with_missing_fields() {
        let record = json!({ "sha": "abc123", "commit": {} });
        let info = commit_info_from_record(&record);
        assert_eq!(info.author, super::super::UNKNOWN_AUTHOR);
        assert_eq!(info.message, super::super::NO_COMMIT_MESSAGE);
        assert_eq!(info.last_modified, super::super::UNKNOWN_TIME);
    }
}
