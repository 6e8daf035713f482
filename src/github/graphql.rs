// src/github/graphql.rs
// =============================================================================
// This module fetches last-commit metadata for many files at once via the
// GitHub GraphQL API.
//
// How it works:
// 1. Partition the path list into batches of at most batch_size
// 2. For each batch, synthesize ONE aggregate query: every path becomes an
//    aliased selection of the blob at "branch:path" with its single newest
//    history entry
// 3. Run the batches strictly one after another (a single in-flight query
//    bounds the load we put on the API)
// 4. Resolve each path's slice of the response into a CommitInfo
//
// Failure isolation works at batch granularity here: when a batch's call
// fails, every path in that batch gets the "query failed" sentinel and the
// remaining batches still run.
//
// Expected response shape:
//   { "data": { "repository": {
//       "f0_0": { "latestCommit": { "nodes": [ { "committedDate", "message",
//                 "oid", "author": { "name" } } ] } },
//       ... } } }
// =============================================================================

use reqwest::Client;
use serde_json::{json, Value};

use super::{apply_headers, CommitInfo, CommitMap, GitHubError, GRAPHQL_URL};

// Fetches the newest commit for every path, batch by batch
//
// Parameters:
//   file_paths: repo-relative paths to look up
//   batch_size: paths per aggregate query (0 is treated as 1)
//
// Returns: CommitMap with exactly one entry per input path. Never errors
// as a whole - a failed batch is converted into sentinel entries for its
// own paths only.
pub async fn fetch_file_commits_via_graphql(
    client: &Client,
    owner: &str,
    repo: &str,
    branch: &str,
    file_paths: &[String],
    token: Option<&str>,
    batch_size: usize,
) -> CommitMap {
    let mut map = CommitMap::new();

    // Batches run in sequence, never pipelined against each other
    for (batch_index, batch) in partition_batches(file_paths, batch_size)
        .into_iter()
        .enumerate()
    {
        let outcome = run_batch_query(client, owner, repo, branch, batch_index, batch, token).await;
        merge_batch_outcome(&mut map, batch_index, batch, outcome);
    }

    map
}

// Splits the path list into consecutive slices of at most batch_size
//
// The slices cover the input exactly once, in order. A batch_size of 0
// would never terminate, so it is bumped to 1.
pub(crate) fn partition_batches(paths: &[String], batch_size: usize) -> Vec<&[String]> {
    paths.chunks(batch_size.max(1)).collect()
}

// Sends one aggregate query and extracts the repository object
//
// A transport failure, a non-success status, a GraphQL-level error list or
// a missing repository object all count as "the batch call failed".
async fn run_batch_query(
    client: &Client,
    owner: &str,
    repo: &str,
    branch: &str,
    batch_index: usize,
    batch: &[String],
    token: Option<&str>,
) -> Result<Value, GitHubError> {
    let query = build_batch_query(owner, repo, branch, batch_index, batch);
    log::debug!(
        "POST {} (batch {}, {} path(s))",
        GRAPHQL_URL,
        batch_index,
        batch.len()
    );

    let response = apply_headers(client.post(GRAPHQL_URL), token)
        .json(&json!({ "query": query }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(super::error_for_status("graphql query", "", status));
    }

    let body: Value = response.json().await?;

    // GraphQL reports errors in-band with a 200 status. When no repository
    // object came back there is nothing to resolve paths against, so the
    // whole batch counts as failed.
    let repository = body["data"]["repository"].clone();
    if repository.is_null() {
        let message = body["errors"][0]["message"]
            .as_str()
            .unwrap_or("no repository data in response")
            .to_string();
        return Err(GitHubError::GraphQl { message });
    }

    Ok(repository)
}

// Folds one batch's outcome into the accumulating map
//
// Success: each path resolves against its own aliased field. Failure:
// every path in this batch (and only this batch) gets the failure
// sentinel carrying a summary of the error.
fn merge_batch_outcome(
    map: &mut CommitMap,
    batch_index: usize,
    batch: &[String],
    outcome: Result<Value, GitHubError>,
) {
    match outcome {
        Ok(repository) => {
            for (path, info) in resolve_batch(batch_index, batch, &repository) {
                map.insert(path, info);
            }
        }
        Err(error) => {
            let summary = error.to_string();
            for path in batch {
                map.insert(path.clone(), CommitInfo::query_failed(&summary));
            }
        }
    }
}

// Resolves every path in a batch against the repository object
//
// Per path, in order of preference:
//   - aliased field absent or null  -> "no file data found"
//   - history nodes empty           -> "no commit history"
//   - otherwise                     -> real data, field-level fallbacks
fn resolve_batch(
    batch_index: usize,
    batch: &[String],
    repository: &Value,
) -> Vec<(String, CommitInfo)> {
    batch
        .iter()
        .enumerate()
        .map(|(position, path)| {
            let alias = field_alias(batch_index, position);
            let entry = &repository[alias.as_str()];

            let info = if entry.is_null() {
                CommitInfo::no_file_data()
            } else {
                match entry["latestCommit"]["nodes"]
                    .as_array()
                    .and_then(|nodes| nodes.first())
                {
                    None => CommitInfo::no_commit_history(),
                    Some(node) => CommitInfo::from_parts(
                        node["committedDate"].as_str(),
                        node["author"]["name"].as_str(),
                        node["message"].as_str(),
                        node["oid"].as_str().map(str::to_string),
                    ),
                }
            };

            (path.clone(), info)
        })
        .collect()
}

// Builds the aggregate query for one batch
//
// Every path gets its own aliased selection so the fields can't collide
// inside the single query document.
fn build_batch_query(
    owner: &str,
    repo: &str,
    branch: &str,
    batch_index: usize,
    batch: &[String],
) -> String {
    let mut selections = String::new();

    for (position, path) in batch.iter().enumerate() {
        let expression = escape_graphql_string(&format!("{}:{}", branch, path));
        selections.push_str(&format!(
            "{}: object(expression: \"{}\") {{ ... on Blob {{ latestCommit: history(first: 1) {{ nodes {{ committedDate message oid author {{ name }} }} }} }} }} ",
            field_alias(batch_index, position),
            expression
        ));
    }

    format!(
        "query {{ repository(owner: \"{}\", name: \"{}\") {{ {}}} }}",
        escape_graphql_string(owner),
        escape_graphql_string(repo),
        selections
    )
}

// Alias for one path's selection: distinct for every (batch, position)
// pair, so no two paths in a query can share a field name
fn field_alias(batch_index: usize, position: usize) -> String {
    format!("f{}_{}", batch_index, position)
}

// Escapes a value for embedding in a GraphQL string literal
//
// Backslash, double quote, newline and carriage return all need escaping -
// a path is user-controlled text and must not be able to break out of the
// literal.
fn escape_graphql_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
