// src/github/raw.rs
// =============================================================================
// This module fetches raw post content.
//
// raw.githubusercontent.com serves file contents verbatim, which is exactly
// what the renderer wants - no JSON wrapper, no base64, just the Markdown
// text. The same 404/403/other taxonomy applies, so a mistyped post path
// surfaces as "path not found" with the path in the message.
// =============================================================================

use reqwest::{header, Client};

use super::{error_for_status, rest::encode_path, GitHubError, RAW_ROOT, USER_AGENT};

// Fetches one post's raw Markdown source
//
// Parameters:
//   path: repo-relative path of the post's Markdown file
//   branch: ref to read the file from
//
// Returns: the file contents as text. Errors propagate - this is a
// single-shot call with no sibling results to protect.
pub async fn fetch_post_content(
    client: &Client,
    owner: &str,
    repo: &str,
    branch: &str,
    path: &str,
) -> Result<String, GitHubError> {
    let url = raw_url(owner, repo, branch, path);
    log::debug!("GET {}", url);

    let response = client
        .get(&url)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(error_for_status("post content", path, status));
    }

    Ok(response.text().await?)
}

// Builds the raw-content URL for a file at a branch
fn raw_url(owner: &str, repo: &str, branch: &str, path: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        RAW_ROOT,
        owner,
        repo,
        branch,
        encode_path(path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_url() {
        assert_eq!(
            raw_url("user", "blog", "main", "posts/hello.md"),
            "https://raw.githubusercontent.com/user/blog/main/posts/hello.md"
        );
    }

    #[test]
    fn test_raw_url_encodes_path_segments() {
        assert_eq!(
            raw_url("user", "blog", "main", "my posts/a.md"),
            "https://raw.githubusercontent.com/user/blog/main/my%20posts/a.md"
        );
    }
}
