// src/github/account.rs
// =============================================================================
// This module holds the two thin account probes:
// - get_user_info: who does this token belong to?
// - get_rate_limit: how much API budget is left?
//
// Both are pass-throughs - no retry, no caching, and the response body is
// handed back exactly as the API produced it.
// =============================================================================

use reqwest::Client;
use serde_json::Value;

use super::{apply_headers, error_for_status, GitHubError, API_ROOT};

// Fetches the authenticated user behind a token
//
// Parameters:
//   token: API token (required - this endpoint has no anonymous form)
//
// Returns: the user object as raw JSON. On a non-success status the error
// wraps the HTTP status together with the reason string the API put in the
// body, when there is one.
pub async fn get_user_info(client: &Client, token: &str) -> Result<Value, GitHubError> {
    let url = format!("{}/user", API_ROOT);
    log::debug!("GET {}", url);

    let response = apply_headers(client.get(&url), Some(token)).send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let reason = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| reason_from_body(&body))
        .unwrap_or_else(|| "no reason given".to_string());

    Err(GitHubError::UserInfo {
        status: status.to_string(),
        reason,
    })
}

// Fetches the current rate-limit counters
//
// Parameters:
//   token: optional - anonymous calls work, with the anonymous quota
//
// Returns: the rate-limit object as raw JSON. Errors propagate through the
// ordinary status taxonomy, unwrapped.
pub async fn get_rate_limit(client: &Client, token: Option<&str>) -> Result<Value, GitHubError> {
    let url = format!("{}/rate_limit", API_ROOT);
    log::debug!("GET {}", url);

    let response = apply_headers(client.get(&url), token).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(error_for_status("rate limit", "/rate_limit", status));
    }

    Ok(response.json().await?)
}

// Pulls the "message" reason string out of an API error body
fn reason_from_body(body: &Value) -> Option<String> {
    body["message"].as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reason_from_body() {
        let body = json!({ "message": "Bad credentials" });
        assert_eq!(reason_from_body(&body).as_deref(), Some("Bad credentials"));
    }

    #[test]
    fn test_reason_from_body_without_message() {
        assert_eq!(reason_from_body(&json!({})), None);
        assert_eq!(reason_from_body(&json!({ "message": 42 })), None);
    }

    #[test]
    fn test_user_info_error_carries_reason() {
        let error = GitHubError::UserInfo {
            status: "401 Unauthorized".to_string(),
            reason: "Bad credentials".to_string(),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("Bad credentials"));
    }
}
