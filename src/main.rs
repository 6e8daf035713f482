// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Dispatch to the appropriate subcommand handler
// 3. Collect results and print them
// 4. Exit with proper code (0 = success, 1 = failed lookups, 2 = error)
//
// Rust concepts used:
// - async/await: Because we need to make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;           // src/cli.rs - command-line parsing
mod github;        // src/github/ - GitHub API traffic
mod post;          // src/post.rs - post index records
mod render;        // src/render/ - Markdown to HTML conversion

// Import items we need from our modules
use cli::{Cli, Commands};
use clap::Parser;  // Parser trait enables the parse() method
use github::{CommitInfo, CommitMap, FetchStrategy};
use post::Post;

// anyhow::Result is like std::result::Result but simpler for applications
// It lets us return any error type with the ? operator
use anyhow::{anyhow, Result};
use serde_json::json;
use std::path::Path;

// The #[tokio::main] attribute transforms our async main into a real main
// function. It creates a tokio runtime and runs our async code inside it.
#[tokio::main]
async fn main() {
    // RUST_LOG=debug shows every outbound request
    env_logger::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = success
//   Ok(1) = some lookups came back as error/sentinel entries
//   Err = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Posts {
            repo,
            index,
            branch,
            token,
            graphql,
            batch_size,
            json,
        } => handle_posts(&repo, &index, &branch, token.as_deref(), graphql, batch_size, json).await,
        Commands::Show {
            repo,
            path,
            branch,
            token,
        } => handle_show(&repo, &path, &branch, token.as_deref()).await,
        Commands::Render { file, output } => handle_render(&file, output.as_deref()),
        Commands::Commits {
            repo,
            paths,
            branch,
            token,
            per_page,
            json,
        } => handle_commits(&repo, &paths, &branch, token.as_deref(), per_page, json).await,
        Commands::User { token } => handle_user(&token).await,
        Commands::RateLimit { token } => handle_rate_limit(token.as_deref()).await,
    }
}

// Handles the 'posts' subcommand: annotate a post index with commit metadata
async fn handle_posts(
    repo_spec: &str,
    index: &Path,
    branch: &str,
    token: Option<&str>,
    graphql: bool,
    batch_size: usize,
    json: bool,
) -> Result<i32> {
    let (owner, repo) = github::parse_repo_spec(repo_spec)?;
    let posts = post::load_post_index(index)?;

    if posts.is_empty() {
        println!("⚠️  No posts listed in {}", index.display());
        return Ok(0);
    }

    println!(
        "🔍 Annotating {} post(s) from {}/{} ({})",
        posts.len(),
        owner,
        repo,
        branch
    );

    let paths: Vec<String> = posts.iter().map(|p| p.path.clone()).collect();
    let strategy = if graphql {
        FetchStrategy::GraphQl
    } else {
        FetchStrategy::Rest
    };

    let client = reqwest::Client::new();
    let commit_map = github::fetch_latest_commits(
        &client, &owner, &repo, branch, &paths, token, strategy, batch_size,
    )
    .await;

    if json {
        let rows: Vec<serde_json::Value> = posts
            .iter()
            .map(|p| {
                json!({
                    "title": p.title,
                    "path": p.path,
                    "tags": p.tags,
                    "commit": commit_map.get(&p.path),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_posts_table(&posts, &commit_map);
    }

    // A missing map entry would violate the fetcher's contract; count it as
    // unresolved rather than trusting it
    let unresolved = posts
        .iter()
        .filter(|p| !commit_map.get(&p.path).map(|i| i.is_resolved()).unwrap_or(false))
        .count();

    if unresolved > 0 {
        Ok(1)  // Exit code 1 = some posts have no real metadata
    } else {
        Ok(0)  // Exit code 0 = all good
    }
}

// Handles the 'show' subcommand: fetch one post and print it as HTML
async fn handle_show(
    repo_spec: &str,
    path: &str,
    branch: &str,
    token: Option<&str>,
) -> Result<i32> {
    let (owner, repo) = github::parse_repo_spec(repo_spec)?;

    let client = reqwest::Client::new();
    let markdown = github::fetch_post_content(&client, &owner, &repo, branch, path).await?;

    // The metadata line goes to stderr so stdout stays a clean HTML
    // fragment that can be piped somewhere
    match github::get_file_commits(&client, &owner, &repo, path, branch, token).await {
        Ok(records) => {
            let info = match records.first() {
                Some(record) => github::commit_info_from_record(record),
                None => CommitInfo::no_commit_history(),
            };
            eprintln!("📅 Last modified: {} by {}", info.last_modified, info.author);
        }
        Err(error) => eprintln!("⚠️  Could not fetch commit metadata: {}", error),
    }

    println!("{}", render::render(&markdown));
    Ok(0)
}

// Handles the 'render' subcommand: convert a local Markdown file
fn handle_render(file: &Path, output: Option<&Path>) -> Result<i32> {
    let markdown = std::fs::read_to_string(file)
        .map_err(|e| anyhow!("could not read {}: {}", file.display(), e))?;

    let html = render::render(&markdown);

    match output {
        Some(target) => {
            std::fs::write(target, &html)
                .map_err(|e| anyhow!("could not write {}: {}", target.display(), e))?;
            println!("💾 Wrote {}", target.display());
        }
        None => println!("{}", html),
    }

    Ok(0)
}

// Handles the 'commits' subcommand: raw history for explicit paths
async fn handle_commits(
    repo_spec: &str,
    paths: &[String],
    branch: &str,
    token: Option<&str>,
    per_page: usize,
    json: bool,
) -> Result<i32> {
    let (owner, repo) = github::parse_repo_spec(repo_spec)?;

    println!(
        "🌐 Fetching history for {} path(s) from {}/{} ({})\n",
        paths.len(),
        owner,
        repo,
        branch
    );

    let client = reqwest::Client::new();
    let results =
        github::batch_get_file_commits(&client, &owner, &repo, paths, branch, token, per_page)
            .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            match &result.error {
                Some(error) => println!("❌ {} - {}", result.path, error),
                None => println!("✅ {} - {} commit(s)", result.path, result.total),
            }
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();

    if failed > 0 {
        Ok(1)  // Exit code 1 = at least one path failed
    } else {
        Ok(0)
    }
}

// Handles the 'user' subcommand
async fn handle_user(token: &str) -> Result<i32> {
    let client = reqwest::Client::new();
    let user = github::get_user_info(&client, token).await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(0)
}

// Handles the 'rate-limit' subcommand
async fn handle_rate_limit(token: Option<&str>) -> Result<i32> {
    let client = reqwest::Client::new();
    let limits = github::get_rate_limit(&client, token).await?;
    println!("{}", serde_json::to_string_pretty(&limits)?);
    Ok(0)
}

// Prints the annotated post listing as a human-readable table
fn print_posts_table(posts: &[Post], commit_map: &CommitMap) {
    // Print table header
    println!("{:<32} {:<30} {:<22} {:<20}", "TITLE", "LAST MODIFIED", "AUTHOR", "TAGS");
    println!("{}", "=".repeat(104));

    for post in posts {
        let (last_modified, author) = match commit_map.get(&post.path) {
            Some(info) => (info.last_modified.as_str(), info.author.as_str()),
            None => (github::UNKNOWN_TIME, github::UNKNOWN_AUTHOR),
        };

        println!(
            "{:<32} {:<30} {:<22} {:<20}",
            truncate_display(&post.title, 30),
            last_modified,
            truncate_display(author, 20),
            post.tags.join(", ")
        );
    }

    println!();

    // Print summary
    let resolved = posts
        .iter()
        .filter(|p| commit_map.get(&p.path).map(|i| i.is_resolved()).unwrap_or(false))
        .count();
    let unresolved = posts.len() - resolved;

    println!("📊 Summary:");
    println!("   ✅ Annotated: {}", resolved);
    println!("   ❌ Unresolved: {}", unresolved);
    println!("   📋 Total: {}", posts.len());
}

// Truncates text for table display, adding an ellipsis when it was cut
// (character-based, so multi-byte titles can't split mid-character)
fn truncate_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_display_short_text_untouched() {
        assert_eq!(truncate_display("short", 30), "short");
    }

    #[test]
    fn test_truncate_display_cuts_with_ellipsis() {
        let long = "a".repeat(40);
        let cut = truncate_display(&long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
    }
}
