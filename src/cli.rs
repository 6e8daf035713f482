// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "blog-lens",
    version = "0.1.0",
    about = "Render Markdown blog posts and annotate them with GitHub commit metadata",
    long_about = "blog-lens renders Markdown-backed posts (including the legacy four-tilde \
                  code fences) and annotates post listings with last-modified metadata \
                  fetched from the GitHub REST or GraphQL API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands
//
// Each variant represents a different subcommand the user can run
// The fields inside each variant become the arguments for that subcommand
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the posts of an index file, annotated with last-modified metadata
    ///
    /// Example: blog-lens posts user/blog --index posts.json
    Posts {
        /// Repository in owner/repo form (a github.com URL works too)
        repo: String,

        /// Path to the JSON post index file
        #[arg(long)]
        index: PathBuf,

        /// Branch to read commit history from
        #[arg(long, default_value = "main")]
        branch: String,

        /// API token (raises rate limits; required for private repos)
        #[arg(long)]
        token: Option<String>,

        /// Use the batched GraphQL path instead of per-path REST calls
        #[arg(long)]
        graphql: bool,

        /// Paths per aggregate GraphQL query
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fetch one post from the repository and print it rendered to HTML
    ///
    /// Example: blog-lens show user/blog posts/hello.md
    Show {
        /// Repository in owner/repo form
        repo: String,

        /// Repo-relative path of the post's Markdown file
        path: String,

        /// Branch to read the file from
        #[arg(long, default_value = "main")]
        branch: String,

        /// API token
        #[arg(long)]
        token: Option<String>,
    },

    /// Render a local Markdown file to an HTML fragment
    ///
    /// Example: blog-lens render drafts/new-post.md --output preview.html
    Render {
        /// The Markdown file to render
        file: PathBuf,

        /// Write the HTML here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Dump the raw commit history for one or more paths (REST, paginated)
    ///
    /// Example: blog-lens commits user/blog --path posts/a.md --path posts/b.md
    Commits {
        /// Repository in owner/repo form
        repo: String,

        /// A path to look up; repeat the flag for more paths
        #[arg(long = "path", required = true)]
        paths: Vec<String>,

        /// Branch to read commit history from
        #[arg(long, default_value = "main")]
        branch: String,

        /// API token
        #[arg(long)]
        token: Option<String>,

        /// Records per history page (clamped to 1..=500)
        #[arg(long, default_value_t = 100)]
        per_page: usize,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the user the token authenticates as
    User {
        /// API token (required - there is no anonymous form)
        #[arg(long)]
        token: String,
    },

    /// Show the current API rate-limit counters
    RateLimit {
        /// API token (optional - anonymous calls see the anonymous quota)
        #[arg(long)]
        token: Option<String>,
    },
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why use structs and enums?
//    - Structs group related data (like the CLI arguments)
//    - Enums represent choices (like "posts OR show OR render")
//
// 2. What are derive macros?
//    - #[derive(...)] automatically generates code for common operations
//    - Parser: generates CLI parsing logic
//    - Debug: generates code to print the struct for debugging
//
// 3. Where do the help texts come from?
//    - The /// doc comments on variants and fields become clap's help
//      output, so `blog-lens posts --help` shows them
// -----------------------------------------------------------------------------
