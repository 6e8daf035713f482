// src/post.rs
// =============================================================================
// This module defines the Post record and loads the post index.
//
// The index is a JSON array maintained alongside the posts themselves:
//
//   [
//     { "title": "Hello", "path": "posts/hello.md", "tags": ["intro"] }
//   ]
//
// Posts are read-only here - the index is produced elsewhere, we only
// consume it. The path doubles as the commit-lookup key.
// =============================================================================

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// One entry of the post index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Display title
    pub title: String,
    /// Repo-relative path of the Markdown source; also the lookup key
    pub path: String,
    /// Ordered tag list; optional in the index
    #[serde(default)]
    pub tags: Vec<String>,
}

// Loads and parses a post index file
//
// Parameters:
//   index_path: filesystem path of the JSON index
//
// Returns: the posts in index order, or an error naming the file when it
// can't be read or parsed
pub fn load_post_index(index_path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(index_path)
        .map_err(|e| anyhow!("could not read post index {}: {}", index_path.display(), e))?;

    let posts: Vec<Post> = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("could not parse post index {}: {}", index_path.display(), e))?;

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_deserializes_with_tags() {
        let post: Post = serde_json::from_str(
            r#"{ "title": "Hello", "path": "posts/hello.md", "tags": ["intro", "meta"] }"#,
        )
        .unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.path, "posts/hello.md");
        assert_eq!(post.tags, vec!["intro", "meta"]);
    }

    #[test]
    fn test_post_tags_default_to_empty() {
        let post: Post =
            serde_json::from_str(r#"{ "title": "Hello", "path": "posts/hello.md" }"#).unwrap();
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_post_order_is_preserved() {
        let posts: Vec<Post> = serde_json::from_str(
            r#"[
                { "title": "B", "path": "b.md" },
                { "title": "A", "path": "a.md" }
            ]"#,
        )
        .unwrap();
        assert_eq!(posts[0].title, "B");
        assert_eq!(posts[1].title, "A");
    }
}
