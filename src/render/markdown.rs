// src/render/markdown.rs
// =============================================================================
// This module converts Markdown post bodies to HTML fragments.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, code block, etc.)
// - Follows the CommonMark specification
// - Is fast and memory-efficient (it's a streaming parser)
//
// One wrinkle: older posts use a legacy code fence made of four tildes,
// in two forms:
//
//   ~~~~{lang}        ~~~~
//   code...           code...
//   ~~~~              ~~~~
//
// pulldown-cmark does not know this delimiter, so a pre-pass rewrites each
// legacy block into a raw HTML <pre><code> block before conversion. The
// block body is HTML-escaped first - otherwise the converter would
// re-interpret the code body as Markdown.
//
// Rust concepts:
// - Regex with lazy statics: Compile the fence pattern exactly once
// - Closures: The replacement logic runs per match
// - Pure functions: Same input always produces the same output
// =============================================================================

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

// Matches one legacy fenced block: an opening `~~~~` with an optional
// `{lang}` tag, a newline, the block body, and the closing `~~~~`.
// (?s) makes `.` match newlines; `.*?` keeps the body as short as possible
// so back-to-back blocks don't merge into one match.
static LEGACY_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)~~~~(?:\{([^}\n]*)\})?\n(.*?)~~~~")
        .expect("legacy fence pattern is valid")
});

// Renders a Markdown post body to an HTML fragment
//
// Parameters:
//   markdown: the post body to convert (borrowed as &str)
//
// Returns: String containing the HTML fragment
//
// The conversion enables tables, task lists and strikethrough on top of
// plain CommonMark (fenced code blocks are part of CommonMark itself).
// No network, no filesystem, no shared state - calling this twice with the
// same input produces byte-identical output.
pub fn render(markdown: &str) -> String {
    let prepared = rewrite_legacy_fences(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&prepared, options);

    let mut output = String::with_capacity(prepared.len() * 2);
    html::push_html(&mut output, parser);
    output
}

// Rewrites every legacy four-tilde block into a raw HTML code block
//
// The rewritten form is `<pre><code>...</code></pre>`, with
// `class="language-{lang}"` on the code element when a tag was present.
// Markdown converters pass raw HTML blocks through untouched, so escaping
// the body here is what keeps code like `*ptr` or `<T>` from being
// re-parsed as emphasis or markup.
//
// An opening fence with no closing `~~~~` is left alone - the tildes stay
// visible instead of the rest of the document being swallowed.
// Input without any legacy fence comes back unchanged.
fn rewrite_legacy_fences(markdown: &str) -> String {
    LEGACY_FENCE
        .replace_all(markdown, |caps: &Captures| {
            let body = escape_html(&caps[2]);
            match caps.get(1) {
                Some(lang) if !lang.as_str().is_empty() => format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>",
                    lang.as_str(),
                    body
                ),
                _ => format!("<pre><code>{}</code></pre>", body),
            }
        })
        .into_owned()
}

// Escapes the five HTML-significant characters: & < > " '
//
// `&` must be handled first conceptually, but since we build a fresh
// string character by character there is no double-escaping hazard.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Lazy<Regex>?
//    - Compiling a regex costs time, so we only want to do it once
//    - Lazy runs the closure the first time the static is touched and
//      caches the result for every later use
//
// 2. Why replace_all with a closure?
//    - The replacement depends on the captures (language tag, body)
//    - A closure receives each match's Captures and returns the new text
//
// 3. Why escape before converting?
//    - Raw HTML blocks pass through the Markdown converter untouched
//    - If the code body still contained `<` or `&`, the browser (or the
//      converter) would treat it as markup instead of text
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Reverses escape_html; only needed to verify round-trips in tests
    fn unescape_html(escaped: &str) -> String {
        escaped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_tagged_legacy_fence_becomes_code_block() {
        let markdown = "~~~~{rust}\nlet x: Vec<u8> = vec![];\n~~~~";
        let output = render(markdown);
        assert!(output.contains("<code class=\"language-rust\">"));
        assert!(output.contains("let x: Vec&lt;u8&gt; = vec![];"));
    }

    #[test]
    fn test_legacy_fence_body_round_trips_through_escaping() {
        let code = "if a < b && c > d { \"quote\" + 'q' }\n";
        let markdown = format!("~~~~{{c}}\n{}~~~~", code);
        let rewritten = rewrite_legacy_fences(&markdown);

        let start = rewritten.find('>').unwrap() + 1;
        let start = rewritten[start..].find('>').unwrap() + start + 1;
        let end = rewritten.find("</code>").unwrap();
        assert_eq!(unescape_html(&rewritten[start..end]), code);
    }

    #[test]
    fn test_untagged_legacy_fence() {
        let markdown = "~~~~\nplain code\n~~~~";
        let rewritten = rewrite_legacy_fences(markdown);
        assert_eq!(rewritten, "<pre><code>plain code\n</code></pre>");
    }

    #[test]
    fn test_back_to_back_fences_stay_separate() {
        let markdown = "~~~~{a}\none\n~~~~\n\n~~~~{b}\ntwo\n~~~~";
        let rewritten = rewrite_legacy_fences(markdown);
        assert!(rewritten.contains("class=\"language-a\""));
        assert!(rewritten.contains("class=\"language-b\""));
        assert!(rewritten.contains("one\n"));
        assert!(rewritten.contains("two\n"));
    }

    #[test]
    fn test_unterminated_fence_left_alone() {
        let markdown = "~~~~{rust}\nno closing delimiter";
        assert_eq!(rewrite_legacy_fences(markdown), markdown);
    }

    #[test]
    fn test_prepass_is_identity_without_legacy_fences() {
        let markdown = "# Title\n\nSome *text* with a [link](https://example.com).\n";
        assert_eq!(rewrite_legacy_fences(markdown), markdown);
    }

    #[test]
    fn test_render_is_deterministic() {
        let markdown = "# Hello\n\n- [x] done\n- [ ] not yet\n\n~~gone~~\n";
        assert_eq!(render(markdown), render(markdown));
    }

    #[test]
    fn test_escape_html_round_trip() {
        let nasty = "a & b < c > d \" e ' f && <<>>";
        assert_eq!(unescape_html(&escape_html(nasty)), nasty);
    }

    #[test]
    fn test_tables_and_strikethrough_enabled() {
        let markdown = "| a | b |\n| - | - |\n| 1 | 2 |\n\n~~old~~\n";
        let output = render(markdown);
        assert!(output.contains("<table>"));
        assert!(output.contains("<del>old</del>"));
    }

    #[test]
    fn test_task_lists_enabled() {
        let output = render("- [x] shipped\n");
        assert!(output.contains("checkbox"));
    }

    #[test]
    fn test_standard_fences_untouched_by_prepass() {
        let markdown = "```rust\nlet y = 2;\n```\n";
        assert_eq!(rewrite_legacy_fences(markdown), markdown);
        let output = render(markdown);
        assert!(output.contains("<code class=\"language-rust\">"));
    }
}
