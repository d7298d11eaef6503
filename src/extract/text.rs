// src/extract/text.rs
//! Clean-text derivation from a parsed document tree.
//!
//! An ordered pipeline of pure functions: pick the best content container,
//! walk it while skipping chrome subtrees, then normalize whitespace and
//! cap the length. No regex ever touches raw markup.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Subtrees skipped entirely during text collection.
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

static SEL_ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static SEL_MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static SEL_CONTENT_CLASS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[class*="content"]"#).unwrap());

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Container preference: `<article>`, else `<main>`, else the first element
/// whose class mentions "content", else the whole document.
fn content_container(doc: &Html) -> ElementRef<'_> {
    doc.select(&SEL_ARTICLE)
        .next()
        .or_else(|| doc.select(&SEL_MAIN).next())
        .or_else(|| doc.select(&SEL_CONTENT_CLASS).next())
        .unwrap_or_else(|| doc.root_element())
}

fn collect_text(node: ego_tree::NodeRef<'_, scraper::Node>, out: &mut String) {
    if let Some(el) = node.value().as_element() {
        if STRIP_TAGS.contains(&el.name()) {
            return;
        }
    }
    if let Some(text) = node.value().as_text() {
        out.push_str(text);
        out.push(' ');
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

/// Derive clean text from a parsed document, capped at `max_chars`.
pub fn extract_text(doc: &Html, max_chars: usize) -> String {
    let container = content_container(doc);

    let mut raw = String::new();
    collect_text(*container, &mut raw);

    let collapsed = RE_WS.replace_all(&raw, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(html: &str) -> String {
        extract_text(&Html::parse_document(html), 10_000)
    }

    #[test]
    fn prefers_article_over_body() {
        let html = r#"
            <html><body>
              <nav>Site nav</nav>
              <article><p>Real story text.</p></article>
              <div>Sidebar junk</div>
            </body></html>"#;
        assert_eq!(text_of(html), "Real story text.");
    }

    #[test]
    fn falls_back_to_main_then_content_class() {
        let html = r#"<html><body><main><p>Main text.</p></main></body></html>"#;
        assert_eq!(text_of(html), "Main text.");

        let html = r#"<html><body><div class="post-content"><p>Classed text.</p></div></body></html>"#;
        assert_eq!(text_of(html), "Classed text.");
    }

    #[test]
    fn strips_script_style_and_chrome() {
        let html = r#"
            <html><body>
              <header>Masthead</header>
              <script>var x = 1;</script>
              <style>.a { color: red }</style>
              <p>Kept text.</p>
              <footer>Copyright</footer>
              <aside>Related links</aside>
            </body></html>"#;
        assert_eq!(text_of(html), "Kept text.");
    }

    #[test]
    fn strips_chrome_nested_inside_article() {
        let html = r#"
            <html><body><article>
              <header>Byline chrome</header>
              <p>Paragraph one.</p>
              <p>Paragraph two.</p>
            </article></body></html>"#;
        assert_eq!(text_of(html), "Paragraph one. Paragraph two.");
    }

    #[test]
    fn collapses_whitespace_and_caps_length() {
        let html = "<html><body><p>a\n\n   b\t\tc</p></body></html>";
        assert_eq!(text_of(html), "a b c");

        let long = format!("<html><body><p>{}</p></body></html>", "x".repeat(20_000));
        let out = extract_text(&Html::parse_document(&long), 10_000);
        assert_eq!(out.chars().count(), 10_000);
    }

    #[test]
    fn decodes_entities_via_the_parser() {
        let html = "<html><body><p>Fish &amp; chips &ldquo;quoted&rdquo;</p></body></html>";
        assert_eq!(text_of(html), "Fish & chips \u{201C}quoted\u{201D}");
    }
}
