// src/extract/image.rs
//! Representative-image selection from a parsed document tree.
//!
//! Ordered heuristics, first match wins:
//! 1. `og:image` meta tag
//! 2. `twitter:image` meta tag
//! 3. first `<img>` inside an `<article>`/`<main>` region whose src does
//!    not look like an avatar or icon
//! 4. first `<img>` anywhere with a plausible (long, non-chrome) src

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static SEL_OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static SEL_TWITTER_IMAGE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="twitter:image"], meta[property="twitter:image"]"#).unwrap()
});
static SEL_REGION_IMG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article img, main img").unwrap());
static SEL_ANY_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(String::from)
}

fn looks_like_avatar(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.contains("avatar") || lower.contains("icon")
}

fn looks_like_chrome(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    ["logo", "avatar", "icon", "sprite", "1x1"]
        .iter()
        .any(|m| lower.contains(m))
}

/// Pick the representative image, or `None` when nothing plausible exists.
pub fn pick_image(doc: &Html) -> Option<String> {
    if let Some(src) = meta_content(doc, &SEL_OG_IMAGE) {
        return Some(src);
    }
    if let Some(src) = meta_content(doc, &SEL_TWITTER_IMAGE) {
        return Some(src);
    }

    if let Some(src) = doc
        .select(&SEL_REGION_IMG)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| !looks_like_avatar(src))
    {
        return Some(src.to_string());
    }

    doc.select(&SEL_ANY_IMG)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| src.len() > 20 && !looks_like_chrome(src))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(html: &str) -> Option<String> {
        pick_image(&Html::parse_document(html))
    }

    #[test]
    fn og_image_wins_over_everything() {
        let html = r#"
            <html><head>
              <meta property="og:image" content="https://cdn.example.com/og.jpg">
              <meta name="twitter:image" content="https://cdn.example.com/tw.jpg">
            </head><body>
              <article><img src="https://cdn.example.com/inline-photo-large.jpg"></article>
            </body></html>"#;
        assert_eq!(pick(html).as_deref(), Some("https://cdn.example.com/og.jpg"));
    }

    #[test]
    fn twitter_image_is_second_choice() {
        let html = r#"
            <html><head><meta name="twitter:image" content="https://cdn.example.com/tw.jpg"></head>
            <body></body></html>"#;
        assert_eq!(pick(html).as_deref(), Some("https://cdn.example.com/tw.jpg"));
    }

    #[test]
    fn region_img_skips_avatars_and_icons() {
        let html = r#"
            <html><body><article>
              <img src="https://cdn.example.com/user-avatar.png">
              <img src="https://cdn.example.com/share-icon.png">
              <img src="https://cdn.example.com/photo.jpg">
            </article></body></html>"#;
        assert_eq!(pick(html).as_deref(), Some("https://cdn.example.com/photo.jpg"));
    }

    #[test]
    fn fallback_img_needs_long_non_chrome_src() {
        // Outside article/main: short srcs and chrome assets are rejected.
        let html = r#"
            <html><body>
              <img src="/logo.png">
              <img src="https://cdn.example.com/sprite-sheet.png">
              <img src="https://cdn.example.com/tracking-1x1.gif">
              <img src="/p.jpg">
              <img src="https://cdn.example.com/story-hero.jpg">
            </body></html>"#;
        assert_eq!(
            pick(html).as_deref(),
            Some("https://cdn.example.com/story-hero.jpg")
        );
    }

    #[test]
    fn no_plausible_image_yields_none() {
        let html = r#"<html><body><img src="/logo.png"><p>text</p></body></html>"#;
        assert_eq!(pick(html), None);
    }
}
