// src/ingest/parsers.rs
//! Feed document parsing: RSS 2.0, Atom, and XML sitemaps into a common
//! item shape. quick-xml serde structs per format; publish dates are
//! normalized to UTC.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::store::FeedKind;

/// One entry discovered in a feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub url: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

pub fn parse_feed(kind: FeedKind, body: &str) -> Result<Vec<FeedItem>> {
    match kind {
        FeedKind::Rss => parse_rss(body),
        FeedKind::Atom => parse_atom(body),
        FeedKind::Sitemap => parse_sitemap(body),
    }
}

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rss(body: &str) -> Result<Vec<FeedItem>> {
    let clean = scrub_html_entities_for_xml(body);
    let rss: Rss = from_str(&clean).context("parsing rss xml")?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|it| {
            let url = it.link?.trim().to_string();
            if url.is_empty() {
                return None;
            }
            Some(FeedItem {
                url,
                title: it.title.unwrap_or_default(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
            })
        })
        .collect())
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn parse_atom(body: &str) -> Result<Vec<FeedItem>> {
    let feed: AtomFeed = from_str(body).context("parsing atom xml")?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            // Prefer the alternate (or untyped) link over self/edit links.
            let url = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .and_then(|l| l.href.clone())?;
            let ts = entry.published.as_deref().or(entry.updated.as_deref());
            Some(FeedItem {
                url,
                title: entry.title.unwrap_or_default(),
                published_at: ts.and_then(parse_rfc3339),
            })
        })
        .collect())
}

// ---- Sitemap ----

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<SitemapUrl>,
}
#[derive(Debug, Deserialize)]
struct SitemapUrl {
    loc: Option<String>,
    lastmod: Option<String>,
}

fn parse_sitemap(body: &str) -> Result<Vec<FeedItem>> {
    let set: UrlSet = from_str(body).context("parsing sitemap xml")?;

    Ok(set
        .urls
        .into_iter()
        .filter_map(|u| {
            let url = u.loc?.trim().to_string();
            if url.is_empty() {
                return None;
            }
            let title = title_from_slug(&url);
            Some(FeedItem {
                url,
                title,
                published_at: u.lastmod.as_deref().and_then(parse_rfc3339),
            })
        })
        .collect())
}

/// Sitemaps carry no titles; derive a readable one from the URL slug.
fn title_from_slug(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".html")
        .replace(['-', '_'], " ")
        .trim()
        .to_string()
}

// ---- date helpers ----

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
}

/// Some feeds ship HTML entities that are not valid XML; replace the usual
/// suspects before handing the document to the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
