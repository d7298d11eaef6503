// src/extract/mod.rs
//! Content extraction: fetch an article's source URL and derive clean text
//! plus a representative image.
//!
//! Fetching sits behind the `PageFetcher` seam; everything after the fetch
//! is a pipeline of pure functions over one parsed document tree
//! (`text::extract_text`, `image::pick_image`). Persisting the result is
//! the pipeline module's job, keeping Extract -> Grade -> Commit as
//! separately testable stages.

pub mod image;
pub mod text;

use std::sync::Arc;

use thiserror::Error;

use crate::config::ExtractCfg;
use crate::fetch::{FetchError, PageFetcher};
use crate::store::Article;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("content too short ({0} chars)")]
    TooShort(usize),
}

impl ExtractError {
    /// Transient failures feed the owning feed's failure counters;
    /// content-quality failures only annotate the article.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractError::Fetch(_))
    }
}

/// Typed intermediate between the Extract and Grade stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub content: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    /// Article already has substantial content and `force` was not set.
    Skipped,
    Extracted(Extracted),
}

pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    cfg: ExtractCfg,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, cfg: ExtractCfg) -> Self {
        Self { fetcher, cfg }
    }

    /// Fetch and derive `{content, image}` for one article.
    ///
    /// Idempotency: an article whose stored content already exceeds the
    /// skip threshold is reported as a no-op success unless `force`.
    pub async fn extract(
        &self,
        article: &Article,
        force: bool,
    ) -> Result<ExtractOutcome, ExtractError> {
        if !force && has_substantial_content(article, self.cfg.skip_if_longer_than) {
            return Ok(ExtractOutcome::Skipped);
        }

        let page = self.fetcher.fetch(&article.url).await?;
        let extracted = derive(&page.body, &self.cfg)?;
        Ok(ExtractOutcome::Extracted(extracted))
    }
}

fn has_substantial_content(article: &Article, threshold: usize) -> bool {
    article
        .content
        .as_deref()
        .is_some_and(|c| c.chars().count() > threshold)
}

/// Pure stage: parsed tree in, `{content, image}` out. Kept free of the
/// fetcher so fixture HTML exercises every heuristic directly.
fn derive(body: &str, cfg: &ExtractCfg) -> Result<Extracted, ExtractError> {
    let doc = scraper::Html::parse_document(body);
    let content = text::extract_text(&doc, cfg.max_content_chars);
    let image = image::pick_image(&doc);

    if content.chars().count() < cfg.min_content_chars {
        return Err(ExtractError::TooShort(content.chars().count()));
    }

    Ok(Extracted { content, image })
}
