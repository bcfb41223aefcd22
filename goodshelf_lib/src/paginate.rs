//! Page-count estimation for the scrape loop.
//!
//! Estimation is advisory, never load-bearing: every failure path degrades
//! to [`PageEstimate::Unknown`] and the loop falls back to discovering the
//! end of the listing dynamically.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::extract;
use crate::listing::{ShelfListing, PER_PAGE};
use crate::render::Renderer;

/// Estimated number of listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEstimate {
    /// The listing disclosed its page count up front.
    Known(u32),
    /// More than one page exists but the exact count is undeterminable;
    /// termination is decided by observing empty pages.
    Unknown,
}

static PAGINATION_CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.pagination").unwrap());
static PAGINATION_FUZZY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[class*="pagination"], nav[class*="pagination"]"#).unwrap()
});
static PAGE_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static SHOWING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)showing.*of.*\d").unwrap());
static OF_TOTAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)of\s+(\d+)").unwrap());

/// Estimates how many pages the listing spans.
///
/// Ranked strategies, first success wins: explicit pagination links, the
/// "showing X-Y of Z" summary text, and finally a probe of page 2 (records
/// there mean "more than one page, count unknown"; none mean a single page).
pub async fn estimate<R: Renderer>(renderer: &R, listing: &ShelfListing) -> PageEstimate {
    let first_page = match renderer.render(&listing.first_page_url()).await {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!("first-page render failed during estimation: {err}");
            return PageEstimate::Unknown;
        }
    };

    if let Some(pages) = estimate_from_document(&first_page) {
        return PageEstimate::Known(pages);
    }

    probe_second_page(renderer, listing).await
}

/// Document-only strategies: explicit pagination links, then the summary
/// text. `None` when neither matches.
pub fn estimate_from_document(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);

    if let Some(max) = max_pagination_link(&document) {
        tracing::debug!("pagination control reports {max} page(s)");
        return Some(max);
    }

    if let Some(total) = total_from_summary(&document) {
        let pages = total.div_ceil(PER_PAGE);
        tracing::debug!("summary text reports {total} item(s) across {pages} page(s)");
        return Some(pages);
    }

    None
}

/// Largest numeric link label inside the pagination container. Two
/// independent container patterns tolerate class drift.
fn max_pagination_link(document: &Html) -> Option<u32> {
    let container = document
        .select(&PAGINATION_CANONICAL)
        .next()
        .or_else(|| document.select(&PAGINATION_FUZZY).next())?;
    container
        .select(&PAGE_LINK)
        .filter_map(|link| {
            let label: String = link.text().collect();
            label.trim().parse::<u32>().ok()
        })
        .max()
}

/// Total item count from a "showing X-Y of Z" summary anywhere in the
/// document text.
fn total_from_summary(document: &Html) -> Option<u32> {
    let body: String = document.root_element().text().collect();
    let summary = SHOWING.find(&body)?;
    let captures = OF_TOTAL.captures(summary.as_str())?;
    captures[1].parse().ok()
}

async fn probe_second_page<R: Renderer>(renderer: &R, listing: &ShelfListing) -> PageEstimate {
    match renderer.render(&listing.page_url(2)).await {
        Ok(html) => {
            let document = Html::parse_document(&html);
            if extract::record_rows(&document).is_empty() {
                tracing::debug!("page 2 is empty; single-page listing");
                PageEstimate::Known(1)
            } else {
                tracing::debug!("page 2 has records; discovering page count dynamically");
                PageEstimate::Unknown
            }
        }
        Err(err) => {
            tracing::warn!("page-2 probe failed: {err}");
            PageEstimate::Unknown
        }
    }
}
