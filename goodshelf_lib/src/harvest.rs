//! The scrape-loop controller: fetch -> extract -> decide, page by page.
//!
//! Strictly sequential: the stopping decision for page N depends on N's
//! outcome, so each page is fetched and fully extracted before the next URL
//! is requested. The accumulated records and the page cursor are owned by
//! the [`Harvester`] alone for the duration of one session.

use std::time::Duration;

use scraper::Html;

use crate::extract;
use crate::listing::ShelfListing;
use crate::paginate::PageEstimate;
use crate::record::Record;
use crate::render::{RenderError, Renderer};

/// Absolute ceiling on pages fetched in one session, independent of every
/// other stopping rule. Guards against runaway loops on a misbehaving site.
pub const MAX_PAGES: u32 = 50;

/// Successive empty pages that end the harvest.
const EMPTY_PAGE_LIMIT: u32 = 2;

/// How the controller decides the harvest is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// A page count was estimated up front.
    FixedEstimate(u32),
    /// Page count unknown in advance; termination rests entirely on
    /// observing empty pages.
    DynamicDiscovery,
}

impl From<PageEstimate> for PaginationMode {
    fn from(estimate: PageEstimate) -> Self {
        match estimate {
            PageEstimate::Known(pages) => PaginationMode::FixedEstimate(pages),
            PageEstimate::Unknown => PaginationMode::DynamicDiscovery,
        }
    }
}

/// Why the loop reached its terminal state.
#[derive(Debug)]
pub enum StopReason {
    /// Two successive pages yielded no records.
    ConsecutiveEmptyPages,
    /// The fixed estimate was exceeded and the page produced nothing.
    EstimateExceeded,
    /// The absolute page ceiling was reached.
    SafetyCeiling,
    /// The operator interrupted the harvest; accumulated records are kept.
    Cancelled,
    /// The rendering collaborator failed; accumulated records are kept.
    Fetch(RenderError),
}

/// Tunables for one harvest session.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Page ceiling for this run; clamped to [`MAX_PAGES`].
    pub max_pages: u32,
    /// Considerate pause before every page after the first. Not a
    /// correctness requirement, only request pacing.
    pub page_delay: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            page_delay: Duration::from_millis(1500),
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy)]
pub struct PageReport {
    pub page: u32,
    pub records_found: usize,
    pub total_records: usize,
}

/// One completed or interrupted harvest session, finalized for the writers.
#[derive(Debug)]
pub struct HarvestOutcome {
    /// Records in encounter order across pages.
    pub records: Vec<Record>,
    /// Pages fetched and extracted, successful or empty.
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// Immutable view of the session consulted by the stopping policy after a
/// page has been extracted and counted.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    page: u32,
    consecutive_empty: u32,
}

enum Decision {
    Continue,
    Stop(StopReason),
}

/// The stopping policy, pure over a post-extraction snapshot.
///
/// The empty-page and estimate guards are independent and both evaluated
/// every iteration, not a priority chain. The ceiling guard fires when the
/// NEXT page would exceed the limit, so the page past it is never fetched.
fn decide(snapshot: Snapshot, mode: PaginationMode, max_pages: u32) -> Decision {
    if snapshot.consecutive_empty >= EMPTY_PAGE_LIMIT {
        return Decision::Stop(StopReason::ConsecutiveEmptyPages);
    }
    if let PaginationMode::FixedEstimate(estimate) = mode {
        if snapshot.page > estimate && snapshot.consecutive_empty >= 1 {
            return Decision::Stop(StopReason::EstimateExceeded);
        }
    }
    if snapshot.page + 1 > max_pages {
        return Decision::Stop(StopReason::SafetyCeiling);
    }
    Decision::Continue
}

/// Sequential scrape-loop controller.
///
/// [`step`](Harvester::step) performs one fetch-extract-decide transition so
/// the session runner can pace, report progress, and check for cancellation
/// between pages; [`run_to_end`](Harvester::run_to_end) drives the loop to
/// its terminal state.
pub struct Harvester<'a, R: Renderer> {
    renderer: &'a R,
    listing: &'a ShelfListing,
    mode: PaginationMode,
    config: HarvestConfig,
    records: Vec<Record>,
    page: u32,
    pages_fetched: u32,
    consecutive_empty: u32,
    stop: Option<StopReason>,
}

impl<'a, R: Renderer> Harvester<'a, R> {
    pub fn new(
        renderer: &'a R,
        listing: &'a ShelfListing,
        estimate: PageEstimate,
        config: HarvestConfig,
    ) -> Self {
        let config = HarvestConfig {
            max_pages: config.max_pages.min(MAX_PAGES),
            ..config
        };
        Self {
            renderer,
            listing,
            mode: estimate.into(),
            config,
            records: Vec::new(),
            page: 1,
            pages_fetched: 0,
            consecutive_empty: 0,
            stop: None,
        }
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    /// Whether the loop has reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.stop.is_some()
    }

    /// Marks the session cancelled. No further pages will be fetched; the
    /// records accumulated so far survive into the outcome.
    pub fn cancel(&mut self) {
        if self.stop.is_none() {
            self.stop = Some(StopReason::Cancelled);
        }
    }

    /// Fetches and extracts the next page, then applies the stopping policy.
    /// Returns `None` once the loop has terminated; a fetch failure
    /// terminates the loop and is reported through the outcome.
    pub async fn step(&mut self) -> Option<PageReport> {
        if self.stop.is_some() {
            return None;
        }

        if self.page > 1 && !self.config.page_delay.is_zero() {
            tokio::time::sleep(self.config.page_delay).await;
        }

        let url = self.listing.page_url(self.page);
        let html = match self.renderer.render(&url).await {
            Ok(html) => html,
            Err(err) => {
                tracing::error!("page {} fetch failed: {err}", self.page);
                self.stop = Some(StopReason::Fetch(err));
                return None;
            }
        };

        // Parse and extract before the next await; the decision for this
        // page must be made on its fully materialized outcome.
        let found = {
            let document = Html::parse_document(&html);
            extract::extract_records(&document)
        };
        self.pages_fetched += 1;

        let report = PageReport {
            page: self.page,
            records_found: found.len(),
            total_records: self.records.len() + found.len(),
        };

        if found.is_empty() {
            self.consecutive_empty += 1;
            tracing::info!(
                "page {}: no records ({} empty in a row)",
                self.page,
                self.consecutive_empty
            );
        } else {
            self.consecutive_empty = 0;
            tracing::info!(
                "page {}: {} records ({} total)",
                self.page,
                found.len(),
                report.total_records
            );
            self.records.extend(found);
        }

        let snapshot = Snapshot {
            page: self.page,
            consecutive_empty: self.consecutive_empty,
        };
        match decide(snapshot, self.mode, self.config.max_pages) {
            Decision::Continue => self.page += 1,
            Decision::Stop(reason) => self.stop = Some(reason),
        }

        Some(report)
    }

    /// Drives the loop until it terminates.
    pub async fn run_to_end(mut self) -> HarvestOutcome {
        while self.step().await.is_some() {}
        self.into_outcome()
    }

    /// Finalizes the session. Finalizing a session that never reached a
    /// terminal state counts as a cancellation.
    pub fn into_outcome(self) -> HarvestOutcome {
        HarvestOutcome {
            records: self.records,
            pages_fetched: self.pages_fetched,
            stop: self.stop.unwrap_or(StopReason::Cancelled),
        }
    }
}
