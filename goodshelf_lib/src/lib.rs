//! Library layer for Goodshelf: resilient extraction and pagination for a
//! paginated, authenticated shelf listing.
//!
//! The rendering collaborator ([`Renderer`]) produces logged-in HTML
//! documents; this crate turns them into normalized [`Record`]s, estimates
//! how many pages the listing spans, and decides when the harvest is
//! complete versus merely interrupted by a transient empty page.

pub mod error;
pub mod extract;
pub mod harvest;
pub mod listing;
pub mod paginate;
pub mod record;
pub mod render;
pub mod text;
pub mod validation;

mod user_agent;

pub use error::HarvestError;
pub use harvest::{
    HarvestConfig, HarvestOutcome, Harvester, PageReport, PaginationMode, StopReason,
};
pub use listing::ShelfListing;
pub use paginate::PageEstimate;
pub use record::Record;
pub use render::{HttpRenderer, RenderError, Renderer};
