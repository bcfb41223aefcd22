//! Listing URL construction for a user's "read" shelf.

use url::Url;

use crate::error::HarvestError;

/// Records served per listing page; fixed by how the listing URLs are built.
pub const PER_PAGE: u32 = 20;

/// Production base URL for the listing site.
pub const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

/// A user's shelf listing. Knows how to address the listing itself and each
/// numbered page of it.
#[derive(Debug, Clone)]
pub struct ShelfListing {
    base_url: Url,
    user_id: String,
}

impl ShelfListing {
    /// Creates a listing against the production site.
    pub fn new(user_id: &str) -> Result<Self, HarvestError> {
        Self::with_base_url(DEFAULT_BASE_URL, user_id)
    }

    /// Creates a listing with a custom base URL. Used for testing against a
    /// local mock server.
    pub fn with_base_url(base_url: &str, user_id: &str) -> Result<Self, HarvestError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        Ok(Self {
            base_url,
            user_id: user_id.to_string(),
        })
    }

    /// URL of the listing's first page, without an explicit page parameter.
    pub fn first_page_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/review/list/{}", self.user_id));
        url.query_pairs_mut()
            .append_pair("shelf", "read")
            .append_pair("per_page", &PER_PAGE.to_string());
        url
    }

    /// URL of page `n` of the listing (1-indexed).
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.first_page_url();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_url_has_shelf_and_page_size() {
        let listing = ShelfListing::new("171519754-trevor-redmond").unwrap();
        assert_eq!(
            listing.first_page_url().as_str(),
            "https://www.goodreads.com/review/list/171519754-trevor-redmond?shelf=read&per_page=20"
        );
    }

    #[test]
    fn page_url_appends_page_parameter() {
        let listing = ShelfListing::new("42").unwrap();
        let url = listing.page_url(3);
        assert!(url.as_str().ends_with("shelf=read&per_page=20&page=3"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let listing = ShelfListing::with_base_url("http://127.0.0.1:8080/", "42").unwrap();
        assert_eq!(
            listing.page_url(1).as_str(),
            "http://127.0.0.1:8080/review/list/42?shelf=read&per_page=20&page=1"
        );
    }

    #[test]
    fn rejects_garbage_base_url() {
        assert!(ShelfListing::with_base_url("not a url", "42").is_err());
    }
}
