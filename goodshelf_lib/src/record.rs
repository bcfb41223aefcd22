//! The normalized record for one harvested shelf item.

use serde::Serialize;

/// Sentinel exported for a shelf entry whose read date was never set.
pub const DATE_READ_NOT_SET: &str = "Date read not set";

/// One harvested item.
///
/// Every field is always present with a type-correct value: extraction never
/// omits a key, it falls back to the defaults below. Exports carry exactly
/// these ten keys per record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub my_rating: u8,
    pub date_read: String,
    pub date_added: String,
    pub review: String,
    pub avg_rating: f64,
    pub pages: u32,
    pub publication_year: u16,
    /// Whether a star rating was actually extracted. A `my_rating` of 0 with
    /// this unset means "no rating found", not "rated zero stars". Never
    /// exported.
    #[serde(skip)]
    pub rating_present: bool,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            author: "Unknown".to_string(),
            cover_url: String::new(),
            my_rating: 0,
            date_read: DATE_READ_NOT_SET.to_string(),
            date_added: String::new(),
            review: String::new(),
            avg_rating: 0.0,
            pages: 0,
            publication_year: 0,
            rating_present: false,
        }
    }
}
