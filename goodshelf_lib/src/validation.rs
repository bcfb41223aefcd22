//! Input validation for operator-supplied parameters.

use crate::error::HarvestError;
use crate::harvest::MAX_PAGES;

pub const MAX_USER_ID_LENGTH: usize = 64;

/// Validates a listing user id: the numeric profile id, optionally followed
/// by a name slug (e.g. `171519754-trevor-redmond`).
pub fn validate_user_id(raw: &str) -> Result<String, HarvestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HarvestError::InvalidInput(
            "user id must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_USER_ID_LENGTH {
        return Err(HarvestError::InvalidInput(format!(
            "user id too long (max {MAX_USER_ID_LENGTH} characters)"
        )));
    }
    if !trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(HarvestError::InvalidInput(
            "user id must start with the numeric profile id".to_string(),
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(HarvestError::InvalidInput(format!(
            "user id contains unsupported characters: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates a per-run page ceiling: between 1 and [`MAX_PAGES`].
pub fn validate_max_pages(pages: u32) -> Result<u32, HarvestError> {
    if pages == 0 || pages > MAX_PAGES {
        return Err(HarvestError::InvalidInput(format!(
            "max pages must be between 1 and {MAX_PAGES}"
        )));
    }
    Ok(pages)
}
