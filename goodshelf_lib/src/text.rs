//! Text cleaning shared by the field extractors.

use std::sync::LazyLock;

use regex::Regex;

static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static REVIEW_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^review\s*\n?").unwrap());
static TRAILING_MORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n?\.\.\.\s*more\s*$").unwrap());
static TRAILING_EDIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n?\[edit\]\s*$").unwrap());
static DATE_READ_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)date read\s*").unwrap());
static EDIT_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[edit\]").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Text that a review cell shows when there is no review.
const REVIEW_JUNK: &[&str] = &["write a review", "[edit]", "...more"];

/// Collapses every whitespace run, newlines included, to a single space and
/// trims the ends.
pub fn collapse_whitespace(raw: &str) -> String {
    WS_RUN.replace_all(raw.trim(), " ").into_owned()
}

/// First decimal-aware numeric substring, e.g. `"4.27 avg"` -> `4.27`.
pub fn first_decimal(raw: &str) -> Option<f64> {
    DECIMAL.find(raw)?.as_str().parse().ok()
}

/// First integer substring, e.g. `"688pp"` -> `688`.
pub fn first_integer(raw: &str) -> Option<u32> {
    INTEGER.find(raw)?.as_str().parse().ok()
}

/// First four-digit substring, e.g. `"Aug 01, 1965"` -> `1965`.
pub fn first_year(raw: &str) -> Option<u16> {
    YEAR.find(raw)?.as_str().parse().ok()
}

/// Cleans the raw text of a review cell.
///
/// Drops the leading "review" label line, trailing "...more" truncation
/// markers and trailing "[edit]" links, collapses whitespace, and treats
/// leftover cell chrome ("write a review" etc.) as no review at all.
pub fn clean_review_text(raw: &str) -> String {
    let text = REVIEW_LABEL.replace(raw.trim(), "");
    let text = TRAILING_MORE.replace(&text, "");
    let text = TRAILING_EDIT.replace(&text, "");
    let text = collapse_whitespace(&text);
    if REVIEW_JUNK.iter().any(|junk| text.eq_ignore_ascii_case(junk)) {
        return String::new();
    }
    text
}

/// Cleans a date-read cell: drops the "date read" label and "[edit]"
/// markers, collapses whitespace. `None` when nothing usable remains.
pub fn clean_date_read(raw: &str) -> Option<String> {
    let text = DATE_READ_LABEL.replace_all(raw, "");
    let text = EDIT_MARKER.replace_all(&text, "");
    let text = collapse_whitespace(&text);
    if text.is_empty() || text.eq_ignore_ascii_case("not set") {
        None
    } else {
        Some(text)
    }
}

/// Cleans a date-added cell. When the cell text still carries its
/// "date added" label the value is the last non-empty line; a cell that is
/// only the label yields an empty string.
pub fn clean_date_added(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.to_lowercase().starts_with("date added") {
        return raw.to_string();
    }
    let last = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last();
    match last {
        Some(line) if !line.eq_ignore_ascii_case("date added") => line.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- collapse_whitespace --

    #[test]
    fn collapse_newlines_and_runs() {
        assert_eq!(
            collapse_whitespace("  Dune\n      (Dune, #1)  "),
            "Dune (Dune, #1)"
        );
    }

    #[test]
    fn collapse_empty_input() {
        assert_eq!(collapse_whitespace("   \n  "), "");
    }

    // -- numeric extraction --

    #[test]
    fn decimal_from_mixed_text() {
        assert_eq!(first_decimal("avg rating 4.27"), Some(4.27));
    }

    #[test]
    fn decimal_without_fraction() {
        assert_eq!(first_decimal("4 of 5"), Some(4.0));
    }

    #[test]
    fn integer_from_page_count() {
        assert_eq!(first_integer("688pp"), Some(688));
    }

    #[test]
    fn integer_missing() {
        assert_eq!(first_integer("unknown"), None);
    }

    #[test]
    fn year_skips_short_digit_runs() {
        assert_eq!(first_year("Aug 01, 1965"), Some(1965));
    }

    #[test]
    fn year_missing() {
        assert_eq!(first_year("unknown"), None);
    }

    // -- review cleaner --

    #[test]
    fn review_strips_label_and_more_marker() {
        assert_eq!(clean_review_text("Review\nGreat book!\n...more"), "Great book!");
    }

    #[test]
    fn review_edit_marker_alone_is_empty() {
        assert_eq!(clean_review_text("[edit]"), "");
    }

    #[test]
    fn review_write_a_review_chrome_is_empty() {
        assert_eq!(clean_review_text("Write a Review"), "");
    }

    #[test]
    fn review_trailing_edit_is_stripped() {
        assert_eq!(clean_review_text("Loved it.\n[edit]"), "Loved it.");
    }

    #[test]
    fn review_newlines_collapse_to_spaces() {
        assert_eq!(
            clean_review_text("Review\nFirst paragraph.\n\nSecond   paragraph."),
            "First paragraph. Second paragraph."
        );
    }

    // -- date cleaning --

    #[test]
    fn date_read_label_and_edit_removed() {
        assert_eq!(
            clean_date_read("date read\n  Mar 12, 2023\n  [edit]"),
            Some("Mar 12, 2023".to_string())
        );
    }

    #[test]
    fn date_read_not_set_is_none() {
        assert_eq!(clean_date_read("date read\n not set"), None);
    }

    #[test]
    fn date_read_empty_is_none() {
        assert_eq!(clean_date_read("   "), None);
    }

    #[test]
    fn date_added_takes_last_line_after_label() {
        assert_eq!(clean_date_added("Date added\n\nJan 01, 2023"), "Jan 01, 2023");
    }

    #[test]
    fn date_added_without_label_passes_through() {
        assert_eq!(clean_date_added(" Jan 02, 2023 "), "Jan 02, 2023");
    }

    #[test]
    fn date_added_label_only_is_empty() {
        assert_eq!(clean_date_added("date added\n  \n"), "");
    }
}
