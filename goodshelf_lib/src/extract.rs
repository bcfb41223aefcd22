//! Record-set and field extraction from rendered listing pages.
//!
//! Listing markup drifts, so nothing here trusts a single selector: row
//! location and every field lookup are ordered fallback chains, evaluated in
//! rank order with the first non-empty match winning. Field extraction is
//! total: a missing or mangled cell lands on the field's default, never an
//! error, so one corrupt fragment can never abort a page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::record::Record;
use crate::text;

/// Image host referenced by genuine record rows; used by the last-resort
/// row heuristic.
const IMAGE_HOST: &str = "goodreads.com";

static ROW_CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.bookalike.review").unwrap());
static ROW_FUZZY_BOOKALIKE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"tr[class*="bookalike"]"#).unwrap());
static ROW_FUZZY_REVIEW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"tr[class*="review"]"#).unwrap());
static ANY_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static ANY_IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

static TITLE_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.field.title").unwrap());
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.bookTitle").unwrap());
static LINK_WITH_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[title]").unwrap());
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static AUTHOR_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.author").unwrap());
static COVER_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.cover img").unwrap());

static RATING_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.rating").unwrap());
static STARS_WITH_RATING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.stars[data-rating]").unwrap());
static STATIC_STARS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.staticStars").unwrap());
static FUZZY_STAR_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"span[class*="stars"]"#).unwrap());
static FUZZY_STAR_DIV: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[class*="stars"]"#).unwrap());
static STAR_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"img[src*="star"]"#).unwrap());

static DATE_READ_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.date_read").unwrap());
static DATE_READ_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.date_read_value, span.date_read_value").unwrap());
static DATE_ADDED_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.date_added").unwrap());
static DATE_ADDED_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.date_added_value, span.date_added_value").unwrap());

static REVIEW_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.review").unwrap());
static FREETEXT_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"span[id^="freeText"]"#).unwrap());
static VALUE_DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.value").unwrap());

static AVG_RATING_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.avg_rating").unwrap());
static PAGES_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.num_pages").unwrap());
static DATE_PUB_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.field.date_pub").unwrap());

/// Ranked structural matchers for locating record rows; evaluated in order,
/// first non-empty result wins.
const ROW_STRATEGIES: &[(&str, for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>)] = &[
    ("canonical-row-class", rows_canonical),
    ("fuzzy-class-token", rows_fuzzy),
    ("image-host-heuristic", rows_by_image_host),
];

/// Locates the repeated record fragments on a page.
///
/// Returns an empty vector when no strategy matches; the caller treats that
/// as a possibly-transient empty page, not an error.
pub fn record_rows(document: &Html) -> Vec<ElementRef<'_>> {
    for (name, strategy) in ROW_STRATEGIES {
        let rows = strategy(document);
        if !rows.is_empty() {
            tracing::debug!("row strategy {name} matched {} rows", rows.len());
            return rows;
        }
    }
    Vec::new()
}

fn rows_canonical(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&ROW_CANONICAL).collect()
}

fn rows_fuzzy(document: &Html) -> Vec<ElementRef<'_>> {
    let rows: Vec<_> = document.select(&ROW_FUZZY_BOOKALIKE).collect();
    if !rows.is_empty() {
        return rows;
    }
    document.select(&ROW_FUZZY_REVIEW).collect()
}

/// Last resort under unknown markup: any table row that embeds an image
/// served by the site still "looks like" a listing row.
fn rows_by_image_host(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&ANY_ROW)
        .filter(|row| {
            row.select(&ANY_IMG).next().is_some() && row.html().contains(IMAGE_HOST)
        })
        .collect()
}

/// Runs field extraction over every record fragment on the page, in document
/// order.
pub fn extract_records(document: &Html) -> Vec<Record> {
    record_rows(document)
        .into_iter()
        .map(extract_record)
        .collect()
}

/// Extracts the full field schema from one record fragment. Total: every
/// missing or unparsable field falls back to its default.
pub fn extract_record(row: ElementRef<'_>) -> Record {
    let mut record = Record::default();

    if let Some(title) = extract_title(row) {
        record.title = title;
    }
    if let Some(author) = extract_author(row) {
        record.author = author;
    }
    if let Some(url) = extract_cover_url(row) {
        record.cover_url = url;
    }
    if let Some(rating) = extract_my_rating(row) {
        record.my_rating = rating;
        record.rating_present = true;
    }
    if let Some(date) = extract_date_read(row) {
        record.date_read = date;
    }
    if let Some(date) = extract_date_added(row) {
        record.date_added = date;
    }
    if let Some(review) = extract_review(row) {
        record.review = review;
    }
    if let Some(avg) = extract_avg_rating(row) {
        record.avg_rating = avg;
    }
    if let Some(pages) = extract_pages(row) {
        record.pages = pages;
    }
    if let Some(year) = extract_publication_year(row) {
        record.publication_year = year;
    }

    record
}

/// Title cell: the title-role link, then any link, then the bare cell text's
/// first line. Whitespace runs collapse to single spaces.
fn extract_title(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&TITLE_CELL).next()?;
    let link = cell
        .select(&TITLE_LINK)
        .next()
        .or_else(|| cell.select(&LINK_WITH_TITLE).next())
        .or_else(|| cell.select(&ANY_LINK).next());
    let raw = match link {
        Some(link) => link.text().collect::<String>(),
        None => {
            let cell_text = cell.text().collect::<String>();
            cell_text.trim().lines().next().unwrap_or("").to_string()
        }
    };
    let title = text::collapse_whitespace(&raw);
    (!title.is_empty()).then_some(title)
}

fn extract_author(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&AUTHOR_CELL).next()?;
    let raw = match cell.select(&ANY_LINK).next() {
        Some(link) => link.text().collect::<String>(),
        None => cell.text().collect::<String>(),
    };
    let author = raw.trim().to_string();
    (!author.is_empty()).then_some(author)
}

fn extract_cover_url(row: ElementRef<'_>) -> Option<String> {
    let img = row.select(&COVER_IMG).next()?;
    img.value().attr("src").map(str::to_string)
}

/// Rating cell: the star widget's `data-rating` attribute, else the legacy
/// star span's title or text, else a count of filled-star images.
fn extract_my_rating(row: ElementRef<'_>) -> Option<u8> {
    let cell = row.select(&RATING_CELL).next()?;

    if let Some(stars) = cell.select(&STARS_WITH_RATING).next() {
        let value = stars.value().attr("data-rating").unwrap_or("");
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return None;
        }
        return value.trim().parse().ok();
    }

    let legacy = cell
        .select(&STATIC_STARS)
        .next()
        .or_else(|| cell.select(&FUZZY_STAR_SPAN).next())
        .or_else(|| cell.select(&FUZZY_STAR_DIV).next());
    if let Some(span) = legacy {
        let label = match span.value().attr("title") {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => span.text().collect::<String>(),
        };
        return text::first_integer(&label).and_then(|n| u8::try_from(n).ok());
    }

    let filled = cell
        .select(&STAR_IMG)
        .filter(|img| {
            img.value()
                .attr("src")
                .is_some_and(|src| src.contains("filled"))
        })
        .count();
    if filled > 0 {
        u8::try_from(filled).ok()
    } else {
        None
    }
}

fn extract_date_read(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&DATE_READ_CELL).next()?;
    let raw: String = match cell.select(&DATE_READ_VALUE).next() {
        Some(value) => value.text().collect(),
        None => cell.text().collect(),
    };
    text::clean_date_read(&raw)
}

fn extract_date_added(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&DATE_ADDED_CELL).next()?;
    let raw: String = match cell.select(&DATE_ADDED_VALUE).next() {
        Some(value) => value.text().collect(),
        None => cell.text().collect(),
    };
    Some(text::clean_date_added(&raw))
}

/// Review cell: the hidden full-text span (id prefixed `freeText` but not
/// `freeTextContainer`), else the value sub-element truncated at its
/// "[edit]" link, else the bare cell text. Always run through the review
/// cleaner.
fn extract_review(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&REVIEW_CELL).next()?;

    let full_text = cell.select(&FREETEXT_SPAN).find(|span| {
        span.value()
            .id()
            .is_some_and(|id| !id.starts_with("freeTextContainer"))
    });

    let raw = if let Some(span) = full_text {
        span.text().collect::<String>()
    } else if let Some(value) = cell.select(&VALUE_DIV).next() {
        let joined = value.text().collect::<Vec<_>>().join(" ");
        joined.split("[edit]").next().unwrap_or("").trim().to_string()
    } else {
        cell.text().collect::<String>()
    };

    Some(text::clean_review_text(&raw))
}

fn extract_avg_rating(row: ElementRef<'_>) -> Option<f64> {
    let cell = row.select(&AVG_RATING_CELL).next()?;
    let raw: String = cell.text().collect();
    text::first_decimal(&raw)
}

fn extract_pages(row: ElementRef<'_>) -> Option<u32> {
    let cell = row.select(&PAGES_CELL).next()?;
    let raw: String = cell.text().collect();
    text::first_integer(&raw)
}

fn extract_publication_year(row: ElementRef<'_>) -> Option<u16> {
    let cell = row.select(&DATE_PUB_CELL).next()?;
    let raw: String = cell.text().collect();
    text::first_year(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DATE_READ_NOT_SET;

    const SHELF_PAGE: &str = include_str!("../tests/fixtures/shelf_page.html");

    fn first_record(html: &str) -> Record {
        let document = Html::parse_document(html);
        let rows = record_rows(&document);
        assert!(!rows.is_empty(), "fixture has no record rows");
        extract_record(rows[0])
    }

    fn row_html(cells: &str) -> String {
        format!(
            r#"<html><body><table><tbody>
                <tr class="bookalike review">{cells}</tr>
            </tbody></table></body></html>"#
        )
    }

    // -- record_rows strategies --

    #[test]
    fn canonical_rows_found() {
        let document = Html::parse_document(SHELF_PAGE);
        assert_eq!(record_rows(&document).len(), 2);
    }

    #[test]
    fn fuzzy_class_rows_found() {
        let html = r#"<html><body><table>
            <tr class="bookalike_v2"><td class="field title"><a>X</a></td></tr>
        </table></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(record_rows(&document).len(), 1);
    }

    #[test]
    fn review_token_rows_found_when_bookalike_absent() {
        let html = r#"<html><body><table>
            <tr class="review_row"><td class="field title"><a>X</a></td></tr>
        </table></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(record_rows(&document).len(), 1);
    }

    #[test]
    fn image_host_heuristic_rows_found() {
        let html = r#"<html><body><table>
            <tr><td><img src="https://i.gr-assets.goodreads.com/x.jpg"/></td></tr>
            <tr><td>no image here</td></tr>
            <tr><td><img src="https://elsewhere.example/y.jpg"/></td></tr>
        </table></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(record_rows(&document).len(), 1);
    }

    #[test]
    fn no_rows_is_empty_not_an_error() {
        let document = Html::parse_document("<html><body><p>maintenance</p></body></html>");
        assert!(record_rows(&document).is_empty());
    }

    // -- full fixture extraction --

    #[test]
    fn fixture_first_row_extracts_all_fields() {
        let record = first_record(SHELF_PAGE);
        assert_eq!(record.title, "Dune (Dune, #1)");
        assert_eq!(record.author, "Herbert, Frank");
        assert!(record.cover_url.contains("goodreads.com/books"));
        assert_eq!(record.my_rating, 5);
        assert!(record.rating_present);
        assert_eq!(record.date_read, "Mar 12, 2023");
        assert_eq!(record.date_added, "Jan 02, 2023");
        assert_eq!(record.review, "A sweeping epic of politics and prophecy.");
        assert_eq!(record.avg_rating, 4.27);
        assert_eq!(record.pages, 688);
        assert_eq!(record.publication_year, 1965);
    }

    #[test]
    fn fixture_sparse_row_falls_back_to_defaults() {
        let document = Html::parse_document(SHELF_PAGE);
        let rows = record_rows(&document);
        let record = extract_record(rows[1]);
        assert_eq!(record.title, "The Hobbit");
        assert_eq!(record.author, "Tolkien, J.R.R.");
        assert_eq!(record.my_rating, 0);
        assert!(!record.rating_present);
        assert_eq!(record.date_read, DATE_READ_NOT_SET);
        assert_eq!(record.date_added, "");
        assert_eq!(record.review, "");
        assert_eq!(record.pages, 0);
        assert_eq!(record.publication_year, 0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let document = Html::parse_document(SHELF_PAGE);
        let rows = record_rows(&document);
        assert_eq!(extract_record(rows[0]), extract_record(rows[0]));
    }

    // -- per-field fallbacks --

    #[test]
    fn title_falls_back_to_any_link() {
        let record = first_record(&row_html(
            r#"<td class="field title"><div class="value"><a href="/b/1">Plain Link Title</a></div></td>"#,
        ));
        assert_eq!(record.title, "Plain Link Title");
    }

    #[test]
    fn title_falls_back_to_cell_text_first_line() {
        let record = first_record(&row_html(
            "<td class=\"field title\">Bare Title\nsecond line</td>",
        ));
        assert_eq!(record.title, "Bare Title");
    }

    #[test]
    fn title_missing_cell_defaults_to_unknown() {
        let record = first_record(&row_html(
            r#"<td class="field author"><a>Someone</a></td>"#,
        ));
        assert_eq!(record.title, "Unknown");
    }

    #[test]
    fn author_falls_back_to_cell_text() {
        let record = first_record(&row_html(
            r#"<td class="field author"><div class="value">No Link Author</div></td>"#,
        ));
        assert_eq!(record.author, "No Link Author");
    }

    #[test]
    fn rating_null_attribute_is_rejected() {
        let record = first_record(&row_html(
            r#"<td class="field rating"><div class="stars" data-rating="null"></div></td>"#,
        ));
        assert_eq!(record.my_rating, 0);
        assert!(!record.rating_present);
    }

    #[test]
    fn rating_from_legacy_star_span_title() {
        let record = first_record(&row_html(
            r#"<td class="field rating"><span class="staticStars" title="4 of 5 stars"></span></td>"#,
        ));
        assert_eq!(record.my_rating, 4);
        assert!(record.rating_present);
    }

    #[test]
    fn rating_from_fuzzy_star_span_text() {
        let record = first_record(&row_html(
            r#"<td class="field rating"><span class="stars_small">3 stars</span></td>"#,
        ));
        assert_eq!(record.my_rating, 3);
    }

    #[test]
    fn rating_from_filled_star_image_count() {
        let record = first_record(&row_html(
            r#"<td class="field rating">
                <img src="/img/star_filled.png"/>
                <img src="/img/star_filled.png"/>
                <img src="/img/star_empty.png"/>
            </td>"#,
        ));
        assert_eq!(record.my_rating, 2);
        assert!(record.rating_present);
    }

    #[test]
    fn review_prefers_full_text_span_over_container() {
        let record = first_record(&row_html(
            r#"<td class="field review"><div class="value">
                <span id="freeTextContainer99">Truncated prev...</span>
                <span id="freeText99">The complete review text.</span>
            </div></td>"#,
        ));
        assert_eq!(record.review, "The complete review text.");
    }

    #[test]
    fn review_value_div_truncates_at_edit_marker() {
        let record = first_record(&row_html(
            r#"<td class="field review"><div class="value">Short thoughts. [edit]tail</div></td>"#,
        ));
        assert_eq!(record.review, "Short thoughts.");
    }

    #[test]
    fn date_read_whole_cell_fallback() {
        let record = first_record(&row_html(
            "<td class=\"field date_read\">date read\n Feb 10, 2021 [edit]</td>",
        ));
        assert_eq!(record.date_read, "Feb 10, 2021");
    }

    #[test]
    fn empty_row_is_all_defaults() {
        let record = first_record(&row_html("<td></td>"));
        assert_eq!(record, Record::default());
    }
}
