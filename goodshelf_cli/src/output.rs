//! Export writers: structured JSON document, lexicographic CSV, and a
//! terminal preview table.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use goodshelf_lib::Record;
use serde::Serialize;
use tabled::{Table, Tabled};

/// The structured export: generation timestamp, record count, and the
/// records in encounter order.
#[derive(Serialize)]
struct ExportDocument<'a> {
    scrape_date: String,
    total_books: usize,
    books: &'a [Record],
}

fn export_document(records: &[Record]) -> ExportDocument<'_> {
    ExportDocument {
        scrape_date: Utc::now().to_rfc3339(),
        total_books: records.len(),
        books: records,
    }
}

/// Writes the JSON export. Every record carries the same ten keys, defaults
/// included.
pub fn write_json_export(path: &Path, records: &[Record]) -> Result<()> {
    let document = export_document(records);
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document).context("serialize JSON export")?;
    writer.write_all(b"\n").context("finish JSON export")?;
    writer.flush().context("flush JSON export")?;
    Ok(())
}

/// Writes the CSV export: one row per record, columns = the union of keys
/// across all records, sorted lexicographically, header row first.
pub fn write_csv_export(path: &Path, records: &[Record]) -> Result<()> {
    let bytes = csv_bytes(records)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).context("write CSV export")?;
    writer.flush().context("flush CSV export")?;
    Ok(())
}

fn csv_bytes(records: &[Record]) -> Result<Vec<u8>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let rows = records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => bail!("record did not serialize to an object"),
        })
        .collect::<Result<Vec<_>>>()?;

    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().copied())
        .context("write CSV header")?;
    for row in &rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| csv_field(row.get(*column)))
            .collect();
        writer.write_record(&fields).context("write CSV row")?;
    }
    writer.flush().context("flush CSV rows")?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("finish CSV export: {err}"))
}

fn csv_field(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

// -- Preview table --

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Rating")]
    my_rating: u8,
    #[tabled(rename = "Avg")]
    avg_rating: f64,
    #[tabled(rename = "Pages")]
    pages: u32,
    #[tabled(rename = "Date Read")]
    date_read: String,
}

fn build_record_rows(records: &[Record]) -> Vec<RecordRow> {
    records
        .iter()
        .map(|record| RecordRow {
            title: clip(&record.title, 48),
            author: clip(&record.author, 28),
            my_rating: record.my_rating,
            avg_rating: record.avg_rating,
            pages: record.pages,
            date_read: record.date_read.clone(),
        })
        .collect()
}

/// Prints a summary table of the harvested records.
pub fn print_records_table(records: &[Record]) {
    println!("{}", Table::new(build_record_rows(records)));
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{clipped}\u{2026}")
}
