//! Review ingestion from CSV.
//!
//! Expected columns: `product_id`, `product_name`, `review_text` (required)
//! and `review_id`, `date` (optional, `YYYY-MM-DD`). Column order does not
//! matter and extra columns are ignored. Rows with blank review text are
//! kept; the batch records them as empty-input failures.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use revan_core::Review;

use crate::error::ReportError;

const REQUIRED_COLUMNS: [&str; 3] = ["product_id", "product_name", "review_text"];

/// Column positions resolved from the header row.
struct Columns {
    product_id: usize,
    product_name: usize,
    review_text: usize,
    review_id: Option<usize>,
    date: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ReportError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        };

        match (
            position("product_id"),
            position("product_name"),
            position("review_text"),
        ) {
            (Some(product_id), Some(product_name), Some(review_text)) => Ok(Self {
                product_id,
                product_name,
                review_text,
                review_id: position("review_id"),
                date: position("date"),
            }),
            _ => Err(ReportError::MissingColumns(
                REQUIRED_COLUMNS
                    .iter()
                    .filter(|col| position(col).is_none())
                    .map(|col| (*col).to_string())
                    .collect(),
            )),
        }
    }

    fn review(&self, record: &StringRecord, line: u64) -> Result<Review, ReportError> {
        let field = |idx: usize| record.get(idx).unwrap_or_default();
        let optional = |idx: Option<usize>| {
            idx.map(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let date = match optional(self.date) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                ReportError::InvalidRow {
                    line,
                    reason: format!("invalid date '{raw}': {e}"),
                }
            })?),
            None => None,
        };

        Ok(Review {
            id: optional(self.review_id),
            text: field(self.review_text).to_string(),
            product_id: optional(Some(self.product_id)),
            product_name: optional(Some(self.product_name)),
            date,
        })
    }
}

/// Read reviews from CSV data with a header row.
///
/// # Errors
///
/// - [`ReportError::MissingColumns`] naming every absent required column.
/// - [`ReportError::InvalidRow`] for an unparseable date.
/// - [`ReportError::Csv`] for malformed CSV.
pub fn load_reviews<R: Read>(reader: R) -> Result<Vec<Review>, ReportError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut reviews = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        reviews.push(columns.review(&record, line)?);
    }

    tracing::debug!(reviews = reviews.len(), "loaded reviews from CSV");
    Ok(reviews)
}

/// Read reviews from a CSV file.
///
/// # Errors
///
/// Returns [`ReportError::File`] if the file cannot be opened, otherwise the
/// same errors as [`load_reviews`].
pub fn load_reviews_from_path(path: &Path) -> Result<Vec<Review>, ReportError> {
    let file = File::open(path).map_err(|source| ReportError::File {
        path: path.display().to_string(),
        source,
    })?;
    load_reviews(BufReader::new(file))
}
