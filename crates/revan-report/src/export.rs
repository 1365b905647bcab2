//! CSV export of batch runs.

use std::io::Write;

use csv::Writer;
use revan_core::BatchRun;

use crate::error::ReportError;

const RESULT_COLUMNS: [&str; 6] = [
    "review_id",
    "sentiment",
    "topics",
    "summary",
    "product_id",
    "product_name",
];

/// Write one row per analysis result, topics joined with `;`. Product
/// columns are blank for reviews loaded without product data.
///
/// With `include_failures`, an `error` column is appended and every failure
/// follows the results as a row carrying only its id and
/// `"<kind>: <reason>"`.
///
/// # Errors
///
/// Returns [`ReportError`] if writing or flushing fails.
pub fn write_results_csv<W: Write>(
    run: &BatchRun,
    writer: W,
    include_failures: bool,
) -> Result<(), ReportError> {
    let mut csv_writer = Writer::from_writer(writer);

    let mut header = RESULT_COLUMNS.to_vec();
    if include_failures {
        header.push("error");
    }
    csv_writer.write_record(&header)?;

    for result in run.results() {
        let topics = result.topics_joined();
        let mut row = vec![
            result.review_id.as_str(),
            result.sentiment.as_str(),
            topics.as_str(),
            result.summary.as_str(),
            result.product_id.as_deref().unwrap_or_default(),
            result.product_name.as_deref().unwrap_or_default(),
        ];
        if include_failures {
            row.push("");
        }
        csv_writer.write_record(&row)?;
    }

    let mut rows = run.results().len();
    if include_failures {
        for failure in run.failures() {
            let error = format!("{}: {}", failure.kind, failure.reason);
            let mut row = [""; RESULT_COLUMNS.len() + 1];
            row[0] = failure.review_id.as_str();
            row[RESULT_COLUMNS.len()] = error.as_str();
            csv_writer.write_record(row)?;
        }
        rows += run.failures().len();
    }

    csv_writer.flush()?;
    tracing::debug!(rows, "wrote results CSV");
    Ok(())
}

/// Write failures as `review_id,kind,reason`.
///
/// # Errors
///
/// Returns [`ReportError`] if writing or flushing fails.
pub fn write_failures_csv<W: Write>(run: &BatchRun, writer: W) -> Result<(), ReportError> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(["review_id", "kind", "reason"])?;
    for failure in run.failures() {
        csv_writer.write_record([
            failure.review_id.as_str(),
            failure.kind.as_str(),
            failure.reason.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
