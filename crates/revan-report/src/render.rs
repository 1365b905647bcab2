//! Markdown rendering of a [`BatchSummary`].
//!
//! Charts are horizontal bars drawn with block characters inside fenced code
//! blocks so they line up in a terminal and in rendered markdown alike.

use std::fmt;

use crate::summary::BatchSummary;

const BAR_WIDTH: usize = 30;
const TOP_TOPICS: usize = 10;

/// Render the summary as a markdown report.
#[must_use]
pub fn render_text(summary: &BatchSummary) -> String {
    Report(summary).to_string()
}

struct Report<'a>(&'a BatchSummary);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;

        writeln!(f, "# Review Analysis Report")?;
        writeln!(f)?;
        writeln!(f, "**Run**: {}", s.run_id)?;
        writeln!(f, "**Status**: {}", s.status)?;
        writeln!(
            f,
            "**Reviews**: {} ({} analyzed, {} failed)",
            s.total, s.analyzed, s.failed
        )?;
        for (sentiment, count) in &s.sentiment_counts {
            writeln!(f, "**{sentiment}**: {count}")?;
        }
        writeln!(f, "**Unique topics**: {}", s.unique_topics())?;
        if s.fallback_parses > 0 {
            writeln!(f, "**Fallback parses**: {}", s.fallback_parses)?;
        }

        writeln!(f)?;
        writeln!(f, "## Sentiment Distribution")?;
        writeln!(f)?;
        if s.analyzed == 0 {
            writeln!(f, "_No reviews were analyzed._")?;
        } else {
            let rows: Vec<(String, usize)> = s
                .sentiment_counts
                .iter()
                .map(|(sentiment, count)| (sentiment.to_string(), *count))
                .collect();
            write_chart(f, &rows)?;
        }

        writeln!(f)?;
        writeln!(f, "## Top Topics")?;
        writeln!(f)?;
        if s.topic_counts.is_empty() {
            writeln!(f, "_No topics detected._")?;
        } else {
            let rows: Vec<(String, usize)> =
                s.topic_counts.iter().take(TOP_TOPICS).cloned().collect();
            write_chart(f, &rows)?;
        }

        if !s.failure_counts.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Failures")?;
            writeln!(f)?;
            for (kind, count) in &s.failure_counts {
                writeln!(f, "- {kind}: {count}")?;
            }
        }

        if !s.products.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Sentiment by Product")?;
            writeln!(f)?;
            writeln!(f, "| Product | Positive | Neutral | Negative | Total |")?;
            writeln!(f, "|---------|----------|---------|----------|-------|")?;
            for p in &s.products {
                writeln!(
                    f,
                    "| {} | {} | {} | {} | {} |",
                    p.product.replace('|', "\\|"),
                    p.positive,
                    p.neutral,
                    p.negative,
                    p.total()
                )?;
            }
        }

        Ok(())
    }
}

fn write_chart(f: &mut fmt::Formatter<'_>, rows: &[(String, usize)]) -> fmt::Result {
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0);

    writeln!(f, "```")?;
    for (label, count) in rows {
        writeln!(f, "{label:<label_width$}  {} {count}", bar(*count, max))?;
    }
    writeln!(f, "```")
}

/// Bar proportional to `count / max`; any non-zero count gets at least one block.
fn bar(count: usize, max: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    "\u{2588}".repeat((count * BAR_WIDTH).div_ceil(max))
}
