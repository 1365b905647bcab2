//! Ingest → run → summarize → export, without a model in the loop.

use revan_core::{
    AnalysisResult, BatchRecorder, FailureKind, ParseQuality, ReviewFailure, RunStatus, Sentiment,
};
use revan_report::{load_reviews, render_text, write_results_csv, BatchSummary};

const INPUT: &str = "\
product_id,product_name,review_text
P1,Desk Lamp,Arrived quickly and feels solid
P1,Desk Lamp,
P2,Kettle,Way overpriced for what you get
";

#[test]
fn csv_reviews_flow_through_summary_and_export() {
    let reviews = load_reviews(INPUT.as_bytes()).unwrap();
    assert_eq!(reviews.len(), 3);

    let recorder = BatchRecorder::new();
    for (index, review) in reviews.iter().enumerate() {
        let key = review.key(index);
        if review.is_blank() {
            recorder.record_failure(
                index,
                ReviewFailure {
                    review_id: key,
                    kind: FailureKind::EmptyInput,
                    reason: "review text is empty".to_string(),
                },
            );
            continue;
        }
        let negative = review.text.contains("overpriced");
        recorder.record_success(
            index,
            AnalysisResult {
                review_id: key,
                sentiment: if negative {
                    Sentiment::Negative
                } else {
                    Sentiment::Positive
                },
                topics: [(if negative { "pricing" } else { "delivery" }).to_string()].into(),
                summary: review.text.clone(),
                parse: ParseQuality::Full,
                product_id: review.product_id.clone(),
                product_name: review.product_name.clone(),
            },
        );
    }
    let run = recorder.finish(RunStatus::Completed);

    let summary = BatchSummary::from_run(&run);
    assert_eq!(summary.analyzed, 2);
    assert_eq!(summary.failed, 1);
    let products: Vec<(&str, usize)> = summary
        .products
        .iter()
        .map(|p| (p.product.as_str(), p.total()))
        .collect();
    assert_eq!(products, [("Desk Lamp", 1), ("Kettle", 1)]);

    let report = render_text(&summary);
    assert!(report.contains("| Kettle | 0 | 0 | 1 | 1 |"));

    let mut plain = Vec::new();
    write_results_csv(&run, &mut plain, false).unwrap();
    let plain = String::from_utf8(plain).unwrap();
    let plain: Vec<&str> = plain.lines().collect();
    assert_eq!(plain.len(), 3);
    assert_eq!(
        plain[2],
        "row-3,Negative,pricing,Way overpriced for what you get,P2,Kettle"
    );

    let mut flagged = Vec::new();
    write_results_csv(&run, &mut flagged, true).unwrap();
    let flagged = String::from_utf8(flagged).unwrap();
    assert_eq!(flagged.lines().count(), 4);
    assert!(flagged.contains("row-2,,,,,,empty_input: review text is empty"));
}
