//! `batch` subcommand: CSV in, markdown summary and CSV exports out.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use revan_analyzer::{run_batch, BatchOptions, CancelToken};
use revan_core::{AppConfig, BatchRun, RunStatus};
use revan_report::{
    load_reviews_from_path, render_text, write_failures_csv, write_results_csv, BatchSummary,
};

use crate::BatchArgs;

/// Run a batch over the reviews in `args.input`.
///
/// Ctrl-c stops new reviews from starting; in-flight reviews finish and the
/// partial run is still reported and exported.
///
/// # Errors
///
/// Returns an error if the input cannot be loaded, review ids collide, an
/// output file cannot be written, or the run aborts on repeated endpoint
/// failures. Individual review failures are recorded, not propagated.
pub(crate) async fn run_batch_command(config: &AppConfig, args: &BatchArgs) -> anyhow::Result<()> {
    let mut reviews = load_reviews_from_path(&args.input)?;
    if let Some(limit) = args.limit {
        reviews.truncate(limit);
    }

    let mut options = BatchOptions::from_config(config);
    if let Some(concurrency) = args.concurrency {
        options.max_concurrency = concurrency;
    }

    if args.dry_run {
        println!(
            "dry-run: would analyze {} reviews from {} with model {} ({} mode, concurrency {})",
            reviews.len(),
            args.input.display(),
            config.model,
            config.analysis_mode,
            options.max_concurrency
        );
        return Ok(());
    }

    let analyzer = crate::build_analyzer(config)?;

    let cancel = CancelToken::new();
    let ctrl_c_watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received; finishing in-flight reviews");
                cancel.cancel();
            }
        })
    };

    let run = run_batch(&analyzer, &reviews, &options, &cancel).await;
    ctrl_c_watcher.abort();
    let run = run?;

    println!("{}", render_text(&BatchSummary::from_run(&run)));

    if let Some(path) = &args.output {
        export(path, |file| write_results_csv(&run, file, args.include_failures))?;
        println!("results written to {}", path.display());
    }
    if let Some(path) = &args.failures_output {
        export(path, |file| write_failures_csv(&run, file))?;
        println!("failures written to {}", path.display());
    }

    finish(&run)
}

fn export<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<(), revan_report::ReportError>,
{
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    write(BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))
}

fn finish(run: &BatchRun) -> anyhow::Result<()> {
    match run.status() {
        RunStatus::Aborted => anyhow::bail!(
            "batch aborted after repeated endpoint failures ({} of {} reviews analyzed)",
            run.results().len(),
            run.total()
        ),
        RunStatus::Cancelled => {
            println!(
                "batch cancelled ({} of {} reviews analyzed)",
                run.results().len(),
                run.total()
            );
            Ok(())
        }
        RunStatus::Completed => Ok(()),
    }
}
