use crate::error::CliError;
use engine_runtime::RunSummary;
use model::events::transfer::TransferEvent;
use std::{path::Path, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};

fn generate_report_json(summary: &RunSummary) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub async fn write_report(summary: &RunSummary, path: impl AsRef<Path>) -> Result<(), CliError> {
    let report_json = generate_report_json(summary)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

/// Prints each event as it arrives until the channel closes.
pub fn spawn_renderer(mut events: mpsc::Receiver<Arc<TransferEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{event}");
        }
    })
}

/// Per-job table with failed jobs listed separately.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Run {} finished in {:.2}s: {} completed, {} failed{}\n",
        summary.run_id,
        summary.elapsed().as_secs_f64(),
        summary.completed_count(),
        summary.failed_count(),
        if summary.cancelled { " (cancelled)" } else { "" }
    ));
    out.push_str(&format!(
        "{:<32} {:<10} {:>12} {:>12} {:>10}\n",
        "Collection", "State", "Records", "Bytes", "Time"
    ));

    for job in &summary.jobs {
        out.push_str(&format!(
            "{:<32} {:<10} {:>12} {:>12} {:>9.2}s\n",
            job.collection,
            job.state,
            job.processed,
            job.bytes_transferred,
            job.elapsed().as_secs_f64()
        ));
    }

    let failed: Vec<_> = summary.failed().collect();
    if !failed.is_empty() {
        out.push_str("\nFailed collections:\n");
        for job in failed {
            let reason = job
                .error
                .as_ref()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown error");
            out.push_str(&format!("  - {}: {}\n", job.collection, reason));
        }
    }

    if summary.metrics.write_discrepancies > 0 {
        out.push_str(&format!(
            "\nWarning: targets acknowledged {} fewer record(s) than were sent\n",
            summary.metrics.write_discrepancies
        ));
    }

    out
}

pub fn print_summary(summary: &RunSummary) {
    print!("{}", render_summary(summary));
}
