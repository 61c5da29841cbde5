//! Prints one of each transfer event the way a console renderer would.
use chrono::Utc;
use model::events::{Event, progress::ProgressSnapshot, transfer::TransferEvent};
use std::time::Duration;

fn main() {
    let run_id = "run-2026-10-18".to_string();

    let events = vec![
        TransferEvent::RunStarted {
            run_id: run_id.clone(),
            collections: vec!["users".into(), "orders".into()],
            timestamp: Utc::now(),
        },
        TransferEvent::JobStarted {
            run_id: run_id.clone(),
            collection: "users".into(),
            total: 1005,
            page_size: 1000,
            timestamp: Utc::now(),
        },
        TransferEvent::Progress {
            run_id: run_id.clone(),
            collection: "users".into(),
            snapshot: ProgressSnapshot {
                processed: 1000,
                total: 1005,
                bytes_transferred: 84_000,
                elapsed: Duration::from_millis(400),
            },
            percentage: 100,
            records_per_second: 2500.0,
            eta_seconds: Some(0),
            timestamp: Utc::now(),
        },
        TransferEvent::JobCompleted {
            run_id: run_id.clone(),
            collection: "users".into(),
            processed: 1005,
            bytes_transferred: 84_420,
            duration_ms: 410,
            timestamp: Utc::now(),
        },
        TransferEvent::JobFailed {
            run_id: run_id.clone(),
            collection: "orders".into(),
            error: "write failed at offset 1000".into(),
            processed: 1000,
            timestamp: Utc::now(),
        },
        TransferEvent::RunCompleted {
            run_id,
            completed: 1,
            failed: 1,
            duration_ms: 900,
            timestamp: Utc::now(),
        },
    ];

    for event in &events {
        println!("{:<14} {}", event.event_type(), event);
    }

    println!("\n--- JSON ---");
    for event in &events {
        match serde_json::to_string(event) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize event: {e}"),
        }
    }
}
