#[cfg(test)]
mod tests {
    use crate::utils::{
        CancellingSink, FaultyTarget, RecordingSink, ScriptedSource, docs, engine, ids, pair,
        settings,
    };
    use connectors::memory::MemoryStore;
    use engine_config::settings::TransferSettings;
    use engine_core::{
        budget::estimate, context::job::CollectionPair, memory::FixedMemoryProbe, sink::NoopSink,
    };
    use engine_runtime::{TransferEngine, error::RunError};
    use model::{
        events::{Event, transfer::TransferEvent},
        execution::job::JobState,
        records::record::Record,
    };
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    async fn seeded(collections: &[(&str, usize)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (name, n) in collections {
            store.seed(name, docs(*n)).await;
        }
        store
    }

    #[tokio::test]
    async fn empty_source_completes_without_reads() {
        let src = seeded(&[("empty", 0)]).await;
        let dst = seeded(&[("empty", 3)]).await;
        let source = Arc::new(ScriptedSource::new(src.collection("empty")));
        let sink = Arc::new(RecordingSink::default());

        let summary = engine(100, sink.clone())
            .run(vec![CollectionPair::new(
                "empty",
                source.clone(),
                Arc::new(dst.collection("empty")),
            )])
            .await
            .unwrap();

        let job = summary.job("empty").unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.processed, 0);
        assert_eq!(source.read_calls(), 0);
        assert_eq!(dst.len("empty").await, 0, "target is still replaced");

        let completed = sink
            .events()
            .await
            .into_iter()
            .find(|e| e.event_type() == "job.completed")
            .unwrap();
        assert!(matches!(completed, TransferEvent::JobCompleted { processed: 0, .. }));
    }

    #[tokio::test]
    async fn copies_1005_records_in_two_batches() {
        let src = seeded(&[("users", 1005)]).await;
        let dst = MemoryStore::new();
        let source = Arc::new(ScriptedSource::new(src.collection("users")));
        let sink = Arc::new(RecordingSink::default());

        let summary = engine(1000, sink.clone())
            .run(vec![CollectionPair::new(
                "users",
                source.clone(),
                Arc::new(dst.collection("users")),
            )])
            .await
            .unwrap();

        let job = summary.job("users").unwrap();
        assert!(job.is_completed());
        assert_eq!(job.processed, 1005);
        assert_eq!(job.total, Some(1005));
        assert_eq!(source.read_calls(), 2);
        assert_eq!(summary.metrics.batches_written, 2);
        assert_eq!(sink.processed("users").await, vec![1000, 1005]);

        let last_progress = sink
            .events()
            .await
            .into_iter()
            .filter(|e| matches!(e, TransferEvent::Progress { .. }))
            .last()
            .unwrap();
        assert!(matches!(last_progress, TransferEvent::Progress { percentage: 100, .. }));

        assert_eq!(src.records("users").await, dst.records("users").await);
    }

    #[tokio::test]
    async fn every_page_size_copies_everything_in_order() {
        for n in [0usize, 1, 9, 10, 11, 250] {
            for page in [1usize, 3, 10, 1000] {
                let src = seeded(&[("items", n)]).await;
                let dst = MemoryStore::new();

                let summary = engine(page, Arc::new(NoopSink))
                    .run(vec![pair(&src, &dst, "items")])
                    .await
                    .unwrap();

                assert!(summary.is_success(), "n={n} page={page}");
                assert_eq!(summary.job("items").unwrap().processed, n as u64);
                assert_eq!(
                    ids(&dst.records("items").await),
                    (0..n as i64).collect::<Vec<_>>(),
                    "n={n} page={page}"
                );
            }
        }
    }

    #[tokio::test]
    async fn replace_is_idempotent() {
        let src = seeded(&[("orders", 42)]).await;
        let dst = MemoryStore::new();
        dst.seed("orders", vec![Record::new().with("_id", "stale"); 7])
            .await;

        let engine = engine(10, Arc::new(NoopSink));
        engine.run(vec![pair(&src, &dst, "orders")]).await.unwrap();
        let first = dst.records("orders").await;
        engine.run(vec![pair(&src, &dst, "orders")]).await.unwrap();
        let second = dst.records("orders").await;

        assert_eq!(first, second);
        assert_eq!(second, src.records("orders").await);
    }

    #[tokio::test]
    async fn failed_job_does_not_stop_the_run() {
        let src = seeded(&[("a", 25), ("b", 25), ("c", 25)]).await;
        let dst = seeded(&[("c", 3)]).await;
        let failing_b = FaultyTarget::failing_on(dst.collection("b"), 2);

        let summary = engine(10, Arc::new(NoopSink))
            .run(vec![
                pair(&src, &dst, "a"),
                CollectionPair::new("b", Arc::new(src.collection("b")), Arc::new(failing_b)),
                pair(&src, &dst, "c"),
            ])
            .await
            .unwrap();

        assert_eq!(summary.job("a").unwrap().state, JobState::Completed);
        assert_eq!(summary.job("c").unwrap().state, JobState::Completed);

        let b = summary.job("b").unwrap();
        assert_eq!(b.state, JobState::Failed);
        assert_eq!(b.processed, 10);
        let failure = b.error.as_ref().unwrap();
        assert_eq!(failure.kind, "write_failure");
        assert_eq!(failure.failed_in, JobState::Copying);
        assert!(failure.message.contains("b@10-"), "{}", failure.message);

        assert_eq!(summary.failed().map(|j| j.collection.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(dst.len("a").await, 25);
        assert_eq!(dst.len("b").await, 10);
        assert_eq!(dst.records("c").await, src.records("c").await);
        assert_eq!(summary.metrics.jobs_completed, 2);
        assert_eq!(summary.metrics.jobs_failed, 1);
    }

    #[tokio::test]
    async fn read_and_count_failures_are_isolated() {
        let src = seeded(&[("counted", 5), ("read", 30), ("ok", 5)]).await;
        let dst = MemoryStore::new();

        let summary = engine(10, Arc::new(NoopSink))
            .run(vec![
                CollectionPair::new(
                    "counted",
                    Arc::new(ScriptedSource::new(src.collection("counted")).failing_count()),
                    Arc::new(dst.collection("counted")),
                ),
                CollectionPair::new(
                    "read",
                    Arc::new(ScriptedSource::new(src.collection("read")).failing_read_at(20)),
                    Arc::new(dst.collection("read")),
                ),
                pair(&src, &dst, "ok"),
            ])
            .await
            .unwrap();

        let counted = summary.job("counted").unwrap();
        assert_eq!(counted.error.as_ref().unwrap().kind, "read_failure");
        assert_eq!(counted.error.as_ref().unwrap().failed_in, JobState::Preparing);
        assert_eq!(counted.total, None);

        let read = summary.job("read").unwrap();
        assert_eq!(read.processed, 20);
        assert!(read.error.as_ref().unwrap().message.contains("offset 20"));

        assert!(summary.job("ok").unwrap().is_completed());
    }

    #[traced_test]
    #[tokio::test]
    async fn stats_failure_falls_back_to_clamped_estimate() {
        let src = seeded(&[("users", 12)]).await;
        let dst = MemoryStore::new();
        let settings = TransferSettings::builder()
            .max_page_size(Some(5))
            .build()
            .unwrap();

        let summary = TransferEngine::new(&settings)
            .with_sink(Arc::new(NoopSink))
            .with_memory_probe(Arc::new(FixedMemoryProbe(1 << 20)))
            .run(vec![CollectionPair::new(
                "users",
                Arc::new(ScriptedSource::new(src.collection("users")).failing_stats()),
                Arc::new(dst.collection("users")),
            )])
            .await
            .unwrap();

        let job = summary.job("users").unwrap();
        assert!(job.is_completed());
        assert_eq!(job.page_size, Some(5));
        assert_eq!(summary.metrics.batches_written, 3);
        assert!(logs_contain("Failed to sample record size"));
    }

    #[tokio::test]
    async fn page_size_follows_memory_budget() {
        let src = seeded(&[("users", 50)]).await;
        let dst = MemoryStore::new();
        let avg = {
            let records = src.records("users").await;
            records.iter().map(|r| r.size_bytes() as u64).sum::<u64>() / records.len() as u64
        };
        let available = avg * 20;

        let summary = TransferEngine::new(&TransferSettings::default())
            .with_sink(Arc::new(NoopSink))
            .with_memory_probe(Arc::new(FixedMemoryProbe(available)))
            .run(vec![pair(&src, &dst, "users")])
            .await
            .unwrap();

        let job = summary.job("users").unwrap();
        assert_eq!(job.page_size, Some(estimate(available, avg)));
        assert_eq!(dst.len("users").await, 50);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_total() {
        let src = seeded(&[("a", 37), ("b", 8)]).await;
        let dst = MemoryStore::new();
        let sink = Arc::new(RecordingSink::default());

        engine(5, sink.clone())
            .run(vec![pair(&src, &dst, "a"), pair(&src, &dst, "b")])
            .await
            .unwrap();

        for (name, total) in [("a", 37u64), ("b", 8)] {
            let processed = sink.processed(name).await;
            assert!(processed.windows(2).all(|w| w[0] <= w[1]), "{name}: {processed:?}");
            assert_eq!(processed.last(), Some(&total));
        }
    }

    #[tokio::test]
    async fn events_bracket_the_run() {
        let src = seeded(&[("a", 3), ("b", 3)]).await;
        let dst = MemoryStore::new();
        let sink = Arc::new(RecordingSink::default());

        let summary = engine(2, sink.clone())
            .run(vec![pair(&src, &dst, "a"), pair(&src, &dst, "b")])
            .await
            .unwrap();

        let events = sink.events().await;
        assert_eq!(events.first().unwrap().event_type(), "run.started");
        assert_eq!(events.last().unwrap().event_type(), "run.completed");
        assert!(events.iter().all(|e| e.run_id() == summary.run_id));

        let terminal: Vec<_> = events
            .iter()
            .filter(|e| e.is_terminal())
            .filter_map(|e| e.collection())
            .collect();
        assert_eq!(terminal, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn cancellation_stops_between_batches() {
        let src = seeded(&[("a", 30), ("b", 10)]).await;
        let dst = seeded(&[("b", 4)]).await;
        let token = CancellationToken::new();
        let sink = Arc::new(CancellingSink::new(token.clone(), 1));

        let summary = TransferEngine::new(&settings(10))
            .with_sink(sink.clone())
            .with_cancellation(token)
            .run(vec![pair(&src, &dst, "a"), pair(&src, &dst, "b")])
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.completed_count(), 0);

        let a = summary.job("a").unwrap();
        assert_eq!(a.state, JobState::Failed);
        assert_eq!(a.processed, 10);
        assert_eq!(a.error.as_ref().unwrap().kind, "cancelled");
        assert_eq!(dst.len("a").await, 10);

        let b = summary.job("b").unwrap();
        assert_eq!(b.error.as_ref().unwrap().failed_in, JobState::Pending);
        assert_eq!(dst.len("b").await, 4, "unstarted target is left alone");
    }

    #[tokio::test]
    async fn cancel_after_final_page_keeps_job_completed() {
        let src = seeded(&[("a", 15)]).await;
        let dst = MemoryStore::new();
        let token = CancellationToken::new();
        let sink = Arc::new(CancellingSink::new(token.clone(), 2));

        let summary = TransferEngine::new(&settings(10))
            .with_sink(sink.clone())
            .with_cancellation(token.clone())
            .run(vec![pair(&src, &dst, "a")])
            .await
            .unwrap();

        assert!(token.is_cancelled());
        let a = summary.job("a").unwrap();
        assert_eq!(a.state, JobState::Completed);
        assert_eq!(a.processed, 15);
        assert!(a.error.is_none());
        assert_eq!(dst.records("a").await, src.records("a").await);
        assert!(!summary.cancelled, "nothing was stopped");
        assert!(summary.is_success());
    }

    #[tokio::test]
    async fn failed_clear_stops_job_before_any_write() {
        let src = seeded(&[("x", 5), ("y", 5)]).await;
        let dst = seeded(&[("x", 2)]).await;
        let target = Arc::new(FaultyTarget::failing_clear(dst.collection("x")));

        let summary = engine(10, Arc::new(NoopSink))
            .run(vec![
                CollectionPair::new("x", Arc::new(src.collection("x")), target.clone()),
                pair(&src, &dst, "y"),
            ])
            .await
            .unwrap();

        let x = summary.job("x").unwrap();
        assert_eq!(x.state, JobState::Failed);
        assert_eq!(x.processed, 0);
        let failure = x.error.as_ref().unwrap();
        assert_eq!(failure.failed_in, JobState::Preparing);
        assert_eq!(failure.kind, "prepare_failure");
        assert_eq!(target.insert_calls(), 0);
        assert_eq!(dst.len("x").await, 2, "target left as it was");

        assert_eq!(summary.job("y").unwrap().state, JobState::Completed);
        assert_eq!(dst.len("y").await, 5);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn short_acknowledgements_are_reported() {
        let src = seeded(&[("a", 20)]).await;
        let dst = MemoryStore::new();

        let summary = engine(10, Arc::new(NoopSink))
            .run(vec![CollectionPair::new(
                "a",
                Arc::new(src.collection("a")),
                Arc::new(FaultyTarget::under_acknowledging(dst.collection("a"), 1)),
            )])
            .await
            .unwrap();

        let job = summary.job("a").unwrap();
        assert!(job.is_completed());
        assert_eq!(job.processed, 20);
        assert_eq!(job.write_discrepancies, 2);
        assert_eq!(summary.metrics.write_discrepancies, 2);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let err = engine(10, Arc::new(NoopSink)).run(vec![]).await.unwrap_err();
        assert!(matches!(err, RunError::NoJobs));
    }

    #[tokio::test]
    async fn duplicate_selection_is_rejected() {
        let src = seeded(&[("a", 1)]).await;
        let dst = MemoryStore::new();
        let err = engine(10, Arc::new(NoopSink))
            .run(vec![pair(&src, &dst, "a"), pair(&src, &dst, "a")])
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::DuplicateCollection(name) if name == "a"));
    }
}
