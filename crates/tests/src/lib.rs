//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Wire payload and channel contracts
//! - Source -> provider -> consumer flows with in-memory and directory sources
//! - Settings-driven wiring

#[cfg(test)]
mod contract_tests {
    use contracts::{ClusterIdentity, PatchAction, PatchRequest, TargetKind};

    /// Documented wire payload decodes, validates and re-encodes losslessly
    #[test]
    fn test_wire_payload_contract() {
        let payload = br#"{"id":"abc","revision":12,"rc_version":3,"action":"apply",
            "k8s_target":{"cluster":"prod","kind":"deployment","name":"web","namespace":"default"},
            "lib_config":{"language":"java","version":"latest","tracing_enabled":true}}"#;

        let request = PatchRequest::decode("datadog/2/APM_TRACING/abc/config", payload).unwrap();
        assert_eq!(request.action, PatchAction::Apply);
        assert_eq!(request.kind(), &TargetKind::deployment());
        assert_eq!(request.lib_config.tracing_enabled, Some(true));
        request.validate(&ClusterIdentity::new("prod")).unwrap();

        let encoded = serde_json::to_vec(&request).unwrap();
        let decoded = PatchRequest::decode("again", &encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn test_update_channel_never_zero_capacity() {
        let (tx, rx) = contracts::update_channel(0);
        tx.send(contracts::UpdateBatch::new()).await.unwrap();
        assert!(rx.recv().await.unwrap().is_empty());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ClusterIdentity, RawUpdate, UpdateBatch, UpdateMetadata};
    use provider::{
        always_leader, ConsumerHandle, JsonlConsumer, LogConsumer, PatchProvider,
        PatchProviderBuilder, ProviderConfig, ProviderError, ProviderState,
    };
    use serde_json::json;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use upstream::{ChannelSource, DirectorySource, DirectorySourceConfig, UpdatePublisher};

    fn payload(id: &str, kind: &str) -> String {
        json!({
            "id": id,
            "revision": 42,
            "rc_version": 7,
            "k8s_target": {
                "cluster": "prod",
                "kind": kind,
                "name": "checkout",
                "namespace": "shop"
            },
            "lib_config": {
                "language": "python",
                "version": "v2.4.0",
                "tracing_sampling_rate": 0.5
            }
        })
        .to_string()
    }

    fn entry(path: &str, config: impl Into<Vec<u8>>) -> (String, RawUpdate) {
        (
            path.to_string(),
            RawUpdate::new(config.into(), UpdateMetadata::apm_tracing(path, 1)),
        )
    }

    fn cluster() -> ClusterIdentity {
        ClusterIdentity::new("prod").with_supported_kinds(["A", "B"])
    }

    /// Start `provider` on a task and wait for `publisher` to accept batches
    async fn start(
        provider: &Arc<PatchProvider>,
        publisher: &UpdatePublisher,
        cancel: &CancellationToken,
    ) -> JoinHandle<Result<(), ProviderError>> {
        let handle = tokio::spawn({
            let provider = Arc::clone(provider);
            let cancel = cancel.clone();
            async move { provider.start(cancel).await }
        });
        while !publisher.is_open() {
            tokio::task::yield_now().await;
        }
        handle
    }

    /// One valid kind-A entry reaches the kind-A subscriber with its fields intact
    #[tokio::test]
    async fn test_valid_entry_delivered() {
        let (source, publisher) = ChannelSource::new("rc");
        let provider =
            Arc::new(PatchProvider::new(Some(Arc::new(source)), always_leader(), cluster()).unwrap());
        let mut rx_a = provider.subscribe("A");
        let cancel = CancellationToken::new();
        let handle = start(&provider, &publisher, &cancel).await;

        publisher
            .publish(UpdateBatch::from([entry("path1", payload("x1", "A"))]))
            .await
            .unwrap();

        let request = rx_a.recv().await.unwrap();
        assert_eq!(request.id, "x1");
        assert_eq!(request.revision, 42);
        assert_eq!(request.rc_version, 7);
        assert_eq!(request.k8s_target.namespace, "shop");
        assert_eq!(request.lib_config.tracing_sampling_rate, Some(0.5));

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(provider.state(), ProviderState::Stopped);
        assert!(rx_a.try_recv().is_err());
    }

    /// A non-JSON entry is dropped and later batches still flow
    #[tokio::test]
    async fn test_garbage_entry_dropped() {
        let (source, publisher) = ChannelSource::new("rc");
        let provider =
            Arc::new(PatchProvider::new(Some(Arc::new(source)), always_leader(), cluster()).unwrap());
        let mut rx_a = provider.subscribe("A");
        let cancel = CancellationToken::new();
        let handle = start(&provider, &publisher, &cancel).await;

        publisher
            .publish(UpdateBatch::from([entry("path1", "not-json")]))
            .await
            .unwrap();
        publisher
            .publish(UpdateBatch::from([entry("path2", payload("after", "A"))]))
            .await
            .unwrap();

        assert_eq!(rx_a.recv().await.unwrap().id, "after");

        cancel.cancel();
        handle.await.unwrap().unwrap();

        let summary = provider.metrics().summary();
        assert_eq!(summary.total_batches, 2);
        assert_eq!(summary.total_delivered, 1);
    }

    /// Only the subscribed kind receives; the other entry is dropped silently
    #[tokio::test]
    async fn test_unsubscribed_kind_dropped() {
        let (source, publisher) = ChannelSource::new("rc");
        let provider =
            Arc::new(PatchProvider::new(Some(Arc::new(source)), always_leader(), cluster()).unwrap());
        let mut rx_a = provider.subscribe("A");
        let cancel = CancellationToken::new();
        let handle = start(&provider, &publisher, &cancel).await;

        publisher
            .publish(UpdateBatch::from([
                entry("path1", payload("a1", "A")),
                entry("path2", payload("b1", "B")),
            ]))
            .await
            .unwrap();

        assert_eq!(rx_a.recv().await.unwrap().id, "a1");

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert!(rx_a.try_recv().is_err());
        assert_eq!(provider.metrics().delivered_count(), 1);
    }

    #[test]
    fn test_absent_source_fails_construction() {
        let result = PatchProvider::new(None, always_leader(), cluster());
        assert!(matches!(result, Err(ProviderError::Initialization { .. })));
    }

    /// A consumer worker drains every delivered request before it is joined
    #[tokio::test]
    async fn test_consumer_drains_every_request() {
        let (source, publisher) = ChannelSource::new("rc");
        let provider = Arc::new(
            PatchProviderBuilder::new(cluster())
                .source(Arc::new(source))
                .config(ProviderConfig {
                    queue_capacity: 2,
                    update_buffer: 1,
                })
                .build()
                .unwrap(),
        );
        let rx_a = provider.subscribe("A");
        let cancel = CancellationToken::new();
        let handle = start(&provider, &publisher, &cancel).await;

        let consumer = ConsumerHandle::spawn(LogConsumer::new("A".into()), rx_a);

        for i in 0..20 {
            let path = format!("p{i}");
            publisher
                .publish(UpdateBatch::from([entry(&path, payload(&format!("r{i}"), "A"))]))
                .await
                .unwrap();
        }

        while provider.metrics().delivered_count() < 20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        handle.await.unwrap().unwrap();
        drop(provider);

        let stats = consumer.join().await;
        assert_eq!(stats.applied(), 20);
        assert_eq!(stats.failures(), 0);
    }

    /// Directory source -> provider -> JSONL consumer
    #[tokio::test]
    async fn test_directory_source_to_jsonl() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_path = output.path().join("a.jsonl");

        std::fs::write(input.path().join("one.json"), payload("d1", "A")).unwrap();
        std::fs::write(input.path().join("two.json"), payload("d2", "B")).unwrap();
        std::fs::write(input.path().join("three.json"), "{broken").unwrap();

        let source = DirectorySource::new(
            DirectorySourceConfig::new(input.path()).with_poll_interval(Duration::from_millis(20)),
        )
        .unwrap();
        let provider = Arc::new(
            PatchProviderBuilder::new(cluster())
                .source(Arc::new(source))
                .build()
                .unwrap(),
        );
        let rx_a = provider.subscribe("A");
        let consumer =
            ConsumerHandle::spawn(JsonlConsumer::open(&"A".into(), &out_path).unwrap(), rx_a);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let provider = Arc::clone(&provider);
            let cancel = cancel.clone();
            async move { provider.start(cancel).await }
        });

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while provider.metrics().delivered_count() < 1 {
            assert!(tokio::time::Instant::now() < deadline, "no delivery in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        cancel.cancel();
        handle.await.unwrap().unwrap();
        drop(provider);
        let stats = consumer.join().await;
        assert_eq!(stats.applied(), 1);

        let content = std::fs::read_to_string(&out_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let request: contracts::PatchRequest = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(request.id, "d1");
    }
}

#[cfg(test)]
mod settings_tests {
    use config_loader::{ConfigFormat, SettingsLoader};
    use contracts::{OutputType, SourceSettings};

    #[test]
    fn test_settings_drive_provider_config() {
        let settings = SettingsLoader::load_from_str(
            r#"
[cluster]
name = "prod"
supported_kinds = ["deployment", "statefulset"]

[provider]
queue_capacity = 32

[source]
type = "directory"
path = "/var/lib/patches"

[[subscribers]]
kind = "deployment"

[[subscribers]]
kind = "statefulset"
output = "jsonl"
path = "/tmp/statefulset.jsonl"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(settings.provider.queue_capacity, 32);
        assert!(matches!(settings.source, SourceSettings::Directory { .. }));
        assert_eq!(settings.subscribers[1].output, OutputType::Jsonl);
        for subscriber in &settings.subscribers {
            assert!(settings.cluster.supports(&subscriber.kind));
        }
    }

    #[test]
    fn test_aggregator_matches_batch_summaries() {
        let mut aggregator = observability::DistributionAggregator::new();
        let mut summary = contracts::BatchSummary {
            received: 3,
            decode_failures: 1,
            ..Default::default()
        };
        summary.record_delivery(&"deployment".into());
        summary.record_delivery(&"deployment".into());
        aggregator.update(&summary);

        let report = aggregator.summary();
        assert_eq!(report.total_batches, 1);
        assert_eq!(report.total_received, 3);
        assert_eq!(report.total_delivered, 2);
        assert_eq!(report.delivered_by_kind.get("deployment"), Some(&2));
    }
}
