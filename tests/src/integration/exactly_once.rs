//! # Exactly-Once Resolution
//!
//! The bus may delay, duplicate or never deliver a message. Each call still
//! resolves once, and nothing that arrives afterwards leaks into another
//! call.

#[cfg(test)]
mod tests {
    use crate::fixtures::{counting_handler, eventually, Channel, Recorder, NAMESPACE};
    use serde_json::json;
    use shared_bus::Bus;
    use shared_types::RequestId;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use vc_03_request_correlator::CorrelationError;

    fn vault_requests() -> String {
        format!("{NAMESPACE}.forVault.>")
    }

    /// Test: A response for a timed-out call is dropped and the call that
    /// is pending at that moment is untouched
    #[tokio::test]
    async fn test_late_response_does_not_resolve_newer_call() {
        let channel = Channel::negotiate();
        let requests = Recorder::start(channel.tap(&vault_requests()).await);
        let correlator = Arc::new(channel.correlator());
        let (handler, _) = counting_handler();
        let vault = channel.responder();

        let err = correlator
            .request_with("ping", json!({}), Duration::from_millis(100), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CorrelationError::Timeout { .. }));
        assert!(eventually(|| requests.len() == 1).await);
        let first_request = requests.first().unwrap();

        // A newer call is waiting while the old answer finally turns up
        let newer = {
            let correlator = correlator.clone();
            tokio::spawn(async move {
                correlator
                    .request_with("echo", json!({"n": 2}), Duration::from_secs(5), None)
                    .await
            })
        };
        assert!(eventually(|| correlator.pending_count() == 1).await);

        assert!(vault.handle(&first_request, &handler).await.unwrap());
        assert!(eventually(|| correlator.stats().late_responses == 1).await);
        assert_eq!(correlator.pending_count(), 1);

        // Now answer the newer call for real
        assert!(eventually(|| requests.len() == 2).await);
        let second_request = requests.messages.lock()[1].clone();
        assert!(vault.handle(&second_request, &handler).await.unwrap());

        assert_eq!(newer.await.unwrap().unwrap(), json!({"n": 2}));
        let stats = correlator.stats();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.late_responses, 1);
    }

    /// Test: The bus delivering a request twice runs the handler once
    #[tokio::test]
    async fn test_duplicate_request_executes_once() {
        let channel = Channel::negotiate();
        let (handler, calls) = counting_handler();
        let _vault = channel.serve(handler).await;
        let requests = Recorder::start(channel.tap(&vault_requests()).await);

        channel
            .correlator()
            .request("ping", json!({}))
            .await
            .unwrap();
        assert!(eventually(|| requests.len() == 1).await);

        let captured = requests.first().unwrap();
        channel
            .bus
            .publish(&captured.subject, captured.payload.clone())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(channel.vault_guard.len() >= 1);
    }

    /// Test: Interleaved operations number each request subject on its own,
    /// so the vault sees consecutive sequences and no gap
    #[tokio::test]
    async fn test_sequences_are_per_request_subject() {
        let channel = Channel::negotiate();
        let (handler, _) = counting_handler();
        let _vault = channel.serve(handler).await;
        let correlator = channel.correlator();

        correlator.request("ping", json!({})).await.unwrap();
        correlator.request("echo", json!({"n": 1})).await.unwrap();
        correlator.request("ping", json!({})).await.unwrap();

        let guard = &channel.vault_guard;
        assert_eq!(
            guard.last_sequence(&format!("{NAMESPACE}.forVault.ping")),
            Some(2)
        );
        assert_eq!(
            guard.last_sequence(&format!("{NAMESPACE}.forVault.echo")),
            Some(1)
        );
    }

    /// Test: Cancelling releases the pending entry and the response listener
    #[tokio::test]
    async fn test_cancel_releases_resources() {
        let channel = Channel::negotiate();
        let correlator = Arc::new(channel.correlator());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let call = {
            let correlator = correlator.clone();
            tokio::spawn(async move {
                correlator
                    .request_with("ping", json!({}), Duration::from_secs(30), Some(cancel_rx))
                    .await
            })
        };
        assert!(eventually(|| correlator.pending_count() == 1).await);
        assert_eq!(channel.bus.subscriber_count(), 1);

        cancel_tx.send(true).unwrap();
        assert!(matches!(
            call.await.unwrap(),
            Err(CorrelationError::Cancelled { .. })
        ));

        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.listener_count(), 0);
        assert!(eventually(|| channel.bus.subscriber_count() == 0).await);
    }

    /// Test: Generated request ids do not collide
    #[test]
    fn test_request_ids_unique() {
        let ids: HashSet<RequestId> = (0..10_000).map(|_| RequestId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
