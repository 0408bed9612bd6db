//! # Replay Attacks
//!
//! The attacker cannot read or forge envelopes, but can capture and
//! re-publish them at will.

#[cfg(test)]
mod tests {
    use crate::fixtures::Channel;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use shared_types::{EnvelopeCodec, RequestId, VaultResponse};
    use std::sync::Arc;
    use std::time::Duration;
    use vc_02_replay_guard::{
        MessageCheck, ReplayGuard, ReplayGuardConfig, ReplayVerdict, SequenceCheck,
        TimestampRejection,
    };
    use vc_03_request_correlator::{PendingRequestStore, ResponseRouter, RouteOutcome};

    fn router(channel: &Channel) -> (ResponseRouter, Arc<PendingRequestStore>) {
        let pending = Arc::new(PendingRequestStore::new(Duration::from_secs(30)));
        let router = ResponseRouter::new(
            channel.app_session.clone(),
            channel.app_guard.clone(),
            pending.clone(),
            EnvelopeCodec::new(),
        );
        (router, pending)
    }

    /// Attack: Re-publish a captured request hours later
    #[test]
    fn test_stale_request_rejected() {
        let channel = Channel::negotiate();
        let responder = channel.responder();

        let mut request = channel.request("transfer");
        request.timestamp = request.timestamp - ChronoDuration::minutes(10);
        let message = channel.sealed_request(&request);

        assert!(responder.open_request(&message).unwrap().is_none());
        assert!(channel.vault_guard.is_empty());
    }

    /// Attack: Pre-date a request into the future to extend its life
    #[test]
    fn test_future_request_rejected() {
        let channel = Channel::negotiate();
        let responder = channel.responder();

        let mut request = channel.request("transfer");
        request.timestamp = request.timestamp + ChronoDuration::minutes(5);

        assert!(responder
            .open_request(&channel.sealed_request(&request))
            .unwrap()
            .is_none());
    }

    /// Attack: Replay a request inside the freshness window
    #[test]
    fn test_replayed_request_rejected() {
        let channel = Channel::negotiate();
        let responder = channel.responder();
        let message = channel.sealed_request(&channel.request("vote"));

        let inbound = responder.open_request(&message).unwrap().unwrap();
        assert_eq!(inbound.request.kind, "vote");
        assert_eq!(inbound.reply_subject, "alice.forApp.vote");

        assert!(responder.open_request(&message).unwrap().is_none());
    }

    /// Attack: Replay an old response while the same id is pending again
    #[tokio::test]
    async fn test_replayed_response_cannot_complete_reused_id() {
        let channel = Channel::negotiate();
        let responder = channel.responder();
        let (router, pending) = router(&channel);
        let id = RequestId::new();

        let bytes = responder
            .seal_response(VaultResponse::success(id.clone(), json!("approved")), "alice.forApp.vote")
            .unwrap();
        let message = shared_bus::BusMessage::new("alice.forApp.vote", bytes);

        let first = pending.register(id.clone(), "vote", None).unwrap();
        assert_eq!(router.route(&message), RouteOutcome::Completed);
        assert!(first.await.is_ok());

        let _second = pending.register(id.clone(), "vote", None).unwrap();
        assert_eq!(router.route(&message), RouteOutcome::Replayed);
        assert!(pending.is_pending(&id));
    }

    /// Attack: Replay after the record has been evicted from a full cache
    #[test]
    fn test_eviction_boundary() {
        let channel = Channel::negotiate();
        let config = ReplayGuardConfig {
            max_entries: 8,
            ..ReplayGuardConfig::default()
        };
        let guard = ReplayGuard::new(config, channel.clock()).unwrap();
        let stamp = shared_types::Clock::now(channel.clock.as_ref());

        let check = |id: &str| MessageCheck::new(id).with_timestamp(stamp);
        for i in 0..7 {
            assert!(guard.validate_message(&check(format!("evt-{i}").as_str())).is_valid());
        }
        assert_eq!(guard.validate_message(&check("evt-0")), ReplayVerdict::Duplicate);
        assert!(guard.validate_message(&check("evt-7")).is_valid());
        assert_eq!(guard.len(), 8);

        // At capacity the oldest quarter goes before the next insert
        assert!(guard.validate_message(&check("evt-8")).is_valid());
        assert!(!guard.is_processed("evt-0"));
        assert!(!guard.is_processed("evt-1"));
        assert!(guard.is_processed("evt-2"));
        assert!(guard.validate_message(&check("evt-0")).is_valid());
    }

    /// Attack: Reorder and replay sequence numbers
    #[test]
    fn test_sequence_anomalies_are_reported() {
        let channel = Channel::negotiate();
        let guard = &channel.app_guard;
        let stamp = shared_types::Clock::now(channel.clock.as_ref());
        let check = |id: &str, seq: i64| {
            MessageCheck::new(id)
                .with_timestamp(stamp)
                .with_sequence("alice.forApp.vote", seq)
        };

        assert_eq!(
            guard.validate_message(&check("a", 5)),
            ReplayVerdict::Valid(SequenceCheck::First)
        );
        assert_eq!(
            guard.validate_message(&check("b", 6)),
            ReplayVerdict::Valid(SequenceCheck::InOrder)
        );
        assert_eq!(
            guard.validate_message(&check("c", 9)),
            ReplayVerdict::Valid(SequenceCheck::Gap {
                expected: 7,
                received: 9
            })
        );
        assert_eq!(
            guard.validate_message(&check("d", 7)),
            ReplayVerdict::Valid(SequenceCheck::Replay {
                last_seen: 9,
                received: 7
            })
        );
        assert_eq!(guard.last_sequence("alice.forApp.vote"), Some(9));
    }

    /// Attack: Timestamp exactly on the window edge
    #[test]
    fn test_window_edges_inclusive() {
        let channel = Channel::negotiate();
        let guard = &channel.app_guard;
        let now = shared_types::Clock::now(channel.clock.as_ref());

        assert!(guard.check_timestamp(now - ChronoDuration::seconds(300), now).is_ok());
        assert!(matches!(
            guard.check_timestamp(now - ChronoDuration::seconds(301), now),
            Err(TimestampRejection::TooOld { .. })
        ));
        assert!(guard.check_timestamp(now + ChronoDuration::seconds(60), now).is_ok());
        assert!(matches!(
            guard.check_timestamp(now + ChronoDuration::seconds(61), now),
            Err(TimestampRejection::InFuture { .. })
        ));
    }
}
