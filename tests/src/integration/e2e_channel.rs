//! # End-to-End Channel Flows
//!
//! App and vault negotiate a session, then talk only through sealed
//! envelopes on the shared bus:
//!
//! 1. **Handshake**: each side derives the same key from its own private key
//! 2. **Round trip**: `request` -> `forVault` -> responder -> `forApp` -> caller
//! 3. **Persistence**: a persisted session key is restored and keeps working
//! 4. **Expiry**: an expired session fails locally until a new handshake

#[cfg(test)]
mod tests {
    use crate::fixtures::{counting_handler, Channel, Recorder, NAMESPACE, SESSION_NAME, SESSION_TTL};
    use serde_json::json;
    use shared_types::EnvelopeCodec;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use vc_01_secure_session::{SessionError, SessionState};
    use vc_03_request_correlator::{CorrelationError, ErrorKind};

    /// Test: Both sides derived the same key from swapped public keys
    #[tokio::test]
    async fn test_e2e_handshake_agrees() {
        let channel = Channel::negotiate();

        let sealed = channel
            .app_session
            .read()
            .encrypt(b"hello vault")
            .unwrap();
        let opened = channel.vault_session.read().decrypt(&sealed).unwrap();
        assert_eq!(opened, b"hello vault");

        assert_eq!(channel.app.state(SESSION_NAME), SessionState::Established);
        assert_eq!(channel.vault.state(NAMESPACE), SessionState::Established);
    }

    /// Test: Request/response round trip over the bus
    #[tokio::test]
    async fn test_e2e_round_trip() {
        let channel = Channel::negotiate();
        let (handler, calls) = counting_handler();
        let _vault = channel.serve(handler).await;
        let correlator = channel.correlator();

        assert_eq!(correlator.request("ping", json!({})).await.unwrap(), json!("pong"));
        assert_eq!(
            correlator
                .request("echo", json!({"vote": "yes"}))
                .await
                .unwrap(),
            json!({"vote": "yes"})
        );

        let err = correlator.request("wipe", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(channel.vault_guard.len(), 3);
        assert_eq!(channel.app_guard.len(), 3);
        assert_eq!(correlator.pending_count(), 0);
    }

    /// Test: Eavesdroppers see only ciphertext
    #[tokio::test]
    async fn test_e2e_bus_carries_no_plaintext() {
        let channel = Channel::negotiate();
        let (handler, _) = counting_handler();
        let _vault = channel.serve(handler).await;
        let recorder = Recorder::start(channel.tap(&format!("{NAMESPACE}.>")).await);

        channel
            .correlator()
            .request("echo", json!({"secret": "correct horse battery staple"}))
            .await
            .unwrap();
        assert!(crate::fixtures::eventually(|| recorder.len() == 2).await);

        for message in recorder.messages.lock().iter() {
            let text = String::from_utf8_lossy(&message.payload);
            assert!(!text.contains("correct horse"));
            assert!(EnvelopeCodec::new().decode(&message.payload).is_ok());
        }
    }

    /// Test: A persisted session survives restore; the replaced handle is dead
    #[tokio::test]
    async fn test_e2e_persist_and_restore() {
        let channel = Channel::negotiate();
        let (handler, _) = counting_handler();
        let _vault = channel.serve(handler).await;

        let before = channel.correlator();
        assert_eq!(before.request("ping", json!({})).await.unwrap(), json!("pong"));

        channel.app.persist(SESSION_NAME).unwrap();
        let restored = channel.app.restore(SESSION_NAME).unwrap().unwrap();

        // Restoring installs a new handle and clears the old one
        let err = before.request("ping", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            CorrelationError::Session(SessionError::SessionCleared)
        ));

        let after = channel.correlator_for(restored);
        assert_eq!(after.request("ping", json!({})).await.unwrap(), json!("pong"));
    }

    /// Test: Expired sessions fail locally; a new handshake recovers
    #[tokio::test]
    async fn test_e2e_expiry_and_rehandshake() {
        let mut channel = Channel::negotiate();
        let (handler, _) = counting_handler();
        let old_vault = channel.serve(handler.clone()).await;

        channel.clock.advance(SESSION_TTL + Duration::from_secs(1));
        assert_eq!(channel.app.state(SESSION_NAME), SessionState::Expired);

        let err = channel.correlator().request("ping", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            CorrelationError::Session(SessionError::SessionExpired { .. })
        ));
        assert_eq!(channel.bus.messages_published(), 0);

        old_vault.abort();
        channel.rehandshake();
        let _vault = channel.serve(handler).await;

        assert_eq!(
            channel.correlator().request("ping", json!({})).await.unwrap(),
            json!("pong")
        );
    }

    /// Test: Many concurrent calls each get their own answer
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_calls() {
        let channel = Channel::negotiate();
        let (handler, calls) = counting_handler();
        let _vault = channel.serve(handler).await;
        let correlator = Arc::new(channel.correlator());

        let handles: Vec<_> = (0..50)
            .map(|n| {
                let correlator = correlator.clone();
                tokio::spawn(async move {
                    let reply = correlator.request("echo", json!({ "n": n })).await;
                    (n, reply)
                })
            })
            .collect();

        for (n, reply) in futures::future::join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
        {
            assert_eq!(reply.unwrap(), json!({ "n": n }));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 50);
        assert_eq!(correlator.stats().completed, 50);
        assert_eq!(correlator.pending_count(), 0);
    }

    /// Test: Logging out kills every channel
    #[tokio::test]
    async fn test_e2e_logout() {
        let channel = Channel::negotiate();
        let correlator = channel.correlator();

        assert_eq!(channel.app.logout().unwrap(), 1);
        assert_eq!(channel.app.state(SESSION_NAME), SessionState::Unestablished);
        assert!(channel.app_session.read().state() == SessionState::Cleared);

        let err = correlator.request("ping", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);
    }
}
