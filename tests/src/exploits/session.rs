//! # Session Lifecycle Attacks
//!
//! Holding on to a session after it should be dead, or handing the key
//! exchange inputs it cannot use.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Channel, SESSION_NAME, SESSION_TTL};
    use shared_crypto::KeyPair;
    use shared_types::{Clock, SessionId};
    use std::time::Duration;
    use vc_01_secure_session::{SessionCrypto, SessionError, SessionState};

    fn exchange(
        channel: &Channel,
        own: &KeyPair,
        own_public: &[u8],
        peer_public: &[u8],
    ) -> Result<SessionCrypto, SessionError> {
        SessionCrypto::from_key_exchange(
            SessionId::new("s"),
            own.private_key(),
            own_public,
            peer_public,
            channel.clock.now() + chrono::Duration::hours(1),
            channel.clock(),
        )
    }

    /// Attack: Present a public key that does not belong to the private key
    #[test]
    fn test_mismatched_key_pair_rejected() {
        let channel = Channel::negotiate();
        let own = KeyPair::generate();
        let other = KeyPair::generate();
        let peer = KeyPair::generate();

        assert!(matches!(
            exchange(&channel, &own, other.public_key(), peer.public_key()),
            Err(SessionError::KeyPairMismatch)
        ));
    }

    /// Attack: Send a low-order point as the peer key
    #[test]
    fn test_low_order_peer_key_rejected() {
        let channel = Channel::negotiate();
        let own = KeyPair::generate();

        assert!(matches!(
            exchange(&channel, &own, own.public_key(), &[0u8; 32]),
            Err(SessionError::InvalidPublicKey)
        ));
    }

    /// Attack: Truncated peer key
    #[test]
    fn test_short_peer_key_rejected() {
        let channel = Channel::negotiate();
        let own = KeyPair::generate();

        assert!(matches!(
            exchange(&channel, &own, own.public_key(), &[7u8; 31]),
            Err(SessionError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        ));
    }

    /// Attack: Keep using a handle after the session was removed
    #[test]
    fn test_removed_session_handle_is_dead() {
        let channel = Channel::negotiate();
        let stolen = channel.app_session.clone();
        let captured = stolen.read().encrypt(b"before").unwrap();

        assert!(channel.app.remove(SESSION_NAME).unwrap());

        let handle = stolen.read();
        assert_eq!(handle.state(), SessionState::Cleared);
        assert_eq!(handle.encrypt(b"after"), Err(SessionError::SessionCleared));
        assert_eq!(handle.decrypt(&captured), Err(SessionError::SessionCleared));
        assert!(handle.export_key_for_storage().is_err());
    }

    /// Attack: Deliver traffic after the session lapsed
    #[test]
    fn test_expired_session_rejects_traffic() {
        let channel = Channel::negotiate();
        let captured = channel.app_session.read().encrypt(b"late").unwrap();

        channel.clock.advance(SESSION_TTL);
        assert!(matches!(
            channel.vault_session.read().decrypt(&captured),
            Err(SessionError::SessionExpired { .. })
        ));
    }

    /// Attack: Resurrect an expired session from storage
    #[test]
    fn test_expired_stored_session_is_discarded() {
        let channel = Channel::negotiate();
        channel.app.persist(SESSION_NAME).unwrap();
        assert_eq!(channel.app.store().len(), 1);

        channel.clock.advance(SESSION_TTL + Duration::from_secs(1));
        assert!(matches!(
            channel.app.restore(SESSION_NAME),
            Err(SessionError::SessionExpired { .. })
        ));
        assert!(channel.app.store().is_empty());
        assert!(channel.app.restore(SESSION_NAME).unwrap().is_none());
    }
}
