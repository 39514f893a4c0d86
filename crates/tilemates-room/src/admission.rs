//! Admission control: the accept/reject decision made before a session
//! exists.
//!
//! The policy runs against the live registry and has no side effects —
//! a rejected join leaves no partial state behind, and the client layer
//! decides whether the user retries.

use crate::{RoomError, SessionRegistry};
use tilemates_protocol::RoomId;

/// Why a join request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionRejection {
    /// The room is at its session ceiling.
    #[error("room is full")]
    RoomFull,

    /// The wallet identity already has an active session in this room.
    #[error("wallet already active in this room")]
    DuplicateWallet,
}

impl AdmissionRejection {
    /// Converts the rejection into a [`RoomError`] for the given room.
    pub fn into_room_error(self, room_id: RoomId) -> RoomError {
        match self {
            Self::RoomFull => RoomError::RoomFull(room_id),
            Self::DuplicateWallet => RoomError::DuplicateWallet(room_id),
        }
    }
}

/// Decides whether a join request may proceed.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    max_clients: usize,
}

impl AdmissionPolicy {
    /// Creates a policy with the given session ceiling.
    pub fn new(max_clients: usize) -> Self {
        Self { max_clients }
    }

    /// Reviews a join request against the current occupancy.
    ///
    /// Capacity is checked first, then wallet uniqueness. Anonymous
    /// requests (`None`) are exempt from the duplicate-wallet guard —
    /// deduplication only applies when an identity is present.
    pub fn review(
        &self,
        registry: &SessionRegistry,
        wallet: Option<&str>,
    ) -> Result<(), AdmissionRejection> {
        if registry.len() >= self.max_clients {
            return Err(AdmissionRejection::RoomFull);
        }
        if let Some(wallet) = wallet {
            if registry.wallet_active(wallet) {
                return Err(AdmissionRejection::DuplicateWallet);
            }
        }
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpawnPoint;
    use tilemates_protocol::SessionId;

    fn registry_with(walletted: &[&str], anonymous: usize) -> SessionRegistry {
        let mut reg = SessionRegistry::new(SpawnPoint::default());
        for (i, w) in walletted.iter().enumerate() {
            reg.create(
                SessionId::from(format!("w{i}").as_str()),
                Some(w.to_string()),
            )
            .unwrap();
        }
        for i in 0..anonymous {
            reg.create(SessionId::from(format!("a{i}").as_str()), None)
                .unwrap();
        }
        reg
    }

    #[test]
    fn test_review_accepts_up_to_capacity() {
        let policy = AdmissionPolicy::new(5);
        for occupied in 0..5 {
            let reg = registry_with(&[], occupied);
            assert!(
                policy.review(&reg, Some("W-new")).is_ok(),
                "join {occupied} of 5 should be admitted"
            );
        }
    }

    #[test]
    fn test_review_rejects_when_full() {
        let policy = AdmissionPolicy::new(5);
        let reg = registry_with(&[], 5);

        let result = policy.review(&reg, Some("W-new"));

        assert_eq!(result, Err(AdmissionRejection::RoomFull));
    }

    #[test]
    fn test_review_rejects_duplicate_wallet_regardless_of_capacity() {
        let policy = AdmissionPolicy::new(5);
        let reg = registry_with(&["W1"], 0);

        let result = policy.review(&reg, Some("W1"));

        assert_eq!(result, Err(AdmissionRejection::DuplicateWallet));
    }

    #[test]
    fn test_review_allows_distinct_wallets() {
        let policy = AdmissionPolicy::new(5);
        let reg = registry_with(&["W1", "W2"], 0);

        assert!(policy.review(&reg, Some("W3")).is_ok());
    }

    #[test]
    fn test_review_exempts_anonymous_from_wallet_guard() {
        // Several anonymous sessions may coexist; only named wallets
        // are deduplicated.
        let policy = AdmissionPolicy::new(5);
        let reg = registry_with(&[], 2);

        assert!(policy.review(&reg, None).is_ok());
    }

    #[test]
    fn test_review_capacity_trumps_wallet_check() {
        // A full room rejects even a fresh wallet.
        let policy = AdmissionPolicy::new(2);
        let reg = registry_with(&["W1", "W2"], 0);

        assert_eq!(
            policy.review(&reg, Some("W3")),
            Err(AdmissionRejection::RoomFull)
        );
    }
}
