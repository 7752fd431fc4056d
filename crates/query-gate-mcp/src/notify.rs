// crates/query-gate-mcp/src/notify.rs
// ============================================================================
// Module: Broadcast Change Notifier
// Description: Fan-out of catalog changes to in-process subscribers.
// Purpose: Let async listeners refresh resource listings after store writes.
// Dependencies: query-gate-core, tokio
// ============================================================================

//! ## Overview
//! [`BroadcastNotifier`] implements [`ChangeNotifier`] over a
//! `tokio::sync::broadcast` channel. Sends never block the store's worker
//! thread. Having no subscribers is not a failure, and a lagging subscriber
//! only loses its own backlog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use query_gate_core::CatalogChange;
use query_gate_core::ChangeNotifier;
use query_gate_core::NotifyError;
use tokio::sync::broadcast;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of buffered changes per subscriber.
pub const DEFAULT_CHANGE_CAPACITY: usize = 64;
/// Upper bound on the per-subscriber buffer.
const MAX_CHANGE_CAPACITY: usize = 4096;

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Change notifier that broadcasts to every live subscriber.
#[derive(Clone)]
pub struct BroadcastNotifier {
    /// Channel sender shared by all clones.
    sender: broadcast::Sender<CatalogChange>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` changes per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_CHANGE_CAPACITY));
        Self {
            sender,
        }
    }

    /// Returns a receiver for changes sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogChange> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_CAPACITY)
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify_changed(&self, change: &CatalogChange) -> Result<(), NotifyError> {
        // A send error only means nobody is listening.
        let _delivered = self.sender.send(change.clone()).unwrap_or(0);
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only assertions are permitted."
    )]

    use query_gate_core::ResultId;
    use query_gate_core::Timestamp;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_changes_in_order() {
        let notifier = BroadcastNotifier::default();
        let mut receiver = notifier.subscribe();
        let first = ResultId::generate(Timestamp::from_unix_millis(1));
        let second = ResultId::generate(Timestamp::from_unix_millis(2));
        notifier
            .notify_changed(&CatalogChange::Persisted {
                id: first.clone(),
            })
            .unwrap();
        notifier
            .notify_changed(&CatalogChange::Pruned {
                removed: vec![second.clone()],
            })
            .unwrap();
        assert_eq!(
            receiver.recv().await.unwrap(),
            CatalogChange::Persisted {
                id: first
            }
        );
        assert_eq!(
            receiver.recv().await.unwrap(),
            CatalogChange::Pruned {
                removed: vec![second]
            }
        );
    }

    #[test]
    fn no_subscribers_is_not_a_failure() {
        let notifier = BroadcastNotifier::new(0);
        assert_eq!(notifier.subscriber_count(), 0);
        let id = ResultId::generate(Timestamp::from_unix_millis(3));
        assert!(
            notifier
                .notify_changed(&CatalogChange::Deleted {
                    id
                })
                .is_ok()
        );
    }

    #[tokio::test]
    async fn lagging_subscriber_reports_lag_and_recovers() {
        let notifier = BroadcastNotifier::new(1);
        let mut receiver = notifier.subscribe();
        for millis in 0 .. 3 {
            let id = ResultId::generate(Timestamp::from_unix_millis(millis));
            notifier
                .notify_changed(&CatalogChange::Persisted {
                    id,
                })
                .unwrap();
        }
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert!(receiver.recv().await.is_ok());
    }
}
