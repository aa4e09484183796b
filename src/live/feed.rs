//! Adapter from a channel of move events to [`TimelineManager::append`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::manager::{LiveError, TimelineManager};
use crate::engine::timeline::{AppendOutcome, MoveEvent};

pub type FeedSender = mpsc::UnboundedSender<MoveEvent>;
pub type FeedReceiver = mpsc::UnboundedReceiver<MoveEvent>;

/// What a feed did before its channel closed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedSummary {
    /// Events received.
    pub received: usize,
    /// Moves committed, counting buffered ones drained later.
    pub committed: usize,
    pub duplicates: usize,
    /// Indices refused, either on arrival or while draining the buffer.
    pub rejected: Vec<usize>,
    /// Timeline length when the feed stopped.
    pub final_len: usize,
}

/// Create a feed channel pair.
pub fn channel() -> (FeedSender, FeedReceiver) {
    mpsc::unbounded_channel()
}

/// Apply every event from `rx` to game `game_id`, in arrival order, until the
/// sending side is dropped. Stops early if the game disappears.
pub fn spawn_feed(
    manager: Arc<TimelineManager>,
    game_id: Uuid,
    mut rx: FeedReceiver,
) -> JoinHandle<FeedSummary> {
    tokio::spawn(async move {
        let mut summary = FeedSummary::default();
        let mut len = match manager.get(game_id).await {
            Ok(timeline) => timeline.read().await.len(),
            Err(err) => {
                warn!(game_id = %game_id, error = %err, "feed started for unknown game");
                return summary;
            }
        };

        while let Some(event) = rx.recv().await {
            summary.received += 1;
            let index = event.index;
            match manager.append(game_id, event).await {
                Ok(AppendOutcome::Committed {
                    through,
                    committed,
                    rejected,
                }) => {
                    // An import may have replaced the chain since the last event.
                    summary.committed += committed;
                    len = through;
                    summary.rejected.extend(rejected.into_iter().map(|(i, _)| i));
                }
                Ok(AppendOutcome::Duplicate { .. }) => summary.duplicates += 1,
                Ok(AppendOutcome::Buffered { pending, .. }) => {
                    debug!(game_id = %game_id, index, pending, "feed waiting for gap");
                }
                Err(LiveError::GameNotFound(_)) => {
                    warn!(game_id = %game_id, "game removed, stopping feed");
                    break;
                }
                Err(LiveError::Chess(_)) => summary.rejected.push(index),
            }
        }

        summary.final_len = match manager.get(game_id).await {
            Ok(timeline) => timeline.read().await.len(),
            Err(_) => len,
        };
        debug!(
            game_id = %game_id,
            received = summary.received,
            len = summary.final_len,
            "feed closed"
        );
        summary
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_events_in_index_order() {
        let mgr = TimelineManager::new(Default::default());
        let id = mgr.create().await;
        let (tx, rx) = channel();
        let handle = spawn_feed(Arc::clone(&mgr), id, rx);

        for (index, san) in [(1, "e4"), (3, "Nf3"), (2, "e5"), (2, "e5")] {
            tx.send(MoveEvent::new(index, san)).unwrap();
        }
        drop(tx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.received, 4);
        assert_eq!(summary.committed, 3);
        assert_eq!(summary.duplicates, 1);
        assert!(summary.rejected.is_empty());
        assert_eq!(summary.final_len, 3);

        let view = mgr.view(id, 2).await.unwrap();
        assert_eq!(view.notation.as_deref(), Some("e5"));
    }

    #[tokio::test]
    async fn rejected_events_are_counted() {
        let mgr = TimelineManager::new(Default::default());
        let id = mgr.create().await;
        let (tx, rx) = channel();
        let handle = spawn_feed(Arc::clone(&mgr), id, rx);

        tx.send(MoveEvent::new(1, "e5")).unwrap();
        tx.send(MoveEvent::new(1, "e4")).unwrap();
        drop(tx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.rejected, vec![1]);
        assert_eq!(summary.committed, 1);
        assert_eq!(summary.final_len, 1);
    }

    #[tokio::test]
    async fn unknown_game_returns_empty_summary() {
        let mgr = TimelineManager::new(Default::default());
        let (tx, rx) = channel();
        let handle = spawn_feed(mgr, Uuid::new_v4(), rx);
        drop(tx);
        assert_eq!(handle.await.unwrap(), FeedSummary::default());
    }
}
