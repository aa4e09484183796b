//! Per-game timelines shared between a move feed and any number of viewers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::board::Position;
use crate::engine::pgn;
use crate::engine::timeline::{AppendOutcome, BoardView, MoveEvent, Timeline};
use crate::engine::types::ChessError;

/// A timeline behind its own lock: reads see whole entries only and writes
/// to one game never wait on another.
pub type SharedTimeline = Arc<RwLock<Timeline>>;

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("game not found: {0}")]
    GameNotFound(Uuid),

    #[error(transparent)]
    Chess(#[from] ChessError),
}

/// Owns the timelines of every live game, keyed by game id.
#[derive(Debug)]
pub struct TimelineManager {
    games: RwLock<HashMap<Uuid, SharedTimeline>>,
    config: EngineConfig,
}

impl TimelineManager {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            games: RwLock::new(HashMap::new()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a new game at the standard position.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.insert(id, Timeline::with_config(self.config.clone()))
            .await;
        id
    }

    /// Register an existing timeline under `id`, replacing any previous one.
    pub async fn insert(&self, id: Uuid, timeline: Timeline) {
        let mut games = self.games.write().await;
        games.insert(id, Arc::new(RwLock::new(timeline)));
        debug!(game_id = %id, "timeline registered");
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedTimeline, LiveError> {
        let games = self.games.read().await;
        games.get(&id).cloned().ok_or(LiveError::GameNotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), LiveError> {
        let mut games = self.games.write().await;
        games.remove(&id).ok_or(LiveError::GameNotFound(id))?;
        debug!(game_id = %id, "timeline removed");
        Ok(())
    }

    pub async fn game_ids(&self) -> Vec<Uuid> {
        let games = self.games.read().await;
        games.keys().copied().collect()
    }

    /// Deliver one move event to a game.
    pub async fn append(&self, id: Uuid, event: MoveEvent) -> Result<AppendOutcome, LiveError> {
        let timeline = self.get(id).await?;
        let mut timeline = timeline.write().await;
        timeline.append(event).map_err(|err| {
            warn!(game_id = %id, error = %err, "move event rejected");
            LiveError::from(err)
        })
    }

    /// Position after move `index` of a game.
    pub async fn navigate(&self, id: Uuid, index: usize) -> Result<Position, LiveError> {
        let timeline = self.get(id).await?;
        let timeline = timeline.read().await;
        Ok(timeline.navigate(index)?.clone())
    }

    pub async fn view(&self, id: Uuid, index: usize) -> Result<BoardView, LiveError> {
        let timeline = self.get(id).await?;
        let timeline = timeline.read().await;
        Ok(timeline.view(index)?)
    }

    /// Replace a game's moves with an imported transcript.
    ///
    /// The transcript is parsed before the game's lock is taken; viewers see
    /// either the old chain or the new one.
    pub async fn import(&self, id: Uuid, movetext: &str) -> Result<usize, LiveError> {
        let shared = self.get(id).await?;
        let mut fresh = Timeline::with_config(self.config.clone());
        fresh.import(movetext)?;
        let len = fresh.len();

        let mut timeline = shared.write().await;
        *timeline = fresh;
        debug!(game_id = %id, len, "timeline imported");
        Ok(len)
    }

    /// PGN export of a game with default tags.
    pub async fn export(&self, id: Uuid) -> Result<String, LiveError> {
        let timeline = self.get(id).await?;
        let timeline = timeline.read().await;
        Ok(pgn::to_pgn(&timeline, &pgn::PgnTags::today()))
    }
}

impl Default for TimelineManager {
    fn default() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            config: EngineConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ErrorKind;

    #[tokio::test]
    async fn create_get_and_remove() {
        let mgr = TimelineManager::new(EngineConfig::default());
        let id = mgr.create().await;
        assert_eq!(mgr.game_ids().await, vec![id]);
        assert!(mgr.get(id).await.unwrap().read().await.is_empty());

        mgr.remove(id).await.unwrap();
        assert!(matches!(
            mgr.get(id).await,
            Err(LiveError::GameNotFound(missing)) if missing == id
        ));
        assert!(mgr.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn append_and_navigate() {
        let mgr = TimelineManager::default();
        let id = mgr.create().await;
        mgr.append(id, MoveEvent::new(1, "e4")).await.unwrap();
        mgr.append(id, MoveEvent::new(3, "Nf3")).await.unwrap();
        mgr.append(id, MoveEvent::new(2, "e5")).await.unwrap();

        let view = mgr.view(id, 3).await.unwrap();
        assert_eq!(view.label(), "3 of 3");
        assert_eq!(mgr.navigate(id, 0).await.unwrap(), Position::starting());

        let err = mgr.navigate(id, 4).await.unwrap_err();
        assert!(matches!(err, LiveError::Chess(ChessError::IndexOutOfRange { .. })));
    }

    #[tokio::test]
    async fn games_are_independent() {
        let mgr = TimelineManager::default();
        let a = mgr.create().await;
        let b = mgr.create().await;
        mgr.append(a, MoveEvent::new(1, "d4")).await.unwrap();
        assert_eq!(mgr.get(a).await.unwrap().read().await.len(), 1);
        assert!(mgr.get(b).await.unwrap().read().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_game_is_reported() {
        let mgr = TimelineManager::default();
        let err = mgr
            .append(Uuid::new_v4(), MoveEvent::new(1, "e4"))
            .await
            .unwrap_err();
        assert!(matches!(err, LiveError::GameNotFound(_)));
    }

    #[tokio::test]
    async fn failed_import_keeps_the_old_chain() {
        let mgr = TimelineManager::default();
        let id = mgr.create().await;
        assert_eq!(mgr.import(id, "1. e4 e5 2. Nf3").await.unwrap(), 3);

        let err = mgr.import(id, "1. d4 d5 2. Nf9").await.unwrap_err();
        match err {
            LiveError::Chess(err) => assert_eq!(err.kind(), ErrorKind::Transcript),
            other => panic!("unexpected error {other:?}"),
        }
        let timeline = mgr.get(id).await.unwrap();
        assert_eq!(timeline.read().await.len(), 3);

        let pgn = mgr.export(id).await.unwrap();
        assert!(pgn.ends_with("1. e4 e5 2. Nf3 *\n"));
    }

    #[tokio::test]
    async fn concurrent_readers_see_whole_entries() {
        let mgr = Arc::new(TimelineManager::default());
        let id = mgr.create().await;

        let writer = {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move {
                for (i, san) in ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"].iter().enumerate() {
                    mgr.append(id, MoveEvent::new(i + 1, *san)).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..20 {
            let timeline = mgr.get(id).await.unwrap();
            let timeline = timeline.read().await;
            let len = timeline.len();
            assert_eq!(timeline.entries().len(), len);
            assert_eq!(timeline.navigate(len).unwrap(), timeline.tip());
            drop(timeline);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(mgr.get(id).await.unwrap().read().await.len(), 6);
    }
}
