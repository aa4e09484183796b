//! Live games: feeds delivering moves while viewers read the timeline.

use std::sync::Arc;

use chess_replay::api::handlers::{render, termination};
use chess_replay::config::EngineConfig;
use chess_replay::engine::{MoveEvent, OutcomeTag, Position, Winner};
use chess_replay::live::feed::channel;
use chess_replay::live::{TimelineManager, spawn_feed};

const SCHOLARS_MATE: [&str; 7] = ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"];

#[tokio::test]
async fn feed_with_shuffled_delivery_reaches_mate() {
    let mgr = TimelineManager::new(EngineConfig::default());
    let id = mgr.create().await;
    let (tx, rx) = channel();
    let feed = spawn_feed(Arc::clone(&mgr), id, rx);

    for i in [2, 0, 1, 6, 4, 3, 5, 0] {
        tx.send(MoveEvent::new(i + 1, SCHOLARS_MATE[i])).unwrap();
    }
    drop(tx);

    let summary = feed.await.unwrap();
    assert_eq!(summary.received, 8);
    assert_eq!(summary.committed, 7);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.final_len, 7);

    let timeline = mgr.get(id).await.unwrap();
    let timeline = timeline.read().await;
    let end = termination(timeline.status());
    assert_eq!(end.status, OutcomeTag::Checkmate);
    assert_eq!(end.winner, Some(Winner::White));

    let last = render(&timeline, 7).unwrap();
    assert_eq!(last.from.as_deref(), Some("h5"));
    assert_eq!(last.to.as_deref(), Some("f7"));
    assert_eq!(last.notation.as_deref(), Some("Qxf7#"));
}

#[tokio::test]
async fn viewers_never_see_a_gap() {
    let mgr = TimelineManager::new(EngineConfig::default());
    let id = mgr.create().await;
    let (tx, rx) = channel();
    let feed = spawn_feed(Arc::clone(&mgr), id, rx);

    let viewer = {
        let mgr = Arc::clone(&mgr);
        tokio::spawn(async move {
            let mut seen = 0;
            while seen < SCHOLARS_MATE.len() {
                let timeline = mgr.get(id).await.unwrap();
                let timeline = timeline.read().await;
                for (i, entry) in timeline.entries().iter().enumerate() {
                    assert_eq!(entry.index, i + 1);
                    assert_eq!(entry.notation, SCHOLARS_MATE[i]);
                }
                assert!(timeline.len() >= seen);
                seen = timeline.len();
                drop(timeline);
                tokio::task::yield_now().await;
            }
        })
    };

    for (i, san) in SCHOLARS_MATE.iter().enumerate().rev() {
        tx.send(MoveEvent::new(i + 1, *san)).unwrap();
        tokio::task::yield_now().await;
    }
    drop(tx);

    feed.await.unwrap();
    viewer.await.unwrap();
}

#[tokio::test]
async fn separate_games_do_not_interfere() {
    let mgr = TimelineManager::new(EngineConfig::default());
    let a = mgr.create().await;
    let b = mgr.create().await;

    let (tx_a, rx_a) = channel();
    let (tx_b, rx_b) = channel();
    let feed_a = spawn_feed(Arc::clone(&mgr), a, rx_a);
    let feed_b = spawn_feed(Arc::clone(&mgr), b, rx_b);

    tx_a.send(MoveEvent::new(1, "e4")).unwrap();
    tx_b.send(MoveEvent::new(1, "d4")).unwrap();
    tx_b.send(MoveEvent::new(2, "d5")).unwrap();
    drop(tx_a);
    drop(tx_b);

    assert_eq!(feed_a.await.unwrap().final_len, 1);
    assert_eq!(feed_b.await.unwrap().final_len, 2);
    assert_eq!(mgr.navigate(a, 0).await.unwrap(), Position::starting());
    assert_eq!(mgr.view(b, 2).await.unwrap().notation.as_deref(), Some("d5"));
}

#[tokio::test]
async fn import_swaps_while_feed_is_idle() {
    let mgr = TimelineManager::new(EngineConfig::default());
    let id = mgr.create().await;
    mgr.import(id, "1. f3 e5 2. g4 Qh4#").await.unwrap();

    let (tx, rx) = channel();
    let feed = spawn_feed(Arc::clone(&mgr), id, rx);
    // Already committed by the import.
    tx.send(MoveEvent::new(4, "Qh4#")).unwrap();
    drop(tx);

    let summary = feed.await.unwrap();
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.final_len, 4);
}

#[tokio::test]
async fn import_shortens_game_under_a_running_feed() {
    let mgr = TimelineManager::new(EngineConfig::default());
    let id = mgr.create().await;
    mgr.import(id, "1. e4 e5 2. Nf3 Nc6").await.unwrap();

    let (tx, rx) = channel();
    let feed = spawn_feed(Arc::clone(&mgr), id, rx);
    // Let the feed see the four-move game before it is replaced.
    tokio::task::yield_now().await;

    assert_eq!(mgr.import(id, "1. d4 d5").await.unwrap(), 2);
    tx.send(MoveEvent::new(3, "c4")).unwrap();
    drop(tx);

    let summary = feed.await.unwrap();
    assert_eq!(summary.received, 1);
    assert_eq!(summary.committed, 1);
    assert!(summary.rejected.is_empty());
    assert_eq!(summary.final_len, 3);
    assert_eq!(mgr.view(id, 3).await.unwrap().notation.as_deref(), Some("c4"));
}
