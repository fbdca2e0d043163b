//! End-to-end behaviour of the collection facade over the in-memory backend.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};
use sparkbase::{
    bson::doc,
    memory::InMemoryStore,
    prelude::*,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Documented)]
struct Player {
    name: String,
    coins: i64,
}

impl Player {
    fn new(name: &str, coins: i64) -> Self {
        Self { name: name.to_string(), coins }
    }
}

/// Registered through closures rather than the derive.
#[derive(Debug, Clone, PartialEq)]
struct Guild {
    tag: String,
}

/// Never registered.
#[derive(Debug, Clone, PartialEq)]
struct Ghost;

fn guild_adapter() -> FnAdapter<Guild> {
    FnAdapter::new(
        |guild: &Guild| Ok(doc! { "tag": guild.tag.clone() }),
        |document: &Document| {
            document
                .get_str("tag")
                .map(|tag| Guild { tag: tag.to_string() })
                .map_err(|e| DocumentStoreError::Serialization(e.to_string()))
        },
    )
}

fn store() -> DocumentStore<InMemoryStore> {
    let adapters = AdapterRegistry::builder()
        .with_documented::<Player>()
        .with_adapter::<Guild, _>(guild_adapter())
        .build()
        .unwrap();

    DocumentStore::new(InMemoryStore::new(), adapters)
}

fn named(name: &'static str) -> Predicate<Player> {
    Predicate::instance(move |player: &Player| player.name == name)
}

fn raw_named(name: &'static str) -> Predicate<Player> {
    Predicate::document(move |document: &Document| document.get_str("name").ok() == Some(name))
}

async fn all_players(store: &DocumentStore<InMemoryStore>) -> Vec<Player> {
    store
        .collection("players")
        .pull_all(Predicate::any())
        .execute()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_push_then_pull_round_trips() {
    let store = store();
    let players = store.collection("players");

    players.push(Player::new("alice", 10)).execute().await.unwrap();

    let pulled = players.pull(named("alice")).execute().await.unwrap();
    assert_eq!(pulled, Some(Player::new("alice", 10)));

    let guilds = store.collection("guilds");
    guilds.push(Guild { tag: "SPK".to_string() }).execute().await.unwrap();
    let guild = guilds
        .pull(Predicate::instance(|g: &Guild| g.tag == "SPK"))
        .execute()
        .await
        .unwrap();
    assert_eq!(guild, Some(Guild { tag: "SPK".to_string() }));
}

#[tokio::test]
async fn test_actions_do_nothing_until_executed() {
    let store = store();
    let players = store.collection("players");

    let push = players.push(Player::new("alice", 10));
    assert_eq!(store.backend().len("players").await, 0);

    push.execute().await.unwrap();
    push.execute().await.unwrap();
    assert_eq!(store.backend().len("players").await, 2);
}

#[tokio::test]
async fn test_push_does_not_deduplicate() {
    let store = store();
    let players = store.collection("players");

    for _ in 0..3 {
        players.push(Player::new("alice", 10)).execute().await.unwrap();
    }

    assert_eq!(all_players(&store).await.len(), 3);
}

#[tokio::test]
async fn test_unregistered_type_fails_without_mutation() {
    let store = store();
    let ghosts = store.collection("ghosts");

    let push = ghosts.push(Ghost);
    let err = push.execute().await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::UnregisteredType(ref name) if name == "Ghost"));
    assert!(err.to_string().contains("Ghost"));

    let replace = ghosts.push_or_replace(Ghost, Predicate::any());
    assert!(matches!(
        replace.execute().await,
        Err(DocumentStoreError::UnregisteredType(_))
    ));
    assert!(matches!(
        ghosts.pull::<Ghost>(Predicate::any()).execute().await,
        Err(DocumentStoreError::UnregisteredType(_))
    ));
    assert!(matches!(
        ghosts.drop::<Ghost>(Predicate::any()).execute().await,
        Err(DocumentStoreError::UnregisteredType(_))
    ));

    assert_eq!(store.backend().len("ghosts").await, 0);
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pull_returns_none_one_or_first_in_scan_order() {
    let store = store();
    let players = store.collection("players");

    assert_eq!(players.pull(named("alice")).execute().await.unwrap(), None);

    players.push(Player::new("alice", 1)).execute().await.unwrap();
    players.push(Player::new("bob", 2)).execute().await.unwrap();
    assert_eq!(
        players.pull(named("bob")).execute().await.unwrap(),
        Some(Player::new("bob", 2))
    );

    players.push(Player::new("alice", 3)).execute().await.unwrap();
    assert_eq!(
        players.pull(named("alice")).execute().await.unwrap(),
        Some(Player::new("alice", 1))
    );
    assert_eq!(
        players.pull(raw_named("alice")).execute().await.unwrap(),
        Some(Player::new("alice", 1))
    );
}

#[tokio::test]
async fn test_pull_all_keeps_scan_order() {
    let store = store();
    let players = store.collection("players");

    for (name, coins) in [("alice", 1), ("bob", 2), ("alice", 3)] {
        players.push(Player::new(name, coins)).execute().await.unwrap();
    }

    let alices = players.pull_all(named("alice")).execute().await.unwrap();
    assert_eq!(alices, vec![Player::new("alice", 1), Player::new("alice", 3)]);
}

#[tokio::test]
async fn test_push_or_replace_removes_every_match_and_inserts_one() {
    for existing in [0, 1, 3] {
        let store = store();
        let players = store.collection("players");

        players.push(Player::new("bob", 5)).execute().await.unwrap();
        for coins in 0..existing {
            players.push(Player::new("alice", coins)).execute().await.unwrap();
        }

        players
            .push_or_replace(Player::new("alice", 100), named("alice"))
            .execute()
            .await
            .unwrap();

        let remaining = all_players(&store).await;
        assert_eq!(remaining, vec![Player::new("bob", 5), Player::new("alice", 100)]);
    }
}

#[tokio::test]
async fn test_replace_reports_removed_count() {
    let store = store();
    let players = store.collection("players");

    for coins in 0..3 {
        players.push(Player::new("alice", coins)).execute().await.unwrap();
    }

    let removed = players
        .replace(Player::new("alice", 50), named("alice"), ReplaceMode::One)
        .execute()
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(
        all_players(&store).await,
        vec![Player::new("alice", 1), Player::new("alice", 2), Player::new("alice", 50)]
    );

    let removed = players
        .replace(Player::new("alice", 60), named("alice"), ReplaceMode::All)
        .execute()
        .await
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(all_players(&store).await, vec![Player::new("alice", 60)]);

    let removed = players
        .replace(Player::new("carol", 1), named("carol"), ReplaceMode::One)
        .execute()
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(all_players(&store).await.len(), 2);
}

#[tokio::test]
async fn test_drop_deletes_first_match_only() {
    let store = store();
    let players = store.collection("players");

    for (name, coins) in [("alice", 1), ("bob", 2), ("alice", 3)] {
        players.push(Player::new(name, coins)).execute().await.unwrap();
    }

    assert!(players.drop(raw_named("alice")).execute().await.unwrap());
    assert_eq!(
        all_players(&store).await,
        vec![Player::new("bob", 2), Player::new("alice", 3)]
    );

    assert!(players.drop(named("alice")).execute().await.unwrap());
    assert_eq!(all_players(&store).await, vec![Player::new("bob", 2)]);
}

#[tokio::test]
async fn test_drop_without_match_is_false_and_harmless() {
    let store = store();
    let players = store.collection("players");

    assert!(!players.drop(named("alice")).execute().await.unwrap());

    players.push(Player::new("bob", 2)).execute().await.unwrap();
    assert!(!players.drop(raw_named("alice")).execute().await.unwrap());
    assert_eq!(all_players(&store).await, vec![Player::new("bob", 2)]);
}

#[tokio::test]
async fn test_if_present_or_else_updates_found_record() {
    let store = store();
    let players = store.collection("players");

    players.push(Player::new("alice", 10)).execute().await.unwrap();
    players.push(Player::new("bob", 20)).execute().await.unwrap();

    let misses = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&misses);

    let found = players
        .if_present_or_else(
            named("alice"),
            |player| player.coins += 1,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .execute()
        .await
        .unwrap();

    assert!(found);
    assert_eq!(misses.load(Ordering::SeqCst), 0);

    let alices = players.pull_all(named("alice")).execute().await.unwrap();
    assert_eq!(alices, vec![Player::new("alice", 11)]);
    assert_eq!(
        players.pull(named("bob")).execute().await.unwrap(),
        Some(Player::new("bob", 20))
    );
}

#[tokio::test]
async fn test_if_present_or_else_calls_fallback_when_missing() {
    let store = store();
    let players = store.collection("players");

    players.push(Player::new("bob", 20)).execute().await.unwrap();

    let misses = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&misses);

    let action = players.if_present_or_else(
        named("alice"),
        |player| player.coins += 1,
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert!(!action.execute().await.unwrap());
    assert!(!action.execute().await.unwrap());

    assert_eq!(misses.load(Ordering::SeqCst), 2);
    assert_eq!(all_players(&store).await, vec![Player::new("bob", 20)]);
}

#[tokio::test]
async fn test_expression_predicates() {
    let store = store();
    let players = store.collection("players");

    for (name, coins) in [("alice", 5), ("bob", 50), ("carol", 500)] {
        players.push(Player::new(name, coins)).execute().await.unwrap();
    }

    let rich = players
        .pull_all::<Player>(Field::new("coins").gte(50).into())
        .execute()
        .await
        .unwrap();
    assert_eq!(rich, vec![Player::new("bob", 50), Player::new("carol", 500)]);

    assert!(
        players
            .drop::<Player>(Field::new("name").eq("bob").into())
            .execute()
            .await
            .unwrap()
    );

    players
        .push_or_replace(Player::new("dave", 1), Predicate::expr(Field::new("coins").lt(10)))
        .execute()
        .await
        .unwrap();

    assert_eq!(
        all_players(&store).await,
        vec![Player::new("carol", 500), Player::new("dave", 1)]
    );
}

#[tokio::test]
async fn test_malformed_record_surfaces_serialization_error() {
    let store = store();
    store
        .backend()
        .insert_document(doc! { "name": "broken", "coins": "lots" }, "players")
        .await
        .unwrap();

    let err = store
        .collection("players")
        .pull(named("broken"))
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Serialization(_)));

    // Raw predicates never deserialize non-matching records.
    let dropped = store
        .collection("players")
        .drop(raw_named("broken"))
        .execute()
        .await
        .unwrap();
    assert!(dropped);
}

#[tokio::test]
async fn test_failed_replace_keeps_existing_records() {
    let store = store();
    let players = store.collection("players");

    players.push(Player::new("alice", 10)).execute().await.unwrap();
    store
        .backend()
        .insert_document(doc! { "name": "legacy", "coins": "lots" }, "players")
        .await
        .unwrap();

    let err = players
        .push_or_replace(Player::new("alice", 20), named("alice"))
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Serialization(_)));

    let err = players
        .if_present_or_else(named("alice"), |p| p.coins += 1, || {})
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Serialization(_)));

    assert_eq!(store.backend().len("players").await, 2);
    let alice = players
        .pull(raw_named("alice"))
        .execute()
        .await
        .unwrap();
    assert_eq!(alice, Some(Player::new("alice", 10)));
}

#[tokio::test]
async fn test_dyn_store_behaves_like_static() {
    let store = store().into_dyn();
    let players = store.collection("players");

    players.push(Player::new("alice", 1)).execute().await.unwrap();
    players.push(Player::new("alice", 2)).execute().await.unwrap();
    players
        .push_or_replace(Player::new("alice", 3), named("alice"))
        .execute()
        .await
        .unwrap();

    let alices = players.pull_all(named("alice")).execute().await.unwrap();
    assert_eq!(alices, vec![Player::new("alice", 3)]);

    assert_eq!(store.downcast_backend::<InMemoryStore>().unwrap().len("players").await, 1);
    assert_eq!(store.list_collections().await.unwrap(), vec!["players"]);

    let store = store.into_static::<InMemoryStore>().unwrap();
    assert_eq!(all_players(&store).await, vec![Player::new("alice", 3)]);
    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_collection_management() {
    let store = store();

    store.create_collection("guilds").await.unwrap();
    store.collection("players").push(Player::new("alice", 1)).execute().await.unwrap();
    assert_eq!(store.list_collections().await.unwrap(), vec!["guilds", "players"]);

    store.drop_collection("players").await.unwrap();
    assert!(all_players(&store).await.is_empty());
    assert!(matches!(
        store.drop_collection("players").await,
        Err(DocumentStoreError::CollectionNotFound(_))
    ));
}
