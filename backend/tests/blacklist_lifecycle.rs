//! End-to-end blacklist lifecycle over in-process adapters: add players,
//! replay the stored set onto the fleet, then lift a restriction.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use moderation_bot::domain::ports::BlacklistRecordStore;
use moderation_bot::domain::{
    AddToBlacklistRequest, BlacklistChange, BlacklistEntry, BlacklistService, BlacklistSyncConfig,
    BlacklistSyncService, ChangeClassification, FleetCoordinator, PlayerId, UniverseTargets,
};
use moderation_bot::outbound::memory::InMemoryBlacklistStore;
use moderation_bot::test_support::{
    calls_per_player, FixedClock, RecordingProgress, RecordingSleeper, ScriptedRestrictionClient,
};
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0)
        .single()
        .expect("valid time")
}

fn id(raw: &str) -> PlayerId {
    PlayerId::new(raw).expect("valid id")
}

fn request(raw: &str, username: &str) -> AddToBlacklistRequest {
    AddToBlacklistRequest {
        player_id: id(raw),
        username: username.to_owned(),
        public_reason: Some("exploiting".to_owned()),
        hidden_reason: None,
    }
}

#[rstest]
#[tokio::test]
async fn add_sync_and_remove_keep_both_systems_aligned(now: DateTime<Utc>) {
    let store = Arc::new(InMemoryBlacklistStore::new());
    let client = Arc::new(ScriptedRestrictionClient::accepting().failing_for("30", "222"));
    let fleet = FleetCoordinator::new(
        client.clone(),
        UniverseTargets::parse("111,222").expect("valid targets"),
    );
    let manager = BlacklistService::new(
        store.clone(),
        Some(fleet.clone()),
        Arc::new(FixedClock(now)),
    );

    for (raw, name) in [("10", "Ann"), ("20", "Ben"), ("30", "Cat"), ("40", "Dan")] {
        let change = manager.add_to_blacklist(request(raw, name)).await;
        let BlacklistChange::Applied { result, .. } = change else {
            panic!("add for {raw} should apply, got {change:?}");
        };
        let expected = if raw == "30" {
            ChangeClassification::PartialRemoteSide
        } else {
            ChangeClassification::FullSuccess
        };
        assert_eq!(result.classification(), expected);
    }
    assert_eq!(store.len(), 4);

    let sleeper = Arc::new(RecordingSleeper::default());
    let progress = RecordingProgress::default();
    let sync = BlacklistSyncService::with_sleeper(
        store.clone(),
        fleet,
        sleeper.clone(),
        BlacklistSyncConfig::default(),
    );
    let run = sync.sync_all(&progress).await.expect("sync runs");

    assert_eq!(run.total_users, 4);
    assert_eq!(run.full_success_count, 3);
    assert_eq!(run.partial_count, 1);
    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].starts_with("Cat (30): 1/2 universes"));
    assert_eq!(progress.snapshots().len(), 2);
    assert_eq!(sleeper.delays().len(), 1);
    assert_eq!(store.len(), 4, "sync never writes the store");

    let removed = manager.remove_from_blacklist(&id("20")).await;
    let BlacklistChange::Applied { entry, result } = removed else {
        panic!("remove should apply, got {removed:?}");
    };
    assert_eq!(entry.username(), "Ben");
    assert_eq!(result.classification(), ChangeClassification::FullSuccess);
    assert!(store.get(&id("20")).await.expect("read").is_none());

    let calls = client.calls();
    let per_player = calls_per_player(&calls);
    assert_eq!(per_player.get("20"), Some(&6), "add, sync and clear in both universes");
    assert_eq!(per_player.get("10"), Some(&4));
    assert!(
        calls
            .iter()
            .filter(|call| call.change == "clear")
            .all(|call| call.player_id == "20")
    );
}

#[rstest]
#[tokio::test]
async fn local_only_mode_never_reaches_the_fleet(now: DateTime<Utc>) {
    let store = Arc::new(InMemoryBlacklistStore::new());
    let manager = BlacklistService::new(store.clone(), None, Arc::new(FixedClock(now)));

    let added = manager.add_to_blacklist(request("55", "")).await;
    let BlacklistChange::Applied { entry, result } = added else {
        panic!("add should apply, got {added:?}");
    };
    assert_eq!(entry.username(), "Unknown");
    assert_eq!(result.classification(), ChangeClassification::LocalOnlySuccess);
    assert!(result.fleet().is_none());

    let again = manager.add_to_blacklist(request("55", "Eve")).await;
    assert!(matches!(again, BlacklistChange::AlreadyBlacklisted(_)));

    let page = manager.list_entries(0, 10).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.next_offset, None);
}

#[rstest]
#[tokio::test]
async fn entry_without_creation_time_is_synced_and_removable(now: DateTime<Utc>) {
    let store = Arc::new(InMemoryBlacklistStore::with_entries([
        BlacklistEntry::restore(id("70"), "Old", None, None, None),
        BlacklistEntry::new(id("80"), "New", None, None, now),
    ]));
    let client = Arc::new(ScriptedRestrictionClient::accepting());
    let fleet = FleetCoordinator::new(
        client.clone(),
        UniverseTargets::parse("111").expect("valid targets"),
    );

    let sync = BlacklistSyncService::with_sleeper(
        store.clone(),
        fleet.clone(),
        Arc::new(RecordingSleeper::default()),
        BlacklistSyncConfig::default(),
    );
    let run = sync
        .sync_all(&RecordingProgress::default())
        .await
        .expect("sync runs");
    assert_eq!(run.total_users, 2);
    assert_eq!(run.full_success_count, 2);

    let manager = BlacklistService::new(store.clone(), Some(fleet), Arc::new(FixedClock(now)));
    let removed = manager.remove_from_blacklist(&id("70")).await;
    let BlacklistChange::Applied { entry, result } = removed else {
        panic!("remove should apply, got {removed:?}");
    };
    assert_eq!(entry.date_added(), None);
    assert_eq!(result.classification(), ChangeClassification::FullSuccess);
    assert_eq!(store.len(), 1);
    assert_eq!(calls_per_player(&client.calls()).get("70"), Some(&2));
}
