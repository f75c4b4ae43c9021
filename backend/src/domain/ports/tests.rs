//! Port-level behaviour shared by every adapter.

use super::*;
use crate::domain::{PlayerId, RestrictionReasons, UniverseId};
use rstest::{fixture, rstest};

#[fixture]
fn player() -> PlayerId {
    PlayerId::new("123").expect("valid id")
}

#[rstest]
#[tokio::test]
async fn fixture_store_is_always_empty(player: PlayerId) {
    let store = FixtureBlacklistRecordStore;
    assert_eq!(store.get(&player).await.expect("get"), None);
    assert!(store.list_all().await.expect("list").is_empty());
    store.delete(&player).await.expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn fixture_restriction_client_accepts_changes(player: PlayerId) {
    let client = FixtureRestrictionClient;
    let universe = UniverseId::new("99").expect("valid universe");
    let change = RestrictionChange::Apply(RestrictionReasons::resolve(Some("spam"), None));
    client
        .set_restriction(&universe, &player, &change)
        .await
        .expect("fixture accepts");
}

#[rstest]
#[tokio::test]
async fn fixture_player_activity_has_no_players(player: PlayerId) {
    let repo = FixturePlayerActivityRepository;
    assert!(repo.find_player(&player).await.expect("find").is_none());
    assert!(repo.list_players().await.expect("list").is_empty());
}

#[rstest]
fn restriction_error_exposes_remote_status() {
    let err = RestrictionApiError::status(403_u16, "forbidden");
    assert_eq!(err.http_status(), Some(403));
    assert_eq!(
        err.to_string(),
        "restriction API returned status 403: forbidden"
    );
    assert_eq!(RestrictionApiError::timeout("slow").http_status(), None);
}

#[rstest]
#[case(RestrictionChange::Clear, "clear")]
#[case(RestrictionChange::Apply(RestrictionReasons::resolve(None, None)), "apply")]
fn restriction_change_labels(#[case] change: RestrictionChange, #[case] expected: &str) {
    assert_eq!(change.label(), expected);
}

#[rstest]
#[tokio::test]
async fn mocked_store_reports_query_failure(player: PlayerId) {
    let mut store = MockBlacklistRecordStore::new();
    store
        .expect_get()
        .times(1)
        .return_once(|_| Err(BlacklistStoreError::query("permission denied")));
    let err = store.get(&player).await.expect_err("query fails");
    assert_eq!(err.to_string(), "blacklist store query failed: permission denied");
}
