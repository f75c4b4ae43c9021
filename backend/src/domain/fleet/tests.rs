//! Unit tests for fleet fan-out and outcome reduction.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rstest::{fixture, rstest};
use tokio::sync::Barrier;

use super::*;
use crate::domain::RestrictionReasons;
use crate::domain::ports::MockRestrictionClient;

enum Scripted {
    Accept { delay: Duration },
    Reject(RestrictionApiError),
    Panic,
}

struct ScriptedClient {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
    barrier: Option<Arc<Barrier>>,
}

impl ScriptedClient {
    fn new(script: Vec<(&str, Scripted)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(universe, step)| (universe.to_owned(), step))
                .collect(),
            calls: Mutex::new(Vec::new()),
            barrier: None,
        }
    }

    fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex").len()
    }
}

#[async_trait]
impl RestrictionClient for ScriptedClient {
    async fn set_restriction(
        &self,
        universe_id: &UniverseId,
        _player_id: &PlayerId,
        _change: &RestrictionChange,
    ) -> Result<(), RestrictionApiError> {
        self.calls
            .lock()
            .expect("calls mutex")
            .push(universe_id.to_string());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        match self.script.get(universe_id.as_ref()) {
            Some(Scripted::Accept { delay }) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Some(Scripted::Reject(error)) => Err(error.clone()),
            Some(Scripted::Panic) => panic!("scripted endpoint panic"),
            None => Err(RestrictionApiError::transport("unscripted universe")),
        }
    }
}

fn accept() -> Scripted {
    Scripted::Accept {
        delay: Duration::ZERO,
    }
}

fn targets(raw: &str) -> UniverseTargets {
    UniverseTargets::parse(raw).expect("valid targets")
}

#[fixture]
fn player() -> PlayerId {
    PlayerId::new("123").expect("valid id")
}

#[fixture]
fn apply() -> RestrictionChange {
    RestrictionChange::Apply(RestrictionReasons::resolve(Some("cheating"), None))
}

#[rstest]
#[case(0, 0, FleetStatus::None)]
#[case(0, 4, FleetStatus::None)]
#[case(1, 4, FleetStatus::Partial)]
#[case(3, 4, FleetStatus::Partial)]
#[case(4, 4, FleetStatus::Full)]
fn status_follows_counts(
    #[case] successes: usize,
    #[case] total: usize,
    #[case] expected: FleetStatus,
) {
    assert_eq!(FleetStatus::from_counts(successes, total), expected);
}

#[rstest]
#[tokio::test]
async fn middle_failure_yields_partial_in_configuration_order(
    player: PlayerId,
    apply: RestrictionChange,
) {
    let client = Arc::new(ScriptedClient::new(vec![
        (
            "111",
            Scripted::Accept {
                delay: Duration::from_millis(30),
            },
        ),
        (
            "222",
            Scripted::Reject(RestrictionApiError::status(500_u16, "internal error")),
        ),
        ("333", accept()),
    ]));
    let coordinator = FleetCoordinator::new(client.clone(), targets("111,222,333"));

    let outcome = coordinator.apply_across_fleet(&player, &apply).await;

    assert_eq!(outcome.success_count(), 2);
    assert_eq!(outcome.total_count(), 3);
    assert_eq!(outcome.status(), FleetStatus::Partial);
    let order: Vec<&str> = outcome
        .outcomes()
        .iter()
        .map(|o| o.universe_id().as_ref())
        .collect();
    assert_eq!(order, ["111", "222", "333"]);
    let failed = outcome.outcomes().get(1).expect("second outcome");
    assert!(!failed.is_success());
    assert_eq!(failed.failure().and_then(|f| f.status), Some(500));
    assert_eq!(client.call_count(), 3);
}

#[rstest]
#[tokio::test]
async fn all_successes_yield_full(player: PlayerId, apply: RestrictionChange) {
    let client = Arc::new(ScriptedClient::new(vec![("1", accept()), ("2", accept())]));
    let coordinator = FleetCoordinator::new(client, targets("1,2"));

    let outcome = coordinator.apply_across_fleet(&player, &apply).await;

    assert_eq!(outcome.status(), FleetStatus::Full);
    assert_eq!(outcome.failure_summary(), "2/2 universes");
}

#[rstest]
#[tokio::test]
async fn empty_fleet_yields_none_without_calls(player: PlayerId, apply: RestrictionChange) {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let coordinator = FleetCoordinator::new(client.clone(), targets(""));

    let outcome = coordinator.apply_across_fleet(&player, &apply).await;

    assert_eq!(outcome.total_count(), 0);
    assert_eq!(outcome.status(), FleetStatus::None);
    assert_eq!(client.call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn panicking_endpoint_does_not_abort_siblings(player: PlayerId, apply: RestrictionChange) {
    let client = Arc::new(ScriptedClient::new(vec![
        ("1", accept()),
        ("2", Scripted::Panic),
        ("3", accept()),
    ]));
    let coordinator = FleetCoordinator::new(client, targets("1,2,3"));

    let outcome = coordinator.apply_across_fleet(&player, &apply).await;

    assert_eq!(outcome.success_count(), 2);
    let failure = outcome
        .failures()
        .next()
        .and_then(EndpointOutcome::failure)
        .expect("one failure");
    assert_eq!(failure.status, None);
    assert!(failure.detail.contains("aborted"), "detail: {}", failure.detail);
}

#[rstest]
#[tokio::test]
async fn endpoint_calls_run_concurrently(player: PlayerId, apply: RestrictionChange) {
    let barrier = Arc::new(Barrier::new(3));
    let client = Arc::new(
        ScriptedClient::new(vec![("1", accept()), ("2", accept()), ("3", accept())])
            .with_barrier(barrier),
    );
    let coordinator = FleetCoordinator::new(client, targets("1,2,3"));

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        coordinator.apply_across_fleet(&player, &apply),
    )
    .await
    .expect("all calls must be in flight together to pass the barrier");

    assert_eq!(outcome.status(), FleetStatus::Full);
}

#[rstest]
#[tokio::test]
async fn every_failure_is_reported_in_summary(player: PlayerId) {
    let client = Arc::new(ScriptedClient::new(vec![
        ("1", Scripted::Reject(RestrictionApiError::timeout("slow"))),
        (
            "2",
            Scripted::Reject(RestrictionApiError::status(403_u16, "forbidden")),
        ),
    ]));
    let coordinator = FleetCoordinator::new(client, targets("1,2"));

    let outcome = coordinator
        .apply_across_fleet(&player, &RestrictionChange::Clear)
        .await;

    assert_eq!(outcome.status(), FleetStatus::None);
    assert_eq!(
        outcome.failure_summary(),
        "0/2 universes: 1 restriction API timeout: slow; 2 [403] forbidden"
    );
}

#[rstest]
#[tokio::test]
async fn failed_outcome_keeps_remote_body_verbatim(player: PlayerId, apply: RestrictionChange) {
    let body = format!("{{\"error\":\n  \"{}\"}}", "x".repeat(200));
    let client = Arc::new(ScriptedClient::new(vec![(
        "9",
        Scripted::Reject(RestrictionApiError::status(500_u16, body.clone())),
    )]));
    let coordinator = FleetCoordinator::new(client, targets("9"));

    let outcome = coordinator.apply_across_fleet(&player, &apply).await;

    let failure = outcome
        .failures()
        .next()
        .and_then(EndpointOutcome::failure)
        .expect("one failure");
    assert_eq!(failure.status, Some(500));
    assert_eq!(failure.detail, body);
    let summary = outcome.failure_summary();
    assert!(summary.ends_with("..."), "summary: {summary}");
    assert!(summary.starts_with("0/1 universes: 9 [500] {\"error\": \"xxx"));
}

#[rstest]
#[case("short", "short")]
#[case("  spread \n out  ", "spread out")]
fn detail_preview_compacts_whitespace(#[case] detail: &str, #[case] expected: &str) {
    let failure = EndpointFailure {
        status: None,
        detail: detail.to_owned(),
    };
    assert_eq!(failure.detail_preview(), expected);
}

#[rstest]
fn detail_preview_truncates_long_text() {
    let failure = EndpointFailure {
        status: Some(502),
        detail: "y".repeat(161),
    };
    let preview = failure.detail_preview();
    assert_eq!(preview.len(), 163);
    assert_eq!(failure.to_string(), format!("[502] {preview}"));
}

#[rstest]
#[tokio::test]
async fn forwards_change_and_player_to_client(player: PlayerId) {
    let mut client = MockRestrictionClient::new();
    client
        .expect_set_restriction()
        .withf(|universe, player, change| {
            universe.as_ref() == "77"
                && player.as_ref() == "123"
                && *change == RestrictionChange::Clear
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let coordinator = FleetCoordinator::new(Arc::new(client), targets("77"));

    let outcome = coordinator
        .apply_across_fleet(&player, &RestrictionChange::Clear)
        .await;

    assert_eq!(outcome.status(), FleetStatus::Full);
}
