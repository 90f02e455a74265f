use rewarded_core::{Reward, RewardedError};
use rewarded_sdk::{spawn_manager, ManagerHandle, RequestParameters};
use std::time::Duration;
use test_support::{
    legacy_response, multi_currency_response, unit, Harness, ListenerCall, LoadBehaviour,
};
use tokio::task::LocalSet;

const TWO_REWARDS: &str =
    r#"{"rewards":[{"name":"Coins","amount":8},{"name":"Energy","amount":20}]}"#;

fn assert_send<T: Send>() {}

#[test]
fn handle_can_cross_threads() {
    assert_send::<ManagerHandle>();
}

#[tokio::test(start_paused = true)]
async fn commands_are_applied_in_order() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let Harness { manager, requester, listener, .. } = Harness::new();
            let id = unit("home");
            requester.script(&id, Ok(legacy_response("Coins", "15")));
            let (handle, _task) = spawn_manager(manager);

            assert!(handle.load_ad(id.clone(), RequestParameters::default()));
            assert_eq!(handle.has_ad(id.clone()).await, Ok(true));
            assert_eq!(
                handle.selected_reward(id.clone()).await,
                Ok(Some(Reward::success("Coins", 15)))
            );
            handle.show_ad(id.clone(), None).await.expect("show");
            assert_eq!(
                listener.calls(),
                vec![ListenerCall::LoadSuccess(id.clone()), ListenerCall::Started(id)]
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn adapter_events_wake_the_manager_without_a_command() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let Harness { manager, requester, adapters, listener, .. } = Harness::new();
            adapters.set_load_behaviour(LoadBehaviour::Deferred);
            let id = unit("home");
            requester.script(&id, Ok(legacy_response("Coins", "15")));
            let (handle, _task) = spawn_manager(manager);

            handle.load_ad(id.clone(), RequestParameters::default());
            assert_eq!(handle.has_ad(id.clone()).await, Ok(false));
            assert!(listener.calls().is_empty());

            assert!(adapters.finish_load(0));
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert_eq!(listener.calls(), vec![ListenerCall::LoadSuccess(id.clone())]);
            assert_eq!(handle.has_ad(id).await, Ok(true));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn show_errors_come_back_through_the_handle() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let Harness { manager, requester, .. } = Harness::new();
            let id = unit("store");
            requester.script(&id, Ok(multi_currency_response(TWO_REWARDS)));
            let (handle, _task) = spawn_manager(manager);

            handle.load_ad(id.clone(), RequestParameters::default());
            assert_eq!(handle.available_rewards(id.clone()).await.map(|set| set.len()), Ok(2));
            assert_eq!(
                handle.show_ad(id.clone(), None).await,
                Err(RewardedError::RewardNotSelected(id.clone()))
            );
            assert_eq!(
                handle.select_reward(id.clone(), Reward::success("Energy", 20)).await,
                Ok(true)
            );
            assert_eq!(handle.show_ad(id, None).await, Ok(()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_adapters_and_stops_the_handle() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let Harness { manager, requester, adapters, .. } = Harness::new();
            let id = unit("home");
            requester.script(&id, Ok(legacy_response("Coins", "15")));
            let (handle, task) = spawn_manager(manager);

            handle.load_ad(id.clone(), RequestParameters::default());
            assert_eq!(handle.has_ad(id.clone()).await, Ok(true));

            assert!(handle.shutdown());
            task.await.expect("manager task");
            assert!(adapters.is_invalidated(0));
            assert_eq!(handle.has_ad(id.clone()).await, Err(RewardedError::ManagerStopped));
            assert!(!handle.load_ad(id, RequestParameters::default()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn reset_through_the_handle_clears_state() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let Harness { manager, requester, adapters, .. } = Harness::new();
            let id = unit("home");
            requester.script(&id, Ok(legacy_response("Coins", "15")));
            let (handle, _task) = spawn_manager(manager);

            handle.load_ad(id.clone(), RequestParameters::default());
            assert!(handle.reset());
            assert_eq!(handle.has_ad(id.clone()).await, Ok(false));
            assert!(adapters.is_invalidated(0));
        })
        .await;
}
