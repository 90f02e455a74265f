use rewarded_core::{ErrorCode, Reward, RewardedError, SDK_VERSION};
use rewarded_sdk::{AdResponse, AdapterEvent, RequestParameters, RewardedConfig};
use std::collections::BTreeSet;
use test_support::{
    legacy_response, multi_currency_response, unit, with_completion_url, Harness, ListenerCall,
    FAKE_ADAPTER_CLASS, SECOND_ADAPTER_CLASS,
};

const FOUR_REWARDS: &str = r#"{"rewards":[{"name":"Coins","amount":8},{"name":"Diamonds","amount":1},{"name":"Diamonds","amount":10},{"name":"Energy","amount":20}]}"#;

#[test]
fn multi_currency_offer_waits_for_a_selection() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(&id, multi_currency_response(FOUR_REWARDS));

    let available = harness.manager.available_rewards(&id);
    assert_eq!(available.len(), 4);
    assert!(available.contains(&Reward::success("Diamonds", 1)));
    assert!(harness.manager.selected_reward(&id).is_none());

    let err = harness.manager.show_ad(&id, None).expect_err("selection required");
    assert_eq!(err, RewardedError::RewardNotSelected(id.clone()));
    assert_eq!(
        harness.listener.calls().last(),
        Some(&ListenerCall::ShowError(id.clone(), ErrorCode::RewardNotSelected))
    );
    assert_eq!(harness.adapters.shows(0), 0);

    assert!(harness.manager.select_reward(&id, &Reward::success("Diamonds", 10)));
    assert_eq!(harness.manager.selected_reward(&id), Some(&Reward::success("Diamonds", 10)));
    harness.manager.show_ad(&id, None).expect("show after selection");
    assert_eq!(harness.adapters.shows(0), 1);
}

#[test]
fn selecting_a_reward_outside_the_offer_is_ignored() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(&id, multi_currency_response(FOUR_REWARDS));

    assert!(!harness.manager.select_reward(&id, &Reward::success("Diamonds", 5)));
    assert!(!harness.manager.select_reward(&id, &Reward::success("Gold", 10)));
    assert!(!harness.manager.select_reward(&unit("elsewhere"), &Reward::success("Coins", 8)));
    assert!(harness.manager.selected_reward(&id).is_none());
}

#[test]
fn single_currency_offer_is_selected_automatically() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(
        &id,
        multi_currency_response(r#"{"rewards":[{"name":"Energy","amount":20}]}"#),
    );

    assert_eq!(harness.manager.selected_reward(&id), Some(&Reward::success("Energy", 20)));
    harness.manager.show_ad(&id, None).expect("no selection needed");
}

#[test]
fn legacy_headers_yield_the_selected_reward() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(&id, legacy_response("Coins", "15"));

    let selected = harness.manager.selected_reward(&id).cloned().expect("legacy reward");
    assert_eq!(selected, Reward::success("Coins", 15));
    assert_eq!(harness.manager.available_rewards(&id), BTreeSet::from([selected]));
}

#[test]
fn json_header_takes_precedence_over_legacy_headers() {
    let mut harness = Harness::new();
    let id = unit("store");
    let response = multi_currency_response(r#"{"rewards":[{"name":"Energy","amount":20}]}"#)
        .with_header("X-Rewarded-Video-Currency-Name", "Coins")
        .with_header("X-Rewarded-Video-Currency-Amount", "15");
    harness.load_with(&id, response);

    assert_eq!(harness.manager.selected_reward(&id), Some(&Reward::success("Energy", 20)));
}

#[test]
fn client_side_completion_reports_the_selected_reward() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(&id, multi_currency_response(FOUR_REWARDS));
    assert!(harness.manager.select_reward(&id, &Reward::success("Diamonds", 10)));
    harness.manager.show_ad(&id, None).expect("show");

    assert!(harness.adapters.emit(0, AdapterEvent::Completed(Reward::success("Network", 99))));
    harness.manager.process_pending_events();

    assert_eq!(
        harness.listener.completions(),
        vec![(BTreeSet::from([id]), Reward::success("Diamonds", 10))]
    );
    assert!(harness.completions.requests().is_empty());
}

#[test]
fn unit_without_a_reward_does_not_inherit_the_previous_show() {
    let mut harness = Harness::new();
    let first = unit("first");
    let second = unit("second");
    harness.load_with(&first, legacy_response("Coins", "15"));
    harness.manager.show_ad(&first, None).expect("show first");
    assert!(harness.adapters.emit(0, AdapterEvent::Closed));
    harness.manager.process_pending_events();

    harness.load_with(&second, AdResponse::new(FAKE_ADAPTER_CLASS));
    assert!(harness.manager.selected_reward(&second).is_none());
    harness.manager.show_ad(&second, None).expect("show second");
    assert!(harness.adapters.emit(1, AdapterEvent::Completed(Reward::success("Network", 99))));
    harness.manager.process_pending_events();

    assert_eq!(
        harness.listener.completions(),
        vec![(BTreeSet::from([second]), Reward::success("Network", 99))]
    );
}

#[test]
fn failed_network_reward_is_passed_through() {
    let mut harness = Harness::new();
    let id = unit("store");
    harness.load_with(&id, legacy_response("Coins", "15"));
    harness.manager.show_ad(&id, None).expect("show");

    assert!(harness.adapters.emit(0, AdapterEvent::Completed(Reward::failure())));
    harness.manager.process_pending_events();

    let completions = harness.listener.completions();
    assert_eq!(completions.len(), 1);
    assert!(!completions[0].1.is_success());
}

#[test]
fn completion_without_a_showing_unit_covers_every_unit_of_the_class() {
    let mut harness = Harness::new();
    let first = unit("first");
    let second = unit("second");
    let other = unit("other");
    harness.load_with(&first, legacy_response("Coins", "15"));
    harness.load_with(&second, legacy_response("Coins", "15"));
    harness.load_with(
        &other,
        AdResponse::new(SECOND_ADAPTER_CLASS)
            .with_header("x-rewarded-video-currency-name", "Coins")
            .with_header("x-rewarded-video-currency-amount", "15"),
    );

    assert!(harness.adapters.emit(0, AdapterEvent::Completed(Reward::success("Coins", 5))));
    harness.manager.process_pending_events();

    assert_eq!(
        harness.listener.completions(),
        vec![(BTreeSet::from([first, second]), Reward::success("Coins", 5))]
    );
}

#[test]
fn server_side_completion_fires_the_completion_url_instead_of_the_listener() {
    let mut harness = Harness::new();
    let id = unit("store");
    let response = with_completion_url(
        multi_currency_response(FOUR_REWARDS),
        "https://rewards.example.com/complete?id=1",
    );
    let params =
        RequestParameters { customer_id: Some("customer-7".to_owned()), ..Default::default() };
    harness.requester.script(&id, Ok(response));
    harness.manager.load_ad(id.clone(), params);
    assert!(harness.manager.select_reward(&id, &Reward::success("Diamonds", 10)));
    harness.manager.show_ad(&id, Some("custom data".to_owned())).expect("show");

    assert!(harness.adapters.emit(0, AdapterEvent::Completed(Reward::success("Network", 99))));
    harness.manager.process_pending_events();

    let expected = format!(
        "https://rewards.example.com/complete?id=1&customer_id=customer-7&rcn=Diamonds&rca=10\
         &nv={SDK_VERSION}&v=6&cec=com.example.FakeRewardedVideo&rcd=custom%20data"
    );
    assert_eq!(harness.completions.urls(), vec![expected]);
    assert!(harness.listener.completions().is_empty());
}

#[test]
fn oversized_custom_data_is_still_forwarded() {
    let config = RewardedConfig { custom_data_max_length_bytes: 4, ..RewardedConfig::default() };
    let mut harness = Harness::with_config(config);
    let id = unit("store");
    harness.load_with(
        &id,
        with_completion_url(legacy_response("Coins", "15"), "https://rewards.example.com/c?x=1"),
    );
    harness.manager.show_ad(&id, Some("abcdefgh".to_owned())).expect("show");

    assert!(harness.adapters.emit(0, AdapterEvent::Completed(Reward::success("Coins", 15))));
    harness.manager.process_pending_events();

    let urls = harness.completions.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].ends_with("&rcd=abcdefgh"), "unexpected url: {}", urls[0]);
}
