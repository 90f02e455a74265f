use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rewarded_core::{
    build_completion_url, parse_reward_offer, CompletionUrlParams, API_VERSION, SDK_VERSION,
};

const MULTI_CURRENCY: &str = r#"{"rewards":[{"name":"Coins","amount":8},{"name":"Diamonds","amount":1},{"name":"Diamonds","amount":10},{"name":"Energy","amount":20}]}"#;

fn bench_parse_reward_offer(c: &mut Criterion) {
    c.bench_function("parse_reward_offer_multi_currency", |b| {
        b.iter(|| parse_reward_offer(black_box(Some(MULTI_CURRENCY)), None, None))
    });
    c.bench_function("parse_reward_offer_legacy", |b| {
        b.iter(|| parse_reward_offer(None, black_box(Some("gold coins")), black_box(Some("25"))))
    });
}

fn bench_completion_url(c: &mut Criterion) {
    let params = CompletionUrlParams {
        base_url: "https://ads.example.com/v1/complete?id=1",
        customer_id: Some("customer id"),
        reward_name: Some("gold coins"),
        reward_amount: Some("25"),
        class_name: Some("com.example.ads.Fullscreen"),
        custom_data: Some("{\"session\":\"a b c\"}"),
        sdk_version: SDK_VERSION,
        api_version: API_VERSION,
    };
    c.bench_function("build_completion_url", |b| {
        b.iter(|| build_completion_url(black_box(&params)))
    });
}

criterion_group!(benches, bench_parse_reward_offer, bench_completion_url);
criterion_main!(benches);
