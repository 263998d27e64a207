//! Constraint satisfaction and ranking tests.

use super::helpers::{
    BrokerHarness, harness, prioritized_contract, simple_contract, translator_contract,
};
use intent_broker::broker::BrokerError;
use intent_broker::contract::domain::QosPriority;
use intent_broker::matching::domain::IntentRequest;
use rstest::rstest;

fn translate_request(target_language: &str) -> IntentRequest {
    IntentRequest::new("translate")
        .bind("text", "hi")
        .bind("targetLanguage", target_language)
}

#[rstest]
#[case("fr", true)]
#[case("zh", true)]
#[case("es", false)]
#[tokio::test(flavor = "multi_thread")]
async fn translator_accepts_only_listed_languages(
    harness: BrokerHarness,
    #[case] target_language: &str,
    #[case] matches: bool,
) {
    let broker = &harness.broker;
    let service_id = broker
        .register_intent(translator_contract("nfa.examples.translator"))
        .await
        .expect("registration should succeed");
    broker.heartbeat(service_id).await.expect("heartbeat should succeed");

    let result = broker.resolve_intent(&translate_request(target_language)).await;

    if matches {
        assert_eq!(result.expect("request should match").service_id, service_id);
    } else {
        assert!(matches!(
            result,
            Err(BrokerError::NoMatch { action }) if action == "translate"
        ));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_required_parameter_is_no_match(harness: BrokerHarness) {
    let broker = &harness.broker;
    let service_id = broker
        .register_intent(translator_contract("nfa.examples.translator"))
        .await
        .expect("registration should succeed");
    broker.heartbeat(service_id).await.expect("heartbeat should succeed");

    let request = IntentRequest::new("translate").bind("targetLanguage", "fr");

    assert!(matches!(
        broker.resolve_intent(&request).await,
        Err(BrokerError::NoMatch { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tighter_contract_wins_when_both_match(harness: BrokerHarness) {
    let broker = &harness.broker;
    let loose = broker
        .register_intent(simple_contract("nfa.loose", &["translate"]))
        .await
        .expect("registration should succeed");
    let tight = broker
        .register_intent(translator_contract("nfa.tight"))
        .await
        .expect("registration should succeed");
    broker.heartbeat(loose).await.expect("heartbeat should succeed");
    broker.heartbeat(tight).await.expect("heartbeat should succeed");

    let resolved = broker
        .resolve_intent(&translate_request("de"))
        .await
        .expect("request should match");

    assert_eq!(resolved.service_id, tight);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn loose_contract_still_serves_requests_the_tight_one_rejects(harness: BrokerHarness) {
    let broker = &harness.broker;
    let loose = broker
        .register_intent(simple_contract("nfa.loose", &["translate"]))
        .await
        .expect("registration should succeed");
    let tight = broker
        .register_intent(translator_contract("nfa.tight"))
        .await
        .expect("registration should succeed");
    broker.heartbeat(loose).await.expect("heartbeat should succeed");
    broker.heartbeat(tight).await.expect("heartbeat should succeed");

    let resolved = broker
        .resolve_intent(&translate_request("es"))
        .await
        .expect("request should match");

    assert_eq!(resolved.service_id, loose);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn higher_priority_wins_among_equally_specific_patterns(harness: BrokerHarness) {
    let broker = &harness.broker;
    let normal = broker
        .register_intent(prioritized_contract("nfa.normal", "summarize", QosPriority::Normal))
        .await
        .expect("registration should succeed");
    let critical = broker
        .register_intent(prioritized_contract("nfa.critical", "summarize", QosPriority::Critical))
        .await
        .expect("registration should succeed");
    broker.heartbeat(normal).await.expect("heartbeat should succeed");
    broker.heartbeat(critical).await.expect("heartbeat should succeed");

    let resolved = broker
        .resolve_intent(&IntentRequest::new("summarize"))
        .await
        .expect("request should match");

    assert_eq!(resolved.service_id, critical);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn older_registration_wins_full_ties(harness: BrokerHarness) {
    let broker = &harness.broker;
    let older = broker
        .register_intent(simple_contract("nfa.older", &["summarize"]))
        .await
        .expect("registration should succeed");
    harness.clock.advance_secs(1);
    let newer = broker
        .register_intent(simple_contract("nfa.newer", &["summarize"]))
        .await
        .expect("registration should succeed");
    broker.heartbeat(newer).await.expect("heartbeat should succeed");
    broker.heartbeat(older).await.expect("heartbeat should succeed");

    let resolved = broker
        .resolve_intent(&IntentRequest::new("summarize"))
        .await
        .expect("request should match");

    assert_eq!(resolved.service_id, older);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_resolution_is_deterministic(harness: BrokerHarness) {
    let broker = &harness.broker;
    for name in ["nfa.a", "nfa.b", "nfa.c", "nfa.d"] {
        let service_id = broker
            .register_intent(simple_contract(name, &["summarize"]))
            .await
            .expect("registration should succeed");
        broker.heartbeat(service_id).await.expect("heartbeat should succeed");
    }

    let request = IntentRequest::new("summarize");
    let first = broker
        .resolve_intent(&request)
        .await
        .expect("request should match");
    for _ in 0..20 {
        let again = broker
            .resolve_intent(&request)
            .await
            .expect("request should match");
        assert_eq!(again.service_id, first.service_id);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn healthy_service_outranks_degraded_one(harness: BrokerHarness) {
    let broker = &harness.broker;
    let stale = broker
        .register_intent(prioritized_contract("nfa.stale", "summarize", QosPriority::Critical))
        .await
        .expect("registration should succeed");
    let fresh = broker
        .register_intent(prioritized_contract("nfa.fresh", "summarize", QosPriority::Low))
        .await
        .expect("registration should succeed");
    broker.heartbeat(stale).await.expect("heartbeat should succeed");
    harness.clock.advance_secs(25);
    broker.heartbeat(fresh).await.expect("heartbeat should succeed");
    broker.liveness().sweep().await.expect("sweep should succeed");

    let resolved = broker
        .resolve_intent(&IntentRequest::new("summarize"))
        .await
        .expect("request should match");

    assert_eq!(resolved.service_id, fresh);
}
