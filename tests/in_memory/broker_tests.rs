//! Broker facade tests: health, isolation, metrics, and shutdown.

use super::helpers::{BrokerHarness, harness, simple_contract};
use intent_broker::broker::{BrokerError, ServingStatus};
use intent_broker::invocation::adapters::EndpointBehaviour;
use intent_broker::matching::domain::IntentRequest;
use intent_broker::registry::domain::ServiceId;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_check_serves_until_shutdown(harness: BrokerHarness) {
    assert_eq!(harness.broker.health_check().await, ServingStatus::Serving);

    harness.broker.shutdown();

    assert_eq!(harness.broker.health_check().await, ServingStatus::NotServing);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn brokers_do_not_share_registries(harness: BrokerHarness) {
    let other = super::helpers::harness();
    let service_id = harness
        .broker
        .register_intent(simple_contract("nfa.text", &["summarize"]))
        .await
        .expect("registration should succeed");
    harness
        .broker
        .heartbeat(service_id)
        .await
        .expect("heartbeat should succeed");

    let result = other
        .broker
        .resolve_intent(&IntentRequest::new("summarize"))
        .await;

    assert!(matches!(result, Err(BrokerError::NoMatch { .. })));
    assert!(matches!(
        other.broker.get(service_id).await,
        Err(BrokerError::NotFound(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_services_returns_registration_order(harness: BrokerHarness) {
    let mut expected = Vec::new();
    for name in ["nfa.first", "nfa.second", "nfa.third"] {
        let service_id = harness
            .broker
            .register_intent(simple_contract(name, &["summarize"]))
            .await
            .expect("registration should succeed");
        expected.push(service_id);
        harness.clock.advance_secs(1);
    }

    let listed: Vec<_> = harness
        .broker
        .list_services()
        .await
        .expect("listing should succeed")
        .iter()
        .map(|entry| entry.id())
        .collect();

    assert_eq!(listed, expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn background_liveness_loop_stops_on_shutdown(harness: BrokerHarness) {
    let handle = harness.broker.spawn_liveness();

    harness.broker.shutdown();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("liveness loop should stop")
        .expect("liveness task should not panic");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_start_at_zero(harness: BrokerHarness) {
    let snapshot = harness.broker.metrics().await.expect("metrics should be readable");

    assert_eq!(snapshot.services_registered, 0);
    assert_eq!(snapshot.registrations_total, 0);
    assert_eq!(snapshot.errors.total(), 0);
    assert!(snapshot.request_duration.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_count_requests_and_errors_by_kind(harness: BrokerHarness) {
    let broker = &harness.broker;
    let service_id = broker
        .register_intent(simple_contract("nfa.text", &["summarize"]))
        .await
        .expect("registration should succeed");
    broker.heartbeat(service_id).await.expect("heartbeat should succeed");
    let endpoint = broker
        .get(service_id)
        .await
        .expect("entry should exist")
        .endpoint()
        .clone();
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Respond(json!("done")))
        .expect("script should succeed");

    broker
        .dispatch(&IntentRequest::new("summarize"), &json!({}), None)
        .await
        .expect("dispatch should succeed");
    let missing = broker.resolve_intent(&IntentRequest::new("translate")).await;
    let unknown = broker.heartbeat(ServiceId::new()).await;
    let rejected = broker
        .register_intent(simple_contract("", &["summarize"]))
        .await;

    assert!(matches!(missing, Err(BrokerError::NoMatch { .. })));
    assert!(matches!(unknown, Err(BrokerError::NotFound(_))));
    assert!(matches!(rejected, Err(BrokerError::Validation(_))));
    let snapshot = broker.metrics().await.expect("metrics should be readable");
    assert_eq!(snapshot.services_registered, 1);
    assert_eq!(snapshot.registrations_total, 1);
    assert_eq!(snapshot.heartbeats_total, 2);
    assert_eq!(snapshot.resolve_requests_total, 2);
    assert_eq!(snapshot.invoke_requests_total, 1);
    assert_eq!(snapshot.errors.no_match, 1);
    assert_eq!(snapshot.errors.not_found, 1);
    assert_eq!(snapshot.errors.validation, 1);
    assert_eq!(snapshot.errors.total(), 3);
    assert_eq!(
        snapshot.request_duration.map(|duration| duration.samples),
        Some(1)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_count_every_kind_of_removal(harness: BrokerHarness) {
    let broker = &harness.broker;
    let deregistered = broker
        .register_intent(simple_contract("nfa.leaving", &["summarize"]))
        .await
        .expect("registration should succeed");
    broker
        .register_intent(simple_contract("nfa.replaced", &["summarize"]))
        .await
        .expect("registration should succeed");
    broker
        .register_intent(simple_contract("nfa.replaced", &["summarize"]))
        .await
        .expect("replacement should succeed");
    broker
        .deregister(deregistered)
        .await
        .expect("deregistration should succeed");

    harness.clock.advance_secs(101);
    broker.liveness().sweep().await.expect("sweep should succeed");

    let snapshot = broker.metrics().await.expect("metrics should be readable");
    assert_eq!(snapshot.registrations_total, 3);
    assert_eq!(snapshot.deregistrations_total, 1);
    assert_eq!(snapshot.supersessions_total, 1);
    assert_eq!(snapshot.evictions_total, 1);
    assert_eq!(snapshot.services_registered, 0);
}
