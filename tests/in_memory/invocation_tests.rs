//! Invocation routing, failure classification, and latency tests.

use super::helpers::{BrokerHarness, harness, simple_contract};
use intent_broker::broker::BrokerError;
use intent_broker::contract::domain::Endpoint;
use intent_broker::invocation::adapters::EndpointBehaviour;
use intent_broker::matching::domain::IntentRequest;
use intent_broker::registry::domain::{LivenessState, ServiceId};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

async fn healthy_service(harness: &BrokerHarness, name: &str) -> (ServiceId, Endpoint) {
    let service_id = harness
        .broker
        .register_intent(simple_contract(name, &["summarize"]))
        .await
        .expect("registration should succeed");
    harness
        .broker
        .heartbeat(service_id)
        .await
        .expect("heartbeat should succeed");
    let endpoint = harness
        .broker
        .get(service_id)
        .await
        .expect("entry should exist")
        .endpoint()
        .clone();
    (service_id, endpoint)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_invocation_returns_body_and_records_latency(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint.clone(), EndpointBehaviour::Respond(json!({"summary": "short"})))
        .expect("script should succeed");

    let reply = harness
        .broker
        .invoke(service_id, &json!({"text": "long"}), Some(1_000))
        .await
        .expect("invocation should succeed");

    assert_eq!(reply, json!({"summary": "short"}));
    assert_eq!(harness.transport.call_count(&endpoint).expect("count"), 1);
    let latency = harness.broker.latency(service_id).expect("latency should be recorded");
    assert_eq!(latency.samples, 1);
    assert!(latency.max >= latency.median);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remote_error_body_is_returned_verbatim(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    let body = json!({"code": 422, "message": "text too short"});
    harness
        .transport
        .script(endpoint, EndpointBehaviour::RemoteFailure(body.clone()))
        .expect("script should succeed");

    let result = harness.broker.invoke(service_id, &json!({}), None).await;

    assert!(matches!(
        result,
        Err(BrokerError::RemoteError { service_id: id, body: returned })
            if id == service_id && returned == body
    ));
    assert_eq!(
        harness.broker.latency(service_id).map(|latency| latency.samples),
        Some(1)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_connection_is_unreachable(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Unreachable("connection refused".to_owned()))
        .expect("script should succeed");

    let result = harness.broker.invoke(service_id, &json!({}), None).await;

    assert!(matches!(
        result,
        Err(BrokerError::Unreachable { service_id: id, .. }) if id == service_id
    ));
    assert!(harness.broker.latency(service_id).is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_endpoint_times_out_as_unreachable(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Stall(Duration::from_secs(5)))
        .expect("script should succeed");

    let result = harness.broker.invoke(service_id, &json!({}), Some(50)).await;

    assert!(matches!(result, Err(BrokerError::Unreachable { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invoking_unknown_service_is_not_found(harness: BrokerHarness) {
    let unknown = ServiceId::new();

    let result = harness.broker.invoke(unknown, &json!({}), None).await;

    assert!(matches!(result, Err(BrokerError::NotFound(id)) if id == unknown));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dispatch_resolves_and_invokes_the_winner(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint.clone(), EndpointBehaviour::Echo)
        .expect("script should succeed");

    let reply = harness
        .broker
        .dispatch(&IntentRequest::new("summarize"), &json!({"text": "echo"}), None)
        .await
        .expect("dispatch should succeed");

    assert_eq!(reply, json!({"text": "echo"}));
    assert_eq!(harness.transport.call_count(&endpoint).expect("count"), 1);
    assert!(harness.broker.latency(service_id).is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_failing_service_does_not_affect_another(harness: BrokerHarness) {
    let (broken, broken_endpoint) = healthy_service(&harness, "nfa.broken").await;
    let (working, working_endpoint) = healthy_service(&harness, "nfa.working").await;
    harness
        .transport
        .script(broken_endpoint, EndpointBehaviour::Unreachable("down".to_owned()))
        .expect("script should succeed");
    harness
        .transport
        .script(working_endpoint, EndpointBehaviour::Respond(json!("ok")))
        .expect("script should succeed");

    let failed = harness.broker.invoke(broken, &json!({}), None).await;
    let succeeded = harness.broker.invoke(working, &json!({}), None).await;

    assert!(matches!(failed, Err(BrokerError::Unreachable { .. })));
    assert_eq!(succeeded.expect("working service should answer"), json!("ok"));
}

async fn invoke_once(harness: &BrokerHarness, service_id: ServiceId, endpoint: Endpoint) {
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Respond(json!("ok")))
        .expect("script should succeed");
    harness
        .broker
        .invoke(service_id, &json!({}), None)
        .await
        .expect("invocation should succeed");
    assert!(harness.broker.ledger().tracks(service_id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn eviction_drops_invocation_state(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    invoke_once(&harness, service_id, endpoint).await;

    harness.clock.advance_secs(500);
    harness.broker.liveness().sweep().await.expect("sweep should succeed");
    harness.broker.liveness().sweep().await.expect("sweep should succeed");
    harness.clock.advance_secs(61);
    harness.broker.liveness().sweep().await.expect("sweep should succeed");

    assert!(matches!(
        harness.broker.get(service_id).await,
        Err(BrokerError::NotFound(_))
    ));
    assert!(harness.broker.latency(service_id).is_none());
    assert!(!harness.broker.ledger().tracks(service_id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn supersession_drops_invocation_state_of_the_replaced_entry(harness: BrokerHarness) {
    let (replaced, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    invoke_once(&harness, replaced, endpoint).await;

    let (replacement, _) = healthy_service(&harness, "nfa.summarizer").await;

    assert_ne!(replaced, replacement);
    assert!(harness.broker.latency(replaced).is_none());
    assert!(!harness.broker.ledger().tracks(replaced));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistration_drops_invocation_state(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    invoke_once(&harness, service_id, endpoint).await;

    harness
        .broker
        .deregister(service_id)
        .await
        .expect("deregistration should succeed");

    assert!(!harness.broker.ledger().tracks(service_id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_invocation_degrades_a_late_service_early(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Unreachable("connection refused".to_owned()))
        .expect("script should succeed");
    harness.clock.advance_secs(25);

    let result = harness.broker.invoke(service_id, &json!({}), None).await;
    assert!(matches!(result, Err(BrokerError::Unreachable { .. })));
    let stored = harness.broker.get(service_id).await.expect("entry should exist");
    assert_eq!(stored.state(), LivenessState::Healthy);

    let transitions = harness
        .broker
        .liveness()
        .evaluate_expedited()
        .await
        .expect("expedited evaluation should succeed");

    assert_eq!(transitions.len(), 1);
    let transition = transitions.first().expect("one transition");
    assert_eq!(transition.service_id, service_id);
    assert_eq!(transition.from, LivenessState::Healthy);
    assert_eq!(transition.to, LivenessState::Degraded);
    let stored = harness.broker.get(service_id).await.expect("entry should exist");
    assert_eq!(stored.state(), LivenessState::Degraded);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_invocation_of_a_punctual_service_changes_nothing(harness: BrokerHarness) {
    let (service_id, endpoint) = healthy_service(&harness, "nfa.summarizer").await;
    harness
        .transport
        .script(endpoint, EndpointBehaviour::Unreachable("connection refused".to_owned()))
        .expect("script should succeed");

    let result = harness.broker.invoke(service_id, &json!({}), None).await;
    assert!(matches!(result, Err(BrokerError::Unreachable { .. })));

    let transitions = harness
        .broker
        .liveness()
        .evaluate_expedited()
        .await
        .expect("expedited evaluation should succeed");

    assert!(transitions.is_empty());
    let stored = harness.broker.get(service_id).await.expect("entry should exist");
    assert_eq!(stored.state(), LivenessState::Healthy);
}
