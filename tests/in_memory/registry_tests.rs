//! Registration, supersession, and deregistration tests.

use super::helpers::{BrokerHarness, harness, simple_contract};
use intent_broker::broker::BrokerError;
use intent_broker::contract::domain::{
    ContractMetadata, ContractSpec, EndpointSpec, IntentContract, IntentPattern,
    ParameterConstraint, PatternConstraints, ValidationError,
};
use intent_broker::matching::domain::IntentRequest;
use intent_broker::registry::domain::LivenessState;
use rstest::rstest;
use std::collections::BTreeSet;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn heartbeat_makes_every_declared_action_resolvable(harness: BrokerHarness) {
    let broker = &harness.broker;
    let service_id = broker
        .register_intent(simple_contract("nfa.text", &["translate", "summarize", "detect"]))
        .await
        .expect("registration should succeed");
    broker.heartbeat(service_id).await.expect("heartbeat should succeed");

    for action in ["translate", "summarize", "detect"] {
        let resolved = broker
            .resolve_intent(&IntentRequest::new(action))
            .await
            .expect("every declared action should resolve");
        assert_eq!(resolved.service_id, service_id);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_contract_never_reaches_the_registry(harness: BrokerHarness) {
    let mut contract = simple_contract("nfa.text", &["translate"]);
    contract.spec.implementation.endpoint = EndpointSpec::grpc(0, "Translate");

    let result = harness.broker.register_intent(contract).await;

    assert!(matches!(
        result,
        Err(BrokerError::Validation(ValidationError::InvalidEndpointPort(0)))
    ));
    assert!(
        harness
            .broker
            .list_services()
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nan_range_bound_is_rejected(harness: BrokerHarness) {
    let pattern = IntentPattern::new("resize")
        .with_placeholder("width")
        .with_constraints(PatternConstraints::new().constrain(
            "width",
            ParameterConstraint::range(Some(f64::NAN), Some(100.0)),
        ));
    let contract = IntentContract::new(
        ContractMetadata::named("nfa.images"),
        ContractSpec::new(vec![pattern], EndpointSpec::grpc(50060, "Resize")),
    );

    let result = harness.broker.register_intent(contract).await;

    assert!(matches!(
        result,
        Err(BrokerError::Validation(ValidationError::NonFiniteBound { parameter, .. }))
            if parameter == "width"
    ));
    assert!(
        harness
            .broker
            .list_services()
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reregistering_a_name_supersedes_the_previous_entry(harness: BrokerHarness) {
    let broker = &harness.broker;
    let first = broker
        .register_intent(simple_contract("nfa.text", &["translate", "detect"]))
        .await
        .expect("first registration should succeed");
    let second = broker
        .register_intent(simple_contract("nfa.text", &["translate"]))
        .await
        .expect("second registration should succeed");

    assert!(matches!(
        broker.get(first).await,
        Err(BrokerError::NotFound(id)) if id == first
    ));
    let listed = broker.list_services().await.expect("listing should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed.first().map(|entry| entry.id()), Some(second));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_same_name_registrations_leave_one_survivor(harness: BrokerHarness) {
    let broker = Arc::new(harness.broker);
    let attempts = (0..16).map(|_| {
        let racer = Arc::clone(&broker);
        tokio::spawn(async move {
            racer
                .register_intent(simple_contract("nfa.racer", &["race"]))
                .await
        })
    });

    let mut registered = BTreeSet::new();
    for attempt in attempts.collect::<Vec<_>>() {
        let service_id = attempt
            .await
            .expect("task should not panic")
            .expect("registration should succeed");
        registered.insert(service_id);
    }

    let survivors = broker.list_services().await.expect("listing should succeed");
    assert_eq!(registered.len(), 16);
    assert_eq!(survivors.len(), 1);
    let survivor = survivors.first().expect("one survivor").id();
    for loser in registered.iter().filter(|id| **id != survivor) {
        assert!(matches!(broker.heartbeat(*loser).await, Err(BrokerError::NotFound(_))));
    }

    broker.heartbeat(survivor).await.expect("heartbeat should succeed");
    let resolved = broker
        .resolve_intent(&IntentRequest::new("race"))
        .await
        .expect("survivor should resolve");
    assert_eq!(resolved.service_id, survivor);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistering_twice_returns_not_found(harness: BrokerHarness) {
    let broker = &harness.broker;
    let kept = broker
        .register_intent(simple_contract("nfa.kept", &["translate"]))
        .await
        .expect("registration should succeed");
    let removed = broker
        .register_intent(simple_contract("nfa.removed", &["translate"]))
        .await
        .expect("registration should succeed");

    broker.deregister(removed).await.expect("first deregistration should succeed");
    let second = broker.deregister(removed).await;

    assert!(matches!(second, Err(BrokerError::NotFound(id)) if id == removed));
    let listed = broker.list_services().await.expect("listing should succeed");
    assert_eq!(listed.iter().map(|entry| entry.id()).collect::<Vec<_>>(), vec![kept]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistration_bypasses_eviction_from_any_state(harness: BrokerHarness) {
    let broker = &harness.broker;
    let service_id = broker
        .register_intent(simple_contract("nfa.text", &["translate"]))
        .await
        .expect("registration should succeed");
    broker.heartbeat(service_id).await.expect("heartbeat should succeed");
    harness.clock.advance_secs(45);
    broker.liveness().sweep().await.expect("sweep should succeed");
    broker.liveness().sweep().await.expect("sweep should succeed");
    let state = broker.get(service_id).await.expect("entry should exist").state();
    assert_eq!(state, LivenessState::Unhealthy);

    broker.deregister(service_id).await.expect("deregistration should succeed");

    assert!(matches!(broker.get(service_id).await, Err(BrokerError::NotFound(_))));
}
