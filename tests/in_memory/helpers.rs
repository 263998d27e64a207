//! Shared test helpers for in-memory broker integration tests.

use chrono::{DateTime, Local, TimeDelta, Utc};
use intent_broker::broker::IntentBroker;
use intent_broker::config::BrokerConfig;
use intent_broker::contract::domain::{
    ContractMetadata, ContractSpec, EndpointSpec, IntentContract, IntentPattern,
    ParameterConstraint, PatternConstraints, QosPriority, QualityOfService,
};
use intent_broker::invocation::adapters::InMemoryEndpointTransport;
use intent_broker::registry::adapters::InMemoryServiceRegistry;
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex};

/// Broker type used throughout the in-memory tests.
pub type TestBroker = IntentBroker<InMemoryServiceRegistry, InMemoryEndpointTransport, ManualClock>;

/// Clock whose time only moves when a test advances it.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at a fixed instant.
    #[must_use]
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("fixed instant should parse")
            .with_timezone(&Utc);
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance_secs(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock lock should not be poisoned");
        *now += TimeDelta::seconds(seconds);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock should not be poisoned")
    }
}

/// Handles to a broker and the test doubles it was wired with.
pub struct BrokerHarness {
    /// Broker under test.
    pub broker: TestBroker,
    /// Scripted transport.
    pub transport: Arc<InMemoryEndpointTransport>,
    /// Manually advanced clock.
    pub clock: Arc<ManualClock>,
}

/// Provides a broker with a 10 second heartbeat interval and default
/// thresholds (degraded after 20s, unhealthy after 40s, evicted after 100s).
#[fixture]
pub fn harness() -> BrokerHarness {
    let transport = Arc::new(InMemoryEndpointTransport::new());
    let clock = Arc::new(ManualClock::new());
    let broker = IntentBroker::new(
        Arc::new(InMemoryServiceRegistry::new()),
        Arc::clone(&transport),
        Arc::clone(&clock),
        &BrokerConfig::default(),
    );
    BrokerHarness {
        broker,
        transport,
        clock,
    }
}

/// Builds a contract with unconstrained patterns for each action.
#[must_use]
pub fn simple_contract(name: &str, actions: &[&str]) -> IntentContract {
    let patterns = actions.iter().map(|action| IntentPattern::new(*action)).collect();
    IntentContract::new(
        ContractMetadata::named(name),
        ContractSpec::new(patterns, http_endpoint(name)),
    )
}

/// Builds the translator contract: `text` and `targetLanguage` required,
/// `targetLanguage` restricted to four languages.
#[must_use]
pub fn translator_contract(name: &str) -> IntentContract {
    let pattern = IntentPattern::new("translate")
        .with_placeholder("text")
        .with_placeholder("targetLanguage")
        .with_constraints(
            PatternConstraints::new()
                .require(["text", "targetLanguage"])
                .constrain(
                    "targetLanguage",
                    ParameterConstraint::one_of(["zh", "en", "fr", "de"]),
                ),
        );
    IntentContract::new(
        ContractMetadata::named(name).with_description("Translates text between languages"),
        ContractSpec::new(vec![pattern], http_endpoint(name)),
    )
}

/// Builds a contract with the given priority and one unconstrained pattern.
#[must_use]
pub fn prioritized_contract(name: &str, action: &str, priority: QosPriority) -> IntentContract {
    IntentContract::new(
        ContractMetadata::named(name),
        ContractSpec::new(vec![IntentPattern::new(action)], http_endpoint(name))
            .with_qos(QualityOfService::with_priority(priority)),
    )
}

/// Returns a distinct HTTP endpoint per contract name.
#[must_use]
pub fn http_endpoint(name: &str) -> EndpointSpec {
    EndpointSpec::http(format!("http://127.0.0.1:9000/{name}"))
}
