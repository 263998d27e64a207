//! Given steps for liveness BDD scenarios.

use super::world::{LivenessWorld, run_async};
use eyre::WrapErr;
use intent_broker::contract::domain::{
    ContractMetadata, ContractSpec, EndpointSpec, IntentContract, IntentPattern,
};
use rstest_bdd_macros::given;

#[given(r#"a registered service "{name}" handling "{action}""#)]
fn a_registered_service(
    world: &mut LivenessWorld,
    name: String,
    action: String,
) -> Result<(), eyre::Report> {
    let contract = IntentContract::new(
        ContractMetadata::named(name.as_str()),
        ContractSpec::new(
            vec![IntentPattern::new(action)],
            EndpointSpec::http(format!("http://127.0.0.1:9000/{name}")),
        ),
    );
    let service_id = run_async(world.broker.register_intent(contract))
        .wrap_err("register service for scenario")?;
    world.service_id = Some(service_id);
    Ok(())
}

#[given("the service has sent a heartbeat")]
fn service_has_sent_heartbeat(world: &mut LivenessWorld) -> Result<(), eyre::Report> {
    let service_id = world.service_id()?;
    run_async(world.broker.heartbeat(service_id)).wrap_err("send initial heartbeat")?;
    Ok(())
}
