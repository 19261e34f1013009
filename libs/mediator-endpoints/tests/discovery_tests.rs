#![allow(clippy::unwrap_used, clippy::expect_used)]

use mediator_endpoints::{
    EndpointHost, HandlerDescriptor, HandlerRegistry, Request, RequestHandler, TypeInfo, Unit,
    inventory,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct PingRequest;
impl Request for PingRequest {
    type Response = String;
}

#[derive(Deserialize)]
struct AuditRequest {
    #[allow(dead_code)]
    message: String,
}
impl Request for AuditRequest {
    type Response = Unit;
}

struct PingHandler;

#[async_trait::async_trait]
impl RequestHandler<PingRequest> for PingHandler {
    async fn handle(&self, _request: PingRequest) -> anyhow::Result<String> {
        Ok("pong".to_owned())
    }
}

struct AuditHandler;

#[async_trait::async_trait]
impl RequestHandler<AuditRequest> for AuditHandler {
    async fn handle(&self, _request: AuditRequest) -> anyhow::Result<Unit> {
        Ok(Unit)
    }
}

fn register_ping(registry: &mut HandlerRegistry) {
    registry.add_handler::<PingRequest, _>(PingHandler);
}

fn register_audit(registry: &mut HandlerRegistry) {
    registry.add_handler::<AuditRequest, _>(AuditHandler);
}

inventory::submit! {
    HandlerDescriptor { name: "ping", register: register_ping }
}

inventory::submit! {
    HandlerDescriptor { name: "audit", register: register_audit }
}

#[test]
fn discover_collects_submitted_descriptors() {
    let registry = HandlerRegistry::discover();

    let mut requests: Vec<TypeInfo> = registry
        .registrations()
        .iter()
        .filter_map(|r| r.shape().as_handler())
        .map(mediator_endpoints::mediator::HandlerShape::request)
        .collect();
    requests.sort_by_key(TypeInfo::name);

    assert_eq!(
        requests,
        vec![TypeInfo::of::<AuditRequest>(), TypeInfo::of::<PingRequest>()]
    );
}

#[tokio::test]
async fn discovered_handlers_are_synthesized_and_dispatchable() {
    let host = EndpointHost::builder()
        .registry(HandlerRegistry::discover())
        .build()
        .unwrap();

    assert!(host.model("PingRequest").is_some());
    assert!(host.model("AuditRequest").is_some());

    let pong = host.mediator().send(PingRequest).await.unwrap();
    assert_eq!(pong, "pong");
}
