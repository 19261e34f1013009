//! Greeting handlers served by the binary, registered through `inventory`.

use std::collections::BTreeSet;
use std::sync::{LazyLock, Mutex, MutexGuard};

use mediator_endpoints::{
    HandlerDescriptor, HandlerRegistry, Request, Unit, handler_fn, inventory,
};
use serde::Deserialize;

static NAMES: LazyLock<Mutex<BTreeSet<String>>> = LazyLock::new(Mutex::default);

fn names() -> anyhow::Result<MutexGuard<'static, BTreeSet<String>>> {
    NAMES
        .lock()
        .map_err(|_| anyhow::anyhow!("greeting store poisoned"))
}

#[derive(Debug, Deserialize)]
pub struct GetGreetingQuery {
    pub name: String,
}

impl Request for GetGreetingQuery {
    type Response = String;
}

#[derive(Debug, Deserialize)]
pub struct ListGreetingsQuery;

impl Request for ListGreetingsQuery {
    type Response = Vec<String>;
}

#[derive(Debug, Deserialize)]
pub struct AddGreetingCommand {
    pub name: String,
}

impl Request for AddGreetingCommand {
    type Response = Unit;
}

/// Responds with whether the name was known.
#[derive(Debug, Deserialize)]
pub struct RemoveGreetingCommand {
    pub name: String,
}

impl Request for RemoveGreetingCommand {
    type Response = bool;
}

fn register(registry: &mut HandlerRegistry) {
    registry
        .add_handler::<GetGreetingQuery, _>(handler_fn(|req: GetGreetingQuery| async move {
            if !names()?.contains(&req.name) {
                anyhow::bail!("unknown name: {}", req.name);
            }
            anyhow::Ok(format!("Hello, {}!", req.name))
        }))
        .add_handler::<ListGreetingsQuery, _>(handler_fn(|_: ListGreetingsQuery| async {
            anyhow::Ok(names()?.iter().cloned().collect())
        }))
        .add_handler::<AddGreetingCommand, _>(handler_fn(|req: AddGreetingCommand| async move {
            tracing::debug!(name = %req.name, "adding greeting");
            names()?.insert(req.name);
            anyhow::Ok(Unit)
        }))
        .add_handler::<RemoveGreetingCommand, _>(handler_fn(
            |req: RemoveGreetingCommand| async move { anyhow::Ok(names()?.remove(&req.name)) },
        ));
}

inventory::submit! {
    HandlerDescriptor { name: "greetings", register }
}
