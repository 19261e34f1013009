//! Type-keyed request dispatch and the JSON bridge used by synthesized endpoints.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::registry::{Boxed, HandlerRegistry};
use super::{Request, RequestHandler};
use crate::error::DispatchError;
use crate::type_info::TypeInfo;

/// Sends requests to the handler registered for their type.
#[derive(Clone, Default)]
pub struct Mediator {
    handlers: Arc<HashMap<TypeInfo, Boxed>>,
}

impl Mediator {
    #[must_use]
    pub fn from_registry(registry: &HandlerRegistry) -> Self {
        Self {
            handlers: Arc::new(registry.handlers().clone()),
        }
    }

    /// # Errors
    /// `HandlerNotFound` when no handler is registered for `R`, `Handler` when the
    /// handler itself fails.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, DispatchError> {
        let key = TypeInfo::of::<R>();
        let handler = self
            .handlers
            .get(&key)
            .ok_or(DispatchError::HandlerNotFound { request: key })?
            .downcast_ref::<Arc<dyn RequestHandler<R>>>()
            .ok_or(DispatchError::TypeMismatch { request: key })?
            .clone();

        handler
            .handle(request)
            .await
            .map_err(|source| DispatchError::Handler {
                request: key,
                source,
            })
    }

    #[must_use]
    pub fn handles(&self, request: &TypeInfo) -> bool {
        self.handlers.contains_key(request)
    }
}

/// Request payload as read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Raw query string, decoded straight into the request type.
    Query(String),
}

/// Erased `Payload -> R -> mediator -> R::Response -> Value` pipeline, closing over the
/// concrete request type of one registration.
#[async_trait]
pub trait JsonInvoker: Send + Sync {
    async fn invoke(
        &self,
        mediator: &Mediator,
        payload: Payload,
    ) -> Result<Value, DispatchError>;
}

pub struct TypedInvoker<R>(PhantomData<fn() -> R>);

impl<R> TypedInvoker<R> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for TypedInvoker<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> JsonInvoker for TypedInvoker<R>
where
    R: Request + DeserializeOwned,
    R::Response: Serialize,
{
    async fn invoke(
        &self,
        mediator: &Mediator,
        payload: Payload,
    ) -> Result<Value, DispatchError> {
        let request = TypeInfo::of::<R>();
        let typed = match payload {
            Payload::Query(query) if !query.is_empty() => serde_urlencoded::from_str::<R>(&query)
                .map_err(|source| DispatchError::InvalidQuery { request, source })?,
            Payload::Query(_) => from_json::<R>(&Value::Object(Map::new()))
                .map_err(|source| DispatchError::InvalidPayload { request, source })?,
            Payload::Json(value) => from_json::<R>(&value)
                .map_err(|source| DispatchError::InvalidPayload { request, source })?,
        };
        let response = mediator.send(typed).await?;
        serde_json::to_value(response)
            .map_err(|source| DispatchError::Serialization { request, source })
    }
}

fn from_json<R: DeserializeOwned>(payload: &Value) -> Result<R, serde_json::Error> {
    // Unit-like requests also accept an empty object.
    R::deserialize(payload).or_else(|err| {
        if payload.as_object().is_some_and(Map::is_empty) {
            R::deserialize(Value::Null).map_err(|_| err)
        } else {
            Err(err)
        }
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::mediator::{Unit, handler_fn};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Add {
        a: i64,
        b: i64,
    }
    impl Request for Add {
        type Response = i64;
    }

    #[derive(Deserialize)]
    struct Fail;
    impl Request for Fail {
        type Response = Unit;
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .add_handler::<Add, _>(handler_fn(|req: Add| async move { anyhow::Ok(req.a + req.b) }))
            .add_handler::<Fail, _>(handler_fn(|_: Fail| async {
                Err::<Unit, _>(anyhow::anyhow!("boom"))
            }));
        registry
    }

    #[tokio::test]
    async fn send_routes_to_registered_handler() {
        let mediator = Mediator::from_registry(&registry());
        let sum = mediator.send(Add { a: 2, b: 3 }).await.unwrap();
        assert_eq!(sum, 5);
        assert!(mediator.handles(&TypeInfo::of::<Add>()));
    }

    #[tokio::test]
    async fn send_without_handler_is_not_found() {
        let mediator = Mediator::default();
        let err = mediator.send(Add { a: 1, b: 1 }).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
    }

    #[tokio::test]
    async fn handler_failure_is_wrapped() {
        let mediator = Mediator::from_registry(&registry());
        let err = mediator.send(Fail).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn json_invoker_round_trips_through_mediator() {
        let mediator = Mediator::from_registry(&registry());
        let invoker = TypedInvoker::<Add>::new();

        let value = invoker
            .invoke(&mediator, Payload::Json(json!({"a": 40, "b": 2})))
            .await
            .unwrap();
        assert_eq!(value, json!(42));

        let err = invoker
            .invoke(&mediator, Payload::Json(json!({"a": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn query_payload_decodes_numeric_fields() {
        let mediator = Mediator::from_registry(&registry());
        let invoker = TypedInvoker::<Add>::new();

        let value = invoker
            .invoke(&mediator, Payload::Query("a=40&b=2".to_owned()))
            .await
            .unwrap();
        assert_eq!(value, json!(42));

        let err = invoker
            .invoke(&mediator, Payload::Query("a=forty&b=2".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn unit_request_accepts_empty_object() {
        let mediator = Mediator::from_registry(&registry());
        let err = TypedInvoker::<Fail>::new()
            .invoke(&mediator, Payload::Json(json!({})))
            .await
            .unwrap_err();
        // Deserialized fine; the handler itself failed.
        assert!(matches!(err, DispatchError::Handler { .. }));

        let err = TypedInvoker::<Fail>::new()
            .invoke(&mediator, Payload::Query(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
    }
}
