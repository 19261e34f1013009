//! Ordered handler registrations plus the type-keyed handler table.
//!
//! Registrations keep insertion order; the synthesizer emits endpoints in that order.
//! Handlers are stored as `Arc<dyn RequestHandler<R>>` boxed into `dyn Any` and keyed by
//! the request's [`TypeInfo`] (downcast on dispatch). Re-registering a request type keeps
//! both registrations in the list, while dispatch uses the latest handler.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::dispatch::{JsonInvoker, TypedInvoker};
use super::{Request, RequestHandler, Unit};
use crate::type_info::TypeInfo;

pub type Boxed = Arc<dyn Any + Send + Sync>;

/// Service shape of a request handler registration: `Handler<TRequest>` when the
/// response is [`Unit`], `Handler<TRequest, TResponse>` otherwise.
#[derive(Clone)]
pub struct HandlerShape {
    request: TypeInfo,
    response: Option<TypeInfo>,
    invoker: Arc<dyn JsonInvoker>,
}

impl HandlerShape {
    #[must_use]
    pub fn request(&self) -> TypeInfo {
        self.request
    }

    /// `None` for the void (single type argument) shape.
    #[must_use]
    pub fn response(&self) -> Option<TypeInfo> {
        self.response
    }

    /// Generic arguments of the shape: `[request]` or `[request, response]`.
    #[must_use]
    pub fn type_arguments(&self) -> Vec<TypeInfo> {
        let mut args = vec![self.request];
        args.extend(self.response);
        args
    }

    pub(crate) fn invoker(&self) -> &Arc<dyn JsonInvoker> {
        &self.invoker
    }
}

impl fmt::Debug for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerShape")
            .field("request", &self.request)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum ServiceShape {
    Handler(HandlerShape),
    /// Any other service; ignored by endpoint synthesis.
    Other(TypeInfo),
}

impl ServiceShape {
    #[must_use]
    pub fn as_handler(&self) -> Option<&HandlerShape> {
        match self {
            Self::Handler(shape) => Some(shape),
            Self::Other(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceRegistration {
    shape: ServiceShape,
    implementation: TypeInfo,
}

impl ServiceRegistration {
    #[must_use]
    pub fn shape(&self) -> &ServiceShape {
        &self.shape
    }

    #[must_use]
    pub fn implementation(&self) -> TypeInfo {
        self.implementation
    }
}

/// Link-time handler registration collected with `inventory`.
///
/// ```ignore
/// fn register_ping(registry: &mut HandlerRegistry) {
///     registry.add_handler::<Ping, _>(PingHandler);
/// }
///
/// inventory::submit! {
///     HandlerDescriptor { name: "ping", register: register_ping }
/// }
/// ```
pub struct HandlerDescriptor {
    pub name: &'static str,
    pub register: fn(&mut HandlerRegistry),
}

inventory::collect!(HandlerDescriptor);

#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<ServiceRegistration>,
    handlers: HashMap<TypeInfo, Boxed>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from every [`HandlerDescriptor`] linked into the binary.
    #[must_use]
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for descriptor in inventory::iter::<HandlerDescriptor> {
            tracing::debug!(descriptor = descriptor.name, "registering discovered handler");
            (descriptor.register)(&mut registry);
        }
        registry
    }

    /// Register `handler` for requests of type `R`.
    pub fn add_handler<R, H>(&mut self, handler: H) -> &mut Self
    where
        R: Request + DeserializeOwned,
        R::Response: Serialize,
        H: RequestHandler<R>,
    {
        let request = TypeInfo::of::<R>();
        let response = TypeInfo::of::<R::Response>();
        let response = (!response.is::<Unit>()).then_some(response);

        let shared: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        if self.handlers.insert(request, Arc::new(shared)).is_some() {
            tracing::warn!(
                request = request.full_name(),
                "request handler registered twice; dispatch uses the latest one"
            );
        }

        self.registrations.push(ServiceRegistration {
            shape: ServiceShape::Handler(HandlerShape {
                request,
                response,
                invoker: Arc::new(TypedInvoker::<R>::new()),
            }),
            implementation: TypeInfo::of::<H>(),
        });
        self
    }

    /// Record a service that is not a request handler.
    pub fn add_service<S: ?Sized + 'static>(&mut self) -> &mut Self {
        let service = TypeInfo::of::<S>();
        self.registrations.push(ServiceRegistration {
            shape: ServiceShape::Other(service),
            implementation: service,
        });
        self
    }

    #[must_use]
    pub fn registrations(&self) -> &[ServiceRegistration] {
        &self.registrations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub(crate) fn handlers(&self) -> &HashMap<TypeInfo, Boxed> {
        &self.handlers
    }
}
