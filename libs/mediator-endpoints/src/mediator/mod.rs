//! Minimal mediator surface consumed by the endpoint synthesizer.
//!
//! Requests declare their response type; handlers are registered per request type in a
//! [`HandlerRegistry`], which keeps the ordered registration list the synthesizer walks
//! and the type-keyed handler table a [`Mediator`] dispatches through.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod dispatch;
mod registry;

pub(crate) use dispatch::{JsonInvoker, Payload};
pub use dispatch::Mediator;
pub use registry::{HandlerDescriptor, HandlerRegistry, HandlerShape, ServiceRegistration, ServiceShape};

/// A request routed through the mediator to exactly one handler.
pub trait Request: Send + 'static {
    /// Use [`Unit`] for fire-and-forget requests.
    type Response: Send + 'static;
}

/// Response marker for requests that produce no value. Serializes as JSON `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit;

#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// # Errors
    /// Any handler failure; the mediator reports it as [`DispatchError::Handler`].
    ///
    /// [`DispatchError::Handler`]: crate::error::DispatchError::Handler
    async fn handle(&self, request: R) -> anyhow::Result<R::Response>;
}

/// Adapter turning an async closure into a [`RequestHandler`].
pub struct FnHandler<F>(F);

#[must_use]
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

#[async_trait]
impl<R, F, Fut> RequestHandler<R> for FnHandler<F>
where
    R: Request,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R::Response>> + Send + 'static,
{
    async fn handle(&self, request: R) -> anyhow::Result<R::Response> {
        (self.0)(request).await
    }
}
