//! axum adapter: mounts synthesized endpoint models on a [`Router`].
//!
//! Routes:
//! - a selector with an explicit route is mounted there (relative routes are joined to
//!   the prefix);
//! - otherwise at `{prefix}/{endpoint}/{action}`, and `Index` additionally at
//!   `{prefix}/{endpoint}`.
//!
//! The prefix is normalized to a leading `/` without a trailing one. The method filter of
//! a selector is the intersection of its method constraints; a selector without one
//! accepts any method. Payloads are read from the JSON body (capped at the configured
//! body limit), or decoded from the query string when the body is empty.

mod problem;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter, any};
use http::{Method, StatusCode, header};
use http_body_util::LengthLimitError;

pub use problem::{APPLICATION_PROBLEM_JSON, Problem};

use crate::endpoint::ConcreteEndpoint;
use crate::error::{DispatchError, MountError};
use crate::mediator::{JsonInvoker, Mediator, Payload};
use crate::model::{EndpointModel, SelectorModel};
use crate::template::INDEX_ACTION;
use crate::type_info::TypeInfo;

/// Request bodies larger than this are rejected with `413` unless configured otherwise.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// A path a synthesized selector is mounted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    /// `None` accepts any method.
    pub methods: Option<Vec<Method>>,
    pub endpoint: String,
    pub action: String,
}

/// `prefix` with a leading `/` and no trailing one; empty and `/` both mount at the root.
#[must_use]
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// [`mount`] with [`DEFAULT_BODY_LIMIT_BYTES`].
///
/// # Errors
/// See [`mount_with_body_limit`].
pub fn mount(
    models: &[EndpointModel],
    mediator: &Mediator,
    prefix: &str,
) -> Result<Router, MountError> {
    mount_with_body_limit(models, mediator, prefix, DEFAULT_BODY_LIMIT_BYTES)
}

/// Mount every synthesized endpoint of `models`. Manual endpoints are skipped; the host
/// application routes those itself.
///
/// # Errors
/// [`MountError::InvalidRoute`] when a path cannot be routed,
/// [`MountError::DuplicateRoute`] when two selectors claim the same path and method,
/// [`MountError::UnsupportedMethod`] for methods axum cannot filter on,
/// [`MountError::DisjointMethods`] when a selector's method constraints share no method.
pub fn mount_with_body_limit(
    models: &[EndpointModel],
    mediator: &Mediator,
    prefix: &str,
    body_limit: usize,
) -> Result<Router, MountError> {
    let prefix = normalize_prefix(prefix);
    let mut paths: BTreeMap<String, PathRoutes> = BTreeMap::new();

    for model in models {
        let Some(endpoint) = model.endpoint().as_synthesized() else {
            continue;
        };

        for action in model.actions() {
            for selector in action.selectors() {
                let target = Arc::new(RouteTarget::new(
                    endpoint,
                    selector,
                    mediator.clone(),
                    body_limit,
                ));
                let allowed = selector.allowed_methods();

                for path in selector_paths(&prefix, model.name(), action.action_name(), selector) {
                    validate_path(&path)?;
                    tracing::debug!(
                        path = %path,
                        methods = ?allowed,
                        request = target.request.full_name(),
                        "mounting endpoint route"
                    );
                    paths
                        .entry(path.clone())
                        .or_default()
                        .add(&path, allowed.as_deref(), &target)?;
                }
            }
        }
    }

    let count = paths.len();
    let router = paths.into_iter().fold(Router::new(), |router, (path, routes)| {
        router.route(&path, routes.router)
    });
    tracing::info!(routes = count, prefix = %prefix, "mounted mediator endpoints");
    Ok(router)
}

/// Paths [`mount`] would route for the synthesized endpoints of `models`, in model order.
#[must_use]
pub fn routes(models: &[EndpointModel], prefix: &str) -> Vec<RouteEntry> {
    let prefix = normalize_prefix(prefix);
    let mut entries = Vec::new();
    for model in models {
        if model.endpoint().as_synthesized().is_none() {
            continue;
        }
        for action in model.actions() {
            for selector in action.selectors() {
                let methods = selector.allowed_methods();
                for path in selector_paths(&prefix, model.name(), action.action_name(), selector) {
                    entries.push(RouteEntry {
                        path,
                        methods: methods.clone(),
                        endpoint: model.name().to_owned(),
                        action: action.action_name().to_owned(),
                    });
                }
            }
        }
    }
    entries
}

fn selector_paths(
    prefix: &str,
    endpoint: &str,
    action: &str,
    selector: &SelectorModel,
) -> Vec<String> {
    match selector.route() {
        Some(route) if route.starts_with('/') => vec![route.to_owned()],
        Some(route) => vec![format!("{prefix}/{route}")],
        None => {
            let base = format!("{prefix}/{endpoint}");
            let mut paths = vec![format!("{base}/{action}")];
            if action == INDEX_ACTION {
                paths.push(base);
            }
            paths
        }
    }
}

/// Rejects paths axum would panic on, and captures, which never reach the payload.
fn validate_path(path: &str) -> Result<(), MountError> {
    let invalid = |reason| MountError::InvalidRoute {
        path: path.to_owned(),
        reason,
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }
    if path.contains("//") {
        return Err(invalid("contains an empty segment"));
    }
    if path.contains(['{', '}']) {
        return Err(invalid("path parameters are not supported"));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(invalid("segments must not start with `:` or `*`"));
    }
    Ok(())
}

#[derive(Default)]
struct PathRoutes {
    any: bool,
    methods: Vec<Method>,
    router: MethodRouter,
}

impl PathRoutes {
    fn add(
        &mut self,
        path: &str,
        allowed: Option<&[Method]>,
        target: &Arc<RouteTarget>,
    ) -> Result<(), MountError> {
        let duplicate = || MountError::DuplicateRoute {
            path: path.to_owned(),
        };

        let handler = {
            let target = Arc::clone(target);
            move |request: Request| {
                let target = Arc::clone(&target);
                async move { target.handle(request).await }
            }
        };

        let Some(allowed) = allowed else {
            if self.any || !self.methods.is_empty() {
                return Err(duplicate());
            }
            self.any = true;
            self.router = any(handler);
            return Ok(());
        };

        if allowed.is_empty() {
            return Err(MountError::DisjointMethods {
                path: path.to_owned(),
            });
        }
        if self.any || allowed.iter().any(|m| self.methods.contains(m)) {
            return Err(duplicate());
        }

        let mut router = std::mem::take(&mut self.router);
        for method in allowed {
            let filter = MethodFilter::try_from(method.clone()).map_err(|_| {
                MountError::UnsupportedMethod {
                    method: method.clone(),
                    path: path.to_owned(),
                }
            })?;
            router = router.on(filter, handler.clone());
            self.methods.push(method.clone());
        }
        self.router = router;
        Ok(())
    }
}

/// Everything a mounted selector needs at request time.
struct RouteTarget {
    request: TypeInfo,
    invoker: Arc<dyn JsonInvoker>,
    mediator: Mediator,
    consumes: Option<Vec<String>>,
    body_limit: usize,
}

impl RouteTarget {
    fn new(
        endpoint: &ConcreteEndpoint,
        selector: &SelectorModel,
        mediator: Mediator,
        body_limit: usize,
    ) -> Self {
        Self {
            request: endpoint.request_type(),
            invoker: Arc::clone(endpoint.invoker()),
            mediator,
            consumes: selector
                .consumes()
                .map(|types| types.into_iter().map(str::to_owned).collect()),
            body_limit,
        }
    }

    async fn handle(&self, request: Request) -> Response {
        let path = request.uri().path().to_owned();

        if let Some(accepted) = &self.consumes {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            if !content_type.is_some_and(|ct| media_type_matches(ct, accepted)) {
                return Problem::unsupported_media_type(content_type, accepted)
                    .with_instance(path)
                    .into_response();
            }
        }

        let declared = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        if declared.is_some_and(|length| length > self.body_limit) {
            return Problem::payload_too_large(self.body_limit)
                .with_instance(path)
                .into_response();
        }

        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, self.body_limit).await {
            Ok(bytes) => bytes,
            Err(err) if exceeds_limit(&err) => {
                return Problem::payload_too_large(self.body_limit)
                    .with_instance(path)
                    .into_response();
            }
            Err(err) => {
                return Problem::bad_request(format!("failed to read request body: {err}"))
                    .with_instance(path)
                    .into_response();
            }
        };

        let payload = match read_payload(&bytes, parts.uri.query()) {
            Ok(payload) => payload,
            Err(detail) => {
                return Problem::bad_request(detail).with_instance(path).into_response();
            }
        };

        match self.invoker.invoke(&self.mediator, payload).await {
            Ok(value) => (StatusCode::OK, axum::Json(value)).into_response(),
            Err(err) => {
                log_dispatch_error(&err, &path);
                Problem::from(&err).with_instance(path).into_response()
            }
        }
    }
}

fn log_dispatch_error(err: &DispatchError, path: &str) {
    match err {
        DispatchError::InvalidPayload { .. }
        | DispatchError::InvalidQuery { .. }
        | DispatchError::HandlerNotFound { .. } => {
            tracing::debug!(path, error = %err, "request rejected");
        }
        DispatchError::TypeMismatch { .. }
        | DispatchError::Serialization { .. }
        | DispatchError::Handler { .. } => {
            tracing::error!(path, error = %err, "request handler failed");
        }
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// JSON body when present, otherwise the raw query string.
fn read_payload(body: &Bytes, query: Option<&str>) -> Result<Payload, String> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(body)
            .map(Payload::Json)
            .map_err(|err| format!("malformed JSON body: {err}"));
    }
    Ok(Payload::Query(query.unwrap_or_default().to_owned()))
}

fn media_type_matches(content_type: &str, accepted: &[String]) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    accepted.iter().any(|a| a.eq_ignore_ascii_case(essence))
}
