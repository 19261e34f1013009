//! Endpoints known to the host: synthesized from handler registrations or declared by
//! hand.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::mediator::JsonInvoker;
use crate::template::{BaseTemplate, EndpointTemplate};
use crate::type_info::TypeInfo;

/// Selector as declared on an action, before conventions run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredSelector {
    methods: Vec<Method>,
    route: Option<String>,
}

impl DeclaredSelector {
    /// Unconstrained selector on the conventional route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Empty when the selector declares no method constraint.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }
}

/// An action (operation) declared on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    name: String,
    parameters: Vec<TypeInfo>,
    handles: Option<TypeInfo>,
    selectors: Vec<DeclaredSelector>,
}

impl ActionDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            handles: None,
            selectors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter<T: 'static>(mut self) -> Self {
        self.parameters.push(TypeInfo::of::<T>());
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = TypeInfo>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Tag the action as handling requests of type `R`, whatever its parameters.
    #[must_use]
    pub fn handles<R: 'static>(mut self) -> Self {
        self.handles = Some(TypeInfo::of::<R>());
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: DeclaredSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[TypeInfo] {
        &self.parameters
    }

    #[must_use]
    pub fn handled_request(&self) -> Option<TypeInfo> {
        self.handles
    }

    #[must_use]
    pub fn selectors(&self) -> &[DeclaredSelector] {
        &self.selectors
    }
}

/// Endpoint template bound to one request/response pair.
#[derive(Clone)]
pub struct ConcreteEndpoint {
    template: EndpointTemplate,
    request: TypeInfo,
    response: TypeInfo,
    actions: Vec<ActionDescriptor>,
    invoker: Arc<dyn JsonInvoker>,
}

impl ConcreteEndpoint {
    pub(crate) fn new(
        template: EndpointTemplate,
        request: TypeInfo,
        response: TypeInfo,
        invoker: Arc<dyn JsonInvoker>,
    ) -> Self {
        let actions = template.bound_actions();
        Self {
            template,
            request,
            response,
            actions,
            invoker,
        }
    }

    #[must_use]
    pub fn template(&self) -> &EndpointTemplate {
        &self.template
    }

    #[must_use]
    pub fn request_type(&self) -> TypeInfo {
        self.request
    }

    /// [`Unit`](crate::mediator::Unit) for void registrations.
    #[must_use]
    pub fn response_type(&self) -> TypeInfo {
        self.response
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub(crate) fn invoker(&self) -> &Arc<dyn JsonInvoker> {
        &self.invoker
    }
}

impl fmt::Debug for ConcreteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteEndpoint")
            .field("template", &self.template.to_string())
            .field("request", &self.request)
            .field("response", &self.response)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Hand-written endpoint registered by the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEndpoint {
    name: String,
    actions: Vec<ActionDescriptor>,
}

impl ManualEndpoint {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }
}

#[derive(Debug, Clone)]
pub enum EndpointType {
    Manual(ManualEndpoint),
    Synthesized(ConcreteEndpoint),
}

impl EndpointType {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Manual(endpoint) => endpoint.name.clone(),
            Self::Synthesized(endpoint) => endpoint.template.to_string(),
        }
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionDescriptor] {
        match self {
            Self::Manual(endpoint) => &endpoint.actions,
            Self::Synthesized(endpoint) => &endpoint.actions,
        }
    }

    #[must_use]
    pub fn type_arguments(&self) -> &[TypeInfo] {
        match self {
            Self::Manual(_) => &[],
            Self::Synthesized(endpoint) => endpoint.template.type_arguments(),
        }
    }

    #[must_use]
    pub fn recognized_base(&self) -> Option<BaseTemplate> {
        match self {
            Self::Manual(_) => None,
            Self::Synthesized(endpoint) => endpoint.template.recognized_base(),
        }
    }

    #[must_use]
    pub fn as_synthesized(&self) -> Option<&ConcreteEndpoint> {
        match self {
            Self::Synthesized(endpoint) => Some(endpoint),
            Self::Manual(_) => None,
        }
    }
}

impl From<ManualEndpoint> for EndpointType {
    fn from(endpoint: ManualEndpoint) -> Self {
        Self::Manual(endpoint)
    }
}

impl From<ConcreteEndpoint> for EndpointType {
    fn from(endpoint: ConcreteEndpoint) -> Self {
        Self::Synthesized(endpoint)
    }
}

/// The host's endpoint collection.
#[derive(Debug, Clone, Default)]
pub struct EndpointFeature {
    endpoints: Vec<EndpointType>,
}

impl EndpointFeature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, endpoint: impl Into<EndpointType>) {
        self.endpoints.push(endpoint.into());
    }

    #[must_use]
    pub fn endpoints(&self) -> &[EndpointType] {
        &self.endpoints
    }

    pub fn synthesized(&self) -> impl Iterator<Item = &ConcreteEndpoint> {
        self.endpoints.iter().filter_map(EndpointType::as_synthesized)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Extend<EndpointType> for EndpointFeature {
    fn extend<I: IntoIterator<Item = EndpointType>>(&mut self, iter: I) {
        self.endpoints.extend(iter);
    }
}

impl FromIterator<EndpointType> for EndpointFeature {
    fn from_iter<I: IntoIterator<Item = EndpointType>>(iter: I) -> Self {
        Self {
            endpoints: iter.into_iter().collect(),
        }
    }
}
