//! Naming and verb conventions applied to endpoint models after synthesis.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::classification::RequestClassification;
use crate::config::EndpointsConfig;
use crate::endpoint::ActionDescriptor;
use crate::model::EndpointModel;
use crate::type_info::TypeInfo;

/// Derives an endpoint's external name and method constraints from its request type.
///
/// Endpoints not derived from a recognized base template are left untouched.
pub trait EndpointConvention: Send + Sync {
    /// Defaults to the request's short type name.
    fn endpoint_name(&self, request: &TypeInfo) -> String {
        default_endpoint_name(request)
    }

    /// Defaults to the declared action name.
    fn action_name(&self, request: &TypeInfo, action: &ActionDescriptor) -> String {
        let _ = request;
        default_action_name(action)
    }

    /// `None` leaves every method constraint as it is.
    fn classify(&self, request: &TypeInfo) -> Option<RequestClassification> {
        let _ = request;
        None
    }

    fn apply(&self, endpoint: &mut EndpointModel) {
        if endpoint.endpoint().recognized_base().is_none() {
            return;
        }
        let Some(request) = endpoint.request_type() else {
            return;
        };

        endpoint.set_name(self.endpoint_name(&request));
        let classification = self.classify(&request);
        let verbs = classification.map(RequestClassification::http_methods);

        for action in endpoint.actions_mut() {
            let name = self.action_name(&request, action.descriptor());
            action.set_action_name(name);

            let Some(verbs) = &verbs else {
                continue;
            };
            for selector in action.selectors_mut() {
                selector.merge_http_methods(verbs);
            }
        }

        tracing::debug!(
            request = request.full_name(),
            endpoint = endpoint.name(),
            classification = classification.map(RequestClassification::as_str),
            "applied endpoint convention"
        );
    }
}

#[must_use]
pub fn default_endpoint_name(request: &TypeInfo) -> String {
    request.name().to_owned()
}

#[must_use]
pub fn default_action_name(action: &ActionDescriptor) -> String {
    action.name().to_owned()
}

/// Convention with every hook at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConvention;

impl EndpointConvention for DefaultConvention {}

type NameFn = Arc<dyn Fn(&TypeInfo) -> String + Send + Sync>;
type ActionNameFn = Arc<dyn Fn(&TypeInfo, &ActionDescriptor) -> String + Send + Sync>;
type ClassifyFn = Arc<dyn Fn(&TypeInfo) -> Option<RequestClassification> + Send + Sync>;

/// Convention configured with closures; unset hooks fall back to the defaults.
///
/// ```
/// # use mediator_endpoints::{FnConvention, RequestClassification};
/// let convention = FnConvention::new()
///     .with_endpoint_name(|request| request.name().trim_end_matches("Request").to_owned())
///     .with_classifier(|_| Some(RequestClassification::Query));
/// # let _ = convention;
/// ```
#[derive(Clone, Default)]
#[must_use]
pub struct FnConvention {
    endpoint_name: Option<NameFn>,
    action_name: Option<ActionNameFn>,
    classify: Option<ClassifyFn>,
}

impl FnConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint_name(
        mut self,
        f: impl Fn(&TypeInfo) -> String + Send + Sync + 'static,
    ) -> Self {
        self.endpoint_name = Some(Arc::new(f));
        self
    }

    pub fn with_action_name(
        mut self,
        f: impl Fn(&TypeInfo, &ActionDescriptor) -> String + Send + Sync + 'static,
    ) -> Self {
        self.action_name = Some(Arc::new(f));
        self
    }

    pub fn with_classifier(
        mut self,
        f: impl Fn(&TypeInfo) -> Option<RequestClassification> + Send + Sync + 'static,
    ) -> Self {
        self.classify = Some(Arc::new(f));
        self
    }
}

impl EndpointConvention for FnConvention {
    fn endpoint_name(&self, request: &TypeInfo) -> String {
        match &self.endpoint_name {
            Some(f) => f(request),
            None => default_endpoint_name(request),
        }
    }

    fn action_name(&self, request: &TypeInfo, action: &ActionDescriptor) -> String {
        match &self.action_name {
            Some(f) => f(request, action),
            None => default_action_name(action),
        }
    }

    fn classify(&self, request: &TypeInfo) -> Option<RequestClassification> {
        self.classify.as_ref().and_then(|f| f(request))
    }
}

/// Convention driven by [`EndpointsConfig`]: suffix stripping plus a classification
/// table keyed by request type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredConvention {
    strip_suffixes: Vec<String>,
    classifications: BTreeMap<String, RequestClassification>,
}

impl ConfiguredConvention {
    #[must_use]
    pub fn new(
        strip_suffixes: Vec<String>,
        classifications: BTreeMap<String, RequestClassification>,
    ) -> Self {
        Self {
            strip_suffixes,
            classifications,
        }
    }

    #[must_use]
    pub fn from_config(config: &EndpointsConfig) -> Self {
        Self::new(config.strip_suffixes.clone(), config.classifications.clone())
    }
}

impl EndpointConvention for ConfiguredConvention {
    fn endpoint_name(&self, request: &TypeInfo) -> String {
        let name = request.name();
        self.strip_suffixes
            .iter()
            .find_map(|suffix| {
                name.strip_suffix(suffix.as_str())
                    .filter(|stripped| !stripped.is_empty())
            })
            .unwrap_or(name)
            .to_owned()
    }

    /// Fully qualified name first, then the short name.
    fn classify(&self, request: &TypeInfo) -> Option<RequestClassification> {
        self.classifications
            .get(request.full_name())
            .or_else(|| self.classifications.get(request.name()))
            .copied()
    }
}
