//! Endpoint synthesis: one concrete endpoint per handler registration.
//!
//! Per registration: resolve a template (hooks, then provider closure, then the default
//! for the handler shape), validate it against the recognized bases, apply the skip
//! rules, bind `(request, response | Unit)` and emit. Validation failures abort the
//! whole pass.

use std::sync::Arc;

use crate::endpoint::{ConcreteEndpoint, EndpointFeature, EndpointType};
use crate::error::{InvalidTemplateReason, SynthesisError};
use crate::mediator::{HandlerRegistry, HandlerShape, ServiceRegistration, Unit};
use crate::settings::DiscoverySettings;
use crate::template::{BaseTemplate, EndpointTemplate};
use crate::type_info::TypeInfo;

/// Overridable synthesis hooks. Both default to "no opinion".
pub trait SynthesisHooks: Send + Sync {
    /// Template for `request`; `None` defers to the provider closure or the default.
    fn provide_template(&self, request: &TypeInfo) -> Option<EndpointTemplate> {
        let _ = request;
        None
    }

    /// Return `true` to omit the endpoint for `request`.
    fn should_skip(&self, request: &TypeInfo) -> bool {
        let _ = request;
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl SynthesisHooks for DefaultHooks {}

pub type TemplateProvider = Arc<dyn Fn(&TypeInfo) -> Option<EndpointTemplate> + Send + Sync>;

pub struct EndpointSynthesizer<'a> {
    registrations: &'a [ServiceRegistration],
    provider: Option<TemplateProvider>,
    hooks: Arc<dyn SynthesisHooks>,
    settings: DiscoverySettings,
}

#[derive(Default)]
#[must_use]
pub struct EndpointSynthesizerBuilder<'a> {
    registrations: Option<&'a [ServiceRegistration]>,
    provider: Option<TemplateProvider>,
    hooks: Option<Arc<dyn SynthesisHooks>>,
    settings: DiscoverySettings,
}

impl<'a> EndpointSynthesizerBuilder<'a> {
    pub fn registry(self, registry: &'a HandlerRegistry) -> Self {
        self.registrations(registry.registrations())
    }

    pub fn registrations(mut self, registrations: &'a [ServiceRegistration]) -> Self {
        self.registrations = Some(registrations);
        self
    }

    pub fn template_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&TypeInfo) -> Option<EndpointTemplate> + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn shared_template_provider(mut self, provider: Option<TemplateProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SynthesisHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = settings;
        self
    }

    /// # Errors
    /// [`SynthesisError::MissingRegistry`] when no registry or registration list was set.
    pub fn build(self) -> Result<EndpointSynthesizer<'a>, SynthesisError> {
        let registrations = self.registrations.ok_or(SynthesisError::MissingRegistry)?;
        Ok(EndpointSynthesizer {
            registrations,
            provider: self.provider,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(DefaultHooks)),
            settings: self.settings,
        })
    }
}

impl<'a> EndpointSynthesizer<'a> {
    pub fn builder() -> EndpointSynthesizerBuilder<'a> {
        EndpointSynthesizerBuilder::default()
    }

    #[must_use]
    pub fn settings(&self) -> DiscoverySettings {
        self.settings
    }

    /// Concrete endpoints for every non-skipped registration, in registration order.
    ///
    /// # Errors
    /// [`SynthesisError::InvalidTemplate`] for the first registration whose template does
    /// not derive from a recognized base, is already bound, or fails to bind.
    pub fn synthesize(
        &self,
        existing: &[EndpointType],
    ) -> Result<Vec<ConcreteEndpoint>, SynthesisError> {
        let mut emitted = Vec::new();
        self.run(existing, &mut emitted)?;
        Ok(emitted
            .into_iter()
            .filter_map(|endpoint| match endpoint {
                EndpointType::Synthesized(endpoint) => Some(endpoint),
                EndpointType::Manual(_) => None,
            })
            .collect())
    }

    /// Append synthesized endpoints to `feature`; returns how many were added.
    ///
    /// # Errors
    /// Same as [`Self::synthesize`]; `feature` is left untouched on error.
    pub fn populate(&self, feature: &mut EndpointFeature) -> Result<usize, SynthesisError> {
        let mut emitted = Vec::new();
        self.run(feature.endpoints(), &mut emitted)?;
        let added = emitted.len();
        feature.extend(emitted);
        Ok(added)
    }

    fn run(
        &self,
        existing: &[EndpointType],
        emitted: &mut Vec<EndpointType>,
    ) -> Result<(), SynthesisError> {
        let mut skipped = 0usize;

        for shape in self
            .registrations
            .iter()
            .filter_map(|registration| registration.shape().as_handler())
        {
            let request = shape.request();
            let template = self.resolve_template(shape);

            if template.recognized_base().is_none() {
                return Err(invalid(
                    InvalidTemplateReason::NotDerivedFromBase,
                    &template,
                    BaseTemplate::ALL.to_vec(),
                    None,
                ));
            }
            if !template.is_type_definition() {
                return Err(invalid(
                    InvalidTemplateReason::NotTypeDefinition,
                    &template,
                    Vec::new(),
                    None,
                ));
            }

            if self.hooks.should_skip(&request)
                || self
                    .settings
                    .is_handled(existing.iter().chain(emitted.iter()), &request)
            {
                tracing::debug!(
                    request = request.full_name(),
                    "request already handled, skipping endpoint"
                );
                skipped += 1;
                continue;
            }

            let unit = TypeInfo::of::<Unit>();
            let args = if template.arity() > 1 {
                vec![request, shape.response().unwrap_or(unit)]
            } else {
                vec![request]
            };

            let bound = template.bind(&args).map_err(|err| {
                invalid(
                    InvalidTemplateReason::BindingFailed,
                    &template,
                    Vec::new(),
                    Some(err),
                )
            })?;

            tracing::debug!(
                request = request.full_name(),
                endpoint = %bound,
                "synthesized endpoint"
            );
            emitted.push(EndpointType::Synthesized(ConcreteEndpoint::new(
                bound,
                request,
                shape.response().unwrap_or(unit),
                Arc::clone(shape.invoker()),
            )));
        }

        tracing::info!(
            registrations = self.registrations.len(),
            synthesized = emitted.len(),
            skipped,
            "endpoint synthesis complete"
        );
        Ok(())
    }

    fn resolve_template(&self, shape: &HandlerShape) -> EndpointTemplate {
        let request = shape.request();
        self.hooks
            .provide_template(&request)
            .or_else(|| self.provider.as_ref().and_then(|provide| provide(&request)))
            .unwrap_or_else(|| match shape.response() {
                Some(_) => EndpointTemplate::mediator_endpoint(),
                None => EndpointTemplate::void_mediator_endpoint(),
            })
    }
}

fn invalid(
    reason: InvalidTemplateReason,
    template: &EndpointTemplate,
    allowed_bases: Vec<BaseTemplate>,
    source: Option<crate::error::BindError>,
) -> SynthesisError {
    SynthesisError::InvalidTemplate {
        reason,
        provided: template.to_string(),
        allowed_bases,
        source,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::mediator::handler_fn;
    use crate::template::TypeParam;
    use serde::Deserialize;
    use tracing_test::traced_test;

    #[derive(Deserialize)]
    struct Lookup {
        key: String,
    }
    impl crate::mediator::Request for Lookup {
        type Response = String;
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.add_handler::<Lookup, _>(handler_fn(|req: Lookup| async move { anyhow::Ok(req.key) }));
        registry
    }

    #[test]
    fn build_without_registry_fails_fast() {
        let err = EndpointSynthesizer::builder().build().err();
        assert!(matches!(err, Some(SynthesisError::MissingRegistry)));
    }

    #[test]
    fn hooks_take_precedence_over_provider() {
        struct Hooks;
        impl SynthesisHooks for Hooks {
            fn provide_template(&self, _: &TypeInfo) -> Option<EndpointTemplate> {
                Some(
                    EndpointTemplate::definition(
                        "FromHooks",
                        [TypeParam::new("TRequest"), TypeParam::new("TResponse")],
                    )
                    .extends_base(BaseTemplate::EndpointWithResponse),
                )
            }
        }

        let registry = registry();
        let synthesizer = EndpointSynthesizer::builder()
            .registry(&registry)
            .hooks(Arc::new(Hooks))
            .template_provider(|_| Some(EndpointTemplate::definition("Ignored", [])))
            .build()
            .unwrap();

        let endpoints = synthesizer.synthesize(&[]).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].template().name(), "FromHooks");
    }

    #[test]
    fn skip_hook_omits_endpoint_without_error() {
        struct SkipAll;
        impl SynthesisHooks for SkipAll {
            fn should_skip(&self, _: &TypeInfo) -> bool {
                true
            }
        }

        let registry = registry();
        let synthesizer = EndpointSynthesizer::builder()
            .registry(&registry)
            .hooks(Arc::new(SkipAll))
            .build()
            .unwrap();

        assert!(synthesizer.synthesize(&[]).unwrap().is_empty());
    }

    #[test]
    fn bind_failure_wraps_construction_error() {
        let registry = registry();
        let synthesizer = EndpointSynthesizer::builder()
            .registry(&registry)
            .template_provider(|_| {
                Some(
                    EndpointTemplate::definition(
                        "ThreeArgs",
                        [TypeParam::new("A"), TypeParam::new("B"), TypeParam::new("C")],
                    )
                    .extends_base(BaseTemplate::EndpointWithResponse),
                )
            })
            .build()
            .unwrap();

        let err = synthesizer.synthesize(&[]).unwrap_err();
        assert_eq!(err.reason(), Some(InvalidTemplateReason::BindingFailed));
        assert!(matches!(
            err,
            SynthesisError::InvalidTemplate {
                source: Some(crate::error::BindError::ArityMismatch { expected: 3, provided: 2, .. }),
                ..
            }
        ));
    }

    #[traced_test]
    #[test]
    fn logs_pass_summary() {
        let registry = registry();
        let synthesizer = EndpointSynthesizer::builder().registry(&registry).build().unwrap();
        synthesizer.synthesize(&[]).unwrap();

        assert!(logs_contain("synthesized endpoint"));
        assert!(logs_contain("endpoint synthesis complete"));
    }
}
