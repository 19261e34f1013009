//! Build-time pipeline: registry -> synthesis -> models -> conventions -> router.

use std::sync::Arc;

use axum::Router;

use crate::config::EndpointsConfig;
use crate::convention::{ConfiguredConvention, DefaultConvention, EndpointConvention};
use crate::endpoint::{EndpointFeature, ManualEndpoint};
use crate::error::{MountError, SynthesisError};
use crate::mediator::{HandlerRegistry, Mediator};
use crate::model::EndpointModel;
use crate::rest;
use crate::settings::DiscoverySettings;
use crate::synthesizer::{EndpointSynthesizer, SynthesisHooks, TemplateProvider};
use crate::template::EndpointTemplate;
use crate::type_info::TypeInfo;

/// Endpoints of an application after synthesis and conventions.
pub struct EndpointHost {
    feature: EndpointFeature,
    models: Vec<EndpointModel>,
    mediator: Mediator,
    route_prefix: String,
    body_limit_bytes: usize,
}

impl EndpointHost {
    pub fn builder() -> EndpointHostBuilder {
        EndpointHostBuilder::default()
    }

    /// Builder preconfigured from `config`: discovery settings, route prefix, body limit
    /// and a [`ConfiguredConvention`].
    pub fn from_config(config: &EndpointsConfig) -> EndpointHostBuilder {
        Self::builder()
            .settings(config.discovery)
            .route_prefix(config.normalized_prefix())
            .body_limit_bytes(config.body_limit_bytes)
            .convention(ConfiguredConvention::from_config(config))
    }

    /// Manual and synthesized endpoints, manual ones first.
    #[must_use]
    pub fn feature(&self) -> &EndpointFeature {
        &self.feature
    }

    #[must_use]
    pub fn models(&self) -> &[EndpointModel] {
        &self.models
    }

    /// Model by external endpoint name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&EndpointModel> {
        self.models.iter().find(|model| model.name() == name)
    }

    #[must_use]
    pub fn mediator(&self) -> &Mediator {
        &self.mediator
    }

    #[must_use]
    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    #[must_use]
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes
    }

    /// Paths [`Self::router`] mounts. Does not check them; build the router for that.
    #[must_use]
    pub fn routes(&self) -> Vec<rest::RouteEntry> {
        rest::routes(&self.models, &self.route_prefix)
    }

    /// # Errors
    /// See [`rest::mount_with_body_limit`].
    pub fn router(&self) -> Result<Router, MountError> {
        rest::mount_with_body_limit(
            &self.models,
            &self.mediator,
            &self.route_prefix,
            self.body_limit_bytes,
        )
    }
}

#[must_use]
pub struct EndpointHostBuilder {
    registry: Option<HandlerRegistry>,
    manual: Vec<ManualEndpoint>,
    hooks: Option<Arc<dyn SynthesisHooks>>,
    provider: Option<TemplateProvider>,
    settings: DiscoverySettings,
    conventions: Vec<Arc<dyn EndpointConvention>>,
    route_prefix: String,
    body_limit_bytes: usize,
}

impl Default for EndpointHostBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            manual: Vec::new(),
            hooks: None,
            provider: None,
            settings: DiscoverySettings::default(),
            conventions: Vec::new(),
            route_prefix: EndpointsConfig::default().route_prefix,
            body_limit_bytes: rest::DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl EndpointHostBuilder {
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn manual_endpoint(mut self, endpoint: ManualEndpoint) -> Self {
        self.manual.push(endpoint);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SynthesisHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn template_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&TypeInfo) -> Option<EndpointTemplate> + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Conventions run in registration order. Without any, the default convention runs.
    pub fn convention(mut self, convention: impl EndpointConvention + 'static) -> Self {
        self.conventions.push(Arc::new(convention));
        self
    }

    /// Normalized to a leading `/` without a trailing one.
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = rest::normalize_prefix(&prefix.into());
        self
    }

    pub fn body_limit_bytes(mut self, limit: usize) -> Self {
        self.body_limit_bytes = limit;
        self
    }

    /// # Errors
    /// [`SynthesisError::MissingRegistry`] without a registry, or the first
    /// [`SynthesisError::InvalidTemplate`] raised during synthesis.
    pub fn build(self) -> Result<EndpointHost, SynthesisError> {
        let registry = self.registry.ok_or(SynthesisError::MissingRegistry)?;

        let mut feature = EndpointFeature::new();
        for endpoint in self.manual {
            feature.push(endpoint);
        }

        let mut synthesizer = EndpointSynthesizer::builder()
            .registry(&registry)
            .shared_template_provider(self.provider)
            .settings(self.settings);
        if let Some(hooks) = self.hooks {
            synthesizer = synthesizer.hooks(hooks);
        }
        synthesizer.build()?.populate(&mut feature)?;

        let conventions = if self.conventions.is_empty() {
            vec![Arc::new(DefaultConvention) as Arc<dyn EndpointConvention>]
        } else {
            self.conventions
        };

        let models = feature
            .endpoints()
            .iter()
            .cloned()
            .map(|endpoint| {
                let mut model = EndpointModel::new(endpoint);
                for convention in &conventions {
                    convention.apply(&mut model);
                }
                model
            })
            .collect();

        tracing::info!(
            endpoints = feature.len(),
            synthesized = feature.synthesized().count(),
            "endpoint host built"
        );

        Ok(EndpointHost {
            mediator: Mediator::from_registry(&registry),
            feature,
            models,
            route_prefix: self.route_prefix,
            body_limit_bytes: self.body_limit_bytes,
        })
    }
}
