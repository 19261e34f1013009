//! HTTP endpoints synthesized from mediator request handler registrations.
//!
//! The crate turns every request handler registered in a [`HandlerRegistry`] into a
//! concrete endpoint, then names and constrains those endpoints by convention:
//! - [`EndpointSynthesizer`] resolves an endpoint template per request type, validates
//!   it against the recognized bases, skips requests already handled by existing
//!   endpoints and binds the template to the request/response pair;
//! - [`EndpointConvention`] derives the external endpoint name and HTTP methods from the
//!   request type;
//! - [`EndpointHost`] runs both at build time and mounts the result on an axum router.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod classification;
pub mod config;
pub mod convention;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod mediator;
pub mod model;
pub mod rest;
pub mod settings;
pub mod synthesizer;
pub mod template;
pub mod type_info;

// Re-export commonly used types
pub use classification::RequestClassification;
pub use config::EndpointsConfig;
pub use convention::{ConfiguredConvention, DefaultConvention, EndpointConvention, FnConvention};
pub use endpoint::{
    ActionDescriptor, ConcreteEndpoint, DeclaredSelector, EndpointFeature, EndpointType,
    ManualEndpoint,
};
pub use error::{
    BindError, ConfigError, DispatchError, InvalidTemplateReason, MountError, SynthesisError,
};
pub use host::{EndpointHost, EndpointHostBuilder};
pub use mediator::{
    HandlerDescriptor, HandlerRegistry, Mediator, Request, RequestHandler, Unit, handler_fn,
};
pub use model::{ActionConstraint, ActionModel, EndpointModel, HttpMethodConstraint, SelectorModel};
pub use settings::DiscoverySettings;
pub use synthesizer::{EndpointSynthesizer, SynthesisHooks};
pub use template::{BaseTemplate, EndpointTemplate, TypeParam};
pub use type_info::TypeInfo;

// Handler descriptors are collected with `inventory`; re-exported so `submit!` resolves
// without a direct dependency.
pub use inventory;
