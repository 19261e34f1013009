//! Error types for synthesis, binding, dispatch, mounting and configuration.
//!
//! Synthesis and binding errors are build-time and abort application startup.
//! Dispatch errors surface per request and are mapped to problem responses by the
//! REST adapter.

use std::fmt;
use std::path::PathBuf;

use http::Method;

use crate::template::BaseTemplate;
use crate::type_info::TypeInfo;

/// Why a resolved endpoint template was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTemplateReason {
    NotDerivedFromBase,
    NotTypeDefinition,
    BindingFailed,
}

impl fmt::Display for InvalidTemplateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotDerivedFromBase => "must derive from a recognized base template",
            Self::NotTypeDefinition => "must be an open generic definition",
            Self::BindingFailed => "type parameters could not be bound",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error(
        "invalid endpoint template `{provided}`: {reason} (allowed bases: {})",
        join_bases(.allowed_bases)
    )]
    InvalidTemplate {
        reason: InvalidTemplateReason,
        provided: String,
        allowed_bases: Vec<BaseTemplate>,
        #[source]
        source: Option<BindError>,
    },

    #[error("a handler registry is required to synthesize endpoints")]
    MissingRegistry,
}

impl SynthesisError {
    #[must_use]
    pub fn reason(&self) -> Option<InvalidTemplateReason> {
        match self {
            Self::InvalidTemplate { reason, .. } => Some(*reason),
            Self::MissingRegistry => None,
        }
    }
}

fn join_bases(bases: &[BaseTemplate]) -> String {
    bases
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generic construction failure for an endpoint template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("template `{template}` is already bound")]
    AlreadyBound { template: String },

    #[error("template `{template}` expects {expected} type argument(s), got {provided}")]
    ArityMismatch {
        template: String,
        expected: usize,
        provided: usize,
    },

    #[error("type `{argument}` violates constraint on `{parameter}`: {constraint}")]
    ConstraintViolated {
        parameter: &'static str,
        constraint: String,
        argument: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for request `{request}`")]
    HandlerNotFound { request: TypeInfo },

    #[error("handler registered for `{request}` has an unexpected type")]
    TypeMismatch { request: TypeInfo },

    #[error("invalid payload for `{request}`: {source}")]
    InvalidPayload {
        request: TypeInfo,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid query string for `{request}`: {source}")]
    InvalidQuery {
        request: TypeInfo,
        #[source]
        source: serde_urlencoded::de::Error,
    },

    #[error("failed to serialize response of `{request}`: {source}")]
    Serialization {
        request: TypeInfo,
        #[source]
        source: serde_json::Error,
    },

    #[error("handler for `{request}` failed: {source}")]
    Handler {
        request: TypeInfo,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("route `{path}` is declared by more than one selector")]
    DuplicateRoute { path: String },

    #[error("HTTP method `{method}` on `{path}` cannot be routed")]
    UnsupportedMethod { method: Method, path: String },

    #[error("method constraints on `{path}` have no method in common")]
    DisjointMethods { path: String },

    #[error("`{path}` is not a valid route path: {reason}")]
    InvalidRoute { path: String, reason: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid endpoints configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn invalid_template_message_lists_allowed_bases() {
        let err = SynthesisError::InvalidTemplate {
            reason: InvalidTemplateReason::NotDerivedFromBase,
            provided: "Plain<TRequest, TResponse>".to_owned(),
            allowed_bases: BaseTemplate::ALL.to_vec(),
            source: None,
        };

        let msg = err.to_string();
        assert!(msg.contains("Plain<TRequest, TResponse>"));
        assert!(msg.contains("must derive from a recognized base template"));
        assert!(msg.contains("EndpointBase<TRequest>"));
        assert!(msg.contains("EndpointBase<TRequest, TResponse>"));
        assert_eq!(err.reason(), Some(InvalidTemplateReason::NotDerivedFromBase));
    }

    #[test]
    fn binding_failure_keeps_source() {
        use std::error::Error as _;

        let err = SynthesisError::InvalidTemplate {
            reason: InvalidTemplateReason::BindingFailed,
            provided: "T<TRequest>".to_owned(),
            allowed_bases: Vec::new(),
            source: Some(BindError::ArityMismatch {
                template: "T<TRequest>".to_owned(),
                expected: 3,
                provided: 2,
            }),
        };

        let source = err.source().map(ToString::to_string).unwrap_or_default();
        assert!(source.contains("expects 3 type argument(s), got 2"));
    }
}
