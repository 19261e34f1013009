//! Endpoint host configuration.
//!
//! Layered with figment: serialized defaults, then an optional YAML file, then
//! `MEDIATOR_ENDPOINTS__*` environment variables (`__` separates nested keys, e.g.
//! `MEDIATOR_ENDPOINTS__DISCOVERY__BY_ATTRIBUTE=false`).

use std::collections::BTreeMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::classification::RequestClassification;
use crate::error::ConfigError;
use crate::rest::{DEFAULT_BODY_LIMIT_BYTES, normalize_prefix};
use crate::settings::DiscoverySettings;

pub const ENV_PREFIX: &str = "MEDIATOR_ENDPOINTS__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Prefix of every conventional route, e.g. `/api`. Empty mounts at the root.
    pub route_prefix: String,
    pub discovery: DiscoverySettings,
    /// Suffixes removed from request type names to form endpoint names; first match wins.
    pub strip_suffixes: Vec<String>,
    /// Request type name (short or fully qualified) to classification.
    pub classifications: BTreeMap<String, RequestClassification>,
    /// Larger request bodies are answered with `413`.
    pub body_limit_bytes: usize,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            route_prefix: "/api".to_owned(),
            discovery: DiscoverySettings::default(),
            strip_suffixes: Vec::new(),
            classifications: BTreeMap::new(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl EndpointsConfig {
    /// Load the layered configuration.
    ///
    /// # Errors
    /// [`ConfigError::MissingFile`] when `path` is given but is not a file,
    /// [`ConfigError::Invalid`] when a layer fails to parse or extract.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        tracing::debug!(
            route_prefix = %config.route_prefix,
            classifications = config.classifications.len(),
            "loaded endpoints configuration"
        );
        Ok(config)
    }

    /// Route prefix with a leading slash and without a trailing one.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.route_prefix)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_discovery() {
        let config = EndpointsConfig::default();
        assert_eq!(config.route_prefix, "/api");
        assert!(config.discovery.is_enabled());
        assert!(config.strip_suffixes.is_empty());
    }

    #[test]
    fn normalized_prefix_drops_trailing_slash() {
        let config = EndpointsConfig {
            route_prefix: "/v1/".to_owned(),
            ..EndpointsConfig::default()
        };
        assert_eq!(config.normalized_prefix(), "/v1");
    }

    #[test]
    fn normalized_prefix_adds_leading_slash() {
        let config = EndpointsConfig {
            route_prefix: "api".to_owned(),
            ..EndpointsConfig::default()
        };
        assert_eq!(config.normalized_prefix(), "/api");
    }
}
