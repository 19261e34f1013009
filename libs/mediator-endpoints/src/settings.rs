//! Handled-request discovery settings.

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointType;
use crate::type_info::TypeInfo;

/// Controls whether a registration is skipped because an existing endpoint already
/// handles its request type.
///
/// Discovery runs only while both flags are enabled; disabling either one turns the
/// check off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    /// Match actions tagged as handling the request.
    pub by_attribute: bool,
    /// Match actions taking the request type as a parameter.
    pub by_action_params: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            by_attribute: true,
            by_action_params: true,
        }
    }
}

impl DiscoverySettings {
    #[must_use]
    pub fn disable_handled_request_discovery(self) -> Self {
        Self {
            by_attribute: false,
            by_action_params: false,
        }
    }

    #[must_use]
    pub fn disable_handled_request_discovery_by_attribute(self) -> Self {
        Self {
            by_attribute: false,
            ..self
        }
    }

    #[must_use]
    pub fn disable_handled_request_discovery_by_action_params(self) -> Self {
        Self {
            by_action_params: false,
            ..self
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self.by_attribute && self.by_action_params
    }

    /// Whether any action of `endpoints` already handles `request`.
    #[must_use]
    pub fn is_handled<'a>(
        self,
        endpoints: impl IntoIterator<Item = &'a EndpointType>,
        request: &TypeInfo,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }

        endpoints
            .into_iter()
            .flat_map(EndpointType::actions)
            .any(|action| {
                (self.by_attribute && action.handled_request().as_ref() == Some(request))
                    || (self.by_action_params && action.parameters().contains(request))
            })
    }
}
