//! RFC 9457 problem documents returned by mounted endpoints.

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DispatchError;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    pub detail: String,
    /// Request path the problem occurred on.
    pub instance: String,
    /// Machine-readable error code, e.g. `HANDLER_NOT_FOUND`.
    pub code: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
        }
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn unsupported_media_type(content_type: Option<&str>, accepted: &[String]) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported Media Type",
            format!(
                "content type `{}` is not accepted; expected one of [{}]",
                content_type.unwrap_or("<none>"),
                accepted.join(", ")
            ),
        )
        .with_code("UNSUPPORTED_MEDIA_TYPE")
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid Payload", detail).with_code("INVALID_PAYLOAD")
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload Too Large",
            format!("request body exceeds the limit of {limit} bytes"),
        )
        .with_code("PAYLOAD_TOO_LARGE")
    }
}

impl From<&DispatchError> for Problem {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::InvalidPayload { .. } | DispatchError::InvalidQuery { .. } => {
                Self::bad_request(err.to_string())
            }
            DispatchError::HandlerNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Handler Not Found", err.to_string())
                    .with_code("HANDLER_NOT_FOUND")
            }
            DispatchError::Handler { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Handler Failed",
                err.to_string(),
            )
            .with_code("HANDLER_FAILED"),
            DispatchError::TypeMismatch { .. } | DispatchError::Serialization { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                err.to_string(),
            )
            .with_code("INTERNAL"),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::type_info::TypeInfo;

    struct Missing;

    #[test]
    fn status_serializes_as_number() {
        let json = serde_json::to_value(Problem::bad_request("nope")).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["code"], "INVALID_PAYLOAD");
    }

    #[test]
    fn dispatch_errors_map_to_statuses() {
        let not_found = DispatchError::HandlerNotFound {
            request: TypeInfo::of::<Missing>(),
        };
        assert_eq!(Problem::from(&not_found).status, StatusCode::NOT_FOUND);

        let failed = DispatchError::Handler {
            request: TypeInfo::of::<Missing>(),
            source: anyhow::anyhow!("db down"),
        };
        let problem = Problem::from(&failed);
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.detail.contains("db down"));
    }

    #[test]
    fn response_uses_problem_content_type() {
        let resp = Problem::bad_request("x").with_instance("/api/X").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
    }
}
