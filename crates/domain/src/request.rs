//! Request records handed over by the transport layer.

use serde::{Deserialize, Serialize};

use crate::environment::OverrideMap;
use crate::value::Value;

/// A request about to be dispatched. Every present field may carry
/// `${...}` expressions and function calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Request URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Raw headers block (`Name: value` lines).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,

    /// Request body. Binary and structured bodies pass through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Per-request configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RequestConfig>,
}

/// Per-request configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Variables overriding or extending the current environment for this
    /// request only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<OverrideMap>,
}

/// The request fields processed before dispatch, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestField {
    /// `url`
    Url,
    /// `method`
    Method,
    /// `headers`
    Headers,
    /// `payload`
    Payload,
}

impl RequestField {
    /// All processed fields in processing order.
    pub const ALL: [Self; 4] = [Self::Url, Self::Method, Self::Headers, Self::Payload];

    /// Field name as it appears in the serialized record.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Method => "method",
            Self::Headers => "headers",
            Self::Payload => "payload",
        }
    }
}

impl RequestRecord {
    /// Creates a record with just a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Override variables from the request configuration, if any.
    #[must_use]
    pub fn config_variables(&self) -> Option<&OverrideMap> {
        self.config.as_ref().and_then(|c| c.variables.as_ref())
    }
}
