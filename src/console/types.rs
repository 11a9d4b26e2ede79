//! HMC Web Services API payloads.
//!
//! Only the fields the exporter reads are modelled; everything else in a
//! listing entry or property response is kept as a raw [`Properties`] map.

use crate::cache::Properties;
use serde::{Deserialize, Serialize};

/// One entry of a list operation.
#[derive(Debug, Clone)]
pub struct RawResource {
    pub uri: String,
    pub properties: Properties,
}

impl RawResource {
    pub fn new(uri: impl Into<String>, properties: Properties) -> Self {
        Self {
            uri: uri.into(),
            properties,
        }
    }

    /// Builds an entry from a listing object, which carries its URI in
    /// `object-uri` (objects) or `element-uri` (element objects).
    pub fn from_listing(properties: Properties) -> Option<Self> {
        let uri = properties
            .get("object-uri")
            .or_else(|| properties.get("element-uri"))
            .and_then(|v| v.as_str())?
            .to_string();
        Some(Self { uri, properties })
    }
}

/// Body of `POST /api/sessions`
#[derive(Debug, Serialize)]
pub struct LogonRequest<'a> {
    pub userid: &'a str,
    pub password: &'a str,
}

/// Response of `POST /api/sessions`
#[derive(Debug, Deserialize)]
pub struct LogonResponse {
    #[serde(rename = "api-session")]
    pub api_session: String,
}

/// Standard HMC error response body.
#[derive(Debug, Deserialize, Default)]
pub struct ApiErrorBody {
    #[serde(rename = "http-status", default)]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub reason: u32,
    #[serde(default)]
    pub message: String,
}
