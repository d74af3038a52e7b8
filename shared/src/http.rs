//! API Gateway proxy envelope for Lambda functions.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// API Gateway proxy request (simplified)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: Option<bool>,
}

impl ProxyRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw body bytes, decoding base64 when API Gateway flagged it.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body.as_deref().unwrap_or_default();
        if self.is_base64_encoded.unwrap_or(false) {
            BASE64
                .decode(body)
                .map_err(|e| Error::Signature(format!("body is not valid base64: {}", e)))
        } else {
            Ok(body.as_bytes().to_vec())
        }
    }
}

/// API Gateway proxy response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    pub fn new(status_code: u16, body: &str, content_type: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    /// Respond with `message` encoded as a JSON string.
    pub fn json_message(status_code: u16, message: &str) -> Result<Self> {
        let body = serde_json::to_string(message)?;
        Ok(Self::new(status_code, &body, "application/json"))
    }
}
