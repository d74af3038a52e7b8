//! LINE Messaging API client and webhook signature verification.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;

use crate::models::{LineErrorResponse, ReplyRequest, SendMessage};
use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Verify a webhook body against its `x-line-signature` value.
///
/// The signature is the base64 encoded HMAC-SHA256 digest of the raw body,
/// keyed with the channel secret.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> Result<()> {
    let expected = BASE64
        .decode(signature.trim())
        .map_err(|_| Error::Signature("signature is not valid base64".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| Error::Signature("invalid HMAC key".to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| Error::Signature("signature mismatch".to_string()))
}

/// Client for the Messaging API.
#[derive(Clone)]
pub struct LineClient {
    http_client: reqwest::Client,
    channel_access_token: String,
    api_base: String,
}

impl LineClient {
    /// Create a new client.
    pub fn new(http_client: reqwest::Client, channel_access_token: String) -> Self {
        Self::with_api_base(http_client, channel_access_token, DEFAULT_API_BASE)
    }

    /// Create a client talking to another API host.
    pub fn with_api_base(
        http_client: reqwest::Client,
        channel_access_token: String,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            channel_access_token,
            api_base: api_base.into(),
        }
    }

    /// Send a single text message using a reply token.
    pub async fn reply_message(&self, reply_token: &str, text: &str) -> Result<()> {
        let request = ReplyRequest {
            reply_token,
            messages: vec![SendMessage::Text { text }],
        };

        let response = self
            .http_client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.channel_access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: LineErrorResponse = serde_json::from_str(&body).unwrap_or_else(|_| {
                LineErrorResponse {
                    message: body,
                    details: vec![],
                }
            });
            return Err(Error::Line {
                status: status.as_u16(),
                message: parsed.message,
                details: parsed.details,
            });
        }

        info!("Reply sent: {}", text);
        Ok(())
    }
}
