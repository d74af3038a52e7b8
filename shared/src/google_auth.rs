//! Google service account authentication.
//!
//! Signs an RS256 JWT with the service account's private key and exchanges
//! it for a short-lived OAuth access token.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Scopes requested for spreadsheet access.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Service account key as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parse a service account key from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid GSPREAD_SERVICE_ACCOUNT: {}", e)))
    }
}

/// JWT claims for the JWT bearer grant.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceAccountClaims {
    /// Service account email
    pub iss: String,
    /// Space separated scopes
    pub scope: String,
    /// Token endpoint
    pub aud: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

impl ServiceAccountClaims {
    pub fn new(key: &ServiceAccountKey, issued_at: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Build the signed assertion for `key`.
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| Error::Auth(format!("Invalid service account private key: {}", e)))?;

    encode(&header, &ServiceAccountClaims::new(key, issued_at), &encoding_key)
        .map_err(|e| Error::Auth(format!("Failed to sign assertion: {}", e)))
}

/// Exchange a signed assertion for an access token.
pub async fn fetch_access_token(
    http_client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String> {
    let assertion = sign_assertion(key, Utc::now().timestamp())?;

    let response = http_client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!("Token exchange failed: {} - {}", status, body)));
    }

    let token: TokenResponse = response.json().await?;
    debug!("Obtained access token for {}", key.client_email);
    Ok(token.access_token)
}
