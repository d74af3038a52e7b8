//! Configuration management for the webhook Lambda.

use std::env;

use crate::google_auth::ServiceAccountKey;
use crate::{Error, Result};

/// LINE channel credentials, loaded once at cold start.
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Messaging API channel access token
    pub channel_access_token: String,
    /// Channel secret used to sign webhooks
    pub channel_secret: String,
}

impl LineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            channel_access_token: required("CHANNEL_ACCESS_TOKEN")?,
            channel_secret: required("CHANNEL_SECRET")?,
        })
    }
}

/// Spreadsheet access, loaded for every processed message.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Parsed `GSPREAD_SERVICE_ACCOUNT` key
    pub service_account: ServiceAccountKey,
    /// Spreadsheet URL
    pub spreadsheet_url: String,
}

impl SheetsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let raw = required("GSPREAD_SERVICE_ACCOUNT")?;
        Ok(Self {
            service_account: ServiceAccountKey::from_json(&raw)?,
            spreadsheet_url: required("GSPREAD_URL")?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} is not defined as environmental variables", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_names_missing_variable() {
        let err = required("MEAL_LOG_TEST_SURELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("MEAL_LOG_TEST_SURELY_UNSET"));
    }
}
