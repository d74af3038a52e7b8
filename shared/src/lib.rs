//! Shared library for the meal log LINE webhook.
//!
//! This crate provides the LINE and Google Sheets clients, configuration and
//! the slot bookkeeping used by the webhook Lambda.

pub mod config;
pub mod error;
pub mod google_auth;
pub mod http;
pub mod line;
pub mod meal;
pub mod models;
pub mod sheets;

pub use config::{LineConfig, SheetsConfig};
pub use error::{Error, Result};
pub use http::{ProxyRequest, ProxyResponse};
pub use line::{verify_signature, LineClient, SIGNATURE_HEADER};
pub use meal::{parse_integer, record_meal, worksheet_title, MealSheet, Reply, SheetOpener, Slot};
pub use models::{TextMessage, WebhookEvent, WebhookPayload};
pub use sheets::{GoogleSheets, SheetsClient, Worksheet};
