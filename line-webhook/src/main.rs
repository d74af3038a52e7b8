//! LINE Webhook Lambda - Logs meal times sent over LINE into Google Sheets.
//!
//! This Lambda receives LINE Messaging API webhooks through API Gateway,
//! verifies the `x-line-signature` header, records each text message in the
//! current month's worksheet and replies with the outcome.

use chrono::{Datelike, Local, NaiveDate};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::{
    record_meal, verify_signature, worksheet_title, GoogleSheets, LineClient, LineConfig,
    ProxyRequest, ProxyResponse, Reply, SheetOpener, TextMessage, WebhookPayload,
    SIGNATURE_HEADER,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const REJECTED_BODY: &str = "Only webhooks from the LINE Platform will be accepted.";
const ACCEPTED_BODY: &str = "Hello from Lambda!";

/// Application state
struct AppState {
    line_client: LineClient,
    sheets: Arc<dyn SheetOpener>,
    channel_secret: String,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl AppState {
    fn new() -> Result<Self, Error> {
        let config = LineConfig::from_env().map_err(|e| {
            error!("{}", e);
            e
        })?;

        let http_client = reqwest::Client::new();
        Ok(Self {
            line_client: LineClient::new(http_client.clone(), config.channel_access_token),
            sheets: Arc::new(GoogleSheets::new(http_client)),
            channel_secret: config.channel_secret,
            today: local_today,
        })
    }

    /// Record one text message in this month's worksheet.
    async fn process_message(&self, message: &TextMessage<'_>) -> shared::Result<Reply> {
        let today = (self.today)();
        let title = worksheet_title(today.month());
        let worksheet = self.sheets.open(&title).await?;

        info!(
            "Recording '{}' from {} in '{}'",
            message.text,
            message.user_id.unwrap_or("unknown user"),
            title
        );
        record_meal(worksheet.as_ref(), today.day(), message.text).await
    }
}

fn log_reply_error(err: &shared::Error) {
    match err {
        shared::Error::Line {
            message, details, ..
        } => {
            error!("Got exception from LINE Messaging API: {}", message);
            for detail in details {
                error!("  {}: {}", detail.property, detail.message);
            }
        }
        other => error!("Failed to send reply: {}", other),
    }
}

async fn handle_request(state: &AppState, request: ProxyRequest) -> Result<ProxyResponse, Error> {
    let verified = request.body_bytes().and_then(|body| {
        info!("{}", String::from_utf8_lossy(&body));
        let signature = request.header(SIGNATURE_HEADER).ok_or_else(|| {
            shared::Error::Signature(format!("missing {} header", SIGNATURE_HEADER))
        })?;
        verify_signature(&state.channel_secret, &body, signature)?;
        Ok(body)
    });

    let body = match verified {
        Ok(body) => body,
        Err(e) => {
            warn!("Rejected webhook: {}", e);
            return Ok(ProxyResponse::json_message(e.status_code(), REJECTED_BODY)?);
        }
    };

    let payload: WebhookPayload = serde_json::from_slice(&body)?;

    for event in &payload.events {
        let Some(message) = event.as_text_message() else {
            debug!("Skipping non-text event");
            continue;
        };

        let reply = state.process_message(&message).await?;

        let Some(reply_token) = message.reply_token else {
            warn!("No reply token, not sending '{}'", reply.text());
            continue;
        };
        if let Err(e) = state.line_client.reply_message(reply_token, reply.text()).await {
            log_reply_error(&e);
        }
    }

    Ok(ProxyResponse::json_message(200, ACCEPTED_BODY)?)
}

async fn handler(state: Arc<AppState>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, _context) = event.into_parts();
    let request: ProxyRequest = serde_json::from_value(payload)?;
    let response = handle_request(&state, request).await?;
    Ok(serde_json::to_value(response)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new()?);

    lambda_runtime::run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
