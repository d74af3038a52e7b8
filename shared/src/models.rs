//! LINE Messaging API data models.

use serde::{Deserialize, Serialize};

/// Webhook request body sent by the LINE Platform.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// A single webhook event. Only message events are handled.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    /// Channels in standby mode receive message events without a reply token.
    #[serde(rename_all = "camelCase")]
    Message {
        #[serde(default)]
        reply_token: Option<String>,
        message: EventMessage,
        #[serde(default)]
        source: Option<EventSource>,
    },
    #[serde(other)]
    Other,
}

/// Message content of a message event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventMessage {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Who sent the event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A text message event, borrowed from the payload.
#[derive(Debug, PartialEq, Eq)]
pub struct TextMessage<'a> {
    pub reply_token: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub text: &'a str,
}

impl WebhookEvent {
    pub fn as_text_message(&self) -> Option<TextMessage<'_>> {
        match self {
            WebhookEvent::Message {
                reply_token,
                message: EventMessage::Text { text },
                source,
            } => Some(TextMessage {
                reply_token: reply_token.as_deref(),
                user_id: source.as_ref().and_then(|s| s.user_id.as_deref()),
                text: text.as_str(),
            }),
            _ => None,
        }
    }
}

/// Reply message request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<SendMessage<'a>>,
}

/// Outgoing message object.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SendMessage<'a> {
    Text { text: &'a str },
}

/// Error body returned by the Messaging API.
#[derive(Debug, Default, Deserialize)]
pub struct LineErrorResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<LineErrorDetail>,
}

/// One entry of the `details` array of an API error.
#[derive(Debug, Clone, Deserialize)]
pub struct LineErrorDetail {
    #[serde(default)]
    pub property: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_message_event() {
        let json = r#"{
            "destination": "Uxxxxxxxx",
            "events": [{
                "type": "message",
                "replyToken": "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA",
                "source": {"type": "user", "userId": "U4af4980629"},
                "timestamp": 1462629479859,
                "mode": "active",
                "message": {"id": "325708", "type": "text", "text": "12"}
            }]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.events.len(), 1);
        assert_eq!(
            payload.events[0].as_text_message(),
            Some(TextMessage {
                reply_token: Some("nHuyWiB7yP5Zw52FIkcQobQuGDXCTA"),
                user_id: Some("U4af4980629"),
                text: "12",
            })
        );
    }

    #[test]
    fn test_standby_event_has_no_reply_token() {
        let json = r#"{
            "destination": "Uxxxxxxxx",
            "events": [
                {
                    "type": "message",
                    "mode": "standby",
                    "source": {"type": "group", "groupId": "C1", "userId": "U1"},
                    "timestamp": 1462629479859,
                    "message": {"id": "1", "type": "text", "text": "3"}
                },
                {
                    "type": "message",
                    "replyToken": "abc",
                    "mode": "active",
                    "message": {"id": "2", "type": "text", "text": "4"}
                }
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let messages: Vec<_> = payload
            .events
            .iter()
            .filter_map(WebhookEvent::as_text_message)
            .collect();
        assert_eq!(
            messages,
            vec![
                TextMessage {
                    reply_token: None,
                    user_id: Some("U1"),
                    text: "3",
                },
                TextMessage {
                    reply_token: Some("abc"),
                    user_id: None,
                    text: "4",
                },
            ]
        );
    }

    #[test]
    fn test_non_text_events_are_skipped() {
        let json = r#"{
            "events": [
                {"type": "follow", "replyToken": "abc", "source": {"type": "user"}},
                {"type": "message", "replyToken": "def",
                 "message": {"id": "1", "type": "sticker", "packageId": "1", "stickerId": "1"}}
            ]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert!(payload.events.iter().all(|e| e.as_text_message().is_none()));
    }

    #[test]
    fn test_empty_verification_payload() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"destination":"U1","events":[]}"#).unwrap();
        assert!(payload.events.is_empty());
    }

    #[test]
    fn test_reply_request_shape() {
        let request = ReplyRequest {
            reply_token: "token",
            messages: vec![SendMessage::Text { text: "OK" }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "replyToken": "token",
                "messages": [{"type": "text", "text": "OK"}]
            })
        );
    }

    #[test]
    fn test_parse_error_response() {
        let json = r#"{"message":"The request body has 1 error(s)",
            "details":[{"message":"May not be empty","property":"messages[0].text"}]}"#;
        let err: LineErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.details.len(), 1);
        assert_eq!(err.details[0].property, "messages[0].text");
    }
}
