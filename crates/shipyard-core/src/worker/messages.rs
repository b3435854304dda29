//! Messages exchanged between the cache worker and its clients.

use serde::{Deserialize, Serialize};

/// Client → worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Run the sync routine now and answer on the reply port
    SyncNow,
    /// Activate a waiting worker without waiting for old clients to close
    SkipWaiting,
}

/// Reply to [`WorkerMessage::SyncNow`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncReply {
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Worker → every connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// The sync routine ran; `count` entries were queued at the time
    SyncComplete { count: usize },
}

/// Notification content delivered by a push message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Used as the notification tag so repeats replace each other
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default)]
    pub silent: bool,
}

fn default_title() -> String {
    "Shipyard".to_string()
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: default_title(),
            body: String::new(),
            id: None,
            url: None,
            require_interaction: false,
            silent: false,
        }
    }
}

impl PushPayload {
    /// Parse push data; missing or malformed data yields the defaults.
    pub fn parse(data: Option<&[u8]>) -> Self {
        let Some(data) = data else {
            return Self::default();
        };
        serde_json::from_slice(data).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed push payload: {}", e);
            Self::default()
        })
    }

    /// URL opened when the notification is clicked
    pub fn click_url(&self) -> &str {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sync_now_wire_format() {
        let message: WorkerMessage = serde_json::from_value(json!({"type": "SYNC_NOW"})).unwrap();
        assert_eq!(message, WorkerMessage::SyncNow);
    }

    #[test]
    fn sync_reply_wire_format() {
        assert_eq!(serde_json::to_value(SyncReply::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(SyncReply::failed("disk full")).unwrap(),
            json!({"success": false, "error": "disk full"})
        );
    }

    #[test]
    fn sync_complete_wire_format() {
        let value = serde_json::to_value(ClientMessage::SyncComplete { count: 3 }).unwrap();
        assert_eq!(value, json!({"type": "SYNC_COMPLETE", "count": 3}));
    }

    #[test]
    fn push_payload_defaults() {
        let payload = PushPayload::parse(None);
        assert_eq!(payload.title, "Shipyard");
        assert_eq!(payload.click_url(), "/");

        let payload = PushPayload::parse(Some(b"not json"));
        assert_eq!(payload, PushPayload::default());
    }

    #[test]
    fn push_payload_fields() {
        let payload = PushPayload::parse(Some(
            br#"{"title":"Deploy finished","body":"Launchpad is live","id":"deploy-1","url":"/apps/1","requireInteraction":true}"#,
        ));
        assert_eq!(payload.title, "Deploy finished");
        assert_eq!(payload.id.as_deref(), Some("deploy-1"));
        assert!(payload.require_interaction);
        assert!(!payload.silent);
        assert_eq!(payload.click_url(), "/apps/1");
    }
}
