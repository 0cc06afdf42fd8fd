use chrono::{DateTime, Utc};
use finassist_chat::{Author, Message, MessageId, SendReply};
use serde::{Deserialize, Serialize};

/// One history row as served by `GET /chat/{user}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        Message::new(
            MessageId::confirmed(entry.id),
            entry.author,
            entry.text,
            entry.created_at,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRequest<'a> {
    pub text: &'a str,
}

/// Body of a successful `POST /chat/{user}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    #[serde(default)]
    pub reply_id: Option<String>,
    pub reply_text: String,
    #[serde(default)]
    pub replied_at: Option<DateTime<Utc>>,
}

impl From<SendResponse> for SendReply {
    fn from(response: SendResponse) -> Self {
        SendReply {
            reply_id: response.reply_id.filter(|id| !id.trim().is_empty()),
            reply_text: response.reply_text,
            replied_at: response.replied_at,
        }
    }
}
