use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the signed-in user that owns a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Origin of a locally minted message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalIdKind {
    /// Optimistic user message awaiting the round-trip.
    UserDraft,
    /// Assistant reply whose response carried no server id.
    Reply,
    /// Synthesized apology after a failed send.
    Fallback,
}

impl LocalIdKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::UserDraft => "temp-",
            Self::Reply => "ia-",
            Self::Fallback => "erro-",
        }
    }
}

/// Message identity within one timeline.
///
/// Local ids stay `Pending` for the life of the session. The user's own optimistic
/// message is never rewritten to a server id, only assistant replies can arrive
/// already `Confirmed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Pending(String),
    Confirmed(String),
}

impl MessageId {
    /// Mints a fresh local id carrying the prefix of `kind`.
    pub fn local(kind: LocalIdKind) -> Self {
        Self::Pending(format!("{}{}", kind.prefix(), Uuid::now_v7().simple()))
    }

    pub fn confirmed(raw: impl Into<String>) -> Self {
        Self::Confirmed(raw.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending(raw) | Self::Confirmed(raw) => raw,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns the local origin of a pending id, if its prefix is recognized.
    pub fn local_kind(&self) -> Option<LocalIdKind> {
        let Self::Pending(raw) = self else {
            return None;
        };

        [
            LocalIdKind::UserDraft,
            LocalIdKind::Reply,
            LocalIdKind::Fallback,
        ]
        .into_iter()
        .find(|kind| raw.starts_with(kind.prefix()))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Chat speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// One entry of the chat timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: MessageId,
        author: Author,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author,
            text: text.into(),
            created_at,
        }
    }

    /// Creates the optimistic user message appended before the remote call.
    pub fn user_draft(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self::new(
            MessageId::local(LocalIdKind::UserDraft),
            Author::User,
            text,
            created_at,
        )
    }

    /// Creates the assistant turn from a successful reply.
    pub fn assistant_reply(reply: SendReply, now: DateTime<Utc>) -> Self {
        let id = reply
            .reply_id
            .map(MessageId::confirmed)
            .unwrap_or_else(|| MessageId::local(LocalIdKind::Reply));

        Self::new(
            id,
            Author::Assistant,
            reply.reply_text,
            reply.replied_at.unwrap_or(now),
        )
    }

    /// Creates the assistant turn standing in for a failed send.
    pub fn assistant_fallback(created_at: DateTime<Utc>) -> Self {
        Self::new(
            MessageId::local(LocalIdKind::Fallback),
            Author::Assistant,
            SEND_FALLBACK_TEXT,
            created_at,
        )
    }
}

/// Text shown in place of an assistant answer when the send round-trip fails.
pub const SEND_FALLBACK_TEXT: &str = "Não consegui responder agora. Tente novamente.";

/// Successful response of the chat service to one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReply {
    pub reply_id: Option<String>,
    pub reply_text: String,
    pub replied_at: Option<DateTime<Utc>>,
}

impl SendReply {
    pub fn new(reply_text: impl Into<String>) -> Self {
        Self {
            reply_id: None,
            reply_text: reply_text.into(),
            replied_at: None,
        }
    }

    pub fn with_reply_id(mut self, reply_id: impl Into<String>) -> Self {
        self.reply_id = Some(reply_id.into());
        self
    }

    pub fn with_replied_at(mut self, replied_at: DateTime<Utc>) -> Self {
        self.replied_at = Some(replied_at);
        self
    }
}
