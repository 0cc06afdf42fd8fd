use chrono::{DateTime, Utc};

use crate::message::{Message, MessageId, UserId};

/// User-facing text stored in [`SessionState::error`] when history cannot be loaded.
pub const HISTORY_LOAD_FAILED_TEXT: &str =
    "Não foi possível carregar o histórico do chat. Tente novamente.";

/// Handle of the single send round-trip allowed in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SendTicket(pub u64);

/// Why a send request was refused without touching state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRejection {
    NoUser,
    EmptyText,
    AlreadySending { active: SendTicket },
}

/// Condition the presentation layer should surface next to the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIssue {
    /// Recoverable by calling `reload`.
    HistoryLoadFailed(String),
    /// Recoverable only by signing in again.
    UserUnavailable,
}

/// Observable chat session state.
///
/// Snapshots are immutable; the controller publishes a new one on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
    pub user_unavailable: bool,
    pub user_id: Option<UserId>,
    in_flight: Option<SendTicket>,
}

impl SessionState {
    pub fn sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn issue(&self) -> Option<SessionIssue> {
        if self.user_unavailable {
            return Some(SessionIssue::UserUnavailable);
        }

        self.error.clone().map(SessionIssue::HistoryLoadFailed)
    }

    /// Validates a send request, claims the in-flight slot and appends the optimistic
    /// user message in one step.
    pub(crate) fn begin_send(
        &mut self,
        ticket: SendTicket,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserId, MessageId), SendRejection> {
        if text.is_empty() {
            return Err(SendRejection::EmptyText);
        }
        let Some(user_id) = self.user_id.clone() else {
            return Err(SendRejection::NoUser);
        };
        if let Some(active) = self.in_flight {
            return Err(SendRejection::AlreadySending { active });
        }

        let draft = Message::user_draft(text, now);
        let draft_id = draft.id.clone();
        self.messages.push(draft);
        self.in_flight = Some(ticket);

        Ok((user_id, draft_id))
    }

    /// Frees the slot held by `ticket` and appends the assistant turn while `sender`
    /// is still bound. Returns whether the reply was appended.
    pub(crate) fn finish_send(
        &mut self,
        ticket: SendTicket,
        sender: &UserId,
        reply: Message,
    ) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        if self.user_id.as_ref() != Some(sender) {
            return false;
        }

        self.messages.push(reply);
        true
    }

    pub(crate) fn begin_load(&mut self) -> Option<UserId> {
        let user_id = self.user_id.clone()?;
        self.loading = true;
        self.error = None;
        Some(user_id)
    }

    pub(crate) fn replace_timeline(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.loading = false;
    }

    pub(crate) fn fail_load(&mut self) {
        self.error = Some(HISTORY_LOAD_FAILED_TEXT.to_string());
        self.loading = false;
    }
}
