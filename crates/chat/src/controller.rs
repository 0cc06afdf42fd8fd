use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};
use chrono::Utc;
use snafu::ensure;

use crate::events::{ViewHintReceiver, ViewHintSender};
use crate::identity::UserResolution;
use crate::message::{Message, MessageId, UserId};
use crate::service::{ChatService, DecodeSnafu};
use crate::state::{SendRejection, SendTicket, SessionState};

/// Result of one `send` call. Failures of the remote call never surface here as
/// errors; they become a fallback assistant message and a `Degraded` outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Preconditions failed; nothing changed and no remote call was made.
    Rejected(SendRejection),
    /// The assistant answered; carries the id of the reply.
    Replied(MessageId),
    /// The remote call failed or returned a blank reply; carries the id of the fallback.
    Degraded(MessageId),
}

/// Owns the chat timeline for one screen and coordinates history loads and sends.
///
/// Cloning is cheap and every clone drives the same session, so a front-end can
/// spawn `send` and `reload` as independent tasks.
#[derive(Clone)]
pub struct ChatSessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    service: Arc<dyn ChatService>,
    state: ArcSwap<SessionState>,
    hints: ViewHintSender,
    next_ticket: AtomicU64,
}

impl ChatSessionController {
    pub fn new(service: Arc<dyn ChatService>) -> (Self, ViewHintReceiver) {
        let (hints, receiver) = ViewHintSender::channel();
        let controller = Self {
            inner: Arc::new(ControllerInner {
                service,
                state: ArcSwap::from_pointee(SessionState::default()),
                hints,
                next_ticket: AtomicU64::new(1),
            }),
        };

        (controller, receiver)
    }

    /// Returns the current immutable state snapshot.
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.inner.state.load_full()
    }

    /// Binds the session to the identity provider's latest resolution.
    ///
    /// History is fetched once per distinct resolved user; repeated activation with
    /// the same user is a no-op.
    pub async fn activate(&self, resolution: UserResolution) {
        match resolution {
            UserResolution::Unresolved => {
                // A re-resolving identity unbinds the user so the next resolution loads again.
                self.update(|state| {
                    state.loading = true;
                    state.user_unavailable = false;
                    state.user_id = None;
                });
                self.inner.hints.state_changed();
            }
            UserResolution::Resolved(None) => {
                self.update(|state| {
                    state.loading = false;
                    state.user_unavailable = true;
                    state.user_id = None;
                    state.messages.clear();
                });
                tracing::info!("chat session has no signed-in user");
                self.inner.hints.timeline_changed();
            }
            UserResolution::Resolved(Some(user_id)) => {
                let bound = self.try_update(|state| {
                    if state.user_id.as_ref() == Some(&user_id) {
                        return Err(());
                    }

                    if state.user_id.is_some() {
                        state.messages.clear();
                    }
                    state.user_id = Some(user_id.clone());
                    state.user_unavailable = false;
                    Ok(())
                });

                if bound.is_err() {
                    tracing::trace!(user_id = %user_id, "chat session already bound to user");
                    return;
                }

                tracing::debug!(user_id = %user_id, "chat session bound to user");
                self.reload().await;
            }
        }
    }

    /// Replaces the timeline with the user's history from the chat service.
    ///
    /// Overlapping calls each run a full cycle and the last one to finish wins.
    pub async fn reload(&self) {
        let Ok(user_id) = self.try_update(|state| state.begin_load().ok_or(())) else {
            tracing::debug!("skipping history reload without a bound user");
            return;
        };
        self.inner.hints.state_changed();

        match self.inner.service.fetch_history(&user_id).await {
            Ok(messages) => {
                let count = messages.len();
                let applied = self.try_update(|state| {
                    ensure_bound(state, &user_id)?;
                    state.replace_timeline(messages.clone());
                    Ok::<(), ()>(())
                });

                if applied.is_ok() {
                    tracing::debug!(user_id = %user_id, count, "chat history loaded");
                    self.inner.hints.timeline_changed();
                } else {
                    tracing::debug!(user_id = %user_id, "discarding history of an unbound user");
                }
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %user_id,
                    stage = error.stage(),
                    "failed to load chat history: {error}"
                );
                let applied = self.try_update(|state| {
                    ensure_bound(state, &user_id)?;
                    state.fail_load();
                    Ok::<(), ()>(())
                });

                if applied.is_ok() {
                    self.inner.hints.state_changed();
                }
            }
        }
    }

    /// Runs one optimistic send cycle.
    ///
    /// The user's message is appended before the remote call is issued. A second
    /// call while one cycle is in flight is refused without side effects. The reply
    /// lands only if the sender is still the bound user.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        let ticket = SendTicket(self.inner.next_ticket.fetch_add(1, Ordering::Relaxed));

        let claimed = self.try_update(|state| state.begin_send(ticket, text, Utc::now()));
        let (user_id, draft_id) = match claimed {
            Ok(claimed) => claimed,
            Err(rejection) => {
                tracing::debug!(?rejection, "send request refused");
                return SendOutcome::Rejected(rejection);
            }
        };

        tracing::debug!(user_id = %user_id, ?ticket, draft_id = %draft_id, "send cycle started");
        self.inner.hints.timeline_changed();

        let result = self
            .inner
            .service
            .send_message(&user_id, text)
            .await
            .and_then(|reply| {
                ensure!(
                    !reply.reply_text.trim().is_empty(),
                    DecodeSnafu {
                        stage: "validate-send-reply",
                        details: "reply text is blank",
                    }
                );
                Ok(reply)
            });

        let (reply, outcome) = match result {
            Ok(reply) => {
                let reply = Message::assistant_reply(reply, Utc::now());
                let outcome = SendOutcome::Replied(reply.id.clone());
                (reply, outcome)
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %user_id,
                    ?ticket,
                    stage = error.stage(),
                    "send failed, appending fallback reply: {error}"
                );
                let reply = Message::assistant_fallback(Utc::now());
                let outcome = SendOutcome::Degraded(reply.id.clone());
                (reply, outcome)
            }
        };

        let appended = self.update(|state| state.finish_send(ticket, &user_id, reply.clone()));
        if appended {
            tracing::debug!(user_id = %user_id, ?ticket, "send cycle finished");
            self.inner.hints.timeline_changed();
        } else {
            tracing::debug!(user_id = %user_id, ?ticket, "dropping reply for a user no longer bound");
            self.inner.hints.state_changed();
        }

        outcome
    }

    fn update<R>(&self, mut apply: impl FnMut(&mut SessionState) -> R) -> R {
        match self.try_update(|state| Ok::<R, Infallible>(apply(state))) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Read-copy-update over the published snapshot. `apply` runs against a private
    /// copy and is retried if another writer published first; `Err` aborts without
    /// publishing anything.
    fn try_update<R, E>(
        &self,
        mut apply: impl FnMut(&mut SessionState) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut current = self.inner.state.load_full();
        loop {
            let mut next = SessionState::clone(&current);
            let outcome = apply(&mut next)?;
            let previous = self.inner.state.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &current) {
                return Ok(outcome);
            }
            current = Guard::into_inner(previous);
        }
    }
}

fn ensure_bound(state: &SessionState, user_id: &UserId) -> Result<(), ()> {
    if state.user_id.as_ref() == Some(user_id) {
        Ok(())
    } else {
        Err(())
    }
}
