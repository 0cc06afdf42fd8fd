#![deny(unsafe_code)]

//! Chat session core for the finance assistant screen.
//!
//! The controller owns the message timeline, applies optimistic sends, reconciles
//! replies from the chat service and tells the presentation layer when to re-render
//! or scroll.

pub mod controller;
/// View hint contracts between the controller and the presentation layer.
pub mod events;
pub mod identity;
/// Timeline entities and local id minting.
pub mod message;
pub mod mock;
pub mod scroll;
pub mod service;
pub mod state;

pub use controller::{ChatSessionController, SendOutcome};
pub use events::{ViewHint, ViewHintReceiver};
pub use identity::UserResolution;
pub use message::{
    Author, LocalIdKind, Message, MessageId, SEND_FALLBACK_TEXT, SendReply, UserId,
};
pub use mock::MockChatService;
pub use scroll::{SCROLL_TO_BOTTOM_DELAY, ScrollScheduler, ScrollTarget};
pub use service::{
    BoxFuture, ChatService, DecodeSnafu, NetworkSnafu, ServerSnafu, ServiceError, ServiceResult,
};
pub use state::{
    HISTORY_LOAD_FAILED_TEXT, SendRejection, SendTicket, SessionIssue, SessionState,
};
