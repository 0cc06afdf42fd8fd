use std::future::Future;
use std::pin::Pin;

use snafu::Snafu;

use crate::message::{Message, SendReply, UserId};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure reported by a chat backend.
///
/// Context selectors are public so backends in other crates can build these errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ServiceError {
    #[snafu(display("chat backend unreachable on `{stage}`: {message}"))]
    Network {
        stage: &'static str,
        message: String,
    },
    #[snafu(display("chat backend returned status {status} on `{stage}`: {body}"))]
    Server {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode chat backend payload on `{stage}`: {details}"))]
    Decode {
        stage: &'static str,
        details: String,
    },
}

impl ServiceError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network { stage, .. } | Self::Server { stage, .. } | Self::Decode { stage, .. } => {
                stage
            }
        }
    }
}

/// Remote operations the chat controller depends on.
pub trait ChatService: Send + Sync {
    /// Returns the user's conversation in chronological order.
    fn fetch_history<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, ServiceResult<Vec<Message>>>;

    /// Delivers one user message and waits for the assistant's answer.
    fn send_message<'a>(
        &'a self,
        user_id: &'a UserId,
        text: &'a str,
    ) -> BoxFuture<'a, ServiceResult<SendReply>>;
}
