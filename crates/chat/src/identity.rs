use crate::message::UserId;

/// Output of the external identity provider as seen by the chat screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserResolution {
    /// The provider is still restoring the session.
    #[default]
    Unresolved,
    /// Resolution finished; `None` means nobody is signed in.
    Resolved(Option<UserId>),
}

impl UserResolution {
    /// Maps the provider's `{ user, user_loading }` pair.
    pub fn from_provider(user: Option<UserId>, user_loading: bool) -> Self {
        if user_loading {
            Self::Unresolved
        } else {
            Self::Resolved(user)
        }
    }

    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        Self::Resolved(Some(user_id.into()))
    }

    pub fn signed_out() -> Self {
        Self::Resolved(None)
    }
}
