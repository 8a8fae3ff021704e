use crate::domain::message::{HEADER_FROM, HEADER_SUBJECT, Message};
use crate::domain::user::AuthorizedUser;
use crate::pipeline::matcher::matches;

/// Why a message was, or was not, allowed to trigger an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The sender is a configured user (by name).
    KnownSender(String),
    /// Unknown sender, but the subject carries the shared token.
    SharedToken,
    Denied,
}

impl Authorization {
    pub fn is_granted(&self) -> bool {
        !matches!(self, Authorization::Denied)
    }
}

/// Known senders first, then the shared subject token. A missing or blank
/// token disables the second tier.
pub fn authorize(
    users: &[AuthorizedUser],
    shared_token: Option<&str>,
    message: &Message,
) -> Authorization {
    for user in users {
        let known = user
            .emails
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .any(|email| matches(message, email, HEADER_FROM));
        if known {
            return Authorization::KnownSender(user.name.clone());
        }
    }

    match shared_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) if matches(message, token, HEADER_SUBJECT) => Authorization::SharedToken,
        _ => Authorization::Denied,
    }
}

pub fn is_authorized(
    users: &[AuthorizedUser],
    shared_token: Option<&str>,
    message: &Message,
) -> bool {
    authorize(users, shared_token, message).is_granted()
}
