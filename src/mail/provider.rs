use crate::domain::message::{Message, MessageId};
use crate::error::MailError;

/// The mailbox operations the pipeline needs. Implementations act on behalf of
/// a single mailbox owner.
pub trait MailProvider: Send + Sync {
    /// Ids of candidate messages, newest first. `query` uses the provider's
    /// search syntax; `None` lists everything.
    fn list_message_ids(&self, query: Option<&str>) -> Result<Vec<MessageId>, MailError>;

    fn get_message(&self, id: &str) -> Result<Message, MailError>;

    /// Raw base64url attachment payload.
    fn fetch_attachment(&self, message_id: &str, attachment_id: &str)
    -> Result<String, MailError>;

    fn modify_labels(&self, message_id: &str, remove: &[&str], add: &[&str])
    -> Result<(), MailError>;
}

/// Hands out a new access token when the current one is rejected.
pub trait TokenSource: Send + Sync {
    fn refresh(&self) -> Result<String, MailError>;
}
