use crate::domain::message::{LABEL_CATEGORY_PERSONAL, LABEL_UNREAD, Message};

/// Only new mail in the personal category is ever acted upon.
pub fn is_eligible(message: &Message) -> bool {
    message.has_label(LABEL_UNREAD) && message.has_label(LABEL_CATEGORY_PERSONAL)
}
