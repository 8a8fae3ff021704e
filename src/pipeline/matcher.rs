use crate::domain::message::Message;

/// True when the first header named exactly `header_name` contains `needle`,
/// compared case-insensitively.
pub fn matches(message: &Message, needle: &str, header_name: &str) -> bool {
    message
        .header(header_name)
        .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
}
