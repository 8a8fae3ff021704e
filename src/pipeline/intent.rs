use crate::domain::message::{HEADER_SUBJECT, Intent, Message};
use crate::pipeline::matcher::matches;

pub const PRINT_KEYWORD: &str = "print";
pub const SAVE_KEYWORD: &str = "save";

/// Print wins over save when a subject asks for both.
pub fn classify(message: &Message) -> Intent {
    if matches(message, PRINT_KEYWORD, HEADER_SUBJECT) {
        Intent::Print
    } else if matches(message, SAVE_KEYWORD, HEADER_SUBJECT) {
        Intent::Save
    } else {
        Intent::None
    }
}
