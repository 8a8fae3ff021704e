use std::collections::HashSet;

pub type MessageId = String;

/// Gmail system label for mail that has not been read yet.
pub const LABEL_UNREAD: &str = "UNREAD";
/// Gmail category label for mail in the "Primary/Personal" tab.
pub const LABEL_CATEGORY_PERSONAL: &str = "CATEGORY_PERSONAL";

pub const HEADER_FROM: &str = "From";
pub const HEADER_SUBJECT: &str = "Subject";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One MIME part of a message. Attachment content is never embedded; it is
/// fetched on demand through the attachment id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    pub filename: String,
    pub attachment_id: Option<String>,
    pub has_body: bool,
}

impl Part {
    /// Attachment id, if the part carries a non-empty one.
    pub fn attachment(&self) -> Option<&str> {
        self.attachment_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    pub id: MessageId,
    pub headers: Vec<Header>,
    pub labels: HashSet<String>,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Value of the first header named exactly `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    pub fn subject(&self) -> &str {
        self.header(HEADER_SUBJECT).unwrap_or("(no subject)")
    }
}

/// What a message asks us to do with its attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Print,
    Save,
    None,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Print => "print",
            Intent::Save => "save",
            Intent::None => "none",
        };
        f.write_str(s)
    }
}
