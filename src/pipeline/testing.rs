//! In-memory collaborators for pipeline unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::{Engine as _, engine::general_purpose};

use crate::domain::message::{Header, Message, MessageId, Part};
use crate::error::{MailError, PrintError};
use crate::mail::provider::MailProvider;
use crate::printer::Printer;

#[derive(Default)]
pub struct FakeMailbox {
    pub messages: HashMap<MessageId, Message>,
    pub attachments: HashMap<String, String>,
    pub fetches: Mutex<Vec<String>>,
    pub modifications: Mutex<Vec<(String, Vec<String>)>>,
    pub fail_modify: bool,
}

impl FakeMailbox {
    pub fn with_attachment(mut self, id: &str, payload: &[u8]) -> Self {
        self.attachments
            .insert(id.to_string(), general_purpose::URL_SAFE.encode(payload));
        self
    }

    pub fn with_raw_attachment(mut self, id: &str, data: &str) -> Self {
        self.attachments.insert(id.to_string(), data.to_string());
        self
    }

    pub fn with_message(mut self, m: Message) -> Self {
        self.messages.insert(m.id.clone(), m);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn removed_labels(&self) -> Vec<(String, Vec<String>)> {
        self.modifications.lock().unwrap().clone()
    }
}

impl MailProvider for FakeMailbox {
    fn list_message_ids(&self, _query: Option<&str>) -> Result<Vec<MessageId>, MailError> {
        let mut ids: Vec<_> = self.messages.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn get_message(&self, id: &str) -> Result<Message, MailError> {
        self.messages.get(id).cloned().ok_or(MailError::Status {
            status: 404,
            body: format!("no message {id}"),
        })
    }

    fn fetch_attachment(&self, _message_id: &str, attachment_id: &str) -> Result<String, MailError> {
        self.fetches.lock().unwrap().push(attachment_id.to_string());
        self.attachments
            .get(attachment_id)
            .cloned()
            .ok_or(MailError::Status {
                status: 404,
                body: format!("no attachment {attachment_id}"),
            })
    }

    fn modify_labels(&self, message_id: &str, remove: &[&str], _add: &[&str]) -> Result<(), MailError> {
        if self.fail_modify {
            return Err(MailError::Status {
                status: 500,
                body: "backend error".into(),
            });
        }
        self.modifications.lock().unwrap().push((
            message_id.to_string(),
            remove.iter().map(|s| s.to_string()).collect(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePrinter {
    pub jobs: Mutex<Vec<PathBuf>>,
    pub reject: Option<String>,
}

impl Printer for FakePrinter {
    fn submit(&self, path: &Path) -> Result<(), PrintError> {
        if let Some(name) = &self.reject
            && path.ends_with(name)
        {
            return Err(PrintError::Rejected {
                path: path.to_path_buf(),
                reason: "paper jam".into(),
            });
        }
        self.jobs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub fn message(id: &str, labels: &[&str], from: &str, subject: &str, parts: &[(&str, &str)]) -> Message {
    Message {
        id: id.to_string(),
        headers: vec![Header::new("From", from), Header::new("Subject", subject)],
        labels: labels.iter().map(|l| l.to_string()).collect(),
        parts: parts
            .iter()
            .map(|(filename, attachment_id)| Part {
                filename: filename.to_string(),
                attachment_id: Some(attachment_id.to_string()),
                has_body: true,
            })
            .collect(),
    }
}
