//! In-memory mailbox and printer standing in for Gmail and CUPS.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::{Engine as _, engine::general_purpose};

use rs_mail_printer::domain::message::{Header, Message, MessageId, Part};
use rs_mail_printer::domain::user::AuthorizedUser;
use rs_mail_printer::error::{MailError, PrintError};
use rs_mail_printer::mail::provider::MailProvider;
use rs_mail_printer::pipeline::PipelineConfig;
use rs_mail_printer::pipeline::extractor::ExistingFilePolicy;
use rs_mail_printer::pipeline::finalizer::FinalizePolicy;
use rs_mail_printer::printer::Printer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Fetch(String, String),
    Modify(String, Vec<String>),
}

#[derive(Default)]
pub struct Mailbox {
    pub messages: HashMap<MessageId, Message>,
    pub order: Vec<MessageId>,
    pub attachments: HashMap<String, String>,
    pub calls: Mutex<Vec<Call>>,
    pub fail_list: bool,
}

impl Mailbox {
    pub fn add(&mut self, m: Message) {
        self.order.push(m.id.clone());
        self.messages.insert(m.id.clone(), m);
    }

    pub fn attach(&mut self, id: &str, payload: &[u8]) {
        self.attachments
            .insert(id.to_string(), general_purpose::URL_SAFE_NO_PAD.encode(payload));
    }

    pub fn attach_raw(&mut self, id: &str, data: &str) {
        self.attachments.insert(id.to_string(), data.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(_, a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn modifications(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Modify(m, l) => Some((m, l)),
                _ => None,
            })
            .collect()
    }
}

impl MailProvider for Mailbox {
    fn list_message_ids(&self, _query: Option<&str>) -> Result<Vec<MessageId>, MailError> {
        if self.fail_list {
            return Err(MailError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.order.clone())
    }

    fn get_message(&self, id: &str) -> Result<Message, MailError> {
        self.calls.lock().unwrap().push(Call::Get(id.to_string()));
        self.messages.get(id).cloned().ok_or(MailError::Status {
            status: 404,
            body: "not found".into(),
        })
    }

    fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String, MailError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Fetch(message_id.to_string(), attachment_id.to_string()));
        self.attachments.get(attachment_id).cloned().ok_or(MailError::Status {
            status: 404,
            body: "no attachment".into(),
        })
    }

    fn modify_labels(&self, message_id: &str, remove: &[&str], _add: &[&str]) -> Result<(), MailError> {
        self.calls.lock().unwrap().push(Call::Modify(
            message_id.to_string(),
            remove.iter().map(|s| s.to_string()).collect(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPrinter {
    pub jobs: Mutex<Vec<PathBuf>>,
}

impl RecordingPrinter {
    pub fn jobs(&self) -> Vec<PathBuf> {
        self.jobs.lock().unwrap().clone()
    }
}

impl Printer for RecordingPrinter {
    fn submit(&self, path: &Path) -> Result<(), PrintError> {
        self.jobs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub fn msg(
    id: &str,
    labels: &[&str],
    from: &str,
    subject: &str,
    attachments: &[(&str, &str)],
) -> Message {
    Message {
        id: id.to_string(),
        headers: vec![Header::new("From", from), Header::new("Subject", subject)],
        labels: labels.iter().map(|l| l.to_string()).collect(),
        parts: attachments
            .iter()
            .map(|(filename, attachment_id)| Part {
                filename: filename.to_string(),
                attachment_id: Some(attachment_id.to_string()),
                has_body: true,
            })
            .collect(),
    }
}

pub fn pipeline_config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        authorized_users: vec![AuthorizedUser {
            name: "Authorized".into(),
            emails: vec!["authorized@example.com".into()],
        }],
        shared_token: Some("tok-42".into()),
        attachment_dir: dir.to_path_buf(),
        existing_files: ExistingFilePolicy::Overwrite,
        finalize: FinalizePolicy::Always,
        mark_read_without_intent: true,
    }
}
