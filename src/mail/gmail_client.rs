use crate::domain::message::{Header, Message, MessageId, Part};
use crate::error::MailError;
use crate::mail::provider::{MailProvider, TokenSource};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WirePart {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    headers: Vec<WireHeader>,
    body: Option<WireBody>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBody {
    attachment_id: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct WireHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest<'a> {
    add_label_ids: &'a [&'a str],
    remove_label_ids: &'a [&'a str],
}

impl WirePart {
    fn to_part(&self) -> Part {
        Part {
            filename: self.filename.clone(),
            attachment_id: self.body.as_ref().and_then(|b| b.attachment_id.clone()),
            has_body: self.body.as_ref().is_some_and(|b| b.size > 0),
        }
    }

    /// Depth-first, in the order the provider lists them.
    fn flatten_into(&self, out: &mut Vec<Part>) {
        for sub in &self.parts {
            out.push(sub.to_part());
            sub.flatten_into(out);
        }
    }
}

impl From<WireMessage> for Message {
    fn from(w: WireMessage) -> Self {
        let mut headers = Vec::new();
        let mut parts = Vec::new();

        if let Some(payload) = &w.payload {
            headers = payload
                .headers
                .iter()
                .map(|h| Header::new(&h.name, &h.value))
                .collect();

            // A single-part message can be an attachment by itself.
            let top = payload.to_part();
            if top.attachment().is_some() {
                parts.push(top);
            }
            payload.flatten_into(&mut parts);
        }

        Message {
            id: w.id,
            headers,
            labels: w.label_ids.into_iter().collect(),
            parts,
        }
    }
}

/// Gmail REST client bound to one mailbox owner.
///
/// A cycle can outlive its access token. With a [`TokenSource`] attached, a
/// rejected request is retried once with a refreshed token, shared by all
/// workers.
pub struct GmailClient<'a> {
    http: Client,
    user_id: String,
    access_token: Mutex<String>,
    tokens: Option<&'a dyn TokenSource>,
    page_size: u32,
    max_pages: u32,
}

impl<'a> GmailClient<'a> {
    pub fn new(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Self, MailError> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            http,
            user_id: user_id.into(),
            access_token: Mutex::new(access_token.into()),
            tokens: None,
            page_size,
            max_pages: max_pages.max(1),
        })
    }

    pub fn with_token_source(mut self, tokens: &'a dyn TokenSource) -> Self {
        self.tokens = Some(tokens);
        self
    }

    fn current_token(&self) -> String {
        self.access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `op` with the current token; on an auth failure refresh and run it
    /// once more. Only the first worker to see the stale token refreshes it.
    fn authorized<T>(&self, op: impl Fn(&str) -> Result<T, MailError>) -> Result<T, MailError> {
        let used = self.current_token();
        match op(&used) {
            Err(MailError::Auth(reason)) => {
                let Some(tokens) = self.tokens else {
                    return Err(MailError::Auth(reason));
                };
                let fresh = {
                    let mut current = self
                        .access_token
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    if *current == used {
                        warn!("access token rejected ({reason}), refreshing");
                        *current = tokens.refresh()?;
                    }
                    current.clone()
                };
                op(&fresh)
            }
            other => other,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{API_BASE}/{}/{path}", self.user_id)
    }

    fn check(resp: Response) -> Result<Response, MailError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MailError::Auth("access token rejected".to_string()));
        }
        let body = resp.text().unwrap_or_default();
        Err(MailError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl MailProvider for GmailClient<'_> {
    fn list_message_ids(&self, query: Option<&str>) -> Result<Vec<MessageId>, MailError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.max_pages {
            let page: ListResponse = self.authorized(|token| {
                let mut req = self
                    .http
                    .get(self.url("messages"))
                    .bearer_auth(token)
                    .query(&[("maxResults", self.page_size.to_string())]);
                if let Some(q) = query {
                    req = req.query(&[("q", q)]);
                }
                if let Some(tok) = &page_token {
                    req = req.query(&[("pageToken", tok)]);
                }
                Ok(Self::check(req.send()?)?.json::<ListResponse>()?)
            })?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(tok) => page_token = Some(tok),
                None => break,
            }
        }

        debug!("listed {} message ids", ids.len());
        Ok(ids)
    }

    fn get_message(&self, id: &str) -> Result<Message, MailError> {
        let wire: WireMessage = self.authorized(|token| {
            let resp = self
                .http
                .get(self.url(&format!("messages/{id}")))
                .bearer_auth(token)
                .query(&[("format", "full")])
                .send()?;
            Ok(Self::check(resp)?.json::<WireMessage>()?)
        })?;
        Ok(wire.into())
    }

    fn fetch_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<String, MailError> {
        let att: AttachmentResponse = self.authorized(|token| {
            let resp = self
                .http
                .get(self.url(&format!(
                    "messages/{message_id}/attachments/{attachment_id}"
                )))
                .bearer_auth(token)
                .send()?;
            Ok(Self::check(resp)?.json::<AttachmentResponse>()?)
        })?;
        Ok(att.data)
    }

    fn modify_labels(
        &self,
        message_id: &str,
        remove: &[&str],
        add: &[&str],
    ) -> Result<(), MailError> {
        let body = ModifyRequest {
            add_label_ids: add,
            remove_label_ids: remove,
        };
        self.authorized(|token| {
            let resp = self
                .http
                .post(self.url(&format!("messages/{message_id}/modify")))
                .bearer_auth(token)
                .json(&body)
                .send()?;
            Self::check(resp).map(drop)
        })
    }
}
