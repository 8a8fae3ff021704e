//! Classification and attachment processing for a single message.
//!
//! A message goes through, in order: eligibility (labels), authorization
//! (sender or shared subject token), intent (subject keywords), the action
//! itself (save, or save then print) and finally the removal of its unread
//! label.

pub mod dispatcher;
pub mod eligibility;
pub mod extractor;
pub mod finalizer;
pub mod intent;
pub mod matcher;
pub mod policy;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::domain::message::{Intent, MessageId};
use crate::domain::user::AuthorizedUser;
use crate::error::{MailError, ProcessError};
use crate::mail::provider::MailProvider;
use crate::printer::Printer;

use dispatcher::{ActionReport, Dispatcher};
use extractor::{AttachmentExtractor, ExistingFilePolicy};
use finalizer::{FinalizePolicy, Finalization, StateFinalizer};
use policy::Authorization;

/// Everything the pipeline needs to decide and act, fixed at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub authorized_users: Vec<AuthorizedUser>,
    /// Subject-line bypass for unknown senders. `None` disables it.
    pub shared_token: Option<String>,
    pub attachment_dir: PathBuf,
    pub existing_files: ExistingFilePolicy,
    pub finalize: FinalizePolicy,
    /// Mark authorized mail without a keyword as read too.
    pub mark_read_without_intent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotEligible,
    Unauthorized,
    NoIntent,
}

#[derive(Debug)]
pub enum MessageOutcome {
    Skipped {
        id: MessageId,
        reason: SkipReason,
    },
    /// The action ran. Print failures, if any, are listed in the report.
    Processed {
        id: MessageId,
        intent: Intent,
        report: ActionReport,
        marked_read: bool,
    },
    /// The action was not performed (or stopped early).
    Failed {
        id: MessageId,
        error: ProcessError,
        marked_read: bool,
    },
    /// The action was performed but the message is still unread, so it will
    /// be processed again next cycle.
    FinalizeFailed {
        id: MessageId,
        intent: Intent,
        report: ActionReport,
        error: MailError,
    },
}

impl MessageOutcome {
    pub fn id(&self) -> &str {
        match self {
            MessageOutcome::Skipped { id, .. }
            | MessageOutcome::Processed { id, .. }
            | MessageOutcome::Failed { id, .. }
            | MessageOutcome::FinalizeFailed { id, .. } => id,
        }
    }
}

pub struct Pipeline<'a> {
    provider: &'a dyn MailProvider,
    printer: &'a dyn Printer,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn MailProvider,
        printer: &'a dyn Printer,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            provider,
            printer,
            config,
        }
    }

    pub fn process(&self, id: &str) -> MessageOutcome {
        let message = match self.provider.get_message(id) {
            Ok(m) => m,
            Err(e) => {
                error!("message {id}: could not fetch: {e}");
                return MessageOutcome::Failed {
                    id: id.to_string(),
                    error: ProcessError::transport("fetching message", e),
                    marked_read: false,
                };
            }
        };

        if !eligibility::is_eligible(&message) {
            debug!("message {id}: not unread personal mail");
            return MessageOutcome::Skipped {
                id: message.id,
                reason: SkipReason::NotEligible,
            };
        }

        let auth = policy::authorize(
            &self.config.authorized_users,
            self.config.shared_token.as_deref(),
            &message,
        );
        match &auth {
            Authorization::Denied => {
                info!("message {id}: sender not authorized ({})", message.subject());
                return MessageOutcome::Skipped {
                    id: message.id,
                    reason: SkipReason::Unauthorized,
                };
            }
            Authorization::KnownSender(name) => debug!("message {id}: sent by {name}"),
            Authorization::SharedToken => warn!("message {id}: authorized by shared subject token"),
        }

        let intent = intent::classify(&message);
        if intent == Intent::None && !self.config.mark_read_without_intent {
            debug!("message {id}: no action requested");
            return MessageOutcome::Skipped {
                id: message.id,
                reason: SkipReason::NoIntent,
            };
        }

        info!("message {id}: {intent} requested ({})", message.subject());
        let dispatcher = Dispatcher::new(
            AttachmentExtractor::new(
                self.provider,
                &self.config.attachment_dir,
                self.config.existing_files,
            ),
            self.printer,
            StateFinalizer::new(self.provider),
            self.config.finalize,
        );
        let dispatch = dispatcher.dispatch(intent, &message);

        match (dispatch.action, dispatch.finalization) {
            (Ok(report), Finalization::Failed(error)) => {
                error!("message {id}: {intent} done but could not mark as read: {error}");
                MessageOutcome::FinalizeFailed {
                    id: message.id,
                    intent,
                    report,
                    error,
                }
            }
            (Ok(report), fin) => MessageOutcome::Processed {
                id: message.id,
                intent,
                report,
                marked_read: fin.is_done(),
            },
            (Err(error), fin) => {
                error!("message {id}: {intent} failed: {error}");
                if let Finalization::Failed(e) = &fin {
                    error!("message {id}: could not mark as read: {e}");
                }
                MessageOutcome::Failed {
                    id: message.id,
                    error,
                    marked_read: fin.is_done(),
                }
            }
        }
    }
}
