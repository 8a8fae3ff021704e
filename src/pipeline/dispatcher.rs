use std::path::PathBuf;

use log::{error, info};

use crate::domain::message::{Intent, Message};
use crate::error::{PrintError, ProcessError};
use crate::pipeline::extractor::{AttachmentExtractor, SavedAttachment};
use crate::pipeline::finalizer::{FinalizePolicy, Finalization, StateFinalizer};
use crate::printer::Printer;

#[derive(Debug)]
pub struct PrintFailure {
    pub path: PathBuf,
    pub error: PrintError,
}

#[derive(Debug, Default)]
pub struct ActionReport {
    pub saved: Vec<SavedAttachment>,
    pub printed: Vec<PathBuf>,
    pub print_failures: Vec<PrintFailure>,
}

impl ActionReport {
    pub fn is_complete(&self) -> bool {
        self.print_failures.is_empty()
    }
}

/// Result of dispatching one message: what the action did and whether the
/// message was marked as read afterwards.
#[derive(Debug)]
pub struct Dispatch {
    pub action: Result<ActionReport, ProcessError>,
    pub finalization: Finalization,
}

pub struct Dispatcher<'a> {
    extractor: AttachmentExtractor<'a>,
    printer: &'a dyn Printer,
    finalizer: StateFinalizer<'a>,
    policy: FinalizePolicy,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        extractor: AttachmentExtractor<'a>,
        printer: &'a dyn Printer,
        finalizer: StateFinalizer<'a>,
        policy: FinalizePolicy,
    ) -> Self {
        Self {
            extractor,
            printer,
            finalizer,
            policy,
        }
    }

    /// Run the action for `intent`, then finalize the message.
    pub fn dispatch(&self, intent: Intent, message: &Message) -> Dispatch {
        let guard = self.finalizer.guard(&message.id, self.policy);

        let action = self.run(intent, message);
        let succeeded = action.as_ref().is_ok_and(ActionReport::is_complete);

        Dispatch {
            action,
            finalization: guard.complete(succeeded),
        }
    }

    fn run(&self, intent: Intent, message: &Message) -> Result<ActionReport, ProcessError> {
        match intent {
            Intent::None => Ok(ActionReport::default()),
            Intent::Save => Ok(ActionReport {
                saved: self.extractor.extract(message)?,
                ..Default::default()
            }),
            Intent::Print => {
                let saved = self.extractor.extract(message)?;
                let mut report = ActionReport::default();

                for attachment in &saved {
                    match self.printer.submit(&attachment.path) {
                        Ok(()) => {
                            info!("message {}: queued {} for printing", message.id, attachment.filename);
                            report.printed.push(attachment.path.clone());
                        }
                        Err(error) => {
                            error!("message {}: {error}", message.id);
                            report.print_failures.push(PrintFailure {
                                path: attachment.path.clone(),
                                error,
                            });
                        }
                    }
                }

                report.saved = saved;
                Ok(report)
            }
        }
    }
}
