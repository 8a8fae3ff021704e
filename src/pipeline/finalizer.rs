use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::domain::message::LABEL_UNREAD;
use crate::error::MailError;
use crate::mail::provider::MailProvider;

/// When a dispatched message gets its unread marker removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalizePolicy {
    /// Once processing has started, whatever the action's outcome.
    #[default]
    Always,
    /// Only when the action fully succeeded; failures stay unread and are
    /// retried next cycle.
    OnSuccess,
}

#[derive(Debug)]
pub enum Finalization {
    Done,
    /// Left unread on purpose.
    Kept,
    Failed(MailError),
}

impl Finalization {
    pub fn is_done(&self) -> bool {
        matches!(self, Finalization::Done)
    }
}

pub struct StateFinalizer<'a> {
    provider: &'a dyn MailProvider,
}

impl<'a> StateFinalizer<'a> {
    pub fn new(provider: &'a dyn MailProvider) -> Self {
        Self { provider }
    }

    pub fn finalize(&self, message_id: &str) -> Result<(), MailError> {
        self.provider.modify_labels(message_id, &[LABEL_UNREAD], &[])?;
        info!("message {message_id}: marked as read");
        Ok(())
    }

    /// Arm a guard for `message_id`. The guard finalizes exactly once: when
    /// [`FinalizeGuard::complete`] is called, or on drop if processing unwinds
    /// before that under [`FinalizePolicy::Always`].
    pub fn guard<'g>(&'g self, message_id: &'g str, policy: FinalizePolicy) -> FinalizeGuard<'g> {
        FinalizeGuard {
            finalizer: self,
            message_id,
            policy,
            armed: true,
        }
    }
}

pub struct FinalizeGuard<'g> {
    finalizer: &'g StateFinalizer<'g>,
    message_id: &'g str,
    policy: FinalizePolicy,
    armed: bool,
}

impl FinalizeGuard<'_> {
    pub fn complete(mut self, action_succeeded: bool) -> Finalization {
        self.armed = false;
        if self.policy == FinalizePolicy::OnSuccess && !action_succeeded {
            return Finalization::Kept;
        }
        match self.finalizer.finalize(self.message_id) {
            Ok(()) => Finalization::Done,
            Err(e) => Finalization::Failed(e),
        }
    }
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.policy != FinalizePolicy::Always {
            return;
        }
        if let Err(e) = self.finalizer.finalize(self.message_id) {
            error!("message {}: could not mark as read: {e}", self.message_id);
        }
    }
}
