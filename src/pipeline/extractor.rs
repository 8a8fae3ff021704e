use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::domain::message::{Message, Part};
use crate::error::ProcessError;
use crate::mail::decoders::decode_base64url;
use crate::mail::provider::MailProvider;

/// What to do when the attachment directory already holds a file of the same
/// name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExistingFilePolicy {
    /// Fetch and write again.
    #[default]
    Overwrite,
    /// Leave the file alone and do not fetch the attachment.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Written,
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAttachment {
    pub filename: String,
    pub path: PathBuf,
    pub status: SaveStatus,
}

/// Attachment names come from the sender. Only the final path component is
/// kept so nothing is written outside the attachment directory.
fn local_filename(reported: &str) -> Option<&str> {
    Path::new(reported)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
}

/// Write through a temporary file in `dir` so an interrupted run never
/// leaves a truncated file under the final name.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ProcessError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ProcessError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| ProcessError::io(path, e))?;
    tmp.persist(path).map_err(|e| ProcessError::io(path, e.error))?;
    Ok(())
}

pub struct AttachmentExtractor<'a> {
    provider: &'a dyn MailProvider,
    dir: &'a Path,
    policy: ExistingFilePolicy,
}

impl<'a> AttachmentExtractor<'a> {
    pub fn new(provider: &'a dyn MailProvider, dir: &'a Path, policy: ExistingFilePolicy) -> Self {
        Self {
            provider,
            dir,
            policy,
        }
    }

    /// Save every attachment part of `message`, in part order.
    ///
    /// Parts without a usable filename (inline bodies Gmail moved out of
    /// line, names like `..`) are not files and are passed over. Attachments
    /// sharing a name overwrite each other, also across messages.
    pub fn extract(&self, message: &Message) -> Result<Vec<SavedAttachment>, ProcessError> {
        let mut saved = Vec::new();

        for part in &message.parts {
            let Some(attachment_id) = part.attachment() else {
                continue;
            };
            let Some(filename) = local_filename(&part.filename) else {
                if part.filename.is_empty() {
                    debug!(
                        "message {}: nameless part {attachment_id} (body: {}) is not a file",
                        message.id, part.has_body
                    );
                } else {
                    warn!(
                        "message {}: attachment name '{}' is not usable, skipped",
                        message.id, part.filename
                    );
                }
                continue;
            };
            saved.push(self.save_part(message, part, filename, attachment_id)?);
        }

        Ok(saved)
    }

    fn save_part(
        &self,
        message: &Message,
        part: &Part,
        filename: &str,
        attachment_id: &str,
    ) -> Result<SavedAttachment, ProcessError> {
        if filename != part.filename {
            warn!(
                "message {}: attachment '{}' saved as '{}'",
                message.id, part.filename, filename
            );
        }
        let path = self.dir.join(filename);

        if self.policy == ExistingFilePolicy::Skip && path.exists() {
            debug!("{} already present, not fetching", path.display());
            return Ok(SavedAttachment {
                filename: filename.to_string(),
                path,
                status: SaveStatus::AlreadyPresent,
            });
        }

        let data = self
            .provider
            .fetch_attachment(&message.id, attachment_id)
            .map_err(|e| ProcessError::transport(format!("fetching attachment '{filename}'"), e))?;

        let bytes = decode_base64url(&data).map_err(|source| ProcessError::Decode {
            filename: filename.to_string(),
            source,
        })?;

        fs::create_dir_all(self.dir).map_err(|e| ProcessError::io(self.dir, e))?;
        write_atomically(self.dir, &path, &bytes)?;
        info!("message {}: saved {} ({} bytes)", message.id, path.display(), bytes.len());

        Ok(SavedAttachment {
            filename: filename.to_string(),
            path,
            status: SaveStatus::Written,
        })
    }
}
