use crate::error::PrintError;
use log::debug;
use std::path::Path;
use std::process::Command;

/// Something that accepts files for printing.
pub trait Printer: Send + Sync {
    fn submit(&self, path: &Path) -> Result<(), PrintError>;
}

/// Submits jobs to a CUPS queue with `lp -d <destination> <file>`.
pub struct LpPrinter {
    command: String,
    destination: String,
}

impl LpPrinter {
    pub fn new(command: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            destination: destination.into(),
        }
    }
}

impl Printer for LpPrinter {
    fn submit(&self, path: &Path) -> Result<(), PrintError> {
        let output = Command::new(&self.command)
            .arg("-d")
            .arg(&self.destination)
            .arg(path)
            .output()
            .map_err(|source| PrintError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(PrintError::Rejected {
                path: path.to_path_buf(),
                reason,
            });
        }

        debug!(
            "{} queued {}: {}",
            self.destination,
            path.display(),
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}
