use std::fmt;

use crate::pipeline::MessageOutcome;

/// Per-cycle tally of message outcomes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub listed: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub finalize_failed: usize,
    pub files_saved: usize,
    pub files_printed: usize,
    pub print_failures: usize,
}

impl CycleSummary {
    pub fn from_outcomes(outcomes: &[MessageOutcome]) -> Self {
        let mut s = Self {
            listed: outcomes.len(),
            ..Default::default()
        };
        for o in outcomes {
            match o {
                MessageOutcome::Skipped { .. } => s.skipped += 1,
                MessageOutcome::Processed { report, .. } => {
                    s.processed += 1;
                    s.files_saved += report.saved.len();
                    s.files_printed += report.printed.len();
                    s.print_failures += report.print_failures.len();
                }
                MessageOutcome::Failed { .. } => s.failed += 1,
                MessageOutcome::FinalizeFailed { report, .. } => {
                    s.finalize_failed += 1;
                    s.files_saved += report.saved.len();
                    s.files_printed += report.printed.len();
                    s.print_failures += report.print_failures.len();
                }
            }
        }
        s
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.finalize_failed > 0 || self.print_failures > 0
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listed, {} processed, {} skipped, {} failed, {} not marked read; \
             {} files saved, {} printed, {} print errors",
            self.listed,
            self.processed,
            self.skipped,
            self.failed,
            self.finalize_failed,
            self.files_saved,
            self.files_printed,
            self.print_failures
        )
    }
}
