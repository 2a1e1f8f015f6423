// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages.
//
// Every technical error is mapped to a plain sentence plus a suggestion the
// person preparing the job can act on. Page numbers are shown 1-based.

use crate::error::BleedmarkError;
use crate::units::to_inches;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The settings need changing before the job can run.
    SettingsRequired,
    /// The source file itself is the problem.
    BadInput,
    /// Disk, permissions, or another environment problem.
    Environment,
    /// A bug or an unexpected call sequence.
    Internal,
}

/// A human-readable error with a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `BleedmarkError` into something a print operator can act on.
pub fn humanize_error(err: &BleedmarkError) -> HumanError {
    match err {
        BleedmarkError::Layout { page, source } => HumanError {
            message: format!("The margins are too large for page {}.", page + 1),
            suggestion: format!(
                "Reduce the {} margins or increase the trim size. The safe area came out at {:.3}\".",
                source.axis,
                to_inches(source.extent),
            ),
            severity: Severity::SettingsRequired,
        },

        BleedmarkError::DocumentEmpty { deleted } => HumanError {
            message: "Every page was marked for deletion.".into(),
            suggestion: format!(
                "Keep at least one page. ({} page(s) were selected for deletion.)",
                deleted.len()
            ),
            severity: Severity::SettingsRequired,
        },

        BleedmarkError::Config(detail) => HumanError {
            message: "The settings are not valid.".into(),
            suggestion: format!("Check the values and try again. ({detail})"),
            severity: Severity::SettingsRequired,
        },

        BleedmarkError::DocumentOpen(detail) => HumanError {
            message: "This file could not be read as a PDF.".into(),
            suggestion: format!("Export the document to PDF again and re-upload it. ({detail})"),
            severity: Severity::BadInput,
        },

        BleedmarkError::MalformedPage { page, detail } => HumanError {
            message: format!("Page {} of the PDF is damaged.", page + 1),
            suggestion: format!("Re-export the document or delete that page. ({detail})"),
            severity: Severity::BadInput,
        },

        BleedmarkError::InvalidJob(detail) => HumanError {
            message: "This job could not be found.".into(),
            suggestion: format!("Upload the file again. ({detail})"),
            severity: Severity::BadInput,
        },

        BleedmarkError::DocumentSave(detail) => HumanError {
            message: "The print-ready file could not be written.".into(),
            suggestion: format!("Check free disk space and try again. ({detail})"),
            severity: Severity::Environment,
        },

        BleedmarkError::Io(io) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check free disk space and folder permissions. ({io})"),
            severity: Severity::Environment,
        },

        BleedmarkError::Serialization(detail) => HumanError {
            message: "Job information could not be saved or loaded.".into(),
            suggestion: format!("Process the file again. ({detail})"),
            severity: Severity::Environment,
        },

        BleedmarkError::PageOutOfRange { .. } | BleedmarkError::AlreadyFlipped { .. } => {
            HumanError {
                message: "Something went wrong while preparing the pages.".into(),
                suggestion: format!("Please report this problem. ({err})"),
                severity: Severity::Internal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Axis, LayoutError};

    #[test]
    fn layout_error_mentions_page_and_inches() {
        let err = BleedmarkError::Layout {
            page: 0,
            source: LayoutError {
                axis: Axis::Horizontal,
                extent: -72.0,
            },
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::SettingsRequired);
        assert!(human.message.contains("page 1"));
        assert!(human.suggestion.contains("horizontal"));
        assert!(human.suggestion.contains("-1.000\""));
    }

    #[test]
    fn empty_document_needs_settings_change() {
        let err = BleedmarkError::DocumentEmpty {
            deleted: vec![0, 1],
        };
        assert_eq!(humanize_error(&err).severity, Severity::SettingsRequired);
    }

    #[test]
    fn unreadable_pdf_is_bad_input() {
        let err = BleedmarkError::DocumentOpen("invalid file header".into());
        assert_eq!(humanize_error(&err).severity, Severity::BadInput);
    }

    #[test]
    fn double_flip_is_internal() {
        let err = BleedmarkError::AlreadyFlipped { page: 3 };
        assert_eq!(humanize_error(&err).severity, Severity::Internal);
    }
}
