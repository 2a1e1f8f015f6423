// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bleedmark.

use thiserror::Error;

/// Page axis a layout constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// The safe area left after subtracting margins from the trim box is not
/// positive on `axis`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("margins leave no {axis} safe area ({extent:.4}pt)")]
pub struct LayoutError {
    pub axis: Axis,
    /// Trim extent minus both margins on that axis, in points.
    pub extent: f64,
}

/// Top-level error type for all Bleedmark operations.
#[derive(Debug, Error)]
pub enum BleedmarkError {
    // -- Layout errors --
    #[error("page {page}: {source}")]
    Layout {
        /// 0-based index of the page being laid out.
        page: usize,
        #[source]
        source: LayoutError,
    },

    #[error("no pages left after deleting indices {deleted:?}")]
    DocumentEmpty { deleted: Vec<usize> },

    // -- Document model errors --
    #[error("failed to open PDF: {0}")]
    DocumentOpen(String),

    #[error("failed to save PDF: {0}")]
    DocumentSave(String),

    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("page {page} is malformed: {detail}")]
    MalformedPage { page: usize, detail: String },

    #[error("page {page} has already been flipped")]
    AlreadyFlipped { page: usize },

    // -- Jobs / persistence --
    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BleedmarkError>;
