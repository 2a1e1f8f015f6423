// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the page arena over lopdf and the content-stream operators
// written into it.

pub mod document;
pub mod ops;

pub use document::{EmbeddedForm, PageBox, PrintDocument};
pub use ops::{DrawOp, LineCap};
