// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bleedmark — Core types, units, configuration, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;
pub mod units;

pub use config::PrepConfig;
pub use error::{Axis, BleedmarkError, LayoutError};
pub use types::*;
