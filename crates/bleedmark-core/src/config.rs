// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration, expressed in inches the way print shops specify it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BleedmarkError, Result};
use crate::types::{BackgroundStyle, LayoutSpec, Margins};
use crate::units::inches;

/// Safe-area margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginsIn {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for MarginsIn {
    fn default() -> Self {
        Self {
            left: 0.25,
            right: 0.25,
            top: 0.5,
            bottom: 0.5,
        }
    }
}

/// Persistent preparation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Final cut width in inches. The trim height follows the source aspect ratio.
    pub trim_width_in: f64,
    /// Bleed on every side in inches.
    pub bleed_in: f64,
    pub margins_in: MarginsIn,
    pub background: BackgroundStyle,
    /// Rotate alternate pages 180° for double-sided registration.
    pub duplex_flip: bool,
    /// Insert a blank page after the cover.
    pub insert_blank_after_cover: bool,
    /// Resolution handed to the thumbnail renderer.
    pub thumbnail_dpi: u32,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            trim_width_in: 10.5,
            bleed_in: 0.125,
            margins_in: MarginsIn::default(),
            background: BackgroundStyle::default(),
            duplex_flip: true,
            insert_blank_after_cover: false,
            thumbnail_dpi: 96,
        }
    }
}

impl PrepConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that can never produce a printable page.
    pub fn validate(&self) -> Result<()> {
        if !(self.trim_width_in.is_finite() && self.trim_width_in > 0.0) {
            return Err(BleedmarkError::Config(format!(
                "trim width must be positive, got {}",
                self.trim_width_in
            )));
        }
        if !(self.bleed_in.is_finite() && self.bleed_in >= 0.0) {
            return Err(BleedmarkError::Config(format!(
                "bleed must not be negative, got {}",
                self.bleed_in
            )));
        }
        let m = &self.margins_in;
        if [m.left, m.right, m.top, m.bottom]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(BleedmarkError::Config(format!(
                "margins must not be negative, got {m:?}"
            )));
        }
        if self.thumbnail_dpi == 0 {
            return Err(BleedmarkError::Config("thumbnail dpi must be positive".into()));
        }
        Ok(())
    }

    /// Convert to the point-based layout the engine consumes.
    pub fn layout_spec(&self) -> LayoutSpec {
        self.layout_spec_with_deletions(BTreeSet::new())
    }

    pub fn layout_spec_with_deletions(&self, delete_pages: BTreeSet<usize>) -> LayoutSpec {
        let m = &self.margins_in;
        LayoutSpec {
            trim_width: inches(self.trim_width_in),
            bleed: inches(self.bleed_in),
            margins: Margins::new(
                inches(m.left),
                inches(m.right),
                inches(m.top),
                inches(m.bottom),
            ),
            background: self.background,
            duplex_flip: self.duplex_flip,
            insert_blank: self.insert_blank_after_cover,
            delete_pages,
        }
    }
}
