// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bleedmark print-preparation engine.
// All lengths are PDF points unless a field name says otherwise.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Identifiers --------------------------------------------------------------

/// Short identifier of a processing job (8 lowercase alphanumerics).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..8].to_owned())
    }

    /// Accept only ids of the shape produced by [`JobId::new`], so an id
    /// can never escape its working directory.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(Self(raw.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry -----------------------------------------------------------------

/// Width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle `[x0 y0 x1 y1]` as stored in PDF box arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Build from a PDF box array, normalising corner order.
    pub fn from_corners(values: [f64; 4]) -> Self {
        let [a, b, c, d] = values;
        Self::new(a.min(c), b.min(d), a.max(c), b.max(d))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Shrink every edge by `amount`.
    pub fn inset(&self, amount: f64) -> Self {
        Self::new(
            self.x0 + amount,
            self.y0 + amount,
            self.x1 - amount,
            self.y1 - amount,
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// Page-edge offsets keeping content away from the trim line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

// -- Colour -------------------------------------------------------------------

/// DeviceRGB colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Clamp each channel into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

/// Two-stop vertical gradient, `bottom` at y = 0 and `top` at the media
/// height, interpolated linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStops {
    pub bottom: Rgb,
    pub top: Rgb,
}

impl GradientStops {
    /// Dark navy fading up into a medium blue.
    pub const NAVY: GradientStops = GradientStops {
        bottom: Rgb::new(0.04, 0.06, 0.14),
        top: Rgb::new(0.11, 0.20, 0.38),
    };
}

impl Default for GradientStops {
    fn default() -> Self {
        Self::NAVY
    }
}

/// Where a solid background colour comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "color", rename_all = "snake_case")]
pub enum ColorSource {
    /// Sample the page's own leading fill colour.
    #[default]
    Detect,
    /// Use the given colour for every page.
    Fixed(Rgb),
}

/// How the full media area (bleed included) is painted behind the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum BackgroundStyle {
    Solid { source: ColorSource },
    Gradient { stops: GradientStops },
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::Solid {
            source: ColorSource::Detect,
        }
    }
}

/// The background actually painted on a page, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedBackground {
    Solid { color: Rgb },
    Gradient { stops: GradientStops },
}

// -- Layout -------------------------------------------------------------------

/// Everything a caller decides about one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    /// Final cut width.
    pub trim_width: f64,
    /// Bleed added on every side of the trim box.
    pub bleed: f64,
    /// Safe-area margins inside the trim box.
    pub margins: Margins,
    pub background: BackgroundStyle,
    /// Rotate every odd (0-based) page 180° for duplex registration.
    pub duplex_flip: bool,
    /// Insert a blank separator page after the cover.
    pub insert_blank: bool,
    /// 0-based page indices removed before anything else happens.
    pub delete_pages: BTreeSet<usize>,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        crate::PrepConfig::default().layout_spec()
    }
}

/// Layout fixed for a whole run once the trim height has been derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimPlan {
    pub trim_width: f64,
    pub trim_height: f64,
    pub bleed: f64,
    pub margins: Margins,
}

impl TrimPlan {
    pub fn media_width(&self) -> f64 {
        self.trim_width + 2.0 * self.bleed
    }

    pub fn media_height(&self) -> f64 {
        self.trim_height + 2.0 * self.bleed
    }

    /// `[0 0 W H]`, also used as the BleedBox.
    pub fn media_rect(&self) -> Rect {
        Rect::from_size(self.media_width(), self.media_height())
    }

    /// The trim box, inset from the media box by the bleed.
    pub fn trim_rect(&self) -> Rect {
        Rect::new(
            self.bleed,
            self.bleed,
            self.bleed + self.trim_width,
            self.bleed + self.trim_height,
        )
    }
}

// -- Results ------------------------------------------------------------------

/// Derived metrics for one output page. Reporting only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number in the output document.
    pub page: usize,
    /// Rotation-compensated source size; `None` for a synthesized blank.
    pub original: Option<Size>,
    pub trim: Size,
    pub media: Size,
    /// `None` for a synthesized blank.
    pub safe_area: Option<Size>,
    pub scale: f64,
    pub flipped: bool,
    pub background: ResolvedBackground,
    pub blank: bool,
}

/// One named verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub label: String,
    pub pass: bool,
}

/// All checks for one persisted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVerification {
    /// 1-based page number.
    pub page: usize,
    pub checks: Vec<Check>,
    pub all_pass: bool,
}

impl PageVerification {
    pub fn new(page: usize, checks: Vec<Check>) -> Self {
        let all_pass = checks.iter().all(|c| c.pass);
        Self {
            page,
            checks,
            all_pass,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.pass)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub pages: Vec<PageVerification>,
}

impl VerificationReport {
    pub fn all_pass(&self) -> bool {
        self.pages.iter().all(|p| p.all_pass)
    }
}

/// Metadata persisted next to a job's output for the preview collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
    pub pages: Vec<PageResult>,
    pub trim_width: f64,
    pub trim_height: f64,
    pub bleed: f64,
    pub duplex_flip: bool,
    /// SHA-256 of `output.pdf`, lowercase hex.
    pub output_sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_shape() {
        let id = JobId::new();
        assert_eq!(id.as_str().len(), 8);
        assert_eq!(JobId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn job_id_rejects_path_tricks() {
        assert!(JobId::parse("../etc/x").is_none());
        assert!(JobId::parse("abc").is_none());
        assert!(JobId::parse("abcdefg/").is_none());
    }

    #[test]
    fn rect_normalises_corners() {
        let rect = Rect::from_corners([100.0, 50.0, 0.0, 0.0]);
        assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect.size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn trim_plan_boxes() {
        let plan = TrimPlan {
            trim_width: 700.0,
            trim_height: 393.75,
            bleed: 9.0,
            margins: Margins::default(),
        };
        assert_eq!(plan.media_rect(), Rect::new(0.0, 0.0, 718.0, 411.75));
        assert_eq!(plan.trim_rect(), Rect::new(9.0, 9.0, 709.0, 402.75));
        assert!(plan.media_rect().contains(&plan.trim_rect()));
    }

    #[test]
    fn background_style_json_shape() {
        let style = BackgroundStyle::Gradient {
            stops: GradientStops::NAVY,
        };
        let json = serde_json::to_string(&style).unwrap();
        assert!(json.contains("\"style\":\"gradient\""));
        let back: BackgroundStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, style);
    }
}
