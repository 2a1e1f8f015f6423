// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-build verification of persisted page boxes against the trim plan.

use bleedmark_core::error::Result;
use bleedmark_core::units::to_inches;
use bleedmark_core::{Check, PageVerification, Rect, TrimPlan, VerificationReport};
use tracing::{info, instrument, warn};

use crate::pdf::document::{PageBox, PrintDocument};

/// Allowed trim size deviation, in points.
pub const TRIM_TOLERANCE: f64 = 0.01;
/// Allowed per-side bleed deviation, in points.
pub const BLEED_TOLERANCE: f64 = 0.001;
/// Allowed deviation of media = trim + 2 × bleed, in points.
pub const MEDIA_TOLERANCE: f64 = 0.01;

/// Boxes read back from one saved page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedBoxes {
    pub media: Rect,
    pub trim: Option<Rect>,
    pub bleed: Option<Rect>,
}

fn check(label: String, pass: bool) -> Check {
    Check { label, pass }
}

/// Compare one page's boxes with the plan. Labels quote values in inches.
pub fn box_checks(boxes: &PersistedBoxes, plan: &TrimPlan) -> Vec<Check> {
    let media = boxes.media;
    let trim = boxes.trim.unwrap_or(media);

    let sides = [
        ("left", trim.x0 - media.x0),
        ("bottom", trim.y0 - media.y0),
        ("right", media.x1 - trim.x1),
        ("top", media.y1 - trim.y1),
    ];

    let mut checks = vec![
        check(
            format!(
                "trim width {:.3}in (expected {:.3}in)",
                to_inches(trim.width()),
                to_inches(plan.trim_width)
            ),
            (trim.width() - plan.trim_width).abs() < TRIM_TOLERANCE,
        ),
        check(
            format!(
                "trim height {:.3}in (expected {:.3}in)",
                to_inches(trim.height()),
                to_inches(plan.trim_height)
            ),
            (trim.height() - plan.trim_height).abs() < TRIM_TOLERANCE,
        ),
    ];

    for (side, measured) in sides {
        checks.push(check(
            format!(
                "{side} bleed {:.4}in (expected {:.4}in)",
                to_inches(measured),
                to_inches(plan.bleed)
            ),
            (measured - plan.bleed).abs() < BLEED_TOLERANCE,
        ));
    }

    // Media must equal trim plus bleed on both sides of each axis.
    let left = sides[0].1;
    let bottom = sides[1].1;
    let right = sides[2].1;
    let top = sides[3].1;
    checks.push(check(
        format!("media width {:.3}in", to_inches(media.width())),
        (media.width() - (trim.width() + left + right)).abs() < MEDIA_TOLERANCE
            && (media.width() - (plan.trim_width + 2.0 * plan.bleed)).abs() < MEDIA_TOLERANCE,
    ));
    checks.push(check(
        format!("media height {:.3}in", to_inches(media.height())),
        (media.height() - (trim.height() + bottom + top)).abs() < MEDIA_TOLERANCE
            && (media.height() - (plan.trim_height + 2.0 * plan.bleed)).abs() < MEDIA_TOLERANCE,
    ));

    checks.push(check("TrimBox inside MediaBox".into(), media.contains(&trim)));
    checks.push(check("TrimBox present".into(), boxes.trim.is_some()));
    checks.push(check("BleedBox present".into(), boxes.bleed.is_some()));
    checks
}

/// Reopen a saved document and check every page's boxes.
///
/// Failing to open the bytes is an error; failing checks are data.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn verify_document(bytes: &[u8], plan: &TrimPlan) -> Result<VerificationReport> {
    let doc = PrintDocument::open(bytes)?;

    let mut pages = Vec::with_capacity(doc.page_count());
    for index in 0..doc.page_count() {
        let boxes = PersistedBoxes {
            media: doc.media_box(index)?,
            trim: doc.page_box(index, PageBox::Trim)?,
            bleed: doc.page_box(index, PageBox::Bleed)?,
        };
        let verification = PageVerification::new(index + 1, box_checks(&boxes, plan));
        for failure in verification.failures() {
            warn!(page = index + 1, check = %failure.label, "verification failed");
        }
        pages.push(verification);
    }

    let report = VerificationReport { pages };
    info!(
        pages = report.pages.len(),
        all_pass = report.all_pass(),
        "verification complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixturePage, fixture_pdf};
    use bleedmark_core::Margins;

    fn plan() -> TrimPlan {
        TrimPlan {
            trim_width: 700.0,
            trim_height: 393.75,
            bleed: 9.0,
            margins: Margins::default(),
        }
    }

    fn good_boxes() -> PersistedBoxes {
        PersistedBoxes {
            media: Rect::new(0.0, 0.0, 718.0, 411.75),
            trim: Some(Rect::new(9.0, 9.0, 709.0, 402.75)),
            bleed: Some(Rect::new(0.0, 0.0, 718.0, 411.75)),
        }
    }

    #[test]
    fn exact_boxes_pass() {
        let checks = box_checks(&good_boxes(), &plan());
        assert_eq!(checks.len(), 11);
        assert!(checks.iter().all(|c| c.pass), "{checks:?}");
    }

    #[test]
    fn labels_are_in_inches() {
        let checks = box_checks(&good_boxes(), &plan());
        assert_eq!(checks[0].label, "trim width 9.722in (expected 9.722in)");
        assert_eq!(checks[2].label, "left bleed 0.1250in (expected 0.1250in)");
    }

    #[test]
    fn bleed_tolerance_is_tight() {
        let mut boxes = good_boxes();
        boxes.trim = Some(Rect::new(9.002, 9.0, 709.002, 402.75));
        let checks = box_checks(&boxes, &plan());
        let left = checks.iter().find(|c| c.label.starts_with("left")).unwrap();
        let right = checks.iter().find(|c| c.label.starts_with("right")).unwrap();
        assert!(!left.pass);
        assert!(!right.pass);
        // Trim width is unchanged and still passes.
        assert!(checks[0].pass);
    }

    #[test]
    fn missing_trim_box_falls_back_to_media() {
        let boxes = PersistedBoxes {
            media: Rect::new(0.0, 0.0, 718.0, 411.75),
            trim: None,
            bleed: None,
        };
        let checks = box_checks(&boxes, &plan());
        let present: Vec<bool> = checks[checks.len() - 2..].iter().map(|c| c.pass).collect();
        assert_eq!(present, vec![false, false]);
        assert!(!checks[0].pass);
    }

    #[test]
    fn unprocessed_document_fails_checks() {
        let bytes = fixture_pdf(&[FixturePage::new(720.0, 405.0)]);
        let report = verify_document(&bytes, &plan()).unwrap();
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].page, 1);
        assert!(!report.all_pass());
    }

    #[test]
    fn unreadable_bytes_are_an_error() {
        assert!(verify_document(b"%PDF-broken", &plan()).is_err());
    }

    #[test]
    fn trim_outside_media_fails() {
        // Bleed of -9pt: media shrinks inside the trim yet every side
        // still measures exactly the planned bleed.
        let plan = TrimPlan {
            bleed: -9.0,
            ..plan()
        };
        let boxes = PersistedBoxes {
            media: Rect::new(0.0, 0.0, 682.0, 375.75),
            trim: Some(Rect::new(-9.0, -9.0, 691.0, 384.75)),
            bleed: Some(Rect::new(0.0, 0.0, 682.0, 375.75)),
        };
        let checks = box_checks(&boxes, &plan);
        let inside = checks
            .iter()
            .find(|c| c.label == "TrimBox inside MediaBox")
            .unwrap();
        assert!(!inside.pass);
    }

    #[test]
    fn deviation_equal_to_tolerance_fails() {
        let plan = TrimPlan {
            trim_width: 0.0,
            trim_height: 100.0,
            bleed: 0.0,
            margins: Margins::default(),
        };
        let boxes = PersistedBoxes {
            media: Rect::new(0.0, 0.0, TRIM_TOLERANCE, 100.0),
            trim: Some(Rect::new(BLEED_TOLERANCE, 0.0, TRIM_TOLERANCE, 100.0)),
            bleed: Some(Rect::new(0.0, 0.0, TRIM_TOLERANCE, 100.0)),
        };
        let checks = box_checks(&boxes, &plan);
        let left = checks.iter().find(|c| c.label.starts_with("left")).unwrap();
        assert!(!left.pass);

        let boxes = PersistedBoxes {
            trim: Some(Rect::new(0.0, 0.0, TRIM_TOLERANCE, 100.0)),
            ..boxes
        };
        assert!(!box_checks(&boxes, &plan)[0].pass);
    }
}
