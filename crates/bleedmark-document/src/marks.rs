// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop marks.
//
// Each trim-box corner gets a horizontal and a vertical stroke pointing away
// from the trim area. The eight strokes are drawn twice: a wide white pass
// that stays visible on dark backgrounds, then a narrow black pass on top.

use bleedmark_core::{Rect, Rgb};

use crate::pdf::ops::{DrawOp, LineCap};

/// Gap between the trim corner and the start of each mark.
pub const MARK_OFFSET: f64 = 3.0;
/// Length of each mark.
pub const MARK_LENGTH: f64 = 18.0;
/// Width of the white halo pass.
pub const HALO_WEIGHT: f64 = 1.0;
/// Width of the black pass.
pub const LINE_WEIGHT: f64 = 0.75;

/// A straight stroke from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

/// The eight mark segments for `trim`, corner by corner (bottom-left,
/// bottom-right, top-right, top-left), horizontal before vertical.
pub fn crop_mark_segments(trim: &Rect) -> [Segment; 8] {
    let corners = [
        (trim.x0, trim.y0, -1.0, -1.0),
        (trim.x1, trim.y0, 1.0, -1.0),
        (trim.x1, trim.y1, 1.0, 1.0),
        (trim.x0, trim.y1, -1.0, 1.0),
    ];

    let mut segments = [Segment {
        start: (0.0, 0.0),
        end: (0.0, 0.0),
    }; 8];
    for (i, (cx, cy, h_dir, v_dir)) in corners.into_iter().enumerate() {
        segments[2 * i] = Segment {
            start: (cx + MARK_OFFSET * h_dir, cy),
            end: (cx + (MARK_OFFSET + MARK_LENGTH) * h_dir, cy),
        };
        segments[2 * i + 1] = Segment {
            start: (cx, cy + MARK_OFFSET * v_dir),
            end: (cx, cy + (MARK_OFFSET + MARK_LENGTH) * v_dir),
        };
    }
    segments
}

/// Operators drawing both passes of the crop marks, wrapped in `q`/`Q`.
pub fn build_crop_marks(trim: &Rect) -> Vec<DrawOp> {
    let segments = crop_mark_segments(trim);
    let mut ops = Vec::with_capacity(2 + 2 * (3 + 3 * segments.len()));

    ops.push(DrawOp::SaveState);
    for (weight, color) in [(HALO_WEIGHT, Rgb::WHITE), (LINE_WEIGHT, Rgb::BLACK)] {
        ops.push(DrawOp::LineWidth(weight));
        ops.push(DrawOp::StrokeRgb(color));
        ops.push(DrawOp::LineCap(LineCap::Round));
        for segment in &segments {
            ops.push(DrawOp::MoveTo(segment.start.0, segment.start.1));
            ops.push(DrawOp::LineTo(segment.end.0, segment.end.1));
            ops.push(DrawOp::Stroke);
        }
    }
    ops.push(DrawOp::RestoreState);
    ops
}
