// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream drawing operators.
//
// Pages are built as a `Vec<DrawOp>` and encoded once at the end. Numbers are
// written with fixed precision and trailing zeros stripped, so the same
// geometry always yields the same bytes regardless of platform.

use bleedmark_core::{Rect, Rgb};

/// Decimal places for coordinates and translations.
const COORD_DECIMALS: usize = 4;
/// Decimal places for scale factors, matrix coefficients, and colours.
const FACTOR_DECIMALS: usize = 6;

/// Stroke end style (`J` operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl LineCap {
    fn code(self) -> u8 {
        match self {
            Self::Butt => 0,
            Self::Round => 1,
            Self::Square => 2,
        }
    }
}

/// A single content-stream operator together with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `q`
    SaveState,
    /// `Q`
    RestoreState,
    /// `a b c d e f cm`
    Transform([f64; 6]),
    /// `r g b rg`
    FillRgb(Rgb),
    /// `r g b RG`
    StrokeRgb(Rgb),
    /// `w`
    LineWidth(f64),
    /// `J`
    LineCap(LineCap),
    /// `x y w h re`
    Rectangle(Rect),
    /// `f`
    Fill,
    /// `W`
    Clip,
    /// `n`
    EndPath,
    /// `x y m`
    MoveTo(f64, f64),
    /// `x y l`
    LineTo(f64, f64),
    /// `S`
    Stroke,
    /// `/Name sh`
    PaintShading(String),
    /// `/Name Do`
    PaintXObject(String),
}

impl DrawOp {
    /// Append this operator as one line of content-stream text.
    pub fn encode_into(&self, out: &mut String) {
        match self {
            Self::SaveState => out.push('q'),
            Self::RestoreState => out.push('Q'),
            Self::Transform([a, b, c, d, e, f]) => {
                let parts = [
                    factor(*a),
                    factor(*b),
                    factor(*c),
                    factor(*d),
                    coord(*e),
                    coord(*f),
                ];
                out.push_str(&parts.join(" "));
                out.push_str(" cm");
            }
            Self::FillRgb(color) => {
                push_color(out, color);
                out.push_str(" rg");
            }
            Self::StrokeRgb(color) => {
                push_color(out, color);
                out.push_str(" RG");
            }
            Self::LineWidth(width) => {
                out.push_str(&coord(*width));
                out.push_str(" w");
            }
            Self::LineCap(cap) => {
                out.push_str(&cap.code().to_string());
                out.push_str(" J");
            }
            Self::Rectangle(rect) => {
                let parts = [
                    coord(rect.x0),
                    coord(rect.y0),
                    coord(rect.width()),
                    coord(rect.height()),
                ];
                out.push_str(&parts.join(" "));
                out.push_str(" re");
            }
            Self::Fill => out.push('f'),
            Self::Clip => out.push('W'),
            Self::EndPath => out.push('n'),
            Self::MoveTo(x, y) => {
                out.push_str(&format!("{} {} m", coord(*x), coord(*y)));
            }
            Self::LineTo(x, y) => {
                out.push_str(&format!("{} {} l", coord(*x), coord(*y)));
            }
            Self::Stroke => out.push('S'),
            Self::PaintShading(name) => {
                out.push_str(&format!("/{name} sh"));
            }
            Self::PaintXObject(name) => {
                out.push_str(&format!("/{name} Do"));
            }
        }
    }
}

/// Encode a whole operator sequence, one operator per line.
pub fn encode(ops: &[DrawOp]) -> Vec<u8> {
    let mut out = String::with_capacity(ops.len() * 24);
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        op.encode_into(&mut out);
    }
    out.into_bytes()
}

/// Format with fixed precision, then drop trailing zeros and a bare point.
pub fn format_number(value: f64, decimals: usize) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_owned();
    }
    text
}

fn coord(value: f64) -> String {
    format_number(value, COORD_DECIMALS)
}

fn factor(value: f64) -> String {
    format_number(value, FACTOR_DECIMALS)
}

fn push_color(out: &mut String, color: &Rgb) {
    out.push_str(&format!(
        "{} {} {}",
        factor(color.r),
        factor(color.g),
        factor(color.b)
    ));
}

/// Replay `ops` and return every stroked line segment in page space as
/// `[x0, y0, x1, y1]`, honouring `q`/`Q` and `cm`.
#[cfg(test)]
pub(crate) fn stroked_segments(ops: &[DrawOp]) -> Vec<[f64; 4]> {
    fn concat(m: [f64; 6], ctm: [f64; 6]) -> [f64; 6] {
        [
            m[0] * ctm[0] + m[1] * ctm[2],
            m[0] * ctm[1] + m[1] * ctm[3],
            m[2] * ctm[0] + m[3] * ctm[2],
            m[2] * ctm[1] + m[3] * ctm[3],
            m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
            m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
        ]
    }
    fn apply(m: &[f64; 6], x: f64, y: f64) -> (f64, f64) {
        (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
    }

    let mut ctm = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut stack = Vec::new();
    let mut path: Vec<(f64, f64)> = Vec::new();
    let mut segments = Vec::new();

    for op in ops {
        match op {
            DrawOp::SaveState => stack.push(ctm),
            DrawOp::RestoreState => ctm = stack.pop().unwrap_or(ctm),
            DrawOp::Transform(m) => ctm = concat(*m, ctm),
            DrawOp::MoveTo(x, y) => {
                path.clear();
                path.push(apply(&ctm, *x, *y));
            }
            DrawOp::LineTo(x, y) => path.push(apply(&ctm, *x, *y)),
            DrawOp::Stroke => {
                for pair in path.windows(2) {
                    segments.push([pair[0].0, pair[0].1, pair[1].0, pair[1].1]);
                }
                path.clear();
            }
            _ => {}
        }
    }
    segments
}

/// Replay `ops` and return the fill colour in effect at each `Do`, in order.
/// `None` means the default black fill set up by the viewer.
#[cfg(test)]
pub(crate) fn fill_at_xobjects(ops: &[DrawOp]) -> Vec<Option<Rgb>> {
    let mut fill = None;
    let mut stack = Vec::new();
    let mut seen = Vec::new();
    for op in ops {
        match op {
            DrawOp::SaveState => stack.push(fill),
            DrawOp::RestoreState => fill = stack.pop().unwrap_or(fill),
            DrawOp::FillRgb(color) => fill = Some(*color),
            DrawOp::PaintXObject(_) => seen.push(fill),
            _ => {}
        }
    }
    seen
}
