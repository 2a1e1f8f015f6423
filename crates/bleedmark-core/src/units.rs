// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Length units. The engine works exclusively in PDF points; everything
// arriving in inches or millimetres is converted here first.

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Convert inches to points.
pub fn inches(value: f64) -> f64 {
    value * POINTS_PER_INCH
}

/// Convert millimetres to points.
pub fn millimetres(value: f64) -> f64 {
    value / MM_PER_INCH * POINTS_PER_INCH
}

/// Convert points back to inches (reporting only).
pub fn to_inches(points: f64) -> f64 {
    points / POINTS_PER_INCH
}
