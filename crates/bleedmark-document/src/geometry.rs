// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry planning — trim height, media and safe rectangles, uniform
// fit-scale, centering, and the matrices that bake page rotation into content.

use bleedmark_core::{Axis, LayoutError, Margins, Rect, Size};

/// Page rotation as stored in `/Rotate` (clockwise, multiples of 90).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Upright,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Normalise any `/Rotate` value. Returns `None` when it is not a
    /// multiple of 90.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Upright),
            90 => Some(Self::Quarter),
            180 => Some(Self::Half),
            270 => Some(Self::ThreeQuarter),
            _ => None,
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Self::Upright => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    /// Quarter turns swap the displayed width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Quarter | Self::ThreeQuarter)
    }
}

/// Placement of one original page inside the new media box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub media: Size,
    /// Safe rectangle in media-box coordinates.
    pub safe_rect: Rect,
    /// Uniform scale applied to both axes.
    pub scale: f64,
    /// Lower-left corner of the scaled content in media-box coordinates.
    pub offset: (f64, f64),
}

/// Trim height for a given trim width, such that the source scaled to the
/// safe width plus the vertical margins fills the trim box exactly.
pub fn compute_trim_height(
    orig_width: f64,
    orig_height: f64,
    trim_width: f64,
    margins: &Margins,
) -> Result<f64, LayoutError> {
    let safe_width = trim_width - margins.horizontal();
    if safe_width.is_nan() || safe_width <= 0.0 {
        return Err(LayoutError {
            axis: Axis::Horizontal,
            extent: safe_width,
        });
    }
    let scale = safe_width / orig_width;
    Ok(orig_height * scale + margins.vertical())
}

/// Fit `original` inside the safe area of a `trim` sized page with `bleed`
/// on every side. Content is scaled uniformly and never cropped.
pub fn compute_layout(
    original: Size,
    trim: Size,
    bleed: f64,
    margins: &Margins,
) -> Result<PageLayout, LayoutError> {
    let media = Size::new(trim.width + 2.0 * bleed, trim.height + 2.0 * bleed);

    let safe_width = trim.width - margins.horizontal();
    if safe_width.is_nan() || safe_width <= 0.0 {
        return Err(LayoutError {
            axis: Axis::Horizontal,
            extent: safe_width,
        });
    }
    let safe_height = trim.height - margins.vertical();
    if safe_height.is_nan() || safe_height <= 0.0 {
        return Err(LayoutError {
            axis: Axis::Vertical,
            extent: safe_height,
        });
    }

    let scale = (safe_width / original.width).min(safe_height / original.height);
    let scaled_width = original.width * scale;
    let scaled_height = original.height * scale;

    let safe_x0 = bleed + margins.left;
    let safe_y0 = bleed + margins.bottom;
    let safe_rect = Rect::new(safe_x0, safe_y0, safe_x0 + safe_width, safe_y0 + safe_height);
    let offset = (
        safe_x0 + (safe_width - scaled_width) / 2.0,
        safe_y0 + (safe_height - scaled_height) / 2.0,
    );

    Ok(PageLayout {
        media,
        safe_rect,
        scale,
        offset,
    })
}

/// Displayed size of a page once its rotation is applied.
pub fn effective_size(media: &Rect, rotation: Rotation) -> Size {
    if rotation.swaps_axes() {
        Size::new(media.height(), media.width())
    } else {
        media.size()
    }
}

/// Form matrix mapping the untransformed page extent onto
/// `[0 0 w h]` of its displayed (rotated) size.
pub fn form_matrix(media: &Rect, rotation: Rotation) -> [f64; 6] {
    let (x0, y0) = (media.x0, media.y0);
    let (w, h) = (media.width(), media.height());
    match rotation {
        Rotation::Upright => [1.0, 0.0, 0.0, 1.0, -x0, -y0],
        Rotation::Quarter => [0.0, -1.0, 1.0, 0.0, -y0, w + x0],
        Rotation::Half => [-1.0, 0.0, 0.0, -1.0, w + x0, h + y0],
        Rotation::ThreeQuarter => [0.0, 1.0, -1.0, 0.0, h + y0, -x0],
    }
}

/// 180° rotation about the centre of `media`.
pub fn flip_matrix(media: &Rect) -> [f64; 6] {
    [-1.0, 0.0, 0.0, -1.0, media.x0 + media.x1, media.y0 + media.y1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bleedmark_core::units::inches;

    fn apply(m: [f64; 6], x: f64, y: f64) -> (f64, f64) {
        (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
    }

    #[test]
    fn trim_height_follows_aspect_ratio() {
        let height = compute_trim_height(720.0, 405.0, 700.0, &Margins::default()).unwrap();
        assert!((height - 393.75).abs() < 1e-9);
    }

    #[test]
    fn trim_height_includes_vertical_margins() {
        let margins = Margins::new(18.0, 18.0, 36.0, 36.0);
        let height = compute_trim_height(720.0, 405.0, 756.0, &margins).unwrap();
        // safe width 720 -> scale 1 -> 405 + 72
        assert!((height - 477.0).abs() < 1e-9);
    }

    #[test]
    fn margins_wider_than_trim_fail() {
        let margins = Margins::new(inches(3.0), inches(3.0), 0.0, 0.0);
        let err = compute_trim_height(720.0, 405.0, inches(5.0), &margins).unwrap_err();
        assert_eq!(err.axis, Axis::Horizontal);
        assert!((err.extent + 72.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_margins_can_fail_layout() {
        let margins = Margins::new(0.0, 0.0, 60.0, 60.0);
        let err =
            compute_layout(Size::new(100.0, 50.0), Size::new(200.0, 100.0), 9.0, &margins)
                .unwrap_err();
        assert_eq!(err.axis, Axis::Vertical);
    }

    #[test]
    fn nan_inputs_are_rejected() {
        let nan_side = Margins::new(f64::NAN, 0.0, 0.0, 0.0);
        let err = compute_trim_height(720.0, 405.0, 700.0, &nan_side).unwrap_err();
        assert_eq!(err.axis, Axis::Horizontal);
        assert!(compute_trim_height(720.0, 405.0, f64::NAN, &Margins::default()).is_err());

        let err = compute_layout(
            Size::new(720.0, 405.0),
            Size::new(700.0, f64::NAN),
            9.0,
            &Margins::default(),
        )
        .unwrap_err();
        assert_eq!(err.axis, Axis::Vertical);

        let nan_top = Margins::new(0.0, 0.0, f64::NAN, 0.0);
        let err = compute_layout(
            Size::new(720.0, 405.0),
            Size::new(700.0, 393.75),
            9.0,
            &nan_top,
        )
        .unwrap_err();
        assert_eq!(err.axis, Axis::Vertical);
    }

    #[test]
    fn scale_is_uniform_and_fits() {
        let layout = compute_layout(
            Size::new(100.0, 50.0),
            Size::new(200.0, 80.0),
            0.0,
            &Margins::default(),
        )
        .unwrap();
        assert!((layout.scale - 1.6).abs() < 1e-12);
        // 160 x 80 centred in 200 x 80
        assert!((layout.offset.0 - 20.0).abs() < 1e-12);
        assert!(layout.offset.1.abs() < 1e-12);
    }

    #[test]
    fn offset_is_inside_safe_rect() {
        let margins = Margins::new(18.0, 18.0, 36.0, 36.0);
        let layout =
            compute_layout(Size::new(612.0, 792.0), Size::new(756.0, 500.0), 9.0, &margins)
                .unwrap();
        assert_eq!(layout.media, Size::new(774.0, 518.0));
        assert_eq!(layout.safe_rect, Rect::new(27.0, 45.0, 747.0, 473.0));
        let placed = Rect::new(
            layout.offset.0,
            layout.offset.1,
            layout.offset.0 + 612.0 * layout.scale,
            layout.offset.1 + 792.0 * layout.scale,
        );
        assert!(placed.x0 >= layout.safe_rect.x0 - 1e-9);
        assert!(placed.x1 <= layout.safe_rect.x1 + 1e-9);
        assert!((placed.y0 - layout.safe_rect.y0).abs() < 1e-9);
        assert!((placed.y1 - layout.safe_rect.y1).abs() < 1e-9);
    }

    #[test]
    fn rotation_normalises() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::ThreeQuarter));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Quarter));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn quarter_turn_swaps_size() {
        let media = Rect::new(0.0, 0.0, 612.0, 792.0);
        assert_eq!(effective_size(&media, Rotation::Quarter), Size::new(792.0, 612.0));
        assert_eq!(effective_size(&media, Rotation::Half), Size::new(612.0, 792.0));
    }

    #[test]
    fn form_matrix_lands_on_origin() {
        let media = Rect::new(10.0, 20.0, 110.0, 70.0);
        for rotation in [
            Rotation::Upright,
            Rotation::Quarter,
            Rotation::Half,
            Rotation::ThreeQuarter,
        ] {
            let m = form_matrix(&media, rotation);
            let size = effective_size(&media, rotation);
            let corners = [(10.0, 20.0), (110.0, 20.0), (10.0, 70.0), (110.0, 70.0)];
            let mapped: Vec<_> = corners.iter().map(|&(x, y)| apply(m, x, y)).collect();
            let min_x = mapped.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
            let min_y = mapped.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let max_x = mapped.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
            let max_y = mapped.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
            assert_eq!((min_x, min_y), (0.0, 0.0), "{rotation:?}");
            assert_eq!((max_x, max_y), (size.width, size.height), "{rotation:?}");
        }
    }

    #[test]
    fn quarter_turn_moves_top_left_to_top_right() {
        let media = Rect::new(0.0, 0.0, 100.0, 50.0);
        let m = form_matrix(&media, Rotation::Quarter);
        assert_eq!(apply(m, 0.0, 50.0), (50.0, 100.0));
    }

    #[test]
    fn flip_is_an_involution() {
        let media = Rect::new(0.0, 0.0, 718.0, 411.75);
        let m = flip_matrix(&media);
        let (x, y) = apply(m, 6.0, 9.0);
        assert_eq!(apply(m, x, y), (6.0, 9.0));
    }
}
