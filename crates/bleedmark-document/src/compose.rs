// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composer — rebuilds a page as background, relocated original content,
// and crop marks, optionally turned 180° for duplex registration.

use bleedmark_core::error::{BleedmarkError, Result};
use bleedmark_core::{
    BackgroundStyle, ColorSource, PageResult, ResolvedBackground, Rgb, Size, TrimPlan,
};
use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, instrument};

use crate::background::detect_background;
use crate::geometry::{PageLayout, compute_layout, effective_size, flip_matrix, form_matrix};
use crate::marks::build_crop_marks;
use crate::pdf::document::{EmbeddedForm, PageBox, PrintDocument};
use crate::pdf::ops::{DrawOp, encode};

/// Resource name of the embedded original page.
pub const FORM_NAME: &str = "OrigPage";
/// Resource name of the gradient background shading.
pub const SHADING_NAME: &str = "BgGradient";

const PROC_SET: [&[u8]; 5] = [b"PDF", b"Text", b"ImageB", b"ImageC", b"ImageI"];

/// Choose the background for a page from the requested style and the page's
/// own content.
pub fn resolve_background(style: &BackgroundStyle, content: &[u8]) -> ResolvedBackground {
    match style {
        BackgroundStyle::Solid {
            source: ColorSource::Detect,
        } => ResolvedBackground::Solid {
            color: detect_background(content),
        },
        BackgroundStyle::Solid {
            source: ColorSource::Fixed(color),
        } => ResolvedBackground::Solid {
            color: color.clamped(),
        },
        BackgroundStyle::Gradient { stops } => ResolvedBackground::Gradient { stops: *stops },
    }
}

/// Drawing operators for one composed page, back to front.
///
/// `placement` is `None` for a page with no original content.
pub fn page_ops(
    plan: &TrimPlan,
    background: &ResolvedBackground,
    placement: Option<&PageLayout>,
    flip: bool,
) -> Vec<DrawOp> {
    let media = plan.media_rect();
    let mut ops = Vec::new();

    if flip {
        ops.push(DrawOp::SaveState);
        ops.push(DrawOp::Transform(flip_matrix(&media)));
    }

    match background {
        ResolvedBackground::Solid { color } => {
            // Scoped so the embedded page starts from the default black fill.
            ops.push(DrawOp::SaveState);
            ops.push(DrawOp::FillRgb(*color));
            ops.push(DrawOp::Rectangle(media));
            ops.push(DrawOp::Fill);
            ops.push(DrawOp::RestoreState);
        }
        ResolvedBackground::Gradient { .. } => {
            ops.push(DrawOp::SaveState);
            ops.push(DrawOp::Rectangle(media));
            ops.push(DrawOp::Clip);
            ops.push(DrawOp::EndPath);
            ops.push(DrawOp::PaintShading(SHADING_NAME.to_owned()));
            ops.push(DrawOp::RestoreState);
        }
    }

    if let Some(layout) = placement {
        let s = layout.scale;
        ops.push(DrawOp::SaveState);
        ops.push(DrawOp::Transform([s, 0.0, 0.0, s, layout.offset.0, layout.offset.1]));
        ops.push(DrawOp::PaintXObject(FORM_NAME.to_owned()));
        ops.push(DrawOp::RestoreState);
    }

    ops.extend(build_crop_marks(&plan.trim_rect()));

    if flip {
        ops.push(DrawOp::RestoreState);
    }
    ops
}

fn page_resources(form: Option<ObjectId>, shading: Option<ObjectId>) -> Dictionary {
    let mut resources = Dictionary::new();
    if let Some(form_id) = form {
        let mut xobjects = Dictionary::new();
        xobjects.set(FORM_NAME, Object::Reference(form_id));
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    if let Some(shading_id) = shading {
        let mut shadings = Dictionary::new();
        shadings.set(SHADING_NAME, Object::Reference(shading_id));
        resources.set("Shading", Object::Dictionary(shadings));
    }
    resources.set(
        "ProcSet",
        Object::Array(
            PROC_SET
                .iter()
                .map(|name| Object::Name(name.to_vec()))
                .collect(),
        ),
    );
    resources
}

/// Write the plan's boxes and drop the ones composition invalidates.
fn apply_boxes(doc: &mut PrintDocument, index: usize, plan: &TrimPlan) -> Result<()> {
    let media = plan.media_rect();
    doc.set_page_box(index, PageBox::Media, media)?;
    doc.set_page_box(index, PageBox::Trim, plan.trim_rect())?;
    doc.set_page_box(index, PageBox::Bleed, media)?;
    doc.clear_page_box(index, PageBox::Crop)?;
    doc.clear_rotation(index)
}

fn trim_size(plan: &TrimPlan) -> Size {
    Size::new(plan.trim_width, plan.trim_height)
}

/// Recompose page `index` in place.
#[instrument(skip(doc, plan, style), fields(trim_width = plan.trim_width))]
pub fn compose_page(
    doc: &mut PrintDocument,
    index: usize,
    plan: &TrimPlan,
    style: &BackgroundStyle,
    flip: bool,
) -> Result<PageResult> {
    if flip && doc.is_flipped(index)? {
        return Err(BleedmarkError::AlreadyFlipped { page: index });
    }

    let media = doc.media_box(index)?;
    let rotation = doc.rotation(index)?;
    let original = effective_size(&media, rotation);
    let layout = compute_layout(original, trim_size(plan), plan.bleed, &plan.margins)
        .map_err(|source| BleedmarkError::Layout {
            page: index,
            source,
        })?;

    let content = doc.content(index)?;
    let background = resolve_background(style, &content);

    let resources = doc.resources(index)?;
    let form_id = doc.create_form(EmbeddedForm {
        content,
        bbox: media,
        resources,
        matrix: form_matrix(&media, rotation),
    });
    let shading_id = match &background {
        ResolvedBackground::Gradient { stops } => {
            Some(doc.create_shading(stops, plan.media_height()))
        }
        ResolvedBackground::Solid { .. } => None,
    };

    let ops = page_ops(plan, &background, Some(&layout), flip);
    doc.replace_content(index, encode(&ops))?;
    doc.replace_resources(index, page_resources(Some(form_id), shading_id))?;
    apply_boxes(doc, index, plan)?;
    if flip {
        doc.mark_flipped(index)?;
    }

    debug!(
        index,
        scale = layout.scale,
        rotation = rotation.degrees(),
        flip,
        "page composed"
    );

    Ok(PageResult {
        page: index + 1,
        original: Some(original),
        trim: trim_size(plan),
        media: layout.media,
        safe_area: Some(layout.safe_rect.size()),
        scale: layout.scale,
        flipped: flip,
        background,
        blank: false,
    })
}

/// Insert a white page carrying only crop marks at `index`.
#[instrument(skip(doc, plan))]
pub fn synthesize_blank(
    doc: &mut PrintDocument,
    index: usize,
    plan: &TrimPlan,
    flip: bool,
) -> Result<PageResult> {
    let background = ResolvedBackground::Solid { color: Rgb::WHITE };

    doc.insert_page(index, plan.media_rect())?;
    let ops = page_ops(plan, &background, None, flip);
    doc.replace_content(index, encode(&ops))?;
    doc.replace_resources(index, page_resources(None, None))?;
    apply_boxes(doc, index, plan)?;
    if flip {
        doc.mark_flipped(index)?;
    }

    debug!(index, flip, "blank page synthesized");

    Ok(PageResult {
        page: index + 1,
        original: None,
        trim: trim_size(plan),
        media: plan.media_rect().size(),
        safe_area: None,
        scale: 1.0,
        flipped: flip,
        background,
        blank: true,
    })
}

/// Turn an already-composed page 180° about its MediaBox centre.
///
/// Boxes are left alone. Each page can be turned at most once, whether by
/// composition or by this call.
#[instrument(skip(doc))]
pub fn flip_composed_page(doc: &mut PrintDocument, index: usize) -> Result<()> {
    if doc.is_flipped(index)? {
        return Err(BleedmarkError::AlreadyFlipped { page: index });
    }

    let media = doc.media_box(index)?;
    let existing = doc.content(index)?;

    let mut wrapped = encode(&[DrawOp::SaveState, DrawOp::Transform(flip_matrix(&media))]);
    wrapped.push(b'\n');
    wrapped.extend_from_slice(&existing);
    wrapped.extend_from_slice(b"\nQ");

    doc.replace_content(index, wrapped)?;
    doc.mark_flipped(index)
}
