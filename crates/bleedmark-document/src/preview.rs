// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview support — page inspection, the trimmed "flipbook" view of a
// prepared document, and the seam for an external rasterizer.

use bleedmark_core::JobMetadata;
use bleedmark_core::error::Result;
use bleedmark_core::units::to_inches;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::geometry::{Rotation, effective_size};
use crate::job::JobWorkspace;
use crate::pdf::document::{PageBox, PrintDocument};

/// Displayed size of one page, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 0-based.
    pub index: usize,
    pub width_in: f64,
    pub height_in: f64,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Report every page's rotation-compensated size.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn inspect_pages(bytes: &[u8]) -> Result<Vec<PageInfo>> {
    let doc = PrintDocument::open(bytes)?;
    (0..doc.page_count())
        .map(|index| {
            let size = effective_size(&doc.media_box(index)?, doc.rotation(index)?);
            Ok(PageInfo {
                index,
                width_in: round3(to_inches(size.width)),
                height_in: round3(to_inches(size.height)),
            })
        })
        .collect()
}

/// Turn a prepared document into what the reader will hold after cutting:
/// every page cropped to its trim area, and back pages turned upright again
/// when the document was prepared for duplex.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn flipbook_document(bytes: &[u8], bleed: f64, duplex_flip: bool) -> Result<Vec<u8>> {
    let mut doc = PrintDocument::open(bytes)?;

    for index in 0..doc.page_count() {
        let media = doc.media_box(index)?;
        let trimmed = media.inset(bleed);
        if trimmed.width() > 0.0 && trimmed.height() > 0.0 {
            doc.set_page_box(index, PageBox::Media, trimmed)?;
        } else {
            warn!(index, bleed, "bleed exceeds page, keeping MediaBox");
        }
        for kind in [PageBox::Trim, PageBox::Bleed, PageBox::Crop] {
            doc.clear_page_box(index, kind)?;
        }
        if duplex_flip && index % 2 == 1 {
            doc.set_rotation(index, Rotation::Half)?;
        }
    }

    debug!(pages = doc.page_count(), "flipbook prepared");
    doc.save()
}

/// Renders PDF pages to images. Provided by the host application.
pub trait Rasterizer {
    /// Render every page of `pdf` at `dpi`, returning one encoded image per
    /// page in page order.
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>>;
}

/// Render the flipbook view of a prepared document.
pub fn render_flipbook<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    output: &[u8],
    metadata: &JobMetadata,
    dpi: u32,
) -> Result<Vec<Vec<u8>>> {
    let flipbook = flipbook_document(output, metadata.bleed, metadata.duplex_flip)?;
    rasterizer.render(&flipbook, dpi)
}

/// Render the flipbook view of a finished job, after checking its output
/// against the recorded hash.
pub fn render_job_flipbook<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    workspace: &JobWorkspace,
    dpi: u32,
) -> Result<Vec<Vec<u8>>> {
    let (output, metadata) = workspace.read_verified_output()?;
    render_flipbook(rasterizer, &output, &metadata, dpi)
}
