// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — runs one preparation pass over a whole document:
// deletions, trim-height derivation, blank insertion, per-page composition,
// and persistence.

use std::collections::BTreeSet;

use bleedmark_core::error::{BleedmarkError, Result};
use bleedmark_core::{JobMetadata, LayoutSpec, PageResult, TrimPlan, VerificationReport};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::compose::{compose_page, synthesize_blank};
use crate::geometry::{compute_trim_height, effective_size};
use crate::job::JobWorkspace;
use crate::pdf::document::PrintDocument;
use crate::verify::verify_document;

/// Where the separator page goes: directly after the cover.
pub const BLANK_PAGE_INDEX: usize = 1;

/// Result of [`process`].
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub pages: Vec<PageResult>,
    pub plan: TrimPlan,
    pub bytes: Vec<u8>,
}

/// Result of [`process_bytes`]: the saved document plus its verification.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageResult>,
    pub plan: TrimPlan,
    pub verification: VerificationReport,
}

/// Remove pages by their original 0-based index. Indices past the end are
/// skipped.
fn delete_pages(doc: &mut PrintDocument, indices: &BTreeSet<usize>) -> Result<()> {
    let count = doc.page_count();
    for &index in indices.iter().rev() {
        if index >= count {
            warn!(index, count, "ignoring deletion of nonexistent page");
            continue;
        }
        doc.delete_page(index)?;
    }
    if doc.page_count() == 0 {
        return Err(BleedmarkError::DocumentEmpty {
            deleted: indices.iter().copied().collect(),
        });
    }
    Ok(())
}

/// Reject layouts no page can be built from, before any page is touched.
fn validate_layout(spec: &LayoutSpec) -> Result<()> {
    if !(spec.trim_width.is_finite() && spec.trim_width > 0.0) {
        return Err(BleedmarkError::Config(format!(
            "trim width must be positive, got {}pt",
            spec.trim_width
        )));
    }
    if !(spec.bleed.is_finite() && spec.bleed >= 0.0) {
        return Err(BleedmarkError::Config(format!(
            "bleed must not be negative, got {}pt",
            spec.bleed
        )));
    }
    let m = &spec.margins;
    if [m.left, m.right, m.top, m.bottom]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(BleedmarkError::Config(format!(
            "margins must not be negative, got {m:?}"
        )));
    }
    Ok(())
}

/// Fix the trim height for the whole run from the first page's displayed
/// aspect ratio.
pub fn derive_trim_plan(doc: &PrintDocument, spec: &LayoutSpec) -> Result<TrimPlan> {
    let media = doc.media_box(0)?;
    let size = effective_size(&media, doc.rotation(0)?);
    let trim_height = compute_trim_height(size.width, size.height, spec.trim_width, &spec.margins)
        .map_err(|source| BleedmarkError::Layout { page: 0, source })?;
    Ok(TrimPlan {
        trim_width: spec.trim_width,
        trim_height,
        bleed: spec.bleed,
        margins: spec.margins,
    })
}

/// Prepare every page of `doc` and serialise the result.
#[instrument(skip_all, fields(pages = doc.page_count(), duplex = spec.duplex_flip))]
pub fn process(mut doc: PrintDocument, spec: &LayoutSpec) -> Result<ProcessOutcome> {
    validate_layout(spec)?;
    delete_pages(&mut doc, &spec.delete_pages)?;
    let plan = derive_trim_plan(&doc, spec)?;
    info!(
        trim_width = plan.trim_width,
        trim_height = plan.trim_height,
        bleed = plan.bleed,
        "trim plan derived"
    );

    let flip_at = |index: usize| spec.duplex_flip && index % 2 == 1;

    let mut blank = None;
    if spec.insert_blank {
        let at = BLANK_PAGE_INDEX.min(doc.page_count());
        blank = Some((at, synthesize_blank(&mut doc, at, &plan, flip_at(at))?));
    }

    let mut pages = Vec::with_capacity(doc.page_count());
    for index in 0..doc.page_count() {
        match &blank {
            Some((at, result)) if *at == index => pages.push(result.clone()),
            _ => pages.push(compose_page(
                &mut doc,
                index,
                &plan,
                &spec.background,
                flip_at(index),
            )?),
        }
    }

    let bytes = doc.save()?;
    info!(pages = pages.len(), output_bytes = bytes.len(), "document prepared");
    Ok(ProcessOutcome { pages, plan, bytes })
}

/// Open, prepare, save, and verify a document held in memory.
#[instrument(skip_all, fields(bytes_len = input.len()))]
pub fn process_bytes(input: &[u8], spec: &LayoutSpec) -> Result<ProcessedDocument> {
    let doc = PrintDocument::open(input)?;
    let outcome = process(doc, spec)?;
    let verification = verify_document(&outcome.bytes, &outcome.plan)?;
    if !verification.all_pass() {
        warn!("prepared document failed verification");
    }
    Ok(ProcessedDocument {
        bytes: outcome.bytes,
        pages: outcome.pages,
        plan: outcome.plan,
        verification,
    })
}

/// Prepare a job's stored input. The output and its metadata are written
/// only once processing has succeeded.
#[instrument(skip_all, fields(job = %workspace.id()))]
pub fn process_job(workspace: &JobWorkspace, spec: &LayoutSpec) -> Result<JobMetadata> {
    let input = workspace.read_input()?;
    let processed = process_bytes(&input, spec)?;

    let output_sha256 = workspace.write_output(&processed.bytes)?;
    let metadata = JobMetadata {
        job_id: workspace.id().clone(),
        created_at: Utc::now(),
        pages: processed.pages,
        trim_width: processed.plan.trim_width,
        trim_height: processed.plan.trim_height,
        bleed: processed.plan.bleed,
        duplex_flip: spec.duplex_flip,
        output_sha256,
    };
    if let Err(err) = workspace.write_metadata(&metadata) {
        // An output without metadata would look like a finished job.
        if let Err(cleanup) = std::fs::remove_file(workspace.output_path()) {
            warn!(error = %cleanup, "could not remove output after metadata failure");
        }
        return Err(err);
    }
    info!(pages = metadata.pages.len(), "job complete");
    Ok(metadata)
}
