// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job workspace — one directory per processing job holding the uploaded
// input, the prepared output, and the metadata the preview side reads.

use std::path::{Path, PathBuf};

use bleedmark_core::error::{BleedmarkError, Result};
use bleedmark_core::{JobId, JobMetadata};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

pub const INPUT_FILE: &str = "input.pdf";
pub const OUTPUT_FILE: &str = "output.pdf";
pub const METADATA_FILE: &str = "job_info.json";

/// SHA-256 of `data` as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Handle on a job's working directory.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    id: JobId,
    dir: PathBuf,
}

impl JobWorkspace {
    /// Create a fresh job directory under `base`.
    #[instrument(skip_all, fields(base = %base.as_ref().display()))]
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let id = JobId::new();
        let dir = base.as_ref().join(id.as_str());
        std::fs::create_dir_all(&dir)?;
        info!(job = %id, "job workspace created");
        Ok(Self { id, dir })
    }

    /// Reopen an existing job. The id must be well formed and its directory
    /// must exist.
    pub fn open(base: impl AsRef<Path>, id: &str) -> Result<Self> {
        let id = JobId::parse(id)
            .ok_or_else(|| BleedmarkError::InvalidJob(format!("malformed job id {id:?}")))?;
        let dir = base.as_ref().join(id.as_str());
        if !dir.is_dir() {
            return Err(BleedmarkError::InvalidJob(format!("no such job {id}")));
        }
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(INPUT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn store_input(&self, bytes: &[u8]) -> Result<()> {
        write_atomically(&self.input_path(), bytes)?;
        debug!(job = %self.id, bytes_len = bytes.len(), "input stored");
        Ok(())
    }

    pub fn read_input(&self) -> Result<Vec<u8>> {
        std::fs::read(self.input_path()).map_err(|err| self.missing(INPUT_FILE, err))
    }

    /// Write the prepared document and return its SHA-256.
    pub fn write_output(&self, bytes: &[u8]) -> Result<String> {
        write_atomically(&self.output_path(), bytes)?;
        Ok(hash_bytes(bytes))
    }

    pub fn read_output(&self) -> Result<Vec<u8>> {
        std::fs::read(self.output_path()).map_err(|err| self.missing(OUTPUT_FILE, err))
    }

    /// Read the output and check it against the hash in the metadata.
    pub fn read_verified_output(&self) -> Result<(Vec<u8>, JobMetadata)> {
        let metadata = self.read_metadata()?;
        let bytes = self.read_output()?;
        let actual = hash_bytes(&bytes);
        if actual != metadata.output_sha256 {
            return Err(BleedmarkError::InvalidJob(format!(
                "{OUTPUT_FILE} of job {} has hash {actual}, expected {}",
                self.id, metadata.output_sha256
            )));
        }
        Ok((bytes, metadata))
    }

    pub fn write_metadata(&self, metadata: &JobMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(metadata)?;
        write_atomically(&self.metadata_path(), &json)
    }

    pub fn read_metadata(&self) -> Result<JobMetadata> {
        let raw = std::fs::read(self.metadata_path())
            .map_err(|err| self.missing(METADATA_FILE, err))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn missing(&self, file: &str, err: std::io::Error) -> BleedmarkError {
        if err.kind() == std::io::ErrorKind::NotFound {
            BleedmarkError::InvalidJob(format!("job {} has no {file}", self.id))
        } else {
            BleedmarkError::Io(err)
        }
    }
}

/// Write through a sibling temp file and rename, so readers never observe
/// a half-written file.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    std::fs::write(&partial, bytes)?;
    if let Err(err) = std::fs::rename(&partial, path) {
        let _ = std::fs::remove_file(&partial);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn metadata(id: &JobId, sha: String) -> JobMetadata {
        JobMetadata {
            job_id: id.clone(),
            created_at: Utc::now(),
            pages: Vec::new(),
            trim_width: 756.0,
            trim_height: 425.25,
            bleed: 9.0,
            duplex_flip: true,
            output_sha256: sha,
        }
    }

    #[test]
    fn hash_known_values() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
        assert_eq!(
            hash_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn create_then_open() {
        let base = tempfile::tempdir().unwrap();
        let job = JobWorkspace::create(base.path()).unwrap();
        assert!(job.dir().is_dir());

        let reopened = JobWorkspace::open(base.path(), job.id().as_str()).unwrap();
        assert_eq!(reopened.id(), job.id());
        assert_eq!(reopened.input_path(), job.dir().join("input.pdf"));
    }

    #[test]
    fn open_rejects_bad_ids() {
        let base = tempfile::tempdir().unwrap();
        let err = JobWorkspace::open(base.path(), "../../etc").unwrap_err();
        assert!(matches!(err, BleedmarkError::InvalidJob(_)));
        let err = JobWorkspace::open(base.path(), "abcd1234").unwrap_err();
        assert!(matches!(err, BleedmarkError::InvalidJob(_)));
    }

    #[test]
    fn files_round_trip() {
        let base = tempfile::tempdir().unwrap();
        let job = JobWorkspace::create(base.path()).unwrap();

        job.store_input(b"%PDF-1.5 input").unwrap();
        assert_eq!(job.read_input().unwrap(), b"%PDF-1.5 input");

        let sha = job.write_output(b"%PDF-1.5 output").unwrap();
        job.write_metadata(&metadata(job.id(), sha.clone())).unwrap();

        let (bytes, meta) = job.read_verified_output().unwrap();
        assert_eq!(bytes, b"%PDF-1.5 output");
        assert_eq!(meta.output_sha256, sha);
        assert_eq!(&meta.job_id, job.id());
        assert!(!job.dir().join("output.pdf.partial").exists());
    }

    #[test]
    fn tampered_output_is_detected() {
        let base = tempfile::tempdir().unwrap();
        let job = JobWorkspace::create(base.path()).unwrap();
        let sha = job.write_output(b"original").unwrap();
        job.write_metadata(&metadata(job.id(), sha)).unwrap();
        std::fs::write(job.output_path(), b"changed").unwrap();

        assert!(matches!(
            job.read_verified_output(),
            Err(BleedmarkError::InvalidJob(_))
        ));
    }

    #[test]
    fn missing_files_are_job_errors() {
        let base = tempfile::tempdir().unwrap();
        let job = JobWorkspace::create(base.path()).unwrap();
        assert!(matches!(job.read_input(), Err(BleedmarkError::InvalidJob(_))));
        assert!(matches!(
            job.read_metadata(),
            Err(BleedmarkError::InvalidJob(_))
        ));
    }
}
