//! Hugging Face Hub dataset acquisition.
//!
//! One-command download of a detection dataset repo into the local HF
//! cache. Authentication comes from `--token` or the `HF_TOKEN`
//! environment variable.

use std::collections::BTreeSet;
use std::path::PathBuf;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use log::info;

use crate::error::YoloprepError;

/// The dataset fetched when no repo is given.
pub const DEFAULT_DATASET: &str = "detection-datasets/coco";

/// Options for a download run.
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// Hub dataset repo, e.g. `detection-datasets/coco`.
    pub repo_id: String,
    /// Optional git revision.
    pub revision: Option<String>,
    /// Explicit token; falls back to `HF_TOKEN`.
    pub token: Option<String>,
}

/// Paths of the files placed in the local cache.
#[derive(Clone, Debug)]
pub struct DownloadResult {
    pub repo_id: String,
    pub files: Vec<PathBuf>,
}

/// Downloads every file of a Hub dataset repo into the local cache.
pub fn download_dataset(opts: &DownloadOptions) -> Result<DownloadResult, YoloprepError> {
    let mut builder = ApiBuilder::new().with_progress(true);

    let token_from_env = std::env::var("HF_TOKEN").ok();
    let effective_token = opts.token.clone().or(token_from_env);
    if effective_token.is_some() {
        builder = builder.with_token(effective_token);
    }

    let api = builder.build().map_err(|source| YoloprepError::HfApi {
        repo_id: opts.repo_id.clone(),
        message: source.to_string(),
    })?;

    let repo = if let Some(revision) = opts.revision.as_ref() {
        api.repo(Repo::with_revision(
            opts.repo_id.clone(),
            RepoType::Dataset,
            revision.clone(),
        ))
    } else {
        api.dataset(opts.repo_id.clone())
    };

    let repo_info = repo.info().map_err(|source| YoloprepError::HfApi {
        repo_id: opts.repo_id.clone(),
        message: source.to_string(),
    })?;

    let remote_files = sibling_paths(
        repo_info
            .siblings
            .iter()
            .map(|sibling| sibling.rfilename.clone()),
    );
    info!(
        "downloading {} file(s) from '{}'",
        remote_files.len(),
        opts.repo_id
    );

    let mut files = Vec::with_capacity(remote_files.len());
    for remote_path in remote_files {
        let local = repo
            .download(&remote_path)
            .map_err(|source| YoloprepError::HfAcquire {
                repo_id: opts.repo_id.clone(),
                message: format!("failed downloading '{}': {}", remote_path, source),
            })?;
        files.push(local);
    }

    Ok(DownloadResult {
        repo_id: opts.repo_id.clone(),
        files,
    })
}

/// Deduplicates and orders the remote file listing so downloads are
/// deterministic.
fn sibling_paths(raw: impl Iterator<Item = String>) -> Vec<String> {
    let ordered: BTreeSet<String> = raw.collect();
    ordered.into_iter().collect()
}
