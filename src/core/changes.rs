//! Change detection
//!
//! Maps the files changed between two git refs onto workspace modules. A
//! change to the build infrastructure itself (root descriptor, workspace
//! manifest) flips the all-modules flag instead of naming individual
//! modules. The last comparison is cached under the state directory; the
//! cache is keyed by both commit SHAs and a fingerprint of the root
//! descriptor, and is best-effort only.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::defaults;
use crate::core::registry::ModuleRegistry;
use crate::core::workspace::WorkspaceManifest;
use crate::infra::git::{GitError, GitOperations};

/// Errors that can occur during change detection
#[derive(Error, Debug)]
pub enum ChangesError {
    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Result of one change detection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Build-infrastructure files changed; every module counts as changed
    pub all_modules: bool,
    /// Changed module names in registry order (empty when `all_modules`)
    pub modules: Vec<String>,
}

impl ChangeSet {
    /// Concrete module list, expanding the all-modules flag
    pub fn resolve(&self, registry: &ModuleRegistry) -> Vec<String> {
        if self.all_modules {
            registry.names()
        } else {
            self.modules.clone()
        }
    }

    /// Whether nothing relevant changed
    pub fn is_empty(&self) -> bool {
        !self.all_modules && self.modules.is_empty()
    }
}

/// Persisted result of the last comparison
#[derive(Debug, Serialize, Deserialize)]
struct ChangesCache {
    base_sha: String,
    head_sha: String,
    root_fingerprint: String,
    #[serde(flatten)]
    change_set: ChangeSet,
}

/// Detect the modules changed between `base` and `head`.
///
/// `use_cache` short-circuits when the same comparison was already made
/// against an unchanged root descriptor.
pub async fn detect_changes(
    project_dir: &Path,
    registry: &ModuleRegistry,
    manifest: &WorkspaceManifest,
    base: &str,
    head: &str,
    use_cache: bool,
) -> Result<ChangeSet, ChangesError> {
    let ops = GitOperations::new(project_dir.to_path_buf());
    let base_sha = ops.resolve_ref(base)?;
    let head_sha = ops.resolve_ref(head)?;

    let root_path = project_dir.join(&manifest.workspace.root_descriptor);
    let root_content =
        std::fs::read_to_string(&root_path).map_err(|e| ChangesError::IoError {
            path: root_path,
            error: e.to_string(),
        })?;
    let root_fingerprint = hex::encode(Sha256::digest(root_content.as_bytes()));

    let cache_path = project_dir
        .join(defaults::STATE_DIR)
        .join(defaults::CHANGES_CACHE_FILE);

    if use_cache {
        if let Some(cached) = load_cache(&cache_path, &base_sha, &head_sha, &root_fingerprint) {
            tracing::debug!("Using cached change detection result");
            return Ok(cached);
        }
    }

    let files = ops.changed_files(&base_sha, &head_sha).await?;
    let change_set = map_files_to_modules(&files, registry, manifest);

    store_cache(
        &cache_path,
        &ChangesCache {
            base_sha,
            head_sha,
            root_fingerprint,
            change_set: change_set.clone(),
        },
    );

    Ok(change_set)
}

/// Attribute changed files to modules by path prefix.
///
/// Changes to the root descriptor or the workspace manifest mean the build
/// infrastructure itself moved, so everything counts as changed.
pub fn map_files_to_modules(
    files: &[String],
    registry: &ModuleRegistry,
    manifest: &WorkspaceManifest,
) -> ChangeSet {
    let infra_files = [
        manifest.workspace.root_descriptor.as_str(),
        defaults::WORKSPACE_MANIFEST,
    ];
    if files.iter().any(|f| infra_files.contains(&f.as_str())) {
        return ChangeSet {
            all_modules: true,
            modules: Vec::new(),
        };
    }

    let modules = registry
        .modules()
        .iter()
        .filter(|module| {
            files
                .iter()
                .any(|file| Path::new(file).starts_with(&module.path))
        })
        .map(|module| module.name.clone())
        .collect();

    ChangeSet {
        all_modules: false,
        modules,
    }
}

fn load_cache(
    path: &Path,
    base_sha: &str,
    head_sha: &str,
    root_fingerprint: &str,
) -> Option<ChangeSet> {
    let content = std::fs::read_to_string(path).ok()?;
    let cache: ChangesCache = serde_json::from_str(&content).ok()?;
    (cache.base_sha == base_sha
        && cache.head_sha == head_sha
        && cache.root_fingerprint == root_fingerprint)
        .then_some(cache.change_set)
}

fn store_cache(path: &Path, cache: &ChangesCache) {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(cache)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    };
    if let Err(e) = write() {
        tracing::warn!("Could not persist changes cache: {e}");
    }
}
