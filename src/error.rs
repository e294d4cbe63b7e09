//! Error types for monoforge
//!
//! Domain-specific error types using thiserror.
//!
//! Per-module build failures are deliberately NOT errors: they are recorded
//! as [`crate::core::report::BuildResult`] outcomes and never propagate past
//! the executor boundary. Only configuration-class failures abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Workspace configuration errors (fatal, abort before scheduling)
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Workspace manifest not found
    #[error("Workspace manifest not found at '{path}'. Run 'monoforge init' to create one.")]
    ManifestNotFound { path: PathBuf },

    /// Workspace manifest parse error
    #[error("Failed to parse workspace manifest: {source}")]
    ManifestParse { source: toml::de::Error },

    /// Requested module is not in the registry
    #[error("Module '{name}' not found in the workspace")]
    UnknownModule { name: String },

    /// IO error while reading workspace configuration
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Module discovery errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Root descriptor missing
    #[error("Root descriptor not found at '{path}'")]
    RootDescriptorMissing { path: PathBuf },

    /// A module path declared in the root descriptor has no descriptor file
    #[error("Declared module path '{path}' has no build descriptor")]
    ModuleDescriptorMissing { path: PathBuf },

    /// IO error during discovery
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Descriptor parsing errors (recoverable per module, see registry policy)
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Required field missing from descriptor
    #[error("Descriptor '{path}' is missing required field '{field}'")]
    MissingField { path: PathBuf, field: String },

    /// Descriptor could not be parsed
    #[error("Failed to parse descriptor '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// IO error reading descriptor
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Dependency graph invariant violations.
///
/// Reserved for unrecoverable internal invariants. Cycles are NOT reported
/// through this type: the scheduler degrades them to a warning and a
/// combined final level.
#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge references a node the registry does not know
    #[error("Dependency graph references unknown module '{name}'")]
    UnknownNode { name: String },
}

/// Selective versioning errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// Version string is not valid semver
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Module has no current version to bump
    #[error("Module '{name}' has no version in its descriptor")]
    NoCurrentVersion { name: String },

    /// Version element could not be located for substitution
    #[error("Could not locate version field in '{path}'")]
    VersionNotFound { path: PathBuf },

    /// IO error while rewriting a descriptor
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Top-level monoforge error type
#[derive(Error, Debug)]
pub enum MonoforgeError {
    /// Workspace error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Descriptor error
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Sync error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO error
    #[error("IO error: {source}")]
    Io { source: std::io::Error },

    /// Generic error
    #[error("{0}")]
    Generic(String),
}
