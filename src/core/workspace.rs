//! Workspace manifest (monoforge.toml) parsing and validation
//!
//! The workspace manifest is the main configuration file for a monoforge
//! workspace. It names the internal publishing namespaces, points at the
//! root build descriptor, and carries defaults for the build executor and
//! the downstream notification targets.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::defaults;
use crate::error::WorkspaceError;

/// The workspace manifest (monoforge.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceManifest {
    /// Workspace identity and descriptor locations
    pub workspace: WorkspaceConfig,

    /// Build executor defaults
    #[serde(default)]
    pub build: BuildConfig,

    /// Downstream notification targets
    #[serde(default)]
    pub downstream: DownstreamConfig,
}

/// Workspace-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceConfig {
    /// Workspace name
    pub name: String,

    /// Internal Maven publishing namespace (groupId)
    pub group: String,

    /// Internal npm scope (e.g. "@example"), if the JS side is scoped
    #[serde(default)]
    pub js_scope: Option<String>,

    /// Root descriptor path, relative to the workspace root
    #[serde(default = "default_root_descriptor")]
    pub root_descriptor: String,

    /// JS workspace globs expanded against the filesystem (e.g. "packages/*")
    #[serde(default)]
    pub js_workspaces: Vec<String>,
}

fn default_root_descriptor() -> String {
    "pom.xml".to_string()
}

/// Build executor defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Build tool executable
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Default goal/action
    #[serde(default = "default_goal")]
    pub goal: String,

    /// Concurrent module builds within a level
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Per-module wall-clock timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip tests by default
    #[serde(default)]
    pub skip_tests: bool,
}

fn default_tool() -> String {
    defaults::DEFAULT_BUILD_TOOL.to_string()
}

fn default_goal() -> String {
    defaults::DEFAULT_GOAL.to_string()
}

fn default_timeout_secs() -> u64 {
    defaults::DEFAULT_MODULE_TIMEOUT_SECS
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            goal: default_goal(),
            jobs: None,
            timeout_secs: default_timeout_secs(),
            skip_tests: false,
        }
    }
}

/// Downstream repositories notified after a release build
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DownstreamConfig {
    /// Repositories in "owner/name" form
    #[serde(default)]
    pub repos: Vec<String>,

    /// Base branch the pull request targets
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

impl WorkspaceManifest {
    /// Load the workspace manifest from a workspace root directory
    pub fn load(root_dir: &Path) -> Result<Self, WorkspaceError> {
        let path = root_dir.join(defaults::WORKSPACE_MANIFEST);
        if !path.exists() {
            return Err(WorkspaceError::ManifestNotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| WorkspaceError::IoError {
            path: path.clone(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| WorkspaceError::ManifestParse { source: e })
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Whether a declared dependency namespace is one of ours.
    ///
    /// Maven dependencies always carry a groupId; npm dependencies carry a
    /// scope only when the workspace publishes scoped packages. An unscoped
    /// dependency can only be internal in an unscoped JS workspace.
    pub fn is_internal_namespace(&self, namespace: Option<&str>) -> bool {
        match namespace {
            Some(ns) => ns == self.workspace.group || self.workspace.js_scope.as_deref() == Some(ns),
            None => self.workspace.js_scope.is_none(),
        }
    }
}

/// Validate a workspace manifest file and report all errors found,
/// not just the first one.
pub fn validate_workspace_manifest(path: &Path) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            errors.push(format!("Failed to read workspace manifest: {e}"));
            return Err(errors);
        }
    };

    let value: toml::Value = match toml::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            errors.push(format!("Invalid TOML syntax: {e}"));
            return Err(errors);
        }
    };

    let workspace = match value.get("workspace") {
        Some(w) => w,
        None => {
            errors.push("Missing required [workspace] section".to_string());
            return Err(errors);
        }
    };

    for field in ["name", "group"] {
        match workspace.get(field).and_then(|v| v.as_str()) {
            None => errors.push(format!("Missing required field 'workspace.{field}'")),
            Some("") => errors.push(format!("Field 'workspace.{field}' cannot be empty")),
            Some(_) => {}
        }
    }

    if let Some(scope) = workspace.get("js_scope").and_then(|v| v.as_str()) {
        if !scope.starts_with('@') {
            errors.push(format!("Field 'workspace.js_scope' must start with '@', got '{scope}'"));
        }
    }

    if let Some(build) = value.get("build") {
        if let Some(jobs) = build.get("jobs").and_then(toml::Value::as_integer) {
            if jobs < 1 {
                errors.push(format!("Field 'build.jobs' must be >= 1, got {jobs}"));
            }
        }
        if let Some(timeout) = build.get("timeout_secs").and_then(toml::Value::as_integer) {
            if timeout < 1 {
                errors.push(format!("Field 'build.timeout_secs' must be >= 1, got {timeout}"));
            }
        }
    }

    if let Some(downstream) = value.get("downstream") {
        if let Some(repos) = downstream.get("repos").and_then(|v| v.as_array()) {
            for repo in repos {
                if let Some(r) = repo.as_str() {
                    if r.split('/').filter(|p| !p.is_empty()).count() != 2 {
                        errors.push(format!(
                            "Downstream repo '{r}' must be in 'owner/name' form"
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
