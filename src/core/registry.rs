//! Module discovery
//!
//! Builds the registry of buildable modules: the root descriptor's declared
//! module paths plus the expanded JS workspace globs, each confirmed to hold
//! a build descriptor. A descriptor that exists but does not parse keeps its
//! module in the registry with zero resolvable dependencies; discovery only
//! aborts when the root descriptor itself is missing or a declared path has
//! no descriptor at all.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::core::descriptor::{
    self, DeclaredDependency, DescriptorKind, PACKAGE_JSON_FILE, POM_FILE,
};
use crate::core::workspace::WorkspaceManifest;
use crate::error::RegistryError;

/// A buildable unit within the monorepo.
///
/// Immutable after discovery for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Unique identifier (artifactId / unscoped package name)
    pub name: String,
    /// Location relative to the workspace root
    pub path: PathBuf,
    /// Publishing namespace the module is published under
    pub group_id: Option<String>,
    /// Declared version
    pub version: Option<String>,
    /// Raw declared dependencies; the graph builder filters these to
    /// internal edges
    pub declared_dependencies: Vec<DeclaredDependency>,
    /// Whether the module carries a Maven descriptor
    pub has_pom: bool,
    /// Whether the module carries an npm descriptor
    pub has_package_json: bool,
    /// False when the descriptor existed but could not be parsed
    pub parsed: bool,
}

/// Ordered collection of discovered modules
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
}

impl ModuleRegistry {
    /// Discover all modules of a workspace.
    ///
    /// Order is the root descriptor's declaration order, followed by JS
    /// workspace matches in filesystem walk order.
    pub fn discover(
        root_dir: &Path,
        manifest: &WorkspaceManifest,
    ) -> Result<Self, RegistryError> {
        let root_descriptor = root_dir.join(&manifest.workspace.root_descriptor);
        if !root_descriptor.exists() {
            return Err(RegistryError::RootDescriptorMissing {
                path: root_descriptor,
            });
        }

        let root_content =
            std::fs::read_to_string(&root_descriptor).map_err(|e| RegistryError::IoError {
                path: root_descriptor.clone(),
                error: e.to_string(),
            })?;

        let mut module_paths: Vec<PathBuf> = descriptor::parse_pom_module_paths(&root_content)
            .into_iter()
            .map(PathBuf::from)
            .collect();

        // Maven-declared paths must hold a descriptor
        for rel in &module_paths {
            let dir = root_dir.join(rel);
            if !dir.join(POM_FILE).exists() && !dir.join(PACKAGE_JSON_FILE).exists() {
                return Err(RegistryError::ModuleDescriptorMissing { path: rel.clone() });
            }
        }

        // JS workspace globs expand against the filesystem; directories
        // without a package.json are not modules and are skipped
        for pattern in &manifest.workspace.js_workspaces {
            for rel in expand_workspace_glob(root_dir, pattern) {
                if root_dir.join(&rel).join(PACKAGE_JSON_FILE).exists()
                    && !module_paths.contains(&rel)
                {
                    module_paths.push(rel);
                }
            }
        }

        let mut modules = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();

        for rel in module_paths {
            let dir = root_dir.join(&rel);
            let module = match descriptor::parse_module_dir(&dir) {
                Ok(desc) => Module {
                    name: desc.name,
                    path: rel,
                    group_id: desc.group,
                    version: desc.version,
                    declared_dependencies: desc.dependencies,
                    has_pom: dir.join(POM_FILE).exists(),
                    has_package_json: dir.join(PACKAGE_JSON_FILE).exists(),
                    parsed: true,
                },
                Err(e) => {
                    tracing::warn!("Skipping dependency data for '{}': {e}", rel.display());
                    let fallback_name = rel
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| rel.display().to_string());
                    Module {
                        name: fallback_name,
                        path: rel.clone(),
                        group_id: None,
                        version: None,
                        declared_dependencies: Vec::new(),
                        has_pom: dir.join(POM_FILE).exists(),
                        has_package_json: dir.join(PACKAGE_JSON_FILE).exists(),
                        parsed: false,
                    }
                }
            };

            if !seen_names.insert(module.name.clone()) {
                tracing::warn!(
                    "Duplicate module name '{}' at '{}', keeping first occurrence",
                    module.name,
                    module.path.display()
                );
                continue;
            }
            modules.push(module);
        }

        Ok(Self { modules })
    }

    /// All modules in discovery order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Look up a module by name
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Whether a module name is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Module names in discovery order
    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    /// Modules whose descriptors failed to parse
    pub fn unparsed(&self) -> Vec<&Module> {
        self.modules.iter().filter(|m| !m.parsed).collect()
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Build a registry directly from modules, for tests
    #[cfg(test)]
    pub(crate) fn from_modules(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// Kind of the module's primary descriptor
    pub fn descriptor_kind(&self, name: &str) -> Option<DescriptorKind> {
        self.get(name).map(|m| {
            if m.has_pom {
                DescriptorKind::MavenPom
            } else {
                DescriptorKind::PackageJson
            }
        })
    }
}

/// Expand a workspace glob like `packages/*` against the filesystem.
///
/// `*` matches a single path component; matches are returned as paths
/// relative to `root_dir`, in walk order.
fn expand_workspace_glob(root_dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let depth = pattern.split('/').count();
    let regex_str = format!(
        "^{}$",
        pattern
            .split('/')
            .map(|seg| regex::escape(seg).replace(r"\*", "[^/]*"))
            .collect::<Vec<_>>()
            .join("/")
    );
    let Ok(matcher) = Regex::new(&regex_str) else {
        tracing::warn!("Ignoring invalid workspace glob '{pattern}'");
        return Vec::new();
    };

    WalkDir::new(root_dir)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root_dir).ok()?.to_path_buf();
            matcher
                .is_match(&rel.to_string_lossy())
                .then_some(rel)
        })
        .collect()
}
