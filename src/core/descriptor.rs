//! Build descriptor parsing
//!
//! Parses the two descriptor formats the workspace bridges - Maven `pom.xml`
//! and npm `package.json` - into one typed [`ModuleDescriptor`]. The Maven
//! side uses targeted text extraction rather than a full XML model: the
//! fields the orchestrator needs (identity, version, dependency coordinates)
//! are element-shaped and stable, and version rewriting is specified as text
//! substitution over the same files.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DescriptorError;

/// Descriptor file name for Maven modules
pub const POM_FILE: &str = "pom.xml";

/// Descriptor file name for npm packages
pub const PACKAGE_JSON_FILE: &str = "package.json";

/// Which descriptor format a [`ModuleDescriptor`] was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Maven `pom.xml`
    MavenPom,
    /// npm `package.json`
    PackageJson,
}

/// A dependency coordinate as declared in a descriptor.
///
/// `namespace` is the Maven groupId or the npm scope (with the leading `@`);
/// unscoped npm dependencies have no namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Publishing namespace the dependency is declared under
    pub namespace: Option<String>,
    /// Artifact/package identifier without the namespace
    pub name: String,
}

/// Typed view of one module descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    /// Module identifier (artifactId / unscoped package name)
    pub name: String,
    /// Publishing namespace (groupId / npm scope)
    pub group: Option<String>,
    /// Declared version
    pub version: Option<String>,
    /// Declared dependencies, in descriptor order
    pub dependencies: Vec<DeclaredDependency>,
    /// Source format
    pub kind: DescriptorKind,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static descriptor regex")
}

fn strip_blocks(content: &str, pattern: &str) -> String {
    re(pattern).replace_all(content, "").into_owned()
}

fn first_element(content: &str, element: &str) -> Option<String> {
    re(&format!(r"(?s)<{element}>\s*(.*?)\s*</{element}>"))
        .captures(content)
        .map(|c| c[1].trim().to_string())
}

/// Parse a Maven `pom.xml` into a [`ModuleDescriptor`].
///
/// Identity fields are resolved after removing the `<parent>`,
/// `<dependencyManagement>`, `<dependencies>` and `<build>` regions, so the
/// first remaining `groupId`/`artifactId`/`version` elements belong to the
/// project itself. A missing project `groupId` or `version` falls back to
/// the parent's, matching inheritance.
pub fn parse_pom(content: &str, path: &Path) -> Result<ModuleDescriptor, DescriptorError> {
    let without_comments = strip_blocks(content, r"(?s)<!--.*?-->");

    let parent_block = first_element(&without_comments, "parent");
    let without_mgmt = strip_blocks(
        &without_comments,
        r"(?s)<dependencyManagement>.*?</dependencyManagement>",
    );

    // Dependency coordinates come from the remaining <dependencies> sections
    let mut dependencies = Vec::new();
    for dep in re(r"(?s)<dependency>(.*?)</dependency>").captures_iter(&without_mgmt) {
        let block = &dep[1];
        let Some(artifact) = first_element(block, "artifactId") else {
            continue;
        };
        dependencies.push(DeclaredDependency {
            namespace: first_element(block, "groupId"),
            name: artifact,
        });
    }

    let project_only = strip_blocks(
        &strip_blocks(&without_mgmt, r"(?s)<dependencies>.*?</dependencies>"),
        r"(?s)<build>.*?</build>",
    );
    let project_only = strip_blocks(&project_only, r"(?s)<parent>.*?</parent>");

    let name = first_element(&project_only, "artifactId").ok_or_else(|| {
        DescriptorError::MissingField {
            path: path.to_path_buf(),
            field: "artifactId".to_string(),
        }
    })?;

    let parent_group = parent_block.as_deref().and_then(|p| first_element(p, "groupId"));
    let parent_version = parent_block.as_deref().and_then(|p| first_element(p, "version"));

    Ok(ModuleDescriptor {
        name,
        group: first_element(&project_only, "groupId").or(parent_group),
        version: first_element(&project_only, "version").or(parent_version),
        dependencies,
        kind: DescriptorKind::MavenPom,
    })
}

/// Module paths declared in a root `pom.xml` `<modules>` section
pub fn parse_pom_module_paths(content: &str) -> Vec<String> {
    let without_comments = strip_blocks(content, r"(?s)<!--.*?-->");
    let Some(modules_block) = first_element(&without_comments, "modules") else {
        return Vec::new();
    };
    re(r"(?s)<module>\s*(.*?)\s*</module>")
        .captures_iter(&modules_block)
        .map(|c| c[1].trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

/// Raw shape of the package.json fields the orchestrator reads
#[derive(Debug, Deserialize)]
struct RawPackageJson {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// Split an npm package name into (scope, bare name)
fn split_scoped_name(name: &str) -> (Option<String>, String) {
    if let Some(rest) = name.strip_prefix('@') {
        if let Some((scope, bare)) = rest.split_once('/') {
            return (Some(format!("@{scope}")), bare.to_string());
        }
    }
    (None, name.to_string())
}

/// Parse an npm `package.json` into a [`ModuleDescriptor`]
pub fn parse_package_json(content: &str, path: &Path) -> Result<ModuleDescriptor, DescriptorError> {
    let raw: RawPackageJson =
        serde_json::from_str(content).map_err(|e| DescriptorError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

    if raw.name.is_empty() {
        return Err(DescriptorError::MissingField {
            path: path.to_path_buf(),
            field: "name".to_string(),
        });
    }

    let (group, name) = split_scoped_name(&raw.name);

    let dependencies = raw
        .dependencies
        .keys()
        .chain(raw.dev_dependencies.keys())
        .map(|dep_name| {
            let (namespace, bare) = split_scoped_name(dep_name);
            DeclaredDependency { namespace, name: bare }
        })
        .collect();

    Ok(ModuleDescriptor {
        name,
        group,
        version: raw.version,
        dependencies,
        kind: DescriptorKind::PackageJson,
    })
}

/// Read and parse whichever descriptor a module directory holds,
/// preferring the Maven descriptor when both are present.
pub fn parse_module_dir(dir: &Path) -> Result<ModuleDescriptor, DescriptorError> {
    let pom_path = dir.join(POM_FILE);
    if pom_path.exists() {
        let content = std::fs::read_to_string(&pom_path).map_err(|e| DescriptorError::IoError {
            path: pom_path.clone(),
            error: e.to_string(),
        })?;
        return parse_pom(&content, &pom_path);
    }

    let json_path = dir.join(PACKAGE_JSON_FILE);
    let content = std::fs::read_to_string(&json_path).map_err(|e| DescriptorError::IoError {
        path: json_path.clone(),
        error: e.to_string(),
    })?;
    parse_package_json(&content, &json_path)
}
