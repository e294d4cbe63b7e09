//! Selective versioning
//!
//! Bumps or sets module versions across both ecosystems by rewriting the
//! version field of `pom.xml` and `package.json` in place. The rewrite is
//! plain text substitution so untouched formatting, comments and key order
//! survive; the two descriptors of a dual-ecosystem module always end up
//! agreeing.

use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};

use crate::core::descriptor::{PACKAGE_JSON_FILE, POM_FILE};
use crate::core::registry::Module;
use crate::error::SyncError;

/// Which part of the version to bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    /// Breaking change
    Major,
    /// New functionality
    Minor,
    /// Fix only
    Patch,
}

impl std::str::FromStr for BumpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!("invalid bump kind '{other}', expected major, minor or patch")),
        }
    }
}

/// Target version for a sync run
#[derive(Debug, Clone)]
pub enum VersionTarget {
    /// Set an explicit version
    Set(String),
    /// Bump the module's current version
    Bump(BumpKind),
}

/// Result of syncing one module's version
#[derive(Debug)]
pub struct SyncOutcome {
    /// Module name
    pub module: String,
    /// Version before the sync, when the descriptor declared one
    pub from: Option<String>,
    /// Version after the sync
    pub to: String,
    /// Descriptor files rewritten
    pub files: Vec<PathBuf>,
}

/// Bump a semver version, keeping any pre-release tag (Maven's `-SNAPSHOT`
/// convention) and dropping build metadata.
pub fn bump_version(version: &str, kind: BumpKind) -> Result<String, SyncError> {
    let parsed = Version::parse(version).map_err(|e| SyncError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })?;

    let mut next = match kind {
        BumpKind::Major => Version::new(parsed.major + 1, 0, 0),
        BumpKind::Minor => Version::new(parsed.major, parsed.minor + 1, 0),
        BumpKind::Patch => Version::new(parsed.major, parsed.minor, parsed.patch + 1),
    };
    next.pre = parsed.pre;

    Ok(next.to_string())
}

/// Rewrite the project's own `<version>` element in a pom.
///
/// The project version is located relative to the project `<artifactId>`:
/// the first `<version>` element after it and before any `<dependencies>`
/// section, which keeps parent and dependency versions untouched.
pub fn substitute_pom_version(
    content: &str,
    artifact_id: &str,
    new_version: &str,
    path: &Path,
) -> Result<String, SyncError> {
    let artifact_re = Regex::new(&format!(
        r"<artifactId>\s*{}\s*</artifactId>",
        regex::escape(artifact_id)
    ))
    .expect("static artifactId regex");

    let Some(artifact_match) = artifact_re.find(content) else {
        return Err(SyncError::VersionNotFound {
            path: path.to_path_buf(),
        });
    };

    let search_from = artifact_match.end();
    let search_to = content[search_from..]
        .find("<dependencies>")
        .map_or(content.len(), |i| search_from + i);
    let window = &content[search_from..search_to];

    let (open, close) = match (window.find("<version>"), window.find("</version>")) {
        (Some(open), Some(close)) if open < close => {
            (search_from + open + "<version>".len(), search_from + close)
        }
        _ => {
            return Err(SyncError::VersionNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    let mut result = String::with_capacity(content.len());
    result.push_str(&content[..open]);
    result.push_str(new_version);
    result.push_str(&content[close..]);
    Ok(result)
}

/// Rewrite the `"version"` field of a package.json
pub fn substitute_package_json_version(
    content: &str,
    new_version: &str,
    path: &Path,
) -> Result<String, SyncError> {
    let version_re =
        Regex::new(r#""version"\s*:\s*"[^"]*""#).expect("static version regex");

    if version_re.find(content).is_none() {
        return Err(SyncError::VersionNotFound {
            path: path.to_path_buf(),
        });
    }

    Ok(version_re
        .replace(content, format!(r#""version": "{new_version}""#).as_str())
        .into_owned())
}

/// Resolve the target version for a module
pub fn resolve_target(module: &Module, target: &VersionTarget) -> Result<String, SyncError> {
    match target {
        VersionTarget::Set(version) => {
            Version::parse(version).map_err(|e| SyncError::InvalidVersion {
                version: version.clone(),
                reason: e.to_string(),
            })?;
            Ok(version.clone())
        }
        VersionTarget::Bump(kind) => {
            let current = module
                .version
                .as_deref()
                .ok_or_else(|| SyncError::NoCurrentVersion {
                    name: module.name.clone(),
                })?;
            bump_version(current, *kind)
        }
    }
}

/// Sync one module's descriptors to the target version
pub fn sync_module_version(
    project_dir: &Path,
    module: &Module,
    target: &VersionTarget,
) -> Result<SyncOutcome, SyncError> {
    let to = resolve_target(module, target)?;
    let module_dir = project_dir.join(&module.path);
    let mut files = Vec::new();

    if module.has_pom {
        let path = module_dir.join(POM_FILE);
        let content = read(&path)?;
        let rewritten = substitute_pom_version(&content, &module.name, &to, &path)?;
        write(&path, &rewritten)?;
        files.push(path);
    }

    if module.has_package_json {
        let path = module_dir.join(PACKAGE_JSON_FILE);
        let content = read(&path)?;
        let rewritten = substitute_package_json_version(&content, &to, &path)?;
        write(&path, &rewritten)?;
        files.push(path);
    }

    Ok(SyncOutcome {
        module: module.name.clone(),
        from: module.version.clone(),
        to,
        files,
    })
}

fn read(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|e| SyncError::IoError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn write(path: &Path, content: &str) -> Result<(), SyncError> {
    std::fs::write(path, content).map_err(|e| SyncError::IoError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_patch_minor_major() {
        assert_eq!(bump_version("1.2.3", BumpKind::Patch).unwrap(), "1.2.4");
        assert_eq!(bump_version("1.2.3", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump_version("1.2.3", BumpKind::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn test_bump_preserves_snapshot_suffix() {
        assert_eq!(
            bump_version("1.0.0-SNAPSHOT", BumpKind::Major).unwrap(),
            "2.0.0-SNAPSHOT"
        );
    }

    #[test]
    fn test_bump_invalid_version() {
        assert!(matches!(
            bump_version("not-a-version", BumpKind::Patch),
            Err(SyncError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_bump_kind_from_str() {
        assert_eq!("major".parse::<BumpKind>().unwrap(), BumpKind::Major);
        assert!("huge".parse::<BumpKind>().is_err());
    }

    const POM: &str = r#"<project>
    <parent>
        <groupId>com.example</groupId>
        <artifactId>platform-parent</artifactId>
        <version>9.9.9</version>
    </parent>
    <groupId>com.example</groupId>
    <artifactId>demo-module-a</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <dependencies>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>demo-module-b</artifactId>
            <version>1.0.0</version>
        </dependency>
    </dependencies>
</project>
"#;

    #[test]
    fn test_pom_substitution_touches_only_project_version() {
        let rewritten = substitute_pom_version(
            POM,
            "demo-module-a",
            "2.0.0-SNAPSHOT",
            Path::new("pom.xml"),
        )
        .unwrap();

        assert!(rewritten.contains("<version>2.0.0-SNAPSHOT</version>"));
        // Parent and dependency versions untouched
        assert!(rewritten.contains("<version>9.9.9</version>"));
        assert!(rewritten.contains("<version>1.0.0</version>"));
        assert!(!rewritten.contains("1.0.0-SNAPSHOT"));
    }

    #[test]
    fn test_pom_substitution_without_version_element() {
        let pom = "<project><artifactId>x</artifactId><dependencies></dependencies></project>";
        assert!(matches!(
            substitute_pom_version(pom, "x", "1.0.0", Path::new("pom.xml")),
            Err(SyncError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_package_json_substitution_preserves_layout() {
        let json = "{\n  \"name\": \"@example/web\",\n  \"version\": \"0.1.0\",\n  \"dependencies\": {}\n}\n";
        let rewritten =
            substitute_package_json_version(json, "0.2.0", Path::new("package.json")).unwrap();

        assert!(rewritten.contains("\"version\": \"0.2.0\""));
        assert!(rewritten.starts_with("{\n  \"name\""));
        assert!(rewritten.ends_with("}\n"));
    }

    #[test]
    fn test_package_json_without_version_field() {
        assert!(matches!(
            substitute_package_json_version(r#"{"name": "x"}"#, "1.0.0", Path::new("p.json")),
            Err(SyncError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_sync_module_rewrites_both_descriptors() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("dual");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("pom.xml"),
            "<project><groupId>com.example</groupId><artifactId>dual</artifactId><version>1.0.0</version></project>",
        )
        .unwrap();
        std::fs::write(
            dir.join("package.json"),
            r#"{"name": "dual", "version": "1.0.0"}"#,
        )
        .unwrap();

        let module = Module {
            name: "dual".to_string(),
            path: PathBuf::from("dual"),
            group_id: Some("com.example".to_string()),
            version: Some("1.0.0".to_string()),
            declared_dependencies: Vec::new(),
            has_pom: true,
            has_package_json: true,
            parsed: true,
        };

        let outcome = sync_module_version(
            temp.path(),
            &module,
            &VersionTarget::Bump(BumpKind::Minor),
        )
        .unwrap();

        assert_eq!(outcome.to, "1.1.0");
        assert_eq!(outcome.files.len(), 2);
        assert!(std::fs::read_to_string(dir.join("pom.xml"))
            .unwrap()
            .contains("<version>1.1.0</version>"));
        assert!(std::fs::read_to_string(dir.join("package.json"))
            .unwrap()
            .contains("\"version\": \"1.1.0\""));
    }

    #[test]
    fn test_set_target_rejects_invalid_semver() {
        let module = Module {
            name: "m".to_string(),
            path: PathBuf::from("m"),
            group_id: None,
            version: None,
            declared_dependencies: Vec::new(),
            has_pom: false,
            has_package_json: true,
            parsed: true,
        };
        assert!(matches!(
            resolve_target(&module, &VersionTarget::Set("oops".to_string())),
            Err(SyncError::InvalidVersion { .. })
        ));
    }
}
