//! Init command implementation
//!
//! Scaffolds a monoforge.toml for an existing monorepo and registers the
//! state directory in .gitignore.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::cli::output::status;
use crate::config::defaults;

/// Entries to add to .gitignore
pub const GITIGNORE_ENTRIES: &[&str] = &[".monoforge/"];

/// Marker comment for the monoforge section in .gitignore
pub const GITIGNORE_MARKER: &str = "# monoforge";

/// Execute the init command
pub async fn execute(path: &Path, group: Option<String>, force: bool) -> Result<()> {
    let manifest_path = path.join(defaults::WORKSPACE_MANIFEST);
    if manifest_path.exists() && !force {
        bail!(
            "'{}' already exists. Use --force to overwrite.",
            manifest_path.display()
        );
    }

    let name = derive_workspace_name(path);
    let group = group.unwrap_or_else(|| format!("com.{}", name.replace('-', "")));
    let has_root_pom = path.join("pom.xml").exists();

    let content = generate_manifest_content(&name, &group, has_root_pom);
    std::fs::write(&manifest_path, content)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    update_gitignore(path).with_context(|| "Failed to update .gitignore")?;

    println!("{} Initialized workspace '{name}'", status::SUCCESS);
    println!("  Manifest: {}", manifest_path.display());
    if !has_root_pom {
        println!(
            "{} No root pom.xml found; set workspace.root_descriptor before building",
            status::WARNING
        );
    }
    Ok(())
}

/// Derive the workspace name from the directory name
fn derive_workspace_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string())
}

/// Generate the default manifest content with comments
pub fn generate_manifest_content(name: &str, group: &str, has_root_pom: bool) -> String {
    let root_line = if has_root_pom {
        r#"root_descriptor = "pom.xml""#.to_string()
    } else {
        "# root_descriptor = \"pom.xml\"".to_string()
    };

    format!(
        r#"# Monoforge Workspace Configuration

[workspace]
name = "{name}"
# Internal Maven namespace; dependencies under it form the build graph
group = "{group}"
{root_line}
# npm scope of internal packages:
# js_scope = "@{name}"
# JS workspace globs, expanded against the filesystem:
# js_workspaces = ["packages/*"]

[build]
tool = "mvn"
goal = "install"
# Concurrent module builds within a level (defaults to CPU count)
# jobs = 4
timeout_secs = 1800
skip_tests = false

# Repositories to open dependency-update PRs against
# [downstream]
# repos = ["{name}/app-server"]
# base_branch = "main"
"#
    )
}

/// Add the monoforge entries to .gitignore, once
fn update_gitignore(path: &Path) -> std::io::Result<()> {
    let gitignore_path = path.join(".gitignore");
    let existing = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };

    if existing.contains(GITIGNORE_MARKER) {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(GITIGNORE_MARKER);
    content.push('\n');
    for entry in GITIGNORE_ENTRIES {
        content.push_str(entry);
        content.push('\n');
    }
    std::fs::write(&gitignore_path, content)
}
