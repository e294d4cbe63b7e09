//! Changes command implementation
//!
//! Detects which modules changed between two refs, for selective builds and
//! selective versioning.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::create_spinner;
use crate::core::changes;
use crate::core::registry::ModuleRegistry;
use crate::core::workspace::WorkspaceManifest;

/// Execute the changes command
pub async fn execute(
    project_dir: &Path,
    base: &str,
    head: &str,
    no_cache: bool,
    json: bool,
) -> Result<()> {
    let manifest = WorkspaceManifest::load(project_dir)?;
    let registry = ModuleRegistry::discover(project_dir, &manifest)
        .with_context(|| "Module discovery failed")?;

    let spinner = create_spinner(&format!("Comparing {base}..{head}"));
    let change_set =
        changes::detect_changes(project_dir, &registry, &manifest, base, head, !no_cache)
            .await
            .with_context(|| "Change detection failed")?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&change_set)?);
        return Ok(());
    }

    if change_set.all_modules {
        println!("Build infrastructure changed; all modules count as changed:");
        for name in change_set.resolve(&registry) {
            println!("  {name}");
        }
    } else if change_set.modules.is_empty() {
        println!("No modules changed between {base} and {head}");
    } else {
        println!("Changed modules:");
        for name in &change_set.modules {
            println!("  {name}");
        }
    }
    Ok(())
}
