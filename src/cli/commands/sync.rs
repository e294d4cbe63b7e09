//! Sync command implementation
//!
//! Selective versioning: sets or bumps module versions, rewriting the Maven
//! and npm descriptors together so both ecosystems agree.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::cli::output::{create_build_bar, status};
use crate::core::registry::ModuleRegistry;
use crate::core::version::{self, VersionTarget};
use crate::core::workspace::WorkspaceManifest;
use crate::error::WorkspaceError;

/// Execute the sync command
pub async fn execute(
    project_dir: &Path,
    modules: &[String],
    set: Option<String>,
    bump: Option<String>,
) -> Result<()> {
    let target = match (set, bump) {
        (Some(version), None) => VersionTarget::Set(version),
        (None, Some(kind)) => VersionTarget::Bump(
            kind.parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        ),
        (None, None) => bail!("Nothing to do: pass --set <version> or --bump <kind>"),
        (Some(_), Some(_)) => unreachable!("clap conflicts_with prevents this"),
    };

    let manifest = WorkspaceManifest::load(project_dir)?;
    let registry = ModuleRegistry::discover(project_dir, &manifest)
        .with_context(|| "Module discovery failed")?;

    let selected: Vec<String> = if modules.is_empty() {
        registry.names()
    } else {
        for name in modules {
            if !registry.contains(name) {
                return Err(WorkspaceError::UnknownModule { name: name.clone() }.into());
            }
        }
        modules.to_vec()
    };

    let bar = create_build_bar(selected.len() as u64);
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    for name in &selected {
        bar.set_message(name.clone());
        let module = registry.get(name).expect("selection validated above");
        match version::sync_module_version(project_dir, module, &target) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => failures.push((name.clone(), e)),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    for outcome in &outcomes {
        println!(
            "{} {}: {} -> {} ({} file{})",
            status::SUCCESS,
            outcome.module,
            outcome.from.as_deref().unwrap_or("?"),
            outcome.to,
            outcome.files.len(),
            if outcome.files.len() == 1 { "" } else { "s" },
        );
    }
    for (name, error) in &failures {
        println!("{} {name}: {error}", status::ERROR);
    }

    if !failures.is_empty() {
        bail!("{} of {} modules failed to sync", failures.len(), selected.len());
    }
    Ok(())
}
