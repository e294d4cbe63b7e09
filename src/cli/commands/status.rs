//! Status command implementation
//!
//! Prints a workspace overview: modules with versions and descriptor kinds,
//! the computed level layout, and build tool availability.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::status;
use crate::core::graph;
use crate::core::registry::ModuleRegistry;
use crate::core::scheduler;
use crate::core::workspace::WorkspaceManifest;

/// Execute the status command
pub async fn execute(project_dir: &Path, json: bool) -> Result<()> {
    let manifest = WorkspaceManifest::load(project_dir)?;
    let registry = ModuleRegistry::discover(project_dir, &manifest)
        .with_context(|| "Module discovery failed")?;

    let dependency_graph = graph::build_graph(&registry, &manifest);
    let levels = scheduler::compute_levels(&registry.names(), &dependency_graph);
    let tool_available = which::which(&manifest.build.tool).is_ok();

    if json {
        let value = serde_json::json!({
            "workspace": manifest.workspace.name,
            "group": manifest.workspace.group,
            "build_tool": manifest.build.tool,
            "build_tool_available": tool_available,
            "modules": registry.modules().iter().map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "path": m.path,
                    "version": m.version,
                    "maven": m.has_pom,
                    "npm": m.has_package_json,
                    "internal_dependencies": dependency_graph.dependencies_of(&m.name),
                    "level": scheduler::level_of(&levels, &m.name),
                })
            }).collect::<Vec<_>>(),
            "levels": levels.iter().map(|l| &l.modules).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Workspace: {} ({})", manifest.workspace.name, manifest.workspace.group);
    if let Some(sha) = option_env!("VERGEN_GIT_SHA") {
        println!("monoforge {} ({sha})", env!("CARGO_PKG_VERSION"));
    }

    let tool_note = if tool_available {
        status::SUCCESS
    } else {
        status::ERROR
    };
    println!("Build tool: {} {tool_note}", manifest.build.tool);
    println!();

    let name_width = registry
        .modules()
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(6)
        .max(6);

    println!(
        "{:<name_width$}  {:<16}  {:<9}  {:>5}  {:>5}",
        "MODULE", "VERSION", "KIND", "DEPS", "LEVEL"
    );
    for module in registry.modules() {
        let kind = match (module.has_pom, module.has_package_json) {
            (true, true) => "maven+npm",
            (true, false) => "maven",
            (false, true) => "npm",
            (false, false) => "-",
        };
        println!(
            "{:<name_width$}  {:<16}  {:<9}  {:>5}  {:>5}",
            module.name,
            module.version.as_deref().unwrap_or("-"),
            kind,
            dependency_graph.dependencies_of(&module.name).len(),
            scheduler::level_of(&levels, &module.name)
                .map_or_else(|| "-".to_string(), |l| l.to_string()),
        );
    }

    for module in registry.unparsed() {
        println!(
            "{} Descriptor for '{}' could not be parsed; treated as having no internal dependencies",
            status::WARNING,
            module.name
        );
    }

    println!();
    println!(
        "{} modules in {} build levels",
        registry.len(),
        levels.len()
    );
    Ok(())
}
