//! Build command implementation
//!
//! Implements `monoforge build`: discovers the modules, derives the internal
//! dependency graph, levels it, and drives the external build tool level by
//! level with bounded concurrency.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::core::changes;
use crate::core::descriptor;
use crate::core::executor::{BuildExecutor, BuildOptions};
use crate::core::graph;
use crate::core::registry::ModuleRegistry;
use crate::core::scheduler;
use crate::core::workspace::WorkspaceManifest;
use crate::error::WorkspaceError;

/// Build command arguments
pub struct BuildArgs {
    /// Explicit module selection (all modules when empty)
    pub modules: Vec<String>,
    /// Build only modules changed since this base ref
    pub changed_since: Option<String>,
    /// Concurrent module builds within a level
    pub jobs: Option<usize>,
    /// Goal override
    pub goal: Option<String>,
    /// Skip tests
    pub skip_tests: bool,
    /// Work offline
    pub offline: bool,
    /// Per-module timeout override in seconds
    pub timeout: Option<u64>,
    /// One invocation per level
    pub batch: bool,
    /// Also build dependencies of a single standalone module
    pub also_make: bool,
}

/// Execute the build command
pub async fn execute(project_dir: &Path, args: BuildArgs, json: bool, verbose: bool) -> Result<()> {
    let manifest = WorkspaceManifest::load(project_dir)?;
    let registry = ModuleRegistry::discover(project_dir, &manifest)
        .with_context(|| "Module discovery failed")?;

    if registry.is_empty() {
        bail!("Workspace declares no modules");
    }

    // Resolve the requested build set; unknown names abort before scheduling
    let requested: Vec<String> = if let Some(base) = &args.changed_since {
        let change_set = changes::detect_changes(project_dir, &registry, &manifest, base, "HEAD", true)
            .await
            .with_context(|| "Change detection failed")?;
        if change_set.is_empty() {
            println!("No modules changed since {base}, nothing to build");
            return Ok(());
        }
        change_set.resolve(&registry)
    } else if args.modules.is_empty() {
        registry.names()
    } else {
        for name in &args.modules {
            if !registry.contains(name) {
                return Err(WorkspaceError::UnknownModule { name: name.clone() }.into());
            }
        }
        args.modules.clone()
    };

    if args.also_make && (requested.len() > 1 || args.batch) {
        bail!("--also-make is only valid for a single standalone module build");
    }

    let dependency_graph = graph::build_graph(&registry, &manifest);
    let levels = scheduler::compute_levels(&requested, &dependency_graph);

    tracing::info!(
        "Building {} modules in {} levels",
        requested.len(),
        levels.len()
    );

    let mut options = BuildOptions::from_config(&manifest.build);
    if let Some(jobs) = args.jobs {
        options.jobs = jobs.max(1);
    }
    if let Some(goal) = args.goal {
        options.goal = goal;
    }
    if let Some(timeout) = args.timeout {
        options.timeout = std::time::Duration::from_secs(timeout);
    }
    options.skip_tests |= args.skip_tests;
    options.offline = args.offline;
    options.batch_levels = args.batch;
    options.also_make = args.also_make;
    options.install_root = root_is_internal(project_dir, &manifest);
    options.verbose = verbose;

    let executor = BuildExecutor::new(project_dir, &registry, options);
    let summary = executor.execute(&levels).await;

    // The summary always prints, even on partial failure; the process exit
    // code is the authoritative signal for automation
    if json {
        println!("{}", summary.render_json()?);
    } else {
        println!("\n{}", summary.render_human());
    }

    if summary.exit_code() != 0 {
        bail!(
            "build failed: {} failed, {} skipped",
            summary.failed(),
            summary.skipped()
        );
    }
    Ok(())
}

/// Whether the root descriptor is itself an internal artifact that must be
/// installed before any module build starts
fn root_is_internal(project_dir: &Path, manifest: &WorkspaceManifest) -> bool {
    let root_path = project_dir.join(&manifest.workspace.root_descriptor);
    if !root_path.to_string_lossy().ends_with(".xml") {
        return false;
    }
    let Ok(content) = std::fs::read_to_string(&root_path) else {
        return false;
    };
    descriptor::parse_pom(&content, &root_path)
        .map(|desc| desc.group.as_deref() == Some(manifest.workspace.group.as_str()))
        .unwrap_or(false)
}
