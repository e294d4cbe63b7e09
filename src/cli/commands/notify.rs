//! Notify command implementation
//!
//! Opens a dependency-update pull request against each configured
//! downstream repository. The update branch is expected to exist already
//! (pushed by the release pipeline); this command only creates the PRs.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::cli::output::{create_spinner, status};
use crate::core::registry::ModuleRegistry;
use crate::core::workspace::WorkspaceManifest;
use crate::error::WorkspaceError;
use crate::infra::github::{GithubClient, PullRequestSpec};

/// Execute the notify command
pub async fn execute(
    project_dir: &Path,
    modules: &[String],
    version: &str,
    dry_run: bool,
) -> Result<()> {
    let manifest = WorkspaceManifest::load(project_dir)?;
    let registry = ModuleRegistry::discover(project_dir, &manifest)
        .with_context(|| "Module discovery failed")?;

    if manifest.downstream.repos.is_empty() {
        bail!("No downstream repositories configured in [downstream].repos");
    }

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

    let spec = pull_request_spec(&manifest, &selected, version);

    if dry_run {
        println!("Would open pull requests:");
        for repo in &manifest.downstream.repos {
            println!("  {repo}: '{}' ({} -> {})", spec.title, spec.head, spec.base);
        }
        return Ok(());
    }

    let client = GithubClient::from_env()?;
    let mut failures = 0usize;

    for repo in &manifest.downstream.repos {
        let spinner = create_spinner(&format!("Opening pull request on {repo}"));
        match client.open_pull_request(repo, &spec).await {
            Ok(pr) => {
                spinner.finish_and_clear();
                println!("{} {repo}: #{} {}", status::SUCCESS, pr.number, pr.html_url);
            }
            Err(e) => {
                spinner.finish_and_clear();
                println!("{} {repo}: {e}", status::ERROR);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!(
            "{failures} of {} downstream notifications failed",
            manifest.downstream.repos.len()
        );
    }
    Ok(())
}

/// Build the pull request payload for an update announcement
pub fn pull_request_spec(
    manifest: &WorkspaceManifest,
    modules: &[String],
    version: &str,
) -> PullRequestSpec {
    let mut body = String::from("Automated dependency update from monoforge.\n\nUpdated modules:\n");
    for name in modules {
        body.push_str(&format!("- `{}:{name}` -> `{version}`\n", manifest.workspace.group));
    }

    PullRequestSpec {
        title: format!(
            "chore: bump {} {} to {version}",
            manifest.workspace.name,
            if modules.len() == 1 {
                modules[0].clone()
            } else {
                format!("({} modules)", modules.len())
            },
        ),
        head: format!("monoforge/update-{version}"),
        base: manifest.downstream.base_branch.clone(),
        body,
    }
}
