//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod changes;
pub mod init;
pub mod notify;
pub mod status;
pub mod sync;

use anyhow::Result;
use clap::Subcommand;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a monoforge workspace
    Init {
        /// Internal Maven namespace (groupId)
        #[arg(short, long)]
        group: Option<String>,

        /// Force initialization over an existing manifest
        #[arg(short, long)]
        force: bool,
    },

    /// Show workspace overview: modules, versions, build levels
    Status,

    /// Sync module versions across both ecosystems
    Sync {
        /// Module to sync (repeatable; all modules if not given)
        #[arg(short, long = "module", value_name = "NAME")]
        modules: Vec<String>,

        /// Set this exact version
        #[arg(long, value_name = "VERSION", conflicts_with = "bump")]
        set: Option<String>,

        /// Bump the current version (major, minor or patch)
        #[arg(long, value_name = "KIND")]
        bump: Option<String>,
    },

    /// Detect modules changed between two refs
    Changes {
        /// Base ref to compare against
        base: String,

        /// Head ref
        #[arg(default_value = "HEAD")]
        head: String,

        /// Ignore the cached comparison result
        #[arg(long)]
        no_cache: bool,
    },

    /// Build modules level by level
    Build {
        /// Module to build (repeatable; all modules if not given)
        #[arg(short, long = "module", value_name = "NAME")]
        modules: Vec<String>,

        /// Build only modules changed since this base ref
        #[arg(long, value_name = "BASE", conflicts_with = "modules")]
        changed_since: Option<String>,

        /// Concurrent module builds within a level
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Build goal/action (compile, package, test, install, deploy)
        #[arg(short, long)]
        goal: Option<String>,

        /// Skip tests
        #[arg(long)]
        skip_tests: bool,

        /// Work offline
        #[arg(long)]
        offline: bool,

        /// Per-module timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// One build tool invocation per level instead of per module
        #[arg(long)]
        batch: bool,

        /// Also build dependencies of a single standalone module
        #[arg(long)]
        also_make: bool,
    },

    /// Open dependency-update pull requests on downstream repositories
    #[command(disable_version_flag = true)]
    Notify {
        /// Module the update is about (repeatable; all modules if not given)
        #[arg(short, long = "module", value_name = "NAME")]
        modules: Vec<String>,

        /// Version to announce
        #[arg(long, value_name = "VERSION")]
        version: String,

        /// Print the planned pull requests without calling the API
        #[arg(long)]
        dry_run: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, json: bool, verbose: bool) -> Result<()> {
        match self {
            Self::Init { group, force } => {
                let current_dir = std::env::current_dir()?;
                init::execute(&current_dir, group, force).await
            }
            Self::Status => {
                let current_dir = std::env::current_dir()?;
                status::execute(&current_dir, json).await
            }
            Self::Sync { modules, set, bump } => {
                let current_dir = std::env::current_dir()?;
                sync::execute(&current_dir, &modules, set, bump).await
            }
            Self::Changes {
                base,
                head,
                no_cache,
            } => {
                let current_dir = std::env::current_dir()?;
                changes::execute(&current_dir, &base, &head, no_cache, json).await
            }
            Self::Build {
                modules,
                changed_since,
                jobs,
                goal,
                skip_tests,
                offline,
                timeout,
                batch,
                also_make,
            } => {
                let current_dir = std::env::current_dir()?;
                let args = build::BuildArgs {
                    modules,
                    changed_since,
                    jobs,
                    goal,
                    skip_tests,
                    offline,
                    timeout,
                    batch,
                    also_make,
                };
                build::execute(&current_dir, args, json, verbose).await
            }
            Self::Notify {
                modules,
                version,
                dry_run,
            } => {
                let current_dir = std::env::current_dir()?;
                notify::execute(&current_dir, &modules, &version, dry_run).await
            }
        }
    }
}
