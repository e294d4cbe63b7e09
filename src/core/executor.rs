//! Build execution
//!
//! Drives the external build tool over the level decomposition produced by
//! the scheduler. Levels run strictly in order: no module of level N+1
//! starts before every module of level N reached a terminal state. Within a
//! level, modules run concurrently under a semaphore bound - a classic
//! worker-pool admission, not batch-of-N-then-wait.
//!
//! Each module build walks PENDING -> RUNNING -> one of SUCCEEDED, FAILED,
//! TIMED_OUT or LAUNCH_ERROR; a module enters RUNNING only once its level is
//! reached and a semaphore permit is available. After the first failure in a
//! level, already-running siblings finish naturally, but every module of
//! every later level is recorded as SKIPPED without being launched.
//!
//! All per-module failures become [`BuildResult`]s; nothing escapes the
//! executor as an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::cli::output::ModuleFormatter;
use crate::config::defaults;
use crate::core::registry::ModuleRegistry;
use crate::core::report::{BuildOutcome, BuildResult, RunSummary};
use crate::core::scheduler::BuildLevel;
use crate::core::workspace::BuildConfig;
use crate::infra::process::{self, LineCallback, ProcessOutcome, ProcessReport};

/// Options for one executor run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build tool executable
    pub tool: String,
    /// Goal/action passed to the build tool
    pub goal: String,
    /// Skip tests
    pub skip_tests: bool,
    /// Work offline
    pub offline: bool,
    /// Concurrent module builds within a level
    pub jobs: usize,
    /// Per-module wall-clock timeout
    pub timeout: Duration,
    /// One subprocess per level instead of one per module
    pub batch_levels: bool,
    /// Build dependents/dependencies along with a single standalone module.
    /// Never combined with multi-module invocations: duplicate concurrent
    /// builds of a shared dependency race on the local repository.
    pub also_make: bool,
    /// Install the root descriptor once before any level starts
    pub install_root: bool,
    /// Show all subprocess output instead of the marker-filtered stream
    pub verbose: bool,
}

impl BuildOptions {
    /// Derive options from the workspace build configuration
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            tool: config.tool.clone(),
            goal: config.goal.clone(),
            skip_tests: config.skip_tests,
            offline: false,
            jobs: config.jobs.unwrap_or_else(num_cpus::get),
            timeout: Duration::from_secs(config.timeout_secs),
            batch_levels: false,
            also_make: false,
            install_root: false,
            verbose: false,
        }
    }
}

/// Executes build levels against the external build tool
pub struct BuildExecutor {
    project_dir: PathBuf,
    logs_dir: PathBuf,
    module_paths: HashMap<String, String>,
    options: BuildOptions,
}

impl BuildExecutor {
    /// Create an executor for a workspace
    pub fn new(project_dir: &Path, registry: &ModuleRegistry, options: BuildOptions) -> Self {
        let module_paths = registry
            .modules()
            .iter()
            .map(|m| (m.name.clone(), m.path.to_string_lossy().into_owned()))
            .collect();
        Self {
            project_dir: project_dir.to_path_buf(),
            logs_dir: project_dir
                .join(defaults::STATE_DIR)
                .join(defaults::LOGS_DIR),
            module_paths,
            options,
        }
    }

    /// Execute all levels and aggregate the results.
    ///
    /// The summary is created empty, appended to as each level completes,
    /// and finalized when the last level (or skip cascade) is recorded.
    pub async fn execute(&self, levels: &[BuildLevel]) -> RunSummary {
        let run_start = Instant::now();
        let mut summary = RunSummary::new();

        if let Err(e) = std::fs::create_dir_all(&self.logs_dir) {
            tracing::warn!("Could not create log directory: {e}");
        }

        let total_modules: usize = levels.iter().map(BuildLevel::len).sum();
        let also_make = self.options.also_make && !self.options.batch_levels && total_modules == 1;
        if self.options.also_make && !also_make {
            tracing::warn!("Ignoring also-make: only valid for a single standalone module");
        }

        // Shared prerequisite: materialize the root descriptor exactly once,
        // synchronously, so concurrent module builds never race on it
        if self.options.install_root && !self.install_root_descriptor().await {
            for level in levels {
                for name in &level.modules {
                    summary.push(BuildResult::skipped(name));
                }
            }
            summary.finalize(run_start.elapsed().as_secs_f64());
            return summary;
        }

        let mut failure_seen = false;
        let mut color_index = 0usize;

        for level in levels {
            if failure_seen {
                for name in &level.modules {
                    summary.push(BuildResult::skipped(name));
                }
                continue;
            }

            let results = if self.options.batch_levels && level.len() > 1 {
                self.run_level_batched(level, color_index).await
            } else {
                self.run_level_pooled(level, color_index, also_make).await
            };
            color_index += level.len();

            failure_seen = results.iter().any(|r| !r.success());
            for result in results {
                summary.push(result);
            }
        }

        summary.finalize(run_start.elapsed().as_secs_f64());
        summary
    }

    /// Run one level with semaphore-bounded per-module subprocesses
    async fn run_level_pooled(
        &self,
        level: &BuildLevel,
        color_base: usize,
        also_make: bool,
    ) -> Vec<BuildResult> {
        let semaphore = Arc::new(Semaphore::new(self.options.jobs.max(1)));
        let mut handles = Vec::with_capacity(level.len());

        for (offset, name) in level.modules.iter().enumerate() {
            let formatter =
                ModuleFormatter::new(name, color_base + offset, self.options.verbose);
            let args = self.module_args(name, also_make);
            let ctx = TaskContext {
                tool: self.options.tool.clone(),
                args,
                cwd: self.project_dir.clone(),
                timeout: self.options.timeout,
                log_path: self.logs_dir.join(format!("{name}.log")),
                module_name: name.clone(),
            };
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("build semaphore closed");
                run_module_build(ctx, formatter).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (joined, name) in futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(&level.modules)
        {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => results.push(BuildResult {
                    module_name: name.clone(),
                    outcome: BuildOutcome::LaunchError,
                    exit_code: defaults::EXIT_CODE_LAUNCH_ERROR,
                    duration_seconds: 0.0,
                    error_detail: Some(format!("build task failed: {e}")),
                }),
            }
        }
        results
    }

    /// Run one level as a single multi-module invocation.
    ///
    /// The subprocess exit code is authoritative for every module in the
    /// level; the level duration is apportioned evenly across its modules.
    async fn run_level_batched(&self, level: &BuildLevel, color_base: usize) -> Vec<BuildResult> {
        let selection = level
            .modules
            .iter()
            .filter_map(|name| self.module_paths.get(name).cloned())
            .collect::<Vec<_>>()
            .join(",");

        let mut args = vec!["-B".to_string(), "-pl".to_string(), selection];
        self.push_common_args(&mut args);

        let label = format!("level:{}", level.modules.join(","));
        let formatter = ModuleFormatter::new(&label, color_base, self.options.verbose);
        let callback = line_callback(formatter);

        let report = process::run_streamed(
            &self.options.tool,
            &args,
            &self.project_dir,
            self.options.timeout,
            Some(callback),
        )
        .await;

        let log_path = self.logs_dir.join(format!("{label}.log"));
        write_log(&log_path, &report.output);

        let per_module_duration = report.duration.as_secs_f64() / level.len() as f64;
        let (outcome, exit_code, detail) = classify(&report, &self.options.tool);

        level
            .modules
            .iter()
            .map(|name| BuildResult {
                module_name: name.clone(),
                outcome,
                exit_code,
                duration_seconds: per_module_duration,
                error_detail: detail.clone(),
            })
            .collect()
    }

    /// Install the root descriptor non-recursively. Returns false on failure.
    async fn install_root_descriptor(&self) -> bool {
        let mut args = vec![
            "-B".to_string(),
            "-N".to_string(),
            "install".to_string(),
            "-DskipTests".to_string(),
        ];
        if self.options.offline {
            args.push("-o".to_string());
        }

        let formatter = ModuleFormatter::new("root", 0, self.options.verbose);
        let callback = line_callback(formatter);
        let report = process::run_streamed(
            &self.options.tool,
            &args,
            &self.project_dir,
            self.options.timeout,
            Some(callback),
        )
        .await;

        write_log(&self.logs_dir.join("root.log"), &report.output);

        if report.success() {
            true
        } else {
            tracing::warn!("Root descriptor install failed; skipping all module builds");
            false
        }
    }

    /// Selection and goal arguments for one module
    fn module_args(&self, name: &str, also_make: bool) -> Vec<String> {
        let path = self
            .module_paths
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        let mut args = vec!["-B".to_string(), "-pl".to_string(), path];
        if also_make {
            args.push("-am".to_string());
        }
        self.push_common_args(&mut args);
        args
    }

    fn push_common_args(&self, args: &mut Vec<String>) {
        if self.options.skip_tests {
            args.push("-DskipTests".to_string());
        }
        if self.options.offline {
            args.push("-o".to_string());
        }
        args.push(self.options.goal.clone());
    }
}

struct TaskContext {
    tool: String,
    args: Vec<String>,
    cwd: PathBuf,
    timeout: Duration,
    log_path: PathBuf,
    module_name: String,
}

fn line_callback(formatter: ModuleFormatter) -> LineCallback {
    Arc::new(move |line: &str| formatter.emit(line))
}

fn write_log(path: &Path, output: &str) {
    if let Err(e) = std::fs::write(path, output) {
        tracing::warn!("Could not write build log '{}': {e}", path.display());
    }
}

fn classify(report: &ProcessReport, tool: &str) -> (BuildOutcome, i32, Option<String>) {
    match &report.outcome {
        ProcessOutcome::Exited { code: 0 } => (BuildOutcome::Succeeded, 0, None),
        ProcessOutcome::Exited { code } => (
            BuildOutcome::Failed,
            *code,
            Some(format!("{tool} exited with status {code}")),
        ),
        ProcessOutcome::TimedOut => (
            BuildOutcome::TimedOut,
            defaults::EXIT_CODE_TIMED_OUT,
            Some("build exceeded the wall-clock timeout and was killed".to_string()),
        ),
        ProcessOutcome::LaunchError { message } => (
            BuildOutcome::LaunchError,
            defaults::EXIT_CODE_LAUNCH_ERROR,
            Some(format!("failed to launch {tool}: {message}")),
        ),
    }
}

async fn run_module_build(ctx: TaskContext, formatter: ModuleFormatter) -> BuildResult {
    tracing::debug!("Starting build for module {}", ctx.module_name);

    let callback = line_callback(formatter);
    let report =
        process::run_streamed(&ctx.tool, &ctx.args, &ctx.cwd, ctx.timeout, Some(callback)).await;

    write_log(&ctx.log_path, &report.output);

    let (outcome, exit_code, error_detail) = classify(&report, &ctx.tool);
    BuildResult {
        module_name: ctx.module_name,
        outcome,
        exit_code,
        duration_seconds: report.duration.as_secs_f64(),
        error_detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Module;
    use tempfile::TempDir;

    fn module(name: &str) -> Module {
        Module {
            name: name.to_string(),
            path: PathBuf::from(name),
            group_id: Some("com.example".to_string()),
            version: Some("1.0.0".to_string()),
            declared_dependencies: Vec::new(),
            has_pom: true,
            has_package_json: false,
            parsed: true,
        }
    }

    fn options(tool: &str) -> BuildOptions {
        BuildOptions {
            tool: tool.to_string(),
            goal: "install".to_string(),
            skip_tests: false,
            offline: false,
            jobs: 2,
            timeout: Duration::from_secs(30),
            batch_levels: false,
            also_make: false,
            install_root: false,
            verbose: false,
        }
    }

    fn levels_of(names: &[&[&str]]) -> Vec<BuildLevel> {
        names
            .iter()
            .map(|level| BuildLevel {
                modules: level.iter().map(|s| (*s).to_string()).collect(),
            })
            .collect()
    }

    /// Stub build tool that fails only for the module named in its -pl arg
    fn write_stub_tool(dir: &Path, failing_path: &str) -> String {
        let script = dir.join("fake-build-tool");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n# args: -B -pl <path> ... <goal>\nshift\nshift\nmodule=\"$1\"\nif [ \"$module\" = \"{failing_path}\" ]; then\n  echo \"BUILD FAILURE\"\n  exit 1\nfi\necho \"BUILD SUCCESS\"\nexit 0\n"
            ),
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_level_boundary_skip_propagation() {
        let temp = TempDir::new().unwrap();
        let registry =
            ModuleRegistry::from_modules(vec![module("a"), module("b"), module("c")]);
        let tool = write_stub_tool(temp.path(), "a");

        let executor = BuildExecutor::new(temp.path(), &registry, options(&tool));
        let summary = executor
            .execute(&levels_of(&[&["a"], &["b"], &["c"]]))
            .await;

        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.results[0].outcome, BuildOutcome::Failed);
        assert_eq!(summary.results[1].outcome, BuildOutcome::Skipped);
        assert_eq!(summary.results[2].outcome, BuildOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_siblings_in_failing_level_still_run() {
        let temp = TempDir::new().unwrap();
        let registry =
            ModuleRegistry::from_modules(vec![module("a"), module("b"), module("c")]);
        let tool = write_stub_tool(temp.path(), "b");

        let executor = BuildExecutor::new(temp.path(), &registry, options(&tool));
        let summary = executor.execute(&levels_of(&[&["a", "b"], &["c"]])).await;

        // a finishes naturally even though its sibling b failed
        assert_eq!(summary.results[0].outcome, BuildOutcome::Succeeded);
        assert_eq!(summary.results[1].outcome, BuildOutcome::Failed);
        assert_eq!(summary.results[2].outcome, BuildOutcome::Skipped);
        assert_eq!(summary.succeeded(), 1);
    }

    #[tokio::test]
    async fn test_launch_error_recorded_not_crashed() {
        let temp = TempDir::new().unwrap();
        let registry = ModuleRegistry::from_modules(vec![module("a")]);

        let executor = BuildExecutor::new(
            temp.path(),
            &registry,
            options("/nonexistent/fake-build-tool"),
        );
        let summary = executor.execute(&levels_of(&[&["a"]])).await;

        assert_eq!(summary.results[0].outcome, BuildOutcome::LaunchError);
        assert_eq!(
            summary.results[0].exit_code,
            defaults::EXIT_CODE_LAUNCH_ERROR
        );
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_timeout_recorded_distinctly() {
        let temp = TempDir::new().unwrap();
        let registry = ModuleRegistry::from_modules(vec![module("a")]);

        let script = temp.path().join("slow-tool");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let mut opts = options(&script.to_string_lossy());
        opts.timeout = Duration::from_millis(200);

        let executor = BuildExecutor::new(temp.path(), &registry, opts);
        let summary = executor.execute(&levels_of(&[&["a"]])).await;

        assert_eq!(summary.results[0].outcome, BuildOutcome::TimedOut);
        assert_eq!(summary.results[0].exit_code, defaults::EXIT_CODE_TIMED_OUT);
    }

    #[tokio::test]
    async fn test_batch_mode_apportions_duration() {
        let temp = TempDir::new().unwrap();
        let registry = ModuleRegistry::from_modules(vec![module("a"), module("b")]);
        let tool = write_stub_tool(temp.path(), "nothing-fails");

        let mut opts = options(&tool);
        opts.batch_levels = true;

        let executor = BuildExecutor::new(temp.path(), &registry, opts);
        let summary = executor.execute(&levels_of(&[&["a", "b"]])).await;

        assert_eq!(summary.succeeded(), 2);
        let d0 = summary.results[0].duration_seconds;
        let d1 = summary.results[1].duration_seconds;
        assert!((d0 - d1).abs() < f64::EPSILON, "batch durations are apportioned evenly");
    }

    #[tokio::test]
    async fn test_module_build_writes_log() {
        let temp = TempDir::new().unwrap();
        let registry = ModuleRegistry::from_modules(vec![module("a")]);
        let tool = write_stub_tool(temp.path(), "nothing-fails");

        let executor = BuildExecutor::new(temp.path(), &registry, options(&tool));
        let summary = executor.execute(&levels_of(&[&["a"]])).await;

        assert_eq!(summary.succeeded(), 1);
        let log = temp.path().join(".monoforge/logs/a.log");
        assert!(log.exists());
        assert!(std::fs::read_to_string(log).unwrap().contains("BUILD SUCCESS"));
    }
}
