//! Default configuration values

/// Default build tool executable
pub const DEFAULT_BUILD_TOOL: &str = "mvn";

/// Default build goal passed to the build tool
pub const DEFAULT_GOAL: &str = "install";

/// Default per-module build timeout in seconds
pub const DEFAULT_MODULE_TIMEOUT_SECS: u64 = 1800;

/// Workspace manifest file name
pub const WORKSPACE_MANIFEST: &str = "monoforge.toml";

/// Directory holding monoforge run state (logs, caches)
pub const STATE_DIR: &str = ".monoforge";

/// Per-module build log directory, under [`STATE_DIR`]
pub const LOGS_DIR: &str = "logs";

/// Change detection cache file, under [`STATE_DIR`]
pub const CHANGES_CACHE_FILE: &str = "changes-cache.json";

/// Exit code recorded for modules skipped after an upstream failure.
/// Negative so it can never collide with a real subprocess exit status.
pub const EXIT_CODE_SKIPPED: i32 = -2;

/// Exit code recorded when the build subprocess could not be launched
pub const EXIT_CODE_LAUNCH_ERROR: i32 = -3;

/// Exit code recorded when the build subprocess was killed on timeout
pub const EXIT_CODE_TIMED_OUT: i32 = -4;

/// Substrings that mark a subprocess output line as worth showing.
/// Display enrichment only; the exit code stays authoritative.
pub const INTERESTING_OUTPUT_MARKERS: &[&str] = &[
    "BUILD SUCCESS",
    "BUILD FAILURE",
    "[ERROR]",
    "ERROR]",
    "Tests run:",
    "Building ",
    "Total time:",
    "npm ERR!",
];

/// GitHub REST API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Environment variables consulted for the GitHub token, in order
pub const GITHUB_TOKEN_ENV_VARS: &[&str] = &["MONOFORGE_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
