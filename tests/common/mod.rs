//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test workspace context
///
/// Creates a temporary directory for test workspaces and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test workspace
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test workspace in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test workspace directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test workspace
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test workspace
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test workspace
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Workspace manifest using a stub build tool in the workspace root
#[allow(dead_code)]
pub fn manifest_with_stub_tool() -> &'static str {
    r#"
[workspace]
name = "test-workspace"
group = "com.example"

[build]
tool = "./fake-mvn"
goal = "install"
jobs = 2
timeout_secs = 60
"#
}

/// Write a root pom declaring the given module paths
#[allow(dead_code)]
pub fn write_root_pom(project: &TestProject, module_paths: &[&str]) {
    let modules = module_paths
        .iter()
        .map(|p| format!("        <module>{p}</module>"))
        .collect::<Vec<_>>()
        .join("\n");
    project.create_file(
        "pom.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
    <groupId>com.example</groupId>
    <artifactId>test-workspace</artifactId>
    <version>1.0.0</version>
    <packaging>pom</packaging>
    <modules>
{modules}
    </modules>
</project>
"#
        ),
    );
}

/// Write a module pom with internal dependencies on other modules
#[allow(dead_code)]
pub fn write_module_pom(project: &TestProject, path: &str, name: &str, deps: &[&str]) {
    let dependencies = deps
        .iter()
        .map(|d| {
            format!(
                "        <dependency>\n            <groupId>com.example</groupId>\n            <artifactId>{d}</artifactId>\n            <version>1.0.0</version>\n        </dependency>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    project.create_file(
        &format!("{path}/pom.xml"),
        &format!(
            r#"<project>
    <groupId>com.example</groupId>
    <artifactId>{name}</artifactId>
    <version>1.0.0</version>
    <dependencies>
{dependencies}
    </dependencies>
</project>
"#
        ),
    );
}

/// Install the stub build tool script into the workspace root.
///
/// The stub understands the executor's invocation convention: without a
/// `-pl` argument it acts as the root install step; with one it logs the
/// selection to builds.log and fails iff a `fail-<selection>` marker file
/// exists.
#[allow(dead_code)]
pub fn write_stub_build_tool(project: &TestProject) {
    let script = r#"#!/bin/sh
selection=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-pl" ]; then
    selection="$arg"
  fi
  prev="$arg"
done
if [ -z "$selection" ]; then
  echo "root install"
  exit 0
fi
echo "$selection" >> builds.log
if [ -f "fail-$selection" ]; then
  echo "BUILD FAILURE"
  exit 1
fi
echo "BUILD SUCCESS"
exit 0
"#;
    project.create_file("fake-mvn", script);
    make_executable(&project.path().join("fake-mvn"));
}

/// Mark a file as executable
#[allow(dead_code)]
pub fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .expect("stat script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod script");
}

/// Scaffold a complete workspace: manifest, root pom, linear chain of
/// modules a -> b -> c and the stub build tool
#[allow(dead_code)]
pub fn scaffold_chain_workspace(project: &TestProject) {
    project.create_file("monoforge.toml", manifest_with_stub_tool());
    write_root_pom(project, &["module-a", "module-b", "module-c"]);
    write_module_pom(project, "module-a", "module-a", &[]);
    write_module_pom(project, "module-b", "module-b", &["module-a"]);
    write_module_pom(project, "module-c", "module-c", &["module-b"]);
    write_stub_build_tool(project);
}
