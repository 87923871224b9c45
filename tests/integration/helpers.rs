//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
   <modelVersion>4.0.0</modelVersion>
   <groupId>org.infinispan</groupId>
   <artifactId>infinispan-parent</artifactId>
   <version>4.1.0-SNAPSHOT</version>
   <modules>
      <module>core</module>
   </modules>
</project>
"#;

pub const CORE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
   <parent>
      <groupId>org.infinispan</groupId>
      <artifactId>infinispan-parent</artifactId>
      <version>4.1.0-SNAPSHOT</version>
   </parent>
   <artifactId>infinispan-core</artifactId>
</project>
"#;

pub const VERSION_JAVA: &str = r#"package org.infinispan;

public class Version {
   private static final String major = "4.1";
   public static final String version = major + ".0.SNAPSHOT";
   static final byte[] version_id = {'4', '1', '0', 'S', 'N', 'A', 'P', 'S', 'H', 'O', 'T'};
}
"#;

pub const VERSION_SOURCE: &str = "core/src/main/java/org/infinispan/Version.java";

/// A project clone whose `origin` is a local bare repository
pub struct TestProject {
  _root: TempDir,
  /// Working clone the binary runs in
  pub path: PathBuf,
  /// Bare repository standing in for the upstream
  pub upstream: PathBuf,
  /// Empty directory used as $HOME so no user settings leak in
  pub home: PathBuf,
}

impl TestProject {
  /// Create a committed Maven-style project pushed to a bare upstream on
  /// `master`, with a build command that always fails
  pub fn new() -> Result<Self> {
    Self::with_settings(&["build_command = [\"false\"]"])
  }

  /// Same as [`TestProject::new`], with `extra` lines in the committed settings
  pub fn with_settings(extra: &[&str]) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("project");
    let upstream = root.path().join("upstream.git");
    let home = root.path().join("home");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(&home)?;

    git(root.path(), &["init", "--bare", "--initial-branch=master", "upstream.git"])?;
    git(&path, &["init", "--initial-branch=master"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(path.join("pom.xml"), ROOT_POM)?;
    std::fs::create_dir_all(path.join("core/src/main/java/org/infinispan"))?;
    std::fs::write(path.join("core/pom.xml"), CORE_POM)?;
    std::fs::write(path.join(VERSION_SOURCE), VERSION_JAVA)?;
    std::fs::write(path.join(".gitignore"), "target/\n.tmp/\n")?;

    let project = Self {
      _root: root,
      path,
      upstream,
      home,
    };
    project.write_settings(extra)?;

    git(&project.path, &["add", "."])?;
    git(&project.path, &["commit", "-m", "Initial project setup"])?;

    let upstream_url = project.upstream.to_string_lossy().into_owned();
    git(&project.path, &["remote", "add", "origin", &upstream_url])?;
    git(&project.path, &["push", "origin", "master"])?;

    Ok(project)
  }

  /// Write release.toml with the test destinations plus `extra` top-level lines
  pub fn write_settings(&self, extra: &[&str]) -> Result<()> {
    let settings = format!(
      r#"dry_run = true
upstream_url = "upstream.git"
{}

[destinations]
docs = "docs.example.org:/htdocs/infinispan"
binaries = "frs.example.org:/infinispan"
schema = "docs.example.org:/htdocs/infinispan/schemas"
"#,
      extra.join("\n")
    );
    std::fs::write(self.path.join("release.toml"), settings)?;
    Ok(())
  }

  /// Leave the `-all.zip` a successful build would produce in target/distribution
  pub fn write_distribution(&self, version: &str) -> Result<PathBuf> {
    let dist = self.path.join("target/distribution");
    std::fs::create_dir_all(&dist)?;
    let archive = dist.join(format!("infinispan-{}-all.zip", version));

    let top = format!("infinispan-{}", version);
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&archive)?);
    for (name, content) in [
      ("doc/apidocs/index.html", "<html/>"),
      ("etc/schema/infinispan-config-4.1.xsd", "<xs:schema/>"),
      ("lib/infinispan-core.jar", "jar"),
    ] {
      zip.start_file(format!("{}/{}", top, name), zip::write::FileOptions::default())?;
      zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    Ok(archive)
  }

  /// Run release-train in the clone, feeding `stdin` to its prompts
  pub fn run(&self, args: &[&str], stdin: &str) -> Result<Output> {
    run_release_train(&self.path, &self.home, args, stdin)
  }

  /// `git status --porcelain`, empty when the tree is clean
  pub fn status(&self) -> Result<String> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Local branch names
  pub fn branches(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["branch", "--format=%(refname:short)"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Tag names
  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Get git log
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the release-train binary; failures are returned, not raised
pub fn run_release_train(cwd: &Path, home: &Path, args: &[&str], stdin: &str) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-train");

  let mut child = Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env("HOME", home)
    .env_remove("RUST_LOG")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to run release-train")?;

  if let Some(mut input) = child.stdin.take() {
    // The process may exit before reading; a broken pipe is fine
    let _ = input.write_all(stdin.as_bytes());
  }

  child.wait_with_output().context("Failed to wait for release-train")
}

/// stdout and stderr, for assertion messages
pub fn describe(output: &Output) -> String {
  format!(
    "status: {:?}\nstdout: {}\nstderr: {}",
    output.status.code(),
    String::from_utf8_lossy(&output.stdout),
    String::from_utf8_lossy(&output.stderr)
  )
}
