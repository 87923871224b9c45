//! Integration tests for the `release-train` command

use crate::helpers::{CORE_POM, ROOT_POM, TestProject, describe, git};
use anyhow::Result;

#[test]
fn test_no_version_prints_usage() -> Result<()> {
  let project = TestProject::new()?;

  for args in [&[][..], &["--help"][..]] {
    let output = project.run(args, "")?;
    assert_eq!(output.status.code(), Some(0), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "{}", describe(&output));
  }

  Ok(())
}

#[test]
fn test_invalid_version_fails_with_usage() -> Result<()> {
  let project = TestProject::new()?;

  for bad in ["4.1", "4.1.1", "4.1.1.BETA-1", "v4.1.1.FINAL"] {
    let output = project.run(&[bad], "y\n")?;
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("Invalid version '{}'", bad)), "{}", describe(&output));
    assert!(stderr.contains("Usage"), "{}", describe(&output));
  }

  assert_eq!(project.status()?, "");
  Ok(())
}

#[test]
fn test_missing_settings_is_fatal() -> Result<()> {
  let project = TestProject::new()?;
  std::fs::remove_file(project.path.join("release.toml"))?;

  let output = project.run(&["4.1.1.BETA1"], "y\n")?;
  assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("No release settings found"), "{}", describe(&output));
  assert!(stderr.contains(".release-train.toml"), "{}", describe(&output));

  // Nothing was asked, nothing was touched
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(!stdout.contains("Are you sure"));
  assert_eq!(project.read_file("pom.xml")?, ROOT_POM);
  Ok(())
}

#[test]
fn test_explicit_settings_path_is_the_only_candidate() -> Result<()> {
  let project = TestProject::new()?;

  let output = project.run(&["--settings", "elsewhere.toml", "4.1.1.BETA1"], "y\n")?;
  assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("elsewhere.toml"), "{}", describe(&output));
  assert!(!stderr.contains(".release-train.toml"), "{}", describe(&output));
  Ok(())
}

#[test]
fn test_branch_missing_upstream_exits_100() -> Result<()> {
  let project = TestProject::new()?;

  let output = project.run(&["4.1.1.BETA1", "4.1.x"], "y\n")?;
  assert_eq!(output.status.code(), Some(100), "{}", describe(&output));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Branch 4.1.x cannot be found"), "{}", describe(&output));

  // No transient branch, no commit, no patched files
  assert_eq!(project.branches()?, vec!["master"]);
  assert_eq!(project.git_log(5)?, vec!["Initial project setup"]);
  assert_eq!(project.read_file("pom.xml")?, ROOT_POM);
  assert_eq!(project.status()?, "");
  Ok(())
}

#[test]
fn test_declined_confirmation_leaves_tree_untouched() -> Result<()> {
  let project = TestProject::new()?;

  // "n", an empty answer and a closed stdin all mean no
  for answer in ["n\n", "\n", ""] {
    let output = project.run(&["4.1.1.BETA1"], answer)?;
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("User Abort"), "{}", describe(&output));
  }

  assert_eq!(project.branches()?, vec!["master"]);
  assert_eq!(project.status()?, "");
  assert_eq!(project.read_file("core/pom.xml")?, CORE_POM);
  Ok(())
}

#[test]
#[cfg(unix)]
fn test_build_failure_keeps_commit_but_never_tags() -> Result<()> {
  let project = TestProject::new()?;

  let output = project.run(&["4.1.1.beta1"], "y\n")?;
  assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Build failed"), "{}", describe(&output));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Step 3: Complete"), "{}", describe(&output));
  assert!(!stdout.contains("Step 4: Complete"), "{}", describe(&output));

  // Version bump committed on the transient branch
  let head = git(&project.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
  assert_eq!(String::from_utf8_lossy(&head.stdout).trim(), "__release_4.1.1.BETA1");
  assert_eq!(
    project.git_log(1)?,
    vec!["Release Script: update versions for 4.1.1.BETA1"]
  );
  assert_eq!(project.status()?, "");

  assert_eq!(
    project.read_file("pom.xml")?,
    ROOT_POM.replace("4.1.0-SNAPSHOT", "4.1.1.BETA1")
  );
  assert_eq!(
    project.read_file("core/pom.xml")?,
    CORE_POM.replace("4.1.0-SNAPSHOT", "4.1.1.BETA1")
  );
  let source = project.read_file(crate::helpers::VERSION_SOURCE)?;
  assert!(source.contains("major + \".1.BETA1\""));
  assert!(source.contains("{'4', '1', '1', 'B', 'E', 'T', 'A', '1'}"));

  // No permanent tag, locally or upstream
  assert!(project.tags()?.is_empty());
  let upstream_tags = git(&project.upstream, &["tag", "--list"])?;
  assert!(upstream_tags.stdout.is_empty());
  Ok(())
}

#[test]
#[cfg(unix)]
fn test_dry_run_tags_locally_and_leaves_upstream_alone() -> Result<()> {
  let project = TestProject::with_settings(&["build_command = [\"true\"]", "verbose = true"])?;
  project.write_distribution("4.1.1.BETA1")?;

  let output = project.run(&["4.1.1.BETA1"], "y\n")?;
  assert_eq!(output.status.code(), Some(0), "{}", describe(&output));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Step 7: Complete"), "{}", describe(&output));
  assert!(stdout.contains("[dry run] rsync"), "{}", describe(&output));
  assert!(stdout.contains("[dry run] scp"), "{}", describe(&output));
  assert!(stdout.contains("[dry run] Not pushing 4.1.1.BETA1"), "{}", describe(&output));

  // Verbose settings take effect before the settings file is reported
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("loaded release settings"), "{}", describe(&output));

  // Transient branch and tag stay behind locally
  let mut branches = project.branches()?;
  branches.sort();
  assert_eq!(branches, vec!["__release_4.1.1.BETA1", "master"]);
  assert_eq!(project.tags()?, vec!["4.1.1.BETA1"]);
  let tagged = git(&project.path, &["log", "-1", "--format=%s", "4.1.1.BETA1"])?;
  assert_eq!(
    String::from_utf8_lossy(&tagged.stdout).trim(),
    "Release Script: update versions for 4.1.1.BETA1"
  );
  assert_eq!(project.status()?, "");

  // Upstream only ever saw the initial push
  let upstream_tags = git(&project.upstream, &["tag", "--list"])?;
  assert!(upstream_tags.stdout.is_empty());
  let upstream_heads = git(&project.upstream, &["branch", "--format=%(refname:short)"])?;
  assert_eq!(String::from_utf8_lossy(&upstream_heads.stdout).trim(), "master");
  Ok(())
}
