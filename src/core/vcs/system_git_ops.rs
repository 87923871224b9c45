//! Release operations for SystemGit (branches, commits, tags, remotes)

use super::VersionControl;
use super::system_git::SystemGit;
use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use crate::utils::path_to_git_format;
use std::path::{Path, PathBuf};

impl SystemGit {
  /// List all remotes as (name, fetch URL)
  pub fn list_remotes(&self) -> ReleaseResult<Vec<(String, String)>> {
    let output = self
      .git_cmd()
      .args(["remote", "-v"])
      .output()
      .context("Failed to list remotes")?;

    if !output.status.success() {
      return Ok(vec![]);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut remotes = Vec::new();

    for line in stdout.lines() {
      // Format: "origin  git@github.com:user/repo.git (fetch)"
      let parts: Vec<&str> = line.split_whitespace().collect();
      if parts.len() >= 2 && line.contains("(fetch)") {
        remotes.push((parts[0].to_string(), parts[1].to_string()));
      }
    }

    Ok(remotes)
  }

  /// Get remote URL
  pub fn get_remote_url(&self, name: &str) -> ReleaseResult<Option<String>> {
    let remotes = self.list_remotes()?;
    Ok(remotes.iter().find(|(n, _)| n == name).map(|(_, url)| url.clone()))
  }

  /// Whether `branch` has a head on the remote (`git ls-remote --heads`)
  fn remote_head_exists(&self, branch: &str) -> ReleaseResult<bool> {
    let refspec = format!("refs/heads/{}", branch);
    let output = self.run(&["ls-remote", "--heads", &self.remote, &refspec])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  /// Path as git expects it: relative to the repository when inside it
  fn git_path(&self, path: &Path) -> String {
    let relative = path
      .strip_prefix(&self.repo_path)
      .or_else(|_| path.strip_prefix(&self.work_tree))
      .unwrap_or(path);
    path_to_git_format(relative)
  }

  /// Whether the index differs from HEAD for any of `paths`
  fn has_staged_changes(&self, paths: &[String]) -> ReleaseResult<bool> {
    let output = self
      .git_cmd()
      .args(["diff", "--cached", "--quiet", "--"])
      .args(paths)
      .output()
      .context("Failed to compare the index with HEAD")?;

    match output.status.code() {
      Some(0) => Ok(false),
      Some(1) => Ok(true),
      _ => Err(ReleaseError::Git(GitError::CommandFailed {
        command: "git diff --cached".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      })),
    }
  }

  fn push(&self, args: &[&str], refspec: &str) -> ReleaseResult<()> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: self.remote.clone(),
        refspec: refspec.to_string(),
        reason: stderr.to_string(),
      }));
    }

    Ok(())
  }
}

impl VersionControl for SystemGit {
  fn remote_branch_exists(&self, branch: &str) -> ReleaseResult<bool> {
    self.remote_head_exists(branch)
  }

  fn switch_to_branch(&self, branch: &str) -> ReleaseResult<()> {
    // Picks up a tracking branch when only the remote one exists
    self.run(&["checkout", branch])?;
    Ok(())
  }

  fn create_tag_branch(&self, working_branch: &str) -> ReleaseResult<()> {
    self.run(&["checkout", "-b", working_branch])?;
    Ok(())
  }

  fn commit(&self, files: &[PathBuf], message: &str) -> ReleaseResult<()> {
    if files.is_empty() {
      return Err(ReleaseError::message("Refusing to create an empty release commit"));
    }

    let paths: Vec<String> = files.iter().map(|f| self.git_path(f)).collect();

    let mut add_args = vec!["add", "--"];
    add_args.extend(paths.iter().map(String::as_str));
    self.run(&add_args)?;

    if !self.has_staged_changes(&paths)? {
      println!("   ⚠️  Every file is already at this version; nothing to commit");
      return Ok(());
    }

    // --only: the commit holds exactly these paths, whatever else is staged
    let mut commit_args = vec!["commit", "--only", "-m", message, "--"];
    commit_args.extend(paths.iter().map(String::as_str));
    self.run(&commit_args)?;

    println!("   ✅ Committed {} file(s)", files.len());
    Ok(())
  }

  fn tag_for_release(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message])?;
    println!("   ✅ Created tag: {}", tag);
    Ok(())
  }

  fn push_to_origin(&self, tag: &str) -> ReleaseResult<()> {
    println!("   Pushing tag {} to '{}'...", tag, self.remote);
    let refspec = format!("refs/tags/{}", tag);
    self.push(&["push", &self.remote, &refspec], &refspec)?;
    println!("   ✅ Pushed {} to {}", tag, self.remote);
    Ok(())
  }

  fn cleanup(&self, branch: &str, working_branch: &str) -> ReleaseResult<()> {
    self.run(&["checkout", branch])?;
    self.run(&["branch", "-D", working_branch])?;

    if self.remote_head_exists(working_branch)? {
      let refspec = format!("refs/heads/{}", working_branch);
      self.push(&["push", &self.remote, "--delete", working_branch], &refspec)?;
    }

    println!("   ✅ Removed transient branch {}", working_branch);
    Ok(())
  }

  fn is_upstream_clone(&self, upstream_url: &str) -> ReleaseResult<bool> {
    let url = self.get_remote_url(&self.remote)?;
    tracing::debug!(remote = %self.remote, url = ?url, "checking upstream clone");
    Ok(url.is_some_and(|u| u.contains(upstream_url)))
  }
}
