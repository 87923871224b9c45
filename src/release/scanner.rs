//! Configuration tree scanner
//!
//! Finds every build-configuration file that may carry a version: the root
//! file, one file per module declared in it (declaration order), then
//! anything else with the canonical name found by walking the tree. Each path
//! appears once, at its first-seen position.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Scan `root` for configuration files named `file_name`.
///
/// Directories whose name is in `exclude` are not descended into.
pub fn scan(root: &Path, file_name: &str, exclude: &[String]) -> ReleaseResult<Vec<PathBuf>> {
  let root_file = root.join(file_name);
  let modules = declared_modules(&root_file)?;
  tracing::debug!(modules = ?modules, "declared modules");

  let mut files = vec![normalize(&root_file)];
  for module in &modules {
    let path = normalize(&root.join(module).join(file_name));
    if path.is_file() {
      push_unique(&mut files, path);
    } else {
      tracing::warn!("module {} has no {}; skipped", module, file_name);
    }
  }

  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| {
      entry.depth() == 0
        || !entry.file_type().is_dir()
        || !exclude.iter().any(|ex| entry.file_name() == ex.as_str())
    });

  for entry in walker {
    let entry = entry?;
    if entry.file_type().is_file() && entry.file_name() == file_name {
      push_unique(&mut files, normalize(entry.path()));
    }
  }

  Ok(files)
}

/// Module paths declared in a configuration file, in document order.
///
/// Every `<module>` element counts, including ones inside profiles.
pub fn declared_modules(path: &Path) -> ReleaseResult<Vec<String>> {
  let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let parse_error = |reason: String| ReleaseError::Parse {
    path: path.to_path_buf(),
    reason,
  };

  let mut reader = Reader::from_reader(content.as_slice());
  let mut modules = Vec::new();
  let mut current: Option<String> = None;

  loop {
    match reader.read_event() {
      Ok(Event::Start(e)) if e.local_name().as_ref() == b"module" => current = Some(String::new()),
      Ok(Event::Text(t)) => {
        if let Some(text) = current.as_mut() {
          let unescaped = t.unescape().map_err(|e| parse_error(e.to_string()))?;
          text.push_str(&unescaped);
        }
      }
      Ok(Event::End(e)) if e.local_name().as_ref() == b"module" => {
        if let Some(text) = current.take() {
          let text = text.trim();
          if !text.is_empty() {
            modules.push(text.to_string());
          }
        }
      }
      Ok(Event::Eof) => break,
      Ok(_) => {}
      Err(e) => {
        return Err(parse_error(format!(
          "{} (at byte {})",
          e,
          reader.error_position()
        )));
      }
    }
  }

  Ok(modules)
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
  if !files.contains(&path) {
    files.push(path);
  }
}

/// Lexical normalization so `./core/pom.xml` and `core/pom.xml` compare equal
fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir if matches!(out.components().next_back(), Some(Component::Normal(_))) => {
        out.pop();
      }
      other => out.push(other.as_os_str()),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modules>
    <module>parent</module>
    <module>core</module>
    <module>./tools/</module>
  </modules>
  <profiles>
    <profile>
      <modules>
        <module>demos/gui</module>
      </modules>
    </profile>
  </profiles>
</project>
"#;

  #[test]
  fn test_declared_modules_in_document_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pom.xml", ROOT_POM);
    let modules = declared_modules(&dir.path().join("pom.xml")).unwrap();
    assert_eq!(modules, vec!["parent", "core", "./tools/", "demos/gui"]);
  }

  #[test]
  fn test_scan_orders_declared_then_walked_without_duplicates() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pom.xml", ROOT_POM);
    for module in ["parent", "core", "tools", "demos/gui"] {
      write(root, &format!("{}/pom.xml", module), "<project/>");
    }
    // Not declared anywhere
    write(root, "cachestore/jdbc/pom.xml", "<project/>");
    write(root, "a-orphan/pom.xml", "<project/>");

    let files = scan(root, "pom.xml", &[".git".to_string()]).unwrap();
    let rel: Vec<PathBuf> = files
      .iter()
      .map(|f| f.strip_prefix(normalize(root)).unwrap().to_path_buf())
      .collect();

    assert_eq!(
      rel,
      vec![
        PathBuf::from("pom.xml"),
        PathBuf::from("parent/pom.xml"),
        PathBuf::from("core/pom.xml"),
        PathBuf::from("tools/pom.xml"),
        PathBuf::from("demos/gui/pom.xml"),
        PathBuf::from("a-orphan/pom.xml"),
        PathBuf::from("cachestore/jdbc/pom.xml"),
      ]
    );
  }

  #[test]
  fn test_declared_module_without_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pom.xml", ROOT_POM);
    write(root, "core/pom.xml", "<project/>");

    let files = scan(root, "pom.xml", &[]).unwrap();
    assert_eq!(
      files,
      vec![normalize(&root.join("pom.xml")), normalize(&root.join("core/pom.xml"))]
    );
  }

  #[test]
  fn test_scan_skips_excluded_directories() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pom.xml", "<project/>");
    write(root, ".git/pom.xml", "<project/>");
    write(root, "target/classes/pom.xml", "<project/>");
    write(root, "module/pom.xml", "<project/>");

    let files = scan(root, "pom.xml", &[".git".to_string(), "target".to_string()]).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| !f.to_string_lossy().contains("target")));
  }

  #[test]
  fn test_scan_matches_exact_file_name() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "pom.xml", "<project/>");
    write(root, "core/pom.xml.bak", "<project/>");
    write(root, "core/my-pom.xml", "<project/>");

    let files = scan(root, "pom.xml", &[]).unwrap();
    assert_eq!(files, vec![normalize(&root.join("pom.xml"))]);
  }

  #[test]
  fn test_declared_modules_accept_latin1_and_byte_order_mark() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pom.xml");
    fs::write(
      &path,
      b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<project>\n  <name>Caf\xE9</name>\n  <modules><module>core</module></modules>\n</project>\n",
    )
    .unwrap();
    assert_eq!(declared_modules(&path).unwrap(), vec!["core"]);

    fs::write(&path, format!("\u{feff}{}", ROOT_POM)).unwrap();
    assert_eq!(declared_modules(&path).unwrap().len(), 4);
  }

  #[test]
  fn test_malformed_root_is_parse_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pom.xml", "<project><modules><module>core</modules></project>");
    let err = scan(dir.path(), "pom.xml", &[]).unwrap_err();
    assert!(matches!(err, ReleaseError::Parse { .. }));
  }

  #[test]
  fn test_missing_root_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(scan(dir.path(), "pom.xml", &[]).is_err());
  }

  #[test]
  fn test_normalize() {
    assert_eq!(normalize(Path::new("/a/./b/../c/pom.xml")), PathBuf::from("/a/c/pom.xml"));
    assert_eq!(normalize(Path::new("./core/pom.xml")), PathBuf::from("core/pom.xml"));
    assert_eq!(normalize(Path::new("../x/pom.xml")), PathBuf::from("../x/pom.xml"));
  }
}
