//! Version constants in the generated source file
//!
//! Two lines are rewritten, everything else passes through untouched:
//!
//! ```text
//! static final byte[] version_id = {'4', '1', '1', 'B', 'E', 'T', 'A', '1'};
//! public static final String version = major + ".1.BETA1";
//! ```

use crate::core::error::{ReleaseResult, ResultExt};
use crate::release::version::Version;
use crate::utils::write_atomic;
use regex::Regex;
use std::fs;
use std::path::Path;

const VERSION_ID_MARKER: &str = "static final byte[] version_id = ";
const VERSION_STRING_MARKER: &str = "public static final String version =";

/// `{'4', '1', '1', 'B', 'E', 'T', 'A', '1'}`: one element per character, dots dropped
pub fn version_id_literal(version: &Version) -> String {
  let elements: Vec<String> = version
    .as_str()
    .chars()
    .filter(|c| *c != '.')
    .map(|c| format!("'{}'", c))
    .collect();
  format!("{{{}}}", elements.join(", "))
}

/// `.1.BETA1`: micro and qualifier, appended to the major constant
pub fn major_suffix(version: &Version) -> String {
  format!(".{}.{}", version.micro(), version.qualifier())
}

/// Rewrite both constants in `content`, preserving line endings
pub fn patch_source_content(content: &str, version: &Version) -> ReleaseResult<String> {
  let version_id = Regex::new(r"version_id = .*;")?;
  let version_string = Regex::new(r#"version\s*=\s*major\s*\+\s*"[A-Za-z0-9.\-]*";"#)?;

  let id_replacement = format!("version_id = {};", version_id_literal(version));
  let string_replacement = format!("version = major + \"{}\";", major_suffix(version));

  let mut out = String::with_capacity(content.len());
  for line in content.split_inclusive('\n') {
    if line.contains(VERSION_ID_MARKER) {
      out.push_str(&version_id.replace(line, regex::NoExpand(&id_replacement)));
    } else if line.contains(VERSION_STRING_MARKER) {
      out.push_str(&version_string.replace(line, regex::NoExpand(&string_replacement)));
    } else {
      out.push_str(line);
    }
  }

  Ok(out)
}

/// Patch the generated source file in place (temp file, then replace)
pub fn patch_source(path: &Path, version: &Version) -> ReleaseResult<()> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let patched = patch_source_content(&content, version)?;
  write_atomic(path, patched.as_bytes()).with_context(|| format!("Failed to write {}", path.display()))?;
  tracing::debug!(" ... updated {}", path.display());
  Ok(())
}
