//! Version patcher for build-configuration files
//!
//! Three fields may carry the project version, all addressed from the root
//! element by local name (namespace prefixes are ignored):
//!
//! - self-version: `<root>/version`
//! - parent-version: `<root>/parent/version`
//! - property-version: `<root>/properties/project-version`
//!
//! The document is only *scanned*; each located field's text is replaced by
//! byte span in the original content. Declarations, namespace prefixes,
//! comments, whitespace and attribute order are never re-serialized, so they
//! come out exactly as they went in.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::release::version::Version;
use crate::utils::write_atomic;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Where a version is declared inside a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionField {
  SelfVersion,
  ParentVersion,
  PropertyVersion,
}

impl VersionField {
  pub const ALL: [VersionField; 3] = [
    VersionField::ParentVersion,
    VersionField::SelfVersion,
    VersionField::PropertyVersion,
  ];

  /// Element path below the root element
  fn path(self) -> &'static [&'static [u8]] {
    match self {
      VersionField::SelfVersion => &[b"version"],
      VersionField::ParentVersion => &[b"parent", b"version"],
      VersionField::PropertyVersion => &[b"properties", b"project-version"],
    }
  }

  fn matches(self, stack: &[Vec<u8>]) -> bool {
    let path = self.path();
    stack.len() == path.len() + 1 && stack[1..].iter().zip(path).all(|(a, b)| a.as_slice() == *b)
  }
}

impl fmt::Display for VersionField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionField::SelfVersion => write!(f, "version"),
      VersionField::ParentVersion => write!(f, "parent/version"),
      VersionField::PropertyVersion => write!(f, "properties/project-version"),
    }
  }
}

/// A located field: the byte range to replace and what is there now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpan {
  pub field: VersionField,
  range: Range<usize>,
  /// Raw element name when the field was written as `<version/>`
  empty_tag: Option<Vec<u8>>,
  pub current: String,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Locate every version field in `content` (first occurrence of each kind).
///
/// Works on raw bytes so any ASCII-compatible encoding is accepted. Ranges
/// index into `content` itself, leading byte order mark included.
///
/// Errors carry a human-readable reason; the caller attaches the path.
pub fn locate_fields(content: &[u8]) -> Result<Vec<FieldSpan>, String> {
  // The reader drops a BOM without counting it in its positions
  let bom = if content.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
  let mut reader = Reader::from_reader(&content[bom..]);
  let mut stack: Vec<Vec<u8>> = Vec::new();
  let mut open: Option<(VersionField, usize)> = None;
  let mut spans: Vec<FieldSpan> = Vec::new();
  let mut saw_root = false;

  let found = |spans: &[FieldSpan], field: VersionField| spans.iter().any(|s| s.field == field);

  loop {
    let before = bom + reader.buffer_position() as usize;
    let event = reader
      .read_event()
      .map_err(|e| format!("{} (at byte {})", e, bom as u64 + reader.error_position()))?;
    let after = bom + reader.buffer_position() as usize;

    match event {
      Event::Start(e) => {
        if stack.is_empty() {
          if saw_root {
            return Err("more than one root element".to_string());
          }
          saw_root = true;
        }
        stack.push(e.local_name().as_ref().to_vec());
        if open.is_none()
          && let Some(field) = VersionField::ALL
            .into_iter()
            .find(|f| f.matches(&stack) && !found(&spans, *f))
        {
          open = Some((field, after));
        }
      }
      Event::End(_) => {
        if let Some((field, start)) = open
          && stack.len() == field.path().len() + 1
        {
          let text = content
            .get(start..before)
            .ok_or_else(|| format!("{} spans bytes {}..{} outside the document", field, start, before))?;
          spans.push(FieldSpan {
            field,
            range: start..before,
            empty_tag: None,
            current: String::from_utf8_lossy(text).trim().to_string(),
          });
          open = None;
        }
        stack.pop();
      }
      Event::Empty(e) => {
        if stack.is_empty() {
          if saw_root {
            return Err("more than one root element".to_string());
          }
          saw_root = true;
          continue;
        }
        stack.push(e.local_name().as_ref().to_vec());
        if open.is_none()
          && let Some(field) = VersionField::ALL
            .into_iter()
            .find(|f| f.matches(&stack) && !found(&spans, *f))
        {
          spans.push(FieldSpan {
            field,
            range: before..after,
            empty_tag: Some(e.name().as_ref().to_vec()),
            current: String::new(),
          });
        }
        stack.pop();
      }
      Event::Eof => break,
      _ => {}
    }
  }

  if !stack.is_empty() {
    return Err(format!(
      "unexpected end of document, <{}> is never closed",
      String::from_utf8_lossy(&stack[stack.len() - 1])
    ));
  }
  if !saw_root {
    return Err("no root element".to_string());
  }

  spans.sort_by_key(|s| s.range.start);
  Ok(spans)
}

/// Rewrite every located field to `version`.
///
/// The version is ASCII, so splicing it in keeps the file's encoding.
/// Returns `None` when the document has no version field at all.
pub fn patch_content(content: &[u8], version: &Version) -> Result<Option<Vec<u8>>, String> {
  let spans = locate_fields(content)?;
  if spans.is_empty() {
    return Ok(None);
  }

  let version = version.as_str().as_bytes();
  let mut out = Vec::with_capacity(content.len() + spans.len() * version.len());
  let mut cursor = 0;
  for span in &spans {
    let kept = content
      .get(cursor..span.range.start)
      .ok_or_else(|| format!("{} overlaps a previous field", span.field))?;
    out.extend_from_slice(kept);
    match &span.empty_tag {
      Some(name) => {
        out.push(b'<');
        out.extend_from_slice(name);
        out.push(b'>');
        out.extend_from_slice(version);
        out.extend_from_slice(b"</");
        out.extend_from_slice(name);
        out.push(b'>');
      }
      None => out.extend_from_slice(version),
    }
    cursor = span.range.end;
  }
  out.extend_from_slice(content.get(cursor..).unwrap_or_default());

  Ok(Some(out))
}

/// Patch one configuration file in place.
///
/// Returns whether the file declares at least one version field. A file
/// without any is left untouched on disk; a file that does not parse aborts
/// the release.
pub fn patch(path: &Path, version: &Version) -> ReleaseResult<bool> {
  tracing::debug!("Patching {}", path.display());
  let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

  let spans = locate_fields(&content).map_err(|reason| ReleaseError::Parse {
    path: path.to_path_buf(),
    reason,
  })?;
  for span in &spans {
    tracing::debug!("{} is {:?}. Setting to {}", span.field, span.current, version);
  }

  let patched = patch_content(&content, version).map_err(|reason| ReleaseError::Parse {
    path: path.to_path_buf(),
    reason,
  })?;

  let Some(patched) = patched else {
    tracing::debug!("{} doesn't need updating; nothing replaced", path.display());
    return Ok(false);
  };

  if patched != content {
    write_atomic(path, &patched)?;
    tracing::debug!(" ... updated {}", path.display());
  }

  Ok(true)
}
