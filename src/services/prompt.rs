//! Interactive confirmation

use crate::core::error::{ReleaseResult, ResultExt};
use std::io::{self, BufRead, Write};

/// Asks the release manager a yes/no question
pub trait Prompt {
  /// True only for an explicit affirmative answer
  fn confirm(&self, question: &str) -> ReleaseResult<bool>;
}

/// Whether an answer counts as "yes" (anything starting with y/Y)
pub fn is_affirmative(answer: &str) -> bool {
  answer.trim_start().to_uppercase().starts_with('Y')
}

/// Reads answers from stdin; an empty answer means the default, "N"
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
  fn confirm(&self, question: &str) -> ReleaseResult<bool> {
    print!("{} [N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
      .lock()
      .read_line(&mut input)
      .context("Failed to read input")?;

    let answer = input.trim();
    let answer = if answer.is_empty() { "N" } else { answer };
    Ok(is_affirmative(answer))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_affirmative() {
    for yes in ["y", "Y", "yes", "YES", "yep", " y"] {
      assert!(is_affirmative(yes), "{:?}", yes);
    }
    for no in ["", "n", "N", "no", "sure", "1", "ok"] {
      assert!(!is_affirmative(no), "{:?}", no);
    }
  }
}
