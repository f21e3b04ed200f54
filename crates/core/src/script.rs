//! Script source storage and static metadata extraction.
//!
//! Script sources are plain `.py` files, one per script, named after the
//! script. Metadata (description, declared imports) is extracted by parsing
//! the source text; scripts are never loaded or executed to inspect them.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use scriptbox_platform::Paths;

use crate::manifest::StoreError;
use crate::stdlib;

/// Normalize a user-supplied script name: blanks become dashes.
pub fn normalize_name(raw: &str) -> String {
  raw.trim().replace(' ', "-")
}

/// Storage of script source files.
#[derive(Debug, Clone)]
pub struct ScriptStore {
  dir: PathBuf,
}

impl ScriptStore {
  pub fn new(paths: &Paths) -> Self {
    Self {
      dir: paths.scripts_dir(),
    }
  }

  /// Path of a script's source file.
  pub fn path(&self, name: &str) -> PathBuf {
    self.dir.join(format!("{name}.py"))
  }

  /// Whether a script source exists.
  pub fn exists(&self, name: &str) -> bool {
    self.path(name).is_file()
  }

  /// Read a script's source text.
  ///
  /// # Errors
  ///
  /// `StoreError::NotFound` if the script does not exist.
  pub fn read(&self, name: &str) -> Result<String, StoreError> {
    let path = self.path(name);
    if !path.is_file() {
      return Err(StoreError::NotFound {
        script: name.to_string(),
      });
    }
    Ok(fs::read_to_string(path)?)
  }

  /// Write a script's source text, replacing any previous content.
  ///
  /// # Errors
  ///
  /// Returns an I/O error if the file cannot be written.
  pub fn write(&self, name: &str, source: &str) -> Result<(), StoreError> {
    fs::create_dir_all(&self.dir)?;
    let path = self.path(name);
    fs::write(&path, source)?;
    debug!(script = name, path = %path.display(), "source saved");
    Ok(())
  }

  /// Delete a script's source file.
  ///
  /// # Errors
  ///
  /// `StoreError::NotFound` if the script does not exist.
  pub fn delete(&self, name: &str) -> Result<(), StoreError> {
    let path = self.path(name);
    if !path.is_file() {
      return Err(StoreError::NotFound {
        script: name.to_string(),
      });
    }
    fs::remove_file(path)?;
    debug!(script = name, "source deleted");
    Ok(())
  }

  /// Names of all scripts in the library, sorted.
  pub fn available(&self) -> Vec<String> {
    let Ok(entries) = fs::read_dir(&self.dir) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .filter_map(|e| e.ok())
      .filter_map(|e| {
        let path = e.path();
        if path.extension().is_some_and(|ext| ext == "py") {
          path.file_stem().map(|s| s.to_string_lossy().into_owned())
        } else {
          None
        }
      })
      .collect();
    names.sort();
    names
  }
}

/// Extract the third-party packages a script imports.
///
/// Recognizes `import a.b.c` (including comma-separated lists and aliases)
/// and `from a.b import c`, keeps the top-level package name, and drops
/// anything resolvable as part of the standard library. Relative imports
/// (`from . import x`) never name a third-party package and are skipped.
///
/// This is a line-oriented approximation of a real parser: imports inside
/// string literals are miscounted, multi-line parenthesized imports only
/// contribute their first line. Both are acceptable for dependency
/// declaration purposes.
pub fn extract_declared_imports(source: &str) -> BTreeSet<String> {
  let mut packages = BTreeSet::new();

  for line in source.lines() {
    let line = line.trim_start();

    if let Some(rest) = line.strip_prefix("import ") {
      // import a.b as x, c.d
      for item in rest.split(',') {
        let module = item.trim().split_whitespace().next().unwrap_or("");
        add_top_level(&mut packages, module);
      }
    } else if let Some(rest) = line.strip_prefix("from ") {
      // from a.b import c
      let module = rest.split_whitespace().next().unwrap_or("");
      if module.starts_with('.') {
        continue;
      }
      add_top_level(&mut packages, module);
    }
  }

  packages
}

fn add_top_level(packages: &mut BTreeSet<String>, module: &str) {
  let top = module.split('.').next().unwrap_or("");
  if top.is_empty() || !is_module_name(top) || stdlib::is_stdlib(top) {
    return;
  }
  packages.insert(top.to_string());
}

fn is_module_name(name: &str) -> bool {
  let mut chars = name.chars();
  chars.clone().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract a script's description from its source text.
///
/// Uses the module docstring (the first statement of the file, when it is a
/// string literal); falls back to the docstring of a top-level `main`
/// function. Returns an empty string when neither is present.
pub fn extract_description(source: &str) -> String {
  if let Some(doc) = module_docstring(source) {
    return doc;
  }
  main_docstring(source).unwrap_or_default()
}

fn module_docstring(source: &str) -> Option<String> {
  let mut lines = source.lines();
  for line in &mut lines {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("#!") {
      continue;
    }
    return docstring_at(trimmed, &mut lines);
  }
  None
}

fn main_docstring(source: &str) -> Option<String> {
  let mut lines = source.lines();
  while let Some(line) = lines.next() {
    if line.trim_start().starts_with("def main(") || line.trim_start().starts_with("def main (") {
      for body in &mut lines {
        let trimmed = body.trim();
        if trimmed.is_empty() {
          continue;
        }
        return docstring_at(trimmed, &mut lines);
      }
    }
  }
  None
}

/// Parse a docstring starting on `first`, consuming continuation lines from
/// `rest` until the closing quotes. Returns None if `first` does not open a
/// string literal.
fn docstring_at(first: &str, rest: &mut std::str::Lines<'_>) -> Option<String> {
  let delim = if first.starts_with("\"\"\"") {
    "\"\"\""
  } else if first.starts_with("'''") {
    "'''"
  } else if first.starts_with('"') || first.starts_with('\'') {
    // Single-quoted one-line docstring.
    let quote = &first[..1];
    let body = &first[1..];
    return body.find(quote).map(|end| body[..end].trim().to_string());
  } else {
    return None;
  };

  let body = &first[delim.len()..];
  if let Some(end) = body.find(delim) {
    return Some(body[..end].trim().to_string());
  }

  // Multi-line: collect until the closing delimiter; only the text matters,
  // so join with spaces and collapse blank lines away.
  let mut parts: Vec<String> = Vec::new();
  if !body.trim().is_empty() {
    parts.push(body.trim().to_string());
  }
  for line in rest {
    if let Some(end) = line.find(delim) {
      let tail = line[..end].trim();
      if !tail.is_empty() {
        parts.push(tail.to_string());
      }
      return Some(parts.join(" "));
    }
    let trimmed = line.trim();
    if !trimmed.is_empty() {
      parts.push(trimmed.to_string());
    }
  }
  // Unterminated docstring: treat what we collected as the description.
  Some(parts.join(" "))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn store() -> (TempDir, ScriptStore) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    paths.init().unwrap();
    let store = ScriptStore::new(&paths);
    (temp, store)
  }

  #[test]
  fn write_read_delete_round_trip() {
    let (_temp, store) = store();
    store.write("demo", "print('hi')\n").unwrap();
    assert!(store.exists("demo"));
    assert_eq!(store.read("demo").unwrap(), "print('hi')\n");
    store.delete("demo").unwrap();
    assert!(!store.exists("demo"));
    assert!(matches!(store.delete("demo"), Err(StoreError::NotFound { .. })));
  }

  #[test]
  fn available_ignores_non_python_files() {
    let (temp, store) = store();
    store.write("b", "").unwrap();
    store.write("a", "").unwrap();
    std::fs::write(temp.path().join("scripts/notes.txt"), "x").unwrap();
    assert_eq!(store.available(), vec!["a", "b"]);
  }

  #[test]
  fn normalize_replaces_blanks() {
    assert_eq!(normalize_name("my cool script"), "my-cool-script");
    assert_eq!(normalize_name("plain"), "plain");
  }

  #[test]
  fn imports_keep_top_level_third_party_packages() {
    let source = "
import os
import requests
import numpy.linalg as la
from rich.console import Console
from pathlib import Path
from . import sibling
";
    let imports = extract_declared_imports(source);
    let expected: BTreeSet<String> =
      ["numpy", "requests", "rich"].iter().map(|s| s.to_string()).collect();
    assert_eq!(imports, expected);
  }

  #[test]
  fn comma_separated_imports_are_split() {
    let imports = extract_declared_imports("import requests, flask as f, json\n");
    assert!(imports.contains("requests"));
    assert!(imports.contains("flask"));
    assert!(!imports.contains("json"));
  }

  #[test]
  fn indented_imports_are_found() {
    let source = "def main():\n    import psutil\n";
    assert!(extract_declared_imports(source).contains("psutil"));
  }

  #[test]
  fn module_docstring_wins() {
    let source = "#!/usr/bin/env python\n# comment\n\"\"\"Fetches the weather.\"\"\"\nimport requests\n";
    assert_eq!(extract_description(source), "Fetches the weather.");
  }

  #[test]
  fn multi_line_docstring_is_joined() {
    let source = "'''Line one\nline two.\n'''\n";
    assert_eq!(extract_description(source), "Line one line two.");
  }

  #[test]
  fn falls_back_to_main_docstring() {
    let source = "import os\n\ndef main():\n    \"\"\"Entry point doc.\"\"\"\n    pass\n";
    assert_eq!(extract_description(source), "Entry point doc.");
  }

  #[test]
  fn no_docstring_means_empty_description() {
    assert_eq!(extract_description("import os\nprint('x')\n"), "");
  }
}
