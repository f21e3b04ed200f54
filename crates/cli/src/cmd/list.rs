//! Implementation of the `scriptbox list` command.
//!
//! Renders the library as a table, custom scripts first, then standard
//! scripts grouped by category.

use std::collections::BTreeSet;

use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};

use scriptbox_core::{Manifest, ManifestStore, Provenance, ScriptStore, script};
use scriptbox_platform::Paths;

use crate::output;

/// Execute the list command.
pub fn cmd_list(paths: &Paths) -> Result<()> {
  let scripts = ScriptStore::new(paths);
  let manifests = ManifestStore::new(paths);

  // Union of both stores, so half-added scripts still show up.
  let names: BTreeSet<String> = scripts
    .available()
    .into_iter()
    .chain(manifests.available())
    .collect();

  if names.is_empty() {
    output::print_info("no scripts in the library yet");
    return Ok(());
  }

  let mut rows: Vec<Row> = names
    .into_iter()
    .map(|name| {
      let manifest = manifests.load(&name).ok();
      let description = match &manifest {
        Some(m) if !m.description.is_empty() => m.description.clone(),
        _ => scripts
          .read(&name)
          .map(|source| script::extract_description(&source))
          .unwrap_or_default(),
      };
      Row {
        name,
        description,
        manifest,
      }
    })
    .collect();

  // Custom scripts first, then by category, then by name.
  rows.sort_by(|a, b| {
    a.sort_key().cmp(&b.sort_key()).then_with(|| a.name.cmp(&b.name))
  });

  let mut table = Table::new();
  table
    .load_preset(UTF8_FULL)
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_header(vec!["Script", "Type", "Category", "Dependencies", "Description"]);

  for row in &rows {
    let (kind, category, deps) = match &row.manifest {
      Some(m) => (
        match m.provenance {
          Provenance::Custom => "custom",
          Provenance::Standard => "standard",
        },
        m.category.clone().unwrap_or_default(),
        m.dependencies.len().to_string(),
      ),
      None => ("custom", String::new(), "?".to_string()),
    };
    table.add_row(vec![
      Cell::new(&row.name),
      Cell::new(kind),
      Cell::new(category),
      Cell::new(deps),
      Cell::new(&row.description),
    ]);
  }

  println!("{table}");
  Ok(())
}

struct Row {
  name: String,
  description: String,
  manifest: Option<Manifest>,
}

impl Row {
  /// (0, "") for custom scripts so they lead, (1, category) for standard.
  fn sort_key(&self) -> (u8, String) {
    match &self.manifest {
      Some(m) if m.provenance == Provenance::Standard => {
        (1, m.category.clone().unwrap_or_default())
      }
      _ => (0, String::new()),
    }
  }
}
