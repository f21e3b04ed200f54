//! Interactive confirmation for destructive commands.
//!
//! Every command that deletes or replaces library state routes through
//! `confirm`; the `--yes` flag skips the prompt for scripted use.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use crate::output::symbols;

/// Ask the user to confirm a destructive step. Defaults to no.
///
/// Without a terminal on both stdin and stderr the prompt cannot be
/// answered, so the command aborts instead of hanging a pipeline.
pub fn confirm(message: &str, yes: bool) -> Result<bool> {
  if yes {
    return Ok(true);
  }

  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("confirmation required but no terminal is attached; pass --yes to proceed");
  }

  let mut err = io::stderr().lock();
  write!(
    err,
    "{} {} [y/N] ",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message
  )?;
  err.flush()?;

  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
