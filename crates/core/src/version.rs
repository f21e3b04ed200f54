//! Version equivalence for convergence decisions.
//!
//! Versions are compared as decimal numbers, so `"1.0"`, `"1"`, and `"1.00"`
//! are all the same version. An empty declared version means any installed
//! version is acceptable. The same comparison backs two different policies:
//! the reconciliation engine treats an unparseable version as "not
//! equivalent" (forcing an upgrade attempt that surfaces the bad input),
//! while the upstream-update flow treats it as a hard stop.

use thiserror::Error;

/// A version string that does not parse as a decimal number.
#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
  #[error("invalid version string: '{value}'")]
  Invalid { value: String },
}

/// Parse a version tag as a decimal number.
///
/// # Errors
///
/// `VersionError::Invalid` when the string is not a finite decimal.
pub fn parse(value: &str) -> Result<f64, VersionError> {
  let parsed: f64 = value.trim().parse().map_err(|_| VersionError::Invalid {
    value: value.to_string(),
  })?;
  if parsed.is_finite() {
    Ok(parsed)
  } else {
    Err(VersionError::Invalid {
      value: value.to_string(),
    })
  }
}

/// Decide whether an observed version satisfies a declared one.
///
/// - an empty `declared` accepts anything
/// - identical raw strings are always equivalent
/// - otherwise both are parsed as decimals and compared numerically
///
/// # Errors
///
/// `VersionError::Invalid` when either side fails to parse; the caller
/// decides whether that forces an upgrade or aborts the operation.
pub fn equivalent(declared: &str, observed: &str) -> Result<bool, VersionError> {
  if declared.is_empty() || declared == observed {
    return Ok(true);
  }
  Ok(parse(declared)? == parse(observed)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_declared_accepts_anything() {
    assert_eq!(equivalent("", "1.26.0"), Ok(true));
    assert_eq!(equivalent("", ""), Ok(true));
    assert_eq!(equivalent("", "garbage"), Ok(true));
  }

  #[test]
  fn identical_raw_strings_are_equivalent() {
    assert_eq!(equivalent("1.26.0", "1.26.0"), Ok(true));
    assert_eq!(equivalent("abc", "abc"), Ok(true));
  }

  #[test]
  fn numeric_equality_ignores_formatting() {
    assert_eq!(equivalent("1.0", "1"), Ok(true));
    assert_eq!(equivalent("1", "1.00"), Ok(true));
    assert_eq!(equivalent("2.5", "2.50"), Ok(true));
  }

  #[test]
  fn different_numbers_are_not_equivalent() {
    assert_eq!(equivalent("1.0", "1.1"), Ok(false));
    assert_eq!(equivalent("2", "1"), Ok(false));
  }

  #[test]
  fn unparseable_side_is_an_error() {
    assert!(matches!(
      equivalent("1.26.0", "1.25.2"),
      Err(VersionError::Invalid { .. })
    ));
    assert!(matches!(equivalent("1.0", "abc"), Err(VersionError::Invalid { .. })));
  }

  #[test]
  fn parse_rejects_non_finite_values() {
    assert!(parse("inf").is_err());
    assert!(parse("nan").is_err());
    assert_eq!(parse(" 1.5 "), Ok(1.5));
  }
}
