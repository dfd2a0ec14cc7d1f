//! Node names and dotted paths
//!
//! Names identify a node among its siblings. Spaces are stored as underscores
//! and the level separator is reserved for paths.

use crate::error::{ParamError, Result};

/// Separator between the levels of a dotted path.
pub const SEPARATOR: char = '.';

/// Returns the validated form of `name`.
///
/// Spaces are replaced by underscores. Empty names and names containing
/// [`SEPARATOR`] are rejected.
///
/// # Examples
///
/// ```
/// use paramtree::parameters::name::validate_name;
///
/// assert_eq!(validate_name("foo bar").unwrap(), "foo_bar");
/// assert!(validate_name("foo.bar").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.replace(' ', "_");
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(ParamError::InvalidName(name));
    }
    Ok(name)
}

/// Returns the human readable form of a stored name.
pub fn display_name(name: &str) -> String {
    name.replace('_', " ")
}

/// Splits a dotted path into its parent path and last segment.
///
/// The parent part is empty for a bare name.
///
/// ```
/// use paramtree::parameters::name::split_name;
///
/// assert_eq!(split_name("a.b.c"), ("a.b", "c"));
/// assert_eq!(split_name("c"), ("", "c"));
/// ```
pub fn split_name(path: &str) -> (&str, &str) {
    match path.rfind(SEPARATOR) {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Iterates over the segments of a dotted path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
}

/// Joins path segments with the separator.
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(part.as_ref());
    }
    out
}
