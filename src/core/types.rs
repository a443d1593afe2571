//! core::types
//!
//! Strong types for the values that cross the store boundary.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//!
//! # Validation
//!
//! Both types are checked at construction, so a value that exists is a
//! value Git will accept. Search branches derived from database names go
//! through [`BranchName::for_database`], which slugs the name first.
//!
//! # Examples
//!
//! ```
//! use studyrepo::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("search/springer").unwrap();
//! assert_eq!(branch.refname(), "refs/heads/search/springer");
//!
//! let derived = BranchName::for_database("search/", "IEEE Xplore").unwrap();
//! assert_eq!(derived.as_str(), "search/ieee-xplore");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: &'static str },

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git branch name.
///
/// Follows `git check-ref-format --branch`: no empty names, no leading
/// `.` or `-` in any component, no `.lock` suffix, no `..`, `@{` or `//`,
/// no trailing `/`, no spaces, control characters or any of `~^:\?*[`.
///
/// # Example
///
/// ```
/// use studyrepo::core::types::BranchName;
///
/// assert!(BranchName::new("results").is_ok());
/// assert!(BranchName::new("search/acm").is_ok());
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("search/.hidden").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    const FORBIDDEN_SEQUENCES: [&'static str; 3] = ["..", "@{", "//"];

    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidBranchName`] when Git would refuse the name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match Self::violation(&name) {
            Some(reason) => Err(TypeError::InvalidBranchName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Derive the search branch for a literature database.
    ///
    /// The database name is lowercased and every run of characters other
    /// than ASCII alphanumerics collapses into a single `-`, so
    /// `"IEEE Xplore"` under prefix `"search/"` becomes `search/ieee-xplore`.
    pub fn for_database(prefix: &str, database: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}{}", prefix, slug(database)))
    }

    fn violation(name: &str) -> Option<&'static str> {
        if name.is_empty() {
            return Some("name cannot be empty");
        }
        if name == "@" {
            return Some("'@' is reserved");
        }
        if name.ends_with('/') {
            return Some("name cannot end with '/'");
        }
        if Self::FORBIDDEN_SEQUENCES.iter().any(|s| name.contains(s)) {
            return Some("name cannot contain '..', '@{' or '//'");
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || Self::FORBIDDEN_CHARS.contains(&c))
        {
            return Some("name contains a forbidden character");
        }
        for component in name.split('/') {
            if component.starts_with('.') || component.starts_with('-') {
                return Some("a component cannot start with '.' or '-'");
            }
            if component.ends_with(".lock") {
                return Some("a component cannot end with '.lock'");
            }
        }
        None
    }

    /// Wrap a compile-time constant that is known to pass validation.
    pub(crate) fn known_valid(name: &'static str) -> Self {
        debug_assert!(Self::violation(name).is_none(), "{name} is not a valid branch");
        Self(name.to_string())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full reference name, `refs/heads/<name>`.
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

/// Lowercase `name` and collapse non-alphanumeric runs into `-`.
///
/// Leading and trailing separators are dropped; an input with no
/// alphanumerics at all slugs to `unnamed`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    out
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier, normalized to lowercase hex.
///
/// # Example
///
/// ```
/// use studyrepo::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id (40 or 64 hex characters).
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(oid));
        }
        Ok(Self(oid))
    }

    /// First `len` characters of the id (the whole id if shorter).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn valid_branch_names() {
            for name in ["main", "results", "search/acm", "fix-123", "user@x", "a/b/c"] {
                assert!(BranchName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn structural_violations_rejected() {
            for name in [
                "", "@", "-flag", ".hidden", "search/.hidden", "search/-x", "branch.lock",
                "a/b.lock", "trailing/", "bad..path", "foo@{bar", "foo//bar",
            ] {
                assert!(BranchName::new(name).is_err(), "{name:?} should be rejected");
            }
        }

        #[test]
        fn forbidden_characters_rejected() {
            for name in [
                "has space", "has~tilde", "has^caret", "has:colon", "has\\slash", "has?q",
                "has*star", "has[br", "tab\there", "del\x7f",
            ] {
                assert!(BranchName::new(name).is_err(), "{name:?} should be rejected");
            }
        }

        #[test]
        fn error_names_the_offending_branch() {
            let err = BranchName::new("bad..path").unwrap_err();
            assert!(err.to_string().contains("bad..path"));
        }

        #[test]
        fn refname_prefixes_heads() {
            let name = BranchName::new("search/acm").unwrap();
            assert_eq!(name.refname(), "refs/heads/search/acm");
        }

        #[test]
        fn serde_roundtrip_and_rejection() {
            let name = BranchName::new("search/acm").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(serde_json::from_str::<BranchName>(&json).unwrap(), name);
            assert!(serde_json::from_str::<BranchName>("\"a..b\"").is_err());
        }
    }

    mod database_branches {
        use super::*;

        #[test]
        fn slugs_database_names() {
            assert_eq!(slug("IEEE Xplore"), "ieee-xplore");
            assert_eq!(slug("  ACM  Portal!! "), "acm-portal");
            assert_eq!(slug("arXiv"), "arxiv");
            assert_eq!(slug("???"), "unnamed");
        }

        #[test]
        fn derived_names_are_valid_branches() {
            let name = BranchName::for_database("search/", "Springer.Link").unwrap();
            assert_eq!(name.as_str(), "search/springer-link");
        }

        #[test]
        fn bad_prefix_is_still_rejected() {
            assert!(BranchName::for_database("bad..", "acm").is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn accepts_sha1_and_sha256() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_ok());
        }

        #[test]
        fn normalizes_case() {
            let oid = Oid::new("ABCDEF".repeat(6) + "ABCD").unwrap();
            assert!(oid.as_str().chars().all(|c| !c.is_ascii_uppercase()));
        }

        #[test]
        fn rejects_bad_input() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_form_is_bounded() {
            let oid = Oid::new("0123456789".repeat(4)).unwrap();
            assert_eq!(oid.short(7), "0123456");
            assert_eq!(oid.short(100).len(), 40);
        }
    }
}
