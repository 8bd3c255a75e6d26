//! Version restriction parsing and evaluation
//!
//! Dependency references may decorate a package name with a version
//! restriction, e.g. `linux>=5.0`. Multiple restrictions on one name are
//! conjunctive.
//!
//! Versions are compared as plain strings (lexicographic byte order), not
//! as parsed version numbers, so `"10"` sorts before `"9"`. Provider
//! selection depends on this ordering; do not change it without migrating
//! every stored restriction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator in a version restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compare {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
}

impl Compare {
    /// Operators in scan priority order: two-character operators first so
    /// `>` never matches inside `>=`.
    const SCAN_ORDER: [(Self, &'static str); 5] = [
        (Self::GreaterEqual, ">="),
        (Self::LessEqual, "<="),
        (Self::Greater, ">"),
        (Self::Less, "<"),
        (Self::Equal, "="),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Equal => "=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single version restriction attached to a dependency name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Restriction {
    pub compare: Compare,
    pub version: String,
}

impl Restriction {
    #[must_use]
    pub fn new(compare: Compare, version: impl Into<String>) -> Self {
        Self {
            compare,
            version: version.into(),
        }
    }

    /// Check whether a candidate version satisfies this restriction.
    #[must_use]
    pub fn satisfied_by(&self, version: &str) -> bool {
        match self.compare {
            Compare::Less => version < self.version.as_str(),
            Compare::LessEqual => version <= self.version.as_str(),
            Compare::Equal => version == self.version,
            Compare::GreaterEqual => version >= self.version.as_str(),
            Compare::Greater => version > self.version.as_str(),
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.compare, self.version)
    }
}

/// Split a decorated dependency token into its bare name and an optional
/// version restriction.
///
/// Returns the token unchanged with no restriction when no comparator is
/// present, or when a comparator leaves an empty name or version (a bare
/// name can legitimately contain no `<`, `>`, or `=`).
#[must_use]
pub fn parse_restriction(token: &str) -> (&str, Option<Restriction>) {
    for (compare, op) in Compare::SCAN_ORDER {
        if let Some(pos) = token.find(op) {
            let name = &token[..pos];
            let version = &token[pos + op.len()..];
            if name.is_empty() || version.is_empty() {
                continue;
            }
            return (name, Some(Restriction::new(compare, version)));
        }
    }

    (token, None)
}

/// Check whether a candidate version satisfies every restriction.
#[must_use]
pub fn satisfies_all(version: &str, restrictions: &[Restriction]) -> bool {
    restrictions.iter().all(|r| r.satisfied_by(version))
}
