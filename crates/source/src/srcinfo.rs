//! `.SRCINFO` parsing
//!
//! `.SRCINFO` is the line-oriented `key = value` rendering of a PKGBUILD
//! produced by `makepkg --printsrcinfo`. The file opens with a `pkgbase`
//! section holding shared metadata; each subsequent `pkgname` line starts
//! a per-package section. Dependency and provides fields are read from the
//! pkgbase section only.

use pkgsmith_errors::{Error, SourceError};

/// Parsed `.SRCINFO` contents
#[derive(Debug, Clone, Default)]
pub struct Srcinfo {
    pub pkgbase: String,
    pub pkgver: String,
    pub pkgrel: Option<String>,
    /// Package names this PKGBUILD builds
    pub pkgnames: Vec<String>,
    /// `provides` entries, each `name` or `name=version`
    pub provides: Vec<String>,
    /// Runtime dependency tokens, possibly version-decorated
    pub depends: Vec<String>,
    /// Build-only dependency tokens, possibly version-decorated
    pub makedepends: Vec<String>,
}

impl Srcinfo {
    /// Parse `.SRCINFO` content.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SrcinfoParse`] when the content lacks a
    /// `pkgbase` or `pkgver` field, or contains a line that is not a
    /// `key = value` pair.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut info = Self::default();
        let mut in_pkgbase = true;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(SourceError::SrcinfoParse {
                    message: format!("expected key = value, got: {line}"),
                }
                .into());
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "pkgbase" => info.pkgbase = value.to_string(),
                "pkgname" => {
                    in_pkgbase = false;
                    info.pkgnames.push(value.to_string());
                }
                "pkgver" if in_pkgbase => info.pkgver = value.to_string(),
                "pkgrel" if in_pkgbase => info.pkgrel = Some(value.to_string()),
                "provides" if in_pkgbase => info.provides.push(value.to_string()),
                "depends" if in_pkgbase => info.depends.push(value.to_string()),
                "makedepends" if in_pkgbase => info.makedepends.push(value.to_string()),
                _ => {}
            }
        }

        if info.pkgbase.is_empty() || info.pkgver.is_empty() {
            return Err(SourceError::SrcinfoParse {
                message: "missing pkgbase or pkgver".to_string(),
            }
            .into());
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
pkgbase = test1
\tpkgver = 1
\tpkgrel = 1
\tdepends = test1-dep1
\tmakedepends = cmake>=3.0
\tprovides = test-virtual=2

pkgname = test1
";

    #[test]
    fn parses_pkgbase_section() {
        let info = Srcinfo::parse(SAMPLE).unwrap();
        assert_eq!(info.pkgbase, "test1");
        assert_eq!(info.pkgver, "1");
        assert_eq!(info.pkgrel.as_deref(), Some("1"));
        assert_eq!(info.depends, vec!["test1-dep1"]);
        assert_eq!(info.makedepends, vec!["cmake>=3.0"]);
        assert_eq!(info.provides, vec!["test-virtual=2"]);
        assert_eq!(info.pkgnames, vec!["test1"]);
    }

    #[test]
    fn per_package_fields_do_not_leak_into_pkgbase() {
        let content = "\
pkgbase = split
\tpkgver = 2
\tdepends = common

pkgname = split-a
\tdepends = only-a
";
        let info = Srcinfo::parse(content).unwrap();
        assert_eq!(info.depends, vec!["common"]);
        assert_eq!(info.pkgnames, vec!["split-a"]);
    }

    #[test]
    fn missing_pkgbase_is_an_error() {
        let err = Srcinfo::parse("pkgver = 1\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Source(SourceError::SrcinfoParse { .. })
        ));
    }

    #[test]
    fn non_key_value_line_is_an_error() {
        assert!(Srcinfo::parse("pkgbase test1\n").is_err());
    }
}
