//! Version ranges for module dependencies
//!
//! A range is one or more alternatives separated by `||` (or a single `|`).
//! Each alternative is a set of comparators joined by commas, whitespace or
//! `&`/`&&`, all of which must match. Comparators accept the usual operators
//! (`=`, `^`, `~`, `>`, `>=`, `<`, `<=`), exclusions (`!=1.2.0`), hyphen
//! ranges (`1.0.0 - 2.0.0`, inclusive on both ends) and wildcards (`1.x`,
//! `1.2.*`, `*`).
//!
//! A version without an operator is an exact match at the precision given, so
//! `1.4.2` only matches `1.4.2` and `1.4` matches any `1.4.z`. This differs
//! from Cargo, where a bare version means `^`.

use crate::error::{Error, Result};
use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;

const OPERATORS: &[&str] = &["!=", ">=", "<=", ">", "<", "=", "^", "~"];
const EXCLUDE: &str = "!=";
const HYPHEN: &str = "-";

/// A parsed dependency version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<Alternative>,
}

/// Comparators that must all hold, minus excluded versions
#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    required: VersionReq,
    excluded: Vec<VersionReq>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.required.matches(version) && !self.excluded.iter().any(|req| req.matches(version))
    }
}

impl VersionRange {
    /// Parse a range expression
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_version_range(raw, "empty range"));
        }

        let alternatives = trimmed
            .replace("||", "|")
            .split('|')
            .map(|alt| Self::parse_alternative(raw, alt))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: trimmed.to_string(),
            alternatives,
        })
    }

    /// Check whether `version` falls inside the range
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }

    /// Parse `version` and check it against the range
    pub fn matches_str(&self, version: &str) -> Result<bool> {
        let version =
            Version::parse(version.trim()).map_err(|_| Error::invalid_version(version))?;
        Ok(self.matches(&version))
    }

    /// The range as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn parse_alternative(raw: &str, alternative: &str) -> Result<Alternative> {
        let comparators = Self::comparators(raw, &alternative.replace('&', ","))?;
        if comparators.is_empty() {
            return Err(Error::invalid_version_range(raw, "empty alternative"));
        }

        let mut required = Vec::new();
        let mut excluded = Vec::new();
        for comparator in &comparators {
            match comparator.strip_prefix(EXCLUDE) {
                Some("") => {
                    return Err(Error::invalid_version_range(raw, "'!=' without a version"))
                }
                Some(version) => excluded.push(Self::requirement(raw, &Self::normalize(version))?),
                None => required.push(Self::normalize(comparator)),
            }
        }

        let required = if required.is_empty() {
            VersionReq::STAR
        } else {
            Self::requirement(raw, &required.join(", "))?
        };

        Ok(Alternative { required, excluded })
    }

    fn requirement(raw: &str, normalized: &str) -> Result<VersionReq> {
        VersionReq::parse(normalized).map_err(|e| Error::invalid_version_range(raw, e.to_string()))
    }

    /// Split an alternative into comparators, re-attaching operators that
    /// were written apart from their version (`>= 1.0.0`) and expanding
    /// hyphen ranges into a `>=`/`<=` pair
    fn comparators(raw: &str, alternative: &str) -> Result<Vec<String>> {
        let mut out: Vec<String> = Vec::new();
        let mut pending_op: Option<&str> = None;
        let mut hyphen_open = false;

        for token in alternative
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if token == HYPHEN {
                let lower = match out.pop() {
                    Some(lower) if pending_op.is_none() && !hyphen_open && Self::is_bare(&lower) => {
                        lower
                    }
                    _ => return Err(Error::invalid_version_range(raw, "misplaced hyphen range")),
                };
                out.push(format!(">={}", lower));
                hyphen_open = true;
                continue;
            }
            if let Some(op) = OPERATORS.iter().find(|op| **op == token) {
                pending_op = Some(op);
                continue;
            }

            if hyphen_open {
                if pending_op.is_some() || !Self::is_bare(token) {
                    return Err(Error::invalid_version_range(raw, "misplaced hyphen range"));
                }
                out.push(format!("<={}", token));
                hyphen_open = false;
                continue;
            }
            match pending_op.take() {
                Some(op) => out.push(format!("{}{}", op, token)),
                None => out.push(token.to_string()),
            }
        }

        if hyphen_open {
            return Err(Error::invalid_version_range(raw, "hyphen range without upper bound"));
        }
        // A dangling operator is kept so the semver parser reports it
        if let Some(op) = pending_op {
            out.push(op.to_string());
        }

        Ok(out)
    }

    fn is_bare(comparator: &str) -> bool {
        comparator.starts_with(|c: char| c.is_ascii_digit())
    }

    /// Pin a bare version to an exact match
    ///
    /// Only the `major.minor.patch` core is looked at for wildcards; pre-release
    /// and build identifiers may contain `x` freely.
    fn normalize(comparator: &str) -> String {
        let core = comparator.split(['-', '+']).next().unwrap_or(comparator);
        let wildcard = core.contains(['*', 'x', 'X']);
        if Self::is_bare(comparator) && !wildcard {
            format!("={}", comparator)
        } else {
            comparator.to_string()
        }
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
