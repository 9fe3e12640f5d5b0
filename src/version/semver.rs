//! Release version parsing and ordering
//!
//! Release tags published to the version index look like `v1.2.3`,
//! `v1.2.3-beta` or `v1.2.3-beta.1`. Parsing is deliberately lenient: any
//! string yields a [`Version`], with components that cannot be read as numbers
//! defaulting to zero. Use [`compare_strict`] when the public semver precedence
//! rules are required instead.

use std::cmp::Ordering;
use std::fmt;

/// Ranks for well-known prerelease tokens (lower sorts first)
const PRERELEASE_PRIORITY: &[(&str, u32)] = &[
    ("alpha", 1),
    ("pre", 1),
    ("beta", 2),
    ("preview", 3),
    ("rc", 4),
];

/// Rank given to tokens missing from [`PRERELEASE_PRIORITY`]
const UNRANKED: u32 = 999;

/// One dot-separated prerelease identifier
///
/// Equality follows the ordering, so `alpha` and `pre` are equal.
#[derive(Debug, Clone)]
pub enum Identifier {
    Numeric(u64),
    Token(String),
}

impl Identifier {
    fn parse(raw: &str) -> Self {
        match leading_number(raw) {
            Some(n) => Identifier::Numeric(n),
            None => Identifier::Token(raw.to_string()),
        }
    }

    fn rank(token: &str) -> u32 {
        PRERELEASE_PRIORITY
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, rank)| *rank)
            .unwrap_or(UNRANKED)
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Token(a), Identifier::Token(b)) => {
                match (Self::rank(a), Self::rank(b)) {
                    (UNRANKED, UNRANKED) => a.cmp(b),
                    (rank_a, rank_b) => rank_a.cmp(&rank_b),
                }
            }
            // Numbers always sort below tokens, whatever their position
            (Identifier::Numeric(_), Identifier::Token(_)) => Ordering::Less,
            (Identifier::Token(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Token(t) => f.write_str(t),
        }
    }
}

/// A parsed release version
///
/// Equality follows the ordering: two versions are equal when neither sorts
/// before the other, so `1.0.0-alpha` and `1.0.0-pre` compare equal.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Empty for a stable release
    pub prerelease: Vec<Identifier>,
}

impl Version {
    /// Parse a version string, never failing.
    ///
    /// - an optional leading `v` is stripped
    /// - everything after the first `-` is the prerelease part, split on `.`
    /// - missing core components default to 0 (`v1.2` -> 1.2.0)
    /// - components are read from their leading digits; no digits reads as 0
    ///
    /// Examples:
    /// - "v1.2.3-beta.1" -> 1.2.3 [beta, 1]
    /// - "1" -> 1.0.0
    /// - "garbage" -> 0.0.0
    pub fn parse(version: &str) -> Self {
        let version = version.strip_prefix('v').unwrap_or(version);
        let (core, prerelease) = match version.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (version, None),
        };

        let mut numbers = core.split('.').map(|part| leading_number(part).unwrap_or(0));
        let major = numbers.next().unwrap_or(0);
        let minor = numbers.next().unwrap_or(0);
        let patch = numbers.next().unwrap_or(0);

        let prerelease = prerelease
            .map(|pre| pre.split('.').map(Identifier::parse).collect())
            .unwrap_or_default();

        Self {
            major,
            minor,
            patch,
            prerelease,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    fn cmp_prerelease(&self, other: &Self) -> Ordering {
        match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let len = self.prerelease.len().max(other.prerelease.len());
        for i in 0..len {
            let ordering = match (self.prerelease.get(i), other.prerelease.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| self.cmp_prerelease(other))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for (i, id) in self.prerelease.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// Compare two version strings with the lenient release ordering.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Compare two version strings with public semver precedence.
///
/// Partial versions are zero-padded and a leading `v` is ignored. Returns
/// `None` when either side is not a valid semver after normalization.
pub fn compare_strict(a: &str, b: &str) -> Option<Ordering> {
    let a = parse_strict(a)?;
    let b = parse_strict(b)?;
    Some(a.cmp_precedence(&b))
}

fn parse_strict(version: &str) -> Option<semver::Version> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let split = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(split);
    let normalized = match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => version.to_string(),
    };
    semver::Version::parse(&normalized).ok()
}

/// Value of the leading ASCII digits of `s`, if any.
fn leading_number(s: &str) -> Option<u64> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let digits = &s[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}
