//! ModusToolbox version numbers.
//!
//! Versions show up as `3.2.0`, `v3.2.0`, tool props versions with a build
//! suffix (`3.2.0.1234`) and tools directory names (`tools_3.2`).

use crate::constants::TOOLS_DIR_PREFIX;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Version embedded at the end of a commit or tag, e.g. `release-v4.2.0`.
static COMMIT_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v(\d+)\.(\d+)(?:\.(\d+))?(?:\.\d+)?$").expect("Invalid regex")
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MtbVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MtbVersion {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `x.y.z` or `vx.y.z`.
    ///
    /// A missing patch defaults to zero and a fourth build component is
    /// ignored. Anything else is not a version.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() < 2 || parts.len() > 4 {
            return None;
        }

        let mut nums = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            nums.push(part.parse::<u32>().ok()?);
        }

        Some(Self::new(nums[0], nums[1], nums.get(2).copied().unwrap_or(0)))
    }

    /// Parse a tools directory name such as `tools_3.2` or `tools_3.2.1`.
    pub fn from_tools_dir_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(TOOLS_DIR_PREFIX)?;
        if rest.split('.').count() > 3 {
            return None;
        }
        Self::parse(rest)
    }

    /// Compare two versions, major first.
    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
    }

    /// Strictly greater than `other`.
    pub fn is_greater_than(&self, other: &Self) -> bool {
        Self::compare(self, other) == Ordering::Greater
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Extract the version a commit or tag name carries, e.g. `release-v4.2.0`.
pub fn extract_commit_version(commit: &str) -> Option<MtbVersion> {
    let caps = COMMIT_VERSION_REGEX.captures(commit.trim())?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some(MtbVersion::new(major, minor, patch))
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Ord for MtbVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(self, other)
    }
}

impl PartialOrd for MtbVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MtbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(MtbVersion::parse("3.2.1"), Some(MtbVersion::new(3, 2, 1)));
        assert_eq!(MtbVersion::parse("v3.2.1"), Some(MtbVersion::new(3, 2, 1)));
        assert_eq!(MtbVersion::parse("3.2"), Some(MtbVersion::new(3, 2, 0)));
        assert_eq!(
            MtbVersion::parse("3.2.0.1234"),
            Some(MtbVersion::new(3, 2, 0))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(MtbVersion::parse(""), None);
        assert_eq!(MtbVersion::parse("3"), None);
        assert_eq!(MtbVersion::parse("a.b.c"), None);
        assert_eq!(MtbVersion::parse("1..2"), None);
        assert_eq!(MtbVersion::parse("1.2.3.4.5"), None);
        assert_eq!(MtbVersion::parse("latest-v4.X"), None);
    }

    #[test]
    fn test_tools_dir_names() {
        assert_eq!(
            MtbVersion::from_tools_dir_name("tools_3.2"),
            Some(MtbVersion::new(3, 2, 0))
        );
        assert_eq!(
            MtbVersion::from_tools_dir_name("tools_3.2.1"),
            Some(MtbVersion::new(3, 2, 1))
        );
        assert_eq!(MtbVersion::from_tools_dir_name("tools_3.2.1.5"), None);
        assert_eq!(MtbVersion::from_tools_dir_name("tools"), None);
        assert_eq!(MtbVersion::from_tools_dir_name("3.2"), None);
    }

    #[test]
    fn test_total_order() {
        let versions = [
            MtbVersion::new(1, 0, 0),
            MtbVersion::new(1, 0, 5),
            MtbVersion::new(1, 2, 0),
            MtbVersion::new(2, 0, 0),
            MtbVersion::new(10, 0, 1),
        ];

        for a in &versions {
            assert_eq!(MtbVersion::compare(a, a), Ordering::Equal);
            for b in &versions {
                assert_eq!(MtbVersion::compare(a, b), MtbVersion::compare(b, a).reverse());
                for c in &versions {
                    if MtbVersion::compare(a, b) == Ordering::Less
                        && MtbVersion::compare(b, c) == Ordering::Less
                    {
                        assert_eq!(MtbVersion::compare(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn test_is_greater_than_is_strict() {
        let a = MtbVersion::new(3, 1, 0);
        let b = MtbVersion::new(3, 0, 9);
        assert!(a.is_greater_than(&b));
        assert!(!b.is_greater_than(&a));
        assert!(!a.is_greater_than(&a));
    }

    #[test]
    fn test_extract_commit_version() {
        assert_eq!(
            extract_commit_version("release-v4.2.0"),
            Some(MtbVersion::new(4, 2, 0))
        );
        assert_eq!(
            extract_commit_version("release-v1.3"),
            Some(MtbVersion::new(1, 3, 0))
        );
        assert_eq!(extract_commit_version("latest-v4.X"), None);
        assert_eq!(extract_commit_version("master"), None);
    }
}
