//! Filesystem zone classification
//!
//! Provides [`Zone`] and [`ZoneClassifier`], which decide how sensitive a
//! path is relative to the managed repository root and an ordered
//! protected-zone list.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Sensitivity classification of a filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    /// Inside the managed root, not protected
    Open,
    /// Inside the managed root, matches a protected-zone entry
    Locked,
    /// Outside the managed root entirely
    External,
}

impl Zone {
    /// Stable uppercase label used in route decisions and audit records
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Zone::Open => "OPEN",
            Zone::Locked => "LOCKED",
            Zone::External => "EXTERNAL",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protected-zone prefixes applied when no explicit list is configured.
///
/// Entries are matched against the leading segments of a normalized,
/// slash-joined relative path, case-insensitively.
pub const DEFAULT_PROTECTED_ZONES: &[&str] = &["secrets", "keys", "infra", "billing", "identity"];

/// Classifies paths against a managed root and an ordered protected-zone list
///
/// Matching is first-match over the list order, so the list order is the
/// tie-break order and stays auditable.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    managed_root: PathBuf,
    protected_zones: Vec<String>,
}

impl ZoneClassifier {
    /// Create a classifier with an explicit protected-zone list
    #[inline]
    #[must_use]
    pub fn new(managed_root: impl Into<PathBuf>, protected_zones: Vec<String>) -> Self {
        Self {
            managed_root: managed_root.into(),
            protected_zones,
        }
    }

    /// Create a classifier with [`DEFAULT_PROTECTED_ZONES`]
    #[inline]
    #[must_use]
    pub fn with_default_zones(managed_root: impl Into<PathBuf>) -> Self {
        Self::new(
            managed_root,
            DEFAULT_PROTECTED_ZONES.iter().map(|z| (*z).to_string()).collect(),
        )
    }

    /// The managed repository root
    #[inline]
    #[must_use]
    pub fn managed_root(&self) -> &Path {
        &self.managed_root
    }

    /// The ordered protected-zone list
    #[inline]
    #[must_use]
    pub fn protected_zones(&self) -> &[String] {
        &self.protected_zones
    }

    /// Classify a path as [`Zone::Open`], [`Zone::Locked`], or [`Zone::External`]
    ///
    /// Absolute paths are first made relative to the managed root; an
    /// absolute path that does not live under the root is `External`.
    /// Relative paths are taken as relative to the root. A relative path
    /// that climbs out of the root via `..` is also `External`.
    #[must_use]
    pub fn classify(&self, path: impl AsRef<Path>) -> Zone {
        let path = path.as_ref();
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.managed_root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => return Zone::External,
            }
        } else {
            path.to_path_buf()
        };

        let Some(segments) = normalize_segments(&relative) else {
            return Zone::External;
        };

        if self.matches_protected(&segments) {
            Zone::Locked
        } else {
            Zone::Open
        }
    }

    /// Check whether a normalized zone string names a protected zone
    ///
    /// Used by the intent router for impact-zone declarations, which arrive
    /// as zone names rather than paths.
    #[must_use]
    pub fn is_protected_name(&self, zone: &str) -> bool {
        let zone = zone.trim();
        if zone.is_empty() {
            return false;
        }
        let segments: Vec<String> = zone
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        self.matches_protected(&segments)
    }

    /// First-match scan of the protected list against leading path segments
    fn matches_protected(&self, segments: &[String]) -> bool {
        self.protected_zones.iter().any(|entry| {
            let entry_segments: Vec<String> = entry
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_ascii_lowercase())
                .collect();
            !entry_segments.is_empty()
                && segments.len() >= entry_segments.len()
                && segments[..entry_segments.len()] == entry_segments[..]
        })
    }
}

/// Normalize a relative path into lowercase slash-separated segments
///
/// Returns `None` when the path escapes its base via a `..` component.
fn normalize_segments(path: &Path) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(seg) => {
                segments.push(seg.to_string_lossy().to_ascii_lowercase());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classifier() -> ZoneClassifier {
        ZoneClassifier::with_default_zones("/repo")
    }

    #[test]
    fn open_path_inside_root() {
        assert_eq!(classifier().classify("apps/bot/main.py"), Zone::Open);
        assert_eq!(classifier().classify("/repo/apps/bot/main.py"), Zone::Open);
    }

    #[test]
    fn locked_path_matches_protected_entry() {
        assert_eq!(classifier().classify("secrets/api_keys.env"), Zone::Locked);
        assert_eq!(classifier().classify("/repo/infra/deploy.sh"), Zone::Locked);
    }

    #[test]
    fn locked_match_is_case_insensitive() {
        assert_eq!(classifier().classify("Secrets/Api.env"), Zone::Locked);
        assert_eq!(classifier().classify("INFRA/x"), Zone::Locked);
    }

    #[test]
    fn external_path_outside_root() {
        assert_eq!(classifier().classify("/etc/passwd"), Zone::External);
        assert_eq!(classifier().classify("/other/repo/file"), Zone::External);
    }

    #[test]
    fn parent_escape_is_external() {
        assert_eq!(classifier().classify("../outside"), Zone::External);
        assert_eq!(classifier().classify("a/../../outside"), Zone::External);
    }

    #[test]
    fn internal_parent_reference_normalizes() {
        // a/../secrets resolves to secrets, which is protected
        assert_eq!(classifier().classify("a/../secrets/x"), Zone::Locked);
    }

    #[test]
    fn multi_segment_protected_entry() {
        let zc = ZoneClassifier::new("/repo", vec!["core/vault".to_string()]);
        assert_eq!(zc.classify("core/vault/keys.json"), Zone::Locked);
        assert_eq!(zc.classify("core/other.json"), Zone::Open);
    }

    #[test]
    fn protected_name_lookup() {
        let zc = classifier();
        assert!(zc.is_protected_name("secrets"));
        assert!(zc.is_protected_name(" SECRETS "));
        assert!(!zc.is_protected_name("apps"));
        assert!(!zc.is_protected_name(""));
    }

    #[test]
    fn zone_display_labels() {
        assert_eq!(Zone::Open.to_string(), "OPEN");
        assert_eq!(Zone::Locked.to_string(), "LOCKED");
        assert_eq!(Zone::External.to_string(), "EXTERNAL");
    }
}
