use crate::zip::is_directory_marker;

/// Canonical form of `path` used for every filter comparison.
///
/// Backslashes become `/`. Unless `case_sensitive` is set the result is
/// lowercased with the locale-independent Unicode mapping.
pub fn normalize_path(path: &str, case_sensitive: bool) -> String {
    let path = path.replace('\\', "/");
    if case_sensitive {
        path
    } else {
        path.to_lowercase()
    }
}

/// Per-entry inclusion test built once per extraction.
///
/// Filters and extension are stored normalized; names passed to
/// [`EntryMatcher::matches`] must be normalized the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMatcher {
    path_filters: Vec<String>,
    extension: Option<String>,
}

impl EntryMatcher {
    pub fn new<I, S>(path_filters: I, extension: Option<&str>, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            path_filters: path_filters
                .into_iter()
                .map(|f| normalize_path(f.as_ref(), case_sensitive))
                .collect(),
            extension: extension.map(|e| normalize_path(e, case_sensitive)),
        }
    }

    /// Path dimension only. A filter matches when either string contains the other.
    pub fn matches_path(&self, name: &str) -> bool {
        self.path_filters.is_empty()
            || self
                .path_filters
                .iter()
                .any(|f| name.contains(f.as_str()) || f.contains(name))
    }

    pub fn matches_extension(&self, name: &str) -> bool {
        self.extension.as_deref().is_none_or(|ext| name.ends_with(ext))
    }

    /// Full decision for a normalized entry name. Directory markers never match.
    pub fn matches(&self, name: &str) -> bool {
        !is_directory_marker(name) && self.matches_path(name) && self.matches_extension(name)
    }
}
