use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

/// Wildcard pattern matched against the file name part of a change.
///
/// An empty pattern, `*` and `*.*` all match every name, including names without an extension.
#[derive(Clone, Debug)]
pub(crate) struct NameFilter {
    pattern: String,

    /// `None` if the pattern matches everything.
    matcher: Option<GlobMatcher>,
}

impl NameFilter {
    pub(crate) fn new(pattern: &str) -> Result<Self, globset::Error> {
        let matcher = if matches!(pattern, "" | "*" | "*.*") {
            None
        } else {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .case_insensitive(cfg!(windows))
                .build()?;

            Some(glob.compile_matcher())
        };

        Ok(Self {
            pattern: pattern.to_owned(),
            matcher,
        })
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the file name part of `name` matches the pattern.
    pub(crate) fn matches(&self, name: &str) -> bool {
        let Some(matcher) = &self.matcher else {
            return true;
        };

        Path::new(name)
            .file_name()
            .is_some_and(|file_name| matcher.is_match(file_name))
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        Self {
            pattern: "*".to_owned(),
            matcher: None,
        }
    }
}
