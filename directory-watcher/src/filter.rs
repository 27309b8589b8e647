//! Exclusion filter for changed file names.

use regex_lite::Regex;
use tracing::info;

use crate::error::{Result, WatcherError};

/// Why a file name was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// The base name is listed in the excluded file names.
    FileName,

    /// The base name contains the given excluded string.
    String(String),
}

/// Decides whether a changed file should be ignored.
///
/// Built once from the configuration and shared read-only between all
/// watchers. Exact names are kept sorted for binary search; excluded strings
/// are escaped before compilation so they always match literally.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    file_names: Vec<String>,
    patterns: Vec<(String, Regex)>,
}

impl ExclusionFilter {
    /// Build a filter from excluded base names and excluded literal strings.
    pub fn new<N, S>(file_names: N, strings: S) -> Result<Self>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut file_names: Vec<String> = file_names.into_iter().map(Into::into).collect();
        file_names.sort();
        file_names.dedup();

        let patterns = strings
            .into_iter()
            .map(|s| {
                let literal = s.as_ref();
                Regex::new(&regex_lite::escape(literal))
                    .map(|re| (literal.to_string(), re))
                    .map_err(|e| WatcherError::InvalidPattern(format!("{literal}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            file_names,
            patterns,
        })
    }

    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self {
            file_names: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Excluded names in lookup order.
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    /// Check a base name without logging.
    pub fn check(&self, file_name: &str) -> Option<Exclusion> {
        if self
            .file_names
            .binary_search_by(|name| name.as_str().cmp(file_name))
            .is_ok()
        {
            return Some(Exclusion::FileName);
        }

        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(file_name))
            .map(|(literal, _)| Exclusion::String(literal.clone()))
    }

    /// Whether changes to `file_name` should be ignored.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        match self.check(file_name) {
            Some(Exclusion::FileName) => {
                info!("Excluded by file name: {file_name}. Doing nothing.");
                true
            }
            Some(Exclusion::String(pattern)) => {
                info!("Excluded by string: {file_name} matched [{pattern}]. Doing nothing.");
                true
            }
            None => false,
        }
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::empty()
    }
}
