//! Environment expansion and absolute path resolution.

use std::path::PathBuf;

use path_absolutize::Absolutize;

use crate::error::Result;

/// Replace `$NAME` and `${NAME}` with the value of the environment variable.
///
/// Unset variables expand to the empty string.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Like [`expand_env`], but resolves variables through `lookup`.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                }
                None => {
                    // Unterminated `${`: keep the text as written.
                    out.push_str(&rest[idx..]);
                    rest = "";
                }
            }
            continue;
        }

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..name_len]).unwrap_or_default());
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

/// Expand environment variables and make the result absolute.
///
/// Relative paths are joined onto the current directory and cleaned
/// lexically; the filesystem is not consulted.
pub fn absolutize(input: &str) -> Result<PathBuf> {
    let expanded = PathBuf::from(expand_env(input));
    Ok(expanded.absolutize()?.into_owned())
}

/// A directory bound to the command it triggers, both resolved to absolute
/// paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WatchTarget {
    /// Directory to watch.
    pub directory: PathBuf,

    /// Executable to run when the directory changes.
    pub command: PathBuf,
}

impl WatchTarget {
    /// Expand and absolutize a configured directory/command pair.
    pub fn resolve(directory: &str, command: &str) -> Result<Self> {
        Ok(Self {
            directory: absolutize(directory)?,
            command: absolutize(command)?,
        })
    }
}
