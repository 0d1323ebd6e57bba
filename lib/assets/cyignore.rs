//! `.cyignore` parsing.
//!
//! A `.cyignore` lists paths (relative to the directory holding the file) that
//! the build must not search. Lines may start with `$(SEARCH_<name>)`, which
//! stands for the resolved directory of the asset called `<name>`.

use super::request::normalize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// `$(SEARCH_<name>)` reference.
static SEARCH_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(SEARCH_([^)]+)\)").expect("Invalid regex"));

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parse a `.cyignore` file into absolute paths.
///
/// A missing or unreadable file yields no entries. Lines referencing an asset
/// that `lookup` does not know are dropped.
pub fn parse_cyignore<F>(file: &Path, lookup: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Cannot read {}: {}", file.display(), e);
            }
            return Vec::new();
        }
    };

    let base = file.parent().unwrap_or(Path::new(""));
    content
        .lines()
        .filter_map(|line| parse_line(line, base, &lookup))
        .collect()
}

/// Parse one line; `None` for blanks, comments and unresolved references.
fn parse_line<F>(line: &str, base: &Path, lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut expanded = String::with_capacity(line.len());
    let mut last = 0;
    for caps in SEARCH_VAR_REGEX.captures_iter(line) {
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        let Some(path) = lookup(name) else {
            tracing::debug!("Dropping .cyignore entry '{}': unknown asset '{}'", line, name);
            return None;
        };
        expanded.push_str(&line[last..whole.start()]);
        expanded.push_str(&path.to_string_lossy());
        last = whole.end();
    }
    expanded.push_str(&line[last..]);

    let path = PathBuf::from(expanded.trim_end_matches(['/', '\\']));
    if path.is_absolute() {
        Some(normalize(&path))
    } else {
        Some(normalize(&base.join(path)))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(".cyignore");
        std::fs::write(
            &file,
            "# comment\n\nbuild\ndocs/\n$(SEARCH_mtb-hal-cat1)/COMPONENT_CM0P\n$(SEARCH_unknown)/x\n",
        )
        .unwrap();

        let entries = parse_cyignore(&file, |name| match name {
            "mtb-hal-cat1" => Some(PathBuf::from("/shared/mtb-hal-cat1/release-v2.4.0")),
            _ => None,
        });

        assert_eq!(
            entries,
            vec![
                dir.path().join("build"),
                dir.path().join("docs"),
                PathBuf::from("/shared/mtb-hal-cat1/release-v2.4.0/COMPONENT_CM0P"),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(parse_cyignore(&dir.path().join(".cyignore"), |_| None).is_empty());
    }
}
