//! Extra-dependency watermark.
//!
//! Every pattern is expanded against the working root, every match is
//! stat'ed, and the newest timestamp wins. The expansion walks only from
//! the pattern's literal directory prefix, so `config/**/*.yaml` never looks
//! outside `config/`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use freshen_core::{ConfigError, ExtraWatermark, FileTimes, TimestampField};

use crate::FreshenError;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expand `patterns` under `root` and return the newest match.
///
/// `None` patterns yield `Ok(None)`. Patterns that match nothing at all are a
/// configuration error: a watermark that silently disappears would hide
/// staleness.
pub fn resolve_watermark(
    root: &Path,
    patterns: Option<&[String]>,
    field: TimestampField,
) -> Result<Option<ExtraWatermark>, FreshenError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };

    let mut matches = Vec::new();
    for pattern in patterns {
        let before = matches.len();
        expand(root, pattern, &mut matches)?;
        tracing::debug!(
            "extra pattern '{pattern}' matched {} path(s)",
            matches.len() - before
        );
    }

    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for path in matches {
        let at = stat_extra(&path)?.get(field);
        // Strictly newer only, so the first-seen entry wins ties.
        if newest.as_ref().map_or(true, |(_, best)| at > *best) {
            newest = Some((path, at));
        }
    }

    match newest {
        Some((path, at)) => {
            tracing::info!("extra watermark: {} ({field})", path.display());
            Ok(Some(ExtraWatermark { path, at }))
        }
        None => Err(ConfigError::NoExtraMatches {
            patterns: patterns.to_vec(),
        }
        .into()),
    }
}

fn stat_extra(path: &Path) -> Result<FileTimes, FreshenError> {
    let to_err = |source| FreshenError::ExtraStat {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(to_err)?;
    FileTimes::from_metadata(&meta).map_err(to_err)
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Append every path matching `pattern` to `out`, in walk order.
fn expand(root: &Path, pattern: &str, out: &mut Vec<PathBuf>) -> Result<(), FreshenError> {
    let pattern = strip_current_dir(pattern);
    let (prefix, rest) = split_literal_prefix(pattern);

    let Some(rest) = rest else {
        let path = root.join(pattern);
        match std::fs::symlink_metadata(&path) {
            Ok(_) => out.push(path),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(FreshenError::ExtraStat { path, source }),
        }
        return Ok(());
    };

    let matcher = compile(pattern)?;
    let base = root.join(&prefix);
    if !base.is_dir() {
        return Ok(());
    }

    let absolute = Path::new(pattern).is_absolute();
    let mut walker = WalkDir::new(&base).min_depth(1).sort_by_file_name();
    if !rest.contains("**") && !rest.contains('{') {
        walker = walker.max_depth(rest.split('/').count());
    }

    for entry in walker {
        let entry = entry.map_err(|err| match err.path().map(Path::to_path_buf) {
            Some(path) => FreshenError::ExtraStat {
                path,
                source: err.into(),
            },
            None => FreshenError::ExtraStatUnknown { source: err.into() },
        })?;
        let candidate = if absolute {
            entry.path()
        } else {
            entry.path().strip_prefix(root).unwrap_or(entry.path())
        };
        if matcher.is_match(candidate) {
            out.push(entry.into_path());
        }
    }
    Ok(())
}

fn compile(pattern: &str) -> Result<GlobMatcher, FreshenError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;
    Ok(glob.compile_matcher())
}

fn strip_current_dir(pattern: &str) -> &str {
    let mut rest = pattern;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest
}

/// Split `a/b/*.txt` into (`a/b`, `Some("*.txt")`). A pattern with no glob
/// metacharacters returns `None` for the remainder.
fn split_literal_prefix(pattern: &str) -> (PathBuf, Option<&str>) {
    let mut prefix = PathBuf::new();
    let mut offset = 0;
    for segment in pattern.split('/') {
        if segment.contains(GLOB_META) {
            return (prefix, Some(&pattern[offset..]));
        }
        if segment.is_empty() && offset == 0 {
            prefix.push(Component::RootDir.as_os_str());
        } else {
            prefix.push(segment);
        }
        offset += segment.len() + 1;
    }
    (prefix, None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};

    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, secs: u64) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, rel).expect("write");
        set_file_mtime(
            &path,
            FileTime::from_system_time(UNIX_EPOCH + Duration::from_secs(secs)),
        )
        .expect("set mtime");
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    fn watermark(root: &Path, list: &[&str]) -> Result<Option<ExtraWatermark>, FreshenError> {
        resolve_watermark(root, Some(&patterns(list)), TimestampField::Modified)
    }

    #[test]
    fn no_patterns_no_watermark() {
        let dir = TempDir::new().unwrap();
        let wm = resolve_watermark(dir.path(), None, TimestampField::Modified).unwrap();
        assert!(wm.is_none());
    }

    #[test]
    fn literal_pattern_uses_that_file() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Cargo.lock", 500);
        let wm = watermark(dir.path(), &["Cargo.lock"]).unwrap().unwrap();
        assert_eq!(wm.path, dir.path().join("Cargo.lock"));
        assert_eq!(wm.at, UNIX_EPOCH + Duration::from_secs(500));
    }

    #[test]
    fn newest_match_wins_across_patterns() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "config/a.yaml", 100);
        touch(dir.path(), "config/nested/b.yaml", 300);
        touch(dir.path(), "include/c.h", 200);
        let wm = watermark(dir.path(), &["config/**/*.yaml", "include/*.h"])
            .unwrap()
            .unwrap();
        assert_eq!(wm.path, dir.path().join("config/nested/b.yaml"));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "config/a.yaml", 100);
        touch(dir.path(), "config/nested/b.yaml", 300);
        let wm = watermark(dir.path(), &["config/*.yaml"]).unwrap().unwrap();
        assert_eq!(wm.path, dir.path().join("config/a.yaml"));
    }

    #[test]
    fn brace_alternatives_expand() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.toml", 100);
        touch(dir.path(), "b.json", 200);
        touch(dir.path(), "c.txt", 900);
        let wm = watermark(dir.path(), &["*.{toml,json}"]).unwrap().unwrap();
        assert_eq!(wm.path, dir.path().join("b.json"));
    }

    #[test]
    fn ties_keep_first_seen() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.txt", 100);
        touch(dir.path(), "a.txt", 100);
        let wm = watermark(dir.path(), &["b.txt", "a.txt"]).unwrap().unwrap();
        assert_eq!(wm.path, dir.path().join("b.txt"));
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "deps/x.js", 100);
        let wm = watermark(dir.path(), &["./deps/*.js"]).unwrap().unwrap();
        assert_eq!(wm.path, dir.path().join("deps/x.js"));
    }

    #[test]
    fn absolute_pattern_matches_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        touch(other.path(), "shared/z.cfg", 700);
        let pattern = format!("{}/shared/*.cfg", other.path().display());
        let wm = watermark(root.path(), &[pattern.as_str()]).unwrap().unwrap();
        assert_eq!(wm.path, other.path().join("shared/z.cfg"));
    }

    #[test]
    fn nothing_matched_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = watermark(dir.path(), &["missing/*.txt", "nope.txt"]).unwrap_err();
        match err {
            FreshenError::Config(ConfigError::NoExtraMatches { patterns }) => {
                assert_eq!(patterns.len(), 2);
            }
            other => panic!("expected no matches, got {other:?}"),
        }
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = watermark(dir.path(), &["src/[a-"]).unwrap_err();
        assert!(matches!(
            err,
            FreshenError::Config(ConfigError::InvalidPattern { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_match_is_extra_stat_error() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("link.txt"))
            .unwrap();
        let err = watermark(dir.path(), &["*.txt"]).unwrap_err();
        match err {
            FreshenError::ExtraStat { path, .. } => {
                assert_eq!(path, dir.path().join("link.txt"));
            }
            other => panic!("expected extra stat error, got {other:?}"),
        }
    }

    #[test]
    fn literal_prefix_split() {
        assert_eq!(
            split_literal_prefix("a/b/*.txt"),
            (PathBuf::from("a/b"), Some("*.txt"))
        );
        assert_eq!(split_literal_prefix("**/x"), (PathBuf::new(), Some("**/x")));
        assert_eq!(split_literal_prefix("a/b.txt"), (PathBuf::from("a/b.txt"), None));
    }
}
