//! Destination resolution.
//!
//! Mode precedence, decided once per engine:
//! 1. `PerFile` when the destination is an existing directory, or an
//!    extension override or mapper is configured.
//! 2. `Shared` otherwise: every source compares against one destination
//!    file, stat'ed once up front.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use freshen_core::{Config, DestinationProbe, FileTimes, SourceFile};

use crate::error::{stat_err, FreshenError};

/// How sources map onto destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationMode {
    /// Each source derives its own destination, optionally under `dir`.
    PerFile { dir: Option<PathBuf> },
    /// All sources share one destination; `probe` was taken at construction.
    Shared { path: PathBuf, probe: DestinationProbe },
}

impl DestinationMode {
    pub fn is_shared(&self) -> bool {
        matches!(self, DestinationMode::Shared { .. })
    }
}

/// One source's destination and what was found there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub probe: DestinationProbe,
}

/// Choose the destination mode for `config`, stat'ing a shared destination.
pub fn select_mode(config: &Config) -> Result<DestinationMode, FreshenError> {
    let dest = config.destination_path();
    let dest_is_dir = dest.as_deref().is_some_and(Path::is_dir);

    if dest_is_dir || config.extension().is_some() || config.mapper().is_some() {
        return Ok(DestinationMode::PerFile { dir: dest });
    }

    // normalize() guarantees a destination when there is no mapper.
    let path = dest.unwrap_or_else(|| config.root().to_path_buf());
    let probe = probe(&path)?;
    Ok(DestinationMode::Shared { path, probe })
}

/// Resolve the destination for one source file.
pub fn resolve(
    config: &Config,
    mode: &DestinationMode,
    file: &SourceFile,
) -> Result<Resolved, FreshenError> {
    match mode {
        DestinationMode::Shared { path, probe } => Ok(Resolved {
            path: path.clone(),
            probe: *probe,
        }),
        DestinationMode::PerFile { dir } => {
            let path = per_file_path(config, dir.as_deref(), &file.relative)?;
            let probe = probe(&path)?;
            Ok(Resolved { path, probe })
        }
    }
}

fn per_file_path(
    config: &Config,
    dir: Option<&Path>,
    relative: &Path,
) -> Result<PathBuf, FreshenError> {
    if relative.is_absolute() {
        return Err(FreshenError::AbsoluteSource {
            path: relative.to_path_buf(),
        });
    }
    let mut named = relative.to_path_buf();
    if let Some(ext) = config.extension() {
        named.set_extension(ext);
    }
    if let Some(mapper) = config.mapper() {
        named = mapper
            .map(&named)
            .map_err(|source| FreshenError::Mapper {
                path: relative.to_path_buf(),
                source,
            })?;
    }
    // Only a mapper can produce an absolute `named`; it replaces the prefix.
    Ok(dir.unwrap_or(config.root()).join(named))
}

/// Stat `path`: found, absent on NotFound, fatal otherwise.
pub fn probe(path: &Path) -> Result<DestinationProbe, FreshenError> {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let times = FileTimes::from_metadata(&meta).map_err(|e| stat_err(path, e))?;
            Ok(DestinationProbe::Found(times))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(DestinationProbe::Absent),
        Err(err) => Err(stat_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};

    use freshen_core::{normalize, OptionsRecord};
    use tempfile::TempDir;

    fn config(record: OptionsRecord, root: &Path) -> Config {
        normalize(Some(record.with_root(root).into())).expect("normalize")
    }

    fn source(rel: &str) -> SourceFile {
        SourceFile::new(rel, FileTimes::uniform(UNIX_EPOCH + Duration::from_secs(1)))
    }

    #[test]
    fn existing_directory_is_per_file() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("dist")).unwrap();
        let cfg = config(OptionsRecord::default().with_dest("dist"), root.path());
        assert_eq!(
            select_mode(&cfg).unwrap(),
            DestinationMode::PerFile {
                dir: Some(root.path().join("dist"))
            }
        );
    }

    #[test]
    fn missing_destination_is_shared_and_absent() {
        let root = TempDir::new().unwrap();
        let cfg = config(OptionsRecord::default().with_dest("dist"), root.path());
        let mode = select_mode(&cfg).unwrap();
        assert_eq!(
            mode,
            DestinationMode::Shared {
                path: root.path().join("dist"),
                probe: DestinationProbe::Absent
            }
        );
    }

    #[test]
    fn existing_file_is_shared_and_found() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("bundle.js"), "x").unwrap();
        let cfg = config(OptionsRecord::default().with_dest("bundle.js"), root.path());
        let mode = select_mode(&cfg).unwrap();
        assert!(mode.is_shared());
        let resolved = resolve(&cfg, &mode, &source("a.js")).unwrap();
        assert!(matches!(resolved.probe, DestinationProbe::Found(_)));
        assert_eq!(resolved.path, root.path().join("bundle.js"));
    }

    #[test]
    fn extension_forces_per_file_even_without_directory() {
        let root = TempDir::new().unwrap();
        let cfg = config(
            OptionsRecord::default().with_dest("out").with_ext(".css"),
            root.path(),
        );
        let mode = select_mode(&cfg).unwrap();
        assert!(!mode.is_shared());
        let resolved = resolve(&cfg, &mode, &source("styles/site.scss")).unwrap();
        assert_eq!(resolved.path, root.path().join("out/styles/site.css"));
        assert_eq!(resolved.probe, DestinationProbe::Absent);
    }

    #[test]
    fn mapper_runs_after_extension() {
        let root = TempDir::new().unwrap();
        let cfg = config(
            OptionsRecord::default()
                .with_dest("out")
                .with_ext("min.js")
                .with_mapper(|p: &Path| Path::new("flat").join(p.file_name().unwrap_or_default())),
            root.path(),
        );
        let mode = select_mode(&cfg).unwrap();
        let resolved = resolve(&cfg, &mode, &source("lib/app.js")).unwrap();
        assert_eq!(resolved.path, root.path().join("out/flat/app.min.js"));
    }

    #[test]
    fn absolute_mapper_result_ignores_destination() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("fixed.txt");
        fs::write(&target, "x").unwrap();
        let fixed = target.clone();
        let cfg = config(
            OptionsRecord::default()
                .with_dest("out")
                .with_mapper(move |_: &Path| fixed.clone()),
            root.path(),
        );
        let mode = select_mode(&cfg).unwrap();
        let resolved = resolve(&cfg, &mode, &source("a.txt")).unwrap();
        assert_eq!(resolved.path, target);
        assert!(matches!(resolved.probe, DestinationProbe::Found(_)));
    }

    #[test]
    fn mapper_without_destination_resolves_against_root() {
        let root = TempDir::new().unwrap();
        let cfg = config(
            OptionsRecord::default().with_mapper(|p: &Path| p.with_extension("o")),
            root.path(),
        );
        let mode = select_mode(&cfg).unwrap();
        assert_eq!(mode, DestinationMode::PerFile { dir: None });
        let resolved = resolve(&cfg, &mode, &source("src/main.c")).unwrap();
        assert_eq!(resolved.path, root.path().join("src/main.o"));
    }

    #[test]
    fn failing_mapper_surfaces_source_path() {
        struct Refuse;
        impl freshen_core::DestinationMapper for Refuse {
            fn map(&self, _: &Path) -> Result<PathBuf, freshen_core::MapError> {
                Err(freshen_core::MapError::new("no destination"))
            }
        }

        let root = TempDir::new().unwrap();
        let cfg = config(OptionsRecord::default().with_mapper(Refuse), root.path());
        let mode = select_mode(&cfg).unwrap();
        match resolve(&cfg, &mode, &source("a.txt")).unwrap_err() {
            FreshenError::Mapper { path, .. } => assert_eq!(path, PathBuf::from("a.txt")),
            other => panic!("expected mapper error, got {other:?}"),
        }
    }

    #[test]
    fn absolute_source_is_rejected_per_file() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("dist")).unwrap();
        let cfg = config(OptionsRecord::default().with_dest("dist"), root.path());
        let mode = select_mode(&cfg).unwrap();

        let outside = elsewhere.path().join("a.js");
        let file = SourceFile::new(
            outside.clone(),
            FileTimes::uniform(UNIX_EPOCH + Duration::from_secs(1)),
        );
        match resolve(&cfg, &mode, &file).unwrap_err() {
            FreshenError::AbsoluteSource { path } => assert_eq!(path, outside),
            other => panic!("expected absolute source error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_not_found_stat_error_is_fatal() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("plain"), "x").unwrap();
        // `plain` is a file, so `plain/inner` fails with ENOTDIR.
        let err = probe(&root.path().join("plain/inner")).unwrap_err();
        assert!(matches!(err, FreshenError::UnexpectedStat { .. }));
    }
}
