//! Options and source arguments shared by every subcommand.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use freshen_core::{load_options, ExtraPatterns, OptionsInput, OptionsRecord, SourceFile};
use freshen_filter::Freshness;
use freshen_mapper::TemplateMapper;

/// How destinations are found. Flags override fields from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// Destination directory, or a single destination file.
    #[arg(long, short = 'd')]
    pub dest: Option<String>,

    /// Replace each source's extension when naming its destination.
    #[arg(long)]
    pub ext: Option<String>,

    /// Destination name template, e.g. '{{ dir }}/{{ stem }}.css'.
    #[arg(long)]
    pub map: Option<String>,

    /// Extra dependency glob; repeatable. Newer extras make every file stale.
    #[arg(long = "extra", short = 'x')]
    pub extra: Vec<String>,

    /// Compare change times (ctime) instead of modification times.
    #[arg(long)]
    pub ctime: bool,

    /// Working root for sources, destinations and extras (default: cwd).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// YAML options file: a destination string or a record.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl OptionArgs {
    /// Merge the options file and flags into one record.
    pub fn record(&self) -> Result<OptionsRecord> {
        let mut record = match &self.config {
            Some(path) => match load_options(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?
            {
                OptionsInput::Destination(dest) => OptionsRecord::default().with_dest(dest),
                OptionsInput::Record(record) => record,
            },
            None => OptionsRecord::default(),
        };

        if let Some(dest) = &self.dest {
            record.dest = Some(dest.clone());
        }
        if let Some(ext) = &self.ext {
            record.ext = Some(ext.clone());
        }
        if let Some(map) = &self.map {
            record.map = Some(map.clone());
        }
        if !self.extra.is_empty() {
            record.extra = Some(ExtraPatterns::Many(self.extra.clone()));
        }
        if self.ctime {
            record.ctime = true;
        }

        let root = match self.root.clone().or_else(|| record.root.clone()) {
            Some(root) => root,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        record.root = Some(root);

        if let Some(template) = record.map.clone() {
            let mapper = TemplateMapper::new(&template)
                .with_context(|| format!("invalid destination template '{template}'"))?;
            record = record.with_mapper(mapper);
        }
        Ok(record)
    }

    /// Build the engine: validate, resolve extras, pick the destination mode.
    pub fn engine(&self) -> Result<Freshness> {
        let record = self.record()?;
        Freshness::new(Some(record.into())).context("invalid freshness options")
    }
}

/// Collect sources from arguments, or from stdin when there are none.
///
/// Absolute paths must lie under `root` and are made relative to it. A path
/// that cannot be stat'ed is passed on without timestamps; the engine
/// rejects it.
pub fn read_sources(args: &[PathBuf], root: &Path) -> Result<Vec<SourceFile>> {
    let raw: Vec<PathBuf> = if args.is_empty() {
        let stdin = std::io::stdin();
        let mut lines = Vec::new();
        for line in stdin.lock().lines() {
            let line = line.context("failed to read sources from stdin")?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(PathBuf::from(trimmed));
            }
        }
        lines
    } else {
        args.to_vec()
    };

    raw.into_iter()
        .map(|path| source_file(root, path))
        .collect()
}

fn source_file(root: &Path, path: PathBuf) -> Result<SourceFile> {
    let relative = if path.is_absolute() {
        let base = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .context("could not determine current directory")?
                .join(root)
        };
        match path.strip_prefix(&base) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => bail!(
                "source {} is outside the root {}",
                path.display(),
                base.display()
            ),
        }
    } else {
        path
    };
    match SourceFile::stat(root, relative.clone()) {
        Ok(file) => Ok(file),
        Err(err) => {
            tracing::warn!("cannot stat {}: {err}", relative.display());
            Ok(SourceFile::without_times(relative))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("freshen.yaml");
        fs::write(&config, "dest: from-file\next: .css\n").unwrap();

        let args = OptionArgs {
            dest: Some("from-flag".into()),
            config: Some(config),
            root: Some(dir.path().to_path_buf()),
            ..OptionArgs::default()
        };
        let record = args.record().unwrap();
        assert_eq!(record.dest.as_deref(), Some("from-flag"));
        assert_eq!(record.ext.as_deref(), Some(".css"));
        assert_eq!(record.root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn bare_config_file_sets_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("freshen.yaml");
        fs::write(&config, "dist\n").unwrap();

        let args = OptionArgs {
            config: Some(config),
            ..OptionArgs::default()
        };
        assert_eq!(args.record().unwrap().dest.as_deref(), Some("dist"));
    }

    #[test]
    fn map_template_becomes_mapper() {
        let args = OptionArgs {
            map: Some("{{ stem }}.css".into()),
            ..OptionArgs::default()
        };
        let record = args.record().unwrap();
        assert!(record.mapper.is_some());
    }

    #[test]
    fn bad_template_is_reported() {
        let args = OptionArgs {
            map: Some("{{ stem ".into()),
            ..OptionArgs::default()
        };
        let err = args.record().unwrap_err();
        assert!(err.to_string().contains("invalid destination template"));
    }

    #[test]
    fn absolute_sources_become_relative_to_root() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let file = source_file(dir.path(), dir.path().join("a.txt")).unwrap();
        assert_eq!(file.relative, PathBuf::from("a.txt"));
        assert!(file.times.is_some());
    }

    #[test]
    fn absolute_source_outside_root_is_an_error() {
        let root = tempfile::TempDir::new().unwrap();
        let elsewhere = tempfile::TempDir::new().unwrap();
        fs::write(elsewhere.path().join("a.js"), "a").unwrap();
        let err = source_file(root.path(), elsewhere.path().join("a.js")).unwrap_err();
        assert!(err.to_string().contains("outside the root"));
    }

    #[test]
    fn unreadable_source_has_no_times() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = source_file(dir.path(), PathBuf::from("missing.txt")).unwrap();
        assert!(file.times.is_none());
    }
}
