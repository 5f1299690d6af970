//! Command line surface for `hdrkit`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;

use hdrkit_io_fs::{
    C_DIR_DESTINATION_DEFAULT, C_DIR_SOURCE_DEFAULT, C_HEADER_SUFFIX_DEFAULT,
    EnumHeaderPatternMode, EnumSymlinkStrategy, ReportAggregate, SpecAggregateOptions,
    aggregate_headers,
};

/// Pattern interpretation for `--pattern`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternModeArg {
    Suffix,
    Glob,
    Regex,
}

impl From<PatternModeArg> for EnumHeaderPatternMode {
    fn from(value: PatternModeArg) -> Self {
        match value {
            PatternModeArg::Suffix => EnumHeaderPatternMode::Suffix,
            PatternModeArg::Glob => EnumHeaderPatternMode::Glob,
            PatternModeArg::Regex => EnumHeaderPatternMode::Regex,
        }
    }
}

/// Copy header files from a source tree into an include directory,
/// mirroring the directory structure.
///
/// The destination is deleted and rebuilt on every run. Anything placed
/// there by hand is lost.
#[derive(Debug, Parser)]
#[command(name = "hdrkit", version)]
pub struct Cli {
    /// Working root that relative source/destination paths are resolved against.
    #[arg(long, env = "HDRKIT_ROOT")]
    pub root: Option<PathBuf>,

    /// Source tree to scan.
    #[arg(short, long, env = "HDRKIT_SOURCE", default_value = C_DIR_SOURCE_DEFAULT)]
    pub source: PathBuf,

    /// Include directory to rebuild.
    #[arg(short, long, env = "HDRKIT_DESTINATION", default_value = C_DIR_DESTINATION_DEFAULT)]
    pub destination: PathBuf,

    /// Header pattern; repeat or comma-separate for several.
    #[arg(
        short,
        long = "pattern",
        env = "HDRKIT_PATTERN",
        value_delimiter = ',',
        default_value = C_HEADER_SUFFIX_DEFAULT
    )]
    pub patterns: Vec<String>,

    /// How `--pattern` values are matched against file names.
    #[arg(long, value_enum, default_value_t = PatternModeArg::Suffix)]
    pub pattern_mode: PatternModeArg,

    /// Follow symlinks instead of ignoring them.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Copy permissions, timestamps and extended attributes.
    #[arg(long)]
    pub preserve_metadata: bool,

    /// Report what would happen without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(path_root) if path.is_relative() => path_root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn path_source(&self) -> PathBuf {
        self.resolve(&self.source)
    }

    pub fn path_destination(&self) -> PathBuf {
        self.resolve(&self.destination)
    }

    pub fn to_options(&self) -> SpecAggregateOptions {
        SpecAggregateOptions {
            patterns_header: self.patterns.clone(),
            rule_pattern: self.pattern_mode.into(),
            rule_symlink: if self.follow_symlinks {
                EnumSymlinkStrategy::Dereference
            } else {
                EnumSymlinkStrategy::Skip
            },
            if_preserve_metadata: self.preserve_metadata,
            if_dry_run: self.dry_run,
        }
    }
}

/// Run one aggregation from parsed arguments.
pub fn run(cli: &Cli) -> Result<ReportAggregate> {
    let path_source = cli.path_source();
    let path_destination = cli.path_destination();
    debug!(
        source = %path_source.display(),
        destination = %path_destination.display(),
        "Aggregating headers"
    );

    aggregate_headers(&path_source, &path_destination, cli.to_options()).with_context(|| {
        format!(
            "header aggregation {} -> {} failed",
            path_source.display(),
            path_destination.display()
        )
    })
}

/// Line printed to stdout after a successful run; only dry runs have one.
pub fn summary_line(cli: &Cli, report: &ReportAggregate) -> Option<String> {
    cli.dry_run.then(|| report.to_string())
}
