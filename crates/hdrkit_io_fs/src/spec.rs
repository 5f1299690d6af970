//! Aggregation specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::conf::C_HEADER_SUFFIX_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How entries of `patterns_header` are matched against a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumHeaderPatternMode {
    /// File name ends with the pattern (`.h`, `.hpp`, ...).
    #[default]
    Suffix,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
}

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSymlinkStrategy {
    /// Ignore symlink entries and record a warning.
    #[default]
    Skip,
    /// Follow the link and treat the target as a file or directory.
    Dereference,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `aggregate_headers`.
#[derive(Debug, Clone)]
pub struct SpecAggregateOptions {
    /// Patterns applied to file basename; a file matching any of them is a header.
    pub patterns_header: Vec<String>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumHeaderPatternMode,
    /// Symlink handling behavior.
    pub rule_symlink: EnumSymlinkStrategy,
    /// Copy permissions, timestamps and (Linux) extended attributes.
    pub if_preserve_metadata: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecAggregateOptions {
    fn default() -> Self {
        Self {
            patterns_header: vec![C_HEADER_SUFFIX_DEFAULT.to_string()],
            rule_pattern: EnumHeaderPatternMode::Suffix,
            rule_symlink: EnumSymlinkStrategy::Skip,
            if_preserve_metadata: false,
            if_dry_run: false,
        }
    }
}

/// Fatal aggregation failure. The run stops at the first one.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// `patterns_header` was empty.
    #[error("At least one header pattern is required.")]
    EmptyPatterns,
    /// Pattern failed to compile.
    #[error("Invalid header pattern: {0}")]
    InvalidPattern(String),
    /// Source path is missing or not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .path_source.display(),
        .path_destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        path_source: PathBuf,
        /// Normalized destination directory.
        path_destination: PathBuf,
    },
    /// Existing destination tree could not be removed.
    #[error("Failed to remove destination {}", .path.display())]
    DestinationRemoveFailed {
        /// Destination root.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Destination root could not be created.
    #[error("Failed to initialize destination {}", .path.display())]
    DestinationInitFailed {
        /// Destination root.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Source directory could not be listed.
    #[error("Failed to read directory {}", .path.display())]
    ReadDirFailed {
        /// Source directory being listed.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Mirrored destination directory could not be created.
    #[error("Failed to create directory {}", .path.display())]
    CreateDirFailed {
        /// Destination directory.
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Header copy (or its metadata transfer) failed.
    #[error(
        "Failed to copy {} -> {}",
        .path_source.display(),
        .path_destination.display()
    )]
    CopyFailed {
        /// Source header.
        path_source: PathBuf,
        /// Destination header.
        path_destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
