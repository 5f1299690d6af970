use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{AggregateError, EnumHeaderPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeHeaderPatternSeq {
    Suffix(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

/// Compiled header predicate.
#[derive(Debug, Clone)]
pub(crate) struct SpecHeaderPatterns {
    patterns_header: TypeHeaderPatternSeq,
}

impl SpecHeaderPatterns {
    pub(crate) fn from_raw(
        patterns_header: &[String],
        rule_pattern: EnumHeaderPatternMode,
    ) -> Result<Self, AggregateError> {
        if patterns_header.is_empty() {
            return Err(AggregateError::EmptyPatterns);
        }

        let patterns_header = match rule_pattern {
            EnumHeaderPatternMode::Suffix => {
                if patterns_header.iter().any(|p| p.is_empty()) {
                    return Err(AggregateError::InvalidPattern(
                        "Suffix pattern must not be empty.".to_string(),
                    ));
                }
                TypeHeaderPatternSeq::Suffix(patterns_header.to_vec())
            }
            EnumHeaderPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns_header.len());
                for pattern in patterns_header {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| AggregateError::InvalidPattern(e.to_string()))?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                TypeHeaderPatternSeq::Glob(l_glob)
            }
            EnumHeaderPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns_header.len());
                for pattern in patterns_header {
                    let regex = Regex::new(pattern)
                        .map_err(|e| AggregateError::InvalidPattern(e.to_string()))?;
                    l_regex.push(regex);
                }
                TypeHeaderPatternSeq::Regex(l_regex)
            }
        };
        Ok(Self { patterns_header })
    }

    /// Whether a file basename marks a header.
    pub(crate) fn is_header_name(&self, name_file: &str) -> bool {
        match &self.patterns_header {
            TypeHeaderPatternSeq::Suffix(v) => v.iter().any(|p| name_file.ends_with(p.as_str())),
            TypeHeaderPatternSeq::Glob(v) => v.iter().any(|p| p.is_match(name_file)),
            TypeHeaderPatternSeq::Regex(v) => v.iter().any(|p| p.is_match(name_file)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_cursor = path_abs.as_path();
    let mut l_tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_cursor) {
            return l_tail
                .iter()
                .rev()
                .fold(resolved, |acc, part| acc.join(part));
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent;
            }
            _ => return path_abs,
        }
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = normalize_path(src);
    let dst_resolved = normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Mirror `path_src` (under `path_dir_src`) into `path_dir_dst`.
pub(crate) fn derive_destination_path(
    path_src: &Path,
    path_item_name: &str,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> PathBuf {
    path_dir_dst.join(
        path_src
            .strip_prefix(path_dir_src)
            .unwrap_or(Path::new(path_item_name)),
    )
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                name = %name.to_string_lossy(),
                error = %e,
                "Extended attribute not copied"
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
