//! Header tree traversal and aggregation orchestration.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::report::{ReportAggregate, ReportAggregateBuilder};
use crate::spec::{AggregateError, EnumSymlinkStrategy, SpecAggregateOptions};
use crate::util::{
    SpecHeaderPatterns, copy_file_with_metadata, derive_destination_path, is_overlap,
    normalize_path,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    name_dir: String,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: String,
}

#[derive(Debug)]
struct SpecAggregateContext {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    path_dir_dst_resolved: PathBuf,
    spec_agg_options: SpecAggregateOptions,
    spec_hdr_pats: SpecHeaderPatterns,
    builder_agg_report: ReportAggregateBuilder,
    set_visited_dirs: HashSet<(u64, u64)>,
}

/// Rebuild `dir_destination` as a header-only mirror of `dir_source`.
///
/// This function performs:
/// 1. Pattern compilation and source/destination validation. Nothing on disk
///    is touched if this stage fails.
/// 2. Removal of any existing destination tree, then fresh creation of the
///    destination root.
/// 3. Depth-first traversal of the source: every directory is recreated under
///    the destination before descending (empty ones included), every file
///    whose basename matches `patterns_header` is copied to the same relative
///    path. Other entries are left behind.
///
/// Any filesystem failure aborts the run with an [`AggregateError`] naming the
/// failing path. A partially rebuilt destination is left in place.
///
/// Entries are visited in name order. Symlinks are ignored with a warning
/// unless [`EnumSymlinkStrategy::Dereference`] is selected.
pub fn aggregate_headers<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_agg_options: SpecAggregateOptions,
) -> Result<ReportAggregate, AggregateError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let spec_hdr_pats = SpecHeaderPatterns::from_raw(
        &spec_agg_options.patterns_header,
        spec_agg_options.rule_pattern,
    )?;

    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(AggregateError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(AggregateError::SourceDestinationOverlap {
            path_source: path_dir_src,
            path_destination: path_dir_dst,
        });
    }

    let mut builder_agg_report = ReportAggregateBuilder::default();
    reset_destination(
        &path_dir_dst,
        spec_agg_options.if_dry_run,
        &mut builder_agg_report,
    )?;

    let mut spec_agg_ctx = SpecAggregateContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst_resolved: normalize_path(&path_dir_dst),
        path_dir_dst,
        spec_agg_options,
        spec_hdr_pats,
        builder_agg_report,
        set_visited_dirs: HashSet::new(),
    };

    walk_directory(&path_dir_src, &mut spec_agg_ctx)?;

    let report_agg = spec_agg_ctx.builder_agg_report.build();
    info!(
        source = %spec_agg_ctx.path_dir_src.display(),
        destination = %spec_agg_ctx.path_dir_dst.display(),
        dry_run = spec_agg_ctx.spec_agg_options.if_dry_run,
        "{report_agg}"
    );
    Ok(report_agg)
}

/// Remove whatever sits at the destination root, then recreate it empty.
fn reset_destination(
    path_dir_dst: &Path,
    if_dry_run: bool,
    builder_agg_report: &mut ReportAggregateBuilder,
) -> Result<(), AggregateError> {
    let map_remove_err = |source: io::Error| AggregateError::DestinationRemoveFailed {
        path: path_dir_dst.to_path_buf(),
        source,
    };

    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta_dst) => {
            debug!(path = %path_dir_dst.display(), "Removing existing destination");
            builder_agg_report.add_removed();
            if !if_dry_run {
                if meta_dst.is_dir() {
                    fs::remove_dir_all(path_dir_dst).map_err(map_remove_err)?;
                } else {
                    fs::remove_file(path_dir_dst).map_err(map_remove_err)?;
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(map_remove_err(e)),
    }

    if !if_dry_run {
        fs::create_dir_all(path_dir_dst).map_err(|source| {
            AggregateError::DestinationInitFailed {
                path: path_dir_dst.to_path_buf(),
                source,
            }
        })?;
    }
    Ok(())
}

fn walk_directory(
    path_root: &Path,
    spec_agg_ctx: &mut SpecAggregateContext,
) -> Result<(), AggregateError> {
    let enum_rule_symlink = spec_agg_ctx.spec_agg_options.rule_symlink;
    if enum_rule_symlink == EnumSymlinkStrategy::Dereference
        && (is_inside_destination(path_root, spec_agg_ctx)
            || is_visited_dir(path_root, spec_agg_ctx))
    {
        return Ok(());
    }

    let map_read_err = |source: io::Error| AggregateError::ReadDirFailed {
        path: path_root.to_path_buf(),
        source,
    };

    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    for _entry_res in fs::read_dir(path_root).map_err(map_read_err)? {
        let entry = _entry_res.map_err(map_read_err)?;
        let path_entry = entry.path();
        let c_name = entry.file_name().to_string_lossy().to_string();
        let cfg_file_type = entry.file_type().map_err(map_read_err)?;
        spec_agg_ctx.builder_agg_report.add_scanned();

        let (b_is_dir, b_is_file) = if cfg_file_type.is_symlink() {
            match enum_rule_symlink {
                EnumSymlinkStrategy::Skip => {
                    skip_entry(
                        spec_agg_ctx,
                        format!("Symlink skipped: {}", path_entry.display()),
                    );
                    continue;
                }
                EnumSymlinkStrategy::Dereference => match fs::metadata(&path_entry) {
                    Ok(meta_target) => (meta_target.is_dir(), meta_target.is_file()),
                    Err(e) => {
                        skip_entry(
                            spec_agg_ctx,
                            format!("Broken symlink skipped: {} ({e})", path_entry.display()),
                        );
                        continue;
                    }
                },
            }
        } else {
            (cfg_file_type.is_dir(), cfg_file_type.is_file())
        };

        if b_is_dir {
            l_dirs.push(SpecDirEntry {
                path_dir_src_sub: path_entry,
                name_dir: c_name,
            });
        } else if b_is_file {
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: c_name,
            });
        } else {
            skip_entry(
                spec_agg_ctx,
                format!("Special file skipped: {}", path_entry.display()),
            );
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    for _dir_entry in l_dirs {
        let path_next = _dir_entry.path_dir_src_sub.clone();
        handle_dir_entry(_dir_entry, spec_agg_ctx)?;
        walk_directory(&path_next, spec_agg_ctx)?;
    }

    for _file_entry in l_files {
        handle_file_entry(_file_entry, spec_agg_ctx)?;
    }
    Ok(())
}

/// A followed link may lead back into the tree being rebuilt; never walk it.
fn is_inside_destination(path_dir: &Path, spec_agg_ctx: &mut SpecAggregateContext) -> bool {
    if !normalize_path(path_dir).starts_with(&spec_agg_ctx.path_dir_dst_resolved) {
        return false;
    }
    let c_warning = format!(
        "Destination reached through symlink, not descending: {}",
        path_dir.display()
    );
    warn!("{c_warning}");
    spec_agg_ctx.builder_agg_report.add_warning(c_warning);
    true
}

/// Loop guard for dereferenced directory symlinks. Always `false` off unix.
fn is_visited_dir(path_dir: &Path, spec_agg_ctx: &mut SpecAggregateContext) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        if let Ok(stat_dir) = fs::metadata(path_dir) {
            let tuple_dirs_identifier = (stat_dir.dev(), stat_dir.ino());
            if !spec_agg_ctx.set_visited_dirs.insert(tuple_dirs_identifier) {
                let c_warning = format!("Symlink loop detected: {}", path_dir.display());
                warn!("{c_warning}");
                spec_agg_ctx.builder_agg_report.add_warning(c_warning);
                return true;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (path_dir, &spec_agg_ctx.set_visited_dirs);
    }
    false
}

fn skip_entry(spec_agg_ctx: &mut SpecAggregateContext, c_warning: String) {
    warn!("{c_warning}");
    spec_agg_ctx.builder_agg_report.add_skipped();
    spec_agg_ctx.builder_agg_report.add_warning(c_warning);
}

fn handle_dir_entry(
    spec_dir_entry: SpecDirEntry,
    spec_agg_ctx: &mut SpecAggregateContext,
) -> Result<(), AggregateError> {
    let path_dir_dst_sub = derive_destination_path(
        &spec_dir_entry.path_dir_src_sub,
        &spec_dir_entry.name_dir,
        &spec_agg_ctx.path_dir_src,
        &spec_agg_ctx.path_dir_dst,
    );

    if !spec_agg_ctx.spec_agg_options.if_dry_run {
        fs::create_dir_all(&path_dir_dst_sub).map_err(|source| {
            AggregateError::CreateDirFailed {
                path: path_dir_dst_sub.clone(),
                source,
            }
        })?;
    }
    debug!(path = %path_dir_dst_sub.display(), "Directory mirrored");
    spec_agg_ctx.builder_agg_report.add_dir_created();
    Ok(())
}

fn handle_file_entry(
    spec_file_entry: SpecFileEntry,
    spec_agg_ctx: &mut SpecAggregateContext,
) -> Result<(), AggregateError> {
    if !spec_agg_ctx
        .spec_hdr_pats
        .is_header_name(&spec_file_entry.name_file)
    {
        spec_agg_ctx.builder_agg_report.add_skipped();
        return Ok(());
    }
    spec_agg_ctx.builder_agg_report.add_matched();

    let path_file_dst = derive_destination_path(
        &spec_file_entry.path_file_src,
        &spec_file_entry.name_file,
        &spec_agg_ctx.path_dir_src,
        &spec_agg_ctx.path_dir_dst,
    );

    if !spec_agg_ctx.spec_agg_options.if_dry_run {
        copy_file_with_metadata(
            &spec_file_entry.path_file_src,
            &path_file_dst,
            spec_agg_ctx.spec_agg_options.if_preserve_metadata,
        )
        .map_err(|source| AggregateError::CopyFailed {
            path_source: spec_file_entry.path_file_src.clone(),
            path_destination: path_file_dst.clone(),
            source,
        })?;
    }
    debug!(
        source = %spec_file_entry.path_file_src.display(),
        destination = %path_file_dst.display(),
        "Header copied"
    );
    spec_agg_ctx.builder_agg_report.add_copied();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use tempfile::TempDir;

    use super::aggregate_headers;
    use crate::spec::{
        AggregateError, EnumHeaderPatternMode, EnumSymlinkStrategy, SpecAggregateOptions,
    };

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    /// Relative path -> file bytes (`None` for directories).
    fn snapshot_tree(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
        fn visit(root: &Path, path_dir: &Path, dict_tree: &mut BTreeMap<String, Option<Vec<u8>>>) {
            for entry in std::fs::read_dir(path_dir).expect("read dir") {
                let path_entry = entry.expect("dir entry").path();
                let c_rel = path_entry
                    .strip_prefix(root)
                    .expect("relative")
                    .to_string_lossy()
                    .replace('\\', "/");
                if path_entry.is_dir() {
                    dict_tree.insert(format!("{c_rel}/"), None);
                    visit(root, &path_entry, dict_tree);
                } else {
                    let raw = std::fs::read(&path_entry).expect("read file");
                    dict_tree.insert(c_rel, Some(raw));
                }
            }
        }

        let mut dict_tree = BTreeMap::new();
        visit(root, root, &mut dict_tree);
        dict_tree
    }

    fn snapshot_keys(root: &Path) -> Vec<String> {
        snapshot_tree(root).into_keys().collect()
    }

    #[test]
    fn aggregate_scenario_copies_only_headers() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("include/engine");

        write_text(&src.join("a.h"), "// a");
        write_text(&src.join("a.cpp"), "int a;");
        write_text(&src.join("sub/b.h"), "// b");
        write_text(&src.join("sub/c.txt"), "c");

        let report =
            aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");

        assert_eq!(snapshot_keys(&dst), vec!["a.h", "sub/", "sub/b.h"]);
        assert_eq!(std::fs::read_to_string(dst.join("sub/b.h")).expect("read"), "// b");
        assert_eq!(report.cnt_scanned, 5);
        assert_eq!(report.cnt_matched, 2);
        assert_eq!(report.cnt_copied, 2);
        assert_eq!(report.cnt_dirs_created, 1);
        assert_eq!(report.cnt_skipped, 2);
        assert_eq!(report.cnt_removed, 0);
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn aggregate_never_copies_non_headers() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("foo.cpp"), "x");
        write_text(&src.join("deep/er/foo.cpp"), "x");
        write_text(&src.join("deep/foo.hpp"), "x");
        write_text(&src.join("deep/foo.h.in"), "x");

        aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");

        let l_keys = snapshot_keys(&dst);
        assert_eq!(l_keys, vec!["deep/", "deep/er/"]);
    }

    #[test]
    fn aggregate_preserves_empty_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        std::fs::create_dir_all(src.join("empty/nested")).expect("mkdir");
        write_text(&src.join("only_sources/x.cpp"), "x");

        aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");

        assert!(dst.join("empty/nested").is_dir());
        assert!(dst.join("only_sources").is_dir());
        assert!(!dst.join("only_sources/x.cpp").exists());
    }

    #[test]
    fn aggregate_removes_stale_destination_content() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        write_text(&dst.join("stale.h"), "old");
        write_text(&dst.join("gone/notes.txt"), "old");

        let report =
            aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");

        assert_eq!(report.cnt_removed, 1);
        assert!(!dst.join("stale.h").exists());
        assert!(!dst.join("gone").exists());
        assert_eq!(snapshot_keys(&dst), vec!["a.h"]);
    }

    #[test]
    fn aggregate_replaces_destination_file() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        write_text(&dst, "not a directory");

        aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");
        assert!(dst.join("a.h").is_file());
    }

    #[test]
    fn aggregate_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        write_text(&src.join("x/y/z.h"), "z");
        write_text(&src.join("x/w.c"), "w");
        std::fs::create_dir_all(src.join("v")).expect("mkdir");

        aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("first run");
        let dict_first = snapshot_tree(&dst);
        aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("second run");
        let dict_second = snapshot_tree(&dst);

        assert_eq!(dict_first, dict_second);
        assert_eq!(dict_first.len(), 5);
    }

    #[test]
    fn aggregate_missing_source_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("missing");
        let dst = tmp.path().join("out");
        write_text(&dst.join("keep.h"), "keep");

        let err = aggregate_headers(&src, &dst, SpecAggregateOptions::default())
            .expect_err("missing source must fail");
        assert!(matches!(err, AggregateError::SourceNotDirectory(_)));
        assert!(err.to_string().contains("missing"));
        assert!(dst.join("keep.h").exists());
    }

    #[test]
    fn aggregate_overlap_rejected_before_removal() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.h"), "a");

        let err = aggregate_headers(&src, src.join("include"), SpecAggregateOptions::default())
            .expect_err("nested destination must fail");
        assert!(matches!(err, AggregateError::SourceDestinationOverlap { .. }));

        let err = aggregate_headers(&src, tmp.path(), SpecAggregateOptions::default())
            .expect_err("parent destination must fail");
        assert!(matches!(err, AggregateError::SourceDestinationOverlap { .. }));
        assert!(src.join("a.h").exists());
    }

    #[test]
    fn aggregate_invalid_pattern_leaves_destination_alone() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        write_text(&src.join("a.h"), "a");
        write_text(&dst.join("keep.h"), "keep");

        let spec_agg_options = SpecAggregateOptions {
            patterns_header: vec!["(".to_string()],
            rule_pattern: EnumHeaderPatternMode::Regex,
            ..SpecAggregateOptions::default()
        };
        let err = aggregate_headers(&src, &dst, spec_agg_options).expect_err("must fail");
        assert!(matches!(err, AggregateError::InvalidPattern(_)));
        assert!(dst.join("keep.h").exists());
    }

    #[test]
    fn aggregate_with_custom_suffixes() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        write_text(&src.join("b.hpp"), "b");
        write_text(&src.join("c.inl"), "c");

        let spec_agg_options = SpecAggregateOptions {
            patterns_header: vec![".hpp".to_string(), ".inl".to_string()],
            ..SpecAggregateOptions::default()
        };
        aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");
        assert_eq!(snapshot_keys(&dst), vec!["b.hpp", "c.inl"]);
    }

    #[test]
    fn aggregate_with_glob_patterns() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("api_core.h"), "a");
        write_text(&src.join("detail.h"), "d");

        let spec_agg_options = SpecAggregateOptions {
            patterns_header: vec!["api_*.h".to_string()],
            rule_pattern: EnumHeaderPatternMode::Glob,
            ..SpecAggregateOptions::default()
        };
        aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");
        assert_eq!(snapshot_keys(&dst), vec!["api_core.h"]);
    }

    #[test]
    fn aggregate_dry_run_does_not_touch_filesystem() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        write_text(&src.join("sub/b.h"), "b");
        write_text(&dst.join("stale.h"), "old");

        let spec_agg_options = SpecAggregateOptions {
            if_dry_run: true,
            ..SpecAggregateOptions::default()
        };
        let report = aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");

        assert_eq!(report.cnt_removed, 1);
        assert_eq!(report.cnt_copied, 2);
        assert_eq!(report.cnt_dirs_created, 1);
        assert_eq!(snapshot_keys(&dst), vec!["stale.h"]);
    }

    #[cfg(unix)]
    #[test]
    fn aggregate_skips_symlinks_by_default() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        let outside = tmp.path().join("outside");

        write_text(&src.join("real.h"), "r");
        write_text(&outside.join("ext.h"), "e");
        symlink(src.join("real.h"), src.join("alias.h")).expect("file symlink");
        symlink(&outside, src.join("linked_dir")).expect("dir symlink");

        let report =
            aggregate_headers(&src, &dst, SpecAggregateOptions::default()).expect("aggregate");

        assert_eq!(snapshot_keys(&dst), vec!["real.h"]);
        assert_eq!(report.warning_count(), 2);
        assert!(report.warnings.iter().all(|w| w.contains("Symlink skipped")));
    }

    #[cfg(unix)]
    #[test]
    fn aggregate_dereference_follows_links_and_stops_on_loops() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        let outside = tmp.path().join("outside");

        write_text(&src.join("real.h"), "r");
        write_text(&outside.join("ext.h"), "e");
        symlink(src.join("real.h"), src.join("alias.h")).expect("file symlink");
        symlink(&outside, src.join("linked_dir")).expect("dir symlink");
        symlink(&src, src.join("loop")).expect("loop symlink");
        symlink(src.join("nowhere.h"), src.join("broken.h")).expect("broken symlink");

        let spec_agg_options = SpecAggregateOptions {
            rule_symlink: EnumSymlinkStrategy::Dereference,
            ..SpecAggregateOptions::default()
        };
        let report = aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");

        assert!(dst.join("alias.h").is_file());
        assert!(!dst.join("alias.h").is_symlink());
        assert_eq!(
            std::fs::read_to_string(dst.join("linked_dir/ext.h")).expect("read"),
            "e"
        );
        assert!(dst.join("loop").is_dir());
        assert!(!dst.join("loop/real.h").exists());
        assert!(report.warnings.iter().any(|w| w.contains("Symlink loop detected")));
        assert!(report.warnings.iter().any(|w| w.contains("Broken symlink skipped")));
    }

    #[test]
    fn aggregate_preserves_metadata_when_requested() {
        use filetime::{FileTime, set_file_times};

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        let path_file_src = src.join("meta.h");
        write_text(&path_file_src, "meta");

        set_file_times(
            &path_file_src,
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        let spec_agg_options = SpecAggregateOptions {
            if_preserve_metadata: true,
            ..SpecAggregateOptions::default()
        };
        aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");

        let stat_src = std::fs::metadata(&path_file_src).expect("src metadata");
        let stat_dst = std::fs::metadata(dst.join("meta.h")).expect("dst metadata");
        assert_eq!(
            FileTime::from_last_modification_time(&stat_src),
            FileTime::from_last_modification_time(&stat_dst)
        );
    }

    #[cfg(unix)]
    #[test]
    fn aggregate_dereference_does_not_descend_into_destination() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");

        write_text(&src.join("a.h"), "a");
        symlink(tmp.path(), src.join("up")).expect("parent symlink");

        let spec_agg_options = SpecAggregateOptions {
            rule_symlink: EnumSymlinkStrategy::Dereference,
            ..SpecAggregateOptions::default()
        };
        let report = aggregate_headers(&src, &dst, spec_agg_options).expect("aggregate");

        assert!(dst.join("a.h").is_file());
        assert!(dst.join("up/out").is_dir());
        assert!(!dst.join("up/out/a.h").exists());
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("Destination reached through symlink"))
        );
        assert!(report.warnings.iter().any(|w| w.contains("Symlink loop detected")));
    }

    #[cfg(unix)]
    #[test]
    fn aggregate_aborts_on_unreadable_directory_and_keeps_partial_output() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        let locked = src.join("zz_locked");

        write_text(&src.join("aa/first.h"), "first");
        write_text(&locked.join("hidden.h"), "hidden");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
            .expect("chmod 000");

        // Privileged users read through mode bits; nothing to exercise then.
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
                .expect("restore mode");
            return;
        }

        let res = aggregate_headers(&src, &dst, SpecAggregateOptions::default());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
            .expect("restore mode");

        let err = res.expect_err("unreadable directory must fail");
        assert!(matches!(err, AggregateError::ReadDirFailed { .. }));
        assert!(err.to_string().contains("zz_locked"));
        assert!(dst.join("aa/first.h").is_file());
        assert!(!dst.join("zz_locked/hidden.h").exists());
    }

    #[cfg(unix)]
    #[test]
    fn aggregate_aborts_on_unreadable_header_and_keeps_partial_output() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out");
        let locked = src.join("zz_locked.h");

        write_text(&src.join("aa/first.h"), "first");
        write_text(&locked, "secret");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
            .expect("chmod 000");

        if std::fs::File::open(&locked).is_ok() {
            return;
        }

        let err = aggregate_headers(&src, &dst, SpecAggregateOptions::default())
            .expect_err("unreadable header must fail");
        assert!(matches!(err, AggregateError::CopyFailed { .. }));
        assert!(err.to_string().contains("zz_locked.h"));
        assert!(dst.join("aa/first.h").is_file());
        assert!(!dst.join("zz_locked.h").exists());
    }
}
