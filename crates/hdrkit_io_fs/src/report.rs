//! Aggregation report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one `aggregate_headers` run.
#[derive(Debug, Default, Clone)]
pub struct ReportAggregate {
    /// Total scanned directory/file entries under the source root.
    pub cnt_scanned: u64,
    /// Number of files whose name matched a header pattern.
    pub cnt_matched: u64,
    /// Number of headers copied (or planned, in dry-run mode).
    pub cnt_copied: u64,
    /// Number of mirrored directories created (or planned).
    pub cnt_dirs_created: u64,
    /// Non-header files and ignored special entries.
    pub cnt_skipped: u64,
    /// `1` when a pre-existing destination tree was removed.
    pub cnt_removed: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportAggregate {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_removed".to_string(), self.cnt_removed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} matched={} copied={} dirs={} skipped={} removed={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_dirs_created,
            self.cnt_skipped,
            self.cnt_removed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[HEADERS]"))
    }
}

/// Mutable accumulator for aggregation statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportAggregateBuilder {
    report: ReportAggregate,
}

impl ReportAggregateBuilder {
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    pub fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.report.cnt_dirs_created += 1;
    }

    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    pub fn add_removed(&mut self) {
        self.report.cnt_removed += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportAggregate {
        self.report
    }
}
