use std::collections::BTreeMap;
use std::error::Error;

use hdrkit_io_fs::{
    AggregateError, C_HEADER_SUFFIX_DEFAULT, EnumHeaderPatternMode, EnumSymlinkStrategy,
    ReportAggregate, SpecAggregateOptions, aggregate_headers,
};
use pyo3::exceptions::{PyNotADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "hdrkit.fs.aggregate_headers.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportAggregate")]
#[derive(Debug, Clone)]
struct PyReportAggregate {
    report: ReportAggregate,
}

impl From<ReportAggregate> for PyReportAggregate {
    fn from(report: ReportAggregate) -> Self {
        Self { report }
    }
}

#[pymethods]
impl PyReportAggregate {
    #[getter]
    fn cnt_scanned(&self) -> u64 {
        self.report.cnt_scanned
    }

    #[getter]
    fn cnt_matched(&self) -> u64 {
        self.report.cnt_matched
    }

    #[getter]
    fn cnt_copied(&self) -> u64 {
        self.report.cnt_copied
    }

    #[getter]
    fn cnt_dirs_created(&self) -> u64 {
        self.report.cnt_dirs_created
    }

    #[getter]
    fn cnt_skipped(&self) -> u64 {
        self.report.cnt_skipped
    }

    #[getter]
    fn cnt_removed(&self) -> u64 {
        self.report.cnt_removed
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.report.warnings.clone()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.report.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[HEADERS]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumHeaderPatternMode> {
    match value {
        "suffix" => Ok(EnumHeaderPatternMode::Suffix),
        "glob" => Ok(EnumHeaderPatternMode::Glob),
        "regex" => Ok(EnumHeaderPatternMode::Regex),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['suffix', 'glob', 'regex']"
        ))),
    }
}

fn parse_rule_symlink(value: &str) -> PyResult<EnumSymlinkStrategy> {
    match value {
        "skip" => Ok(EnumSymlinkStrategy::Skip),
        "dereference" => Ok(EnumSymlinkStrategy::Dereference),
        _ => Err(PyValueError::new_err(format!(
            "Invalid symlink strategy: `{value}`. Expected one of: ['skip', 'dereference']"
        ))),
    }
}

fn map_aggregate_error(exception: AggregateError) -> PyErr {
    let mut message = exception.to_string();
    if let Some(source) = exception.source() {
        message.push_str(&format!(": {source}"));
    }

    match exception {
        AggregateError::SourceNotDirectory(_) => PyNotADirectoryError::new_err(message),
        AggregateError::EmptyPatterns
        | AggregateError::InvalidPattern(_)
        | AggregateError::SourceDestinationOverlap { .. } => PyValueError::new_err(message),
        AggregateError::DestinationRemoveFailed { .. }
        | AggregateError::DestinationInitFailed { .. }
        | AggregateError::ReadDirFailed { .. }
        | AggregateError::CreateDirFailed { .. }
        | AggregateError::CopyFailed { .. } => PyOSError::new_err(message),
    }
}

#[pyfunction(name = "aggregate_headers")]
#[pyo3(signature = (
    dir_source,
    dir_destination,
    patterns_header = None,
    rule_pattern = "suffix",
    rule_symlink = "skip",
    if_preserve_metadata = false,
    if_dry_run = false
))]
#[allow(clippy::too_many_arguments)]
fn aggregate_headers_py(
    py: Python<'_>,
    dir_source: String,
    dir_destination: String,
    patterns_header: Option<Vec<String>>,
    rule_pattern: &str,
    rule_symlink: &str,
    if_preserve_metadata: bool,
    if_dry_run: bool,
) -> PyResult<PyReportAggregate> {
    let spec_agg_options = SpecAggregateOptions {
        patterns_header: patterns_header
            .unwrap_or_else(|| vec![C_HEADER_SUFFIX_DEFAULT.to_string()]),
        rule_pattern: parse_rule_pattern(rule_pattern)?,
        rule_symlink: parse_rule_symlink(rule_symlink)?,
        if_preserve_metadata,
        if_dry_run,
    };

    let report = py.allow_threads(|| {
        aggregate_headers(dir_source, dir_destination, spec_agg_options)
    });
    let report = report.map_err(map_aggregate_error)?;
    Ok(PyReportAggregate::from(report))
}

#[pymodule]
fn _hdrkit_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportAggregate>()?;
    module.add_function(wrap_pyfunction!(aggregate_headers_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
