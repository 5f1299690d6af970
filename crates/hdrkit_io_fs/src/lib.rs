//! `hdrkit_io_fs` v1:
//! Rust-side header aggregation engine.
//!
//! Rebuilds an include directory as a header-only mirror of a source tree.
//! - `aggregate` : traversal and copy orchestration
//! - `conf`      : default paths and suffix
//! - `spec`      : enums/options/errors
//! - `report`    : run-time report model
//! - `util`      : shared helper functions

pub mod aggregate;
pub mod conf;
pub mod report;
pub mod spec;
mod util;

pub use aggregate::aggregate_headers;
pub use conf::{C_DIR_DESTINATION_DEFAULT, C_DIR_SOURCE_DEFAULT, C_HEADER_SUFFIX_DEFAULT};
pub use report::{ReportAggregate, ReportAggregateBuilder};
pub use spec::{AggregateError, EnumHeaderPatternMode, EnumSymlinkStrategy, SpecAggregateOptions};
