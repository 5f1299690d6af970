//! Aggregation defaults.

/// Source directory scanned when no source is given.
pub const C_DIR_SOURCE_DEFAULT: &str = "src";
/// Destination directory rebuilt when no destination is given.
pub const C_DIR_DESTINATION_DEFAULT: &str = "include/engine";
/// File-name suffix that marks a file as a header.
pub const C_HEADER_SUFFIX_DEFAULT: &str = ".h";
