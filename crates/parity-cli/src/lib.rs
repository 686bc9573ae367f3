//! CLI library components for the migration parity validator.

pub mod logging;
pub mod rules_file;
pub mod summary;
