//! Report exports.

pub mod csv_utils;

pub use csv_utils::expenses_to_csv;
