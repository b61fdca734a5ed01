//! Extraction, aggregation and resampling of object-detection benchmark workbooks.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod model;
pub mod reports;
pub mod resample;
pub mod sink;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;
