//! Small helpers shared across the CMASK ETL crates.

#![deny(missing_docs)]

pub mod env;
