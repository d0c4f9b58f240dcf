//! SELSCAN and NEOSCAN: per-marker selection scans run downstream of a fitted
//! ancestry (`Q`, `F`) and covariance (`C`) solution.

mod error;
pub mod neoscan;
pub mod selscan;

pub use error::ScanError;
pub use neoscan::NeoscanResult;
pub use selscan::SelscanResult;
