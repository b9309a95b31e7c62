//! Pure evaluation of collected results
//!
//! Nothing in here performs I/O. Every function is total over its input:
//!
//! - [`budget`]: compares a result with the per-site budget → [`budget::Violation`]s
//! - [`anomaly`]: compares a result with its trailing history → [`anomaly::Anomaly`]s
//! - [`security`]: folds integrity issues into a 0-100 score

pub mod anomaly;
pub mod budget;
pub mod security;
