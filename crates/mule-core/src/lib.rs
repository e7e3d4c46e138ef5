//! # mule-core
//! Foundation types, policy constants and the oracle trait for mulegraph.

pub mod canonical;
pub mod constants;
pub mod error;
pub mod policy;
pub mod traits;
pub mod types;
