//! Cross-crate test suite for mulegraph.
//!
//! Exercises the full aggregate → score → classify → graph pipeline and the
//! what-if path against the invariants the scoring policy promises.

pub mod helpers;
