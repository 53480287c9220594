//! Crate-level test suites.

pub(crate) mod support;
mod unit;
