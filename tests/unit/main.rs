//! Unit tests for individual components

#[path = "../support/mod.rs"]
mod support;

mod audit_test;
mod builders_test;
mod config_test;
mod error_test;
mod runtime_test;
mod util_test;
