//! Builders to construct dispatch components from configuration.

pub mod dispatch_builder;

pub use dispatch_builder::build_dispatcher;
