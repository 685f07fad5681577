//! nestkit - build and package the PyNEST extension against an installed NEST
//!
//! This crate queries NEST's configuration provider for the compiler and
//! flags NEST was built with, assembles a build descriptor from them, and
//! drives translation, native compilation and Python packaging.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for nestkit unit tests.
///
/// Only available when compiling tests. Provides a scripted configuration
/// provider, fixtures, and helpers for writing fake executables.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildDescriptor, ConfigQuery, ExtensionSpec, PackageMetadata, SourceMode};
pub use ops::BuildPlan;
pub use util::context::GlobalContext;
