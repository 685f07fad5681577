//! Test utilities and mocks for nestkit unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use nestkit::test_support::{MockProvider, nest_provider};
//!
//! #[test]
//! fn test_example() {
//!     let provider = MockProvider::new().with("version", QueryResult::success("3.6.0\n"));
//!     let query = ConfigQuery::new(Box::new(provider));
//!     assert_eq!(query.query("version").unwrap(), "3.6.0");
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::descriptor::{BuildDescriptor, SourceMode};
use crate::core::extension::ExtensionSpec;
use crate::core::metadata::DocConverter;
use crate::core::platform::Platform;
use crate::core::query::{ConfigProvider, ConfigQuery, QueryResult};
use crate::util::diagnostic::QueryError;

/// Provider answering from a fixed table.
///
/// Unknown kinds fail the way a real provider does for an unrecognized
/// option. Every requested kind is recorded, in order.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    responses: HashMap<String, QueryResult>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `kind` with `result`.
    pub fn with(mut self, kind: impl Into<String>, result: QueryResult) -> Self {
        self.responses.insert(kind.into(), result);
        self
    }

    /// Shared handle on the recorded kinds.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl ConfigProvider for MockProvider {
    fn program(&self) -> &str {
        "nest-config"
    }

    fn run(&self, kind: &str) -> Result<QueryResult, QueryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(kind.to_string());
        }
        Ok(self
            .responses
            .get(kind)
            .cloned()
            .unwrap_or_else(|| QueryResult::failure(1, "", "unknown option")))
    }
}

/// A provider describing a typical NEST 3.6 installation.
pub fn nest_provider() -> MockProvider {
    MockProvider::new()
        .with("compiler", QueryResult::success("/usr/bin/g++\n"))
        .with("version", QueryResult::success("3.6.0\n"))
        .with(
            "includes",
            QueryResult::success("-I/opt/nest/include/nest -I/usr/include\n"),
        )
        .with("libdir", QueryResult::success("/opt/nest/lib/nest\n"))
        .with(
            "libs",
            QueryResult::success("-L/opt/nest/lib/nest -lnest -lsli -lgsl -pthread\n"),
        )
}

/// Extension definition assembled from [`nest_provider`] on Linux.
pub fn extension_fixture(mode: SourceMode) -> ExtensionSpec {
    let query = ConfigQuery::new(Box::new(nest_provider()));
    match BuildDescriptor::assemble(&query, Platform::Linux, mode) {
        Ok(desc) => ExtensionSpec::from_descriptor(&desc),
        Err(err) => panic!("fixture provider failed: {}", err),
    }
}

/// Converter that never succeeds, so the raw README is used.
pub struct RawConverter;

impl DocConverter for RawConverter {
    fn try_convert(&self, _markdown: &Path) -> Option<String> {
        None
    }
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
