//! Native C++ compiler driver.
//!
//! Compiles the extension's C++ source and links it into a Python module in
//! a single compiler invocation.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::toolchain::{CxxToolchain, ModuleInput};
use crate::core::descriptor::parse_include_dirs;
use crate::core::extension::ExtensionSpec;
use crate::core::query::ConfigQuery;
use crate::util::diagnostic::{QueryError, ToolError};
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Python interpreter facts needed to build an extension module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonTarget {
    /// Header directories, without `-I`
    pub include_dirs: Vec<String>,
    /// Module file suffix, e.g. `.cpython-311-x86_64-linux-gnu.so`
    pub extension_suffix: String,
}

impl PythonTarget {
    /// Query a `python3-config` style provider.
    pub fn query(query: &ConfigQuery) -> Result<Self, QueryError> {
        let mut include_dirs = parse_include_dirs(&query.query("includes")?);
        // python3-config lists the platform include dir twice on most distros.
        let mut seen = std::collections::HashSet::new();
        include_dirs.retain(|dir| seen.insert(dir.clone()));

        let extension_suffix = query.query("extension-suffix")?;

        Ok(PythonTarget {
            include_dirs,
            extension_suffix,
        })
    }
}

/// Native C++ builder.
pub struct NativeBuilder<'a> {
    toolchain: &'a CxxToolchain,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(toolchain: &'a CxxToolchain) -> Self {
        NativeBuilder { toolchain }
    }

    /// Path of the built module inside `out_dir`.
    pub fn module_output(ext: &ExtensionSpec, python: &PythonTarget, out_dir: &Path) -> PathBuf {
        out_dir
            .join("lib")
            .join(ext.module_file(&python.extension_suffix))
    }

    /// Compile `source` and link the extension module.
    pub fn build_module(
        &self,
        ext: &ExtensionSpec,
        source: &Path,
        python: &PythonTarget,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        if !source.exists() {
            bail!("native source not found: {}", source.display());
        }

        let output = Self::module_output(ext, python, out_dir);
        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
        }

        let input = ModuleInput {
            source: source.to_path_buf(),
            output: output.clone(),
            python_include_dirs: python.include_dirs.clone(),
        };

        let spec = self.toolchain.module_command(ext, &input);
        let cmd = ProcessBuilder::from_spec(&spec);

        tracing::debug!("Compiling {}", source.display());

        let result = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => anyhow::Error::new(ToolError::missing(
                self.toolchain.compiler_path().display().to_string(),
                "NEST reports this compiler via `nest-config --compiler`; install it or rebuild NEST",
            )),
            _ => anyhow::Error::new(e).context(format!("failed to run `{}`", cmd.display_command())),
        })?;

        if !result.status.success() {
            return Err(ToolError::Failed {
                command: cmd.display_command(),
                exit_code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            }
            .into());
        }

        Ok(output)
    }
}
