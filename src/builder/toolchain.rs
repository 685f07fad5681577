//! Compiler invocation for the extension module.
//!
//! The compiler is always the one NEST was built with, taken from the build
//! descriptor. It reaches child processes through [`CompilerEnv`] instead of
//! the tool's own environment.

use std::path::{Path, PathBuf};

use crate::core::extension::ExtensionSpec;
use crate::core::platform::Platform;

/// Compiler identity exported to child processes as `CC` and `CXX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerEnv {
    pub cc: String,
    pub cxx: String,
}

impl CompilerEnv {
    /// Use one compiler for both C and C++.
    pub fn same(compiler: impl Into<String>) -> Self {
        let compiler = compiler.into();
        CompilerEnv {
            cc: compiler.clone(),
            cxx: compiler,
        }
    }

    /// Environment variables to set on child processes.
    pub fn vars(&self) -> [(&'static str, &str); 2] {
        [("CC", self.cc.as_str()), ("CXX", self.cxx.as_str())]
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++", "cython")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Export the compiler identity.
    pub fn compiler_env(self, env: &CompilerEnv) -> Self {
        env.vars()
            .into_iter()
            .fold(self, |spec, (key, value)| spec.env(key, value))
    }
}

/// Input for building the extension's shared object.
#[derive(Debug, Clone)]
pub struct ModuleInput {
    /// Native C++ source
    pub source: PathBuf,
    /// Output shared object
    pub output: PathBuf,
    /// Python header directories
    pub python_include_dirs: Vec<String>,
}

/// GCC-style C++ toolchain driven by the NEST compiler.
#[derive(Debug, Clone)]
pub struct CxxToolchain {
    env: CompilerEnv,
    platform: Platform,
}

impl CxxToolchain {
    pub fn new(env: CompilerEnv, platform: Platform) -> Self {
        CxxToolchain { env, platform }
    }

    pub fn compiler_path(&self) -> &Path {
        Path::new(&self.env.cxx)
    }

    /// Compile and link the extension in one step.
    pub fn module_command(&self, ext: &ExtensionSpec, input: &ModuleInput) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.env.cxx)
            .compiler_env(&self.env)
            .arg("-shared");

        if !self.platform.is_windows() {
            spec = spec.arg("-fPIC");
        }

        spec = spec
            .args(ext.define_macros.iter().map(|d| d.to_flag()))
            .args(ext.include_dirs.iter().map(|dir| format!("-I{}", dir)))
            .args(input.python_include_dirs.iter().map(|dir| format!("-I{}", dir)))
            .arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(ext.library_dirs.iter().map(|dir| format!("-L{}", dir)));

        // macOS carries its rpaths in extra_link_args already.
        if !self.platform.is_macos() && !self.platform.is_windows() {
            spec = spec.args(
                ext.runtime_library_dirs
                    .iter()
                    .map(|dir| format!("-Wl,-rpath,{}", dir)),
            );
        }

        spec = spec
            .args(ext.libraries.iter().map(|lib| format!("-l{}", lib)))
            .args(ext.extra_link_args.iter().cloned());

        if self.platform.is_macos() {
            spec = spec.args(["-undefined", "dynamic_lookup"]);
        }

        spec
    }
}
