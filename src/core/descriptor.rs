//! Build descriptor assembly.
//!
//! A [`BuildDescriptor`] captures the compiler, include paths, library paths
//! and libraries that NEST itself was built with, as reported by its
//! configuration provider. It is assembled once per invocation and is not
//! modified afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::toolchain::CompilerEnv;
use crate::core::platform::Platform;
use crate::core::query::ConfigQuery;
use crate::util::diagnostic::QueryError;

/// Command-line flag selecting the pre-translated native source.
pub const PREGENERATED_FLAG: &str = "--no-cythonize";

/// Where the extension's native source comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Translate the generated `.pyx` source first.
    Generated,
    /// Compile the shipped, pre-translated `.cpp` source.
    Pregenerated,
}

impl SourceMode {
    /// Select the mode from raw arguments, removing the flag if present.
    ///
    /// All other arguments are left untouched and in order.
    pub fn from_args(args: &mut Vec<String>) -> Self {
        let before = args.len();
        args.retain(|arg| arg != PREGENERATED_FLAG);

        if args.len() != before {
            SourceMode::Pregenerated
        } else {
            SourceMode::Generated
        }
    }

    /// Select the mode from a parsed boolean flag.
    pub fn from_flag(pregenerated: bool) -> Self {
        if pregenerated {
            SourceMode::Pregenerated
        } else {
            SourceMode::Generated
        }
    }

    /// Whether the translator has to run before compiling.
    pub fn needs_translation(self) -> bool {
        self == SourceMode::Generated
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Generated => write!(f, "generated"),
            SourceMode::Pregenerated => write!(f, "pregenerated"),
        }
    }
}

/// Compiler and linker options for building against an installed NEST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    compiler: String,
    version: String,
    include_dirs: Vec<String>,
    library_dirs: Vec<String>,
    library_names: Vec<String>,
    extra_link_args: Vec<String>,
    source_mode: SourceMode,
}

impl BuildDescriptor {
    /// Query the provider and assemble a descriptor.
    ///
    /// Facets are queried in a fixed order: `compiler`, `version`,
    /// `includes`, `libdir`, `libs`. The first failing query aborts.
    pub fn assemble(
        query: &ConfigQuery,
        platform: Platform,
        source_mode: SourceMode,
    ) -> Result<Self, QueryError> {
        let compiler = query.query("compiler")?;
        let version = query.query("version")?;
        let include_dirs = parse_include_dirs(&query.query("includes")?);
        let library_dirs = parse_library_dirs(&query.query("libdir")?);
        let library_names = parse_library_names(&query.query("libs")?);
        let extra_link_args = rpath_args(platform, &library_dirs);

        tracing::debug!(
            "assembled descriptor: compiler={}, version={}, {} include dir(s), {} library dir(s), {} librar(ies)",
            compiler,
            version,
            include_dirs.len(),
            library_dirs.len(),
            library_names.len()
        );

        Ok(BuildDescriptor {
            compiler,
            version,
            include_dirs,
            library_dirs,
            library_names,
            extra_link_args,
            source_mode,
        })
    }

    /// Compiler NEST was built with.
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// NEST version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn include_dirs(&self) -> &[String] {
        &self.include_dirs
    }

    pub fn library_dirs(&self) -> &[String] {
        &self.library_dirs
    }

    pub fn library_names(&self) -> &[String] {
        &self.library_names
    }

    pub fn extra_link_args(&self) -> &[String] {
        &self.extra_link_args
    }

    pub fn source_mode(&self) -> SourceMode {
        self.source_mode
    }

    /// Compiler identity handed to child processes.
    pub fn compiler_env(&self) -> CompilerEnv {
        CompilerEnv::same(&self.compiler)
    }

    /// Compile flags derived from the descriptor.
    pub fn compile_flags(&self) -> Vec<String> {
        self.include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir))
            .collect()
    }

    /// Link flags derived from the descriptor.
    pub fn link_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = self
            .library_dirs
            .iter()
            .map(|dir| format!("-L{}", dir))
            .collect();
        flags.extend(self.library_names.iter().map(|lib| format!("-l{}", lib)));
        flags.extend(self.extra_link_args.iter().cloned());
        flags
    }
}

/// Strip the `-I` prefix from each whitespace-separated token.
pub fn parse_include_dirs(includes: &str) -> Vec<String> {
    includes
        .split_whitespace()
        .map(|token| token.strip_prefix("-I").unwrap_or(token))
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect()
}

/// Library directories are reported without prefixes.
pub fn parse_library_dirs(libdir: &str) -> Vec<String> {
    libdir.split_whitespace().map(str::to_string).collect()
}

/// Keep only `-l<name>` tokens and strip the prefix.
pub fn parse_library_names(libs: &str) -> Vec<String> {
    libs.split_whitespace()
        .filter_map(|token| token.strip_prefix("-l"))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Runtime search path arguments; only macOS needs them spelled out.
pub fn rpath_args(platform: Platform, library_dirs: &[String]) -> Vec<String> {
    if !platform.is_macos() {
        return Vec::new();
    }

    library_dirs
        .iter()
        .map(|dir| format!("-Wl,-rpath,{}", dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::QueryResult;
    use crate::test_support::{nest_provider, MockProvider};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_include_dirs() {
        assert_eq!(parse_include_dirs("-I/usr/a -I/usr/b"), args(&["/usr/a", "/usr/b"]));
        assert_eq!(parse_include_dirs(""), Vec::<String>::new());
        assert_eq!(
            parse_include_dirs("-I/opt/nest/include/nest\n  /usr/include"),
            args(&["/opt/nest/include/nest", "/usr/include"])
        );
    }

    #[test]
    fn test_parse_include_dirs_keeps_inner_dash_i() {
        assert_eq!(parse_include_dirs("-I/src/x-Ifoo"), args(&["/src/x-Ifoo"]));
    }

    #[test]
    fn test_parse_library_names() {
        assert_eq!(parse_library_names("-lfoo -lbar extra"), args(&["foo", "bar"]));
        assert_eq!(
            parse_library_names("-L/opt/lib -lnest -Wl,--as-needed -lgsl -l"),
            args(&["nest", "gsl"])
        );
    }

    #[test]
    fn test_parse_library_dirs() {
        assert_eq!(
            parse_library_dirs(" /opt/nest/lib   /opt/nest/lib/nest "),
            args(&["/opt/nest/lib", "/opt/nest/lib/nest"])
        );
    }

    #[test]
    fn test_rpath_on_macos() {
        let dirs = args(&["/opt/lib"]);
        assert_eq!(rpath_args(Platform::MacOs, &dirs), args(&["-Wl,-rpath,/opt/lib"]));
    }

    #[test]
    fn test_no_rpath_elsewhere() {
        let dirs = args(&["/opt/lib", "/usr/lib"]);
        assert!(rpath_args(Platform::Linux, &dirs).is_empty());
        assert!(rpath_args(Platform::Windows, &dirs).is_empty());
        assert!(rpath_args(Platform::Other, &dirs).is_empty());
    }

    #[test]
    fn test_source_mode_flag_is_removed() {
        let mut forwarded = args(&["bdist_wheel", "--no-cythonize", "--user"]);
        assert_eq!(SourceMode::from_args(&mut forwarded), SourceMode::Pregenerated);
        assert_eq!(forwarded, args(&["bdist_wheel", "--user"]));
    }

    #[test]
    fn test_source_mode_default_leaves_args() {
        let mut forwarded = args(&["install", "--prefix=/opt"]);
        assert_eq!(SourceMode::from_args(&mut forwarded), SourceMode::Generated);
        assert_eq!(forwarded, args(&["install", "--prefix=/opt"]));
    }

    #[test]
    fn test_source_mode_repeated_flag() {
        let mut forwarded = args(&["--no-cythonize", "build", "--no-cythonize"]);
        assert_eq!(SourceMode::from_args(&mut forwarded), SourceMode::Pregenerated);
        assert_eq!(forwarded, args(&["build"]));
    }

    #[test]
    fn test_assemble_on_linux() {
        let query = ConfigQuery::new(Box::new(nest_provider()));
        let desc = BuildDescriptor::assemble(&query, Platform::Linux, SourceMode::Generated).unwrap();

        assert_eq!(desc.compiler(), "/usr/bin/g++");
        assert_eq!(desc.version(), "3.6.0");
        assert_eq!(desc.include_dirs(), args(&["/opt/nest/include/nest", "/usr/include"]));
        assert_eq!(desc.library_dirs(), args(&["/opt/nest/lib/nest"]));
        assert_eq!(desc.library_names(), args(&["nest", "sli", "gsl"]));
        assert!(desc.extra_link_args().is_empty());
        assert!(desc.source_mode().needs_translation());
    }

    #[test]
    fn test_assemble_on_macos_adds_rpath() {
        let query = ConfigQuery::new(Box::new(nest_provider()));
        let desc =
            BuildDescriptor::assemble(&query, Platform::MacOs, SourceMode::Pregenerated).unwrap();

        assert_eq!(desc.extra_link_args(), args(&["-Wl,-rpath,/opt/nest/lib/nest"]));
        assert_eq!(desc.source_mode(), SourceMode::Pregenerated);
    }

    #[test]
    fn test_assemble_queries_in_order() {
        let provider = nest_provider();
        let calls = provider.calls();
        let query = ConfigQuery::new(Box::new(provider));

        BuildDescriptor::assemble(&query, Platform::Linux, SourceMode::Generated).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            args(&["compiler", "version", "includes", "libdir", "libs"])
        );
    }

    #[test]
    fn test_assemble_aborts_on_first_failure() {
        let provider = MockProvider::new()
            .with("compiler", QueryResult::success("g++"))
            .with("version", QueryResult::success("3.6.0"))
            .with("includes", QueryResult::failure(1, "", "no includes"));
        let calls = provider.calls();
        let query = ConfigQuery::new(Box::new(provider));

        let err = BuildDescriptor::assemble(&query, Platform::Linux, SourceMode::Generated)
            .unwrap_err();
        assert!(matches!(err, QueryError::Failed { ref kind, .. } if kind == "includes"));
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_flags() {
        let query = ConfigQuery::new(Box::new(nest_provider()));
        let desc = BuildDescriptor::assemble(&query, Platform::MacOs, SourceMode::Generated).unwrap();

        assert_eq!(
            desc.compile_flags(),
            args(&["-I/opt/nest/include/nest", "-I/usr/include"])
        );
        assert_eq!(
            desc.link_flags(),
            args(&[
                "-L/opt/nest/lib/nest",
                "-lnest",
                "-lsli",
                "-lgsl",
                "-Wl,-rpath,/opt/nest/lib/nest"
            ])
        );
    }

    #[test]
    fn test_compiler_env_uses_nest_compiler() {
        let query = ConfigQuery::new(Box::new(nest_provider()));
        let desc = BuildDescriptor::assemble(&query, Platform::Linux, SourceMode::Generated).unwrap();
        let env = desc.compiler_env();

        assert_eq!(env.cc, "/usr/bin/g++");
        assert_eq!(env.cxx, "/usr/bin/g++");
    }
}
