//! The `nest.pynestkernel` extension module definition.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::descriptor::{BuildDescriptor, SourceMode};

/// Dotted module name of the extension.
pub const EXTENSION_NAME: &str = "nest.pynestkernel";

/// Generated Cython source, relative to the project root.
pub const GENERATED_SOURCE: &str = "nest/pynestkernel.pyx";

/// Pre-translated C++ source shipped for hosts without Cython.
pub const PREGENERATED_SOURCE: &str = "nest/pynestkernel.cpp";

/// Source language of the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "c++")]
    Cxx,
}

/// A preprocessor macro definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Define {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Render as a single compiler argument.
    pub fn to_flag(&self) -> String {
        match &self.value {
            Some(value) => format!("-D{}={}", self.name, value),
            None => format!("-D{}", self.name),
        }
    }
}

/// Everything needed to compile and link the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    pub name: String,
    pub language: Language,
    /// Source files relative to the project root
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<String>,
    pub library_dirs: Vec<String>,
    pub runtime_library_dirs: Vec<String>,
    pub libraries: Vec<String>,
    pub extra_link_args: Vec<String>,
    pub define_macros: Vec<Define>,
    pub source_mode: SourceMode,
}

impl ExtensionSpec {
    /// Build the extension definition from an assembled descriptor.
    pub fn from_descriptor(desc: &BuildDescriptor) -> Self {
        let source = match desc.source_mode() {
            SourceMode::Generated => GENERATED_SOURCE,
            SourceMode::Pregenerated => PREGENERATED_SOURCE,
        };

        ExtensionSpec {
            name: EXTENSION_NAME.to_string(),
            language: Language::Cxx,
            sources: vec![PathBuf::from(source)],
            include_dirs: desc.include_dirs().to_vec(),
            library_dirs: desc.library_dirs().to_vec(),
            runtime_library_dirs: desc.library_dirs().to_vec(),
            libraries: desc.library_names().to_vec(),
            extra_link_args: desc.extra_link_args().to_vec(),
            define_macros: vec![
                Define::new("CYTHON_DEREF( x )", "( *x )"),
                Define::new("CYTHON_ADDR( x )", "( &x )"),
            ],
            source_mode: desc.source_mode(),
        }
    }

    /// The C++ file handed to the compiler.
    ///
    /// Generated sources are translated into `out_dir`; pre-translated
    /// sources are compiled in place.
    pub fn native_source(&self, root: &Path, out_dir: &Path) -> PathBuf {
        match self.source_mode {
            SourceMode::Generated => out_dir.join("src").join(self.module_path("cpp")),
            SourceMode::Pregenerated => root.join(PREGENERATED_SOURCE),
        }
    }

    /// Relative path of the module with the given extension, e.g. `nest/pynestkernel.cpp`.
    pub fn module_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.name.split('.').collect();
        path.set_extension(extension);
        path
    }

    /// Relative path of the built module, given the platform suffix
    /// (e.g. `.cpython-311-x86_64-linux-gnu.so`).
    pub fn module_file(&self, suffix: &str) -> PathBuf {
        let mut parts: Vec<&str> = self.name.split('.').collect();
        let last = parts.pop().unwrap_or(EXTENSION_NAME);
        let mut path: PathBuf = parts.into_iter().collect();
        path.push(format!("{}{}", last, suffix));
        path
    }
}
