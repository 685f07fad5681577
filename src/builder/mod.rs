//! Extension build steps: translation and native compilation.

pub mod fingerprint;
pub mod native;
pub mod toolchain;
pub mod translate;

pub use native::{NativeBuilder, PythonTarget};
pub use toolchain::{CommandSpec, CompilerEnv, CxxToolchain};
pub use translate::{Translation, Translator};
