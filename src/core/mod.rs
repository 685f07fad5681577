//! Core data structures: provider queries, the build descriptor and the
//! extension and package definitions derived from it.

pub mod descriptor;
pub mod extension;
pub mod metadata;
pub mod platform;
pub mod query;

pub use descriptor::{BuildDescriptor, SourceMode, PREGENERATED_FLAG};
pub use extension::ExtensionSpec;
pub use metadata::{DocConverter, PackageMetadata, PandocConverter};
pub use platform::Platform;
pub use query::{CommandProvider, ConfigProvider, ConfigQuery, QueryResult};
