//! Build plan assembly.
//!
//! A [`BuildPlan`] bundles the build descriptor with the extension definition
//! and package metadata derived from it. It is what `nestkit plan` prints and
//! what the packaging collaborator receives.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::translate::Translator;
use crate::core::descriptor::{BuildDescriptor, SourceMode};
use crate::core::extension::ExtensionSpec;
use crate::core::metadata::{long_description, DocConverter, PackageMetadata, PandocConverter};
use crate::core::platform::Platform;
use crate::core::query::ConfigQuery;
use crate::util::config::Config;
use crate::util::context::GlobalContext;
use crate::util::diagnostic::suggestions;
use crate::util::fs::write_string;

/// File name of the serialized plan inside the output directory.
pub const PLAN_FILE: &str = "nestkit-plan.json";

/// Settings shared by every operation, resolved from context, config and CLI.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Project root containing `nest/`
    pub root: PathBuf,
    /// Build output directory
    pub out_dir: PathBuf,
    /// NEST configuration provider
    pub provider: String,
    /// Python configuration provider
    pub python_config: String,
    pub translator: Translator,
    /// Documentation converter
    pub converter: String,
    /// README, resolved against the root
    pub readme: PathBuf,
    /// Packaging program and its leading arguments
    pub package_program: String,
    pub package_args: Vec<String>,
    pub platform: Platform,
    pub source_mode: SourceMode,
    /// Whether hints on stderr may use color
    pub color: bool,
}

impl SetupOptions {
    pub fn new(ctx: &GlobalContext, config: &Config, source_mode: SourceMode) -> Self {
        let (package_program, package_args) = config.package_command();

        SetupOptions {
            root: ctx.cwd().to_path_buf(),
            out_dir: ctx.out_dir(config),
            provider: config.provider_program().to_string(),
            python_config: config.python_config_program().to_string(),
            translator: Translator::from_config(config),
            converter: config.converter_program().to_string(),
            readme: ctx.cwd().join(config.readme()),
            package_program,
            package_args,
            platform: Platform::host(),
            source_mode,
            color: ctx.color(),
        }
    }

    /// Override the provider from the command line.
    pub fn with_provider(mut self, provider: Option<String>) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Query interface for the NEST provider.
    pub fn nest_query(&self) -> ConfigQuery {
        ConfigQuery::command(self.provider.clone())
            .with_hint(suggestions::PROVIDER_NOT_FOUND)
            .with_hint(suggestions::PROVIDER_OVERRIDE)
            .with_color(self.color)
    }

    /// Query interface for the Python provider.
    pub fn python_query(&self) -> ConfigQuery {
        ConfigQuery::command(self.python_config.clone()).with_color(self.color)
    }

    /// Location of the serialized plan.
    pub fn plan_path(&self) -> PathBuf {
        self.out_dir.join(PLAN_FILE)
    }
}

/// Everything the packaging collaborator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub platform: Platform,
    pub descriptor: BuildDescriptor,
    pub extension: ExtensionSpec,
    pub metadata: PackageMetadata,
}

impl BuildPlan {
    /// Serialize the plan to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize build plan")?;
        write_string(path, &json)
    }

    /// Point the extension at translated C++ instead of the generated source.
    ///
    /// The path is stored relative to `root` when it lies inside it, since the
    /// packager runs from the project root.
    pub fn use_translated_source(&mut self, root: &Path, translated: &Path) {
        let source = translated
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| translated.to_path_buf());
        self.extension.sources = vec![source];
    }

    /// Read a plan written by [`BuildPlan::write`].
    pub fn read(path: &Path) -> Result<Self> {
        let contents = crate::util::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse build plan: {}", path.display()))
    }
}

/// Query the NEST provider and assemble the descriptor.
pub fn assemble_descriptor(query: &ConfigQuery, opts: &SetupOptions) -> Result<BuildDescriptor> {
    BuildDescriptor::assemble(query, opts.platform, opts.source_mode).map_err(Into::into)
}

/// Assemble the full plan using the configured provider and converter.
pub fn plan(opts: &SetupOptions) -> Result<BuildPlan> {
    let converter = PandocConverter::new(opts.converter.clone());
    plan_with(&opts.nest_query(), opts, &converter)
}

/// Assemble the full plan from explicit collaborators.
pub fn plan_with(
    query: &ConfigQuery,
    opts: &SetupOptions,
    converter: &dyn DocConverter,
) -> Result<BuildPlan> {
    let descriptor = assemble_descriptor(query, opts)?;
    let extension = ExtensionSpec::from_descriptor(&descriptor);

    let long_description = long_description(&opts.readme, converter)
        .context("failed to load the package long description")?;
    let metadata = PackageMetadata::pynest(descriptor.version(), long_description);

    Ok(BuildPlan {
        platform: opts.platform,
        descriptor,
        extension,
        metadata,
    })
}
