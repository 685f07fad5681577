//! `nestkit build`: translate and compile the extension in place.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use crate::builder::native::{NativeBuilder, PythonTarget};
use crate::builder::toolchain::CxxToolchain;
use crate::builder::translate::Translation;
use crate::core::extension::ExtensionSpec;
use crate::ops::setup::{assemble_descriptor, SetupOptions};
use crate::util::shell::{format_duration, Shell, Status};

/// Result of a native build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Built extension module
    pub module: PathBuf,
    /// Translation step, if the source mode required one
    pub translation: Option<Translation>,
}

/// Translate (when needed) and compile the extension module.
pub fn build(opts: &SetupOptions, shell: &Shell) -> Result<BuildResult> {
    let start = Instant::now();

    shell.status(Status::Querying, format!("`{}`", opts.provider));
    let descriptor = assemble_descriptor(&opts.nest_query(), opts)?;
    let extension = ExtensionSpec::from_descriptor(&descriptor);
    let env = descriptor.compiler_env();

    let translation = if descriptor.source_mode().needs_translation() {
        let translation =
            opts.translator
                .translate(&extension, &opts.root, &opts.out_dir, &env)?;
        match &translation {
            Translation::Translated(path) => {
                shell.status(Status::Translating, path.display());
            }
            Translation::Fresh(path) => {
                shell.status(Status::Fresh, path.display());
            }
        }
        Some(translation)
    } else {
        tracing::info!("using pre-translated sources");
        None
    };

    let source = extension.native_source(&opts.root, &opts.out_dir);

    shell.status(Status::Querying, format!("`{}`", opts.python_config));
    let python = PythonTarget::query(&opts.python_query())?;

    let toolchain = CxxToolchain::new(env, opts.platform);
    let spinner = shell.spinner(
        Status::Compiling,
        format!("{} v{} with {}", extension.name, descriptor.version(), descriptor.compiler()),
    );
    let module = NativeBuilder::new(&toolchain).build_module(
        &extension,
        &source,
        &python,
        &opts.out_dir,
    )?;
    spinner.finish();

    shell.status(
        Status::Finished,
        format!("`{}` in {}", extension.name, format_duration(start.elapsed())),
    );

    Ok(BuildResult {
        module,
        translation,
    })
}
