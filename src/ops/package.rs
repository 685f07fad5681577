//! `nestkit package`: hand the assembled plan to the Python packaging tool.
//!
//! The packager runs with the NEST compiler exported as `CC`/`CXX` and the
//! path of the serialized plan in [`PLAN_ENV`]. Arguments after
//! `nestkit package` are forwarded verbatim, minus the pre-translated source
//! flag which is consumed here.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::translate::Translation;
use crate::core::descriptor::SourceMode;
use crate::ops::setup::{plan, BuildPlan, SetupOptions};
use crate::util::diagnostic::ToolError;
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Environment variable carrying the plan path to the packager.
pub const PLAN_ENV: &str = "NESTKIT_BUILD_PLAN";

/// Split raw trailing arguments into the source mode and forwarded arguments.
pub fn split_forwarded(raw: Vec<String>) -> (SourceMode, Vec<String>) {
    let mut args = raw;
    let mode = SourceMode::from_args(&mut args);
    (mode, args)
}

/// Packager invocation for an assembled plan.
pub fn packager_command(
    opts: &SetupOptions,
    plan: &BuildPlan,
    plan_path: &std::path::Path,
    forwarded: &[String],
) -> ProcessBuilder {
    let env = plan.descriptor.compiler_env();
    let mut cmd = ProcessBuilder::new(&opts.package_program)
        .args(&opts.package_args)
        .args(forwarded)
        .env(PLAN_ENV, plan_path.display().to_string())
        .cwd(&opts.root);
    for (key, value) in env.vars() {
        cmd = cmd.env(key, value);
    }
    cmd
}

/// Assemble the plan, translate if needed, and run the packager.
///
/// Returns the packager's exit code.
pub fn package(opts: &SetupOptions, forwarded: &[String], shell: &Shell) -> Result<i32> {
    let program = find_executable(&opts.package_program).ok_or_else(|| {
        ToolError::missing(
            opts.package_program.clone(),
            "set `[package] program` in .nestkit/config.toml",
        )
    })?;

    shell.status(Status::Querying, format!("`{}`", opts.provider));
    let mut plan = plan(opts)?;

    if plan.descriptor.source_mode().needs_translation() {
        let env = plan.descriptor.compiler_env();
        let translation =
            opts.translator
                .translate(&plan.extension, &opts.root, &opts.out_dir, &env)?;
        match &translation {
            Translation::Translated(path) => shell.status(Status::Translating, path.display()),
            Translation::Fresh(path) => shell.status(Status::Fresh, path.display()),
        }
        // The packager compiles what was just translated.
        plan.use_translated_source(&opts.root, translation.output());
    }

    let plan_path: PathBuf = opts.plan_path();
    plan.write(&plan_path)?;
    shell.status(Status::Wrote, plan_path.display());

    let cmd = packager_command(opts, &plan, &plan_path, forwarded);
    tracing::debug!("running `{}` ({})", cmd.display_command(), program.display());
    shell.status(
        Status::Packaging,
        format!("{} {}", plan.metadata.name, plan.metadata.version),
    );

    let status = cmd
        .status()
        .with_context(|| format!("failed to run `{}`", cmd.display_command()))?;

    match status.code() {
        Some(code) => Ok(code),
        None => {
            shell.warn(format!("`{}` was terminated by a signal", opts.package_program));
            Ok(1)
        }
    }
}
