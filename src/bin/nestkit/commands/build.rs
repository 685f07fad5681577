//! `nestkit build` command

use anyhow::Result;

use super::Global;
use crate::cli::BuildArgs;
use nestkit::core::SourceMode;
use nestkit::ops::build;
use nestkit::util::Shell;

pub fn execute(args: BuildArgs, global: &Global, shell: &Shell) -> Result<()> {
    let opts = global.setup(SourceMode::from_flag(args.no_cythonize))?;
    let result = build(&opts, shell)?;
    println!("{}", result.module.display());
    Ok(())
}
