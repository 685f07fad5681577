//! `nestkit package` command
//!
//! Everything after `package` goes to the packaging tool, except the
//! pre-translated source flag.

use anyhow::Result;

use super::Global;
use crate::cli::PackageArgs;
use nestkit::ops::{package, split_forwarded};
use nestkit::util::Shell;

pub fn execute(args: PackageArgs, global: &Global, shell: &Shell) -> Result<i32> {
    let (mode, forwarded) = split_forwarded(args.args);
    let opts = global.setup(mode)?;
    package(&opts, &forwarded, shell)
}
