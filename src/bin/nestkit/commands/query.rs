//! `nestkit query` command

use anyhow::Result;

use super::Global;
use crate::cli::QueryArgs;
use nestkit::core::SourceMode;

pub fn execute(args: QueryArgs, global: &Global) -> Result<()> {
    let opts = global.setup(SourceMode::Generated)?;
    let value = opts.nest_query().query(&args.kind)?;
    println!("{}", value);
    Ok(())
}
