//! `nestkit plan` command

use anyhow::Result;

use super::Global;
use crate::cli::PlanArgs;
use nestkit::core::{ExtensionSpec, SourceMode};
use nestkit::ops::{assemble_descriptor, plan};

pub fn execute(args: PlanArgs, global: &Global) -> Result<()> {
    let opts = global.setup(SourceMode::from_flag(args.no_cythonize))?;

    if args.json {
        let plan = plan(&opts)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let descriptor = assemble_descriptor(&opts.nest_query(), &opts)?;
    let extension = ExtensionSpec::from_descriptor(&descriptor);

    println!("# Build plan for `{}`", extension.name);
    println!("compiler:     {}", descriptor.compiler());
    println!("version:      {}", descriptor.version());
    println!("source mode:  {}", descriptor.source_mode());
    for source in &extension.sources {
        println!("source:       {}", source.display());
    }
    println!("include dirs: {}", descriptor.include_dirs().join(" "));
    println!("library dirs: {}", descriptor.library_dirs().join(" "));
    println!("libraries:    {}", descriptor.library_names().join(" "));
    println!("link args:    {}", descriptor.extra_link_args().join(" "));
    println!();
    println!("# Compile flags");
    println!("  {}", descriptor.compile_flags().join(" "));
    println!("# Link flags");
    println!("  {}", descriptor.link_flags().join(" "));

    Ok(())
}
