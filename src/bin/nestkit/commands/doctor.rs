//! `nestkit doctor` command

use anyhow::Result;

use super::Global;
use crate::cli::DoctorArgs;
use nestkit::core::SourceMode;
use nestkit::ops::{doctor, format_report};

pub fn execute(_args: DoctorArgs, global: &Global) -> Result<i32> {
    let opts = global.setup(SourceMode::Generated)?;
    let report = doctor(&opts)?;

    print!("{}", format_report(&report, global.verbose));

    // Required checks decide the exit status.
    Ok(if report.all_required_passed() { 0 } else { 1 })
}
