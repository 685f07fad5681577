//! High-level operations behind each CLI command.

pub mod doctor;
pub mod nest_build;
pub mod package;
pub mod setup;

pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use nest_build::{build, BuildResult};
pub use package::{package, split_forwarded, PLAN_ENV};
pub use setup::{assemble_descriptor, plan, BuildPlan, SetupOptions, PLAN_FILE};
