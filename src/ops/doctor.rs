//! Environment health checks.
//!
//! `nestkit doctor` verifies that the tools an extension build depends on
//! are reachable before anything is compiled.
//!
//! ## Checks Performed
//!
//! - NEST configuration provider (`nest-config --version`)
//! - C++ compiler reported by the provider
//! - Cython translator (optional, only for generated sources)
//! - Documentation converter (optional)
//! - Python configuration provider (optional, needed by `build`)

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::core::platform::Platform;
use crate::core::query::ConfigQuery;
use crate::ops::setup::SetupOptions;
use crate::util::process::{find_executable, ProcessBuilder};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Human-readable status message
    pub message: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub duration: Duration,
    /// Whether a failure should fail the command
    pub required: bool,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
    pub total_duration: Duration,
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run every check.
pub fn doctor(opts: &SetupOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("platform".to_string(), Platform::host().to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report
        .environment
        .insert("root".to_string(), opts.root.display().to_string());

    let query = opts.nest_query();
    report.add(check_provider(&query));
    report.add(check_compiler(&query));
    report.add(
        check_tool("Translator", opts.translator.program(), &["--version"])
            .optional(),
    );
    report.add(check_tool("Doc Converter", &opts.converter, &["--version"]).optional());
    report.add(check_python_config(&opts.python_config));

    report.total_duration = start.elapsed();
    Ok(report)
}

/// The provider must run and report a version.
fn check_provider(query: &ConfigQuery) -> CheckResult {
    let start = Instant::now();
    let name = "NEST Provider";

    match query.query("version") {
        Ok(version) => {
            let mut check = CheckResult::pass(name, format!("`{}` is available", query.program()))
                .with_version(version)
                .with_duration(start.elapsed());
            if let Some(path) = find_executable(query.program()) {
                check = check.with_path(path);
            }
            check
        }
        Err(err) => CheckResult::fail(name, err.to_string()).with_duration(start.elapsed()),
    }
}

/// The compiler NEST was built with must still be installed.
fn check_compiler(query: &ConfigQuery) -> CheckResult {
    let start = Instant::now();
    let name = "C++ Compiler";

    let compiler = match query.query("compiler") {
        Ok(compiler) => compiler,
        Err(err) => {
            return CheckResult::fail(name, format!("compiler unknown: {}", err))
                .with_duration(start.elapsed())
        }
    };

    check_tool(name, &compiler, &["--version", "-v"]).with_duration(start.elapsed())
}

/// Optional Python configuration provider.
fn check_python_config(program: &str) -> CheckResult {
    let start = Instant::now();
    let name = "Python Config";

    match find_executable(program) {
        Some(path) => {
            let suffix = ConfigQuery::command(program)
                .query("extension-suffix")
                .unwrap_or_default();
            let mut check = CheckResult::pass(name, format!("`{}` is available", program))
                .with_path(path);
            if !suffix.is_empty() {
                check = check.with_version(suffix);
            }
            check.with_duration(start.elapsed()).optional()
        }
        None => CheckResult::fail(name, format!("`{}` not found (needed by `build`)", program))
            .with_duration(start.elapsed())
            .optional(),
    }
}

/// Locate a tool and read the first line of its version banner.
fn check_tool(name: &str, program: &str, version_flags: &[&str]) -> CheckResult {
    let start = Instant::now();

    let Some(path) = find_executable(program) else {
        return CheckResult::fail(name, format!("`{}` not found", program))
            .with_duration(start.elapsed());
    };

    let version = version_flags
        .iter()
        .find_map(|flag| first_line(&ProcessBuilder::new(&path).arg(flag)))
        .unwrap_or_else(|| "unknown version".to_string());

    CheckResult::pass(name, format!("Found {}", program))
        .with_path(path)
        .with_version(version)
        .with_duration(start.elapsed())
}

fn first_line(cmd: &ProcessBuilder) -> Option<String> {
    let output = cmd.output().ok()?;
    // Some compilers print their banner to stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut lines = vec!["nestkit doctor".to_string(), "==============".to_string(), String::new()];

    if verbose {
        lines.push("Environment:".to_string());
        for (key, value) in &report.environment {
            lines.push(format!("  {}: {}", key, value));
        }
        lines.push(String::new());
    }

    lines.push("Checks:".to_string());
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        lines.push(format!("  {} {}{}", status, check.name, required));

        if verbose || !check.passed {
            lines.push(format!("      {}", check.message));
        }
        if verbose {
            if let Some(path) = &check.path {
                lines.push(format!("      Path: {}", path.display()));
            }
            if let Some(version) = &check.version {
                lines.push(format!("      Version: {}", version));
            }
        }
    }
    lines.push(String::new());

    let failed = report.failed_count();
    let required_failed = report.required_failed_count();
    lines.push(format!(
        "Summary: {} passed, {} failed",
        report.passed_count(),
        failed
    ));
    lines.push(String::new());

    if required_failed > 0 {
        lines.push(format!(
            "Warning: {} required check(s) failed. The extension cannot be built.",
            required_failed
        ));
    } else if failed > 0 {
        lines.push(format!(
            "All required checks passed. {} optional check(s) failed.",
            failed
        ));
    } else {
        lines.push("All checks passed.".to_string());
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
