//! Distribution metadata for the PyNEST package.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;
use crate::util::process::{find_executable, ProcessBuilder};

/// Converts a markdown file into a richer display format.
pub trait DocConverter {
    /// Returns `None` when the converter is unavailable or fails.
    fn try_convert(&self, markdown: &Path) -> Option<String>;
}

/// Markdown to reStructuredText through `pandoc`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>) -> Self {
        PandocConverter {
            program: program.into(),
        }
    }
}

impl DocConverter for PandocConverter {
    fn try_convert(&self, markdown: &Path) -> Option<String> {
        let Some(program) = find_executable(&self.program) else {
            tracing::debug!("`{}` not found, using raw markdown", self.program);
            return None;
        };

        let output = ProcessBuilder::new(&program)
            .args(["--from", "markdown", "--to", "rst"])
            .arg(markdown)
            .output()
            .ok()?;

        if !output.status.success() {
            tracing::debug!(
                "`{}` failed to convert {}: {}",
                program.display(),
                markdown.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        String::from_utf8(output.stdout).ok()
    }
}

/// Converted README if possible, the raw markdown otherwise.
pub fn long_description(readme: &Path, converter: &dyn DocConverter) -> Result<String> {
    match converter.try_convert(readme) {
        Some(converted) => Ok(converted),
        None => read_to_string(readme),
    }
}

/// Parse a version leniently, accepting `3.6`, `3.6.0` or `3.6.0-post0.dev0`.
pub fn parse_version_flexible(version: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(version.trim()) {
        return Some(v);
    }

    let clean = version
        .trim()
        .trim_start_matches('v')
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()?;

    let mut parts = clean.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(semver::Version::new(major, minor, patch))
}

/// Package metadata passed to the packaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub long_description: String,
    pub author: String,
    pub url: String,
    pub license: String,
    pub keywords: Vec<String>,
    pub install_requires: Vec<String>,
    pub classifiers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PackageMetadata {
    /// Metadata for PyNEST at the given NEST version.
    ///
    /// The version is used as reported; a string that does not look like a
    /// version only produces a warning.
    pub fn pynest(version: &str, long_description: String) -> Self {
        if parse_version_flexible(version).is_none() {
            tracing::warn!("NEST reported an unusual version string `{}`", version);
        }

        PackageMetadata {
            name: "PyNEST".to_string(),
            version: version.to_string(),
            description: "PyNEST provides Python bindings for NEST".to_string(),
            long_description,
            author: "The NEST Initiative".to_string(),
            url: "http://www.nest-simulator.org".to_string(),
            license: "GPLv2+".to_string(),
            keywords: strings(&[
                "nest-simulator",
                "nest",
                "brain",
                "simulator",
                "neurons",
                "synapses",
            ]),
            install_requires: strings(&["matplotlib", "numpy", "scipy"]),
            classifiers: strings(&[
                "License :: OSI Approved :: MIT License",
                "Programming Language :: Python",
                "Programming Language :: Python :: 2.7",
                "Programming Language :: Python :: 3",
                "Programming Language :: Python :: 3.5",
                "Programming Language :: Python :: 3.6",
                "Programming Language :: Python :: Implementation :: CPython",
            ]),
        }
    }
}
