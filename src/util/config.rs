//! Configuration file support for nestkit.
//!
//! Two configuration file locations are read:
//! - Global: `~/.nestkit/config.toml` - User-wide defaults
//! - Project: `.nestkit/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default configuration provider executable.
pub const DEFAULT_PROVIDER: &str = "nest-config";

/// Default Python configuration provider.
pub const DEFAULT_PYTHON_CONFIG: &str = "python3-config";

/// Default source translator.
pub const DEFAULT_TRANSLATOR: &str = "cython";

/// Default documentation converter.
pub const DEFAULT_CONVERTER: &str = "pandoc";

/// nestkit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NEST configuration provider settings
    pub provider: ProviderConfig,

    /// Python configuration provider settings
    pub python: PythonConfig,

    /// Source translator settings
    pub translator: TranslatorConfig,

    /// Documentation conversion settings
    pub docs: DocsConfig,

    /// Packaging collaborator settings
    pub package: PackageConfig,

    /// Native build settings
    pub build: BuildConfig,
}

/// Configuration provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider executable (name on PATH or absolute path)
    pub program: Option<String>,
}

/// Python configuration provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// `python3-config` style executable
    pub config: Option<String>,
}

/// Translator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Translator executable
    pub program: Option<String>,

    /// Extra arguments passed before the source file
    pub args: Vec<String>,
}

/// Documentation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Markdown to reStructuredText converter
    pub converter: Option<String>,

    /// README path relative to the project root
    pub readme: Option<PathBuf>,
}

/// Packaging collaborator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Packaging program
    pub program: Option<String>,

    /// Arguments placed before the forwarded CLI arguments
    pub args: Option<Vec<String>>,
}

/// Native build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory relative to the project root
    pub out_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.provider.program.is_some() {
            self.provider.program = other.provider.program;
        }
        if other.python.config.is_some() {
            self.python.config = other.python.config;
        }
        if other.translator.program.is_some() {
            self.translator.program = other.translator.program;
        }
        if !other.translator.args.is_empty() {
            self.translator.args = other.translator.args;
        }
        if other.docs.converter.is_some() {
            self.docs.converter = other.docs.converter;
        }
        if other.docs.readme.is_some() {
            self.docs.readme = other.docs.readme;
        }
        if other.package.program.is_some() {
            self.package.program = other.package.program;
        }
        if other.package.args.is_some() {
            self.package.args = other.package.args;
        }
        if other.build.out_dir.is_some() {
            self.build.out_dir = other.build.out_dir;
        }
    }

    /// Configuration provider program.
    pub fn provider_program(&self) -> &str {
        self.provider.program.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Python configuration program.
    pub fn python_config_program(&self) -> &str {
        self.python.config.as_deref().unwrap_or(DEFAULT_PYTHON_CONFIG)
    }

    /// Translator program.
    pub fn translator_program(&self) -> &str {
        self.translator
            .program
            .as_deref()
            .unwrap_or(DEFAULT_TRANSLATOR)
    }

    /// Documentation converter program.
    pub fn converter_program(&self) -> &str {
        self.docs.converter.as_deref().unwrap_or(DEFAULT_CONVERTER)
    }

    /// README path relative to the project root.
    pub fn readme(&self) -> PathBuf {
        self.docs
            .readme
            .clone()
            .unwrap_or_else(|| PathBuf::from("README.md"))
    }

    /// Packaging command as program plus leading arguments.
    pub fn package_command(&self) -> (String, Vec<String>) {
        let program = self
            .package
            .program
            .clone()
            .unwrap_or_else(|| "python3".to_string());
        let args = self.package.args.clone().unwrap_or_else(|| {
            ["-m", "pip", "wheel", "."]
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        (program, args)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.nestkit/config.toml)
/// 2. Global config (~/.nestkit/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global nestkit config directory (~/.nestkit).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".nestkit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.provider_program(), "nest-config");
        assert_eq!(config.python_config_program(), "python3-config");
        assert_eq!(config.translator_program(), "cython");
        assert_eq!(config.converter_program(), "pandoc");
        assert_eq!(config.readme(), PathBuf::from("README.md"));

        let (program, args) = config.package_command();
        assert_eq!(program, "python3");
        assert_eq!(args, vec!["-m", "pip", "wheel", "."]);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[provider]
program = "/opt/nest/bin/nest-config"

[translator]
args = ["--fast-fail"]

[package]
program = "python3"
args = ["setup.py"]

[build]
out_dir = "target/ext"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.provider_program(), "/opt/nest/bin/nest-config");
        assert_eq!(config.translator.args, vec!["--fast-fail"]);
        assert_eq!(config.package_command().1, vec!["setup.py"]);
        assert_eq!(config.build.out_dir, Some(PathBuf::from("target/ext")));
    }

    #[test]
    fn test_config_broken_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[provider\nprogram = 3").unwrap();

        let config = Config::load_or_default(&config_path);
        assert_eq!(config.provider_program(), DEFAULT_PROVIDER);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[provider]
program = "/usr/bin/nest-config"

[docs]
converter = "/usr/local/bin/pandoc"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[provider]
program = "/opt/nest-3.6/bin/nest-config"
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        assert_eq!(config.provider_program(), "/opt/nest-3.6/bin/nest-config");
        assert_eq!(config.converter_program(), "/usr/local/bin/pandoc");
    }

    #[test]
    fn test_load_config_missing_files() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("a.toml"), &tmp.path().join("b.toml"));
        assert!(config.provider.program.is_none());
    }
}
