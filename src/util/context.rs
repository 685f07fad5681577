//! Global context for nestkit operations.
//!
//! Provides centralized access to configuration, paths, and output settings.
//! Nothing here touches the process environment after construction; values
//! are handed to operations explicitly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project root (the directory containing `nest/`)
    cwd: PathBuf,

    /// Home directory for global nestkit data (~/.nestkit/)
    home: PathBuf,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext rooted at a specific directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(".nestkit"));

        GlobalContext {
            cwd,
            home,
            color: true,
        }
    }

    /// Override the home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the project root.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the nestkit home directory (~/.nestkit/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local nestkit directory.
    pub fn project_nestkit_dir(&self) -> PathBuf {
        self.cwd.join(".nestkit")
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_nestkit_dir().join("config.toml")
    }

    /// Load the merged global and project configuration.
    pub fn load_config(&self) -> Config {
        load_config(&self.config_path(), &self.project_config_path())
    }

    /// Get the build output directory.
    pub fn out_dir(&self, config: &Config) -> PathBuf {
        match &config.build.out_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.cwd.join(dir),
            None => self.cwd.join("build"),
        }
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }
}
