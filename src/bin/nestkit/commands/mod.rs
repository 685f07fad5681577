//! Command implementations.

pub mod build;
pub mod completions;
pub mod doctor;
pub mod package;
pub mod plan;
pub mod query;

use anyhow::Result;

use nestkit::core::SourceMode;
use nestkit::ops::SetupOptions;
use nestkit::util::GlobalContext;

/// Options shared by every command.
pub struct Global {
    pub provider: Option<String>,
    pub verbose: bool,
    pub color: bool,
}

impl Global {
    /// Resolve operation settings for the current directory.
    pub fn setup(&self, source_mode: SourceMode) -> Result<SetupOptions> {
        let mut ctx = GlobalContext::new()?;
        ctx.set_color(self.color);

        let config = ctx.load_config();
        Ok(SetupOptions::new(&ctx, &config, source_mode).with_provider(self.provider.clone()))
    }
}
