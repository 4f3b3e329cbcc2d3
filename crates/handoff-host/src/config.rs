//! Host configuration parser.
//!
//! ```toml
//! [transport]
//! write_budget = 65536
//! pipe_depth = 16
//! max_open_bodies = 1024
//! max_body_bytes = 16777216
//! ```
//!
//! Every key is optional and falls back to its default.

use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use handoff_core::TransportConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub transport: TransportConfig,
}

impl HostConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read host config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig = toml::from_str(content).context("failed to parse host config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings that would leave the transport unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.transport;
        ensure!(t.write_budget > 0, "transport.write_budget must be > 0");
        ensure!(t.pipe_depth > 0, "transport.pipe_depth must be > 0");
        ensure!(t.max_open_bodies > 0, "transport.max_open_bodies must be > 0");
        ensure!(t.max_body_bytes > 0, "transport.max_body_bytes must be > 0");
        Ok(())
    }
}
