//! Relay configuration
//!
//! Everything is fixed at process start; nothing is reconfigurable at
//! runtime.

use crate::error::Result;
use crate::registry::RegistryConfig;
use crate::serial::{ReadErrorPolicy, SerialConfig};
use crate::server::ServerConfig;

/// Complete configuration for one relay process
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Serial device settings
    pub serial: SerialConfig,

    /// What to do about failed reads
    pub read_policy: ReadErrorPolicy,

    /// History size and observer queue depth
    pub registry: RegistryConfig,

    /// HTTP listener settings
    pub server: ServerConfig,
}

impl RelayConfig {
    /// Default configuration for the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            serial: SerialConfig::new(device),
            read_policy: ReadErrorPolicy::default(),
            registry: RegistryConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.serial.validate()?;
        self.registry.validate()?;
        Ok(())
    }
}
