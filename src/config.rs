// 6.0 config.rs: module settings in one place. the trusted engine address is fixed
// here at construction and never changes afterwards.

use serde::{Deserialize, Serialize};

use crate::types::Address;

/** 6.1: deed module configuration */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    // Address the module acts under when it talks to the engine
    pub module_address: Address,
    // The only caller allowed to invoke bridge callbacks
    pub engine: Address,
    // Maximum number of audit events retained in memory
    pub max_events: usize,
    // Whether denied closes are recorded in the audit log
    pub record_denials: bool,
}

impl ModuleConfig {
    pub fn new(module_address: Address, engine: Address) -> Self {
        Self {
            module_address,
            engine,
            max_events: 100_000,
            record_denials: true,
        }
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn with_record_denials(mut self, record: bool) -> Self {
        self.record_denials = record;
        self
    }

    pub fn for_environment(module_address: Address, engine: Address, env: Environment) -> Self {
        let config = Self::new(module_address, engine);
        match env {
            Environment::Development => config.with_max_events(10_000),
            Environment::Testnet => config,
            Environment::Mainnet => config.with_max_events(1_000_000),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.is_zero() {
            return Err(ConfigError::InvalidEngine {
                reason: "engine address must be set".to_string(),
            });
        }

        if self.module_address.is_zero() {
            return Err(ConfigError::InvalidModule {
                reason: "module address must be set".to_string(),
            });
        }

        if self.module_address == self.engine {
            return Err(ConfigError::InvalidModule {
                reason: "module and engine cannot share an address".to_string(),
            });
        }

        if self.max_events == 0 {
            return Err(ConfigError::InvalidRetention);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid engine address: {reason}")]
    InvalidEngine { reason: String },

    #[error("Invalid module address: {reason}")]
    InvalidModule { reason: String },

    #[error("max_events must be positive")]
    InvalidRetention,

    #[error("Could not parse config: {0}")]
    Parse(String),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}
