// planner settings, read from TOML

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optical_network::DEFAULT_SLOT_COUNT;
use crate::optical_network::assignment::SpectrumAssigner;
use crate::optical_network::routing::PathSelector;
use crate::scientific_computing::metrics::EntropyNormalization;

#[derive(Error,Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid{field:&'static str,reason:String},
}

type Result<T> = std::result::Result<T,ConfigError>;

// how, if at all, each demand gets a backup path
#[derive(Clone,Copy,Debug,PartialEq,Eq,Default,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionMode {
    #[default]
    #[serde(rename = "none")]
    Unprotected,
    // 1+1, the backup holds its own exclusive spectrum
    Dedicated,
    // backups of demands with fibre-disjoint primaries may share spectrum
    Shared,
}

// every knob of a planning run
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    // candidate paths generated per demand
    pub k_paths:usize,
    // frequency slot units on every link
    pub slot_count:usize,
    pub selector:PathSelector,
    pub assigner:SpectrumAssigner,
    // swap the selected primary for the shortest candidate when it is no worse
    pub modulation_aware:bool,
    pub protection:ProtectionMode,
    pub entropy_normalization:EntropyNormalization
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            k_paths:5,
            slot_count:DEFAULT_SLOT_COUNT,
            selector:PathSelector::default(),
            assigner:SpectrumAssigner::default(),
            modulation_aware:true,
            protection:ProtectionMode::default(),
            entropy_normalization:EntropyNormalization::default()
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(text:&str) -> Result<Self> {
        let config:Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_file<P:AsRef<Path>>(path:P) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
    pub fn validate(&self) -> Result<()> {
        if self.k_paths == 0 {
            return Err(ConfigError::Invalid { field: "k_paths", reason: "must be at least 1".into() });
        }
        if self.slot_count == 0 {
            return Err(ConfigError::Invalid { field: "slot_count", reason: "must be at least 1".into() });
        }
        Ok(())
    }
}
