//! Writer configuration
//!
//! Values arrive from three places, applied in this order: a TOML file, the
//! component's launch arguments, then `WMEM_`-prefixed environment variables.

use crate::{Result, WmError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "WMEM_";

/// How generated entry ids are disambiguated between writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierStyle {
    /// Suffix with the encoded component number
    #[default]
    Compact,
    /// Suffix with the full component id, for tracing
    Verbose,
}

impl FromStr for IdentifierStyle {
    type Err = WmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "verbose" => Ok(Self::Verbose),
            other => Err(WmError::invalid(format!("unknown identifier style: {other}"))),
        }
    }
}

/// Configuration of one working memory writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Full component identity
    pub component_id: String,
    /// Compact component number, unique per deployment
    ///
    /// Required: writers without one would share the compact id namespace.
    pub component_number: Option<u32>,
    /// The writer's own partition, used by the implicit-partition operations
    pub partition: String,
    /// Suffix form for generated ids
    pub identifier_style: IdentifierStyle,
    /// Force a deep copy when the store is collocated
    pub serialize_collocated_writes: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            component_id: String::new(),
            component_number: None,
            partition: String::new(),
            identifier_style: IdentifierStyle::Compact,
            serialize_collocated_writes: true,
        }
    }
}

impl WriterConfig {
    /// Minimal valid configuration
    pub fn new(
        component_id: impl Into<String>,
        component_number: u32,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            component_number: Some(component_number),
            partition: partition.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WmError::invalid(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| WmError::invalid(format!("invalid config TOML: {e}")))
    }

    /// Build from component launch arguments (`--component-id`, `--component-number`, ...)
    pub fn from_map(args: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in args {
            if let Some(name) = key.strip_prefix("--") {
                config.set_from_string(&name.replace('-', "_"), value)?;
            }
        }
        Ok(config)
    }

    /// Apply `WMEM_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `WMEM_*` overrides from an explicit variable list
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                self.set_from_string(&name.to_ascii_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set one field by its snake_case name
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "component_id" => self.component_id = value.to_string(),
            "component_number" => {
                let number = value
                    .parse()
                    .map_err(|e| WmError::invalid(format!("component_number {value:?}: {e}")))?;
                self.component_number = Some(number);
            }
            "partition" => self.partition = value.to_string(),
            "identifier_style" => self.identifier_style = value.parse()?,
            "serialize_collocated_writes" => {
                self.serialize_collocated_writes = value.parse().map_err(|e| {
                    WmError::invalid(format!("serialize_collocated_writes {value:?}: {e}"))
                })?;
            }
            other => {
                tracing::debug!(key = other, "ignoring unknown writer config key");
            }
        }
        Ok(())
    }

    /// The component number, `InvalidArgument` when it was never set
    pub fn required_component_number(&self) -> Result<u32> {
        self.component_number
            .ok_or_else(|| WmError::invalid("component_number must be set"))
    }

    /// Check the fields a writer cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.component_id.is_empty() {
            return Err(WmError::invalid("component_id must not be empty"));
        }
        self.required_component_number()?;
        if self.partition.is_empty() {
            return Err(WmError::invalid("partition must not be empty"));
        }
        Ok(())
    }
}
