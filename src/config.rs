//! Options of the code generator.
//!
//! Settings are layered: built in defaults, then an optional TOML (or JSON,
//! YAML, ..) file, then `AGENTC_*` environment variables, for example
//! `AGENTC_RUNTIME_PATH=my_agents::runtime`.
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_RUNTIME_PATH: &str = "agentc::runtime";
pub const DEFAULT_BASE_PATH: &str = "super";
pub const DEFAULT_INDENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Module path the generated code imports the runtime items from.
    pub runtime_path: String,
    /// Module path holding inherited constants and procedures.
    pub base_path: String,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Label of the program in the generated header.
    pub source_name: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            runtime_path: DEFAULT_RUNTIME_PATH.to_owned(),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            indent: DEFAULT_INDENT,
            source_name: None,
        }
    }
}

impl GeneratorOptions {
    /// Loads options from defaults, an optional file and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("runtime_path", DEFAULT_RUNTIME_PATH)?
            .set_default("base_path", DEFAULT_BASE_PATH)?
            .set_default("indent", DEFAULT_INDENT as u64)?;
        if let Some(file) = file {
            debug!(file = %file.display(), "Reading generator options");
            builder = builder.add_source(File::from(file));
        }
        let options = builder
            .add_source(Environment::with_prefix("AGENTC"))
            .build()?
            .try_deserialize()?;
        Ok(options)
    }
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}
