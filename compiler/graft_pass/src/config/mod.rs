//! Pass-list override files.
//!
//! A `PassConfig` is a list of pass documents. Tooling writes one with
//! [`PassRegistry::save_passes`](crate::PassRegistry::save_passes), edits
//! priorities or enable flags, and feeds it back through
//! [`PassRegistry::apply_config`](crate::PassRegistry::apply_config)
//! without rebuilding the binary.
//!
//! ```text
//! {
//!   "version": 1,
//!   "passes": [
//!     { "pass_name": "conv_relu_fusion", "pass_type": "Transformation",
//!       "pass_backend": "cpu", "priority": 9.0, "enable": false }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Pass, PassRecord, SerializationError};

/// Environment variable naming an override file.
pub const PASS_CONFIG_ENV: &str = "GRAFT_PASS_CONFIG";

/// Override file format version written and accepted by this build.
pub const PASS_CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    PASS_CONFIG_VERSION
}

/// A list of pass documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub passes: Vec<PassRecord>,
}

impl PassConfig {
    /// Create an empty config at the current version.
    pub fn new() -> Self {
        PassConfig {
            version: PASS_CONFIG_VERSION,
            passes: Vec::new(),
        }
    }

    /// Snapshot a sequence of passes.
    pub fn from_passes<'a>(passes: impl IntoIterator<Item = &'a Pass>) -> Self {
        PassConfig {
            version: PASS_CONFIG_VERSION,
            passes: passes.into_iter().map(Pass::to_record).collect(),
        }
    }

    /// Parse a config document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SerializationError> {
        let config: PassConfig = serde_json::from_reader(reader)?;
        if config.version != PASS_CONFIG_VERSION {
            return Err(SerializationError::UnsupportedVersion {
                found: config.version,
                supported: PASS_CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Read a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SerializationError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading pass config");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read the file named by `GRAFT_PASS_CONFIG`, if the variable is set.
    pub fn from_env() -> Result<Option<Self>, SerializationError> {
        match std::env::var_os(PASS_CONFIG_ENV) {
            Some(path) => Self::from_path(path).map(Some),
            None => Ok(None),
        }
    }

    /// Write this config as pretty-printed JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), SerializationError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// The record for a pass name, if present.
    pub fn get(&self, name: &str) -> Option<&PassRecord> {
        self.passes.iter().find(|record| record.pass_name == name)
    }
}

impl Default for PassConfig {
    fn default() -> Self {
        Self::new()
    }
}
