//! Pass metadata documents.
//!
//! A pass's identity, priority and enable flag round-trip through a small
//! JSON object:
//!
//! ```text
//! {
//!   "pass_name": "conv_relu_fusion",
//!   "pass_type": "Transformation",
//!   "pass_backend": "cpu",
//!   "priority": 9.0,
//!   "enable": true
//! }
//! ```
//!
//! Fields are matched by name. Every field is required on load; a missing
//! one is reported instead of leaving the pass half-initialized.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::pass::{Pass, PassKind};
use crate::SerializationError;

/// Serializable view of one pass. Field order is the document order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    pub pass_name: String,
    pub pass_type: PassKind,
    pub pass_backend: String,
    pub priority: f32,
    pub enable: bool,
}

impl Pass {
    /// Snapshot this pass's metadata.
    pub fn to_record(&self) -> PassRecord {
        PassRecord {
            pass_name: self.name().to_owned(),
            pass_type: self.kind(),
            pass_backend: self.backend().to_owned(),
            priority: self.priority(),
            enable: self.enable(),
        }
    }

    /// Write this pass's metadata document.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SerializationError> {
        serde_json::to_writer_pretty(writer, &self.to_record())?;
        Ok(())
    }

    /// Populate this pass from a metadata document.
    ///
    /// The document's `pass_type` must equal this pass's kind; a pass never
    /// changes role. A registered pass also keeps its backend and name, since
    /// the registry indexes it by name. Nothing is modified unless the whole
    /// document is valid.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SerializationError> {
        let record: PassRecord = serde_json::from_reader(reader)?;
        self.apply_record(record)
    }

    fn apply_record(&mut self, record: PassRecord) -> Result<(), SerializationError> {
        if record.pass_type != self.kind() {
            return Err(SerializationError::KindMismatch {
                name: record.pass_name,
                expected: self.kind(),
                found: record.pass_type,
            });
        }
        if self.is_registered()
            && (record.pass_name != self.name() || record.pass_backend != self.backend())
        {
            return Err(SerializationError::IdentityMismatch {
                backend: self.backend().to_owned(),
                name: self.name().to_owned(),
                found_backend: record.pass_backend,
                found_name: record.pass_name,
            });
        }
        self.set_identity(record.pass_backend, record.pass_name);
        self.set_priority(record.priority).set_enable(record.enable);
        Ok(())
    }
}
