//! Event input: already-decoded elementary data values, one record per
//! crossing, read from a JSON file.
//!
//! This is the stand-in for the raw-bank decoding pipelines feeding the real
//! board: each record carries zero or more `(name, bx, raw value)` triples to
//! inject before emulation.

use crate::l0du::BxOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// One `(name, bx, raw value)` triple to inject into the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInjection {
    /// Name of the elementary data to inject into.
    pub name: String,
    /// Crossing offset the value belongs to.
    #[serde(default)]
    pub bx: BxOffset,
    /// Raw digit value.
    pub value: u32,
}

/// One crossing's worth of input data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventRecord {
    /// Bunch-crossing id of the event.
    #[serde(default)]
    pub bcid: u16,
    /// Injections to apply before emulating.
    #[serde(default)]
    pub data: Vec<DataInjection>,
}

/// Load an events file: a JSON array of [EventRecord]s.
pub fn load_events(path: &Path) -> io::Result<Vec<EventRecord>> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse events file {}: {e}", path.display()),
        )
    })
}
