//! Value encoding for stored snapshots.
//!
//! Values are JSON. Unknown fields are ignored and missing ones take their
//! defaults, so records written by older or newer builds still load.

use crate::domain::HostSnapshot;

pub fn encode(snapshot: &HostSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

pub fn decode(bytes: &[u8]) -> Result<HostSnapshot, serde_json::Error> {
    serde_json::from_slice(bytes)
}
