//! Order-preserving keys for timestamps.
//!
//! A key is the Unix timestamp in seconds as 8 big-endian bytes with the
//! sign bit flipped, so unsigned byte-wise comparison matches chronological
//! order across the whole `i64` range, including instants before 1970.

use std::fmt;

use chrono::{DateTime, Utc};

pub const KEY_LEN: usize = 8;

const SIGN_BIT: u64 = 1 << 63;

pub type TimeKey = [u8; KEY_LEN];

/// Encode `timestamp` at second resolution
pub fn encode(timestamp: DateTime<Utc>) -> TimeKey {
    ((timestamp.timestamp() as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Inverse of [`encode`]; `None` for keys of the wrong width or out of range
pub fn decode(key: &[u8]) -> Option<DateTime<Utc>> {
    let bytes: TimeKey = key.try_into().ok()?;
    let secs = (u64::from_be_bytes(bytes) ^ SIGN_BIT) as i64;
    DateTime::from_timestamp(secs, 0)
}

/// Human-readable form of a key for logs and error messages
pub fn display(key: &[u8]) -> KeyDisplay<'_> {
    KeyDisplay(key)
}

pub struct KeyDisplay<'a>(&'a [u8]);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match decode(self.0) {
            Some(timestamp) => write!(f, "{}", timestamp.to_rfc3339()),
            None => {
                f.write_str("0x")?;
                for byte in self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}
