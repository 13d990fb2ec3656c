//! Opaque per-client identifiers.

use rand::{rngs::OsRng, RngCore};
use std::fmt;

const ID_BYTES: usize = 16;
const ID_CHARS: usize = ID_BYTES * 2;

/// An opaque token identifying a counter subject.
///
/// Minted once per client and carried across requests in a signed cookie.
/// The token is 16 random bytes, hex-encoded, so collisions are not a
/// practical concern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Mints a fresh identifier from the OS random number generator.
    pub fn mint() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Parses an identifier previously produced by [`mint`](Self::mint).
    /// Returns `None` for anything of the wrong shape, so a tampered or
    /// truncated cookie value is treated the same as a missing one.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == ID_CHARS && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Some(Self(s.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
