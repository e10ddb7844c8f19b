//! Network addressing derived from device serial numbers.
//!
//! Peers are identified by numeric decimal serials (printed on the device
//! label). On the air, only the last eight decimal digits are used, read as
//! eight hex characters — so serial `99978563001` becomes the address
//! `78:56:30:01`.

use std::fmt;

/// Fixed first byte of every 5-byte radio pipe address.
pub const PIPE_PREFIX: u8 = 0x01;

/// A 4-byte over-the-air node address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeAddr([u8; 4]);

impl NodeAddr {
    /// Derive the address from a device serial number.
    ///
    /// Takes the last eight decimal digits (zero-padded for short serials)
    /// and packs each digit pair as one byte of hex characters.
    pub fn from_serial(serial: u64) -> Self {
        let mut digits = serial % 100_000_000;
        let mut addr = [0u8; 4];
        for slot in addr.iter_mut().rev() {
            let low = (digits % 10) as u8;
            digits /= 10;
            let high = (digits % 10) as u8;
            digits /= 10;
            *slot = (high << 4) | low;
        }
        Self(addr)
    }

    /// Construct from raw address bytes (e.g. parsed off the wire).
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The raw 4 address bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The full 5-byte pipe address used by the transceiver:
    /// [`PIPE_PREFIX`] followed by the node address.
    pub const fn pipe_address(&self) -> [u8; 5] {
        [PIPE_PREFIX, self.0[0], self.0[1], self.0[2], self.0[3]]
    }
}

impl fmt::Debug for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddr({self})")
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}
