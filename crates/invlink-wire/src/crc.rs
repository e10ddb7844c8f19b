//! The two checksum layers of the wire protocol.

use crc::{Algorithm, Crc, CRC_16_MODBUS};

/// Per-fragment CRC8: polynomial x⁸+1, zero init, no reflection, no
/// output XOR. Covers every byte of a packet except its own trailing byte.
const CRC_8_FRAGMENT: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x01,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0x31,
    residue: 0x00,
};

const FRAGMENT_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_FRAGMENT);

/// Message-level CRC16 (MODBUS parameterization). Covers the payload of an
/// outbound frame, or the full reassembled body of an inbound message.
const MESSAGE_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// CRC8 over a fragment's bytes.
pub fn fragment_crc8(bytes: &[u8]) -> u8 {
    FRAGMENT_CRC.checksum(bytes)
}

/// CRC16 over a payload or assembled message body.
pub fn message_crc16(bytes: &[u8]) -> u16 {
    MESSAGE_CRC.checksum(bytes)
}
