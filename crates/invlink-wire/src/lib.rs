//! Wire framing and command encoding for the inverter radio protocol.
//!
//! Every radio packet carries two checksum layers:
//! - A trailing CRC8 over the whole packet, validated per fragment
//! - A CRC16 (MODBUS) over the logical payload, validated once a
//!   fragmented message has been reassembled
//!
//! This crate is pure computation: building addressed frames, parsing and
//! validating inbound fragments, and encoding device command payloads.
//! Nothing here touches the radio.

pub mod addr;
pub mod codec;
pub mod command;
pub mod crc;
pub mod error;

pub use addr::{NodeAddr, PIPE_PREFIX};
pub use codec::{
    check_assembled_crc16, check_fragment_crc8, encode_frame, parse_fragment, Fragment,
    FRAGMENT_INDEX_MASK, HEADER_SIZE, LAST_FRAGMENT_FLAG, MAX_FRAGMENT_INDEX, MAX_FRAGMENT_SIZE,
    MIN_FRAGMENT_SIZE, SOLO_FRAME_ID, TX_REQ_DEVCONTROL, TX_REQ_INFO,
};
pub use command::{
    control_payload, power_limit_payload, request_payload, time_sync_payload, DeviceCommand,
    LimitModifier, PowerLimit, TIME_SYNC_PAYLOAD_LEN,
};
pub use crc::{fragment_crc8, message_crc16};
pub use error::{Result, WireError};
