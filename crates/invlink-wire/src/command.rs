//! Device command payloads.
//!
//! Commands travel as the payload of a `TX_REQ_DEVCONTROL` frame (or
//! `TX_REQ_INFO` for time synchronization). Layout per command family:
//!
//! - bare control: `[opcode, 0]`
//! - control with data: `[opcode, 0, data_hi, data_lo, mod_hi, mod_lo]`
//! - time sync: 13 fixed bytes, markers at offsets 0 and 9
//! - fragment re-request: empty (the index rides in the frame-id byte)

use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};

/// Fixed length of a time-sync payload.
pub const TIME_SYNC_PAYLOAD_LEN: usize = 13;

const TIME_SYNC_SUBCOMMAND: u8 = 0x0B;
const TIME_SYNC_MARKER: u8 = 0x05;

/// Device control opcodes understood by the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceCommand {
    On = 0,
    Off = 1,
    RestoreLastAction = 2,
    Lock = 3,
    Unlock = 4,
    ActivePowerLimit = 11,
    ReactivePowerLimit = 12,
    PowerFactor = 13,
    LockAndAlarm = 20,
    SelfInspect = 40,
}

impl DeviceCommand {
    /// The wire opcode.
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DeviceCommand {
    type Error = u8;

    fn try_from(opcode: u8) -> Result<Self, u8> {
        Ok(match opcode {
            0 => Self::On,
            1 => Self::Off,
            2 => Self::RestoreLastAction,
            3 => Self::Lock,
            4 => Self::Unlock,
            11 => Self::ActivePowerLimit,
            12 => Self::ReactivePowerLimit,
            13 => Self::PowerFactor,
            20 => Self::LockAndAlarm,
            40 => Self::SelfInspect,
            other => return Err(other),
        })
    }
}

bitflags! {
    /// Modifier bits attached to a control command's data word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LimitModifier: u16 {
        /// Interpret the data word as a percentage of rated power.
        const RELATIVE = 0x0001;
        /// Keep the setting across inverter restarts.
        const PERSIST = 0x0100;
    }
}

/// An active power limit command, before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLimit {
    /// Limit in whole units (watts, or percent when `relative`).
    pub limit: u16,
    /// Percentage of rated power instead of an absolute value.
    pub relative: bool,
    /// Survive inverter restarts.
    pub persist: bool,
}

impl PowerLimit {
    /// Fixed-point data word: 0.05-unit resolution, saturating at the top.
    pub fn data_word(&self) -> u16 {
        self.limit.saturating_mul(20)
    }

    /// Modifier bits for this limit.
    pub fn modifier(&self) -> LimitModifier {
        let mut modifier = LimitModifier::empty();
        if self.relative {
            modifier |= LimitModifier::RELATIVE;
        }
        if self.persist {
            modifier |= LimitModifier::PERSIST;
        }
        modifier
    }

    /// Encode as a control payload.
    pub fn payload(&self) -> Bytes {
        control_payload(
            DeviceCommand::ActivePowerLimit,
            Some(self.data_word()),
            self.modifier().bits(),
        )
    }
}

/// Encode a control command payload.
///
/// Without a data word the payload is exactly two bytes; with one, the
/// big-endian data and modifier words follow.
pub fn control_payload(cmd: DeviceCommand, data: Option<u16>, modifier: u16) -> Bytes {
    let mut out = BytesMut::with_capacity(6);
    out.put_u8(cmd.opcode());
    out.put_u8(0);
    if let Some(data) = data {
        out.put_u16(data);
        out.put_u16(modifier);
    }
    out.freeze()
}

/// Encode an active power limit payload.
pub fn power_limit_payload(limit: u16, relative: bool, persist: bool) -> Bytes {
    PowerLimit {
        limit,
        relative,
        persist,
    }
    .payload()
}

/// Encode a time synchronization payload.
///
/// Always [`TIME_SYNC_PAYLOAD_LEN`] bytes: subcommand marker at byte 0,
/// big-endian unix seconds at bytes 2–5, trailing marker at byte 9.
pub fn time_sync_payload(unix_seconds: u32) -> Bytes {
    let mut out = [0u8; TIME_SYNC_PAYLOAD_LEN];
    out[0] = TIME_SYNC_SUBCOMMAND;
    out[2..6].copy_from_slice(&unix_seconds.to_be_bytes());
    out[9] = TIME_SYNC_MARKER;
    Bytes::copy_from_slice(&out)
}

/// Payload of a fragment re-request: empty by design.
pub fn request_payload() -> &'static [u8] {
    &[]
}
