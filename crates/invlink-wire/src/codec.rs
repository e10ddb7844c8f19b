use bytes::{BufMut, Bytes, BytesMut};

use crate::addr::NodeAddr;
use crate::crc::{fragment_crc8, message_crc16};
use crate::error::{Result, WireError};

/// Packet type: information request / telemetry exchange.
pub const TX_REQ_INFO: u8 = 0x15;

/// Packet type: device control command.
pub const TX_REQ_DEVCONTROL: u8 = 0x51;

/// Frame header: type (1) + destination (4) + source (4) + frame-id (1).
pub const HEADER_SIZE: usize = 10;

/// Smallest valid fragment: header plus the trailing CRC8.
pub const MIN_FRAGMENT_SIZE: usize = HEADER_SIZE + 1;

/// Largest fragment the transceiver can carry (dynamic payload ceiling).
pub const MAX_FRAGMENT_SIZE: usize = 32;

/// Frame-id bit 7: set on the terminal fragment of a message.
pub const LAST_FRAGMENT_FLAG: u8 = 0x80;

/// Frame-id bits 0–6: the fragment index within a message.
pub const FRAGMENT_INDEX_MASK: u8 = 0x7F;

/// Highest fragment index a reassembly sequence can address.
pub const MAX_FRAGMENT_INDEX: u8 = 15;

/// Frame-id of a self-contained outbound frame: terminal flag, index 0.
pub const SOLO_FRAME_ID: u8 = LAST_FRAGMENT_FLAG;

/// A validated inbound fragment with its header fields split out.
///
/// `payload` is the fragment's slice of the logical message — header and
/// trailing CRC8 already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Packet type byte.
    pub kind: u8,
    /// Destination node address.
    pub dst: NodeAddr,
    /// Source node address.
    pub src: NodeAddr,
    /// Raw frame-id byte (terminal flag + index).
    pub frame_id: u8,
    /// Payload bytes carried by this fragment.
    pub payload: Bytes,
}

impl Fragment {
    /// Fragment index within its reassembly sequence (1..=15 for telemetry).
    pub fn index(&self) -> u8 {
        self.frame_id & FRAGMENT_INDEX_MASK
    }

    /// True if this is the terminal fragment of its message.
    pub fn is_last(&self) -> bool {
        self.frame_id & LAST_FRAGMENT_FLAG != 0
    }
}

/// Encode an addressed frame into the wire format.
///
/// Wire format (all multi-byte integers big-endian):
/// ```text
/// ┌──────┬─────────────┬─────────────┬──────────┬─────────┬─────────┬──────┐
/// │ Type │ Destination │ Source      │ Frame-id │ Payload │ CRC16   │ CRC8 │
/// │ (1B) │ (4B)        │ (4B)        │ (1B)     │ (0..N)  │ (2B)*   │ (1B) │
/// └──────┴─────────────┴─────────────┴──────────┴─────────┴─────────┴──────┘
/// * CRC16 over the payload, present only when the payload is non-empty.
///   CRC8 over every preceding byte of the frame.
/// ```
pub fn encode_frame(
    kind: u8,
    dst: NodeAddr,
    src: NodeAddr,
    frame_id: u8,
    payload: &[u8],
) -> Result<Bytes> {
    let crc16_len = if payload.is_empty() { 0 } else { 2 };
    let total = HEADER_SIZE + payload.len() + crc16_len + 1;
    if total > MAX_FRAGMENT_SIZE {
        return Err(WireError::FrameTooLarge {
            size: total,
            max: MAX_FRAGMENT_SIZE,
        });
    }

    let mut out = BytesMut::with_capacity(total);
    out.put_u8(kind);
    out.put_slice(dst.as_bytes());
    out.put_slice(src.as_bytes());
    out.put_u8(frame_id);
    out.put_slice(payload);
    if !payload.is_empty() {
        out.put_u16(message_crc16(payload));
    }
    out.put_u8(fragment_crc8(&out));
    Ok(out.freeze())
}

/// Validate a fragment's trailing CRC8.
///
/// Recomputes the CRC over all bytes except the last and compares. A
/// mismatch means the fragment must be dropped silently; this never panics.
pub fn check_fragment_crc8(raw: &[u8]) -> bool {
    match raw.split_last() {
        Some((crc, body)) => fragment_crc8(body) == *crc,
        None => false,
    }
}

/// Validate the CRC16 trailer of a reassembled message.
///
/// Recomputes the MODBUS CRC over all bytes except the trailing two and
/// compares big-endian. Same drop-silently contract as the CRC8 check.
pub fn check_assembled_crc16(assembled: &[u8]) -> bool {
    if assembled.len() < 2 {
        return false;
    }
    let (body, trailer) = assembled.split_at(assembled.len() - 2);
    message_crc16(body).to_be_bytes() == trailer
}

/// Parse a raw inbound fragment.
///
/// Checks length bounds and the CRC8 layer, then splits the header fields
/// out. The typed errors exist so callers can log why a fragment was
/// dropped; the receive path always drops and continues regardless.
pub fn parse_fragment(raw: &[u8]) -> Result<Fragment> {
    if raw.len() < MIN_FRAGMENT_SIZE {
        return Err(WireError::Truncated {
            size: raw.len(),
            min: MIN_FRAGMENT_SIZE,
        });
    }
    if raw.len() > MAX_FRAGMENT_SIZE {
        return Err(WireError::FrameTooLarge {
            size: raw.len(),
            max: MAX_FRAGMENT_SIZE,
        });
    }

    let found = raw[raw.len() - 1];
    let computed = fragment_crc8(&raw[..raw.len() - 1]);
    if computed != found {
        return Err(WireError::FragmentCrc { computed, found });
    }

    let mut dst = [0u8; 4];
    dst.copy_from_slice(&raw[1..5]);
    let mut src = [0u8; 4];
    src.copy_from_slice(&raw[5..9]);

    Ok(Fragment {
        kind: raw[0],
        dst: NodeAddr::from_bytes(dst),
        src: NodeAddr::from_bytes(src),
        frame_id: raw[9],
        payload: Bytes::copy_from_slice(&raw[HEADER_SIZE..raw.len() - 1]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{power_limit_payload, time_sync_payload};

    fn dtu() -> NodeAddr {
        NodeAddr::from_serial(99978563001)
    }

    fn inverter() -> NodeAddr {
        NodeAddr::from_serial(116180215597)
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn golden_time_sync_frame() {
        let payload = time_sync_payload(0x6000_0000);
        let frame =
            encode_frame(TX_REQ_INFO, inverter(), dtu(), SOLO_FRAME_ID, &payload).unwrap();
        assert_eq!(
            hex(&frame),
            "158021559778563001800b006000000000000005000000ade7cd"
        );
        assert_eq!(frame.len(), 26);
    }

    #[test]
    fn golden_power_limit_frame() {
        let payload = power_limit_payload(25, false, false);
        let frame =
            encode_frame(TX_REQ_DEVCONTROL, inverter(), dtu(), SOLO_FRAME_ID, &payload).unwrap();
        assert_eq!(hex(&frame), "518021559778563001800b0001f400006e417c");
    }

    #[test]
    fn golden_bare_command_frame() {
        // ON, no data word: payload is exactly two bytes
        let frame = encode_frame(
            TX_REQ_DEVCONTROL,
            inverter(),
            dtu(),
            SOLO_FRAME_ID,
            &[0x00, 0x00],
        )
        .unwrap();
        assert_eq!(hex(&frame), "518021559778563001800000b0011c");
        assert_eq!(frame.len(), 15);
    }

    #[test]
    fn golden_rerequest_frame() {
        let frame = encode_frame(TX_REQ_INFO, inverter(), dtu(), 0x02, &[]).unwrap();
        assert_eq!(hex(&frame), "158021559778563001026b");
    }

    #[test]
    fn empty_payload_frame_is_exactly_eleven_bytes() {
        let frame = encode_frame(TX_REQ_INFO, inverter(), dtu(), 0x01, &[]).unwrap();
        assert_eq!(frame.len(), MIN_FRAGMENT_SIZE);
        // no CRC16 field: header, frame-id, CRC8 and nothing else
        assert!(check_fragment_crc8(&frame));
    }

    #[test]
    fn encoded_frames_self_validate() {
        for payload in [&b""[..], &b"x"[..], &[0x0B, 0x00, 0x01, 0xF4, 0x00, 0x00][..]] {
            let frame =
                encode_frame(TX_REQ_DEVCONTROL, inverter(), dtu(), SOLO_FRAME_ID, payload)
                    .unwrap();
            assert!(check_fragment_crc8(&frame), "payload {payload:?}");
        }
    }

    #[test]
    fn oversized_payload_rejected() {
        let payload = [0u8; 20]; // 10 + 20 + 2 + 1 = 33 > 32
        let err =
            encode_frame(TX_REQ_INFO, inverter(), dtu(), SOLO_FRAME_ID, &payload).unwrap_err();
        assert!(matches!(err, WireError::FrameTooLarge { size: 33, .. }));
    }

    #[test]
    fn parse_splits_header_fields() {
        let frame = encode_frame(TX_REQ_INFO, inverter(), dtu(), 0x83, b"abc").unwrap();
        let fragment = parse_fragment(&frame).unwrap();

        assert_eq!(fragment.kind, TX_REQ_INFO);
        assert_eq!(fragment.dst, inverter());
        assert_eq!(fragment.src, dtu());
        assert_eq!(fragment.index(), 3);
        assert!(fragment.is_last());
        // payload region covers the CRC16 trailer too; the codec only
        // strips header and CRC8
        assert_eq!(fragment.payload.len(), 3 + 2);
        assert_eq!(&fragment.payload[..3], b"abc");
    }

    #[test]
    fn parse_rejects_corrupted_fragment() {
        let frame = encode_frame(TX_REQ_INFO, inverter(), dtu(), 0x81, b"abc").unwrap();
        let mut bad = frame.to_vec();
        bad[12] ^= 0x40;

        assert!(!check_fragment_crc8(&bad));
        assert!(matches!(
            parse_fragment(&bad),
            Err(WireError::FragmentCrc { .. })
        ));
    }

    #[test]
    fn parse_rejects_truncated_fragment() {
        assert!(matches!(
            parse_fragment(&[0x15, 0x80, 0x21]),
            Err(WireError::Truncated { size: 3, .. })
        ));
        assert!(matches!(parse_fragment(&[]), Err(WireError::Truncated { .. })));
    }

    #[test]
    fn crc8_check_tolerates_tiny_input() {
        assert!(!check_fragment_crc8(&[]));
        // single zero byte: CRC8 of the empty prefix is zero, so it passes
        assert!(check_fragment_crc8(&[0x00]));
    }

    #[test]
    fn assembled_crc16_round_trip_and_corruption() {
        let body = b"hello radio";
        let mut assembled = body.to_vec();
        assembled.extend_from_slice(&message_crc16(body).to_be_bytes());
        assert!(check_assembled_crc16(&assembled));

        for bit in 0..8 {
            let mut corrupt = assembled.clone();
            corrupt[4] ^= 1 << bit;
            assert!(!check_assembled_crc16(&corrupt), "bit {bit}");
        }

        assert!(!check_assembled_crc16(&[]));
        assert!(!check_assembled_crc16(&[0xFF]));
    }
}
