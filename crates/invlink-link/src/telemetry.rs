//! Decoding of reassembled telemetry messages.

use bytes::Bytes;
use serde::{Serialize, Serializer};

/// Byte offset of the AC power word in a telemetry message body.
const AC_POWER_OFFSET: usize = 50;

/// One decoded telemetry message.
///
/// The inverter's report format is only partially mapped; the raw body is
/// kept alongside the fields we understand so consumers can dig further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryReading {
    /// Message body with the CRC16 trailer stripped, as hex.
    #[serde(serialize_with = "hex_bytes")]
    pub raw: Bytes,
    /// AC output power in 0.1 W units, when the body is long enough to
    /// carry it.
    pub ac_power_deciwatts: Option<u16>,
}

impl TelemetryReading {
    /// AC output power in watts.
    pub fn ac_power_watts(&self) -> Option<f64> {
        self.ac_power_deciwatts.map(|dw| f64::from(dw) / 10.0)
    }
}

/// Decode a CRC16-validated assembled message (trailer still attached).
///
/// Returns `None` only for messages too short to carry their own checksum,
/// which the reassembly engine never produces.
pub fn decode(assembled: &Bytes) -> Option<TelemetryReading> {
    if assembled.len() < 2 {
        return None;
    }
    let body = assembled.slice(..assembled.len() - 2);
    let ac_power = body
        .get(AC_POWER_OFFSET..AC_POWER_OFFSET + 2)
        .map(|word| u16::from_be_bytes([word[0], word[1]]));
    Some(TelemetryReading {
        raw: body,
        ac_power_deciwatts: ac_power,
    })
}

fn hex_bytes<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    serializer.serialize_str(&hex)
}
