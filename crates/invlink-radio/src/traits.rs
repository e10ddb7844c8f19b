use crate::error::Result;

/// A 5-byte radio pipe address (prefix byte + 4-byte node address).
pub type PipeAddress = [u8; 5];

/// Half-duplex packet radio channel.
///
/// One instance corresponds to one physical transceiver. The protocol
/// engine serializes all access behind a lock, so implementations do not
/// need internal synchronization, but they must tolerate the
/// listen/transmit mode flips of every send transaction.
pub trait RadioChannel {
    /// Apply static RF configuration. Called once at startup.
    fn apply_settings(&mut self, settings: &RadioSettings) -> Result<()>;

    /// Enter (`true`) or leave (`false`) listen mode.
    fn set_listen(&mut self, listen: bool) -> Result<()>;

    /// Open a receive pipe on the given address.
    fn open_receive_pipe(&mut self, pipe: u8, address: PipeAddress) -> Result<()>;

    /// Point the transmit pipe at the given address.
    fn open_transmit_pipe(&mut self, address: PipeAddress) -> Result<()>;

    /// True if a received fragment is waiting in the radio's FIFO.
    fn fragment_available(&mut self) -> Result<bool>;

    /// Pop one received fragment. Errors with [`RadioError::Empty`] if
    /// nothing is pending.
    ///
    /// [`RadioError::Empty`]: crate::RadioError::Empty
    fn read_fragment(&mut self) -> Result<Vec<u8>>;

    /// Transmit one fragment. The returned bool is the link-layer ack
    /// (or `true` where the driver has auto-ack disabled).
    fn send_fragment(&mut self, frame: &[u8]) -> Result<bool>;

    /// Snapshot of channel-quality counters.
    fn diagnostics(&mut self) -> Result<ChannelDiagnostics>;
}

/// Static RF configuration, applied once at startup.
///
/// Defaults match the deployment this protocol was built around: a quiet
/// channel, the slowest (longest-range) data rate, and generous auto-retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioSettings {
    /// RF channel number.
    pub channel: u8,
    /// Air data rate in kbps.
    pub data_rate_kbps: u32,
    /// Link-layer CRC width in bytes.
    pub crc_bytes: u8,
    /// Pipe address width in bytes.
    pub address_width: u8,
    /// Auto-retransmit delay, in 250 µs units.
    pub auto_retry_delay: u8,
    /// Auto-retransmit attempt count.
    pub auto_retry_count: u8,
    /// Transmit power in dBm.
    pub pa_level_dbm: i8,
    /// Dynamic payload lengths (required: fragments vary in size).
    pub dynamic_payloads: bool,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            channel: 23,
            data_rate_kbps: 250,
            crc_bytes: 2,
            address_width: 5,
            auto_retry_delay: 3,
            auto_retry_count: 15,
            pa_level_dbm: -18,
            dynamic_payloads: true,
        }
    }
}

/// Channel-quality counters reported by [`RadioChannel::diagnostics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelDiagnostics {
    /// Configured RF channel.
    pub channel: u8,
    /// Packets lost since the counter was last reset.
    pub lost_packets: u8,
    /// Link-layer retransmissions for the most recent send.
    pub retransmits: u8,
    /// Fragments handed to the transmitter.
    pub frames_sent: u64,
    /// Fragments read out of the receive FIFO.
    pub frames_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_deployment() {
        let settings = RadioSettings::default();
        assert_eq!(settings.channel, 23);
        assert_eq!(settings.data_rate_kbps, 250);
        assert_eq!(settings.crc_bytes, 2);
        assert_eq!(settings.address_width, 5);
        assert_eq!(settings.auto_retry_delay, 3);
        assert_eq!(settings.auto_retry_count, 15);
        assert_eq!(settings.pa_level_dbm, -18);
        assert!(settings.dynamic_payloads);
    }
}
