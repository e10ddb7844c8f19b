use std::time::Duration;

use invlink_radio::RadioSettings;
use invlink_wire::PowerLimit;

/// Link configuration.
///
/// The two serials are mandatory; everything else defaults to the cadence
/// the protocol was tuned for — 5 s between time-sync sends, a 5 ms receive
/// poll, re-requests after 100 ms of silence, and at most 5 of them per
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Serial of the local controller (the DTU).
    pub local_serial: u64,
    /// Serial of the remote inverter.
    pub peer_serial: u64,
    /// Interval between periodic time-sync commands.
    pub time_sync_interval: Duration,
    /// Receive poll tick.
    pub poll_interval: Duration,
    /// Silence window before a missing fragment is re-requested.
    pub rerequest_timeout: Duration,
    /// Re-requests allowed per sequence before abandonment.
    pub max_retries: u8,
    /// Receive pipe number opened on the local address.
    pub receive_pipe: u8,
    /// Power limit pushed once at startup, before the loops begin.
    pub startup_power_limit: Option<PowerLimit>,
    /// Static RF configuration applied at startup.
    pub radio: RadioSettings,
}

impl LinkConfig {
    pub fn new(local_serial: u64, peer_serial: u64) -> Self {
        Self {
            local_serial,
            peer_serial,
            time_sync_interval: Duration::from_secs(5),
            poll_interval: Duration::from_millis(5),
            rerequest_timeout: Duration::from_millis(100),
            max_retries: 5,
            receive_pipe: 1,
            startup_power_limit: Some(PowerLimit {
                limit: 25,
                relative: false,
                persist: false,
            }),
            radio: RadioSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_cadence() {
        let config = LinkConfig::new(99978563001, 116180215597);
        assert_eq!(config.time_sync_interval, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.rerequest_timeout, Duration::from_millis(100));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.receive_pipe, 1);
        assert!(config.startup_power_limit.is_some());
    }
}
