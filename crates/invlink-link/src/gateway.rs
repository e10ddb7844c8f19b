//! The control loop: one radio, two activities.
//!
//! A periodic sender pushes time-sync commands to the inverter every few
//! seconds; a continuous poller drains the receive FIFO at a ~5 ms tick and
//! drives reassembly retries. Both share the transceiver through a single
//! lock, and every send transaction flips the radio out of listen mode and
//! back before releasing it. The loops run for the process lifetime;
//! nothing in here treats an error as fatal.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, trace, warn};

use invlink_radio::RadioChannel;
use invlink_wire::{
    control_payload, encode_frame, parse_fragment, request_payload, time_sync_payload,
    DeviceCommand, NodeAddr, PowerLimit, SOLO_FRAME_ID, TX_REQ_DEVCONTROL, TX_REQ_INFO,
};

use crate::config::LinkConfig;
use crate::error::Result;
use crate::reassembly::{Accepted, ReassemblyEngine, Tick};
use crate::telemetry::{self, TelemetryReading};

/// Drives one controller ↔ inverter link over one radio.
pub struct InverterLink<R> {
    radio: Mutex<R>,
    engine: Mutex<ReassemblyEngine>,
    events: Sender<TelemetryReading>,
    config: LinkConfig,
    local: NodeAddr,
    peer: NodeAddr,
}

impl<R: RadioChannel> InverterLink<R> {
    /// Build a link around a radio. Decoded telemetry arrives on the
    /// returned receiver.
    pub fn new(radio: R, config: LinkConfig) -> (Arc<Self>, Receiver<TelemetryReading>) {
        let (events, receiver) = mpsc::channel();
        let engine = ReassemblyEngine::new(config.rerequest_timeout, config.max_retries);
        let link = Arc::new(Self {
            radio: Mutex::new(radio),
            engine: Mutex::new(engine),
            events,
            local: NodeAddr::from_serial(config.local_serial),
            peer: NodeAddr::from_serial(config.peer_serial),
            config,
        });
        (link, receiver)
    }

    /// The link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Run a closure against the locked radio. Mainly for inspection in
    /// tests and simulation harnesses.
    pub fn with_radio<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.lock_radio())
    }

    /// Configure the radio, start listening on the local address, and push
    /// the startup power limit. Must run before [`spawn`](Self::spawn).
    pub fn startup(&self) -> Result<()> {
        {
            let mut radio = self.lock_radio();
            radio.apply_settings(&self.config.radio)?;
            radio.open_receive_pipe(self.config.receive_pipe, self.local.pipe_address())?;
            radio.set_listen(true)?;
        }
        info!(local = %self.local, peer = %self.peer, "link up, listening");

        if let Some(limit) = self.config.startup_power_limit {
            self.send_power_limit(limit)?;
        }
        Ok(())
    }

    /// Send a device control command to the peer.
    pub fn send_control(&self, cmd: DeviceCommand, data: Option<u16>, modifier: u16) -> Result<bool> {
        debug!(?cmd, ?data, modifier, "sending control command");
        self.transmit(
            TX_REQ_DEVCONTROL,
            SOLO_FRAME_ID,
            &control_payload(cmd, data, modifier),
        )
    }

    /// Send an active power limit to the peer.
    pub fn send_power_limit(&self, limit: PowerLimit) -> Result<bool> {
        info!(
            limit = limit.limit,
            relative = limit.relative,
            persist = limit.persist,
            "sending power limit"
        );
        self.transmit(TX_REQ_DEVCONTROL, SOLO_FRAME_ID, &limit.payload())
    }

    /// Send a clock synchronization command to the peer.
    pub fn send_time_sync(&self, unix_seconds: u32) -> Result<bool> {
        self.transmit(TX_REQ_INFO, SOLO_FRAME_ID, &time_sync_payload(unix_seconds))
    }

    /// One iteration of the periodic sender: time sync, then a diagnostics
    /// snapshot for the log.
    pub fn sender_cycle(&self, unix_seconds: u32) -> Result<()> {
        let acked = self.send_time_sync(unix_seconds)?;
        trace!(unix_seconds, acked, "time sync sent");

        let diag = self.with_radio(|radio| radio.diagnostics())?;
        debug!(
            channel = diag.channel,
            sent = diag.frames_sent,
            received = diag.frames_received,
            lost = diag.lost_packets,
            retransmits = diag.retransmits,
            "channel diagnostics"
        );
        Ok(())
    }

    /// One iteration of the receive poller: read at most one fragment,
    /// feed the engine, then run the retry check.
    pub fn poll_cycle(&self, now: Instant) -> Result<()> {
        let raw = {
            let mut radio = self.lock_radio();
            if radio.fragment_available()? {
                Some(radio.read_fragment()?)
            } else {
                None
            }
        };

        if let Some(raw) = raw {
            match parse_fragment(&raw) {
                Ok(fragment) => {
                    trace!(
                        kind = fragment.kind,
                        src = %fragment.src,
                        index = fragment.index(),
                        last = fragment.is_last(),
                        "fragment received"
                    );
                    let outcome =
                        self.lock_engine()
                            .accept(fragment.frame_id, &fragment.payload, now);
                    if let Accepted::Complete(message) = outcome {
                        self.emit_telemetry(&message);
                    }
                }
                Err(err) => trace!(%err, "fragment dropped"),
            }
        }

        // retry check runs every tick, fragment or not
        if let Tick::Request(index) = self.lock_engine().poll(now) {
            self.transmit(TX_REQ_INFO, index, request_payload())?;
        }
        Ok(())
    }

    /// Spawn the two loop threads. They run until the process exits.
    pub fn spawn(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>)
    where
        R: Send + 'static,
    {
        let sender = Arc::clone(self);
        let sender_handle = thread::spawn(move || loop {
            if let Err(err) = sender.sender_cycle(unix_now()) {
                warn!(%err, "send cycle failed");
            }
            thread::sleep(sender.config.time_sync_interval);
        });

        let poller = Arc::clone(self);
        let poller_handle = thread::spawn(move || loop {
            if let Err(err) = poller.poll_cycle(Instant::now()) {
                warn!(%err, "poll cycle failed");
            }
            thread::sleep(poller.config.poll_interval);
        });

        (sender_handle, poller_handle)
    }

    /// One send transaction: leave listen mode, aim the transmit pipe at
    /// the peer, send, and restore listen mode — all under the channel
    /// lock. The ack result is informational; delivery is fire-and-forget.
    fn transmit(&self, kind: u8, frame_id: u8, payload: &[u8]) -> Result<bool> {
        let frame = encode_frame(kind, self.peer, self.local, frame_id, payload)?;

        let mut radio = self.lock_radio();
        radio.set_listen(false)?;
        let sent = match radio.open_transmit_pipe(self.peer.pipe_address()) {
            Ok(()) => radio.send_fragment(&frame),
            Err(err) => Err(err),
        };
        let restored = radio.set_listen(true);

        let acked = sent?;
        restored?;
        if !acked {
            debug!(kind, frame_id, "no link-layer ack for outbound frame");
        }
        Ok(acked)
    }

    fn emit_telemetry(&self, message: &bytes::Bytes) {
        if let Some(reading) = telemetry::decode(message) {
            info!(
                power_watts = ?reading.ac_power_watts(),
                len = reading.raw.len(),
                "telemetry message"
            );
            if self.events.send(reading).is_err() {
                trace!("telemetry receiver dropped, reading discarded");
            }
        }
    }

    fn lock_radio(&self) -> MutexGuard<'_, R> {
        self.radio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_engine(&self) -> MutexGuard<'_, ReassemblyEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
