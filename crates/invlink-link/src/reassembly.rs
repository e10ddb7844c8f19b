//! Fragment reassembly state machine.
//!
//! Inbound telemetry arrives as up to 15 independently checksummed
//! fragments, indexed 1..15, terminal fragment marked by the frame-id high
//! bit. The engine accumulates them (arrival order does not matter),
//! re-requests the lowest missing index after 100 ms of silence, and gives
//! up after 5 fruitless retries.

use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use invlink_wire::{
    check_assembled_crc16, FRAGMENT_INDEX_MASK, LAST_FRAGMENT_FLAG, MAX_FRAGMENT_INDEX,
};

const SLOT_COUNT: usize = MAX_FRAGMENT_INDEX as usize + 1;

/// Outcome of feeding one fragment to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Fragment stored; the sequence is still incomplete.
    Pending,
    /// The sequence completed and passed its CRC16 — here is the message
    /// (checksum trailer still attached).
    Complete(Bytes),
    /// Fragment index outside 1..=15; dropped without touching state.
    BadIndex,
    /// The sequence assembled but failed its CRC16; everything discarded.
    Corrupt,
}

/// Outcome of a periodic retry tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do.
    Idle,
    /// Transmit one re-request for this missing fragment index.
    Request(u8),
    /// Retries exhausted; the sequence was dropped.
    Abandoned,
}

/// Accumulates one reassembly sequence at a time.
///
/// Idle whenever `expected == 0`; the first fragment of a new message
/// starts a sequence. Completion and abandonment both reset to idle.
pub struct ReassemblyEngine {
    slots: [Option<Bytes>; SLOT_COUNT],
    expected: u8,
    retries: u8,
    last_activity: Instant,
    timeout: Duration,
    max_retries: u8,
}

impl ReassemblyEngine {
    /// `timeout` is the silence window before a re-request; `max_retries`
    /// bounds how many re-requests one sequence may spend.
    pub fn new(timeout: Duration, max_retries: u8) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            expected: 0,
            retries: 0,
            last_activity: Instant::now(),
            timeout,
            max_retries,
        }
    }

    /// True while a sequence is being collected.
    pub fn is_collecting(&self) -> bool {
        self.expected > 0
    }

    /// Feed one fragment. The caller has already validated the CRC8 layer;
    /// `payload` is the fragment body with header and CRC8 stripped.
    pub fn accept(&mut self, frame_id: u8, payload: &[u8], now: Instant) -> Accepted {
        let index = frame_id & FRAGMENT_INDEX_MASK;
        let last = frame_id & LAST_FRAGMENT_FLAG != 0;
        if index == 0 || index > MAX_FRAGMENT_INDEX {
            trace!(index, "fragment index out of range, dropped");
            return Accepted::BadIndex;
        }

        if self.expected == 0 {
            self.slots.fill(None);
            self.retries = 0;
            debug!(index, "reassembly sequence started");
        }

        self.slots[index as usize] = Some(Bytes::copy_from_slice(payload));
        if last {
            // terminal fragment pins the count exactly
            self.expected = index;
        } else if index + 1 > self.expected {
            self.expected = index + 1;
        }
        self.last_activity = now;
        trace!(index, last, expected = self.expected, "fragment stored");

        match self.try_complete() {
            Some(outcome) => outcome,
            None => Accepted::Pending,
        }
    }

    /// Periodic retry check, driven at the receive-poll cadence.
    pub fn poll(&mut self, now: Instant) -> Tick {
        if self.expected == 0 {
            return Tick::Idle;
        }
        if now.duration_since(self.last_activity) <= self.timeout {
            return Tick::Idle;
        }

        self.retries += 1;
        if self.retries > self.max_retries {
            warn!(
                retries = self.max_retries,
                expected = self.expected,
                "reassembly abandoned, discarding collected fragments"
            );
            self.reset();
            return Tick::Abandoned;
        }

        match self.first_missing() {
            Some(index) => {
                self.last_activity = now;
                debug!(index, retry = self.retries, "re-requesting missing fragment");
                Tick::Request(index)
            }
            // a fully populated buffer completes on arrival, never here
            None => Tick::Idle,
        }
    }

    fn first_missing(&self) -> Option<u8> {
        (1..=self.expected).find(|&index| {
            self.slots
                .get(index as usize)
                .is_none_or(|slot| slot.is_none())
        })
    }

    fn try_complete(&mut self) -> Option<Accepted> {
        if self.expected == 0 || self.first_missing().is_some() {
            return None;
        }

        let mut assembled = BytesMut::new();
        for index in 1..=self.expected as usize {
            if let Some(Some(payload)) = self.slots.get(index) {
                assembled.extend_from_slice(payload);
            }
        }
        let assembled = assembled.freeze();
        let fragments = self.expected;
        self.reset();

        if check_assembled_crc16(&assembled) {
            debug!(len = assembled.len(), fragments, "message assembled");
            Some(Accepted::Complete(assembled))
        } else {
            warn!(
                len = assembled.len(),
                fragments, "assembled message failed checksum, discarded"
            );
            Some(Accepted::Corrupt)
        }
    }

    fn reset(&mut self) {
        self.slots.fill(None);
        self.expected = 0;
        self.retries = 0;
    }
}
