//! In-memory radio for tests and offline simulation.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{RadioError, Result};
use crate::traits::{ChannelDiagnostics, PipeAddress, RadioChannel, RadioSettings};

/// Hook invoked for every transmitted frame; returns fragments the
/// simulated peer sends back.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

/// One frame captured by [`SimRadio::send_fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    /// Transmit pipe open at the time of the send.
    pub pipe: Option<PipeAddress>,
    /// Raw frame bytes.
    pub bytes: Vec<u8>,
    /// Whether the radio was (incorrectly) still in listen mode.
    pub listening: bool,
}

/// Scriptable in-memory [`RadioChannel`].
///
/// Inbound fragments are queued with [`queue_fragment`] or produced by an
/// optional responder hook reacting to outbound frames, which is enough to
/// play a whole inverter conversation without hardware.
///
/// [`queue_fragment`]: SimRadio::queue_fragment
#[derive(Default)]
pub struct SimRadio {
    settings: Option<RadioSettings>,
    listening: bool,
    receive_pipes: Vec<(u8, PipeAddress)>,
    transmit_pipe: Option<PipeAddress>,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<SentFrame>,
    responder: Option<Responder>,
    refuse_acks: usize,
    fail_reads: usize,
    frames_received: u64,
}

impl SimRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fragment for the receive path.
    pub fn queue_fragment(&mut self, fragment: impl Into<Vec<u8>>) {
        self.inbound.push_back(fragment.into());
    }

    /// Install a responder emulating the remote peer.
    pub fn set_responder(&mut self, responder: Responder) {
        self.responder = Some(responder);
    }

    /// Make the next `count` sends report a missing link-layer ack.
    pub fn refuse_acks(&mut self, count: usize) {
        self.refuse_acks = count;
    }

    /// Make the next `count` receive-path calls fail at the driver level.
    pub fn fail_reads(&mut self, count: usize) {
        self.fail_reads = count;
    }

    /// Frames transmitted so far, oldest first.
    pub fn sent_frames(&self) -> &[SentFrame] {
        &self.sent
    }

    /// Drain the captured outbound frames.
    pub fn take_sent(&mut self) -> Vec<SentFrame> {
        std::mem::take(&mut self.sent)
    }

    /// Currently in listen mode?
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Receive pipes opened so far.
    pub fn receive_pipes(&self) -> &[(u8, PipeAddress)] {
        &self.receive_pipes
    }

    /// Settings applied at startup, if any.
    pub fn settings(&self) -> Option<&RadioSettings> {
        self.settings.as_ref()
    }
}

impl RadioChannel for SimRadio {
    fn apply_settings(&mut self, settings: &RadioSettings) -> Result<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn set_listen(&mut self, listen: bool) -> Result<()> {
        trace!(listen, "sim radio mode change");
        self.listening = listen;
        Ok(())
    }

    fn open_receive_pipe(&mut self, pipe: u8, address: PipeAddress) -> Result<()> {
        self.receive_pipes.retain(|(id, _)| *id != pipe);
        self.receive_pipes.push((pipe, address));
        Ok(())
    }

    fn open_transmit_pipe(&mut self, address: PipeAddress) -> Result<()> {
        self.transmit_pipe = Some(address);
        Ok(())
    }

    fn fragment_available(&mut self) -> Result<bool> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(RadioError::Hardware("simulated fault".into()));
        }
        Ok(!self.inbound.is_empty())
    }

    fn read_fragment(&mut self) -> Result<Vec<u8>> {
        let fragment = self.inbound.pop_front().ok_or(RadioError::Empty)?;
        self.frames_received += 1;
        trace!(len = fragment.len(), "sim radio fragment read");
        Ok(fragment)
    }

    fn send_fragment(&mut self, frame: &[u8]) -> Result<bool> {
        self.sent.push(SentFrame {
            pipe: self.transmit_pipe,
            bytes: frame.to_vec(),
            listening: self.listening,
        });
        if let Some(responder) = self.responder.as_mut() {
            for fragment in responder(frame) {
                self.inbound.push_back(fragment);
            }
        }
        if self.refuse_acks > 0 {
            self.refuse_acks -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn diagnostics(&mut self) -> Result<ChannelDiagnostics> {
        Ok(ChannelDiagnostics {
            channel: self.settings.as_ref().map(|s| s.channel).unwrap_or(0),
            lost_packets: 0,
            retransmits: 0,
            frames_sent: self.sent.len() as u64,
            frames_received: self.frames_received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_fragments_come_back_in_order() {
        let mut radio = SimRadio::new();
        radio.queue_fragment(vec![1, 2, 3]);
        radio.queue_fragment(vec![4]);

        assert!(radio.fragment_available().unwrap());
        assert_eq!(radio.read_fragment().unwrap(), vec![1, 2, 3]);
        assert_eq!(radio.read_fragment().unwrap(), vec![4]);
        assert!(!radio.fragment_available().unwrap());
        assert!(matches!(radio.read_fragment(), Err(RadioError::Empty)));
    }

    #[test]
    fn sends_are_captured_with_pipe_and_mode() {
        let mut radio = SimRadio::new();
        radio.open_transmit_pipe([1, 2, 3, 4, 5]).unwrap();
        radio.set_listen(false).unwrap();
        assert!(radio.send_fragment(&[0xAA]).unwrap());

        let sent = radio.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].pipe, Some([1, 2, 3, 4, 5]));
        assert_eq!(sent[0].bytes, vec![0xAA]);
        assert!(!sent[0].listening);
    }

    #[test]
    fn responder_feeds_the_receive_queue() {
        let mut radio = SimRadio::new();
        radio.set_responder(Box::new(|frame: &[u8]| {
            vec![vec![frame[0] ^ 0xFF]]
        }));

        radio.send_fragment(&[0x0F]).unwrap();
        assert_eq!(radio.read_fragment().unwrap(), vec![0xF0]);
    }

    #[test]
    fn ack_refusal_is_consumed() {
        let mut radio = SimRadio::new();
        radio.refuse_acks(1);
        assert!(!radio.send_fragment(&[1]).unwrap());
        assert!(radio.send_fragment(&[2]).unwrap());
    }

    #[test]
    fn read_faults_are_consumed() {
        let mut radio = SimRadio::new();
        radio.queue_fragment(vec![9]);
        radio.fail_reads(1);
        assert!(radio.fragment_available().is_err());
        assert!(radio.fragment_available().unwrap());
    }

    #[test]
    fn reopening_a_pipe_replaces_it() {
        let mut radio = SimRadio::new();
        radio.open_receive_pipe(1, [1, 0, 0, 0, 0]).unwrap();
        radio.open_receive_pipe(1, [1, 9, 9, 9, 9]).unwrap();
        assert_eq!(radio.receive_pipes(), &[(1, [1, 9, 9, 9, 9])]);
    }

    #[test]
    fn diagnostics_track_traffic() {
        let mut radio = SimRadio::new();
        radio.apply_settings(&RadioSettings::default()).unwrap();
        radio.queue_fragment(vec![1]);
        radio.read_fragment().unwrap();
        radio.send_fragment(&[2]).unwrap();

        let diag = radio.diagnostics().unwrap();
        assert_eq!(diag.channel, 23);
        assert_eq!(diag.frames_sent, 1);
        assert_eq!(diag.frames_received, 1);
    }
}
