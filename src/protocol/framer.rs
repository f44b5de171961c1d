//! Byte-stream framer.
//!
//! The UART hands over whatever bytes happen to be available, which may be a
//! fraction of a frame, several frames, or line noise. The framer keeps a
//! rolling buffer of two frames and carves complete, structurally valid
//! frames out of it.
//!
//! ```text
//! feed(bytes) ──► [ rolling buffer (32) ] ──► scan for lead ──► 16 bytes?
//!                                                 ▲                 │
//!                                                 │ drop 1 byte     ▼
//!                                                 └──── invalid ◄── validate ──► Frame
//! ```
//!
//! A partial frame that has waited longer than `receive_wait_time` when new
//! bytes arrive is thrown away, so a unit that died mid-frame cannot glue
//! its tail onto the next unit's reply.

use heapless::Vec;

use crate::error::LgapError;
use crate::protocol::constants::FRAME_LEN;
use crate::protocol::frame::{Frame, LeadBytes};

/// Rolling buffer capacity: two frames.
pub const BUFFER_CAPACITY: usize = FRAME_LEN * 2;

/// Counters kept by the framer. They only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    /// Complete frames handed out
    pub frames: u32,
    /// Bytes discarded while hunting for a lead byte or after a rejected candidate
    pub noise_bytes: u32,
    /// Candidates that started with a lead byte but failed validation
    pub rejected_candidates: u32,
    /// Partial frames discarded after `receive_wait_time`
    pub stalls: u32,
}

/// Turns raw serial bytes into validated 16-byte frames.
#[derive(Debug)]
pub struct Framer {
    buffer: Vec<u8, BUFFER_CAPACITY>,
    leads: LeadBytes,
    receive_wait_ms: u64,
    partial_since_ms: u64,
    stats: FramerStats,
    last_anomaly: Option<LgapError>,
}

impl Framer {
    /// Create an empty framer.
    pub fn new(leads: LeadBytes, receive_wait_ms: u64) -> Self {
        Self {
            buffer: Vec::new(),
            leads,
            receive_wait_ms,
            partial_since_ms: 0,
            stats: FramerStats::default(),
            last_anomaly: None,
        }
    }

    /// Feed newly received bytes and iterate over the frames they complete.
    ///
    /// The iterator is lazy: input is pulled into the buffer only as frames
    /// are requested. Dropping it early keeps the unread input *unread*;
    /// pass it again on the next call if that matters.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8], now_ms: u64) -> Frames<'a> {
        if !bytes.is_empty() && !self.buffer.is_empty() {
            let waited = now_ms.saturating_sub(self.partial_since_ms);
            if waited > self.receive_wait_ms {
                lgap_log!(
                    debug,
                    "Discarding {} stale bytes after {} ms",
                    self.buffer.len(),
                    waited
                );
                self.stats.stalls = self.stats.stalls.saturating_add(1);
                self.buffer.clear();
                self.last_anomaly = Some(LgapError::stalled());
            }
        }

        Frames {
            framer: self,
            input: bytes,
            now_ms,
        }
    }

    /// Counters since creation.
    pub const fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Number of bytes currently held as a partial frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Take the most recent framing anomaly (stall or resync), if any.
    pub fn take_anomaly(&mut self) -> Option<LgapError> {
        self.last_anomaly.take()
    }

    fn drop_front(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        let len = self.buffer.len();
        self.buffer.copy_within(n.., 0);
        self.buffer.truncate(len - n);
    }

    fn fill(&mut self, input: &[u8], now_ms: u64) -> usize {
        if self.buffer.is_empty() {
            self.partial_since_ms = now_ms;
        }

        let mut taken = 0;
        for &b in input {
            if self.buffer.push(b).is_err() {
                break;
            }
            taken += 1;
        }
        taken
    }

    fn extract(&mut self, now_ms: u64) -> Option<Frame> {
        loop {
            match self.buffer.iter().position(|&b| self.leads.is_lead(b)) {
                None => {
                    self.count_noise(self.buffer.len());
                    self.buffer.clear();
                    return None;
                }
                Some(0) => {}
                Some(skip) => {
                    self.count_noise(skip);
                    self.drop_front(skip);
                }
            }

            if self.buffer.len() < FRAME_LEN {
                return None;
            }

            let frame = Frame::from_slice(&self.buffer[..FRAME_LEN]).ok()?;
            match frame.validate(&self.leads) {
                Ok(_) => {
                    self.drop_front(FRAME_LEN);
                    self.partial_since_ms = now_ms;
                    self.stats.frames = self.stats.frames.saturating_add(1);
                    return Some(frame);
                }
                Err(e) => {
                    lgap_log!(trace, "Rejected frame candidate: {}", e);
                    self.stats.rejected_candidates =
                        self.stats.rejected_candidates.saturating_add(1);
                    self.count_noise(1);
                    self.drop_front(1);
                    self.last_anomaly = Some(LgapError::resync());
                }
            }
        }
    }

    fn count_noise(&mut self, n: usize) {
        self.stats.noise_bytes = self.stats.noise_bytes.saturating_add(n as u32);
    }
}

/// Lazy iterator over the frames completed by one [`Framer::feed`] call.
#[derive(Debug)]
pub struct Frames<'a> {
    framer: &'a mut Framer,
    input: &'a [u8],
    now_ms: u64,
}

impl Frames<'_> {
    /// Input bytes not yet pulled into the framer.
    pub fn remaining_input(&self) -> &[u8] {
        self.input
    }
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            if let Some(frame) = self.framer.extract(self.now_ms) {
                return Some(frame);
            }
            if self.input.is_empty() {
                return None;
            }
            let taken = self.framer.fill(self.input, self.now_ms);
            self.input = &self.input[taken..];
        }
    }
}
