use std::collections::VecDeque;

use tinyuart_core::MARK;

use crate::frame_bits;

/// Host-side transmitter that bit-bangs frames onto a receive line.
///
/// The bit period is given in clocks and need not match the core's, which
/// is how baud mismatch is modelled. Before the first frame the line idles
/// high for one bit period unless [`with_idle`](Self::with_idle) says
/// otherwise; between frames it idles for the configured gap.
#[derive(Clone, Debug)]
pub struct LineDriver {
    ticks_per_bit: u64,
    gap: u64,
    idle: u64,
    queue: VecDeque<u8>,
    current: Option<Frame>,
}

#[derive(Clone, Debug)]
struct Frame {
    bits: [bool; 10],
    index: usize,
    remaining: u64,
}

impl LineDriver {
    pub fn new(ticks_per_bit: u64) -> Self {
        let ticks_per_bit = ticks_per_bit.max(1);
        Self {
            ticks_per_bit,
            gap: 0,
            idle: ticks_per_bit,
            queue: VecDeque::new(),
            current: None,
        }
    }

    /// Idle clocks before the first start bit.
    pub fn with_idle(mut self, ticks: u64) -> Self {
        self.idle = ticks;
        self
    }

    /// Idle clocks between the end of one stop bit and the next start bit.
    pub fn with_gap(mut self, ticks: u64) -> Self {
        self.gap = ticks;
        self
    }

    pub fn ticks_per_bit(&self) -> u64 {
        self.ticks_per_bit
    }

    pub fn queue(&mut self, byte: u8) {
        self.queue.push_back(byte);
    }

    pub fn queue_all(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    /// Nothing in flight or queued and no idle time left to wait out.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty() && self.idle == 0
    }

    /// Line level for the next clock.
    pub fn next_level(&mut self) -> bool {
        if self.idle > 0 {
            self.idle -= 1;
            return MARK;
        }

        if self.current.is_none() {
            let Some(byte) = self.queue.pop_front() else {
                return MARK;
            };
            self.current = Some(Frame {
                bits: frame_bits(byte),
                index: 0,
                remaining: self.ticks_per_bit,
            });
        }

        let Some(frame) = self.current.as_mut() else {
            return MARK;
        };
        let level = frame.bits[frame.index];
        frame.remaining -= 1;
        if frame.remaining == 0 {
            frame.index += 1;
            frame.remaining = self.ticks_per_bit;
            if frame.index == frame.bits.len() {
                self.current = None;
                self.idle = self.gap;
            }
        }
        level
    }
}
