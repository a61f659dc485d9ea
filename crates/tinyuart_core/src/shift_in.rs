/// Receive shift engine.
///
/// The raw line passes through a two-stage synchronizer before anything
/// looks at it. A synchronized falling edge while idle starts a frame; from
/// then on every receive strobe samples the line into a 9-bit register. The
/// tenth sample (the stop bit) closes the frame and latches the eight data
/// bits held before it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShiftIn {
    /// Line as seen one clock ago.
    sync_stage0: bool,
    /// Line as seen two clocks ago.
    sync_stage1: bool,
    /// Samples enter at bit 8 and move towards bit 0.
    shift_reg: u16,
    bit_count: u8,
    busy: bool,
    empty: bool,
    overrun: bool,
    in_data: u8,
}

impl Default for ShiftIn {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftIn {
    /// Samples per frame minus one: start, 8 data bits, stop.
    const LAST_SAMPLE: u8 = 9;
    const TOP_BIT: u32 = 8;

    pub const fn new() -> Self {
        Self {
            sync_stage0: false,
            sync_stage1: false,
            shift_reg: 0,
            bit_count: 0,
            busy: false,
            empty: true,
            overrun: false,
            in_data: 0,
        }
    }

    /// Synchronized falling edge: high two clocks ago, low one clock ago.
    #[inline]
    pub fn edge(&self) -> bool {
        self.sync_stage1 && !self.sync_stage0
    }

    /// Last completed byte.
    #[inline]
    pub fn in_data(&self) -> u8 {
        self.in_data
    }

    #[inline]
    pub fn empty(&self) -> bool {
        self.empty
    }

    #[inline]
    pub fn busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    #[inline]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// Advance one clock.
    ///
    /// A take and a frame completion on the same clock both read the
    /// pre-tick `empty`; the completion is applied last, so a pending byte
    /// still raises `overrun` even while it is being taken.
    pub fn tick(&mut self, rx: bool, take: bool, shift: bool) {
        let prev = *self;
        let mut next = prev;

        next.sync_stage1 = prev.sync_stage0;
        next.sync_stage0 = rx;

        if take {
            next.empty = true;
            next.overrun = false;
        }

        if !prev.busy && prev.edge() {
            next.busy = true;
            log::trace!("rx: start edge");
        }

        if prev.busy && shift {
            let sample = u16::from(prev.sync_stage0) << Self::TOP_BIT;
            next.shift_reg = (prev.shift_reg >> 1) | sample;
            if prev.bit_count == Self::LAST_SAMPLE {
                // The start bit sits in bit 0; the data byte is above it.
                next.in_data = (prev.shift_reg >> 1) as u8;
                next.bit_count = 0;
                next.busy = false;
                if !prev.empty {
                    next.overrun = true;
                    log::debug!(
                        "rx: overrun, {:#04x} replaced by {:#04x}",
                        prev.in_data,
                        next.in_data
                    );
                } else {
                    next.empty = false;
                    log::trace!("rx: received {:#04x}", next.in_data);
                }
            } else {
                next.bit_count = prev.bit_count + 1;
            }
        }

        *self = next;
    }
}
