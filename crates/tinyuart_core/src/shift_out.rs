/// Transmit shift engine.
///
/// Holds one 10-bit frame `[start=0][d0..d7][stop=1]` and shifts it out LSB
/// first, one bit per transmit strobe. The line idles high whenever no frame
/// is in flight.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShiftOut {
    /// Frame bits still to go; bit 0 is on the line.
    frame: u16,
    /// Shifts already applied to the current frame.
    bit_count: u8,
    empty: bool,
    /// Sticky until the next accepted load.
    overrun: bool,
}

impl Default for ShiftOut {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftOut {
    /// Shifts that drain a frame: nine to walk the start and data bits off
    /// the line, a tenth to retire the stop bit.
    const LAST_SHIFT: u8 = 9;

    pub const fn new() -> Self {
        Self {
            frame: 0,
            bit_count: 0,
            empty: true,
            overrun: false,
        }
    }

    /// Build the wire frame for `data`: start bit in bit 0, data in bits
    /// 1..=8, stop bit in bit 9.
    #[inline]
    pub const fn frame_for(data: u8) -> u16 {
        (1 << 9) | ((data as u16) << 1)
    }

    /// Current transmit line level.
    #[inline]
    pub fn tx(&self) -> bool {
        self.empty || (self.frame & 1) != 0
    }

    #[inline]
    pub fn empty(&self) -> bool {
        self.empty
    }

    #[inline]
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    #[inline]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// Advance one clock and return the new line level.
    ///
    /// The load and shift branches both read the pre-tick registers, so a
    /// load and a strobe arriving together see the same snapshot.
    pub fn tick(&mut self, load: bool, data: u8, shift: bool) -> bool {
        let prev = *self;
        let mut next = prev;

        if load {
            if prev.empty {
                next.frame = Self::frame_for(data);
                next.empty = false;
                next.overrun = false;
                next.bit_count = 0;
                log::trace!("tx: accepted {:#04x}", data);
            } else {
                next.overrun = true;
                log::debug!(
                    "tx: overrun, {:#04x} dropped with {} bits of the current frame sent",
                    data,
                    prev.bit_count
                );
            }
        }

        if !prev.empty && shift {
            next.frame = prev.frame >> 1;
            if prev.bit_count == Self::LAST_SHIFT {
                next.empty = true;
                next.bit_count = 0;
                log::trace!("tx: frame done");
            } else {
                next.bit_count = prev.bit_count + 1;
            }
        }

        *self = next;
        self.tx()
    }
}
