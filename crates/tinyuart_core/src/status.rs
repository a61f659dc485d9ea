use bitflags::bitflags;

bitflags! {
    /// Snapshot of the core's status outputs.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Status: u8 {
        /// No frame in flight on the transmit side.
        const TX_EMPTY = 0b0000_0001;
        /// No received byte waiting to be read.
        const RX_EMPTY = 0b0000_0010;
        /// A write arrived while a frame was still going out.
        const TX_OVERRUN = 0b0000_0100;
        /// A frame completed before the previous byte was read.
        const RX_OVERRUN = 0b0000_1000;
        /// A frame is being received.
        const RX_BUSY = 0b0001_0000;
    }
}

impl Status {
    /// Power-on status: both sides empty, nothing lost.
    pub const IDLE: Status = Status::TX_EMPTY.union(Status::RX_EMPTY);

    #[inline]
    pub fn any_overrun(self) -> bool {
        self.intersects(Status::TX_OVERRUN | Status::RX_OVERRUN)
    }
}
