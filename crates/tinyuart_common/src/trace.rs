use std::io::Write;

use anyhow::{Context, Result};
use tinyuart_core::{Status, Strobes, UartCore};

/// Pins and status as they stood during one clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    pub tx: bool,
    pub rx: bool,
    pub status: Status,
    pub strobes: Strobes,
    pub in_data: u8,
}

impl Sample {
    pub fn capture(core: &UartCore, rx: bool) -> Self {
        Self {
            tx: core.tx(),
            rx,
            status: core.status(),
            strobes: core.strobes(),
            in_data: core.in_data(),
        }
    }
}

struct Signal {
    name: &'static str,
    width: u32,
    value: fn(&Sample) -> u64,
}

const SIGNALS: &[Signal] = &[
    Signal { name: "tx", width: 1, value: |s| s.tx as u64 },
    Signal { name: "rx", width: 1, value: |s| s.rx as u64 },
    Signal { name: "tx_empty", width: 1, value: |s| s.status.contains(Status::TX_EMPTY) as u64 },
    Signal { name: "rx_empty", width: 1, value: |s| s.status.contains(Status::RX_EMPTY) as u64 },
    Signal { name: "tx_overrun", width: 1, value: |s| s.status.contains(Status::TX_OVERRUN) as u64 },
    Signal { name: "rx_overrun", width: 1, value: |s| s.status.contains(Status::RX_OVERRUN) as u64 },
    Signal { name: "rx_busy", width: 1, value: |s| s.status.contains(Status::RX_BUSY) as u64 },
    Signal { name: "tx_strobe", width: 1, value: |s| s.strobes.tx as u64 },
    Signal { name: "rx_strobe", width: 1, value: |s| s.strobes.rx as u64 },
    Signal { name: "in_data", width: 8, value: |s| u64::from(s.in_data) },
];

/// Per-clock recording of a core's pins, dumpable as a VCD waveform.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    samples: Vec<Sample>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the core as it stands before a clock with `rx` on its input.
    pub fn record(&mut self, core: &UartCore, rx: bool) {
        self.samples.push(Sample::capture(core, rx));
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Transmit line levels, one per recorded clock.
    pub fn tx_levels(&self) -> impl Iterator<Item = bool> + '_ {
        self.samples.iter().map(|s| s.tx)
    }

    /// Write the trace as a Value Change Dump. `clock_hz` sets the time
    /// between samples; only changed signals are written at each step.
    pub fn write_vcd<W: Write>(&self, out: &mut W, clock_hz: u32) -> Result<()> {
        let period_ps = 1_000_000_000_000u64 / u64::from(clock_hz.max(1));

        writeln!(out, "$version tinyuart {} $end", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "$timescale 1ps $end")?;
        writeln!(out, "$scope module uart $end")?;
        for (index, signal) in SIGNALS.iter().enumerate() {
            writeln!(
                out,
                "$var wire {} {} {} $end",
                signal.width,
                identifier(index),
                signal.name
            )?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;

        let mut previous: Option<&Sample> = None;
        for (clock, sample) in self.samples.iter().enumerate() {
            let changed: Vec<(usize, &Signal)> = SIGNALS
                .iter()
                .enumerate()
                .filter(|(_, signal)| previous.map_or(true, |p| (signal.value)(p) != (signal.value)(sample)))
                .collect();
            if changed.is_empty() {
                continue;
            }

            writeln!(out, "#{}", clock as u64 * period_ps)?;
            if previous.is_none() {
                writeln!(out, "$dumpvars")?;
            }
            for (index, signal) in changed {
                let value = (signal.value)(sample);
                if signal.width == 1 {
                    writeln!(out, "{}{}", value, identifier(index))?;
                } else {
                    writeln!(
                        out,
                        "b{:0width$b} {}",
                        value,
                        identifier(index),
                        width = signal.width as usize
                    )?;
                }
            }
            if previous.is_none() {
                writeln!(out, "$end")?;
            }
            previous = Some(sample);
        }

        if !self.samples.is_empty() {
            writeln!(out, "#{}", self.samples.len() as u64 * period_ps)?;
        }
        out.flush().context("failed to flush VCD output")?;
        Ok(())
    }
}

/// Short VCD identifier for the signal at `index`.
fn identifier(index: usize) -> char {
    (b'!' + index as u8) as char
}
