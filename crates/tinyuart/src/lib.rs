use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tinyuart_common::{Echo, LineDriver, Loopback};
use tinyuart_core::{Pins, UartConfig, UartCore};

pub enum Command {
    Info,
    Loopback { bytes: Vec<u8> },
    Stress { count: u32, seed: u64 },
    Echo { bytes: Vec<u8> },
    Vcd { out_path: String, byte: u8 },
}

pub fn run(command: Command, config: UartConfig) -> Result<()> {
    match command {
        Command::Info => info(config),
        Command::Loopback { bytes } => run_loopback(config, &bytes),
        Command::Stress { count, seed } => run_stress(config, count, seed),
        Command::Echo { bytes } => run_echo(config, &bytes),
        Command::Vcd { out_path, byte } => dump_vcd(config, Path::new(&out_path), byte),
    }
}

pub fn info(config: UartConfig) -> Result<()> {
    let factor = config.sysclk_factor()?;
    println!("system clock:  {} Hz", config.system_clock_hz);
    println!("baud rate:     {}", config.baud_rate);
    println!("divider:       {}", factor);
    println!("actual baud:   {:.2}", config.actual_baud_rate(factor));
    println!("baud error:    {:+.0} ppm", config.baud_error_ppm()?);
    println!("bit clocks:    {}", config.bit_ticks()?);
    println!("frame clocks:  {}", config.frame_ticks()?);
    Ok(())
}

pub fn run_loopback(config: UartConfig, bytes: &[u8]) -> Result<()> {
    let mut bench = Loopback::new(config)?;
    for &byte in bytes {
        let start = bench.core().cycles();
        let received = bench.transfer(byte)?;
        println!(
            "sent {:#04x} received {:#04x} in {} clocks{}",
            byte,
            received,
            bench.core().cycles() - start,
            if received == byte { "" } else { "  MISMATCH" }
        );
        if received != byte {
            bail!("loopback returned {received:#04x} for {byte:#04x}");
        }
    }
    Ok(())
}

pub fn run_stress(config: UartConfig, count: u32, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bench = Loopback::new(config)?;
    let mut mismatches = 0u32;
    for index in 0..count {
        let byte: u8 = rng.gen();
        let received = bench.transfer(byte)?;
        if received != byte {
            mismatches += 1;
            log::error!("#{index}: sent {byte:#04x}, received {received:#04x}");
        }
    }
    println!(
        "{} bytes, {} mismatches, {} clocks, status {:?}",
        count,
        mismatches,
        bench.core().cycles(),
        bench.core().status()
    );
    if mismatches != 0 {
        bail!("{mismatches} of {count} bytes corrupted");
    }
    Ok(())
}

/// Send `bytes` from a host line driver into an echo device and decode
/// what comes back with a second core.
pub fn run_echo(config: UartConfig, bytes: &[u8]) -> Result<()> {
    let bit_ticks = config.bit_ticks()?;
    let mut driver = LineDriver::new(bit_ticks).with_gap(2 * bit_ticks);
    driver.queue_all(bytes);

    let mut echo = Echo::new(config)?;
    let mut host = UartCore::new(config).context("invalid UART configuration")?;
    let mut received = Vec::with_capacity(bytes.len());
    let budget = (bytes.len() as u64 + 2) * 13 * bit_ticks;
    for _ in 0..budget {
        let tx = echo.tick(driver.next_level());
        let read = !host.rx_empty();
        if read {
            received.push(host.in_data());
        }
        host.tick(Pins {
            rx: tx,
            read,
            ..Pins::default()
        });
        if received.len() == bytes.len() && driver.is_idle() {
            break;
        }
    }

    println!("sent:     {:02x?}", bytes);
    println!("received: {:02x?}", received);
    if received != bytes {
        bail!("echo returned {} of {} bytes intact", count_matching(bytes, &received), bytes.len());
    }
    Ok(())
}

fn count_matching(sent: &[u8], received: &[u8]) -> usize {
    sent.iter().zip(received).filter(|(a, b)| a == b).count()
}

pub fn dump_vcd(config: UartConfig, out_path: &Path, byte: u8) -> Result<()> {
    let mut bench = Loopback::new(config)?;
    bench.enable_trace();
    bench.run(4);
    let received = bench.transfer(byte)?;
    bench.run_until(bench.frame_budget(), |core| core.tx_empty());
    bench.run(4);

    let Some(trace) = bench.take_trace() else {
        bail!("trace was not recorded");
    };
    let file = File::create(out_path)
        .with_context(|| format!("failed to create '{}'", out_path.display()))?;
    let mut out = BufWriter::new(file);
    trace.write_vcd(&mut out, config.system_clock_hz)?;
    println!(
        "Wrote {} clocks of {:#04x} -> {:#04x} to '{}'",
        trace.len(),
        byte,
        received,
        out_path.display()
    );
    Ok(())
}
