use super::*;

/// 12 MHz / 19200 baud, divider 39.
fn icestick_config() -> UartConfig {
    UartConfig::builder()
        .system_clock_hz(12_000_000)
        .baud_rate(19_200)
        .build()
}

/// Smallest supported divider: 3.6864 MHz / 115200 baud, divider 2.
fn fast_config() -> UartConfig {
    UartConfig::new(3_686_400, 115_200)
}

/// One clock with `tx` tied back into `rx`.
fn loop_tick(core: &mut UartCore, pins: Pins) {
    let rx = core.tx();
    core.tick(pins.with_rx(rx));
}

fn loop_step(core: &mut UartCore) {
    loop_tick(core, Pins::idle());
}

/// Run idle loopback clocks until `done` holds; returns the clocks taken.
fn loop_until(core: &mut UartCore, max: u64, done: impl Fn(&UartCore) -> bool) -> Option<u64> {
    for n in 0..max {
        if done(core) {
            return Some(n);
        }
        loop_step(core);
    }
    None
}

fn frame_budget(core: &UartCore) -> u64 {
    u64::from(core.sysclk_factor()) * 16 * 12
}

#[test]
fn config_divider_matches_icestick_setup() {
    let config = icestick_config();
    assert_eq!(config.sysclk_factor(), Ok(39));
    assert_eq!(config.bit_ticks(), Ok(624));
    assert_eq!(config.frame_ticks(), Ok(6240));
}

#[test]
fn config_defaults_to_icestick_setup() {
    assert_eq!(UartConfig::default(), icestick_config());
}

#[test]
fn config_reports_baud_error() {
    let config = icestick_config();
    // 12e6 / 624 = 19230.77 baud.
    let ppm = config.baud_error_ppm().unwrap();
    assert!(ppm > 1602.0 && ppm < 1603.0, "ppm = {ppm}");
    assert!((config.actual_baud_rate(39) - 19_230.769).abs() < 0.01);
}

#[test]
fn config_rejects_divider_of_one() {
    let config = UartConfig::new(16 * 115_200, 115_200);
    assert_eq!(
        config.sysclk_factor(),
        Err(ConfigError::FactorTooSmall {
            factor: 1,
            system_clock_hz: 16 * 115_200,
            baud_rate: 115_200,
        })
    );
    assert!(UartCore::new(config).is_err());
}

#[test]
fn config_rejects_divider_of_zero() {
    let config = UartConfig::new(1_000_000, 115_200);
    assert!(matches!(
        config.sysclk_factor(),
        Err(ConfigError::FactorTooSmall { factor: 0, .. })
    ));
}

#[test]
fn config_rejects_zero_inputs() {
    assert_eq!(
        UartConfig::new(0, 9600).sysclk_factor(),
        Err(ConfigError::ZeroClock)
    );
    assert_eq!(
        UartConfig::new(12_000_000, 0).sysclk_factor(),
        Err(ConfigError::ZeroBaudRate)
    );
    assert_eq!(
        UartCore::new(UartConfig::new(12_000_000, 0)).err(),
        Some(ConfigError::ZeroBaudRate)
    );
}

#[test]
fn config_divider_does_not_overflow() {
    let config = UartConfig::new(u32::MAX, u32::MAX);
    assert!(matches!(
        config.sysclk_factor(),
        Err(ConfigError::FactorTooSmall { factor: 0, .. })
    ));
    let config = UartConfig::new(u32::MAX, 1);
    assert_eq!(config.sysclk_factor(), Ok(u32::MAX / 16));
    assert!(TimingGen::new(&config).is_ok());
}

#[test]
fn timing_tx_strobe_once_per_bit_period() {
    let mut timing = TimingGen::new(&icestick_config()).unwrap();
    let mut edges = Vec::new();
    for cycle in 0..2000u32 {
        let strobes = timing.tick(true, false);
        assert!(!strobes.rx);
        if strobes.tx {
            edges.push(cycle);
        }
    }
    // Strobes are returned on the clock that computes them.
    assert_eq!(edges, vec![623, 1247, 1871]);
}

#[test]
fn timing_rx_strobe_at_mid_bit() {
    let mut timing = TimingGen::new(&icestick_config()).unwrap();
    let mut edges = Vec::new();
    for cycle in 0..2000u32 {
        let strobes = timing.tick(false, true);
        assert!(!strobes.tx);
        if strobes.rx {
            edges.push(cycle);
        }
    }
    assert_eq!(edges, vec![311, 935, 1559]);
}

#[test]
fn timing_strobe_lasts_one_clock() {
    let mut timing = TimingGen::new(&fast_config()).unwrap();
    let mut previous = false;
    for _ in 0..500 {
        let strobes = timing.tick(true, true);
        assert!(!(previous && strobes.tx));
        previous = strobes.tx;
    }
}

#[test]
fn timing_counters_hold_at_zero_when_inactive() {
    let mut timing = TimingGen::new(&icestick_config()).unwrap();
    for _ in 0..100 {
        timing.tick(true, true);
    }
    assert_eq!(timing.tx_counter(), 100);
    assert_eq!(timing.rx_counter(), 100);

    let strobes = timing.tick(false, false);
    assert_eq!(strobes, Strobes::default());
    assert_eq!(timing.tx_counter(), 0);
    assert_eq!(timing.rx_counter(), 0);

    for _ in 0..5000 {
        assert_eq!(timing.tick(false, false), Strobes::default());
    }
}

#[test]
fn timing_smallest_divider() {
    let mut timing = TimingGen::new(&fast_config()).unwrap();
    assert_eq!(timing.sysclk_factor(), 2);
    let mut tx = Vec::new();
    let mut rx = Vec::new();
    for cycle in 0..64u32 {
        let strobes = timing.tick(true, true);
        if strobes.tx {
            tx.push(cycle);
        }
        if strobes.rx {
            rx.push(cycle);
        }
    }
    assert_eq!(tx, vec![31, 63]);
    assert_eq!(rx, vec![15, 47]);
}

#[test]
fn shift_out_frames_lsb_first() {
    assert_eq!(ShiftOut::frame_for(0x00), 0b10_0000_0000);
    assert_eq!(ShiftOut::frame_for(0xFF), 0b11_1111_1110);
    assert_eq!(ShiftOut::frame_for(0xA5), 0b11_0100_1010);
}

#[test]
fn shift_out_drives_frame_then_idles() {
    let mut tx = ShiftOut::new();
    assert!(tx.tx());
    tx.tick(true, 0b0000_0110, false);
    assert!(!tx.empty());

    let mut line = vec![tx.tx()];
    for _ in 0..10 {
        line.push(tx.tick(false, 0, true));
    }
    // start, d0..d7, stop, then idle
    let expected = [
        false, false, true, true, false, false, false, false, false, true, true,
    ];
    assert_eq!(line, expected);
    assert!(tx.empty());
    assert_eq!(tx.bit_count(), 0);
}

#[test]
fn shift_out_ignores_strobe_when_empty() {
    let mut tx = ShiftOut::new();
    for _ in 0..20 {
        tx.tick(false, 0x00, true);
        assert!(tx.tx());
        assert!(tx.empty());
        assert_eq!(tx.bit_count(), 0);
    }
}

#[test]
fn shift_out_load_and_shift_use_same_snapshot() {
    let mut tx = ShiftOut::new();
    // Empty before the clock, so the strobe has nothing to shift yet.
    tx.tick(true, 0xFF, true);
    assert!(!tx.empty());
    assert_eq!(tx.bit_count(), 0);
    assert!(!tx.tx());
}

#[test]
fn shift_in_synchronizer_delays_edge_two_clocks() {
    let mut rx = ShiftIn::new();
    rx.tick(true, false, false);
    rx.tick(true, false, false);
    assert!(!rx.edge());
    rx.tick(false, false, false);
    assert!(rx.edge());
    assert!(!rx.busy());
    rx.tick(false, false, false);
    assert!(!rx.edge());
    assert!(rx.busy());
}

#[test]
fn shift_in_ignores_low_line_after_reset() {
    // Both synchronizer stages reset low, so a line that starts low is not
    // a falling edge.
    let mut rx = ShiftIn::new();
    for _ in 0..10 {
        rx.tick(false, false, false);
        assert!(!rx.busy());
    }
}

#[test]
fn shift_in_assembles_byte_from_strobed_samples() {
    let byte = 0xC3u8;
    let mut bits = vec![false];
    bits.extend((0..8).map(|i| byte & (1 << i) != 0));
    bits.push(true);

    let mut rx = ShiftIn::new();
    rx.tick(true, false, false);
    rx.tick(true, false, false);
    rx.tick(false, false, false);
    rx.tick(false, false, false);
    assert!(rx.busy());

    for bit in bits {
        // Let the level reach the first synchronizer stage, then sample it.
        rx.tick(bit, false, false);
        rx.tick(bit, false, true);
    }
    assert!(!rx.busy());
    assert!(!rx.empty());
    assert!(!rx.overrun());
    assert_eq!(rx.in_data(), byte);
    assert_eq!(rx.bit_count(), 0);
}

#[test]
fn idle_line_stays_high() {
    let mut core = UartCore::new(icestick_config()).unwrap();
    assert_eq!(core.status(), Status::IDLE);
    for _ in 0..10_000 {
        assert!(core.tx());
        loop_step(&mut core);
    }
    assert_eq!(core.status(), Status::IDLE);
    assert_eq!(core.cycles(), 10_000);
}

#[test]
fn loopback_latency_is_exact() {
    let mut core = UartCore::new(icestick_config()).unwrap();
    let f = u64::from(core.sysclk_factor());

    loop_tick(&mut core, Pins::idle().with_write(0x3C));
    let rx_ready = loop_until(&mut core, 20_000, |core| !core.rx_empty()).unwrap();
    // One clock already spent on the write.
    assert_eq!(rx_ready + 1, 152 * f + 4);
    assert_eq!(core.in_data(), 0x3C);
    assert!(!core.tx_empty());

    let tx_done = loop_until(&mut core, 20_000, |core| core.tx_empty()).unwrap();
    assert_eq!(rx_ready + tx_done + 1, 160 * f + 2);
}

#[test]
fn tx_waveform_matches_frame() {
    let mut core = UartCore::new(icestick_config()).unwrap();
    let f = u64::from(core.sysclk_factor());
    let byte = 0xAAu8;
    let mut expected = vec![false];
    expected.extend((0..8).map(|i| byte & (1 << i) != 0));
    expected.push(true);

    core.tick(Pins::idle().with_write(byte));
    let mut line = Vec::new();
    for cycle in 1..=160 * f {
        if cycle % (16 * f) == 8 * f {
            line.push(core.tx());
        }
        core.tick(Pins::idle());
    }
    assert_eq!(line, expected);
}

#[test]
fn loopback_icestick_0xaa_scenario() {
    let mut core = UartCore::new(icestick_config()).unwrap();
    loop_tick(&mut core, Pins::idle().with_write(0xAA));
    for _ in 1..6240 {
        loop_step(&mut core);
    }
    assert_eq!(core.cycles(), 6240);
    assert!(!core.rx_empty());
    assert_eq!(core.in_data(), 0xAA);
    assert!(!core.status().any_overrun());
}

#[test]
fn loopback_every_byte() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);
    for byte in 0..=255u8 {
        loop_tick(&mut core, Pins::idle().with_write(byte));
        loop_until(&mut core, budget, |core| !core.rx_empty())
            .unwrap_or_else(|| panic!("no byte received for {byte:#04x}"));
        assert_eq!(core.in_data(), byte);
        loop_tick(&mut core, Pins::idle().with_read());
        assert!(core.rx_empty());
        loop_until(&mut core, budget, |core| core.tx_empty()).unwrap();
        assert!(!core.status().any_overrun(), "overrun at {byte:#04x}");
    }
}

#[test]
fn tx_overrun_keeps_frame_in_flight() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);

    loop_tick(&mut core, Pins::idle().with_write(0x55));
    for _ in 0..5 {
        loop_step(&mut core);
    }
    assert!(!core.tx_overrun());
    loop_tick(&mut core, Pins::idle().with_write(0xAA));
    assert!(core.tx_overrun());

    loop_until(&mut core, budget, |core| !core.rx_empty()).unwrap();
    assert_eq!(core.in_data(), 0x55);
    assert!(core.tx_overrun());

    loop_until(&mut core, budget, |core| core.tx_empty()).unwrap();
    assert!(core.tx_overrun());
    loop_tick(&mut core, Pins::idle().with_write(0x12));
    assert!(!core.tx_overrun());
    assert!(!core.tx_empty());
}

#[test]
fn tx_overrun_on_final_shift_still_finishes() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);
    loop_tick(&mut core, Pins::idle().with_write(0x81));
    loop_until(&mut core, budget, |core| {
        core.shift_out().bit_count() == 9 && core.strobes().tx
    })
    .unwrap();
    loop_tick(&mut core, Pins::idle().with_write(0x7E));
    assert!(core.tx_empty());
    assert!(core.tx_overrun());
    assert!(core.tx());
}

#[test]
fn rx_overrun_last_writer_wins() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);

    loop_tick(&mut core, Pins::idle().with_write(0x55));
    loop_until(&mut core, budget, |core| !core.rx_empty()).unwrap();
    loop_until(&mut core, budget, |core| core.tx_empty()).unwrap();

    loop_tick(&mut core, Pins::idle().with_write(0xAA));
    for _ in 0..budget {
        assert!(!core.rx_empty());
        if core.rx_overrun() {
            break;
        }
        assert_eq!(core.in_data(), 0x55);
        loop_step(&mut core);
    }
    assert!(core.rx_overrun());
    assert!(!core.rx_empty());
    assert_eq!(core.in_data(), 0xAA);

    loop_tick(&mut core, Pins::idle().with_read());
    assert!(!core.rx_overrun());
    assert!(core.rx_empty());
}

#[test]
fn rx_read_while_frame_completes_over_pending_byte() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);

    loop_tick(&mut core, Pins::idle().with_write(0x11));
    loop_until(&mut core, budget, |core| core.tx_empty()).unwrap();
    assert!(!core.rx_empty());

    loop_tick(&mut core, Pins::idle().with_write(0x22));
    loop_until(&mut core, budget, |core| {
        core.rx_busy() && core.shift_in().bit_count() == 9 && core.strobes().rx
    })
    .unwrap();
    loop_tick(&mut core, Pins::idle().with_read());
    // The read clears `empty`; the completion still flags the lost byte.
    assert!(core.rx_empty());
    assert!(core.rx_overrun());
    assert_eq!(core.in_data(), 0x22);
}

#[test]
fn rx_read_while_frame_completes_with_nothing_pending() {
    let mut core = UartCore::new(fast_config()).unwrap();
    let budget = frame_budget(&core);

    loop_tick(&mut core, Pins::idle().with_write(0x33));
    loop_until(&mut core, budget, |core| {
        core.rx_busy() && core.shift_in().bit_count() == 9 && core.strobes().rx
    })
    .unwrap();
    loop_tick(&mut core, Pins::idle().with_read());
    assert!(!core.rx_empty());
    assert!(!core.rx_overrun());
    assert_eq!(core.in_data(), 0x33);
}

#[test]
fn status_tracks_busy_receiver() {
    let mut core = UartCore::new(fast_config()).unwrap();
    loop_tick(&mut core, Pins::idle().with_write(0x00));
    assert_eq!(core.status(), Status::RX_EMPTY);
    loop_until(&mut core, 100, |core| core.rx_busy()).unwrap();
    assert_eq!(core.status(), Status::RX_EMPTY | Status::RX_BUSY);
}

#[test]
fn reset_restores_power_on_state() {
    let mut core = UartCore::new(fast_config()).unwrap();
    loop_tick(&mut core, Pins::idle().with_write(0x5A));
    for _ in 0..100 {
        loop_step(&mut core);
    }
    assert_ne!(core.status(), Status::IDLE);
    core.reset();
    assert_eq!(core.status(), Status::IDLE);
    assert_eq!(core.cycles(), 0);
    assert_eq!(core.timing().tx_counter(), 0);
    assert_eq!(core.sysclk_factor(), 2);
    assert!(core.tx());
}
