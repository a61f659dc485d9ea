use tinyuart::Command;
use tinyuart_core::UartConfig;

const USAGE: &str = "\
Usage: tinyuart <command> [options]

Commands:
  info                     print divider and timing for the configuration
  loopback [bytes...]      send bytes through a tx->rx loopback
  stress [count] [seed]    send random bytes through a loopback
  echo [bytes...]          send bytes to an echo device and read them back
  vcd <out_path> [byte]    dump a loopback transfer as a VCD waveform

Options:
  --clock <hz>             system clock (default 12000000)
  --baud <rate>            baud rate (default 19200)";

fn parse_number<T: TryFrom<u64>>(text: &str, what: &str) -> T {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed
        .ok()
        .and_then(|value| T::try_from(value).ok())
        .unwrap_or_else(|| {
            eprintln!("Invalid {what} '{text}'.");
            std::process::exit(2);
        })
}

fn main() {
    env_logger::init();

    let mut config = UartConfig::default();
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--clock" | "--baud" => {
                let Some(value) = args.next() else {
                    eprintln!("Missing value for {arg}.\n\n{USAGE}");
                    std::process::exit(2);
                };
                if arg == "--clock" {
                    config.system_clock_hz = parse_number(&value, "clock");
                } else {
                    config.baud_rate = parse_number(&value, "baud rate");
                }
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().unwrap_or_else(|| "loopback".to_string());
    let rest: Vec<String> = positional.collect();
    let bytes = |default: &[u8]| -> Vec<u8> {
        if rest.is_empty() {
            default.to_vec()
        } else {
            rest.iter().map(|b| parse_number(b, "byte")).collect()
        }
    };

    let command = match name.as_str() {
        "info" => Command::Info,
        "loopback" => Command::Loopback {
            bytes: bytes(&[0x55, 0xAA]),
        },
        "stress" => Command::Stress {
            count: rest.first().map_or(1000, |c| parse_number(c, "count")),
            seed: rest.get(1).map_or(0, |s| parse_number(s, "seed")),
        },
        "echo" => Command::Echo {
            bytes: bytes(b"tinyuart"),
        },
        "vcd" => {
            let Some(out_path) = rest.first().cloned() else {
                eprintln!("Missing output path.\n\n{USAGE}");
                std::process::exit(2);
            };
            Command::Vcd {
                out_path,
                byte: rest.get(1).map_or(0xAA, |b| parse_number(b, "byte")),
            }
        }
        other => {
            eprintln!("Unknown command '{other}'.\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    log::info!(
        "Running '{}' at {} Hz / {} baud",
        name,
        config.system_clock_hz,
        config.baud_rate
    );
    if let Err(err) = tinyuart::run(command, config) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
