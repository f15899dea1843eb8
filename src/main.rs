use std::path::PathBuf;

use anyhow::Context;
use chip8::Chip8;
use clap::Parser;
use log::info;

/// Run a ROM without a window and print the machine state afterwards
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(value_name = "PATH", help = "ROM to load", value_hint = clap::ValueHint::FilePath)]
    rom: PathBuf,
    #[arg(short, long, default_value_t = 60, help = "Number of 60 Hz ticks to run")]
    ticks: usize,
    #[arg(long, default_value_t = chip8::DEFAULT_OPS_PER_CYCLE, help = "Instructions per tick")]
    ops_per_cycle: usize,
    #[arg(long, help = "Shift V[y] instead of V[x] (COSMAC VIP behaviour)")]
    legacy_shift: bool,
    #[arg(long, help = "Seed for the random number instruction")]
    seed: Option<u64>,
    #[arg(long, help = "Hold these keypad keys (0-F) for the whole run", value_parser = parse_key)]
    hold: Vec<i32>,
    #[arg(long, help = "Print the screen after the run")]
    screen: bool,
    #[arg(long, help = "Dump registers and memory after the run")]
    dump: bool,
}

fn parse_key(value: &str) -> Result<i32, String> {
    i32::from_str_radix(value, 16)
        .ok()
        .filter(|key| (0..=0xF).contains(key))
        .ok_or_else(|| format!("'{}' is not a keypad key", value))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut chip8 = Chip8::new()
        .ops_per_cycle(args.ops_per_cycle)
        .legacy_shift(args.legacy_shift);
    if let Some(seed) = args.seed {
        chip8 = chip8.rng_seed(seed);
    }

    chip8.load_rom_from_file(&args.rom)?;

    for key in &args.hold {
        chip8.set_key_down(*key);
    }

    let mut beeping_ticks = 0;
    for tick in 0..args.ticks {
        chip8
            .tick()
            .with_context(|| format!("machine halted on tick {}", tick))?;
        if chip8.is_sound_playing() {
            beeping_ticks += 1;
        }
    }
    info!(
        "ran {} ticks, tone active for {} of them",
        args.ticks, beeping_ticks
    );

    if args.screen {
        print!("{}", chip8.screen());
    }
    if args.dump {
        println!("{}", chip8);
    }

    Ok(())
}
