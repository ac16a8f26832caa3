//! Magic Finder - searches or verifies slider magic multipliers.
//!
//! Prints the multipliers as Rust constant arrays, ready to paste over the
//! embedded tables in `chess_engine::movegen::magics`.

use std::process::ExitCode;
use std::time::Instant;

use chess_core::Square;
use chess_engine::movegen::magics::{find_magic, try_magic, Slider, MAX_MAGIC_ATTEMPTS};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SliderChoice {
    Rook,
    Bishop,
    Both,
}

impl SliderChoice {
    fn sliders(self) -> &'static [Slider] {
        match self {
            SliderChoice::Rook => &[Slider::Rook],
            SliderChoice::Bishop => &[Slider::Bishop],
            SliderChoice::Both => &Slider::BOTH,
        }
    }
}

/// Magic Finder - searches for collision-free magic multipliers.
#[derive(Parser)]
#[command(name = "magic-finder")]
#[command(about = "Searches or verifies magic multipliers for slider attack tables")]
struct Args {
    /// Seed for the candidate generator
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Which slider tables to process
    #[arg(long, value_enum, default_value = "both")]
    slider: SliderChoice,

    /// Check the embedded multipliers instead of searching
    #[arg(long)]
    verify: bool,

    /// Candidates tried per square before giving up
    #[arg(long, default_value_t = MAX_MAGIC_ATTEMPTS)]
    max_attempts: u64,
}

fn const_name(slider: Slider) -> &'static str {
    match slider {
        Slider::Rook => "ROOK_MAGICS",
        Slider::Bishop => "BISHOP_MAGICS",
    }
}

/// Lowercase hex in 16-bit groups, matching the embedded tables.
fn format_magic(magic: u64) -> String {
    let groups: Vec<String> = (0..4)
        .rev()
        .map(|i| format!("{:04x}", (magic >> (i * 16)) & 0xffff))
        .collect();
    format!("0x{}", groups.join("_"))
}

fn print_table(slider: Slider, magics: &[u64]) {
    println!("pub const {}: [u64; 64] = [", const_name(slider));
    for row in magics.chunks(4) {
        let cells: Vec<String> = row.iter().map(|&m| format_magic(m)).collect();
        println!("    {},", cells.join(", "));
    }
    println!("];");
}

/// Returns the number of embedded multipliers that collide.
fn verify(slider: Slider) -> usize {
    let mut failures = 0;
    for (sq, &magic) in Square::all().zip(slider.embedded_magics()) {
        match try_magic(slider, sq, magic) {
            Some(entry) => tracing::debug!(%slider, square = %sq, table_len = entry.table_len(), "ok"),
            None => {
                tracing::error!(%slider, square = %sq, "embedded magic {:#018x} collides", magic);
                failures += 1;
            }
        }
    }
    tracing::info!(%slider, failures, "verification finished");
    failures
}

fn search(slider: Slider, rng: &mut StdRng, max_attempts: u64) -> Option<Vec<u64>> {
    let start = Instant::now();
    let mut magics = Vec::with_capacity(64);
    for sq in Square::all() {
        match find_magic(slider, sq, rng, max_attempts) {
            Ok(entry) => magics.push(entry.magic),
            Err(err) => {
                tracing::error!("{}", err);
                return None;
            }
        }
    }
    tracing::info!(%slider, elapsed_ms = start.elapsed().as_millis() as u64, "search finished");
    Some(magics)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if args.verify {
        let failures: usize = args.slider.sliders().iter().map(|&s| verify(s)).sum();
        return if failures == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    tracing::info!(seed = args.seed, max_attempts = args.max_attempts, "searching");
    let mut rng = StdRng::seed_from_u64(args.seed);
    for (i, &slider) in args.slider.sliders().iter().enumerate() {
        let Some(magics) = search(slider, &mut rng, args.max_attempts) else {
            return ExitCode::FAILURE;
        };
        if i > 0 {
            println!();
        }
        print_table(slider, &magics);
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magics_print_like_the_embedded_tables() {
        assert_eq!(format_magic(0x0a80_02c0_0010_8020), "0x0a80_02c0_0010_8020");
        assert_eq!(format_magic(0), "0x0000_0000_0000_0000");
        assert_eq!(format_magic(u64::MAX), "0xffff_ffff_ffff_ffff");
    }
}
