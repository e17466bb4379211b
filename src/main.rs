use anyhow::{Context, Result};
use clap::Parser;
use rustdissonance::runtime::{start, Controller};
use rustdissonance::synth::{Config, SpectrumPreset};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rustdissonance", version, about = "Adaptive-tuning additive synthesizer")]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the dissonance score after every command
    #[arg(long)]
    show_score: bool,
}

/// One line of the stdin control protocol.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Position { slot: usize, position: f32 },
    Release { slot: usize },
    AllOff,
    Root(f32),
    Tuning(f32),
    LowestOctave(i32),
    Spectrum { ratios: Vec<f32>, amplitudes: Vec<f32> },
    Preset(SpectrumPreset),
    Partials(usize),
    Notes(u32),
    Octaves(u32),
    Score,
    Field,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let head = words.next().context("empty command")?;
    let mut arg = || words.next().context("missing argument");

    let command = match head {
        "root" => Command::Root(arg()?.parse()?),
        "tuning" => Command::Tuning(arg()?.parse()?),
        "lowest" => Command::LowestOctave(arg()?.parse()?),
        "preset" => Command::Preset(arg()?.parse()?),
        "partials" => Command::Partials(arg()?.parse()?),
        "notes" => Command::Notes(arg()?.parse()?),
        "octaves" => Command::Octaves(arg()?.parse()?),
        "spectrum" => {
            // spectrum 1,2,3 1,0.5,0.33
            let ratios = parse_list(arg()?)?;
            let amplitudes = parse_list(arg()?)?;
            Command::Spectrum { ratios, amplitudes }
        }
        "off" | "panic" => Command::AllOff,
        "score" => Command::Score,
        "field" => Command::Field,
        "quit" | "exit" => Command::Quit,
        slot => {
            let slot: usize = slot
                .parse()
                .with_context(|| format!("unknown command `{slot}`"))?;
            match arg()? {
                "off" => Command::Release { slot },
                position => Command::Position {
                    slot,
                    position: position.parse()?,
                },
            }
        }
    };
    Ok(command)
}

fn parse_list(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(|v| v.trim().parse::<f32>().with_context(|| format!("bad number `{v}`")))
        .collect()
}

/// Applies a command; returns false when the session should end.
fn apply(controller: &mut Controller, command: Command) -> Result<bool> {
    match command {
        Command::Position { slot, position } => controller.set_voice_position(slot, Some(position))?,
        Command::Release { slot } => controller.release_voice(slot)?,
        Command::AllOff => controller.release_all(),
        Command::Root(root) => controller.set_root(root),
        Command::Tuning(hz) => controller.set_tuning(hz),
        Command::LowestOctave(octave) => controller.set_lowest_octave(octave),
        Command::Spectrum { ratios, amplitudes } => controller.set_spectrum(&ratios, &amplitudes)?,
        Command::Preset(preset) => controller.select_preset(preset)?,
        Command::Partials(n) => controller.set_partial_count(n)?,
        Command::Notes(n) => controller.set_notes_per_octave(n)?,
        Command::Octaves(n) => controller.set_octave_range(n)?,
        Command::Score => println!("{:.6}", controller.current_dissonance_score()),
        Command::Field => {
            let field = controller.dissonance_field();
            let line: Vec<String> = field.iter().map(|v| format!("{v:.3}")).collect();
            println!("{}", line.join(" "));
        }
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let mut runtime = start(&config).context("failed to start audio")?;
    info!("ready; commands: <slot> <position>, <slot> off, off, root, tuning, lowest, preset, partials, notes, octaves, spectrum, score, field, quit");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!("{e:#}");
                continue;
            }
        };
        match apply(&mut runtime.controller, command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => warn!("{e:#}"),
        }
        if args.show_score {
            println!("score {:.6}", runtime.controller.current_dissonance_score());
        }
    }

    runtime.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_voice_commands() {
        assert_eq!(
            parse_command("3 0.25").unwrap(),
            Command::Position { slot: 3, position: 0.25 }
        );
        assert_eq!(parse_command("3 off").unwrap(), Command::Release { slot: 3 });
        assert_eq!(parse_command("off").unwrap(), Command::AllOff);
        assert_eq!(parse_command("panic").unwrap(), Command::AllOff);
    }

    #[test]
    fn parses_settings() {
        assert_eq!(parse_command("root 220").unwrap(), Command::Root(220.0));
        assert_eq!(
            parse_command("preset et").unwrap(),
            Command::Preset(SpectrumPreset::EqualTemperament)
        );
        assert_eq!(
            parse_command("spectrum 1,2 1,0.5").unwrap(),
            Command::Spectrum {
                ratios: vec![1.0, 2.0],
                amplitudes: vec![1.0, 0.5]
            }
        );
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_command("").is_err());
        assert!(parse_command("wobble").is_err());
        assert!(parse_command("root").is_err());
        assert!(parse_command("preset chimes").is_err());
    }
}
