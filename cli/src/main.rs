use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use combat_engine::{AdMode, CheckInput, CombatManager, Dice, DiceNotation, check};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod autopilot;

use autopilot::{Policy, load_encounter, read_text_auto};

#[derive(Copy, Clone, ValueEnum)]
enum Adv {
    Normal,
    Advantage,
    Disadvantage,
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll dice notation such as 2d6+3
    Roll {
        #[arg(default_value = "1d20")]
        notation: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        rolls: u32,
        /// Double the dice count (critical damage)
        #[arg(long, default_value_t = false)]
        critical: bool,
    },
    /// Perform a check against a DC using a modifier and (dis)advantage
    Check {
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Advantage mode
        #[arg(long, value_enum, default_value_t = Adv::Normal)]
        adv: Adv,
        /// Difficulty Class to beat (>=)
        #[arg(long)]
        dc: i32,
        /// Modifier to add to the d20
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        modifier: i32,
    },
    /// Auto-play an encounter and print its log
    Encounter {
        /// Encounter JSON file (overrides --builtin)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Built-in encounter id
        #[arg(long, default_value = "goblin_ambush")]
        builtin: String,
        /// RNG seed (defaults to the encounter's own seed)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many rounds
        #[arg(long, default_value_t = 50)]
        max_rounds: u32,
        /// Player-side entities flee at or below this health percentage
        #[arg(long)]
        flee_below: Option<i32>,
        /// Write the final encounter state as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print the summary of a saved encounter as JSON
    Summary {
        /// Saved encounter JSON
        file: PathBuf,
    },
}

#[derive(Parser)]
#[command(name = "combat-cli")]
#[command(about = "Combat engine CLI harness")]
struct Cli {
    /// Emit engine tracing to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn to_mode(a: Adv) -> AdMode {
    match a {
        Adv::Normal => AdMode::Normal,
        Adv::Advantage => AdMode::Advantage,
        Adv::Disadvantage => AdMode::Disadvantage,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "combat_engine=debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Roll {
            notation,
            seed,
            rolls,
            critical,
        } => {
            let parsed: DiceNotation = notation
                .parse()
                .with_context(|| format!("bad dice notation '{}'", notation))?;
            let mut dice = Dice::from_seed(seed);
            for _ in 0..rolls {
                let res = if critical {
                    dice.roll_critical(&parsed)
                } else {
                    dice.roll(&parsed)
                };
                println!("{}: {:?} => {}", res.notation, res.rolls, res.total);
            }
        }
        Cmd::Check {
            seed,
            adv,
            dc,
            modifier,
        } => {
            let mode = to_mode(adv);
            let mut dice = Dice::from_seed(seed);
            let res = check(&mut dice, CheckInput { dc, modifier, mode });
            println!(
                "roll={} mod={} total={} dc={} => {}",
                res.roll,
                modifier,
                res.total,
                res.dc,
                if res.passed { "SUCCESS" } else { "FAIL" }
            );
        }
        Cmd::Encounter {
            file,
            builtin,
            seed,
            max_rounds,
            flee_below,
            save,
        } => {
            let config = load_encounter(file.as_deref(), &builtin)?;
            let seed = seed.unwrap_or(config.seed);
            let policy = Policy {
                flee_below_percent: flee_below,
            };
            let outcome = autopilot::run(&config, seed, max_rounds, policy)?;
            let combat = &outcome.combat;

            println!("== {} (seed {}) ==", config.name, seed);
            for line in combat.log().lines() {
                println!("{}", line);
            }
            if !outcome.finished {
                println!("[STOP] round cap {} reached", max_rounds);
            }
            println!("result: {} after {} rounds", combat.state(), combat.round());
            for e in combat.entities() {
                println!("  {:<12} HP {}", e.id().as_str(), e.health());
            }
            if let Some(path) = save {
                let json = serde_json::to_string_pretty(combat)?;
                fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
        Cmd::Summary { file } => {
            let text = read_text_auto(&file)?;
            let combat: CombatManager = serde_json::from_str(&text)
                .with_context(|| format!("invalid saved encounter: {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&combat.get_summary())?);
        }
    }
    Ok(())
}
