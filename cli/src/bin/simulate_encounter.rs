use clap::Parser;
use combat_engine::CombatState;
use std::path::PathBuf;

#[path = "../autopilot.rs"]
mod autopilot;

use autopilot::{Policy, load_encounter};

#[derive(Parser)]
#[command(name = "simulate-encounter")]
#[command(about = "Monte Carlo sim: replay one encounter under many seeds")]
struct Args {
    /// Encounter JSON file (overrides --builtin)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Built-in encounter id
    #[arg(long, default_value = "goblin_ambush")]
    builtin: String,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Safety cap on rounds per trial
    #[arg(long, default_value_t = 50)]
    max_rounds: u32,

    /// Player-side entities flee at or below this health percentage
    #[arg(long)]
    flee_below: Option<i32>,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

#[derive(Default)]
struct Tally {
    victories: u32,
    defeats: u32,
    fled: u32,
    unfinished: u32,
    rounds: Vec<u32>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_encounter(args.file.as_deref(), &args.builtin)?;
    let policy = Policy {
        flee_below_percent: args.flee_below,
    };

    let mut tally = Tally::default();
    for i in 0..args.trials {
        let seed = args.seed.wrapping_add(u64::from(i));
        let outcome = autopilot::run(&config, seed, args.max_rounds, policy)?;
        let combat = &outcome.combat;
        match combat.state() {
            CombatState::PlayerVictory => tally.victories += 1,
            CombatState::PlayerDefeat => tally.defeats += 1,
            CombatState::Fled => tally.fled += 1,
            _ => tally.unfinished += 1,
        }
        if outcome.finished {
            tally.rounds.push(combat.round());
        }
    }

    tally.rounds.sort_unstable();
    let trials = args.trials.max(1) as f64;
    let rate = |n: u32| n as f64 / trials * 100.0;
    let avg_rounds = if tally.rounds.is_empty() {
        0.0
    } else {
        tally.rounds.iter().map(|r| *r as f64).sum::<f64>() / tally.rounds.len() as f64
    };
    let median_rounds = if tally.rounds.is_empty() {
        0
    } else {
        tally.rounds[tally.rounds.len() / 2]
    };

    println!("simulate-encounter results");
    println!("--------------------------");
    println!("encounter:          {}", config.name);
    println!("trials:             {}", args.trials);
    println!("participants:       {}", config.participants.len());
    println!();
    println!("victory rate:       {:.1}%", rate(tally.victories));
    println!("defeat rate:        {:.1}%", rate(tally.defeats));
    println!("fled rate:          {:.1}%", rate(tally.fled));
    println!("unfinished:         {}", tally.unfinished);
    println!("avg rounds:         {:.2}", avg_rounds);
    println!("median rounds:      {}", median_rounds);
    Ok(())
}
