//! footwork CLI: plays a chart headlessly and prints the results.
//!
//! Usage:
//!   fw-cli path/to/chart.json
//!   fw-cli path/to/chart.json --replay inputs.json --judge judge.json
//!   fw-cli path/to/chart.json --players 2 --realtime -vv

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fw_master::{
    autoplay, read_chart, read_inputs, read_judge_config, Band, InputCommand, JudgeConfig,
    ManualClock, Results, Session, SongClock, StdClock,
};

/// Seconds of song time simulated before the chart starts.
const LEAD_IN: f64 = 1.0;

#[derive(Parser, Debug)]
#[command(name = "fw-cli", about = "Play a dance chart headlessly and report the judgement")]
struct Args {
    /// Chart JSON file.
    chart: PathBuf,

    /// Judge table JSON file. Missing fields use the defaults.
    #[arg(long)]
    judge: Option<PathBuf>,

    /// Input replay JSON file. Without one the chart is autoplayed.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Frame rate of the simulated clock in Hz.
    #[arg(long, default_value = "120")]
    rate: f64,

    /// Number of players fed the same inputs.
    #[arg(long, default_value = "1")]
    players: usize,

    /// Pace frames against the wall clock.
    #[arg(long)]
    realtime: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let _ = env_logger::builder().filter_level(log::LevelFilter::Trace).try_init();
    log::set_max_level(match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });

    if let Err(e) = run(&args) {
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.rate.is_nan() || args.rate <= 0.0 {
        return Err(format!("frame rate must be positive, got {}", args.rate).into());
    }

    let chart = read_chart(&args.chart)?;
    let config = match &args.judge {
        Some(path) => read_judge_config(path)?,
        None => JudgeConfig::default(),
    };
    let inputs = match &args.replay {
        Some(path) => read_inputs(path)?,
        None => autoplay(&chart, &config),
    };

    println!("Title:   {}", chart.title);
    println!("Meter:   {}", chart.meter);
    println!("Steps:   {}", chart.steps.len());
    println!("Length:  {:.2}s", chart.end_time());
    let source = if args.replay.is_some() { "replay" } else { "autoplay" };
    println!("Inputs:  {} ({})", inputs.len(), source);
    println!();

    let mut session = Session::new(chart, config, args.players)?;
    if args.realtime {
        play_realtime(&mut session, &inputs, args.rate)?;
    } else {
        play_simulated(&mut session, &inputs, args.rate)?;
    }

    for (player, results) in session.results().iter().enumerate() {
        if session.players() > 1 {
            println!("Player {}", player + 1);
        }
        print_results(results);
    }
    Ok(())
}

fn play_simulated(
    session: &mut Session,
    inputs: &[InputCommand],
    rate: f64,
) -> Result<(), Box<dyn Error>> {
    let mut clock = ManualClock::new(-LEAD_IN);
    let mut next = 0;
    let mut frames = 0u64;

    while !session.is_finished() {
        frames += 1;
        clock.set(-LEAD_IN + frames as f64 / rate);
        frame(session, &clock, inputs, &mut next)?;
    }
    log::debug!("simulated {frames} frames");
    Ok(())
}

fn play_realtime(
    session: &mut Session,
    inputs: &[InputCommand],
    rate: f64,
) -> Result<(), Box<dyn Error>> {
    let mut clock = StdClock::new(LEAD_IN);
    let mut next = 0;
    let period = Duration::from_secs_f64(1.0 / rate);

    clock.start();
    println!("Playing...");
    while !session.is_finished() {
        frame(session, &clock, inputs, &mut next)?;
        if let Some(engine) = session.engine(0) {
            print!("\rTime: {:7.2}s | Combo: {:4}", clock.time(), engine.combo().current);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(period);
    }
    println!("\rDone.                          ");
    println!();
    Ok(())
}

/// Queue every input due by the clock's time to all players, then advance.
fn frame<C: SongClock>(
    session: &mut Session,
    clock: &C,
    inputs: &[InputCommand],
    next: &mut usize,
) -> Result<(), Box<dyn Error>> {
    let now = clock.time();
    while let Some(command) = inputs.get(*next).filter(|c| c.time <= now) {
        for player in 0..session.players() {
            session.push_input(player, *command)?;
        }
        *next += 1;
    }

    session.frame(clock);
    for (player, event) in session.events() {
        log::debug!("p{}: {:?}", player + 1, event);
    }
    Ok(())
}

fn print_results(results: &Results) {
    for band in Band::COUNTED {
        println!("  {:<6} {:>5}", format!("{band:?}"), results.count(band));
    }
    println!("  Held   {:>5}", results.held);
    println!("  Combo  {:>5}", results.max_combo);
    println!("  Score  {:>9}", results.score);
    println!("  Points {:>5}", results.points);
    println!("  Life   {:>5}", results.life);
    println!("  Grade  {:?}", results.grade);
    println!();
}
