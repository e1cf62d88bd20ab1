use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

use self::{
    assign_houses::AssignHousesArg, augment::AugmentArg, score::ScoreArg, train::TrainArg,
};

mod assign_houses;
mod augment;
mod score;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train village layouts with Q-learning
    Train(#[clap(flatten)] TrainArg),
    /// Score a grid and show the reward breakdown
    Score(#[clap(flatten)] ScoreArg),
    /// Write the distinct rotations and flips of a grid
    Augment(#[clap(flatten)] AugmentArg),
    /// Assign house types to a grid and report profit
    AssignHouses(#[clap(flatten)] AssignHousesArg),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Score(arg) => score::run(&arg)?,
        Mode::Augment(arg) => augment::run(&arg)?,
        Mode::AssignHouses(arg) => assign_houses::run(&arg)?,
    }
    Ok(())
}
