use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::StructureFormat;
use commands::{compare, info};

#[derive(Parser, Debug)]
#[command(
    name = "resmatch",
    about = "Pairs residues of two superposed structures by representative-atom distance and partitions them into aligned and unaligned sets.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Force the input format (pdb or mmcif).
    #[arg(long = "format", value_enum, global = true)]
    input_format: Option<StructureFormat>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match residues between a reference and a target structure.
    Compare(compare::CompareArgs),
    /// Report chains, residues and representative atoms of a structure.
    Info(info::InfoArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Compare(args) => compare::run(args, cli.input_format)?,
        Command::Info(args) => info::run(args, cli.input_format)?,
    }

    Ok(())
}
