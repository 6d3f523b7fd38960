mod evaluate;
mod relay;
mod simulate;

use clap::{Parser, Subcommand};

use crate::cli::{evaluate::EvaluateArgs, relay::RelayArgs, simulate::SimulateArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the mock datacenter and print the resulting dashboard.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Evaluate a single workload against the given grid conditions.
    #[clap(name = "evaluate")]
    Evaluate(Box<EvaluateArgs>),

    /// Fetch the external analytics endpoint and print the response envelope.
    #[clap(name = "relay")]
    Relay(RelayArgs),
}

impl Command {
    pub async fn run(self) -> crate::prelude::Result {
        match self {
            Self::Simulate(args) => args.run().await,
            Self::Evaluate(args) => args.run(),
            Self::Relay(args) => args.run().await,
        }
    }
}
