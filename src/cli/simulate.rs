use std::time::Duration;

use chrono::TimeDelta;
use clap::Parser;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    prelude::*,
    quantity::time::Minutes,
    simulation::Simulation,
    tables::{
        build_datacenters_table,
        build_decisions_table,
        build_grid_signal_table,
        build_messages_table,
        build_metrics_table,
        build_workloads_table,
    },
};

#[derive(Parser)]
pub struct SimulateArgs {
    /// Number of processing steps.
    #[clap(long, env = "TICKS", default_value = "20")]
    ticks: u32,

    /// Random seed for a reproducible run.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,

    #[clap(long = "initial-workloads", env = "INITIAL_WORKLOADS", default_value = "5")]
    n_initial_workloads: usize,

    /// Simulated time per tick.
    #[clap(long, env = "TICK_STEP", default_value = "1min")]
    tick_step: humantime::Duration,

    /// Regenerate the grid signal every so many ticks, zero to keep the initial one.
    #[clap(long, env = "GRID_REFRESH_TICKS", default_value = "10")]
    grid_refresh_ticks: u32,

    /// Real-time delay between ticks, zero runs as fast as possible.
    #[clap(long, env = "PACE", default_value = "0s")]
    pace: humantime::Duration,

    /// Number of decisions to print.
    #[clap(long = "decisions", env = "DISPLAYED_DECISIONS", default_value = "10")]
    n_decisions: usize,

    /// Number of protocol messages to print.
    #[clap(long = "messages", env = "DISPLAYED_MESSAGES", default_value = "16")]
    n_messages: usize,
}

impl SimulateArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let tick_step = TimeDelta::from_std(self.tick_step.into()).context("tick step is too large")?;
        info!(ticks = self.ticks, tick_step = %Minutes::from(tick_step), "simulating…");

        let mut simulation = Simulation::builder()
            .maybe_seed(self.seed)
            .n_initial_workloads(self.n_initial_workloads)
            .tick_step(tick_step)
            .grid_refresh_ticks(self.grid_refresh_ticks)
            .build();

        let pace: Duration = self.pace.into();
        let mut pacer = (!pace.is_zero()).then(|| {
            let mut pacer = interval(pace);
            pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            pacer
        });
        for _ in 0..self.ticks {
            if let Some(pacer) = &mut pacer {
                pacer.tick().await;
            }
            let metrics = simulation.tick();
            debug!(
                running = metrics.active_workloads,
                deferred = metrics.deferred_workloads,
                saved = %metrics.total_cost_saved,
                "ticked",
            );
        }

        if simulation.engine().is_empty() {
            warn!("no workloads were evaluated");
        }

        println!("{}", build_grid_signal_table(simulation.grid_signal()));
        println!("{}", build_datacenters_table(simulation.datacenters()));
        println!("{}", build_workloads_table(simulation.workloads()));
        println!("{}", build_decisions_table(simulation.decisions().take(self.n_decisions)));
        println!("{}", build_messages_table(simulation.messages().take(self.n_messages)));
        println!("{}", build_metrics_table(&simulation.metrics()));

        info!(n_decisions = simulation.engine().len(), clock = %simulation.clock(), "finished");
        Ok(())
    }
}
