use std::collections::VecDeque;

use bon::bon;
use chrono::{DateTime, Local, TimeDelta};
use itertools::Itertools;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};

use crate::{
    beckn::{self, Message},
    core::{
        datacenter::Datacenter,
        decision::{Action, Decision},
        engine::Engine,
        grid::GridSignal,
        metrics::SystemMetrics,
        workload::{Status, Workload},
    },
    prelude::*,
    quantity::carbon::CarbonIntensity,
    simulation::generator,
};

/// Owns the workload list and applies the engine's decisions to it.
pub struct Simulation {
    rng: StdRng,
    engine: Engine<StdRng>,
    clock: DateTime<Local>,
    tick_step: TimeDelta,
    grid_refresh_ticks: u32,
    n_ticks: u32,
    workloads: Vec<Workload>,
    grid_signal: GridSignal,
    datacenters: Vec<Datacenter>,

    /// Most recent batch first, each batch in the handshake order.
    messages: VecDeque<Message>,
}

#[bon]
impl Simulation {
    pub const MAX_DECISIONS: usize = 50;
    pub const MAX_MESSAGES: usize = 100;

    const COMPLETION_PROBABILITY: f64 = 0.3;
    const RESUME_PROBABILITY: f64 = 0.2;
    const SPAWN_PROBABILITY: f64 = 0.4;

    /// Deferred workloads may resume only on a grid cleaner than this.
    const RESUME_CARBON_INTENSITY: CarbonIntensity = CarbonIntensity(150.0);

    #[builder]
    pub fn new(
        #[builder(default = Local::now())] start: DateTime<Local>,

        // Entropy when unset.
        seed: Option<u64>,

        #[builder(default = 5)] n_initial_workloads: usize,
        #[builder(default = TimeDelta::minutes(1))] tick_step: TimeDelta,

        // Zero disables the refresh.
        #[builder(default = 10)]
        grid_refresh_ticks: u32,
    ) -> Self {
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let engine = Engine::new(StdRng::seed_from_u64(rng.next_u64()));
        let workloads = (0..n_initial_workloads)
            .map(|index| generator::workload(index, start, &mut rng))
            .collect();
        let grid_signal = generator::grid_signal(start, &mut rng);
        let datacenters = generator::datacenters(&mut rng);
        Self {
            rng,
            engine,
            clock: start,
            tick_step,
            grid_refresh_ticks,
            n_ticks: 0,
            workloads,
            grid_signal,
            datacenters,
            messages: VecDeque::with_capacity(Self::MAX_MESSAGES),
        }
    }
}

impl Simulation {
    /// Run one processing step and return the recomputed metrics.
    #[instrument(skip_all, fields(tick = self.n_ticks + 1))]
    pub fn tick(&mut self) -> SystemMetrics {
        self.n_ticks += 1;
        self.clock += self.tick_step;

        if self.n_ticks.is_multiple_of(self.grid_refresh_ticks) {
            self.grid_signal = generator::grid_signal(self.clock, &mut self.rng);
            self.datacenters = generator::datacenters(&mut self.rng);
            debug!(
                price = %self.grid_signal.price,
                carbon_intensity = %self.grid_signal.carbon_intensity,
                "grid signal refreshed",
            );
        }

        self.process_queued();
        self.complete_running();
        self.resume_deferred();

        if self.rng.r#gen::<f64>() < Self::SPAWN_PROBABILITY {
            let workload = generator::workload(self.workloads.len(), self.clock, &mut self.rng);
            info!(name = %workload.name, power = %workload.power, "new workload queued");
            self.workloads.push(workload);
        }

        self.metrics()
    }

    /// Add an externally created workload to the end of the queue.
    #[cfg(test)]
    pub fn submit(&mut self, workload: Workload) {
        self.workloads.push(workload);
    }

    /// Replace the grid snapshot until the next refresh.
    #[cfg(test)]
    pub fn set_grid_signal(&mut self, grid_signal: GridSignal) {
        self.grid_signal = grid_signal;
    }

    pub fn metrics(&self) -> SystemMetrics {
        self.engine.summarize(&self.workloads)
    }

    pub const fn clock(&self) -> DateTime<Local> {
        self.clock
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub const fn grid_signal(&self) -> &GridSignal {
        &self.grid_signal
    }

    pub fn datacenters(&self) -> &[Datacenter] {
        &self.datacenters
    }

    /// Displayed decisions, the most recent first.
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.engine.recent_decisions(Self::MAX_DECISIONS)
    }

    /// Displayed protocol messages, the most recent batch first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub const fn engine(&self) -> &Engine<StdRng> {
        &self.engine
    }

    fn process_queued(&mut self) {
        let Some(workload) =
            self.workloads.iter_mut().find(|workload| workload.status == Status::Queued)
        else {
            return;
        };
        let decision = self.engine.evaluate_at(workload, &self.grid_signal, self.clock);

        if decision.action == Action::Defer {
            workload.status = Status::Deferred;
        } else {
            workload.status = Status::Running;
            workload.scheduled_at = Some(self.clock);
        }
        let event = match decision.action {
            Action::Defer => "deferred",
            Action::Reroute => "rerouted to a lower-carbon region",
            Action::BatteryActivation => "running on battery storage",
            Action::Execute => "started",
        };
        info!(name = %workload.name, reason = %decision.reason, "{event}");

        for message in beckn::messages_for(&decision, self.clock).into_iter().rev() {
            self.messages.push_front(message);
        }
        self.messages.truncate(Self::MAX_MESSAGES);
    }

    fn complete_running(&mut self) {
        let running: Vec<usize> = self
            .workloads
            .iter()
            .positions(|workload| workload.status == Status::Running)
            .collect();
        if running.is_empty() || self.rng.r#gen::<f64>() >= Self::COMPLETION_PROBABILITY {
            return;
        }
        let workload = &mut self.workloads[running[self.rng.gen_range(0..running.len())]];
        workload.status = Status::Completed;
        workload.completed_at = Some(self.clock);
        info!(name = %workload.name, "completed");
    }

    fn resume_deferred(&mut self) {
        if self.grid_signal.carbon_intensity >= Self::RESUME_CARBON_INTENSITY
            || self.rng.r#gen::<f64>() >= Self::RESUME_PROBABILITY
        {
            return;
        }
        if let Some(workload) =
            self.workloads.iter_mut().find(|workload| workload.status == Status::Deferred)
        {
            workload.status = Status::Running;
            workload.scheduled_at = Some(self.clock);
            info!(name = %workload.name, "resumed on a cleaner grid");
        }
    }
}
