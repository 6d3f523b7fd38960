use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{
        decision::Decision,
        engine::FLEXIBILITY_PAYMENT,
        workload::{Status, Workload},
    },
    quantity::{carbon::Kilograms, currency::Pounds, power::Kilowatts},
};

/// Dashboard summary, recomputed from scratch on every call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SystemMetrics {
    pub total_workloads: usize,
    pub active_workloads: usize,
    pub deferred_workloads: usize,
    pub completed_workloads: usize,

    /// Across the whole decision history, not just the current workloads.
    pub total_cost_saved: Pounds,

    /// Across the whole decision history, not just the current workloads.
    pub total_carbon_reduced: Kilograms,

    /// P415 flexibility revenue estimate.
    pub flexibility_revenue: Pounds,

    /// Drawn by the running workloads.
    pub current_power_draw: Kilowatts,

    /// Display heuristic, not a cost-accounting identity.
    pub average_cost_per_inference: Pounds,
}

impl SystemMetrics {
    const BASELINE_COST_PER_INFERENCE: Pounds = Pounds(100.0);

    #[expect(clippy::cast_precision_loss)]
    pub fn collect(workloads: &[Workload], decisions: &[Decision]) -> Self {
        let counts = workloads.iter().counts_by(|workload| workload.status);
        let count = |status| counts.get(&status).copied().unwrap_or_default();

        let total_workloads = workloads.len();
        let deferred_workloads = count(Status::Deferred);
        let total_cost_saved: Pounds =
            decisions.iter().map(|decision| decision.expected_savings.cost).sum();
        let total_carbon_reduced: Kilograms =
            decisions.iter().map(|decision| decision.expected_savings.carbon).sum();

        // Half of the flexibility payment per deferred workload:
        let flexibility_revenue = Pounds(deferred_workloads as f64 * FLEXIBILITY_PAYMENT.0 * 0.5);

        let current_power_draw = workloads
            .iter()
            .filter(|workload| workload.status == Status::Running)
            .map(|workload| workload.power)
            .sum();

        // With positive savings and no workloads this is `-inf`, and is reported as such:
        let average_cost_per_inference = if total_cost_saved > Pounds::ZERO {
            Self::BASELINE_COST_PER_INFERENCE
                - Pounds(total_cost_saved.0 / (total_workloads as f64 * 10.0))
        } else {
            Self::BASELINE_COST_PER_INFERENCE
        };

        Self {
            total_workloads,
            active_workloads: count(Status::Running),
            deferred_workloads,
            completed_workloads: count(Status::Completed),
            total_cost_saved,
            total_carbon_reduced,
            flexibility_revenue,
            current_power_draw,
            average_cost_per_inference,
        }
    }
}
