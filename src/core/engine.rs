use chrono::{DateTime, Local};
use rand::Rng;

use crate::{
    core::{
        decision::{Action, Beckn, Decision, Payload, Savings, Stage},
        grid::GridSignal,
        metrics::SystemMetrics,
        workload::{Priority, Workload},
    },
    prelude::*,
    quantity::{
        carbon::{CarbonIntensity, Grams},
        currency::Pounds,
        energy::MegawattHours,
        price::MegawattHourPrice,
        ratios::Percentage,
    },
};

pub const CARBON_CAP: CarbonIntensity = CarbonIntensity(200.0);
pub const TARGET_COST_THRESHOLD: MegawattHourPrice = MegawattHourPrice(100.0);

/// Paid for each megawatt-hour of deferred demand (P415 participation).
pub const FLEXIBILITY_PAYMENT: MegawattHourPrice = MegawattHourPrice(25.0);

const LOW_CARBON: CarbonIntensity = CarbonIntensity(100.0);
const HIGH_RENEWABLES: Percentage = Percentage(60.0);

/// Draws above this reroute instead of deferring on a carbon breach.
const REROUTE_THRESHOLD: f64 = 0.7;

/// Draws above this activate the battery instead of deferring on a price breach.
const BATTERY_THRESHOLD: f64 = 0.65;

/// Threshold-based decision engine with an append-only decision history.
///
/// The history is unbounded: callers window it for display.
pub struct Engine<R> {
    rng: R,
    history: Vec<Decision>,
}

impl<R: Rng> Engine<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng, history: Vec::new() }
    }

    /// Evaluate the workload and timestamp the decision with the current time.
    pub fn evaluate(&mut self, workload: &Workload, signal: &GridSignal) -> Decision {
        self.evaluate_at(workload, signal, Local::now())
    }

    /// Classify the workload against the grid snapshot and record the decision.
    ///
    /// No input validation happens here: nonsensical inputs produce nonsensical, yet clamped,
    /// savings.
    #[instrument(skip_all, fields(workload_id = %workload.id))]
    pub fn evaluate_at(
        &mut self,
        workload: &Workload,
        signal: &GridSignal,
        at: DateTime<Local>,
    ) -> Decision {
        // Drawn unconditionally, so that the stream advances the same way on every call:
        let choice: f64 = self.rng.r#gen();
        let id = format!("dec_{}_{}", at.timestamp_millis(), base36_suffix(self.rng.next_u64()));

        let carbon_intensity = signal.carbon_intensity;
        let price = signal.price;
        let forecast = signal.forecast.next_4_hours;

        let (action, reason, savings, stage) =
            if carbon_intensity > CARBON_CAP && workload.is_flexible() {
                let (action, reason) = if choice > REROUTE_THRESHOLD {
                    (
                        Action::Reroute,
                        format!(
                            "Carbon intensity ({:.0} gCO2/kWh) exceeds cap. Rerouting to lower-carbon region.",
                            carbon_intensity.0,
                        ),
                    )
                } else {
                    (
                        Action::Defer,
                        format!(
                            "Carbon intensity ({:.0} gCO2/kWh) exceeds cap of {:.0} gCO2/kWh. Deferring until cleaner energy available.",
                            carbon_intensity.0, CARBON_CAP.0,
                        ),
                    )
                };
                let energy = workload.energy();
                let carbon_reduction: Grams = carbon_intensity * energy - forecast.carbon * energy;
                let savings =
                    Savings::clamped(Self::cost_savings(workload, signal), carbon_reduction);
                (action, reason, savings, Stage::Select)
            } else if price > TARGET_COST_THRESHOLD
                && workload.is_flexible()
                && workload.priority != Priority::High
            {
                let (action, reason) = if choice > BATTERY_THRESHOLD {
                    (
                        Action::BatteryActivation,
                        format!(
                            "High energy price (£{:.2}/MWh). Activating battery storage to offset grid demand.",
                            price.0,
                        ),
                    )
                } else {
                    (
                        Action::Defer,
                        format!(
                            "Energy price (£{:.2}/MWh) above target threshold. Deferring to optimize cost.",
                            price.0,
                        ),
                    )
                };
                let savings = Savings::clamped(Self::cost_savings(workload, signal), Grams::ZERO);
                (action, reason, savings, Stage::Select)
            } else if carbon_intensity < LOW_CARBON && signal.renewable_mix > HIGH_RENEWABLES {
                let reason = format!(
                    "Optimal conditions: Low carbon ({:.0} gCO2/kWh), high renewables ({:.0}%). Executing immediately.",
                    carbon_intensity.0, signal.renewable_mix.0,
                );
                (Action::Execute, reason, Savings::NONE, Stage::Confirm)
            } else {
                let reason = format!(
                    "Standard execution: Carbon within limits, acceptable price (£{:.2}/MWh).",
                    price.0,
                );
                (Action::Execute, reason, Savings::NONE, Stage::Confirm)
            };

        debug!(%action, %stage, cost = %savings.cost, carbon = %savings.carbon, "decided");
        let decision = Decision {
            id,
            timestamp: at,
            workload_id: workload.id.clone(),
            action,
            reason,
            expected_savings: savings,
            beckn: Beckn { stage, payload: Payload::from(workload) },
        };
        self.history.push(decision.clone());
        decision
    }

    /// Price delta against the 4-hour forecast plus the flexibility payment.
    fn cost_savings(workload: &Workload, signal: &GridSignal) -> Pounds {
        let energy = MegawattHours::from(workload.energy());
        (signal.price - signal.forecast.next_4_hours.price) * energy + FLEXIBILITY_PAYMENT * energy
    }
}

impl<R> Engine<R> {
    /// Up to `limit` decisions, the most recent first.
    pub fn recent_decisions(&self, limit: usize) -> impl Iterator<Item = &Decision> {
        self.history.iter().rev().take(limit)
    }

    /// All decisions in the order they were made.
    pub fn history(&self) -> &[Decision] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Fold the workloads and the whole decision history into a metrics snapshot.
    pub fn summarize(&self, workloads: &[Workload]) -> SystemMetrics {
        SystemMetrics::collect(workloads, self.history())
    }
}

/// Nine lower-case base-36 digits.
fn base36_suffix(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..9)
        .map(|_| {
            let digit = DIGITS[(value % 36) as usize];
            value /= 36;
            char::from(digit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::{
        SeedableRng,
        rngs::{StdRng, mock::StepRng},
    };

    use super::*;
    use crate::{
        core::grid::{Forecast, ForecastPoint},
        quantity::{
            carbon::Kilograms,
            power::Kilowatts,
            time::{Hours, Minutes},
        },
    };

    /// Every uniform draw is `0.0`.
    fn low_draws() -> Engine<StepRng> {
        Engine::new(StepRng::new(0, 0))
    }

    /// Every uniform draw is just below `1.0`.
    fn high_draws() -> Engine<StepRng> {
        Engine::new(StepRng::new(u64::MAX, 0))
    }

    fn workload(flexibility: f64, priority: Priority) -> Workload {
        Workload::builder()
            .id("wl_1")
            .name("GPT-4 Training Batch #1")
            .power(Kilowatts(300.0))
            .duration(Minutes(60.0))
            .flexibility(Hours(flexibility))
            .priority(priority)
            .created_at(Local::now())
            .build()
    }

    fn signal(price: f64, carbon: f64, renewable_mix: f64) -> GridSignal {
        GridSignal::builder()
            .price(MegawattHourPrice(price))
            .carbon_intensity(CarbonIntensity(carbon))
            .renewable_mix(Percentage(renewable_mix))
            .grid_load(Percentage(65.0))
            .forecast(Forecast {
                next_hour: ForecastPoint {
                    price: MegawattHourPrice(price),
                    carbon: CarbonIntensity(carbon),
                },
                next_4_hours: ForecastPoint {
                    price: MegawattHourPrice(70.0),
                    carbon: CarbonIntensity(150.0),
                },
            })
            .build()
    }

    #[test]
    fn test_carbon_breach_defers() {
        let mut engine = low_draws();
        let decision = engine.evaluate(&workload(2.0, Priority::Low), &signal(90.0, 250.0, 40.0));
        assert_eq!(decision.action, Action::Defer);
        assert_eq!(decision.beckn.stage, Stage::Select);
        assert_abs_diff_eq!(decision.expected_savings.cost.0, 13.5, epsilon = 1e-9);
        assert_abs_diff_eq!(decision.expected_savings.carbon.0, 30.0, epsilon = 1e-9);
        assert!(decision.reason.contains("exceeds cap of 200 gCO2/kWh"));
    }

    #[test]
    fn test_carbon_breach_reroutes() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(2.0, Priority::Low), &signal(90.0, 250.0, 40.0));
        assert_eq!(decision.action, Action::Reroute);
        assert_abs_diff_eq!(decision.expected_savings.cost.0, 13.5, epsilon = 1e-9);
        assert!(decision.reason.starts_with("Carbon intensity (250 gCO2/kWh) exceeds cap."));
    }

    #[test]
    fn test_carbon_breach_never_reports_losses() {
        let mut engine = low_draws();
        let mut signal = signal(50.0, 210.0, 40.0);
        signal.forecast.next_4_hours =
            ForecastPoint { price: MegawattHourPrice(200.0), carbon: CarbonIntensity(400.0) };
        let decision = engine.evaluate(&workload(1.0, Priority::High), &signal);
        assert_eq!(decision.action, Action::Defer);
        assert_eq!(decision.expected_savings, Savings::NONE);
    }

    #[test]
    fn test_inflexible_workload_executes_despite_carbon() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(0.0, Priority::Low), &signal(90.0, 250.0, 40.0));
        assert_eq!(decision.action, Action::Execute);
        assert_eq!(decision.beckn.stage, Stage::Confirm);
        assert!(decision.reason.starts_with("Standard execution"));
    }

    #[test]
    fn test_price_breach_defers() {
        let mut engine = low_draws();
        let decision = engine.evaluate(&workload(4.0, Priority::Medium), &signal(130.0, 180.0, 40.0));
        assert_eq!(decision.action, Action::Defer);
        assert_eq!(decision.beckn.stage, Stage::Select);
        // (130 - 70) × 0.3 + 25 × 0.3:
        assert_abs_diff_eq!(decision.expected_savings.cost.0, 25.5, epsilon = 1e-9);
        assert_abs_diff_eq!(decision.expected_savings.carbon.0, 0.0);
    }

    #[test]
    fn test_price_breach_activates_battery() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(4.0, Priority::Low), &signal(130.0, 180.0, 40.0));
        assert_eq!(decision.action, Action::BatteryActivation);
        assert!(decision.reason.contains("£130.00/MWh"));
    }

    #[test]
    fn test_price_breach_ignored_for_high_priority() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(4.0, Priority::High), &signal(130.0, 180.0, 40.0));
        assert_eq!(decision.action, Action::Execute);
        assert_eq!(decision.expected_savings, Savings::NONE);
    }

    #[test]
    fn test_optimal_conditions() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(3.0, Priority::Low), &signal(130.0, 90.0, 70.0));
        // The price breach wins over the optimal conditions:
        assert_eq!(decision.action, Action::BatteryActivation);

        let decision = engine.evaluate(&workload(0.0, Priority::Low), &signal(130.0, 90.0, 70.0));
        assert_eq!(decision.action, Action::Execute);
        assert_eq!(decision.beckn.stage, Stage::Confirm);
        assert_eq!(decision.expected_savings, Savings::NONE);
        assert!(decision.reason.starts_with(
            "Optimal conditions: Low carbon (90 gCO2/kWh), high renewables (70%)"
        ));
    }

    #[test]
    fn test_low_carbon_grid_always_executes() {
        let mut engine = Engine::new(StepRng::new(1, 0x9E37_79B9_7F4A_7C15));
        for flexibility in [0.0, 1.0, 8.0] {
            for priority in [Priority::High, Priority::Medium, Priority::Low] {
                let decision =
                    engine.evaluate(&workload(flexibility, priority), &signal(60.0, 95.0, 61.0));
                assert_eq!(decision.action, Action::Execute);
                assert_eq!(decision.beckn.stage, Stage::Confirm);
                assert_eq!(decision.expected_savings, Savings::NONE);
            }
        }
    }

    #[test]
    fn test_carbon_at_cap_executes() {
        let mut engine = high_draws();
        let decision = engine.evaluate(&workload(2.0, Priority::Low), &signal(90.0, 200.0, 40.0));
        assert_eq!(decision.action, Action::Execute);
        assert_eq!(decision.beckn.stage, Stage::Confirm);
        assert_eq!(decision.expected_savings, Savings::NONE);
    }

    #[test]
    fn test_price_at_threshold_executes() {
        let mut engine = low_draws();
        let decision = engine.evaluate(&workload(4.0, Priority::Low), &signal(100.0, 150.0, 40.0));
        assert_eq!(decision.action, Action::Execute);
        assert_eq!(decision.beckn.stage, Stage::Confirm);
        assert!(decision.reason.starts_with("Standard execution"));
    }

    #[test]
    fn test_renewables_at_threshold_are_not_optimal() {
        let mut engine = low_draws();
        let decision = engine.evaluate(&workload(0.0, Priority::Low), &signal(60.0, 99.0, 60.0));
        assert_eq!(decision.action, Action::Execute);
        assert!(decision.reason.starts_with("Standard execution"));

        let decision = engine.evaluate(&workload(0.0, Priority::Low), &signal(60.0, 100.0, 61.0));
        assert!(decision.reason.starts_with("Standard execution"));
    }

    #[test]
    fn test_dirty_grid_always_defers_or_reroutes() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut engine = Engine::new(StdRng::seed_from_u64(43));
        let priorities = [Priority::High, Priority::Medium, Priority::Low];
        for _ in 0..500 {
            let price = rng.gen_range(0.0..300.0);
            let carbon_intensity = rng.gen_range(200.001..500.0);
            let mut signal = signal(price, carbon_intensity, rng.gen_range(0.0..100.0));
            signal.forecast.next_4_hours = ForecastPoint {
                price: MegawattHourPrice(rng.gen_range(0.0..300.0)),
                carbon: CarbonIntensity(rng.gen_range(0.0..600.0)),
            };
            let workload = workload(
                f64::from(rng.gen_range(1_u8..=8)),
                priorities[rng.gen_range(0..priorities.len())],
            );

            let decision = engine.evaluate(&workload, &signal);
            assert!(matches!(decision.action, Action::Defer | Action::Reroute));
            assert_eq!(decision.beckn.stage, Stage::Select);
            assert!(decision.expected_savings.cost >= Pounds::ZERO);
            assert!(decision.expected_savings.carbon >= Kilograms::ZERO);
        }
    }

    #[test]
    fn test_decision_fields() {
        let mut engine = low_draws();
        let at = Local::now();
        let workload = workload(2.0, Priority::Low);
        let decision = engine.evaluate_at(&workload, &signal(90.0, 250.0, 40.0), at);
        assert_eq!(decision.timestamp, at);
        assert_eq!(decision.workload_id, "wl_1");
        assert_eq!(decision.id, format!("dec_{}_000000000", at.timestamp_millis()));
        assert_eq!(decision.beckn.payload.workload_id, "wl_1");
        assert_eq!(decision.beckn.payload.power_requirement, Kilowatts(300.0));
        assert_eq!(decision.beckn.payload.flexibility_window, Hours(2.0));
    }

    #[test]
    fn test_recent_decisions() {
        let mut engine = low_draws();
        let signal = signal(60.0, 180.0, 40.0);
        for index in 0..5 {
            let mut workload = workload(0.0, Priority::Low);
            workload.id = format!("wl_{index}");
            engine.evaluate(&workload, &signal);
        }
        assert_eq!(engine.len(), 5);

        let recent: Vec<_> =
            engine.recent_decisions(3).map(|decision| decision.workload_id.as_str()).collect();
        assert_eq!(recent, ["wl_4", "wl_3", "wl_2"]);
        assert_eq!(engine.recent_decisions(10).count(), 5);
        assert_eq!(engine.recent_decisions(0).count(), 0);
        assert_eq!(engine.history()[0].workload_id, "wl_0");
    }

    #[test]
    fn test_independent_engines() {
        let mut first = low_draws();
        let second = low_draws();
        first.evaluate(&workload(0.0, Priority::Low), &signal(60.0, 180.0, 40.0));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_base36_suffix() {
        assert_eq!(base36_suffix(0), "000000000");
        assert_eq!(base36_suffix(35), "z00000000");
        assert_eq!(base36_suffix(36), "010000000");
    }
}
