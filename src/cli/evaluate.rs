use chrono::Local;
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    beckn,
    core::{
        engine::Engine,
        grid::{Forecast, ForecastPoint, GridSignal},
        workload::{Category, Priority, Workload},
    },
    prelude::*,
    quantity::{
        carbon::CarbonIntensity,
        power::Kilowatts,
        price::MegawattHourPrice,
        ratios::Percentage,
        time::{Hours, Minutes},
    },
    tables::{build_decisions_table, build_grid_signal_table, build_messages_table},
};

#[derive(Parser)]
pub struct EvaluateArgs {
    #[clap(long = "power-kw", env = "WORKLOAD_POWER_KW")]
    power: Kilowatts,

    #[clap(long = "duration-minutes", env = "WORKLOAD_DURATION_MINUTES")]
    duration: Minutes,

    /// How long the workload may be deferred, zero for inflexible workloads.
    #[clap(long = "flexibility-hours", env = "WORKLOAD_FLEXIBILITY_HOURS", default_value = "0")]
    flexibility: Hours,

    #[clap(long, env = "WORKLOAD_PRIORITY", default_value = "medium")]
    priority: Priority,

    #[clap(long, env = "WORKLOAD_CATEGORY", default_value = "inference")]
    category: Category,

    /// Current grid price in pounds per megawatt-hour.
    #[clap(long, env = "GRID_PRICE")]
    price: MegawattHourPrice,

    /// Current carbon intensity in grams per kilowatt-hour.
    #[clap(long = "carbon-intensity", env = "GRID_CARBON_INTENSITY")]
    carbon_intensity: CarbonIntensity,

    #[clap(long = "renewable-mix", env = "GRID_RENEWABLE_MIX", default_value = "40")]
    renewable_mix: Percentage,

    #[clap(long = "grid-load", env = "GRID_LOAD", default_value = "60")]
    grid_load: Percentage,

    /// Price forecast for the next 4 hours.
    #[clap(long = "forecast-price", env = "FORECAST_PRICE")]
    forecast_price: MegawattHourPrice,

    /// Carbon intensity forecast for the next 4 hours.
    #[clap(long = "forecast-carbon", env = "FORECAST_CARBON")]
    forecast_carbon: CarbonIntensity,

    /// Random seed for the tie-breaking draw.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,

    /// Print the decision as JSON instead of tables.
    #[clap(long)]
    json: bool,
}

impl EvaluateArgs {
    #[instrument(skip_all)]
    pub fn run(self) -> Result {
        let now = Local::now();
        let workload = Workload::builder()
            .id(format!("wl_{}_0", now.timestamp_millis()))
            .name("Ad-hoc workload")
            .category(self.category)
            .power(self.power)
            .duration(self.duration)
            .flexibility(self.flexibility)
            .priority(self.priority)
            .created_at(now)
            .build();
        let signal = GridSignal::builder()
            .timestamp(now)
            .price(self.price)
            .carbon_intensity(self.carbon_intensity)
            .renewable_mix(self.renewable_mix)
            .grid_load(self.grid_load)
            .forecast(Forecast {
                next_hour: ForecastPoint { price: self.price, carbon: self.carbon_intensity },
                next_4_hours: ForecastPoint {
                    price: self.forecast_price,
                    carbon: self.forecast_carbon,
                },
            })
            .build();

        let rng = self.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let decision = Engine::new(rng).evaluate(&workload, &signal);
        info!(
            action = %decision.action,
            cost = %decision.expected_savings.cost,
            carbon = %decision.expected_savings.carbon,
            "evaluated",
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&decision)?);
        } else {
            println!("{}", build_grid_signal_table(&signal));
            println!("{}", build_decisions_table([&decision]));
            println!("{}", build_messages_table(&beckn::messages_for(&decision, decision.timestamp)));
        }
        Ok(())
    }
}
