//! Mock entity factories.

use chrono::{DateTime, Local, Timelike};
use rand::Rng;

use crate::{
    core::{
        datacenter::Datacenter,
        grid::{Forecast, ForecastPoint, GridSignal},
        workload::{Category, Priority, Status, Workload},
    },
    quantity::{
        carbon::CarbonIntensity,
        energy::KilowattHours,
        power::Kilowatts,
        price::MegawattHourPrice,
        ratios::Percentage,
        time::{Hours, Minutes},
    },
};

const WORKLOAD_NAMES: [&str; 10] = [
    "GPT-4 Training Batch",
    "Image Recognition Model",
    "Video Transcoding Job",
    "Database Backup Process",
    "ML Inference Cluster",
    "Data Analytics Pipeline",
    "Neural Network Training",
    "Recommendation Engine",
    "Natural Language Processing",
    "Computer Vision Model",
];

const CATEGORIES: [Category; 3] =
    [Category::AiTraining, Category::Inference, Category::BatchProcessing];
const PRIORITIES: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

/// Probability that a generated workload can be deferred at all.
const FLEXIBLE_SHARE: f64 = 0.7;

/// Generate a queued workload, the index determines its name.
pub fn workload<R: Rng + ?Sized>(index: usize, now: DateTime<Local>, rng: &mut R) -> Workload {
    let name = format!(
        "{} #{}",
        WORKLOAD_NAMES[index % WORKLOAD_NAMES.len()],
        index / WORKLOAD_NAMES.len() + 1,
    );
    let flexibility = if rng.r#gen::<f64>() < FLEXIBLE_SHARE {
        Hours(f64::from(rng.gen_range(1_u8..=8)))
    } else {
        Hours::ZERO
    };
    Workload::builder()
        .id(format!("wl_{}_{index}", now.timestamp_millis()))
        .name(name)
        .category(CATEGORIES[rng.gen_range(0..CATEGORIES.len())])
        .power(Kilowatts(f64::from(rng.gen_range(100_u16..600))))
        .duration(Minutes(f64::from(rng.gen_range(30_u16..210))))
        .flexibility(flexibility)
        .priority(PRIORITIES[rng.gen_range(0..PRIORITIES.len())])
        .status(Status::Queued)
        .created_at(now)
        .build()
}

/// Generate a grid snapshot following the time-of-day price and carbon patterns.
pub fn grid_signal<R: Rng + ?Sized>(now: DateTime<Local>, rng: &mut R) -> GridSignal {
    let hour = now.hour();
    let is_off_peak = hour < 7 || hour > 22;
    let is_solar_peak = (11..=16).contains(&hour);

    let base_price = if is_off_peak { 60.0 } else { 120.0 };
    let price = (base_price + rng.gen_range(-20.0..20.0_f64)).max(40.0);

    let base_carbon_intensity = if is_solar_peak { 120.0 } else { 220.0 };
    let carbon_intensity = (base_carbon_intensity + rng.gen_range(-30.0..30.0_f64)).max(80.0);

    let renewable_mix =
        if is_solar_peak { rng.gen_range(60.0..80.0) } else { rng.gen_range(30.0..60.0) };

    // Forecasts are generally cheaper and cleaner further out:
    let forecast = Forecast {
        next_hour: ForecastPoint {
            price: MegawattHourPrice(price + rng.gen_range(-10.0..10.0)),
            carbon: CarbonIntensity(carbon_intensity + rng.gen_range(-10.0..10.0)),
        },
        next_4_hours: ForecastPoint {
            price: MegawattHourPrice(price - rng.gen_range(0.0..30.0)),
            carbon: CarbonIntensity(carbon_intensity - rng.gen_range(0.0..40.0)),
        },
    };

    GridSignal::builder()
        .timestamp(now)
        .price(MegawattHourPrice(price))
        .carbon_intensity(CarbonIntensity(carbon_intensity))
        .renewable_mix(Percentage(renewable_mix))
        .grid_load(Percentage(rng.gen_range(50.0..80.0)))
        .forecast(forecast)
        .build()
}

/// The three fixed sites with a randomized load and battery level.
pub fn datacenters<R: Rng + ?Sized>(rng: &mut R) -> Vec<Datacenter> {
    [
        ("dc-uk-1", "London DC-1", "UK South", 5000.0, 3200.0, 500.0, 2000.0, 65.0, 20.0),
        ("dc-scot-1", "Edinburgh DC-1", "Scotland", 3500.0, 1800.0, 400.0, 1500.0, 45.0, 25.0),
        ("dc-ire-1", "Dublin DC-1", "Ireland", 4000.0, 2500.0, 600.0, 1800.0, 70.0, 15.0),
    ]
    .into_iter()
    .map(
        |(id, name, region, capacity, load, load_spread, battery, level, level_spread)| {
            Datacenter {
                id: id.to_string(),
                name: name.to_string(),
                region: region.to_string(),
                capacity: Kilowatts(capacity),
                current_load: Kilowatts(load + rng.gen_range(0.0..load_spread)),
                battery_capacity: KilowattHours(battery),
                battery_level: Percentage(level + rng.gen_range(0.0..level_spread)),
            }
        },
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn at_hour(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 11, 24, hour, 30, 0).earliest().unwrap()
    }

    #[test]
    fn test_workload_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = Local::now();
        for index in 0..200 {
            let workload = workload(index, now, &mut rng);
            assert_eq!(workload.status, Status::Queued);
            assert!((100.0..600.0).contains(&workload.power.0));
            assert!((30.0..210.0).contains(&workload.duration.0));
            assert!((0.0..=8.0).contains(&workload.flexibility.0));
            assert_eq!(workload.power.0.fract(), 0.0);
            assert_eq!(workload.created_at, now);
        }
    }

    #[test]
    fn test_workload_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Local::now();
        assert_eq!(workload(0, now, &mut rng).name, "GPT-4 Training Batch #1");
        assert_eq!(workload(9, now, &mut rng).name, "Computer Vision Model #1");
        assert_eq!(workload(12, now, &mut rng).name, "Video Transcoding Job #2");
        assert_eq!(workload(3, now, &mut rng).id, format!("wl_{}_3", now.timestamp_millis()));
    }

    #[test]
    fn test_some_workloads_are_inflexible() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Local::now();
        let n_flexible =
            (0..1000).filter(|index| workload(*index, now, &mut rng).is_flexible()).count();
        assert!((600..800).contains(&n_flexible), "{n_flexible}");
    }

    #[test]
    fn test_off_peak_signal() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let signal = grid_signal(at_hour(3), &mut rng);
            assert!((40.0..80.0).contains(&signal.price.0));
            assert!((190.0..250.0).contains(&signal.carbon_intensity.0));
            assert!((30.0..60.0).contains(&signal.renewable_mix.0));
            assert!((50.0..80.0).contains(&signal.grid_load.0));
            assert!(signal.forecast.next_4_hours.price <= signal.price);
            assert!(signal.forecast.next_4_hours.carbon <= signal.carbon_intensity);
        }
    }

    #[test]
    fn test_solar_peak_signal() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let signal = grid_signal(at_hour(13), &mut rng);
            assert!((100.0..140.0).contains(&signal.price.0));
            assert!((90.0..150.0).contains(&signal.carbon_intensity.0));
            assert!((60.0..80.0).contains(&signal.renewable_mix.0));
            assert_eq!(signal.timestamp, at_hour(13));
        }
    }

    #[test]
    fn test_datacenters() {
        let mut rng = StdRng::seed_from_u64(9);
        let datacenters = datacenters(&mut rng);
        assert_eq!(datacenters.len(), 3);
        assert_eq!(datacenters[0].id, "dc-uk-1");
        assert!((3200.0..3700.0).contains(&datacenters[0].current_load.0));
        assert!((45.0..70.0).contains(&datacenters[1].battery_level.0));
        assert_eq!(datacenters[2].region, "Ireland");
    }
}
