use std::fmt::{Display, Formatter};

use bon::Builder;
use chrono::{DateTime, Local};
use comfy_table::Color;
use serde::{Deserialize, Serialize};

use crate::quantity::{carbon::CarbonIntensity, price::MegawattHourPrice, ratios::Percentage};

/// Point-in-time grid snapshot. Replaced wholesale rather than mutated.
#[must_use]
#[derive(Clone, Debug, Serialize, Deserialize, Builder)]
pub struct GridSignal {
    #[builder(default = Local::now())]
    pub timestamp: DateTime<Local>,

    pub price: MegawattHourPrice,
    pub carbon_intensity: CarbonIntensity,
    pub renewable_mix: Percentage,
    pub grid_load: Percentage,
    pub forecast: Forecast,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Forecast {
    pub next_hour: ForecastPoint,
    pub next_4_hours: ForecastPoint,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub price: MegawattHourPrice,
    pub carbon: CarbonIntensity,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn of_carbon(carbon_intensity: CarbonIntensity) -> Self {
        if carbon_intensity < CarbonIntensity(150.0) {
            Self::Low
        } else if carbon_intensity < CarbonIntensity(250.0) {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn of_price(price: MegawattHourPrice) -> Self {
        if price < MegawattHourPrice(80.0) {
            Self::Low
        } else if price < MegawattHourPrice(120.0) {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Self::Low => Color::Green,
            Self::Medium => Color::DarkYellow,
            Self::High => Color::Red,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carbon_level() {
        assert_eq!(Level::of_carbon(CarbonIntensity(149.9)), Level::Low);
        assert_eq!(Level::of_carbon(CarbonIntensity(150.0)), Level::Medium);
        assert_eq!(Level::of_carbon(CarbonIntensity(250.0)), Level::High);
    }

    #[test]
    fn test_price_level() {
        assert_eq!(Level::of_price(MegawattHourPrice(79.0)), Level::Low);
        assert_eq!(Level::of_price(MegawattHourPrice(119.99)), Level::Medium);
        assert_eq!(Level::of_price(MegawattHourPrice(120.0)), Level::High);
    }
}
