use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local};
use comfy_table::Color;
use serde::{Deserialize, Serialize};

use crate::{
    core::workload::Workload,
    quantity::{
        carbon::{Grams, Kilograms},
        currency::Pounds,
        power::Kilowatts,
        time::{Hours, Minutes},
    },
};

/// The engine's recommendation for one workload under one grid snapshot.
///
/// Created once per evaluation and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub timestamp: DateTime<Local>,
    pub workload_id: String,
    pub action: Action,
    pub reason: String,
    pub expected_savings: Savings,
    pub beckn: Beckn,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Execute,
    Defer,
    Reroute,
    BatteryActivation,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execute => write!(f, "execute"),
            Self::Defer => write!(f, "defer"),
            Self::Reroute => write!(f, "reroute"),
            Self::BatteryActivation => write!(f, "battery-activation"),
        }
    }
}

impl Action {
    pub const fn color(self) -> Color {
        match self {
            Self::Execute => Color::Green,
            Self::Defer => Color::DarkYellow,
            Self::Reroute => Color::Cyan,
            Self::BatteryActivation => Color::Magenta,
        }
    }
}

/// Estimated savings, never negative.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Savings {
    pub cost: Pounds,

    /// Avoided emissions.
    pub carbon: Kilograms,
}

impl Savings {
    pub const NONE: Self = Self { cost: Pounds::ZERO, carbon: Kilograms::ZERO };

    /// Negative estimates are reported as zero savings, never as losses.
    pub fn clamped(cost: Pounds, carbon: Grams) -> Self {
        Self { cost: cost.max(Pounds::ZERO), carbon: Kilograms::from(carbon.max(Grams::ZERO)) }
    }
}

/// How far the synthetic protocol log is rendered for a decision.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Discover,
    Select,
    Init,
    Confirm,
    Status,
    Complete,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "discover"),
            Self::Select => write!(f, "select"),
            Self::Init => write!(f, "init"),
            Self::Confirm => write!(f, "confirm"),
            Self::Status => write!(f, "status"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Beckn {
    pub stage: Stage,
    pub payload: Payload,
}

/// Workload parameters echoed into the protocol log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payload {
    pub workload_id: String,
    pub power_requirement: Kilowatts,
    pub duration: Minutes,
    pub flexibility_window: Hours,
}

impl From<&Workload> for Payload {
    fn from(workload: &Workload) -> Self {
        Self {
            workload_id: workload.id.clone(),
            power_requirement: workload.power,
            duration: workload.duration,
            flexibility_window: workload.flexibility,
        }
    }
}
