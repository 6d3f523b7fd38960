use std::fmt::{Display, Formatter};

use bon::Builder;
use chrono::{DateTime, Local};
use comfy_table::Color;
use serde::{Deserialize, Serialize};

use crate::quantity::{
    energy::KilowattHours,
    power::Kilowatts,
    time::{Hours, Minutes},
};

/// Unit of computational demand.
#[must_use]
#[derive(Clone, Debug, Serialize, Deserialize, Builder)]
pub struct Workload {
    #[builder(into)]
    pub id: String,

    #[builder(into)]
    pub name: String,

    #[builder(default)]
    pub category: Category,

    pub power: Kilowatts,

    pub duration: Minutes,

    /// How long the start may be deferred without violating the deadline, zero means inflexible.
    #[builder(default)]
    pub flexibility: Hours,

    #[builder(default)]
    pub priority: Priority,

    #[builder(default)]
    pub status: Status,

    pub created_at: DateTime<Local>,
    pub scheduled_at: Option<DateTime<Local>>,
    pub completed_at: Option<DateTime<Local>>,
}

impl Workload {
    pub fn is_flexible(&self) -> bool {
        self.flexibility > Hours::ZERO
    }

    /// Energy consumed over the whole run.
    pub fn energy(&self) -> KilowattHours {
        self.power * self.duration
    }
}

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    AiTraining,

    #[default]
    Inference,

    BatchProcessing,
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AiTraining => write!(f, "AI training"),
            Self::Inference => write!(f, "Inference"),
            Self::BatchProcessing => write!(f, "Batch processing"),
        }
    }
}

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,

    #[default]
    Medium,

    Low,
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

impl Priority {
    pub const fn color(self) -> Color {
        match self {
            Self::High => Color::Red,
            Self::Medium => Color::DarkYellow,
            Self::Low => Color::Reset,
        }
    }
}

/// Lifecycle: `queued → running | deferred`, `deferred → running`, `running → completed`.
///
/// The transitions are applied by the simulation driver, never by the engine.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Queued,

    Running,

    Deferred,

    Completed,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Deferred => write!(f, "Deferred"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl Status {
    pub const fn color(self) -> Color {
        match self {
            Self::Queued => Color::Reset,
            Self::Running => Color::Green,
            Self::Deferred => Color::DarkYellow,
            Self::Completed => Color::Blue,
        }
    }
}
