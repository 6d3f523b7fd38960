//! Display-only Beckn message log.
//!
//! Nothing here talks to a counterparty: the messages only mimic the shape of a
//! discover → select → init → confirm handshake for a given decision. Relay output is logged
//! alongside as `status` messages, one per line.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, TimeDelta};
use comfy_table::Color;
use enumset::{EnumSet, enum_set};
use serde::Serialize;
use serde_json::Value;

use crate::core::decision::{Decision, Stage};

pub const DOMAIN: &str = "beckn.one:DEG:compute-energy:1.0";

/// Domain of the messages carrying relay output.
pub const RELAY_DOMAIN: &str = "flask-api";

#[derive(Clone, Debug, Serialize)]
pub struct Message {
    pub id: String,
    pub timestamp: DateTime<Local>,
    pub kind: MessageKind,
    pub from: Agent,
    pub to: Agent,
    pub context: Context,

    /// Relay output line, only on relay messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Context {
    pub domain: &'static str,
    pub action: &'static str,
    pub transaction_id: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Agent {
    ComputeAgent,
    GridAgent,
}

impl Display for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComputeAgent => write!(f, "compute-agent"),
            Self::GridAgent => write!(f, "grid-agent"),
        }
    }
}

/// Declaration order is the order of the handshake.
#[derive(Debug, Serialize, enumset::EnumSetType)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Search,
    OnSearch,
    Select,
    OnSelect,
    Init,
    OnInit,
    Confirm,
    OnConfirm,

    /// Relay output, outside of the handshake.
    Status,
}

impl MessageKind {
    pub const fn action(self) -> &'static str {
        match self {
            Self::Search => "discover",
            Self::OnSearch => "on_search",
            Self::Select => "select",
            Self::OnSelect => "on_select",
            Self::Init => "init",
            Self::OnInit => "on_init",
            Self::Confirm => "confirm",
            Self::OnConfirm => "on_confirm",
            Self::Status => "output",
        }
    }

    pub const fn is_callback(self) -> bool {
        matches!(
            self,
            Self::OnSearch | Self::OnSelect | Self::OnInit | Self::OnConfirm
        )
    }

    /// Offset from the decision time, so that the log reads as a handshake.
    fn offset(self) -> TimeDelta {
        TimeDelta::milliseconds(match self {
            Self::Search => -3000,
            Self::OnSearch => -2500,
            Self::Select => -2000,
            Self::OnSelect => -1500,
            Self::Init => -1000,
            Self::OnInit => -500,
            Self::Confirm | Self::Status => 0,
            Self::OnConfirm => 500,
        })
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Search => {
                "Discovery request sent - searching for matching grid flexibility services"
            }
            Self::OnSearch => "Search results received - available compute-energy slots returned",
            Self::Select => "Selection made - choosing specific grid window and compute slot",
            Self::OnSelect => "Selection confirmed - provider acknowledges chosen slot",
            Self::Init => "Order initialization - setting up compute-energy reservation",
            Self::OnInit => "Initialization response - provider confirms order setup",
            Self::Confirm => "Order confirmation - finalizing compute slot reservation",
            Self::OnConfirm => "Confirmation received - grid slot reservation confirmed",
            Self::Status => "Status update received - relay output",
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Self::Search | Self::OnSearch => Color::Blue,
            Self::Select | Self::OnSelect => Color::Magenta,
            Self::Init | Self::OnInit => Color::DarkYellow,
            Self::Confirm | Self::OnConfirm => Color::Green,
            Self::Status => Color::Cyan,
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::OnSearch => write!(f, "on_search"),
            Self::Select => write!(f, "select"),
            Self::OnSelect => write!(f, "on_select"),
            Self::Init => write!(f, "init"),
            Self::OnInit => write!(f, "on_init"),
            Self::Confirm => write!(f, "confirm"),
            Self::OnConfirm => write!(f, "on_confirm"),
            Self::Status => write!(f, "status"),
        }
    }
}

impl Stage {
    /// Message kinds rendered for a decision that reached this stage.
    pub fn message_kinds(self) -> EnumSet<MessageKind> {
        let discovery = enum_set!(MessageKind::Search | MessageKind::OnSearch);
        let selection = enum_set!(MessageKind::Select | MessageKind::OnSelect);
        let initialization = enum_set!(MessageKind::Init | MessageKind::OnInit);
        let confirmation = enum_set!(MessageKind::Confirm | MessageKind::OnConfirm);
        match self {
            Self::Discover | Self::Status => discovery,
            Self::Select => discovery | selection,
            Self::Init => discovery | initialization,
            Self::Confirm | Self::Complete => {
                discovery | selection | initialization | confirmation
            }
        }
    }
}

/// Fabricate the log messages for the decision, in handshake order.
#[must_use]
pub fn messages_for(decision: &Decision, at: DateTime<Local>) -> Vec<Message> {
    decision
        .beckn
        .stage
        .message_kinds()
        .iter()
        .map(|kind| {
            let (from, to) = if kind.is_callback() {
                (Agent::GridAgent, Agent::ComputeAgent)
            } else {
                (Agent::ComputeAgent, Agent::GridAgent)
            };
            Message {
                id: format!("{}-{kind}", decision.id),
                timestamp: at + kind.offset(),
                kind,
                from,
                to,
                context: Context {
                    domain: DOMAIN,
                    action: kind.action(),
                    transaction_id: decision.id.clone(),
                },
                output: None,
            }
        })
        .collect()
}

/// Turn the relayed response into `status` messages, one per line.
///
/// An `output` array yields a message per element, anything else is logged as a single JSON line.
#[must_use]
pub fn messages_from_relay(data: &Value, at: DateTime<Local>) -> Vec<Message> {
    let lines: Vec<String> = match data.get("output").and_then(Value::as_array) {
        Some(output) => output
            .iter()
            .map(|line| line.as_str().map_or_else(|| line.to_string(), str::to_string))
            .collect(),
        None => vec![data.to_string()],
    };
    let transaction_id = format!("flask-{}", at.timestamp_millis());
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| Message {
            id: format!("{transaction_id}-{index}"),
            timestamp: at,
            kind: MessageKind::Status,
            from: Agent::ComputeAgent,
            to: Agent::GridAgent,
            context: Context {
                domain: RELAY_DOMAIN,
                action: MessageKind::Status.action(),
                transaction_id: transaction_id.clone(),
            },
            output: Some(line),
        })
        .collect()
}
