use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    beckn::Message,
    core::{
        datacenter::Datacenter,
        decision::Decision,
        grid::{GridSignal, Level},
        metrics::SystemMetrics,
        workload::Workload,
    },
    quantity::{currency::Pounds, ratios::Percentage},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn format_time(at: Option<DateTime<Local>>) -> String {
    at.map_or_else(String::new, |at| at.format("%H:%M").to_string())
}

pub fn build_workloads_table(workloads: &[Workload]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Name", "Category", "Power", "Duration", "Flexibility", "Priority", "Status", "Scheduled",
        "Completed",
    ]);
    for workload in workloads {
        table.add_row(vec![
            Cell::new(&workload.name),
            Cell::new(workload.category).add_attribute(Attribute::Dim),
            Cell::new(workload.power).set_alignment(CellAlignment::Right),
            Cell::new(workload.duration).set_alignment(CellAlignment::Right),
            Cell::new(workload.flexibility).set_alignment(CellAlignment::Right).fg(
                if workload.is_flexible() { Color::Green } else { Color::Reset },
            ),
            Cell::new(workload.priority).fg(workload.priority.color()),
            Cell::new(workload.status).fg(workload.status.color()),
            Cell::new(format_time(workload.scheduled_at)),
            Cell::new(format_time(workload.completed_at)).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_decisions_table<'a>(decisions: impl IntoIterator<Item = &'a Decision>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "Workload", "Action", "Cost saved", "Carbon saved", "Reason"]);
    for decision in decisions {
        table.add_row(vec![
            Cell::new(decision.timestamp.format("%H:%M:%S")).add_attribute(Attribute::Dim),
            Cell::new(&decision.workload_id),
            Cell::new(decision.action).fg(decision.action.color()),
            Cell::new(decision.expected_savings.cost).set_alignment(CellAlignment::Right),
            Cell::new(decision.expected_savings.carbon).set_alignment(CellAlignment::Right),
            Cell::new(&decision.reason),
        ]);
    }
    table
}

#[must_use]
pub fn build_metrics_table(metrics: &SystemMetrics) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Total", "Running", "Deferred", "Completed", "Cost saved", "Carbon reduced",
        "Flexibility revenue", "Power draw", "Cost per inference",
    ]);
    table.add_row(vec![
        Cell::new(metrics.total_workloads).set_alignment(CellAlignment::Right),
        Cell::new(metrics.active_workloads).set_alignment(CellAlignment::Right).fg(Color::Green),
        Cell::new(metrics.deferred_workloads)
            .set_alignment(CellAlignment::Right)
            .fg(Color::DarkYellow),
        Cell::new(metrics.completed_workloads).set_alignment(CellAlignment::Right).fg(Color::Blue),
        Cell::new(metrics.total_cost_saved).set_alignment(CellAlignment::Right),
        Cell::new(metrics.total_carbon_reduced).set_alignment(CellAlignment::Right),
        Cell::new(metrics.flexibility_revenue).set_alignment(CellAlignment::Right),
        Cell::new(metrics.current_power_draw).set_alignment(CellAlignment::Right),
        Cell::new(metrics.average_cost_per_inference).set_alignment(CellAlignment::Right).fg(
            if metrics.average_cost_per_inference < Pounds(100.0) {
                Color::Green
            } else {
                Color::Reset
            },
        ),
    ]);
    table
}

#[must_use]
pub fn build_grid_signal_table(signal: &GridSignal) -> Table {
    let carbon_level = Level::of_carbon(signal.carbon_intensity);
    let price_level = Level::of_price(signal.price);

    let mut table = new_table();
    table.set_header(vec!["", "Now", "Next hour", "Next 4 hours"]);
    table.add_row(vec![
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new(format!("{} ({price_level})", signal.price)).fg(price_level.color()),
        Cell::new(signal.forecast.next_hour.price),
        Cell::new(signal.forecast.next_4_hours.price),
    ]);
    table.add_row(vec![
        Cell::new("Carbon").add_attribute(Attribute::Bold),
        Cell::new(format!("{} ({carbon_level})", signal.carbon_intensity))
            .fg(carbon_level.color()),
        Cell::new(signal.forecast.next_hour.carbon),
        Cell::new(signal.forecast.next_4_hours.carbon),
    ]);
    table.add_row(vec![
        Cell::new("Renewables").add_attribute(Attribute::Bold),
        Cell::new(signal.renewable_mix).fg(if signal.renewable_mix > Percentage(60.0) {
            Color::Green
        } else {
            Color::Reset
        }),
    ]);
    table.add_row(vec![
        Cell::new("Grid load").add_attribute(Attribute::Bold),
        Cell::new(signal.grid_load),
    ]);
    table
}

pub fn build_datacenters_table(datacenters: &[Datacenter]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Name", "Region", "Load", "Capacity", "Utilization", "Battery", "Stored"]);
    for datacenter in datacenters {
        let utilization = datacenter.utilization();
        table.add_row(vec![
            Cell::new(&datacenter.name),
            Cell::new(&datacenter.region).add_attribute(Attribute::Dim),
            Cell::new(datacenter.current_load).set_alignment(CellAlignment::Right),
            Cell::new(datacenter.capacity)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(utilization).set_alignment(CellAlignment::Right).fg(
                if utilization >= Percentage(80.0) {
                    Color::Red
                } else if utilization >= Percentage(60.0) {
                    Color::DarkYellow
                } else {
                    Color::Green
                },
            ),
            Cell::new(datacenter.battery_level).set_alignment(CellAlignment::Right),
            Cell::new(datacenter.stored_energy()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_messages_table<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "Kind", "From", "To", "Transaction", "Details"]);
    for message in messages {
        table.add_row(vec![
            Cell::new(message.timestamp.format("%H:%M:%S%.3f")).add_attribute(Attribute::Dim),
            Cell::new(message.kind).fg(message.kind.color()),
            Cell::new(message.from),
            Cell::new(message.to),
            Cell::new(&message.context.transaction_id).add_attribute(Attribute::Dim),
            Cell::new(
                message.output.as_deref().unwrap_or_else(|| message.kind.description()),
            ),
        ]);
    }
    table
}
