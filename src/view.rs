//! Generates human-readable views of a loaded configuration.

use crate::config::view::ViewCommands;
use crate::l0du::configuration::L0duConfig;
use crate::l0du::elementary_data::DataKind;
use itertools::Itertools;
use tabled::settings::object::Rows;
use tabled::settings::{Alignment, Modify, Panel, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DataView {
    id: u32,
    name: String,
    kind: &'static str,
    scale: f64,
    saturation: u32,
    details: String,
}

#[derive(Tabled)]
struct ConditionView {
    id: u32,
    name: String,
    data: String,
    comparator: &'static str,
    threshold: u32,
    bx: i32,
    reported: bool,
    #[tabled(rename = "report bit")]
    report_bit: u32,
}

#[derive(Tabled)]
struct ChannelView {
    id: u32,
    name: String,
    rate: u32,
    #[tabled(rename = "decision type")]
    decision_type: String,
    conditions: String,
    #[tabled(rename = "update counter")]
    update_counter: bool,
}

#[derive(Tabled)]
struct TriggerView {
    id: u32,
    name: String,
    #[tabled(rename = "decision type")]
    decision_type: String,
    channels: String,
}

fn style(mut table: Table, header: &str) -> Table {
    let _ = table
        .with(Panel::header(header))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Style::rounded());
    table
}

fn data_table(config: &L0duConfig) -> Table {
    let rows = config.data().iter().map(|d| DataView {
        id: d.id(),
        name: d.name().to_owned(),
        kind: d.kind().label(),
        scale: d.scale(),
        saturation: d.saturation(),
        details: match d.kind() {
            DataKind::Constant(value) => format!("value = {value}"),
            DataKind::Compound { op, components } => components
                .iter()
                .map(|&idx| config.data()[idx].name())
                .join(&format!(" {op} ")),
            DataKind::Predefined | DataKind::RamBcid => String::new(),
        },
    });
    style(Table::new(rows), "Elementary Data")
}

fn condition_table(config: &L0duConfig) -> Table {
    let rows = config.conditions().iter().map(|c| ConditionView {
        id: c.id(),
        name: c.name().to_owned(),
        data: config.data()[c.data_index()].name().to_owned(),
        comparator: c.comparator().symbol(),
        threshold: c.threshold(),
        bx: c.bx(),
        reported: c.is_reported(),
        report_bit: c.report_bit(),
    });
    style(Table::new(rows), "Elementary Conditions")
}

fn channel_table(config: &L0duConfig) -> Table {
    let rows = config.channels().iter().map(|ch| ChannelView {
        id: ch.id(),
        name: ch.name().to_owned(),
        rate: ch.rate(),
        decision_type: ch.decision_type().to_string(),
        conditions: ch
            .conditions()
            .iter()
            .map(|&idx| config.conditions()[idx].name())
            .join(" AND "),
        update_counter: ch.update_counter(),
    });
    style(Table::new(rows), "Channels")
}

fn trigger_table(config: &L0duConfig) -> Table {
    let rows = config.triggers().iter().map(|t| TriggerView {
        id: t.id(),
        name: t.name().to_owned(),
        decision_type: t.decision_type().to_string(),
        channels: t
            .channels()
            .iter()
            .map(|&idx| config.channels()[idx].name())
            .join(" OR "),
    });
    style(Table::new(rows), "Triggers")
}

/// Print the requested view of `config` to stdout.
pub fn generate_view(view: ViewCommands, config: &L0duConfig) {
    match view {
        ViewCommands::Recipe => {
            println!(
                "Configuration TCK 0x{:04X} (bank version {})",
                config.tck(),
                config.bank_version()
            );
            println!("{}", data_table(config));
            println!("{}", condition_table(config));
            println!("{}", channel_table(config));
            println!("{}", trigger_table(config));
        }
        ViewCommands::Channels => {
            println!("{}", channel_table(config));
            println!("{}", trigger_table(config));
        }
        ViewCommands::Data => {
            println!("{}", data_table(config));
            println!("{}", condition_table(config));
        }
    }
}
