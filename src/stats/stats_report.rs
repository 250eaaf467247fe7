//! Builds and writes the end-of-run report: a set of tables printed to
//! stdout, and optionally the raw stats serialized to JSON or TOML.

use super::stats_collector::StatsCollector;
use crate::config::inputoutput::{DataOutputFormat, DataOutputMode};
use owo_colors::OwoColorize;
use std::fs;
use std::io;
use tabled::settings::object::Rows;
use tabled::settings::{Alignment, Modify, Panel, Style};
use tabled::{Table, Tabled};

/// Describes the columns of the global summary table.
#[derive(Tabled)]
struct StatSummary {
    statistic: String,
    value: String,
}

/// Describes the columns of the per-channel table.
#[derive(Tabled)]
struct ChannelSummary {
    channel: String,
    rate: u32,
    #[tabled(rename = "configured fraction")]
    configured_fraction: String,
    #[tabled(rename = "pre-fired")]
    pre_fired: u64,
    accepted: u64,
    #[tabled(rename = "observed fraction")]
    observed_fraction: String,
}

/// Describes the columns of the per-trigger table.
#[derive(Tabled)]
struct TriggerSummary {
    trigger: String,
    fired: u64,
}

fn global_table(stats: &StatsCollector) -> Table {
    let mut summaries = vec![
        StatSummary {
            statistic: "Events emulated".to_string(),
            value: stats.events_seen().to_string(),
        },
        StatSummary {
            statistic: "Events accepted".to_string(),
            value: stats.events_accepted().to_string(),
        },
        StatSummary {
            statistic: "Data injections".to_string(),
            value: stats.injections().to_string(),
        },
    ];
    if let Some(tck) = stats.tck() {
        summaries.insert(
            0,
            StatSummary {
                statistic: "TCK".to_string(),
                value: format!("0x{tck:04X}"),
            },
        );
    }
    let unknown: Vec<&str> = stats.unknown_data_names().collect();
    if !unknown.is_empty() {
        summaries.push(StatSummary {
            statistic: "Unknown data names".to_string(),
            value: unknown.join(", "),
        });
    }
    if stats.err_count() > 0 {
        summaries.push(StatSummary {
            statistic: "Errors".to_string(),
            value: stats.err_count().red().to_string(),
        });
    }
    let mut table = Table::new(summaries);
    let _ = table
        .with(Panel::header("L0DU EMULATION REPORT"))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Style::rounded());
    table
}

fn channel_table(stats: &StatsCollector) -> Table {
    let rows = stats.channels().iter().map(|ch| ChannelSummary {
        channel: ch.name.clone(),
        rate: ch.rate,
        configured_fraction: format!("{:.6}", ch.configured_fraction()),
        pre_fired: ch.pre_fired,
        accepted: ch.accepted,
        observed_fraction: format!("{:.6}", ch.observed_fraction()),
    });
    let mut table = Table::new(rows);
    let _ = table
        .with(Panel::header("Channels"))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Style::rounded());
    table
}

fn trigger_table(stats: &StatsCollector) -> Table {
    let rows = stats.triggers().iter().map(|t| TriggerSummary {
        trigger: t.name.clone(),
        fired: t.fired,
    });
    let mut table = Table::new(rows);
    let _ = table
        .with(Panel::header("Triggers"))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Style::rounded());
    table
}

/// Print the end-of-run report tables to stdout.
pub fn print_stats_report(stats: &StatsCollector) {
    if let Some(fatal) = stats.fatal_error() {
        println!("{}: {fatal}", "FATAL".red());
    }
    println!("{}", global_table(stats));
    if !stats.channels().is_empty() {
        println!("{}", channel_table(stats));
    }
    if !stats.triggers().is_empty() {
        println!("{}", trigger_table(stats));
    }
}

/// Serialize the collected stats in `format` and write them to the
/// destination in `mode`. [DataOutputMode::None] writes nothing.
pub fn write_stats_output(
    stats: &StatsCollector,
    mode: &DataOutputMode,
    format: DataOutputFormat,
) -> io::Result<()> {
    let serialized = match format {
        DataOutputFormat::Json => serde_json::to_string_pretty(stats)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
        DataOutputFormat::Toml => toml::to_string_pretty(stats)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
    };
    match mode {
        DataOutputMode::Stdout => {
            println!("{serialized}");
            Ok(())
        }
        DataOutputMode::File(path) => fs::write(path, serialized),
        DataOutputMode::None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Recipe, RECIPE_TEMPLATE};
    use crate::stats::StatType;

    fn stats() -> StatsCollector {
        let config = Recipe::from_toml_str(RECIPE_TEMPLATE).unwrap().build().unwrap();
        let mut stats = StatsCollector::from_config(&config);
        stats.collect(StatType::RunTck(42));
        stats.collect(StatType::EventSeen);
        stats.collect(StatType::ChannelPreFired(0));
        stats.collect(StatType::ChannelAccepted(0));
        stats.finalize();
        stats
    }

    #[test]
    fn global_table_contains_tck_and_event_count() {
        let rendered = global_table(&stats()).to_string();
        assert!(rendered.contains("0x002A"));
        assert!(rendered.contains("Events emulated"));
    }

    #[test]
    fn channel_table_contains_all_channels() {
        let rendered = channel_table(&stats()).to_string();
        assert!(rendered.contains("L0Muon"));
        assert!(rendered.contains("L0DiMuon"));
        assert!(rendered.contains("L0SumEt"));
    }

    #[test]
    fn stats_output_serializes_to_toml() {
        let serialized = toml::to_string_pretty(&stats()).unwrap();
        assert!(serialized.contains("events_seen = 1"));
        assert!(serialized.contains("tck = 42"));
    }
}
