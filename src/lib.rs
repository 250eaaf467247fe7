#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
// Readability lints
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool,
    clippy::single_match_else,
    clippy::range_plus_one,
    clippy::int_plus_one,
    clippy::needless_range_loop,
    clippy::needless_continue,
    clippy::shadow_same,
    clippy::shadow_unrelated
)]
// Performance lints
#![warn(variant_size_differences)]
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]
// Safety lints
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(trivial_casts, trivial_numeric_casts)]
// Unhandled results (allow unwrap and expect as there are many cases where the unwrap is totally safe)
#![warn(clippy::map_unwrap_or)]

//! Bit-exact emulator for the LHCb Level-0 Decision Unit (L0DU), reproducing
//! the accept/reject decision of the hardware trigger board per bunch-crossing
//! from already-decoded elementary data.
//!
//! # Usage
//!
//! ## Emulating a configuration over recorded events
//! ```shell
//! # Load a recipe and replay its decision logic over an events file
//! $ l0dulator <recipe.toml> emulate <events.json>
//!
//! # Same, replaying the event list cyclically for a downscaling rate study
//! $ l0dulator <recipe.toml> emulate <events.json> --repeat 1000000
//! ```
//! ## Inspecting a configuration
//! ```shell
//! $ l0dulator <recipe.toml> view recipe
//!
//! # Channels and triggers only
//! $ l0dulator <recipe.toml> view channels
//! ```
//! ## Writing the final stats in a machine-readable format
//! ```shell
//! $ l0dulator <recipe.toml> emulate <events.json> -S stdout -D json
//! ```
//! ## Generating a template recipe to customize
//! ```shell
//! $ l0dulator --generate-recipe-toml
//! ```

use crate::config::prelude::*;
use crate::l0du::configuration::L0duConfig;
use crate::l0du::emulator::L0duEmulator;
use crate::stats::{StatType, StatsCollector};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Write an error message to stderr.
/// All error messages should be written through this function to ensure consistency.
#[inline]
pub fn display_error(err_msg: &str) {
    log::error!("{}", owo_colors::OwoColorize::red(&err_msg));
}

pub mod config;
pub mod events;
pub mod l0du;
pub mod recipe;
pub mod stats;
pub mod util;
pub mod view;

/// Entry point for loading the recipe and delegating to the emulation driver
/// or view generators depending on [Config].
///
/// Follows these steps:
/// 1. Load and build the trigger configuration from the recipe file.
/// 2. Depending on [Config] do one of:
///     - Emulate the configuration over the events file with [run_emulation]
///       and print the end-of-run stats report.
///     - Generate views of the configuration with [view::generate_view].
pub fn init_processing(
    config: &'static impl Config,
    stop_flag: &AtomicBool,
    any_errors_flag: &AtomicBool,
) -> io::Result<()> {
    let recipe_path = config.recipe_file().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "No recipe file given, nothing to do (see --help)",
        )
    })?;
    let recipe = recipe::Recipe::load(recipe_path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let l0du_config = Arc::new(
        recipe
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?,
    );
    log::info!(
        "Loaded configuration TCK 0x{:04X}: {} data, {} conditions, {} channels, {} triggers",
        l0du_config.tck(),
        l0du_config.data().len(),
        l0du_config.conditions().len(),
        l0du_config.channels().len(),
        l0du_config.triggers().len()
    );

    if let Some(view_cmd) = config.view() {
        view::generate_view(view_cmd, &l0du_config);
        return Ok(());
    }

    if let Some(emulate_args) = config.emulation() {
        let mut stats = run_emulation(&l0du_config, &emulate_args, stop_flag)?;
        stats.finalize();
        if stats.any_errors() {
            any_errors_flag.store(true, Ordering::Relaxed);
            if !config.mute_errors() {
                for error in stats.errors() {
                    display_error(error);
                }
            }
        }
        stats::stats_report::print_stats_report(&stats);
        if let Some(format) = config.stats_output_format() {
            stats::stats_report::write_stats_output(
                &stats,
                &config.stats_output_mode(),
                format,
            )?;
        }
        return Ok(());
    }

    log::warn!("No command specified, nothing to do (try `emulate` or `view`)");
    Ok(())
}

/// Drive the emulator over the events file and collect per-run stats.
///
/// Events are processed strictly sequentially: the downscaling counters are a
/// running accumulator whose semantics depend on event order.
pub fn run_emulation(
    l0du_config: &Arc<L0duConfig>,
    args: &EmulateArgs,
    stop_flag: &AtomicBool,
) -> io::Result<StatsCollector> {
    let events = events::load_events(&args.events)?;
    let mut stats = StatsCollector::from_config(l0du_config);
    stats.collect(StatType::RunTck(l0du_config.tck()));
    if events.is_empty() {
        log::warn!("Events file is empty, no crossings to emulate");
        return Ok(stats);
    }
    let total = args.repeat.unwrap_or(events.len() as u64);
    let mut emulator = L0duEmulator::new(Arc::clone(l0du_config));

    for event_index in 0..total {
        if stop_flag.load(Ordering::SeqCst) {
            log::warn!("Stopped after {event_index} events");
            break;
        }
        let event = &events[(event_index % events.len() as u64) as usize];
        for injection in &event.data {
            if l0du_config.data_index(&injection.name).is_none() {
                stats.collect(StatType::UnknownDataName(injection.name.as_str().into()));
            }
        }
        let report = emulator.process_event(event);

        stats.collect(StatType::EventSeen);
        stats.collect(StatType::DataInjected(event.data.len() as u16));
        stats.collect(StatType::EventAccepted(report.decision_value().bits()));
        for (idx, channel) in l0du_config.channels().iter().enumerate() {
            if emulator.channel_pre_decision(idx) {
                stats.collect(StatType::ChannelPreFired(channel.id()));
            }
            if emulator.channel_decision(idx) {
                stats.collect(StatType::ChannelAccepted(channel.id()));
            }
        }
        for (idx, trigger) in l0du_config.triggers().iter().enumerate() {
            if emulator.trigger_decision(idx) {
                stats.collect(StatType::TriggerFired(trigger.id()));
            }
        }
    }

    let unknown: Vec<String> = stats.unknown_data_names().map(str::to_owned).collect();
    for name in unknown {
        stats.collect(StatType::Error(
            format!("Injection for unknown elementary data: {name}").into(),
        ));
    }
    Ok(stats)
}
