//! Contains the [StatsCollector] that accumulates stats from the event loop.

use super::StatType;
use crate::l0du::configuration::L0duConfig;
use crate::l0du::DOWNSCALE_SCALE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Running stats of one emulated channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Channel name from the configuration.
    pub name: String,
    /// Configured accept rate out of the downscale scale.
    pub rate: u32,
    /// Crossings where the AND-group held (before downscaling).
    pub pre_fired: u64,
    /// Crossings where the channel fired (after downscaling).
    pub accepted: u64,
}

impl ChannelStats {
    /// Configured accept fraction `rate / DOWNSCALE_SCALE`.
    pub fn configured_fraction(&self) -> f64 {
        f64::from(self.rate) / f64::from(DOWNSCALE_SCALE)
    }

    /// Observed accept fraction of pre-fired crossings, 0.0 before any pre-fire.
    pub fn observed_fraction(&self) -> f64 {
        if self.pre_fired == 0 {
            0.0
        } else {
            self.accepted as f64 / self.pre_fired as f64
        }
    }
}

/// Running stats of one trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerStats {
    /// Trigger name from the configuration.
    pub name: String,
    /// Crossings where the trigger fired.
    pub fired: u64,
}

/// Collects stats from the event loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCollector {
    is_finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tck: Option<u16>,
    events_seen: u64,
    events_accepted: u64,
    injections: u64,
    unknown_data_names: BTreeSet<String>,
    errors: Vec<Box<str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fatal_error: Option<Box<str>>,
    // Arrays of tables last: TOML requires plain values emitted before tables
    channels: Vec<ChannelStats>,
    triggers: Vec<TriggerStats>,
}

impl StatsCollector {
    /// Create a collector sized for `config`, with one stats slot per channel
    /// and trigger.
    pub fn from_config(config: &L0duConfig) -> Self {
        Self {
            channels: config
                .channels()
                .iter()
                .map(|ch| ChannelStats {
                    name: ch.name().to_owned(),
                    rate: ch.rate(),
                    ..Default::default()
                })
                .collect(),
            triggers: config
                .triggers()
                .iter()
                .map(|t| TriggerStats {
                    name: t.name().to_owned(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Record a stat.
    pub fn collect(&mut self, stat: StatType) {
        debug_assert!(!self.is_finalized, "stats collected after finalize");
        match stat {
            StatType::Fatal(m) => self.fatal_error = Some(m),
            StatType::Error(m) => self.errors.push(m),
            StatType::RunTck(tck) => self.tck = Some(tck),
            StatType::EventSeen => self.events_seen += 1,
            StatType::EventAccepted(bits) => {
                if bits != 0 {
                    self.events_accepted += 1;
                }
            }
            StatType::DataInjected(n) => self.injections += u64::from(n),
            StatType::UnknownDataName(name) => {
                let _ = self.unknown_data_names.insert(name.into_string());
            }
            StatType::ChannelPreFired(id) => {
                if let Some(ch) = self.channels.get_mut(id as usize) {
                    ch.pre_fired += 1;
                }
            }
            StatType::ChannelAccepted(id) => {
                if let Some(ch) = self.channels.get_mut(id as usize) {
                    ch.accepted += 1;
                }
            }
            StatType::TriggerFired(id) => {
                if let Some(t) = self.triggers.get_mut(id as usize) {
                    t.fired += 1;
                }
            }
        }
    }

    /// Finalize stats collection. Meaning no more stats can be collected.
    /// Does nothing if already finalized.
    pub fn finalize(&mut self) {
        self.is_finalized = true;
    }

    /// TCK of the run, if one was recorded.
    pub fn tck(&self) -> Option<u16> {
        self.tck
    }

    /// Number of events emulated.
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    /// Number of events with a non-empty decision value.
    pub fn events_accepted(&self) -> u64 {
        self.events_accepted
    }

    /// Total number of data injections applied.
    pub fn injections(&self) -> u64 {
        self.injections
    }

    /// Per-channel stats, in configuration order.
    pub fn channels(&self) -> &[ChannelStats] {
        &self.channels
    }

    /// Per-trigger stats, in configuration order.
    pub fn triggers(&self) -> &[TriggerStats] {
        &self.triggers
    }

    /// Data names referenced by injections but absent from the configuration.
    pub fn unknown_data_names(&self) -> impl Iterator<Item = &str> {
        self.unknown_data_names.iter().map(String::as_str)
    }

    /// Number of non-fatal errors reported.
    pub fn err_count(&self) -> u64 {
        self.errors.len() as u64
    }

    /// Return if any errors were reported.
    pub fn any_errors(&self) -> bool {
        !self.errors.is_empty() || self.fatal_error.is_some()
    }

    /// The reported errors as read-only strings.
    pub fn errors(&self) -> &[Box<str>] {
        &self.errors
    }

    /// The fatal error, if one was reported.
    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal_error.as_deref()
    }
}
