//! The configuration: one hardware recipe's worth of data, conditions,
//! channels and triggers, keyed by TCK.

use super::channel::Channel;
use super::condition::ElementaryCondition;
use super::elementary_data::ElementaryData;
use super::trigger::Trigger;
use std::collections::HashMap;

/// One fully linked trigger configuration.
///
/// Owns arena `Vec`s of all entities; cross-references between entities are
/// arena indices resolved at build time. Immutable after build, so it can be
/// shared (e.g. behind an `Arc`) between the emulator and any number of
/// reports from past events.
///
/// The configuration performs no validation of its own referential integrity:
/// it trusts the recipe builder that produced it (unknown-name lookups through
/// the accessors below degrade to `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct L0duConfig {
    tck: u16,
    bank_version: u8,
    data: Vec<ElementaryData>,
    conditions: Vec<ElementaryCondition>,
    channels: Vec<Channel>,
    triggers: Vec<Trigger>,
    data_by_name: HashMap<String, usize>,
    conditions_by_name: HashMap<String, usize>,
    channels_by_name: HashMap<String, usize>,
    triggers_by_name: HashMap<String, usize>,
}

impl L0duConfig {
    /// Assemble a configuration from already-resolved parts.
    ///
    /// Entity ids are expected to equal their arena index and all
    /// cross-reference indices are expected to be in range; the recipe builder
    /// guarantees both.
    pub fn from_parts(
        tck: u16,
        bank_version: u8,
        data: Vec<ElementaryData>,
        conditions: Vec<ElementaryCondition>,
        channels: Vec<Channel>,
        triggers: Vec<Trigger>,
    ) -> Self {
        let data_by_name = data
            .iter()
            .enumerate()
            .map(|(idx, d)| (d.name().to_owned(), idx))
            .collect();
        let conditions_by_name = conditions
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name().to_owned(), idx))
            .collect();
        let channels_by_name = channels
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name().to_owned(), idx))
            .collect();
        let triggers_by_name = triggers
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.name().to_owned(), idx))
            .collect();
        Self {
            tck,
            bank_version,
            data,
            conditions,
            channels,
            triggers,
            data_by_name,
            conditions_by_name,
            channels_by_name,
            triggers_by_name,
        }
    }

    /// The Trigger Configuration Key this recipe is registered under.
    pub fn tck(&self) -> u16 {
        self.tck
    }

    /// Version of the summary bank layout this configuration emulates.
    pub fn bank_version(&self) -> u8 {
        self.bank_version
    }

    /// All data, in arena order.
    pub fn data(&self) -> &[ElementaryData] {
        &self.data
    }

    /// All conditions, in arena order.
    pub fn conditions(&self) -> &[ElementaryCondition] {
        &self.conditions
    }

    /// All channels, in arena order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// All triggers, in arena order.
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Arena index of the named datum, `None` if not part of this configuration.
    pub fn data_index(&self, name: &str) -> Option<usize> {
        self.data_by_name.get(name).copied()
    }

    /// Arena index of the named condition, `None` if not part of this configuration.
    pub fn condition_index(&self, name: &str) -> Option<usize> {
        self.conditions_by_name.get(name).copied()
    }

    /// Arena index of the named channel, `None` if not part of this configuration.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels_by_name.get(name).copied()
    }

    /// Arena index of the named trigger, `None` if not part of this configuration.
    pub fn trigger_index(&self, name: &str) -> Option<usize> {
        self.triggers_by_name.get(name).copied()
    }
}
