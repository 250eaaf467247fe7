//! The report: the output record of one emulated crossing, holding the global
//! decision value and the bit-packed per-crossing summaries in the exact
//! layout of the hardware summary banks.

use super::configuration::L0duConfig;
use super::{BxOffset, DecisionMask};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Sparse storage of the 32-bit summary words, keyed by `(bx, word index)`.
///
/// Crossing offsets are small and non-contiguous in practice, so the storage
/// is a 2-D sparse map rather than a flat array; any serialization must
/// preserve the 2-D indexing.
pub type SummaryWords = BTreeMap<(BxOffset, u32), u32>;

/// Set or clear bit `index` in the summary word it maps to.
///
/// The mapping `word = index / 32`, `bit = index % 32` is a wire-format
/// contract with the hardware comparison tooling and must not change.
fn set_summary_bit(words: &mut SummaryWords, bx: BxOffset, index: u32, value: bool) {
    let word = words.entry((bx, index / 32)).or_insert(0);
    if value {
        *word |= 1 << (index % 32);
    } else {
        *word &= !(1 << (index % 32));
    }
}

/// Read bit `index` from the summary word it maps to. Absent words read as 0.
fn summary_bit(words: &SummaryWords, bx: BxOffset, index: u32) -> bool {
    words
        .get(&(bx, index / 32))
        .is_some_and(|word| word & (1 << (index % 32)) != 0)
}

/// The output record of one emulated crossing.
///
/// Holds a back-reference to the configuration it was produced from: the
/// configuration is the authority for *which* ids exist, the report for *what
/// each id's bit value is*. Without a configuration every name-based query
/// degrades to an inert default instead of failing.
#[derive(Debug, Clone, Default)]
pub struct L0duReport {
    decision_value: DecisionMask,
    tck: u16,
    bcid: u16,
    valid: bool,
    bank_version: u8,
    channels_pre_decision_summaries: SummaryWords,
    channels_decision_summaries: SummaryWords,
    conditions_value_summaries: SummaryWords,
    sum_et: BTreeMap<BxOffset, u32>,
    data_map: HashMap<String, (f64, f64)>,
    config: Option<Arc<L0duConfig>>,
}

impl L0duReport {
    /// Create an empty report bound to a configuration.
    pub fn new(config: Arc<L0duConfig>, bcid: u16) -> Self {
        Self {
            tck: config.tck(),
            bank_version: config.bank_version(),
            bcid,
            valid: true,
            config: Some(config),
            ..Default::default()
        }
    }

    /// Reset the report for reuse on a new crossing; keeps the configuration binding.
    pub fn clear(&mut self, bcid: u16) {
        self.decision_value = DecisionMask::DISABLED;
        self.bcid = bcid;
        self.valid = self.config.is_some();
        self.channels_pre_decision_summaries.clear();
        self.channels_decision_summaries.clear();
        self.conditions_value_summaries.clear();
        self.sum_et.clear();
        self.data_map.clear();
    }

    /// The configuration this report was produced from, if any.
    pub fn config(&self) -> Option<&Arc<L0duConfig>> {
        self.config.as_ref()
    }

    /// TCK of the configuration used.
    pub fn tck(&self) -> u16 {
        self.tck
    }

    /// Bunch-crossing id of the reported crossing.
    pub fn bcid(&self) -> u16 {
        self.bcid
    }

    /// Whether this report holds a usable emulation result.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Version of the summary bank layout.
    pub fn bank_version(&self) -> u8 {
        self.bank_version
    }

    /// Global decision value: OR of the decision types of all fired channels.
    pub fn decision_value(&self) -> DecisionMask {
        self.decision_value
    }

    /// Set the global decision value.
    pub fn set_decision_value(&mut self, value: DecisionMask) {
        self.decision_value = value;
    }

    /// Whether the crossing was accepted for any decision type in `mask`.
    pub fn decision(&self, mask: DecisionMask) -> bool {
        self.decision_value.intersects(mask)
    }

    /// Record the pre-decision of the channel with id `channel_id` at `bx`.
    pub fn set_channel_pre_decision(&mut self, channel_id: u32, bx: BxOffset, value: bool) {
        set_summary_bit(&mut self.channels_pre_decision_summaries, bx, channel_id, value);
    }

    /// Pre-decision of the channel with id `channel_id` at `bx`.
    pub fn channel_pre_decision(&self, channel_id: u32, bx: BxOffset) -> bool {
        summary_bit(&self.channels_pre_decision_summaries, bx, channel_id)
    }

    /// Record the decision of the channel with id `channel_id` at `bx`.
    pub fn set_channel_decision(&mut self, channel_id: u32, bx: BxOffset, value: bool) {
        set_summary_bit(&mut self.channels_decision_summaries, bx, channel_id, value);
    }

    /// Decision of the channel with id `channel_id` at `bx`.
    pub fn channel_decision(&self, channel_id: u32, bx: BxOffset) -> bool {
        summary_bit(&self.channels_decision_summaries, bx, channel_id)
    }

    /// Record the value of the condition reported at bit `report_bit` at `bx`.
    pub fn set_condition_value(&mut self, report_bit: u32, bx: BxOffset, value: bool) {
        set_summary_bit(&mut self.conditions_value_summaries, bx, report_bit, value);
    }

    /// Value of the condition reported at bit `report_bit` at `bx`.
    pub fn condition_value(&self, report_bit: u32, bx: BxOffset) -> bool {
        summary_bit(&self.conditions_value_summaries, bx, report_bit)
    }

    /// Decision of the named channel at `bx`; `false` for unknown names or a
    /// configuration-less report.
    pub fn channel_decision_by_name(&self, name: &str, bx: BxOffset) -> bool {
        self.with_config_channel_id(name)
            .is_some_and(|id| self.channel_decision(id, bx))
    }

    /// Pre-decision of the named channel at `bx`; `false` for unknown names or
    /// a configuration-less report.
    pub fn channel_pre_decision_by_name(&self, name: &str, bx: BxOffset) -> bool {
        self.with_config_channel_id(name)
            .is_some_and(|id| self.channel_pre_decision(id, bx))
    }

    /// Value of the named condition at `bx`; `false` for unknown names, a
    /// condition that is not reported, or a configuration-less report.
    pub fn condition_value_by_name(&self, name: &str, bx: BxOffset) -> bool {
        let Some(config) = &self.config else {
            return false;
        };
        config
            .condition_index(name)
            .map(|idx| &config.conditions()[idx])
            .filter(|cond| cond.is_reported())
            .is_some_and(|cond| self.condition_value(cond.report_bit(), bx))
    }

    /// Decision of the named trigger at `bx`, reconstructed from the recorded
    /// per-channel decision bits; `false` for unknown names or a
    /// configuration-less report.
    pub fn trigger_decision_by_name(&self, name: &str, bx: BxOffset) -> bool {
        let Some(config) = &self.config else {
            return false;
        };
        let Some(idx) = config.trigger_index(name) else {
            return false;
        };
        let trigger = &config.triggers()[idx];
        trigger.channels().iter().any(|&ch_idx| {
            let channel = &config.channels()[ch_idx];
            channel.decision_type().intersects(trigger.decision_type())
                && self.channel_decision(channel.id(), bx)
        })
    }

    /// Reconstruct a decision for `mask` at `bx` by iterating the
    /// configuration's channels and testing their recorded decision bits.
    pub fn decision_from_summary(&self, mask: DecisionMask, bx: BxOffset) -> bool {
        let Some(config) = &self.config else {
            return false;
        };
        config.channels().iter().any(|channel| {
            channel.decision_type().intersects(mask) && self.channel_decision(channel.id(), bx)
        })
    }

    /// Reconstruct a pre-decision for `mask` at `bx` from the recorded
    /// per-channel pre-decision bits.
    pub fn pre_decision_from_summary(&self, mask: DecisionMask, bx: BxOffset) -> bool {
        let Some(config) = &self.config else {
            return false;
        };
        config.channels().iter().any(|channel| {
            channel.decision_type().intersects(mask) && self.channel_pre_decision(channel.id(), bx)
        })
    }

    /// Record the Sum(Et) digit at `bx`.
    pub fn set_sum_et(&mut self, bx: BxOffset, digit: u32) {
        let _ = self.sum_et.insert(bx, digit);
    }

    /// The Sum(Et) digit at `bx`, 0 if not recorded.
    pub fn sum_et(&self, bx: BxOffset) -> u32 {
        self.sum_et.get(&bx).copied().unwrap_or(0)
    }

    /// Cache a datum's scaled value and scale in the report's embedded data map.
    pub fn add_to_data_map(&mut self, name: impl Into<String>, value: f64, scale: f64) {
        let _ = self.data_map.insert(name.into(), (value, scale));
    }

    /// Scaled value of the named datum at `bx`.
    ///
    /// Consults the embedded data map first (at `bx == 0`, or the `"Sum(Et)"`
    /// crossing window via [Self::sum_et] for `|bx| <= 2`), then falls back to
    /// the configuration's constant data. 0.0 when nothing is known.
    pub fn data_value(&self, name: &str, bx: BxOffset) -> f64 {
        if name == "Sum(Et)" && bx != 0 && bx.abs() <= 2 {
            let scale = self
                .data_map
                .get(name)
                .map(|(_, scale)| *scale)
                .unwrap_or(1.0);
            return f64::from(self.sum_et(bx)) * scale;
        }
        if bx == 0 {
            if let Some((value, _)) = self.data_map.get(name) {
                return *value;
            }
        }
        self.constant_from_config(name)
            .map(|(digit, scale)| f64::from(digit) * scale)
            .unwrap_or(0.0)
    }

    /// Raw digit of the named datum at `bx`, derived from the same lookup
    /// order as [Self::data_value]. 0 when nothing is known.
    pub fn data_digit(&self, name: &str, bx: BxOffset) -> u32 {
        if name == "Sum(Et)" && bx != 0 && bx.abs() <= 2 {
            return self.sum_et(bx);
        }
        if bx == 0 {
            if let Some((value, scale)) = self.data_map.get(name) {
                return if *scale != 0.0 { (value / scale).round() as u32 } else { 0 };
            }
        }
        self.constant_from_config(name)
            .map(|(digit, _)| digit)
            .unwrap_or(0)
    }

    /// Raw summary words of the channel pre-decisions.
    pub fn channels_pre_decision_summaries(&self) -> &SummaryWords {
        &self.channels_pre_decision_summaries
    }

    /// Raw summary words of the channel decisions.
    pub fn channels_decision_summaries(&self) -> &SummaryWords {
        &self.channels_decision_summaries
    }

    /// Raw summary words of the reported condition values.
    pub fn conditions_value_summaries(&self) -> &SummaryWords {
        &self.conditions_value_summaries
    }

    fn with_config_channel_id(&self, name: &str) -> Option<u32> {
        let config = self.config.as_ref()?;
        let idx = config.channel_index(name)?;
        Some(config.channels()[idx].id())
    }

    fn constant_from_config(&self, name: &str) -> Option<(u32, f64)> {
        use super::elementary_data::DataKind;
        let config = self.config.as_ref()?;
        let idx = config.data_index(name)?;
        let data = &config.data()[idx];
        match data.kind() {
            DataKind::Constant(digit) => Some((*digit, data.scale())),
            _ => None,
        }
    }
}
