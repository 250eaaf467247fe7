//! The emulator: drives one configuration against injected elementary data,
//! one crossing at a time, and populates a report per crossing.

use super::channel::DownscaleCounter;
use super::configuration::L0duConfig;
use super::elementary_data::{DataKind, DigitMap};
use super::report::L0duReport;
use super::{BxOffset, DecisionMask};
use crate::events::EventRecord;
use std::sync::Arc;

/// Per-event decision flags of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ChannelDecision {
    emulated: bool,
    pre_decision: bool,
    decision: bool,
}

/// Per-event scratch state: injected digits, compound memoization flags and
/// channel decision flags. Cleared at the start of every event.
///
/// Deliberately a separate struct from the downscaling counters so that the
/// scratch reset cannot touch the cross-event rate-limiter state.
#[derive(Debug, Clone, Default)]
struct EventScratch {
    digits: Vec<DigitMap>,
    data_evaluated: Vec<bool>,
    channels: Vec<ChannelDecision>,
}

impl EventScratch {
    fn for_config(config: &L0duConfig) -> Self {
        Self {
            digits: vec![DigitMap::new(); config.data().len()],
            data_evaluated: vec![false; config.data().len()],
            channels: vec![ChannelDecision::default(); config.channels().len()],
        }
    }

    fn clear(&mut self) {
        self.digits.iter_mut().for_each(DigitMap::clear);
        self.data_evaluated.fill(false);
        self.channels.fill(ChannelDecision::default());
    }
}

/// Raw digit of the datum at arena index `idx` for crossing offset `bx`.
///
/// Compound data is evaluated lazily on the first read of the event by
/// left-folding its operator over the component values in list order, and
/// memoized; later reads see the stored digit map as-is. The component graph
/// is guaranteed acyclic by the recipe builder.
fn eval_digit(config: &L0duConfig, scratch: &mut EventScratch, idx: usize, bx: BxOffset) -> u32 {
    let data = &config.data()[idx];
    match data.kind() {
        DataKind::Compound { op, components } => {
            if !scratch.data_evaluated[idx] {
                let mut acc = 0.0;
                let mut component_values = components.iter();
                if let Some(&first) = component_values.next() {
                    acc = eval_value(config, scratch, first, bx);
                }
                for &component in component_values {
                    let rhs = eval_value(config, scratch, component, bx);
                    acc = op.apply(acc, rhs);
                }
                let _ = scratch.digits[idx].insert(bx, acc as u32);
                scratch.data_evaluated[idx] = true;
            }
            scratch.digits[idx].get(&bx).copied().unwrap_or(0)
        }
        _ => data.digit_from(&scratch.digits[idx], bx),
    }
}

/// Scaled value of the datum at arena index `idx`: `digit(bx) * scale`.
fn eval_value(config: &L0duConfig, scratch: &mut EventScratch, idx: usize, bx: BxOffset) -> f64 {
    f64::from(eval_digit(config, scratch, idx, bx)) * config.data()[idx].scale()
}

/// Value of the condition at arena index `idx` for this event.
fn eval_condition(config: &L0duConfig, scratch: &mut EventScratch, idx: usize) -> bool {
    let condition = &config.conditions()[idx];
    let digit = eval_digit(config, scratch, condition.data_index(), condition.bx());
    condition.comparator().compare(digit, condition.threshold())
}

/// Emulates one configuration against per-event injected data.
///
/// Owns all mutable state of the emulation, split in two: the downscaling
/// counters persist for the lifetime of the emulator (they are a running
/// accumulator with event-order-dependent semantics), the scratch state is
/// reset every event. Events must be processed strictly sequentially on one
/// emulator instance; parallel processing requires one emulator per worker.
#[derive(Debug, Clone)]
pub struct L0duEmulator {
    config: Arc<L0duConfig>,
    counters: Vec<DownscaleCounter>,
    scratch: EventScratch,
}

impl L0duEmulator {
    /// Create an emulator for `config` with all downscaling counters at zero.
    pub fn new(config: Arc<L0duConfig>) -> Self {
        let counters = vec![DownscaleCounter::default(); config.channels().len()];
        let scratch = EventScratch::for_config(&config);
        Self {
            config,
            counters,
            scratch,
        }
    }

    /// The configuration this emulator drives.
    pub fn config(&self) -> &Arc<L0duConfig> {
        &self.config
    }

    /// Clear all per-event state: injected digits, compound memoization and
    /// channel decision flags. Constant data keeps its value (it lives in the
    /// configuration) and the downscaling counters are never touched.
    pub fn clear_event_state(&mut self) {
        self.scratch.clear();
    }

    /// Inject one `(name, bx, raw value)` triple for the current event.
    ///
    /// Returns `false` if the name is not part of the configuration; the
    /// injection is then dropped (no-such-entity, not an error).
    pub fn inject(&mut self, name: &str, bx: BxOffset, value: u32) -> bool {
        match self.config.data_index(name) {
            Some(idx) => {
                let _ = self.scratch.digits[idx].insert(bx, value);
                true
            }
            None => false,
        }
    }

    /// Raw digit of the named datum for the current event, 0 for unknown names.
    pub fn data_digit(&mut self, name: &str, bx: BxOffset) -> u32 {
        match self.config.data_index(name) {
            Some(idx) => eval_digit(&self.config, &mut self.scratch, idx, bx),
            None => 0,
        }
    }

    /// Emulate the channel at arena index `idx` for the current event.
    ///
    /// Memoized per event: the first call evaluates the conditions and (for
    /// counter-updating channels) advances the downscaler once; later calls
    /// within the same event return without recomputation or further counter
    /// mutation.
    pub fn emulate_channel(&mut self, idx: usize) {
        if self.scratch.channels[idx].emulated {
            return;
        }
        let channel = &self.config.channels()[idx];
        // A channel with no conditions can never pre-fire. The AND-fold over a
        // non-empty set visits every condition (no short-circuit) so each
        // datum's per-event memoization is warmed for the report data cache.
        let mut pre_decision = !channel.conditions().is_empty();
        for &cond_idx in channel.conditions() {
            pre_decision &= eval_condition(&self.config, &mut self.scratch, cond_idx);
        }
        if channel.update_counter() {
            self.counters[idx].step(pre_decision, channel.rate());
        }
        let decision = pre_decision && self.counters[idx].accept();
        self.scratch.channels[idx] = ChannelDecision {
            emulated: true,
            pre_decision,
            decision,
        };
    }

    /// Emulate every channel of the configuration for the current event.
    /// Order is irrelevant: channels have no cross-channel dependencies.
    pub fn emulate(&mut self) {
        for idx in 0..self.config.channels().len() {
            self.emulate_channel(idx);
        }
    }

    /// Pre-decision of the channel at arena index `idx` (before downscaling).
    pub fn channel_pre_decision(&self, idx: usize) -> bool {
        self.scratch.channels[idx].pre_decision
    }

    /// Decision of the channel at arena index `idx` (after downscaling).
    pub fn channel_decision(&self, idx: usize) -> bool {
        self.scratch.channels[idx].decision
    }

    /// Current downscaling counter of the channel at arena index `idx`.
    pub fn channel_counter(&self, idx: usize) -> u32 {
        self.counters[idx].counter()
    }

    /// OR of the decision types of every channel whose decision is set.
    pub fn decision_value(&self) -> DecisionMask {
        self.fold_decision_types(|flags| flags.decision)
    }

    /// OR of the decision types of every channel whose pre-decision is set.
    pub fn pre_decision_value(&self) -> DecisionMask {
        self.fold_decision_types(|flags| flags.pre_decision)
    }

    /// Whether downscaling left the pre-decision value unchanged this event.
    pub fn is_downscaled(&self) -> bool {
        self.pre_decision_value() == self.decision_value()
    }

    /// Decision of the trigger at arena index `idx`: any member channel with
    /// an intersecting decision type that fired.
    pub fn trigger_decision(&self, idx: usize) -> bool {
        let trigger = &self.config.triggers()[idx];
        trigger.channels().iter().any(|&ch_idx| {
            self.config.channels()[ch_idx]
                .decision_type()
                .intersects(trigger.decision_type())
                && self.scratch.channels[ch_idx].decision
        })
    }

    /// Process one event: clear the per-event state, inject the event's data,
    /// emulate every channel and fold the outcome into a fresh report.
    pub fn process_event(&mut self, event: &EventRecord) -> L0duReport {
        self.clear_event_state();
        for injection in &event.data {
            if !self.inject(&injection.name, injection.bx, injection.value) {
                log::debug!(
                    "Injection for unknown elementary data dropped: {}",
                    injection.name
                );
            }
        }
        self.emulate();

        let mut report = L0duReport::new(Arc::clone(&self.config), event.bcid);
        report.set_decision_value(self.decision_value());
        for (idx, channel) in self.config.channels().iter().enumerate() {
            report.set_channel_pre_decision(channel.id(), 0, self.scratch.channels[idx].pre_decision);
            report.set_channel_decision(channel.id(), 0, self.scratch.channels[idx].decision);
        }
        for idx in 0..self.config.conditions().len() {
            let (reported, report_bit) = {
                let condition = &self.config.conditions()[idx];
                (condition.is_reported(), condition.report_bit())
            };
            if reported {
                let value = eval_condition(&self.config, &mut self.scratch, idx);
                report.set_condition_value(report_bit, 0, value);
            }
        }
        if let Some(idx) = self.config.data_index("Sum(Et)") {
            for bx in -2..=2 {
                report.set_sum_et(bx, eval_digit(&self.config, &mut self.scratch, idx, bx));
            }
        }
        self.cache_data_values(&mut report);
        report
    }

    /// Cache every datum touched this event (injected, evaluated or constant)
    /// in the report's embedded data map, as `(value at bx 0, scale)`.
    fn cache_data_values(&self, report: &mut L0duReport) {
        for (idx, data) in self.config.data().iter().enumerate() {
            let touched = matches!(data.kind(), DataKind::Constant(_))
                || self.scratch.data_evaluated[idx]
                || !self.scratch.digits[idx].is_empty();
            if !touched {
                continue;
            }
            let digit = match data.kind() {
                // An unevaluated read at bx 0: compounds see their memoized map
                DataKind::Compound { .. } => self.scratch.digits[idx].get(&0).copied().unwrap_or(0),
                _ => data.digit_from(&self.scratch.digits[idx], 0),
            };
            report.add_to_data_map(data.name(), f64::from(digit) * data.scale(), data.scale());
        }
    }

    fn fold_decision_types(&self, flag: impl Fn(&ChannelDecision) -> bool) -> DecisionMask {
        self.config
            .channels()
            .iter()
            .zip(&self.scratch.channels)
            .filter(|(_, flags)| flag(flags))
            .fold(DecisionMask::DISABLED, |mask, (channel, _)| {
                mask | channel.decision_type()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DataInjection;
    use crate::l0du::channel::Channel;
    use crate::l0du::condition::{Comparator, ElementaryCondition};
    use crate::l0du::elementary_data::{CompoundOp, DataKind, ElementaryData};
    use crate::l0du::trigger::Trigger;
    use pretty_assertions::assert_eq;

    fn muon_config() -> Arc<L0duConfig> {
        Arc::new(L0duConfig::from_parts(
            0x2A,
            2,
            vec![
                ElementaryData::new(0, "M0(Pt)", DataKind::Predefined, 40.0, 255),
                ElementaryData::new(1, "CaloZero", DataKind::Constant(3), 1.0, 0),
            ],
            vec![ElementaryCondition::new(
                0,
                "MuPt>10",
                0,
                Comparator::Greater,
                10,
                true,
                None,
                0,
            )],
            vec![Channel::new(
                0,
                "L0Muon",
                1_000_000,
                DecisionMask::PHYSICS,
                vec![0],
                true,
            )],
            vec![Trigger::new(0, "Muon", DecisionMask::PHYSICS, vec![0])],
        ))
    }

    fn event(value: u32) -> EventRecord {
        EventRecord {
            bcid: 1234,
            data: vec![DataInjection {
                name: "M0(Pt)".to_string(),
                bx: 0,
                value,
            }],
        }
    }

    #[test]
    fn channel_fires_at_full_rate_when_condition_holds() {
        let mut emulator = L0duEmulator::new(muon_config());
        let report = emulator.process_event(&event(15));
        assert!(report.channel_pre_decision_by_name("L0Muon", 0));
        assert!(report.channel_decision_by_name("L0Muon", 0));
        assert!(report.trigger_decision_by_name("Muon", 0));
        assert!(report.condition_value_by_name("MuPt>10", 0));
        assert_eq!(report.decision_value(), DecisionMask::PHYSICS);
        assert!(report.decision(DecisionMask::PHYSICS));
        assert!(!report.decision(DecisionMask::BEAM1));
        // the decision reconstructed from the summary bits agrees
        assert!(report.decision_from_summary(DecisionMask::PHYSICS, 0));
        assert!(report.pre_decision_from_summary(DecisionMask::PHYSICS, 0));
        assert!(!report.decision_from_summary(DecisionMask::BEAM2, 0));
        assert_eq!(report.bcid(), 1234);
        assert_eq!(report.tck(), 0x2A);
        assert!(report.is_valid());
    }

    #[test]
    fn channel_stays_quiet_below_threshold() {
        let mut emulator = L0duEmulator::new(muon_config());
        let report = emulator.process_event(&event(10));
        assert!(!report.channel_pre_decision_by_name("L0Muon", 0));
        assert!(!report.channel_decision_by_name("L0Muon", 0));
        assert!(!report.trigger_decision_by_name("Muon", 0));
        assert_eq!(report.decision_value(), DecisionMask::DISABLED);
        assert!(!report.decision_from_summary(DecisionMask::ANY, 0));
    }

    #[test]
    fn emulate_is_idempotent_within_an_event() {
        let mut emulator = L0duEmulator::new(muon_config());
        emulator.clear_event_state();
        assert!(emulator.inject("M0(Pt)", 0, 15));
        emulator.emulate_channel(0);
        let counter = emulator.channel_counter(0);
        let decision = emulator.channel_decision(0);
        emulator.emulate_channel(0);
        emulator.emulate_channel(0);
        assert_eq!(emulator.channel_counter(0), counter);
        assert_eq!(emulator.channel_decision(0), decision);
    }

    #[test]
    fn clearing_keeps_constants_and_counters() {
        let mut emulator = L0duEmulator::new(muon_config());
        let _ = emulator.process_event(&event(15));
        let counter = emulator.channel_counter(0);
        emulator.clear_event_state();
        // Predefined data with no new injection reads 0, constants survive
        assert_eq!(emulator.data_digit("M0(Pt)", 0), 0);
        assert_eq!(emulator.data_digit("CaloZero", 0), 3);
        assert_eq!(emulator.channel_counter(0), counter);
    }

    #[test]
    fn channel_without_conditions_never_pre_fires() {
        let config = Arc::new(L0duConfig::from_parts(
            0x2A,
            2,
            vec![],
            vec![],
            vec![Channel::new(
                0,
                "Empty",
                1_000_000,
                DecisionMask::PHYSICS,
                vec![],
                true,
            )],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        for _ in 0..10 {
            emulator.clear_event_state();
            emulator.emulate();
            assert!(!emulator.channel_pre_decision(0));
            assert!(!emulator.channel_decision(0));
        }
    }

    #[test]
    fn gated_counter_retains_accept_and_counter() {
        let config = Arc::new(L0duConfig::from_parts(
            0x2A,
            2,
            vec![ElementaryData::new(0, "M0(Pt)", DataKind::Predefined, 1.0, 0)],
            vec![ElementaryCondition::new(
                0,
                "MuPt>10",
                0,
                Comparator::Greater,
                10,
                false,
                None,
                0,
            )],
            vec![Channel::new(
                0,
                "L0Muon",
                500_000,
                DecisionMask::PHYSICS,
                vec![0],
                false,
            )],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        for _ in 0..5 {
            let _ = emulator.process_event(&event(15));
            assert_eq!(emulator.channel_counter(0), 0);
            // accept was never set: the channel pre-fires but cannot decide
            assert!(emulator.channel_pre_decision(0));
            assert!(!emulator.channel_decision(0));
        }
    }

    #[test]
    fn compound_sum_of_predefined_components() {
        let config = Arc::new(L0duConfig::from_parts(
            0x10,
            2,
            vec![
                ElementaryData::new(0, "A", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(1, "B", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(
                    2,
                    "A+B",
                    DataKind::Compound {
                        op: CompoundOp::Add,
                        components: vec![0, 1],
                    },
                    1.0,
                    0,
                ),
            ],
            vec![],
            vec![],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        emulator.clear_event_state();
        assert!(emulator.inject("A", 0, 3));
        assert!(emulator.inject("B", 0, 4));
        assert_eq!(emulator.data_digit("A+B", 0), 7);
        // memoized: changing an input after evaluation has no effect this event
        assert!(emulator.inject("A", 0, 100));
        assert_eq!(emulator.data_digit("A+B", 0), 7);
    }

    #[test]
    fn compound_bitwise_and_of_predefined_components() {
        let config = Arc::new(L0duConfig::from_parts(
            0x10,
            2,
            vec![
                ElementaryData::new(0, "A", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(1, "B", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(
                    2,
                    "A&B",
                    DataKind::Compound {
                        op: CompoundOp::And,
                        components: vec![0, 1],
                    },
                    1.0,
                    0,
                ),
            ],
            vec![],
            vec![],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        emulator.clear_event_state();
        assert!(emulator.inject("A", 0, 6));
        assert!(emulator.inject("B", 0, 3));
        assert_eq!(emulator.data_digit("A&B", 0), 2);
    }

    #[test]
    fn compound_left_fold_over_three_components() {
        let config = Arc::new(L0duConfig::from_parts(
            0x10,
            2,
            vec![
                ElementaryData::new(0, "A", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(1, "B", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(2, "C", DataKind::Predefined, 1.0, 0),
                ElementaryData::new(
                    3,
                    "A-B-C",
                    DataKind::Compound {
                        op: CompoundOp::Sub,
                        components: vec![0, 1, 2],
                    },
                    1.0,
                    0,
                ),
            ],
            vec![],
            vec![],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        emulator.clear_event_state();
        assert!(emulator.inject("A", 0, 10));
        assert!(emulator.inject("B", 0, 3));
        assert!(emulator.inject("C", 0, 2));
        assert_eq!(emulator.data_digit("A-B-C", 0), 5);
    }

    #[test]
    fn unknown_injection_is_dropped() {
        let mut emulator = L0duEmulator::new(muon_config());
        emulator.clear_event_state();
        assert!(!emulator.inject("E0(Et)", 0, 42));
        assert_eq!(emulator.data_digit("E0(Et)", 0), 0);
    }

    #[test]
    fn downscaled_channel_accepts_every_other_pre_fire() {
        let config = Arc::new(L0duConfig::from_parts(
            0x2A,
            2,
            vec![ElementaryData::new(0, "M0(Pt)", DataKind::Predefined, 1.0, 0)],
            vec![ElementaryCondition::new(
                0,
                "MuPt>10",
                0,
                Comparator::Greater,
                10,
                true,
                None,
                0,
            )],
            vec![Channel::new(
                0,
                "L0Muon",
                500_000,
                DecisionMask::PHYSICS,
                vec![0],
                true,
            )],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        let mut accepts = 0;
        for _ in 0..10 {
            let report = emulator.process_event(&event(15));
            assert!(report.channel_pre_decision_by_name("L0Muon", 0));
            if report.channel_decision_by_name("L0Muon", 0) {
                accepts += 1;
            }
        }
        assert_eq!(accepts, 5);
    }

    #[test]
    fn is_downscaled_tracks_pre_vs_final_decision() {
        let config = Arc::new(L0duConfig::from_parts(
            0x2A,
            2,
            vec![ElementaryData::new(0, "M0(Pt)", DataKind::Predefined, 1.0, 0)],
            vec![ElementaryCondition::new(
                0,
                "MuPt>10",
                0,
                Comparator::Greater,
                10,
                true,
                None,
                0,
            )],
            vec![Channel::new(
                0,
                "L0Muon",
                500_000,
                DecisionMask::PHYSICS,
                vec![0],
                true,
            )],
            vec![],
        ));
        let mut emulator = L0duEmulator::new(config);
        // event 1: pre-fires, counter at 500_000, not accepted
        let _ = emulator.process_event(&event(15));
        assert!(!emulator.is_downscaled());
        // event 2: counter wraps, accepted
        let _ = emulator.process_event(&event(15));
        assert!(emulator.is_downscaled());
    }

    #[test]
    fn report_caches_touched_data_values() {
        let mut emulator = L0duEmulator::new(muon_config());
        let report = emulator.process_event(&event(15));
        assert_eq!(report.data_digit("M0(Pt)", 0), 15);
        assert_eq!(report.data_value("M0(Pt)", 0), 600.0);
        // constants are always cached
        assert_eq!(report.data_digit("CaloZero", 0), 3);
    }
}
