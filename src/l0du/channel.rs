//! Trigger channels: an AND-group of conditions behind a deterministic downscaler.

use super::{DecisionMask, DOWNSCALE_SCALE};

/// One trigger channel of a configuration.
///
/// The per-event decision flags and the cross-event downscaling counter live
/// in the emulator, in separate structures: the flags are scratch state that
/// is reset every event, the counter is a running accumulator that must
/// survive for the lifetime of the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    id: u32,
    name: String,
    rate: u32,
    decision_type: DecisionMask,
    conditions: Vec<usize>,
    update_counter: bool,
}

impl Channel {
    /// Create a new channel over the conditions at the given arena indices.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        rate: u32,
        decision_type: DecisionMask,
        conditions: Vec<usize>,
        update_counter: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rate,
            decision_type,
            conditions,
            update_counter,
        }
    }

    /// Numeric id of the channel within its configuration.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name of the channel, e.g. `"L0Muon"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accept rate out of [DOWNSCALE_SCALE].
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Decision types this channel contributes to when it fires.
    pub fn decision_type(&self) -> DecisionMask {
        self.decision_type
    }

    /// Arena indices of the AND-grouped conditions.
    pub fn conditions(&self) -> &[usize] {
        &self.conditions
    }

    /// Whether the downscaling counter advances when this channel is emulated.
    pub fn update_counter(&self) -> bool {
        self.update_counter
    }
}

/// Persistent downscaling state of one channel.
///
/// A deterministic token-bucket rate limiter: the counter accumulates `rate`
/// units per pre-fired crossing and the channel accepts whenever the sum
/// crosses [DOWNSCALE_SCALE], then wraps. Average accept fraction is
/// `rate / DOWNSCALE_SCALE` with accepts spread evenly in time instead of
/// pseudo-randomly. Resetting this state per event would break the
/// rate-limiting contract; it is only created at configuration load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownscaleCounter {
    counter: u32,
    accept: bool,
}

impl DownscaleCounter {
    /// Advance the counter for one emulated crossing.
    ///
    /// Only called when the channel's `update_counter` is set: a gated channel
    /// keeps both its counter and its previous `accept` value unchanged.
    pub fn step(&mut self, pre_decision: bool, rate: u32) {
        if pre_decision {
            self.counter += rate;
        }
        if self.counter >= DOWNSCALE_SCALE {
            self.accept = true;
            self.counter -= DOWNSCALE_SCALE;
        } else {
            self.accept = false;
        }
    }

    /// Current counter value, in `[0, DOWNSCALE_SCALE)` for any `rate <= DOWNSCALE_SCALE`.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Outcome of the most recent downscaling step.
    pub fn accept(&self) -> bool {
        self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counter_accepts_every_other_crossing_at_half_rate() {
        let mut counter = DownscaleCounter::default();
        let mut accepts = 0;
        for _ in 0..10 {
            counter.step(true, 500_000);
            if counter.accept() {
                accepts += 1;
            }
        }
        assert_eq!(accepts, 5);
        // Exact periodicity: DOWNSCALE_SCALE % rate == 0 -> the counter returns to 0.
        assert_eq!(counter.counter(), 0);
    }

    #[test]
    fn counter_conserves_accept_fraction_with_bounded_jitter() {
        let rate = 333_333;
        let mut counter = DownscaleCounter::default();
        let n: u64 = 1_000_000;
        let mut accepts: u64 = 0;
        for _ in 0..n {
            counter.step(true, rate);
            if counter.accept() {
                accepts += 1;
            }
        }
        let expected = n * u64::from(rate) / u64::from(DOWNSCALE_SCALE);
        assert!(accepts.abs_diff(expected) <= 1, "accepts = {accepts}, expected = {expected}");
    }

    #[test]
    fn counter_is_untouched_without_pre_decision() {
        let mut counter = DownscaleCounter::default();
        counter.step(true, 400_000);
        let before = counter.counter();
        counter.step(false, 400_000);
        assert_eq!(counter.counter(), before);
        assert!(!counter.accept());
    }

    #[test]
    fn full_rate_accepts_every_crossing() {
        let mut counter = DownscaleCounter::default();
        for _ in 0..100 {
            counter.step(true, DOWNSCALE_SCALE);
            assert!(counter.accept());
            assert_eq!(counter.counter(), 0);
        }
    }

    #[test]
    fn zero_rate_never_accepts() {
        let mut counter = DownscaleCounter::default();
        for _ in 0..100 {
            counter.step(true, 0);
            assert!(!counter.accept());
        }
    }
}
