//! Long-run downscaling behavior of the emulator, driven through the public
//! library API: the deterministic rate limiter must converge to the configured
//! accept fraction over many events, with counter state carried across events.

use l0dulator::events::{DataInjection, EventRecord};
use l0dulator::l0du::emulator::L0duEmulator;
use l0dulator::l0du::DOWNSCALE_SCALE;
use l0dulator::recipe::Recipe;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const RECIPE_MUON: &str = r#"
tck = 42

[[data]]
name = "M0(Pt)"
kind = "predefined"
scale = 40.0
saturation = 255

[[condition]]
name = "MuPt>threshold"
data = "M0(Pt)"
comparator = ">"
threshold = 10

[[channel]]
name = "L0Muon"
rate = 500000
decision_type = ["Physics"]
conditions = ["MuPt>threshold"]
"#;

fn muon_event(value: u32) -> EventRecord {
    EventRecord {
        bcid: 0,
        data: vec![DataInjection {
            name: "M0(Pt)".to_string(),
            bx: 0,
            value,
        }],
    }
}

#[test]
fn half_rate_channel_accepts_exactly_half_of_a_million_pre_fires() {
    let config = Arc::new(Recipe::from_toml_str(RECIPE_MUON).unwrap().build().unwrap());
    let mut emulator = L0duEmulator::new(config);
    let event = muon_event(15);

    let mut accepts: u64 = 0;
    for _ in 0..1_000_000u64 {
        let report = emulator.process_event(&event);
        assert!(report.channel_pre_decision_by_name("L0Muon", 0));
        if report.channel_decision_by_name("L0Muon", 0) {
            accepts += 1;
        }
    }
    // DOWNSCALE_SCALE % rate == 0: the accept pattern is exactly periodic
    assert_eq!(accepts, 500_000);
}

#[test]
fn odd_rate_channel_converges_with_bounded_jitter() {
    let recipe = RECIPE_MUON.replace("rate = 500000", "rate = 123457");
    let config = Arc::new(Recipe::from_toml_str(&recipe).unwrap().build().unwrap());
    let mut emulator = L0duEmulator::new(config);
    let event = muon_event(15);

    let n: u64 = 1_000_000;
    let mut accepts: u64 = 0;
    for _ in 0..n {
        let report = emulator.process_event(&event);
        if report.channel_decision_by_name("L0Muon", 0) {
            accepts += 1;
        }
    }
    let expected = n * 123_457 / u64::from(DOWNSCALE_SCALE);
    assert!(
        accepts.abs_diff(expected) <= 1,
        "accepts = {accepts}, expected = {expected}"
    );
}

#[test]
fn counter_survives_quiet_stretches_between_pre_fires() {
    let config = Arc::new(Recipe::from_toml_str(RECIPE_MUON).unwrap().build().unwrap());
    let mut emulator = L0duEmulator::new(config);

    // one pre-fire loads the counter halfway
    let _ = emulator.process_event(&muon_event(15));
    assert_eq!(emulator.channel_counter(0), 500_000);

    // quiet crossings leave the accumulator untouched
    for _ in 0..100 {
        let report = emulator.process_event(&muon_event(3));
        assert!(!report.channel_pre_decision_by_name("L0Muon", 0));
    }
    assert_eq!(emulator.channel_counter(0), 500_000);

    // the next pre-fire completes the cycle and is accepted
    let report = emulator.process_event(&muon_event(15));
    assert!(report.channel_decision_by_name("L0Muon", 0));
    assert_eq!(emulator.channel_counter(0), 0);
}

#[test]
fn accept_count_after_scale_over_rate_events_matches_the_fraction() {
    // N = ceil(SCALE / r) consecutive pre-fires accept floor(N * r / SCALE) +- 1
    for rate in [1u32, 3, 999, 250_000, 333_333, 999_999] {
        let recipe = RECIPE_MUON.replace("rate = 500000", &format!("rate = {rate}"));
        let config = Arc::new(Recipe::from_toml_str(&recipe).unwrap().build().unwrap());
        let mut emulator = L0duEmulator::new(config);
        let event = muon_event(15);

        let n = u64::from(DOWNSCALE_SCALE.div_ceil(rate));
        let mut accepts: u64 = 0;
        for _ in 0..n {
            let report = emulator.process_event(&event);
            if report.channel_decision_by_name("L0Muon", 0) {
                accepts += 1;
            }
        }
        let expected = n * u64::from(rate) / u64::from(DOWNSCALE_SCALE);
        assert!(
            accepts.abs_diff(expected) <= 1,
            "rate = {rate}: accepts = {accepts}, expected = {expected}"
        );
    }
}
