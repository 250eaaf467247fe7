#![allow(dead_code)]
/// Re-export some common utilities for system tests
pub use assert_cmd::prelude::*; // Add methods on commands
pub use assert_cmd::Command; // Get the methods for the Commands struct
pub use assert_fs::prelude::*; // Create temporary directories
pub use assert_fs::TempDir;
pub use predicates::prelude::*; // Used for writing assertions
#[allow(unused_imports)]
use pretty_assertions::{assert_eq, assert_ne, assert_str_eq};

/// A minimal recipe with a single half-rate muon channel, thresholds in raw
/// digit units.
pub const RECIPE_MUON_HALF_RATE: &str = r#"
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

[[trigger]]
name = "Muon"
decision_type = ["Physics"]
channels = ["L0Muon"]
"#;

/// Events for [RECIPE_MUON_HALF_RATE]: three crossings above threshold, one below.
pub const EVENTS_MUON: &str = r#"[
    {"bcid": 1, "data": [{"name": "M0(Pt)", "value": 15}]},
    {"bcid": 2, "data": [{"name": "M0(Pt)", "value": 3}]},
    {"bcid": 3, "data": [{"name": "M0(Pt)", "value": 20}]},
    {"bcid": 4, "data": [{"name": "M0(Pt)", "value": 11}]}
]"#;

/// A recipe with a cyclic compound data graph, rejected at build time.
pub const RECIPE_CYCLIC: &str = r#"
tck = 7

[[data]]
name = "A"
kind = "compound"
operator = "+"
components = ["B"]

[[data]]
name = "B"
kind = "compound"
operator = "+"
components = ["A"]
"#;

/// Write `recipe` and `events` to files in a fresh temp dir and return the dir.
pub fn write_recipe_and_events(
    recipe: &str,
    events: &str,
) -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    dir.child("recipe.toml").write_str(recipe)?;
    dir.child("events.json").write_str(events)?;
    Ok(dir)
}

/// Helper function to match the raw output of stderr or stdout, with a
/// pattern a fixed amount of times, case insensitive
pub fn match_on_out_no_case(
    byte_output: &[u8],
    re_str: &str,
    expect_match: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Convert the output to string as utf-8
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    // Build the case-insensitive regex predicate and count the matches
    let pred = predicate::str::is_match("(?i)".to_owned() + re_str)?.count(expect_match);
    assert!(
        pred.eval(str_res),
        "Expected {expect_match} matches of {re_str:?} in output:\n{str_res}"
    );
    Ok(())
}

/// Asserts that the output of stderr is empty of errors and warnings
pub fn assert_no_errors_or_warn(byte_output: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    match_on_out_no_case(byte_output, "(error)|(warn)", 0)
}
