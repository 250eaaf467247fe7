use crate::util::*;
use predicates::str::contains;
mod util;

// Asserts that the end of processing report summary contains correct information
fn validate_report_summary(byte_output: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let match_patterns = vec![
        "L0DU EMULATION REPORT",
        "TCK.*0x002A",
        "Events emulated.*4",
        "Events accepted.*1",
        "L0Muon.*500000",
    ];
    for pattern in match_patterns {
        match_on_out_no_case(byte_output, pattern, 1)?;
    }
    Ok(())
}

#[test]
fn emulate_muon_events() -> Result<(), Box<dyn std::error::Error>> {
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, EVENTS_MUON)?;
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("events.json").path());
    cmd.assert().success();

    assert_no_errors_or_warn(&cmd.output()?.stderr)?;
    // 3 of 4 crossings pre-fire; at half rate only the 2nd pre-fire is accepted
    validate_report_summary(&cmd.output()?.stdout)?;

    Ok(())
}

#[test]
fn emulate_muon_events_with_repeat() -> Result<(), Box<dyn std::error::Error>> {
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, EVENTS_MUON)?;
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("events.json").path())
        .arg("--repeat")
        .arg("1000");
    cmd.assert().success();

    assert_no_errors_or_warn(&cmd.output()?.stderr)?;
    match_on_out_no_case(&cmd.output()?.stdout, "Events emulated.*1000", 1)?;
    // 750 pre-fires at half rate: exactly 375 accepts (deterministic downscaler)
    match_on_out_no_case(&cmd.output()?.stdout, "750.*375", 1)?;

    Ok(())
}

#[test]
fn emulate_stats_output_json_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, EVENTS_MUON)?;
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("events.json").path())
        .arg("--output-stats")
        .arg("stdout")
        .arg("--stats-format")
        .arg("json");
    cmd.assert().success().stdout(contains("\"events_seen\": 4"));

    Ok(())
}

#[test]
fn emulate_stats_output_toml_to_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, EVENTS_MUON)?;
    let stats_file = dir.child("stats.toml");
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("events.json").path())
        .arg("-S")
        .arg(stats_file.path())
        .arg("-D")
        .arg("toml");
    cmd.assert().success();

    stats_file.assert(contains("events_seen = 4"));

    Ok(())
}

#[test]
fn emulate_unknown_data_name_reports_error_and_exit_code() -> Result<(), Box<dyn std::error::Error>>
{
    let events = r#"[{"bcid": 1, "data": [{"name": "E0(Et)", "value": 9}]}]"#;
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, events)?;
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("events.json").path())
        .arg("--any-errors-exit-code")
        .arg("13");
    cmd.assert().code(13);

    match_on_out_no_case(&cmd.output()?.stderr, "unknown elementary data.*E0", 1)?;

    Ok(())
}

#[test]
fn emulate_missing_events_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = write_recipe_and_events(RECIPE_MUON_HALF_RATE, EVENTS_MUON)?;
    let mut cmd = Command::cargo_bin("l0dulator")?;

    cmd.arg(dir.child("recipe.toml").path())
        .arg("emulate")
        .arg(dir.child("no_such_events.json").path());
    cmd.assert().failure();

    match_on_out_no_case(&cmd.output()?.stderr, "Processing failed", 1)?;

    Ok(())
}
