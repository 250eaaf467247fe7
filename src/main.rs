use l0dulator::config::init_config;
use l0dulator::config::Cfg;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub fn main() -> std::process::ExitCode {
    human_panic::setup_panic!();

    if let Err(e) = init_config() {
        eprintln!("{e}");
        return std::process::ExitCode::from(1);
    };

    l0dulator::util::lib::init_error_logger(Cfg::global());

    if let Some(shell) = Cfg::global().generate_completions {
        Cfg::generate_completion_script(shell);
        return std::process::ExitCode::from(0);
    }

    if Cfg::global().generate_recipe_toml_enabled() {
        if let Err(e) = l0dulator::recipe::generate_recipe_toml(Path::new("l0du_recipe.toml")) {
            l0dulator::display_error(&format!("Failed to generate recipe TOML: {e}"));
            return std::process::ExitCode::from(1);
        }
        log::info!("'l0du_recipe.toml' file generated in current directory. Use it as a template for a trigger configuration. Exiting...");
        return std::process::ExitCode::from(0);
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let any_errors_flag = AtomicBool::new(false);

    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is enabled)
    l0dulator::util::lib::init_ctrlc_handler(stop_flag.clone());

    let exit_code: u8 =
        match l0dulator::init_processing(Cfg::global(), &stop_flag, &any_errors_flag) {
            Ok(_) => 0,
            Err(e) => {
                l0dulator::display_error(&format!("Processing failed: {e}"));
                1
            }
        };

    l0dulator::util::lib::exit(exit_code, &any_errors_flag)
}
