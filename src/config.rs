//! Contains the [Cfg] struct that parses and stores the command line arguments
//!
//! [Cfg] uses procedural macros from the `clap` library to implement most of
//! the argument parsing and validation logic. The [Cfg] struct implements
//! several options and subcommands, as well as convenience functions to get
//! various parts of the configuration.

use crate::config::emulate::{EmulateArgs, EmulateOpt};
use crate::config::inputoutput::{DataOutputFormat, DataOutputMode, InputOutputOpt};
use crate::config::util::UtilOpt;
use crate::config::view::{ViewArgs, ViewCommands, ViewOpt};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub mod emulate;
pub mod inputoutput;
pub mod lib;
pub mod prelude;
pub mod test_util;
pub mod util;
pub mod view;

/// The [CONFIG] static variable is used to store the [Cfg] created from the parsed command line arguments
pub static CONFIG: OnceLock<Cfg> = OnceLock::new();

/// The [Cfg] struct uses procedural macros and implements the [Config](lib::Config) trait,
/// to provide convenient access to the command line arguments.
#[derive(Parser, Debug)]
#[command(name = "l0dulator - Level-0 Decision Unit emulator")]
#[command(bin_name = "l0dulator", version)]
#[command(about = "l0dulator replays the LHCb L0DU trigger decision logic, bit-for-bit.")]
#[command(
    long_about = "\nl0dulator loads a trigger configuration recipe and replays the\n\
Level-0 Decision Unit decision logic over recorded elementary data,\n\
reproducing the accept/reject decision of the hardware board per\n\
bunch-crossing.\n\
\n\
Project home page: https://gitlab.cern.ch/lhcb-trigger/l0dulator"
)]
#[command(propagate_version = true)]
#[command(styles = lib::styles())]
pub struct Cfg {
    /// Recipe TOML file describing the trigger configuration
    #[arg(name = "Recipe", value_hint = clap::ValueHint::FilePath)]
    recipe: Option<PathBuf>,

    /// Commands such as `Emulate` or `View` that accept further subcommands
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Verbosity level 0-4 (Errors, Warnings, Info, Debug, Trace)
    #[arg(short = 'v', long = "verbosity", default_value_t = 1, global = true)]
    verbosity: u8,

    /// Set the exit code for if any errors are detected during emulation (cannot be 0)
    #[arg(
        short = 'E',
        long = "any-errors-exit-code",
        visible_alias = "exit-code",
        global = true
    )]
    any_errors_exit_code: Option<u8>,

    /// Don't show error messages - helpful if you just want to see the report
    #[arg(short, long, default_value_t = false, global = true)]
    mute_errors: bool,

    /// Generate a recipe TOML file in the current directory that can be used as a template for a trigger configuration.
    #[arg(short, long, default_value_t = false, global = true, visible_aliases = ["gen-toml", "gen-recipe"])]
    generate_recipe_toml: bool,

    /// Output stats (default: none), requires setting a stats format option (JSON, TOML)
    #[arg(
        name = "OUTPUT FINAL STATS",
        short = 'S',
        long = "output-stats",
        default_value_t = DataOutputMode::None,
        visible_aliases = ["output-stats-report", "output-final-stats"],
        global = true,
        requires = "STATS FORMAT"
    )]
    stats_output: DataOutputMode,

    /// Output stats format (JSON/TOML), requires setting a stats output option
    #[arg(
        name = "STATS FORMAT",
        short = 'D',
        long = "stats-format",
        visible_alias = "stats-data-format",
        global = true,
        requires = "OUTPUT FINAL STATS"
    )]
    stats_output_format: Option<DataOutputFormat>,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(
        long = "generate-completions",
        value_hint = clap::ValueHint::Other,
        value_name = "SHELL"
    )]
    pub generate_completions: Option<Shell>,
}

/// Subcommands of the main command.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Emulate the configuration over an events file and print the end-of-run report
    Emulate(EmulateArgs),
    /// Display a human-readable view of the loaded configuration
    View(ViewArgs),
}

/// Initializes the [Cfg] global from the command line arguments and validates them.
pub fn init_config() -> Result<(), String> {
    let cfg = <Cfg as Parser>::parse();
    lib::Config::validate_args(&cfg)?;
    CONFIG.set(cfg).expect("Config already initialized");
    Ok(())
}

impl Cfg {
    /// Get a reference to the global config
    pub fn global() -> &'static Cfg {
        CONFIG.get().expect("Config is not initialized")
    }

    /// Whether a template recipe should be generated instead of processing.
    pub fn generate_recipe_toml_enabled(&self) -> bool {
        self.generate_recipe_toml
    }

    /// Generate completion scripts for the specified shell.
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Cfg as clap::CommandFactory>::command(),
            "l0dulator",
            &mut std::io::stdout(),
        );
    }
}

/// Implementing the config super trait requires implementing all the sub traits
impl lib::Config for Cfg {}

impl UtilOpt for Cfg {
    fn verbosity(&self) -> u8 {
        self.verbosity
    }

    fn any_errors_exit_code(&self) -> Option<u8> {
        self.any_errors_exit_code
    }

    fn mute_errors(&self) -> bool {
        self.mute_errors
    }
}

impl InputOutputOpt for Cfg {
    fn recipe_file(&self) -> Option<&Path> {
        self.recipe.as_deref()
    }

    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output.clone()
    }

    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl EmulateOpt for Cfg {
    fn emulation(&self) -> Option<EmulateArgs> {
        match &self.cmd {
            Some(Command::Emulate(args)) => Some(args.clone()),
            _ => None,
        }
    }
}

impl ViewOpt for Cfg {
    #[inline]
    fn view(&self) -> Option<ViewCommands> {
        match &self.cmd {
            Some(Command::View(view_sub_cmd)) => Some(view_sub_cmd.cmd),
            _ => None,
        }
    }
}
