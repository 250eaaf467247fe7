//! Contains a [MockConfig] that can be used in tests in place of the real
//! command-line [Cfg](super::Cfg).

use super::emulate::{EmulateArgs, EmulateOpt};
use super::inputoutput::{DataOutputFormat, DataOutputMode, InputOutputOpt};
use super::lib::Config;
use super::util::UtilOpt;
use super::view::{ViewCommands, ViewOpt};
use std::path::{Path, PathBuf};

/// Configurable mock of the global config, field per option.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Recipe file to load.
    pub recipe: Option<PathBuf>,
    /// Emulation arguments, if the emulate path is under test.
    pub emulate: Option<EmulateArgs>,
    /// View command, if the view path is under test.
    pub view: Option<ViewCommands>,
    /// Logger verbosity.
    pub verbosity: u8,
    /// Exit code override when any errors were collected.
    pub any_errors_exit_code: Option<u8>,
    /// Suppress error messages.
    pub mute_errors: bool,
    /// Stats output destination.
    pub stats_output: Option<DataOutputMode>,
    /// Stats output format.
    pub stats_output_format: Option<DataOutputFormat>,
}

impl MockConfig {
    /// A mock config with everything off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Config for MockConfig {}

impl UtilOpt for MockConfig {
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

impl InputOutputOpt for MockConfig {
    fn recipe_file(&self) -> Option<&Path> {
        self.recipe.as_deref()
    }

    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output.clone().unwrap_or(DataOutputMode::None)
    }

    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl EmulateOpt for MockConfig {
    fn emulation(&self) -> Option<EmulateArgs> {
        self.emulate.clone()
    }
}

impl ViewOpt for MockConfig {
    fn view(&self) -> Option<ViewCommands> {
        self.view
    }
}
