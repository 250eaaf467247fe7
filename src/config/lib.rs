//! Contains the [Config] super trait, and all the sub traits required by it
//!
//! Implementing the [Config] super trait is required by configs passed to
//! structs in other modules as part of instantiation.

use super::emulate::EmulateOpt;
use super::inputoutput::{DataOutputMode, InputOutputOpt};
use super::util::UtilOpt;
use super::view::ViewOpt;

/// Super trait for all the traits that needed to be implemented by the config struct
pub trait Config: Send + Sync + std::marker::Sized
where
    // Subtraits that group together related configuration options
    Self: UtilOpt + InputOutputOpt + EmulateOpt + ViewOpt,
{
    /// Validate the arguments of the config
    fn validate_args(&self) -> Result<(), String> {
        if self.any_errors_exit_code().is_some_and(|val| val == 0) {
            return Err("Invalid config: Exit code for any errors cannot be 0".to_string());
        }
        if self.stats_output_mode() != DataOutputMode::None && self.stats_output_format().is_none()
        {
            return Err(
                "Invalid config: Stats output mode set without a stats output format".to_string(),
            );
        }
        if let Some(recipe) = self.recipe_file() {
            if !recipe.is_file() {
                return Err(format!(
                    "Invalid config: Recipe file does not exist (got: {})",
                    recipe.to_string_lossy()
                ));
            }
        }
        Ok(())
    }
}

impl<T> Config for &T
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (*self).validate_args()
    }
}

impl<T> Config for Box<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }
}

impl<T> Config for std::sync::Arc<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }
}

/// Styling of the CLI help output.
pub fn styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects};
    clap::builder::Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .placeholder(AnsiColor::Cyan.on_default())
}
