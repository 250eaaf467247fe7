//! Trait and subcommands for the `view` subcommand.

use clap::{Args, Subcommand};

/// A config that implements this trait can be used to enable views.
pub trait ViewOpt {
    /// Type of view to generate.
    fn view(&self) -> Option<ViewCommands>;
}

impl<T> ViewOpt for &T
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (*self).view()
    }
}

impl<T> ViewOpt for Box<T>
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (**self).view()
    }
}

impl<T> ViewOpt for std::sync::Arc<T>
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (**self).view()
    }
}

/// Arguments to the `view` subcommand.
#[derive(Debug, Args, Clone, PartialEq)]
pub struct ViewArgs {
    /// Which part of the configuration to display
    #[command(subcommand)]
    pub cmd: ViewCommands,
}

/// View subcommand to display a human-readable view of the loaded configuration.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum ViewCommands {
    /// Display the whole recipe: data, conditions, channels and triggers
    Recipe,
    /// Display the channels and triggers only
    Channels,
    /// Display the elementary data and conditions only
    Data,
}
