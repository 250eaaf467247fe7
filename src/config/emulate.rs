//! Trait and arguments for the `emulate` subcommand.

use clap::Args;
use std::path::PathBuf;

/// A config that implements this trait can be used to enable emulation.
pub trait EmulateOpt {
    /// The emulation arguments, if the `emulate` subcommand was given.
    fn emulation(&self) -> Option<EmulateArgs>;
}

impl<T> EmulateOpt for &T
where
    T: EmulateOpt,
{
    fn emulation(&self) -> Option<EmulateArgs> {
        (*self).emulation()
    }
}

impl<T> EmulateOpt for Box<T>
where
    T: EmulateOpt,
{
    fn emulation(&self) -> Option<EmulateArgs> {
        (**self).emulation()
    }
}

impl<T> EmulateOpt for std::sync::Arc<T>
where
    T: EmulateOpt,
{
    fn emulation(&self) -> Option<EmulateArgs> {
        (**self).emulation()
    }
}

/// Arguments to the `emulate` subcommand.
#[derive(Debug, Args, Clone, PartialEq, Default)]
pub struct EmulateArgs {
    /// Events file: a JSON array of per-crossing elementary data records
    #[arg(name = "Events", value_hint = clap::ValueHint::FilePath)]
    pub events: PathBuf,

    /// Replay the event list cyclically until this many events were emulated.
    /// Useful for downscaling rate studies with a short input file
    #[arg(short = 'r', long, visible_alias = "replay")]
    pub repeat: Option<u64>,
}
