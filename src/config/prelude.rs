//! Re-exports the config traits and supporting types in one place.

pub use super::emulate::{EmulateArgs, EmulateOpt};
pub use super::inputoutput::{DataOutputFormat, DataOutputMode, InputOutputOpt};
pub use super::lib::Config;
pub use super::util::UtilOpt;
pub use super::view::{ViewCommands, ViewOpt};
