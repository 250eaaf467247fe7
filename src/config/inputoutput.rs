//! Contains the [InputOutputOpt] Trait for all input/output options and the
//! [DataOutputMode] and [DataOutputFormat] enums for the stats output.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Input/Output option set by a user
pub trait InputOutputOpt {
    /// Recipe file describing the trigger configuration.
    fn recipe_file(&self) -> Option<&Path>;
    /// Stats output mode (file, stdout, none)
    fn stats_output_mode(&self) -> DataOutputMode;
    /// Stats output format (JSON, TOML)
    fn stats_output_format(&self) -> Option<DataOutputFormat>;
}

impl<T> InputOutputOpt for &T
where
    T: InputOutputOpt,
{
    fn recipe_file(&self) -> Option<&Path> {
        (*self).recipe_file()
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        (*self).stats_output_mode()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        (*self).stats_output_format()
    }
}

impl<T> InputOutputOpt for Box<T>
where
    T: InputOutputOpt,
{
    fn recipe_file(&self) -> Option<&Path> {
        (**self).recipe_file()
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        (**self).stats_output_mode()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        (**self).stats_output_format()
    }
}

impl<T> InputOutputOpt for std::sync::Arc<T>
where
    T: InputOutputOpt,
{
    fn recipe_file(&self) -> Option<&Path> {
        (**self).recipe_file()
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        (**self).stats_output_mode()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        (**self).stats_output_format()
    }
}

/// Enum for all possible stats output modes.
#[derive(PartialEq, Debug, Clone)]
pub enum DataOutputMode {
    /// Write to a file.
    File(Box<Path>),
    /// Write to stdout.
    Stdout,
    /// Do not write stats out.
    None,
}

impl fmt::Display for DataOutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOutputMode::File(p) => write!(f, "File({})", p.display()),
            DataOutputMode::Stdout => write!(f, "Stdout"),
            DataOutputMode::None => write!(f, "None"),
        }
    }
}

impl FromStr for DataOutputMode {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STDOUT" => Ok(DataOutputMode::Stdout),
            "NONE" => Ok(DataOutputMode::None),
            _ => Ok(DataOutputMode::File(Path::new(s).into())),
        }
    }
}

/// Enum for the supported stats output formats.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum DataOutputFormat {
    /// JSON format.
    Json,
    /// TOML format.
    Toml,
}

impl fmt::Display for DataOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOutputFormat::Json => write!(f, "JSON"),
            DataOutputFormat::Toml => write!(f, "TOML"),
        }
    }
}

impl FromStr for DataOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "JSON" => Ok(DataOutputFormat::Json),
            "TOML" => Ok(DataOutputFormat::Toml),
            _ => Err(format!("Unknown stats output format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_mode_from_str() {
        assert_eq!(
            "stdout".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::Stdout
        );
        assert_eq!(
            "NONE".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::None
        );
        assert_eq!(
            "stats.json".parse::<DataOutputMode>().unwrap(),
            DataOutputMode::File(Path::new("stats.json").into())
        );
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!(
            "json".parse::<DataOutputFormat>().unwrap(),
            DataOutputFormat::Json
        );
        assert_eq!(
            "TOML".parse::<DataOutputFormat>().unwrap(),
            DataOutputFormat::Toml
        );
        assert!("yaml".parse::<DataOutputFormat>().is_err());
    }
}
