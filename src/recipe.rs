//! Recipe loading: the TOML description of one trigger configuration, and the
//! builder that turns it into a validated, fully linked [L0duConfig].
//!
//! All referential validation lives here, on the configuration-provider side:
//! the emulation core trusts a built configuration. Structural defects
//! (duplicate names, dangling references, cyclic compound graphs) are hard
//! build errors; symbol-level defects (unknown comparator/operator symbols,
//! out-of-range rates) are warnings that degrade to the documented inert
//! behavior, matching the hardware-emulation contract.

use crate::l0du::channel::Channel;
use crate::l0du::condition::{Comparator, ElementaryCondition};
use crate::l0du::configuration::L0duConfig;
use crate::l0du::elementary_data::{CompoundOp, DataKind, ElementaryData};
use crate::l0du::trigger::Trigger;
use crate::l0du::{BxOffset, DecisionMask, DOWNSCALE_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Errors from loading or building a recipe.
#[derive(Debug)]
pub enum RecipeError {
    /// The recipe file could not be read.
    Io(io::Error),
    /// The recipe file is not valid TOML for the recipe schema.
    Parse(toml::de::Error),
    /// Two entities of the same kind share a name.
    DuplicateName {
        /// Entity kind ("data", "condition", "channel", "trigger").
        kind: &'static str,
        /// The offending name.
        name: String,
    },
    /// An entity references a name that is not part of the recipe.
    UnknownReference {
        /// Entity kind of the missing referent.
        kind: &'static str,
        /// The missing name.
        name: String,
        /// Name of the entity holding the reference.
        referenced_by: String,
    },
    /// The compound data dependency graph contains a cycle.
    CyclicCompound {
        /// Name of a datum on the cycle.
        name: String,
    },
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::Io(e) => write!(f, "Failed to read recipe: {e}"),
            RecipeError::Parse(e) => write!(f, "Failed to parse recipe: {e}"),
            RecipeError::DuplicateName { kind, name } => {
                write!(f, "Duplicate {kind} name in recipe: {name}")
            }
            RecipeError::UnknownReference {
                kind,
                name,
                referenced_by,
            } => write!(
                f,
                "Unknown {kind} referenced by {referenced_by}: {name}"
            ),
            RecipeError::CyclicCompound { name } => write!(
                f,
                "Cyclic compound data dependency involving: {name}"
            ),
        }
    }
}

impl std::error::Error for RecipeError {}

impl From<io::Error> for RecipeError {
    fn from(e: io::Error) -> Self {
        RecipeError::Io(e)
    }
}

impl From<toml::de::Error> for RecipeError {
    fn from(e: toml::de::Error) -> Self {
        RecipeError::Parse(e)
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_bank_version() -> u8 {
    2
}

fn default_decision_type() -> Vec<String> {
    vec!["Physics".to_string()]
}

/// Kind tag of a `[[data]]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKindDef {
    /// Injected per event.
    #[default]
    Predefined,
    /// Fixed value, requires `value`.
    Constant,
    /// Injected base value, read back with a crossing shift.
    RamBcid,
    /// Derived, requires `operator` and `components`.
    Compound,
}

/// One `[[data]]` table of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataDef {
    /// Name of the datum.
    pub name: String,
    /// How the digit is produced.
    #[serde(default)]
    pub kind: DataKindDef,
    /// Fixed raw value (constant kind only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    /// Raw-to-physical conversion factor.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Saturation value of the hardware quantity.
    #[serde(default)]
    pub saturation: u32,
    /// Operator symbol (compound kind only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Component data names (compound kind only), folded in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

/// One `[[condition]]` table of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDef {
    /// Name of the condition.
    pub name: String,
    /// Name of the datum the condition reads.
    pub data: String,
    /// Comparator symbol: `<`, `>`, `==` or `!=`.
    pub comparator: String,
    /// Threshold in raw digit units.
    pub threshold: u32,
    /// Whether the condition contributes a bit to the condition-value summary.
    #[serde(default = "default_true")]
    pub reported: bool,
    /// Summary bit override; defaults to the condition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_bit: Option<u32>,
    /// Crossing offset of the datum to read.
    #[serde(default)]
    pub bx: BxOffset,
}

/// One `[[channel]]` table of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDef {
    /// Name of the channel.
    pub name: String,
    /// Accept rate out of 1 000 000.
    pub rate: u32,
    /// Decision types the channel contributes to.
    #[serde(default = "default_decision_type")]
    pub decision_type: Vec<String>,
    /// Names of the AND-grouped conditions.
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Whether the downscaling counter advances on emulation.
    #[serde(default = "default_true")]
    pub update_counter: bool,
}

/// One `[[trigger]]` table of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerDef {
    /// Name of the trigger.
    pub name: String,
    /// Decision types the trigger selects member channels by.
    #[serde(default = "default_decision_type")]
    pub decision_type: Vec<String>,
    /// Names of the OR-grouped member channels.
    #[serde(default)]
    pub channels: Vec<String>,
}

/// A parsed recipe file: one trigger configuration, not yet linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    /// Trigger Configuration Key the recipe is registered under.
    pub tck: u16,
    /// Version of the summary bank layout.
    #[serde(default = "default_bank_version")]
    pub bank_version: u8,
    /// Elementary data tables.
    #[serde(default, rename = "data")]
    pub data: Vec<DataDef>,
    /// Condition tables.
    #[serde(default, rename = "condition")]
    pub conditions: Vec<ConditionDef>,
    /// Channel tables.
    #[serde(default, rename = "channel")]
    pub channels: Vec<ChannelDef>,
    /// Trigger tables.
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerDef>,
}

impl Recipe {
    /// Parse a recipe from TOML text.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, RecipeError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load and parse a recipe file.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Build the fully linked configuration, validating referential integrity
    /// and rejecting cyclic compound graphs.
    pub fn build(&self) -> Result<L0duConfig, RecipeError> {
        let data_indices = index_by_name(self.data.iter().map(|d| d.name.as_str()), "data")?;
        let condition_indices =
            index_by_name(self.conditions.iter().map(|c| c.name.as_str()), "condition")?;
        let channel_indices =
            index_by_name(self.channels.iter().map(|c| c.name.as_str()), "channel")?;
        let _ = index_by_name(self.triggers.iter().map(|t| t.name.as_str()), "trigger")?;

        let mut data = Vec::with_capacity(self.data.len());
        for (idx, def) in self.data.iter().enumerate() {
            let kind = match def.kind {
                DataKindDef::Predefined => DataKind::Predefined,
                DataKindDef::Constant => DataKind::Constant(def.value.unwrap_or(0)),
                DataKindDef::RamBcid => DataKind::RamBcid,
                DataKindDef::Compound => {
                    let op = parse_operator(def);
                    let mut components = Vec::with_capacity(def.components.len());
                    for component in &def.components {
                        let component_idx = data_indices.get(component.as_str()).copied().ok_or(
                            RecipeError::UnknownReference {
                                kind: "data",
                                name: component.clone(),
                                referenced_by: def.name.clone(),
                            },
                        )?;
                        components.push(component_idx);
                    }
                    DataKind::Compound { op, components }
                }
            };
            data.push(ElementaryData::new(
                idx as u32,
                &def.name,
                kind,
                def.scale,
                def.saturation,
            ));
        }

        reject_compound_cycles(&data)?;

        let mut conditions = Vec::with_capacity(self.conditions.len());
        for (idx, def) in self.conditions.iter().enumerate() {
            let data_idx = data_indices.get(def.data.as_str()).copied().ok_or(
                RecipeError::UnknownReference {
                    kind: "data",
                    name: def.data.clone(),
                    referenced_by: def.name.clone(),
                },
            )?;
            let comparator = Comparator::from_symbol(&def.comparator).unwrap_or_else(|| {
                log::warn!(
                    "Condition {}: unknown comparator symbol {:?}, condition will always evaluate false",
                    def.name,
                    def.comparator
                );
                Comparator::Unrecognized
            });
            conditions.push(ElementaryCondition::new(
                idx as u32,
                &def.name,
                data_idx,
                comparator,
                def.threshold,
                def.reported,
                def.report_bit,
                def.bx,
            ));
        }

        let mut channels = Vec::with_capacity(self.channels.len());
        for (idx, def) in self.channels.iter().enumerate() {
            let mut condition_refs = Vec::with_capacity(def.conditions.len());
            for condition in &def.conditions {
                let condition_idx = condition_indices.get(condition.as_str()).copied().ok_or(
                    RecipeError::UnknownReference {
                        kind: "condition",
                        name: condition.clone(),
                        referenced_by: def.name.clone(),
                    },
                )?;
                condition_refs.push(condition_idx);
            }
            let rate = if def.rate > DOWNSCALE_SCALE {
                log::warn!(
                    "Channel {}: rate {} exceeds the downscale scale {}, clamped",
                    def.name,
                    def.rate,
                    DOWNSCALE_SCALE
                );
                DOWNSCALE_SCALE
            } else {
                def.rate
            };
            channels.push(Channel::new(
                idx as u32,
                &def.name,
                rate,
                parse_decision_mask(&def.decision_type, &def.name),
                condition_refs,
                def.update_counter,
            ));
        }

        let mut triggers = Vec::with_capacity(self.triggers.len());
        for (idx, def) in self.triggers.iter().enumerate() {
            let mut channel_refs = Vec::with_capacity(def.channels.len());
            for channel in &def.channels {
                let channel_idx = channel_indices.get(channel.as_str()).copied().ok_or(
                    RecipeError::UnknownReference {
                        kind: "channel",
                        name: channel.clone(),
                        referenced_by: def.name.clone(),
                    },
                )?;
                channel_refs.push(channel_idx);
            }
            triggers.push(Trigger::new(
                idx as u32,
                &def.name,
                parse_decision_mask(&def.decision_type, &def.name),
                channel_refs,
            ));
        }

        Ok(L0duConfig::from_parts(
            self.tck,
            self.bank_version,
            data,
            conditions,
            channels,
            triggers,
        ))
    }
}

fn index_by_name<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &'static str,
) -> Result<HashMap<&'a str, usize>, RecipeError> {
    let mut indices = HashMap::new();
    for (idx, name) in names.enumerate() {
        if indices.insert(name, idx).is_some() {
            return Err(RecipeError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(indices)
}

fn parse_operator(def: &DataDef) -> CompoundOp {
    match &def.operator {
        Some(symbol) => CompoundOp::from_symbol(symbol).unwrap_or_else(|| {
            log::warn!(
                "Compound data {}: unknown operator symbol {:?}, datum will evaluate to 0",
                def.name,
                symbol
            );
            CompoundOp::Unrecognized
        }),
        None => {
            log::warn!(
                "Compound data {}: no operator given, datum will evaluate to 0",
                def.name
            );
            CompoundOp::Unrecognized
        }
    }
}

fn parse_decision_mask(names: &[String], entity: &str) -> DecisionMask {
    let mut mask = DecisionMask::DISABLED;
    for name in names {
        match name.parse::<DecisionMask>() {
            Ok(bit) => mask |= bit,
            Err(e) => log::warn!("{entity}: {e}, decision type ignored"),
        }
    }
    mask
}

/// Depth-first search over the compound component graph; a back edge means
/// the recipe would recurse forever at evaluation time and is rejected.
fn reject_compound_cycles(data: &[ElementaryData]) -> Result<(), RecipeError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Visit {
        Unvisited,
        InStack,
        Done,
    }

    fn visit(
        data: &[ElementaryData],
        states: &mut [Visit],
        idx: usize,
    ) -> Result<(), RecipeError> {
        match states[idx] {
            Visit::Done => return Ok(()),
            Visit::InStack => {
                return Err(RecipeError::CyclicCompound {
                    name: data[idx].name().to_owned(),
                })
            }
            Visit::Unvisited => {}
        }
        states[idx] = Visit::InStack;
        if let DataKind::Compound { components, .. } = data[idx].kind() {
            for &component in components {
                visit(data, states, component)?;
            }
        }
        states[idx] = Visit::Done;
        Ok(())
    }

    let mut states = vec![Visit::Unvisited; data.len()];
    for idx in 0..data.len() {
        visit(data, &mut states, idx)?;
    }
    Ok(())
}

/// Template recipe written by `--generate-recipe-toml`, ready to customize.
pub const RECIPE_TEMPLATE: &str = r#"# l0dulator trigger configuration recipe
#
# One file describes one configuration, registered under a Trigger
# Configuration Key (TCK). Values are raw digits unless a scale is given.

tck = 42
bank_version = 2

[[data]]
name = "M0(Pt)"
kind = "predefined"
scale = 40.0
saturation = 255

[[data]]
name = "M1(Pt)"
kind = "predefined"
scale = 40.0
saturation = 255

[[data]]
name = "Sum(Et)"
kind = "predefined"
scale = 24.0
saturation = 16383

[[data]]
name = "Spd(Mult)"
kind = "predefined"

[[data]]
# Sum of the two highest muon transverse momenta
name = "M0+M1(Pt)"
kind = "compound"
operator = "+"
components = ["M0(Pt)", "M1(Pt)"]
scale = 40.0

[[condition]]
name = "Muon(Pt)>5"
data = "M0(Pt)"
comparator = ">"
threshold = 5

[[condition]]
name = "DiMuon(Pt)>8"
data = "M0+M1(Pt)"
comparator = ">"
threshold = 8

[[condition]]
name = "Sum(Et)>500"
data = "Sum(Et)"
comparator = ">"
threshold = 500

[[condition]]
name = "Spd(Mult)<900"
data = "Spd(Mult)"
comparator = "<"
threshold = 900

[[channel]]
name = "L0Muon"
rate = 1000000
decision_type = ["Physics"]
conditions = ["Muon(Pt)>5", "Spd(Mult)<900"]

[[channel]]
name = "L0DiMuon"
rate = 500000
decision_type = ["Physics"]
conditions = ["DiMuon(Pt)>8"]

[[channel]]
name = "L0SumEt"
rate = 10000
decision_type = ["Physics"]
conditions = ["Sum(Et)>500"]

[[trigger]]
name = "L0Physics"
decision_type = ["Physics"]
channels = ["L0Muon", "L0DiMuon", "L0SumEt"]
"#;

/// Write the template recipe to `path`.
pub fn generate_recipe_toml(path: &Path) -> io::Result<()> {
    fs::write(path, RECIPE_TEMPLATE)
}
