//! Elementary data: the named scalar quantities at the bottom of the rule hierarchy.
//!
//! A datum carries one raw integer value (a "digit") per bunch-crossing offset.
//! How the digit is produced depends on the [DataKind]: injected per event,
//! fixed at configuration time, read back with a crossing shift, or derived
//! from other data with an operator.

use super::BxOffset;
use std::collections::BTreeMap;
use std::fmt;

/// Sparse per-crossing digit storage for one datum during one event.
///
/// Keys are signed crossing offsets; absent offsets read as 0.
pub type DigitMap = BTreeMap<BxOffset, u32>;

/// Operator folded over the components of a compound datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    /// Arithmetic sum of the component values.
    Add,
    /// Arithmetic difference, left to right.
    Sub,
    /// Bitwise AND of the component digits.
    And,
    /// Bitwise XOR of the component digits.
    Xor,
    /// Symbol not in the supported set. Folds to 0, never fails at run time.
    Unrecognized,
}

impl CompoundOp {
    /// Parse an operator symbol, `None` if it is not one of `+ - & ^`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(CompoundOp::Add),
            "-" => Some(CompoundOp::Sub),
            "&" => Some(CompoundOp::And),
            "^" => Some(CompoundOp::Xor),
            _ => None,
        }
    }

    /// The operator symbol as written in a recipe.
    pub fn symbol(self) -> &'static str {
        match self {
            CompoundOp::Add => "+",
            CompoundOp::Sub => "-",
            CompoundOp::And => "&",
            CompoundOp::Xor => "^",
            CompoundOp::Unrecognized => "?",
        }
    }

    /// Apply the operator to a running accumulator and the next component value.
    ///
    /// Arithmetic operators fold in the scaled (floating) domain, bitwise
    /// operators on the truncated digits. [CompoundOp::Unrecognized] folds to 0.
    pub fn apply(self, acc: f64, rhs: f64) -> f64 {
        match self {
            CompoundOp::Add => acc + rhs,
            CompoundOp::Sub => acc - rhs,
            CompoundOp::And => ((acc as u32) & (rhs as u32)) as f64,
            CompoundOp::Xor => ((acc as u32) ^ (rhs as u32)) as f64,
            CompoundOp::Unrecognized => 0.0,
        }
    }
}

impl fmt::Display for CompoundOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How the digit of a datum is produced for a given crossing.
#[derive(Debug, Clone, PartialEq)]
pub enum DataKind {
    /// Injected per event by the decoding collaborator; absent crossings read as 0.
    Predefined,
    /// Fixed raw value, returned for any crossing offset and never cleared between events.
    Constant(u32),
    /// Injected at offset 0 per event, read back shifted by the requested offset.
    RamBcid,
    /// Derived by left-folding `op` over the listed components (arena indices, in order).
    Compound {
        /// Operator applied pairwise, left to right.
        op: CompoundOp,
        /// Resolved indices of the component data in the owning configuration.
        components: Vec<usize>,
    },
}

impl DataKind {
    /// Short label used in views and log messages.
    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Predefined => "Predefined",
            DataKind::Constant(_) => "Constant",
            DataKind::RamBcid => "RAMBcid",
            DataKind::Compound { .. } => "Compound",
        }
    }
}

/// One named scalar quantity of a trigger configuration.
///
/// The per-event digit storage lives in the emulator's scratch state, not
/// here: this struct is the immutable description shared by every event.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementaryData {
    id: u32,
    name: String,
    kind: DataKind,
    scale: f64,
    saturation: u32,
}

impl ElementaryData {
    /// Create a new datum description.
    pub fn new(id: u32, name: impl Into<String>, kind: DataKind, scale: f64, saturation: u32) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            scale,
            saturation,
        }
    }

    /// Numeric id of the datum within its configuration.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name of the datum, e.g. `"M0(Pt)"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the digit is produced.
    pub fn kind(&self) -> &DataKind {
        &self.kind
    }

    /// Raw-to-physical conversion factor: `value(bx) = digit(bx) * scale`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Saturation value of the hardware quantity. Stored for bookkeeping,
    /// not consumed by the decision logic.
    pub fn saturation(&self) -> u32 {
        self.saturation
    }

    /// Digit for `bx` given this event's injected digits, for the non-derived kinds.
    ///
    /// Compound data is evaluated recursively by the emulator and must not be
    /// read through this method.
    pub(crate) fn digit_from(&self, digits: &DigitMap, bx: BxOffset) -> u32 {
        match &self.kind {
            DataKind::Constant(value) => *value,
            // Crossing-shifted read of the base value. Out-of-range shifts are
            // not range-checked at this level, they wrap.
            DataKind::RamBcid => digits
                .get(&0)
                .copied()
                .unwrap_or(0)
                .wrapping_add(bx as u32),
            DataKind::Predefined => digits.get(&bx).copied().unwrap_or(0),
            DataKind::Compound { .. } => {
                debug_assert!(false, "compound digits are read through the emulator");
                digits.get(&bx).copied().unwrap_or(0)
            }
        }
    }
}
