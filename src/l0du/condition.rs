//! Elementary conditions: one datum compared against a threshold.

use super::BxOffset;

/// Comparator applied between a datum's digit and the condition threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `digit < threshold`
    Less,
    /// `digit > threshold`
    Greater,
    /// `digit == threshold`
    Equal,
    /// `digit != threshold`
    NotEqual,
    /// Symbol not in the supported set. Always evaluates `false`, never fails
    /// at run time (hardware-emulation contract).
    Unrecognized,
}

impl Comparator {
    /// Parse a comparator symbol, `None` if it is not one of `< > == !=`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Comparator::Less),
            ">" => Some(Comparator::Greater),
            "==" => Some(Comparator::Equal),
            "!=" => Some(Comparator::NotEqual),
            _ => None,
        }
    }

    /// The comparator symbol as written in a recipe.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Less => "<",
            Comparator::Greater => ">",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::Unrecognized => "?",
        }
    }

    /// Apply the comparator. [Comparator::Unrecognized] compares to `false`.
    pub fn compare(self, digit: u32, threshold: u32) -> bool {
        match self {
            Comparator::Less => digit < threshold,
            Comparator::Greater => digit > threshold,
            Comparator::Equal => digit == threshold,
            Comparator::NotEqual => digit != threshold,
            Comparator::Unrecognized => false,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One elementary condition of a trigger configuration.
///
/// Immutable after configuration build; a pure view over its datum with no
/// state of its own beyond the memoization inherited from the datum.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementaryCondition {
    id: u32,
    name: String,
    data: usize,
    comparator: Comparator,
    threshold: u32,
    reported: bool,
    report_bit: u32,
    bx: BxOffset,
}

impl ElementaryCondition {
    /// Create a new condition over the datum at arena index `data`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        data: usize,
        comparator: Comparator,
        threshold: u32,
        reported: bool,
        report_bit: Option<u32>,
        bx: BxOffset,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            data,
            comparator,
            threshold,
            reported,
            // The hardware maps a condition to its own id in the
            // condition-value summary unless the recipe overrides the bit.
            report_bit: report_bit.unwrap_or(id),
            bx,
        }
    }

    /// Numeric id of the condition within its configuration.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name of the condition, e.g. `"MuPt>10"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arena index of the datum this condition reads.
    pub fn data_index(&self) -> usize {
        self.data
    }

    /// The comparator applied against the threshold.
    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Threshold in raw digit units.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether this condition contributes a bit to the condition-value summary.
    pub fn is_reported(&self) -> bool {
        self.reported
    }

    /// Bit position used in the condition-value summary when reported.
    pub fn report_bit(&self) -> u32 {
        self.report_bit
    }

    /// Which crossing offset of the referenced datum to read.
    pub fn bx(&self) -> BxOffset {
        self.bx
    }
}
