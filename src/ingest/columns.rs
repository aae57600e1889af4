//! Header normalisation for equipment CSV files.
//!
//! Source files spell their headers in many ways ("Equipment Name",
//! "equipment_name", "Flow Rate", "temp"). Every header is resolved to one of
//! the five [`CanonicalHeader`]s where possible; anything else is reduced to a
//! lowercase snake form and carried as [`NormalizedHeader::Extra`], which the
//! cleaner ignores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of columns a cleaned row always carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalHeader {
    EquipmentName,
    Type,
    Flowrate,
    Pressure,
    Temperature,
}

impl CanonicalHeader {
    pub const ALL: [CanonicalHeader; 5] = [
        CanonicalHeader::EquipmentName,
        CanonicalHeader::Type,
        CanonicalHeader::Flowrate,
        CanonicalHeader::Pressure,
        CanonicalHeader::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalHeader::EquipmentName => "equipment_name",
            CanonicalHeader::Type => "type",
            CanonicalHeader::Flowrate => "flowrate",
            CanonicalHeader::Pressure => "pressure",
            CanonicalHeader::Temperature => "temperature",
        }
    }

    /// Human-readable column name used in error messages and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalHeader::EquipmentName => "Equipment Name",
            CanonicalHeader::Type => "Type",
            CanonicalHeader::Flowrate => "Flowrate",
            CanonicalHeader::Pressure => "Pressure",
            CanonicalHeader::Temperature => "Temperature",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CanonicalHeader::Flowrate | CanonicalHeader::Pressure | CanonicalHeader::Temperature
        )
    }

    fn from_snake(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|header| header.as_str() == name)
    }
}

impl fmt::Display for CanonicalHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of resolving a single source header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedHeader {
    Canonical(CanonicalHeader),
    /// Unrecognised column, kept in normalised snake form.
    Extra(String),
}

impl NormalizedHeader {
    pub fn canonical(&self) -> Option<CanonicalHeader> {
        match self {
            NormalizedHeader::Canonical(header) => Some(*header),
            NormalizedHeader::Extra(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NormalizedHeader::Canonical(header) => header.as_str(),
            NormalizedHeader::Extra(name) => name,
        }
    }
}

/// Exact spellings checked against the trimmed, lowercased header.
static EXACT_ALIASES: &[(&str, CanonicalHeader)] = &[
    ("equipment name", CanonicalHeader::EquipmentName),
    ("equipmentname", CanonicalHeader::EquipmentName),
    ("type", CanonicalHeader::Type),
    ("flowrate", CanonicalHeader::Flowrate),
    ("pressure", CanonicalHeader::Pressure),
    ("temperature", CanonicalHeader::Temperature),
];

/// Synonyms checked against the snake-cased header.
static SYNONYM_ALIASES: &[(&str, CanonicalHeader)] = &[
    ("name", CanonicalHeader::EquipmentName),
    ("equipment", CanonicalHeader::EquipmentName),
    ("equipment_type", CanonicalHeader::Type),
    ("flow_rate", CanonicalHeader::Flowrate),
    ("flow", CanonicalHeader::Flowrate),
    ("temp", CanonicalHeader::Temperature),
];

fn lookup(table: &[(&str, CanonicalHeader)], key: &str) -> Option<CanonicalHeader> {
    table
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, header)| *header)
}

/// Reduce a header to lowercase snake form: spaces become underscores, then
/// everything outside `[a-z0-9_]` is removed.
pub fn snake_case(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Resolve a raw header to its canonical column, or to an ignorable extra.
pub fn normalize(header: &str) -> NormalizedHeader {
    let lowered = header.trim().to_lowercase();
    if let Some(canonical) = lookup(EXACT_ALIASES, &lowered) {
        return NormalizedHeader::Canonical(canonical);
    }

    let snake = snake_case(&lowered);
    match CanonicalHeader::from_snake(&snake).or_else(|| lookup(SYNONYM_ALIASES, &snake)) {
        Some(canonical) => NormalizedHeader::Canonical(canonical),
        None => NormalizedHeader::Extra(snake),
    }
}

/// Position of each canonical column within a header row. The left-most
/// source column wins when several resolve to the same canonical header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [Option<usize>; 5],
}

impl ColumnMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut map = ColumnMap::default();
        for (index, header) in headers.iter().enumerate() {
            if let Some(canonical) = normalize(header.as_ref()).canonical() {
                let slot = &mut map.positions[slot_of(canonical)];
                if slot.is_none() {
                    *slot = Some(index);
                }
            }
        }
        map
    }

    pub fn position(&self, header: CanonicalHeader) -> Option<usize> {
        self.positions[slot_of(header)]
    }

    /// Canonical headers with no source column, in canonical order.
    pub fn missing(&self) -> Vec<CanonicalHeader> {
        CanonicalHeader::ALL
            .into_iter()
            .filter(|header| self.position(*header).is_none())
            .collect()
    }
}

fn slot_of(header: CanonicalHeader) -> usize {
    match header {
        CanonicalHeader::EquipmentName => 0,
        CanonicalHeader::Type => 1,
        CanonicalHeader::Flowrate => 2,
        CanonicalHeader::Pressure => 3,
        CanonicalHeader::Temperature => 4,
    }
}
