//! Equipment and drivers.

use std::fmt;

use super::TerminalCode;

/// A truck, trailer, or dolly unit number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitNumber(String);

impl UnitNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for UnitNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A power unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truck {
    pub unit_number: UnitNumber,
}

/// A trailer and where it was last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub unit_number: UnitNumber,
    pub length_feet: u32,
    /// Terminal of the most recent completed arrival, if any is known.
    pub last_known_terminal: Option<TerminalCode>,
}

impl Trailer {
    pub fn new(unit_number: impl Into<String>, length_feet: u32) -> Self {
        Self {
            unit_number: UnitNumber::new(unit_number),
            length_feet,
            last_known_terminal: None,
        }
    }

    pub fn at(mut self, terminal: TerminalCode) -> Self {
        self.last_known_terminal = Some(terminal);
        self
    }
}

/// A converter dolly for multi-trailer sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dolly {
    pub unit_number: UnitNumber,
}

/// Identifier of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(pub u64);

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A driver who may be assigned to trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    /// Supplies their own power unit.
    pub owner_operator: bool,
}
