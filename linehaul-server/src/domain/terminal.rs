//! Terminal codes and the terminals they identify.

use std::fmt;

/// Longest terminal code we accept.
const MAX_CODE_LEN: usize = 5;

/// Error returned when parsing an invalid terminal code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid terminal code: {reason}")]
pub struct InvalidTerminalCode {
    reason: &'static str,
}

/// A short uppercase terminal identifier, e.g. `PHX` or `DEN`.
///
/// Codes are 2 to 5 ASCII characters, start with an uppercase letter and
/// otherwise contain uppercase letters or digits. A `TerminalCode` is valid
/// by construction, so comparing two codes is always case-insensitive with
/// respect to the text they were parsed from via [`TerminalCode::parse_normalized`].
///
/// # Examples
///
/// ```
/// use linehaul_server::domain::TerminalCode;
///
/// let phx = TerminalCode::parse("PHX").unwrap();
/// assert_eq!(phx.as_str(), "PHX");
///
/// // Lowercase is rejected by the strict parser...
/// assert!(TerminalCode::parse("phx").is_err());
/// // ...but accepted by the normalizing one.
/// assert_eq!(TerminalCode::parse_normalized(" phx ").unwrap(), phx);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalCode {
    bytes: [u8; MAX_CODE_LEN],
    len: u8,
}

impl TerminalCode {
    /// Parse a terminal code that is already uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidTerminalCode> {
        let bytes = s.as_bytes();

        if bytes.len() < 2 || bytes.len() > MAX_CODE_LEN {
            return Err(InvalidTerminalCode {
                reason: "must be 2 to 5 characters",
            });
        }

        if !bytes[0].is_ascii_uppercase() {
            return Err(InvalidTerminalCode {
                reason: "must start with an uppercase letter",
            });
        }

        for &b in bytes {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(InvalidTerminalCode {
                    reason: "must be uppercase ASCII letters or digits",
                });
            }
        }

        let mut buf = [0u8; MAX_CODE_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Parse a code after trimming whitespace and uppercasing it.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidTerminalCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored, so this cannot fail.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for TerminalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TerminalCode({})", self.as_str())
    }
}

impl fmt::Display for TerminalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A freight terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub code: TerminalCode,
    pub name: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Terminal {
    pub fn new(code: TerminalCode) -> Self {
        Self {
            code,
            name: None,
            coordinates: None,
        }
    }

    /// Attach coordinates to this terminal.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }
}
