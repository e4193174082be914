//! Conventions encoded in linehaul route names.
//!
//! Multi-stop route names concatenate the terminal codes of the lane in
//! order and end in a sequence number, e.g. `MSPFARBIL1` runs MSP → FAR →
//! BIL. The helpers here pull those pieces back out.

use crate::domain::TerminalCode;

/// Length of the terminal codes embedded in route names.
const EMBEDDED_CODE_LEN: usize = 3;

/// Trimmed, uppercased route name.
pub fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// The route family: the normalized name without its trailing sequence digits.
///
/// ```
/// use linehaul_server::resolve::route_family;
///
/// assert_eq!(route_family("MSPFARBIL1"), "MSPFARBIL");
/// assert_eq!(route_family(" phxden12 "), "PHXDEN");
/// assert_eq!(route_family("PHXDEN"), "PHXDEN");
/// ```
pub fn route_family(name: &str) -> String {
    let normalized = normalize(name);
    normalized
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string()
}

/// The last terminal code of a route family, if it ends in one.
pub fn final_terminal(family: &str) -> Option<TerminalCode> {
    let start = family.len().checked_sub(EMBEDDED_CODE_LEN)?;
    let tail = family.get(start..)?;
    TerminalCode::parse(tail).ok()
}

/// Whether a normalized route name mentions `code`.
pub fn mentions(normalized_name: &str, code: &TerminalCode) -> bool {
    normalized_name.contains(code.as_str())
}
