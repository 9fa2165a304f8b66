/// Error types for the attribute codecs.
///
/// All parse APIs in this crate return `anyhow::Result`; these concrete types
/// are what ends up inside the `anyhow::Error` so that callers who care can
/// tell a structural problem from an unknown unit with `downcast_ref`:
///
///   - `FormatError`: wrong field count, a required numeric field that does
///     not parse, malformed bracket/delimiter structure.
///   - `UnitError`: a size suffix that is not one of b/kb/mb/gb/tb/pb.
///
/// Most callers just propagate with `?` and never look inside.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError(pub String);

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Format error: {}", self.0)
    }
}

impl std::error::Error for FormatError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitError(pub String);

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unit error: {}", self.0)
    }
}

impl std::error::Error for UnitError {}
