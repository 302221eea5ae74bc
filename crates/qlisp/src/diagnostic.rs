//! Located diagnostics.

use crate::blackboard::Blackboard;
use crate::location::Location;

/// An error produced while lexing, parsing or otherwise processing a
/// source text, anchored to the location where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the error occurred.
    pub location: Location,
    /// A short description of the error.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }

    /// Renders the diagnostic against the blackboard it was produced for.
    pub fn render(&self, blackboard: &Blackboard) -> String {
        format!(
            "In file {}, row {}, column {}:\n{}\n",
            blackboard.input_name, self.location.row, self.location.column, self.message
        )
    }
}
