//! The shared record of one interpreter run.

use crate::ast::Node;
use crate::diagnostic::Diagnostic;
use crate::token::Token;

/// Everything the compilation stages read and produce for one source text.
///
/// The lexer fills `tokens`, the parser fills `ast`, and both append to
/// `diagnostics`. Keeping all of it in one place lets any stage render
/// errors with the input name without threading extra parameters around.
#[derive(Debug)]
pub struct Blackboard {
    /// The name of the input (file name or a synthetic name like `<repl>`).
    pub input_name: String,
    /// The raw source text.
    pub source: String,
    /// The token sequence; valid after lexing.
    pub tokens: Vec<Token>,
    /// The abstract syntax tree (a `Program` node); valid after parsing.
    pub ast: Node,
    /// All errors collected so far, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Blackboard {
    /// Creates a blackboard for a source text.
    pub fn new(input_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            input_name: input_name.into(),
            source: source.into(),
            tokens: Vec::new(),
            ast: Node::program(),
            diagnostics: Vec::new(),
        }
    }

    /// Whether any stage reported an error.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Renders all diagnostics into one string.
    pub fn render_diagnostics(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(self))
            .collect::<Vec<_>>()
            .join("")
    }
}
