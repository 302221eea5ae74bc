//! Recursive descent parser.
//!
//! Consumes the blackboard's token sequence and builds the AST through an
//! [`AstBuilder`]. Unlike the lexer, the parser stops at the first error:
//! a token that cannot start an expression (including a stray closing
//! delimiter) aborts the parse of the whole program, leaving whatever was
//! built so far in the tree.

use crate::ast::{AstBuilder, NodeKind};
use crate::blackboard::Blackboard;
use crate::diagnostic::Diagnostic;
use crate::location::Location;
use crate::token::{Token, TokenKind};

/// Parses the blackboard's tokens into its AST.
///
/// The grammar:
///
/// ```text
/// program     := expression*
/// expression  := number | symbol | string | comment
///              | sExpression | qExpression
/// sExpression := '(' expression* ')'
/// qExpression := '{' expression* '}'
/// ```
///
/// Every datum is wrapped in an `Expression` node with exactly one child.
/// On failure a single "Unexpected token!" diagnostic is appended to the
/// blackboard; when the input ends in the middle of a form, it points at
/// the last token that was consumed.
pub fn parse(blackboard: &mut Blackboard) {
    let tokens = std::mem::take(&mut blackboard.tokens);

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        builder: AstBuilder::new(),
        last_location: Location::start(),
    };
    let result = parser.run();
    blackboard.ast = parser.builder.finish();
    if let Err(diagnostic) = result {
        blackboard.diagnostics.push(diagnostic);
    }

    blackboard.tokens = tokens;
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    builder: AstBuilder,
    /// Location of the last token consumed; anchors errors at end of input.
    last_location: Location,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), Diagnostic> {
        while self.peek().is_some() {
            self.parse_expression()?;
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> Result<(), Diagnostic> {
        self.builder.enter(NodeKind::Expression);
        let (kind, location) = match self.peek() {
            Some(token) => (token.kind, token.location),
            None => return Err(Diagnostic::new(self.last_location, "Unexpected token!")),
        };
        match kind {
            TokenKind::Number => self.parse_atom(NodeKind::Number),
            TokenKind::Symbol => self.parse_atom(NodeKind::Symbol),
            TokenKind::String => self.parse_atom(NodeKind::String),
            TokenKind::Comment => self.parse_atom(NodeKind::Comment),
            TokenKind::LParen => self.parse_list(NodeKind::SExpression, TokenKind::RParen)?,
            TokenKind::LBrace => self.parse_list(NodeKind::QExpression, TokenKind::RBrace)?,
            TokenKind::RParen | TokenKind::RBrace => {
                return Err(Diagnostic::new(location, "Unexpected token!"));
            }
        }
        self.builder.leave();
        Ok(())
    }

    fn parse_atom(&mut self, kind: NodeKind) {
        let token = self.advance().expect("caller checked for a token");
        let text = token.text.clone();
        self.builder.enter(kind);
        self.builder.current_mut().value = text;
        self.builder.leave();
    }

    fn parse_list(&mut self, kind: NodeKind, closing: TokenKind) -> Result<(), Diagnostic> {
        self.advance(); // opening delimiter
        self.builder.enter(kind);
        loop {
            match self.peek() {
                Some(token) if token.kind == closing => break,
                _ => self.parse_expression()?,
            }
        }
        self.builder.leave();
        self.advance(); // closing delimiter
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.last_location = token.location;
        self.pos += 1;
        Some(token)
    }
}
