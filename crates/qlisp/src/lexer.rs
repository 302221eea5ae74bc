//! Lexical analysis.
//!
//! A byte-level state machine that turns the blackboard's source text into
//! a token sequence. Lexing never stops at an error: bad bytes and bad
//! escapes are recorded as diagnostics and the machine resumes, so one
//! pass reports everything it can.

use crate::blackboard::Blackboard;
use crate::diagnostic::Diagnostic;
use crate::location::Location;
use crate::token::{Token, TokenKind};

/// What the state machine is in the middle of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Saw a leading `-`; could become a number or a symbol.
    ExpectNumberOrSymbol,
    ExpectNumber,
    ExpectSymbol,
    ExpectString,
    /// Saw a backslash inside a string.
    ExpectStringEscaped,
    ExpectComment,
}

/// Tokenizes the blackboard's source.
///
/// Fills `blackboard.tokens` and appends any lexical errors to
/// `blackboard.diagnostics`. Each token's location is the location of its
/// first source byte; rows and columns are 1-based, and the column resets
/// to 1 on the byte after a newline.
///
/// An accumulating token that is still open when the input ends (an
/// unterminated string or comment, or an atom not followed by anything) is
/// not emitted; it is reported as "Unexpected end of input!" at the final
/// position instead.
pub fn tokenize(blackboard: &mut Blackboard) {
    let mut lexer = Lexer {
        state: State::Normal,
        buf: Vec::new(),
        start: Location::start(),
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };

    let mut row: u32 = 1;
    let mut column: u32 = 1;
    let mut index: usize = 0;
    for &byte in blackboard.source.as_bytes() {
        lexer.step(byte, Location::new(row, column, index));
        index += 1;
        if byte == b'\n' {
            row += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    lexer.finish(Location::new(row, column, index));

    blackboard.tokens.extend(lexer.tokens);
    blackboard.diagnostics.extend(lexer.diagnostics);
}

fn is_symbol_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'_' | b'+' | b'-' | b'*' | b'/' | b'\\' | b'=' | b'<' | b'>' | b'!' | b'&'
        )
}

struct Lexer {
    state: State,
    /// Bytes of the token being accumulated.
    buf: Vec<u8>,
    /// Location of the accumulating token's first byte.
    start: Location,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    fn step(&mut self, byte: u8, location: Location) {
        match self.state {
            State::Normal => self.normal(byte, location),
            State::ExpectNumberOrSymbol => {
                if is_symbol_byte(byte) {
                    self.buf.push(byte);
                    self.state = if byte.is_ascii_digit() {
                        State::ExpectNumber
                    } else {
                        State::ExpectSymbol
                    };
                } else {
                    // A lone `-` is the subtraction symbol.
                    self.emit(TokenKind::Symbol);
                    self.normal(byte, location);
                }
            }
            State::ExpectNumber => {
                if byte.is_ascii_digit() {
                    self.buf.push(byte);
                } else {
                    self.emit(TokenKind::Number);
                    self.normal(byte, location);
                }
            }
            State::ExpectSymbol => {
                if is_symbol_byte(byte) {
                    self.buf.push(byte);
                } else {
                    self.emit(TokenKind::Symbol);
                    self.normal(byte, location);
                }
            }
            State::ExpectString => match byte {
                b'"' => self.emit(TokenKind::String),
                b'\\' => self.state = State::ExpectStringEscaped,
                _ => self.buf.push(byte),
            },
            State::ExpectStringEscaped => {
                match byte {
                    b'"' | b'\\' => self.buf.push(byte),
                    b'n' => self.buf.push(b'\n'),
                    b'r' => self.buf.push(b'\r'),
                    b't' => self.buf.push(b'\t'),
                    _ => self
                        .diagnostics
                        .push(Diagnostic::new(location, "Unknown escape sequence!")),
                }
                self.state = State::ExpectString;
            }
            State::ExpectComment => {
                if byte == b'\n' {
                    self.emit(TokenKind::Comment);
                } else {
                    self.buf.push(byte);
                }
            }
        }
    }

    /// Handles one byte in the `Normal` state. Also the continuation for
    /// every token-ending byte, which is reprocessed here after the token
    /// is emitted.
    fn normal(&mut self, byte: u8, location: Location) {
        self.state = State::Normal;
        match byte {
            b'-' => {
                self.start = location;
                self.buf.push(byte);
                self.state = State::ExpectNumberOrSymbol;
            }
            _ if byte.is_ascii_digit() => {
                self.start = location;
                self.buf.push(byte);
                self.state = State::ExpectNumber;
            }
            _ if is_symbol_byte(byte) => {
                self.start = location;
                self.buf.push(byte);
                self.state = State::ExpectSymbol;
            }
            b'"' => {
                self.start = location;
                self.state = State::ExpectString;
            }
            b';' => {
                self.start = location;
                self.state = State::ExpectComment;
            }
            b'(' => self
                .tokens
                .push(Token::delimiter(TokenKind::LParen, location)),
            b')' => self
                .tokens
                .push(Token::delimiter(TokenKind::RParen, location)),
            b'{' => self
                .tokens
                .push(Token::delimiter(TokenKind::LBrace, location)),
            b'}' => self
                .tokens
                .push(Token::delimiter(TokenKind::RBrace, location)),
            _ if byte.is_ascii_whitespace() => {}
            _ => self
                .diagnostics
                .push(Diagnostic::new(location, "Unexpected symbol!")),
        }
    }

    fn emit(&mut self, kind: TokenKind) {
        let bytes = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&bytes).into_owned();
        self.tokens.push(Token::new(kind, self.start, text));
        self.state = State::Normal;
    }

    fn finish(&mut self, end: Location) {
        if self.state != State::Normal || !self.buf.is_empty() {
            self.diagnostics
                .push(Diagnostic::new(end, "Unexpected end of input!"));
        }
    }
}
