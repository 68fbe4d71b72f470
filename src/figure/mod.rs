//! Figure parsing — chord-symbol text to [`ChordSymbol`].
//!
//! `"Cm7"`, `"G9#5"`, `"F#m11/G#"`, `"C7 add b9 omit 5"` all parse through
//! the same staged pipeline: lexer → tagged token stream → parser.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod token;

pub use error::{ParseError, ParseErrorKind};
pub use symbol::{ChordStepModification, ChordSymbol, ModType};

use crate::kind::KindTable;
use lexer::Lexer;
use parser::Parser;

/// Parse a figure against the process-wide kind table.
pub fn parse(figure: &str) -> Result<ChordSymbol, ParseError> {
    parse_in(figure, KindTable::global())
}

/// Parse a figure against an explicit kind table.
pub fn parse_in(figure: &str, table: &KindTable) -> Result<ChordSymbol, ParseError> {
    let tokens = Lexer::new(figure, table).tokenize()?;
    Parser::new(tokens).parse()
}
