//! Token types for the figure lexer.

/// A token produced by the figure lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Offset into the whitespace-stripped figure text.
    pub pos: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Root spelling, e.g. "C", "F#", "e-".
    Root(String),
    /// Bass spelling from a `/X` span.
    Bass(String),
    /// Matched kind shorthand, already resolved against the table.
    Kind {
        /// The abbreviation as matched (may be empty — "C" is a major
        /// triad through the empty abbreviation).
        abbreviation: String,
        /// Canonical kind name.
        name: String,
    },
    /// One step-modification token.
    Modifier(ModifierToken),
}

/// Keyword prefix of a modifier token. Absent means `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModKeyword {
    Add,
    Alter,
    Omit,
    Subtract,
}

/// Accidentals-plus-degree modifier, e.g. `b9` or `alter #5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierToken {
    pub keyword: Option<ModKeyword>,
    pub alter: i8,
    pub degree: u8,
}
