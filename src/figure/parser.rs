//! Parser for the figure token stream.
//!
//! Consumes the lexer's tagged tokens into a [`ChordSymbol`], applying the
//! suspended-chord root correction as the final step.

use super::error::ParseError;
use super::symbol::{ChordStepModification, ChordSymbol, ModType};
use super::token::{ModKeyword, Token, TokenKind};
use crate::pitch::Pitch;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<ChordSymbol, ParseError> {
        let root = self.expect_root()?;
        let bass = self.take_bass()?;
        let (kind, abbreviation) = self.take_kind();
        let modifications = self.take_modifiers();

        let mut symbol = ChordSymbol {
            root,
            bass,
            kind,
            modifications,
            inversion: None,
        };

        // Suspended chords lacking a third are notated as if rooted on the
        // bass tone; sus2 keeps its written root.
        if let Some(abbr) = &abbreviation {
            if abbr.contains("sus") && !abbr.contains("sus2") {
                if let Some(bass) = &symbol.bass {
                    symbol.root = *bass;
                }
            }
        }

        Ok(symbol)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect_root(&mut self) -> Result<Pitch, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Root(text),
                pos,
            }) => {
                let pitch = Pitch::parse(text).ok_or_else(|| {
                    ParseError::malformed_root(format!("not a note name: {text:?}"), *pos)
                })?;
                self.pos += 1;
                Ok(pitch)
            }
            _ => Err(ParseError::malformed_root("figure has no root", 0)),
        }
    }

    fn take_bass(&mut self) -> Result<Option<Pitch>, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Bass(text),
                pos,
            }) => {
                let pitch = Pitch::parse(text).ok_or_else(|| {
                    ParseError::malformed_bass(format!("not a note name: {text:?}"), *pos)
                })?;
                self.pos += 1;
                Ok(Some(pitch))
            }
            _ => Ok(None),
        }
    }

    fn take_kind(&mut self) -> (Option<String>, Option<String>) {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Kind { abbreviation, name },
                ..
            }) => {
                let out = (Some(name.clone()), Some(abbreviation.clone()));
                self.pos += 1;
                out
            }
            _ => (None, None),
        }
    }

    fn take_modifiers(&mut self) -> Vec<ChordStepModification> {
        let mut mods = Vec::new();
        while let Some(Token {
            kind: TokenKind::Modifier(m),
            ..
        }) = self.peek()
        {
            let mod_type = match m.keyword {
                None | Some(ModKeyword::Add) => ModType::Add,
                Some(ModKeyword::Alter) => ModType::Alter,
                Some(ModKeyword::Omit) | Some(ModKeyword::Subtract) => ModType::Subtract,
            };
            mods.push(ChordStepModification::new(mod_type, m.degree, m.alter));
            self.pos += 1;
        }
        mods
    }
}
