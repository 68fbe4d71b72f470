//! Lexer for chord figures.
//!
//! Converts figure text like `"F#m11/G#"` into a tagged token stream:
//! root, optional bass, kind shorthand, step modifiers. The stages run in
//! a fixed order — root, bass, kind, modifiers — and each stage removes
//! exactly the span it matched, so shared substrings between root, bass
//! and kind cannot corrupt later stages.

use log::debug;

use super::error::ParseError;
use super::token::{ModKeyword, ModifierToken, Token, TokenKind};
use crate::kind::{ChordTypeDef, KindTable};
use crate::pitch::Pitch;

const MOD_KEYWORDS: [(&str, ModKeyword); 4] = [
    ("add", ModKeyword::Add),
    ("alter", ModKeyword::Alter),
    ("omit", ModKeyword::Omit),
    ("subtract", ModKeyword::Subtract),
];

/// Degrees above this cannot be real scale degrees; the token is re-scanned
/// as legacy concatenated shorthand.
const MAX_REAL_DEGREE: u32 = 20;

pub struct Lexer<'t> {
    src: String,
    table: &'t KindTable,
}

impl<'t> Lexer<'t> {
    pub fn new(figure: &str, table: &'t KindTable) -> Self {
        Self {
            src: figure.chars().filter(|c| !c.is_whitespace()).collect(),
            table,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        let (root_text, remainder) = self.take_root()?;
        let root_len = root_text.len();
        tokens.push(Token {
            kind: TokenKind::Root(root_text),
            pos: 0,
        });

        let (bass, remainder) = take_bass(&remainder);
        if let Some((bass_text, bass_pos)) = bass {
            tokens.push(Token {
                kind: TokenKind::Bass(bass_text),
                pos: root_len + bass_pos,
            });
        }

        let snapshot = self.table.snapshot();
        let (kind, residual) = take_kind(&remainder, &snapshot);
        if let Some((entry, abbreviation, pos)) = kind {
            debug!(
                "kind shorthand {:?} resolved to {}",
                abbreviation, entry.name
            );
            tokens.push(Token {
                kind: TokenKind::Kind {
                    abbreviation,
                    name: entry.name.clone(),
                },
                pos: root_len + pos,
            });
        }

        tokenize_modifiers(&residual, root_len, &mut tokens)?;

        Ok(tokens)
    }

    /// Stage 2: root extraction. Either the raw-degree form introduced by
    /// a comma (root is everything before the comma, commas dropped from
    /// the rest), or a note span at the start of the figure.
    fn take_root(&self) -> Result<(String, String), ParseError> {
        if let Some(ci) = self.src.find(',') {
            let root = &self.src[..ci];
            if Pitch::parse(root).is_none() {
                return Err(ParseError::malformed_root(
                    format!("not a note name: {root:?}"),
                    0,
                ));
            }
            let rest: String = self.src[ci..].chars().filter(|c| *c != ',').collect();
            return Ok((root.to_string(), rest));
        }

        let span = note_span(&self.src);
        if span == 0 {
            return Err(ParseError::malformed_root(
                format!("figure {:?} does not start with a note name", self.src),
                0,
            ));
        }
        Ok((
            self.src[..span].to_string(),
            self.src[span..].to_string(),
        ))
    }
}

/// Length of a note span at the start of `s`: one letter A–G (either
/// case) followed by any run of `#`/`-` accidentals. Zero if none.
fn note_span(s: &str) -> usize {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() && matches!(c.to_ascii_uppercase(), 'A'..='G') => {}
        _ => return 0,
    }
    1 + chars.take_while(|c| *c == '#' || *c == '-').count()
}

/// Stage 3: bass extraction. Finds the first `/` that introduces a note
/// span and removes exactly that span. A `/` not followed by a note letter
/// is left alone — it may belong to an abbreviation like `/o7`.
fn take_bass(remainder: &str) -> (Option<(String, usize)>, String) {
    let bytes = remainder.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'/' {
            continue;
        }
        let span = note_span(&remainder[i + 1..]);
        if span == 0 {
            continue;
        }
        let bass = remainder[i + 1..i + 1 + span].to_string();
        let mut rest = String::with_capacity(remainder.len());
        rest.push_str(&remainder[..i]);
        rest.push_str(&remainder[i + 1 + span..]);
        return (Some((bass, i + 1)), rest);
    }
    (None, remainder.to_string())
}

/// Stage 4: kind-shorthand extraction.
///
/// The candidate region is the remainder truncated at the first modifier
/// keyword, further truncated at an accidental that introduces a degree
/// token (`#`/`b` followed by a digit) unless some abbreviation containing
/// that accidental matches. Among all abbreviations the longest literal
/// substring wins; ties go to the earlier kind in table order. The matched
/// span is removed exactly once; everything else flows to the modifier
/// stage.
fn take_kind<'a>(
    remainder: &str,
    snapshot: &'a [ChordTypeDef],
) -> (Option<(&'a ChordTypeDef, String, usize)>, String) {
    let trunc_at = MOD_KEYWORDS
        .iter()
        .filter_map(|(kw, _)| remainder.find(kw))
        .min()
        .unwrap_or(remainder.len());
    let mut candidate = remainder[..trunc_at].to_string();

    for acc in ['#', 'b'] {
        let Some(p) = candidate.find(acc) else {
            continue;
        };
        let followed_by_digit = candidate[p + acc.len_utf8()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        let abbrev_uses_acc = snapshot
            .iter()
            .flat_map(|e| e.abbreviations.iter())
            .any(|a| a.contains(acc) && candidate.contains(a.as_str()));
        if followed_by_digit && !abbrev_uses_acc {
            candidate.truncate(p);
        }
    }

    let mut best: Option<(&ChordTypeDef, &str)> = None;
    for entry in snapshot {
        for abbrev in &entry.abbreviations {
            let matches = abbrev.is_empty() || candidate.contains(abbrev.as_str());
            if !matches {
                continue;
            }
            let better = match best {
                Some((_, b)) => abbrev.len() > b.len(),
                None => true,
            };
            if better {
                best = Some((entry, abbrev));
            }
        }
    }

    match best {
        Some((entry, abbrev)) if !abbrev.is_empty() => {
            // position is valid in `remainder` too: the candidate is a
            // prefix of it
            let pos = candidate.find(abbrev).unwrap_or(0);
            let mut residual = String::with_capacity(remainder.len());
            residual.push_str(&remainder[..pos]);
            residual.push_str(&remainder[pos + abbrev.len()..]);
            (Some((entry, abbrev.to_string(), pos)), residual)
        }
        Some((entry, _)) => (Some((entry, String::new(), 0)), remainder.to_string()),
        None => (None, remainder.to_string()),
    }
}

/// Stages 5–6: split the residual text into modifier tokens. Each token is
/// an optional keyword, an accidental run, and a decimal degree. A degree
/// above 20 is legacy concatenated shorthand and gets re-scanned.
fn tokenize_modifiers(
    residual: &str,
    base_pos: usize,
    tokens: &mut Vec<Token>,
) -> Result<(), ParseError> {
    let chars: Vec<char> = residual.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let rest: String = chars[i..].iter().collect();

        let mut keyword = None;
        for (kw, tag) in MOD_KEYWORDS {
            if rest.starts_with(kw) {
                keyword = Some(tag);
                i += kw.len();
                break;
            }
        }

        let acc_start = i;
        while i < chars.len() && (chars[i] == 'b' || chars[i] == '#') {
            i += 1;
        }
        let alter = accidental_run_alter(&chars[acc_start..i]);

        let dig_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if dig_start == i {
            let pos = base_pos + i.min(chars.len().saturating_sub(1));
            return match chars.get(i) {
                Some('/') => Err(ParseError::malformed_bass(
                    "text after '/' is not a note name",
                    pos,
                )),
                Some(c) if c.is_ascii_alphabetic() => Err(ParseError::unknown_kind_token(
                    format!("unrecognized text {:?} in figure", &rest),
                    pos,
                )),
                Some(c) => Err(ParseError::malformed_degree(
                    format!("expected degree digits, found {c:?}"),
                    pos,
                )),
                None => Err(ParseError::malformed_degree(
                    "modifier is missing its degree",
                    pos,
                )),
            };
        }

        let digits: String = chars[dig_start..i].iter().collect();
        let value: u32 = digits
            .parse()
            .map_err(|_| ParseError::malformed_degree(format!("bad degree {digits:?}"), start))?;
        if value == 0 {
            return Err(ParseError::malformed_degree(
                "degree must be positive",
                base_pos + dig_start,
            ));
        }

        if value > MAX_REAL_DEGREE {
            for tok in legacy_rescan(&chars[acc_start..i]) {
                let tok = tok.map_err(|msg| {
                    ParseError::malformed_degree(msg, base_pos + acc_start)
                })?;
                tokens.push(Token {
                    kind: TokenKind::Modifier(tok),
                    pos: base_pos + acc_start,
                });
            }
        } else {
            tokens.push(Token {
                kind: TokenKind::Modifier(ModifierToken {
                    keyword,
                    alter,
                    degree: value as u8,
                }),
                pos: base_pos + start,
            });
        }
    }

    Ok(())
}

/// Alteration of an accidental run: any flat makes the run flat.
fn accidental_run_alter(run: &[char]) -> i8 {
    let flats = run.iter().filter(|c| **c == 'b').count() as i8;
    if flats > 0 {
        -flats
    } else {
        run.len() as i8
    }
}

/// Legacy concatenated-shorthand recovery. A two-digit degree starting
/// with `1` (11, 13, ...) is one token; every other accidental-prefixed
/// run is its own token. Recovers figures written without separators,
/// e.g. `35b7b9#11b13`.
fn legacy_rescan(seg: &[char]) -> Vec<Result<ModifierToken, String>> {
    let mut out = Vec::new();
    let mut acc: Vec<char> = Vec::new();
    let mut i = 0;

    while i < seg.len() {
        let c = seg[i];
        if c == 'b' || c == '#' {
            acc.push(c);
            i += 1;
            continue;
        }
        let digit_text: String = if c == '1' && i + 1 < seg.len() && seg[i + 1].is_ascii_digit() {
            i += 2;
            seg[i - 2..i].iter().collect()
        } else {
            i += 1;
            c.to_string()
        };
        let alter = accidental_run_alter(&acc);
        acc.clear();
        match digit_text.parse::<u8>() {
            Ok(degree) if degree > 0 => out.push(Ok(ModifierToken {
                keyword: None,
                alter,
                degree,
            })),
            _ => out.push(Err(format!("bad degree {digit_text:?} in legacy token"))),
        }
    }

    out
}
