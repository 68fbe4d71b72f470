//! Structured chord-symbol types — the parser's output.

use crate::pitch::Pitch;

/// What a step modification does to a realized chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModType {
    /// Add a tone at a degree of the root's scale. The degree is read
    /// against a dominant-chord reference frame, so an unaltered `add 7`
    /// lands on the major seventh.
    Add,
    /// Transpose the tone occupying a degree already in the chord.
    Alter,
    /// Remove the tone occupying a degree already in the chord. Also
    /// spelled `omit` in figures.
    Subtract,
}

impl ModType {
    pub fn keyword(self) -> &'static str {
        match self {
            ModType::Add => "add",
            ModType::Alter => "alter",
            ModType::Subtract => "subtract",
        }
    }
}

/// One add/alter/subtract instruction against a single scale degree.
///
/// `degree` is always positive; `alter` is the signed semitone shift
/// (zero when the figure wrote no accidentals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordStepModification {
    pub mod_type: ModType,
    pub degree: u8,
    pub alter: i8,
}

impl ChordStepModification {
    pub fn new(mod_type: ModType, degree: u8, alter: i8) -> Self {
        debug_assert!(degree > 0);
        Self {
            mod_type,
            degree,
            alter,
        }
    }
}

/// A parsed chord symbol: root, optional bass, resolved kind, and the
/// ordered step modifications to apply at realization time.
///
/// The symbol itself is immutable once parsed — modifications are data the
/// realizer interprets, not mutations of the symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordSymbol {
    pub root: Pitch,
    pub bass: Option<Pitch>,
    /// Canonical kind name, or `None` when the figure carried no
    /// recognizable kind shorthand.
    pub kind: Option<String>,
    pub modifications: Vec<ChordStepModification>,
    /// Explicit inversion request (direct-construction path); the realizer
    /// otherwise derives the inversion from the bass.
    pub inversion: Option<u8>,
}

impl ChordSymbol {
    /// A bare symbol on a root, kind unknown, no bass.
    pub fn on_root(root: Pitch) -> Self {
        Self {
            root,
            bass: None,
            kind: None,
            modifications: Vec::new(),
            inversion: None,
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_bass(mut self, bass: Pitch) -> Self {
        self.bass = Some(bass);
        self
    }

    pub fn with_modification(mut self, m: ChordStepModification) -> Self {
        self.modifications.push(m);
        self
    }

    pub fn with_inversion(mut self, inversion: u8) -> Self {
        self.inversion = Some(inversion);
        self
    }
}
