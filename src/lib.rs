//! Tertian — chord-symbol figures: parsing, pitch realization, and
//! reverse classification.
//!
//! The three core operations:
//!
//! - [`parse`] turns figure text (`"Cm7"`, `"G9#5"`, `"F#m11/G#"`) into a
//!   structured [`ChordSymbol`];
//! - [`realize`] turns a symbol into an ordered, octave-placed
//!   [`RealizedChord`];
//! - [`classify`] goes the other way: a pitch collection plus a root back
//!   to the best-matching figure.
//!
//! All three read the [`KindTable`], the priority-ordered registry of
//! chord-type formulas and abbreviations. The process-wide table is the
//! default; every entry point has an `_in` variant taking an explicit one.

pub mod chord;
pub mod classify;
pub mod figure;
pub mod kind;
pub mod pitch;
pub mod progression;
pub mod realize;

pub use classify::{classify, classify_collection, Classified, ClassifyError};
pub use figure::{parse, ChordStepModification, ChordSymbol, ModType, ParseError, ParseErrorKind};
pub use kind::{ChordTypeDef, Family, FormulaStep, KindTable, TableError};
pub use pitch::{Pitch, Step};
pub use realize::{realize, ChordTone, RealizeError, RealizedChord};
