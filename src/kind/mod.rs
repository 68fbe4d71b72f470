//! The chord-kind table: canonical chord-type formulas, their
//! abbreviations, and the alias map.
//!
//! Table order is a total order — the reverse classifier walks it as a
//! priority list — and every administrative mutation preserves it. The
//! table is shared state read on every parse/realize/classify call, so the
//! entries sit behind a readers-writer lock: lookups take shared reads,
//! administration takes the exclusive write.

pub mod persistence;

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// One step of a chord formula: a scale degree (2 and up — the root is
/// implicit) plus a signed semitone alteration of the major-scale tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaStep {
    pub degree: u8,
    pub alter: i8,
}

impl FormulaStep {
    pub fn new(degree: u8, alter: i8) -> Self {
        Self { degree, alter }
    }
}

/// Structural family of a chord type, tagged at registration.
///
/// Families drive the rules that vary by chord class: the spacing widen
/// pass applies to the three extension families, and each family caps how
/// deep an inversion may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Pedal,
    Power,
    Triad,
    Suspended,
    Sixth,
    /// The borrowed chromatic types (Neapolitan, Italian, French, German,
    /// Tristan): inverted like sevenths whatever their formula says.
    AlteredSixth,
    Seventh,
    Ninth,
    Eleventh,
    Thirteenth,
}

impl Family {
    /// Classify a formula by its degrees.
    pub fn derive(formula: &[FormulaStep]) -> Family {
        if formula.is_empty() {
            return Family::Pedal;
        }
        if formula.len() == 1 && formula[0].degree == 5 {
            return Family::Power;
        }
        let max = formula.iter().map(|s| s.degree).max().unwrap_or(0);
        let has = |d: u8| formula.iter().any(|s| s.degree == d);
        match max {
            13 => Family::Thirteenth,
            11 => Family::Eleventh,
            9 => Family::Ninth,
            7 => Family::Seventh,
            6 => Family::Sixth,
            _ => {
                if (has(2) || has(4)) && !has(3) {
                    Family::Suspended
                } else {
                    Family::Triad
                }
            }
        }
    }

    /// Deepest inversion this family supports; 0 means none.
    pub fn max_inversion(self) -> u8 {
        match self {
            Family::Pedal => 0,
            Family::Power | Family::Triad | Family::Suspended | Family::Sixth => 2,
            Family::AlteredSixth | Family::Seventh => 3,
            Family::Ninth => 4,
            Family::Eleventh | Family::Thirteenth => 5,
        }
    }

    /// Whether the spacing widen pass applies (ninth and up).
    pub fn is_extended(self) -> bool {
        matches!(self, Family::Ninth | Family::Eleventh | Family::Thirteenth)
    }
}

/// A registered chord type: canonical name, formula, abbreviation list
/// (first entry is the default rendering), and family tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTypeDef {
    pub name: String,
    pub formula: Vec<FormulaStep>,
    pub abbreviations: Vec<String>,
    pub family: Family,
}

impl ChordTypeDef {
    /// Build a definition, deriving the family from the formula.
    pub fn new(
        name: &str,
        formula_text: &str,
        abbreviations: &[&str],
    ) -> Result<ChordTypeDef, TableError> {
        let formula = parse_formula(formula_text)?;
        let family = Family::derive(&formula);
        Self::with_family(name, formula, abbreviations, family)
    }

    fn with_family(
        name: &str,
        formula: Vec<FormulaStep>,
        abbreviations: &[&str],
        family: Family,
    ) -> Result<ChordTypeDef, TableError> {
        if abbreviations.is_empty() {
            return Err(TableError::EmptyAbbreviations(name.to_string()));
        }
        Ok(ChordTypeDef {
            name: name.to_string(),
            formula,
            abbreviations: abbreviations.iter().map(|s| s.to_string()).collect(),
            family,
        })
    }

    /// The default (first-listed) abbreviation.
    pub fn default_abbreviation(&self) -> &str {
        &self.abbreviations[0]
    }
}

/// Parse formula text in degree notation: comma-separated degrees with
/// `-`/`#` alteration marks before or after the digits ("1,3,5,-7",
/// "1,2-,3,5-"). A leading degree 1 is accepted and dropped.
pub fn parse_formula(text: &str) -> Result<Vec<FormulaStep>, TableError> {
    let mut formula = Vec::new();
    for raw in text.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let flats = token.matches('-').count() as i8;
        let sharps = token.matches('#').count() as i8;
        let alter = if flats > 0 { -flats } else { sharps };
        let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
        let degree: u8 = digits
            .parse()
            .map_err(|_| TableError::BadFormula(text.to_string()))?;
        if degree == 0 {
            return Err(TableError::BadFormula(text.to_string()));
        }
        if degree == 1 && alter == 0 {
            continue;
        }
        formula.push(FormulaStep::new(degree, alter));
    }
    Ok(formula)
}

/// Errors from table administration.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    UnknownKind(String),
    EmptyAbbreviations(String),
    BadFormula(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::UnknownKind(name) => write!(f, "unknown chord kind: {name}"),
            TableError::EmptyAbbreviations(name) => {
                write!(f, "chord kind {name} needs at least one abbreviation")
            }
            TableError::BadFormula(text) => write!(f, "malformed formula text: {text}"),
        }
    }
}

impl std::error::Error for TableError {}

struct TableInner {
    entries: Vec<ChordTypeDef>,
    aliases: HashMap<String, String>,
}

/// The kind registry. See the module docs for the locking discipline.
pub struct KindTable {
    inner: RwLock<TableInner>,
}

impl KindTable {
    /// An empty table with no kinds and no aliases.
    pub fn empty() -> KindTable {
        KindTable {
            inner: RwLock::new(TableInner {
                entries: Vec::new(),
                aliases: HashMap::new(),
            }),
        }
    }

    /// The standard table: triads, sixths, the seventh/ninth/eleventh/
    /// thirteenth families, suspensions, the borrowed chromatic types,
    /// pedal and power chords — in classification priority order.
    pub fn standard() -> KindTable {
        let table = KindTable::empty();
        {
            let mut inner = table.write();
            for def in standard_defs() {
                inner.entries.push(def);
            }
            for (alias, canonical) in [
                ("dominant", "dominant-seventh"),
                ("major-minor", "minor-major-seventh"),
                ("half-diminished", "half-diminished-seventh"),
            ] {
                inner.aliases.insert(alias.to_string(), canonical.to_string());
            }
        }
        table
    }

    /// The shared process-wide table, built on first use.
    pub fn global() -> &'static KindTable {
        static GLOBAL: OnceLock<KindTable> = OnceLock::new();
        GLOBAL.get_or_init(KindTable::standard)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TableInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TableInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Canonicalize a kind name through the alias map and confirm it is
    /// registered. Returns `None` for an unknown kind.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let inner = self.read();
        let canonical = inner.aliases.get(name).map(String::as_str).unwrap_or(name);
        inner
            .entries
            .iter()
            .find(|e| e.name == canonical)
            .map(|e| e.name.clone())
    }

    /// The ordered formula of a kind (alias-resolved).
    pub fn formula(&self, kind: &str) -> Option<Vec<FormulaStep>> {
        self.lookup(kind, |e| e.formula.clone())
    }

    /// All abbreviations of a kind, default first (alias-resolved).
    pub fn abbreviations(&self, kind: &str) -> Option<Vec<String>> {
        self.lookup(kind, |e| e.abbreviations.clone())
    }

    /// The default abbreviation of a kind (alias-resolved).
    pub fn default_abbreviation(&self, kind: &str) -> Option<String> {
        self.lookup(kind, |e| e.abbreviations[0].clone())
    }

    /// The family tag of a kind (alias-resolved).
    pub fn family(&self, kind: &str) -> Option<Family> {
        self.lookup(kind, |e| e.family)
    }

    /// Registered kind names in table order.
    pub fn kind_names(&self) -> Vec<String> {
        self.read().entries.iter().map(|e| e.name.clone()).collect()
    }

    /// A point-in-time copy of the table entries, in priority order. The
    /// lexer and classifier iterate over a snapshot so a single call sees
    /// one consistent table.
    pub fn snapshot(&self) -> Vec<ChordTypeDef> {
        self.read().entries.clone()
    }

    fn lookup<T>(&self, kind: &str, f: impl Fn(&ChordTypeDef) -> T) -> Option<T> {
        let inner = self.read();
        let canonical = inner.aliases.get(kind).map(String::as_str).unwrap_or(kind);
        inner.entries.iter().find(|e| e.name == canonical).map(f)
    }

    /// Register a chord type. A new name appends at the lowest priority; an
    /// existing name is redefined in place, keeping its table position.
    pub fn register(&self, def: ChordTypeDef) {
        let mut inner = self.write();
        if let Some(existing) = inner.entries.iter_mut().find(|e| e.name == def.name) {
            *existing = def;
        } else {
            inner.entries.push(def);
        }
    }

    /// Remove a kind from the table so it can no longer be parsed or
    /// classified.
    pub fn remove(&self, kind: &str) -> Result<(), TableError> {
        let mut inner = self.write();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.name != kind);
        if inner.entries.len() == before {
            return Err(TableError::UnknownKind(kind.to_string()));
        }
        Ok(())
    }

    /// Make `new_default` the default abbreviation of `kind`. An already
    /// listed abbreviation moves to the front; a new one is inserted there.
    /// Nothing is deleted, so every previously valid spelling still parses.
    pub fn promote_abbreviation(&self, kind: &str, new_default: &str) -> Result<(), TableError> {
        let mut inner = self.write();
        let canonical = inner
            .aliases
            .get(kind)
            .map(String::as_str)
            .unwrap_or(kind)
            .to_string();
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.name == canonical)
            .ok_or_else(|| TableError::UnknownKind(kind.to_string()))?;
        if let Some(pos) = entry.abbreviations.iter().position(|a| a == new_default) {
            let abbr = entry.abbreviations.remove(pos);
            entry.abbreviations.insert(0, abbr);
        } else {
            entry.abbreviations.insert(0, new_default.to_string());
        }
        Ok(())
    }

    /// Register an alternate name for a canonical kind.
    pub fn add_alias(&self, alias: &str, canonical: &str) -> Result<(), TableError> {
        let mut inner = self.write();
        if !inner.entries.iter().any(|e| e.name == canonical) {
            return Err(TableError::UnknownKind(canonical.to_string()));
        }
        inner.aliases.insert(alias.to_string(), canonical.to_string());
        Ok(())
    }
}

fn def(name: &str, formula: &str, abbrevs: &[&str]) -> ChordTypeDef {
    // standard-table text is static and known good
    ChordTypeDef::new(name, formula, abbrevs).expect("standard table entry")
}

fn altered_sixth(name: &str, formula: &str, abbrevs: &[&str]) -> ChordTypeDef {
    let steps = parse_formula(formula).expect("standard table entry");
    ChordTypeDef::with_family(name, steps, abbrevs, Family::AlteredSixth)
        .expect("standard table entry")
}

fn standard_defs() -> Vec<ChordTypeDef> {
    vec![
        def("major", "1,3,5", &["", "M", "maj"]),
        def("minor", "1,-3,5", &["m", "min"]),
        def("augmented", "1,3,#5", &["+", "aug"]),
        def("diminished", "1,-3,-5", &["dim", "o"]),
        // sevenths
        def("dominant-seventh", "1,3,5,-7", &["7", "dom7"]),
        def("major-seventh", "1,3,5,7", &["maj7", "M7"]),
        def("minor-major-seventh", "1,-3,5,7", &["mM7", "m#7", "minmaj7"]),
        def("minor-seventh", "1,-3,5,-7", &["m7", "min7"]),
        def("augmented-major-seventh", "1,3,#5,7", &["+M7", "augmaj7"]),
        def("augmented-seventh", "1,3,#5,-7", &["7+", "+7", "aug7"]),
        def("half-diminished-seventh", "1,-3,-5,-7", &["/o7", "m7b5"]),
        def("diminished-seventh", "1,-3,-5,--7", &["o7", "dim7"]),
        def("seventh-flat-five", "1,3,-5,-7", &["dom7dim5"]),
        // sixths
        def("major-sixth", "1,3,5,6", &["6"]),
        def("minor-sixth", "1,-3,5,6", &["m6", "min6"]),
        // ninths
        def("major-ninth", "1,3,5,7,9", &["M9", "Maj9"]),
        def("dominant-ninth", "1,3,5,-7,9", &["9", "dom9"]),
        def("minor-major-ninth", "1,-3,5,7,9", &["mM9", "minmaj9"]),
        def("minor-ninth", "1,-3,5,-7,9", &["m9", "min9"]),
        def("augmented-major-ninth", "1,3,#5,7,9", &["+M9", "augmaj9"]),
        def("augmented-dominant-ninth", "1,3,#5,-7,9", &["9#5", "+9", "aug9"]),
        def("half-diminished-ninth", "1,-3,-5,-7,9", &["/o9"]),
        def("half-diminished-minor-ninth", "1,-3,-5,-7,-9", &["/ob9"]),
        def("diminished-ninth", "1,-3,-5,--7,9", &["o9", "dim9"]),
        def("diminished-minor-ninth", "1,-3,-5,--7,-9", &["ob9", "dimb9"]),
        // elevenths
        def("dominant-11th", "1,3,5,-7,9,11", &["11", "dom11"]),
        def("major-11th", "1,3,5,7,9,11", &["M11", "Maj11"]),
        def("minor-major-11th", "1,-3,5,7,9,11", &["mM11", "minmaj11"]),
        def("minor-11th", "1,-3,5,-7,9,11", &["m11", "min11"]),
        def("augmented-major-11th", "1,3,#5,7,9,11", &["+M11", "augmaj11"]),
        def("augmented-11th", "1,3,#5,-7,9,11", &["+11", "aug11"]),
        def("half-diminished-11th", "1,-3,-5,-7,-9,11", &["/o11"]),
        def("diminished-11th", "1,-3,-5,--7,-9,-11", &["o11", "dim11"]),
        // thirteenths
        def("major-13th", "1,3,5,7,9,11,13", &["M13", "Maj13"]),
        def("dominant-13th", "1,3,5,-7,9,11,13", &["13", "dom13"]),
        def("minor-major-13th", "1,-3,5,7,9,11,13", &["mM13", "minmaj13"]),
        def("minor-13th", "1,-3,5,-7,9,11,13", &["m13", "min13"]),
        def("augmented-major-13th", "1,3,#5,7,9,11,13", &["+M13", "augmaj13"]),
        def("augmented-dominant-13th", "1,3,#5,-7,9,11,13", &["+13", "aug13"]),
        def("half-diminished-13th", "1,-3,-5,-7,9,11,13", &["/o13"]),
        // other
        def("suspended-second", "1,2,5", &["sus2"]),
        def("suspended-fourth", "1,4,5", &["sus", "sus4"]),
        def("suspended-fourth-seventh", "1,4,5,-7", &["7sus", "7sus4"]),
        altered_sixth("Neapolitan", "1,2-,3,5-", &["N6"]),
        altered_sixth("Italian", "1,#4,-6", &["It+6", "It"]),
        altered_sixth("French", "1,2,#4,-6", &["Fr+6", "Fr"]),
        altered_sixth("German", "1,-3,#4,-6", &["Gr+6", "Ger"]),
        def("pedal", "1", &["pedal"]),
        def("power", "1,5", &["power"]),
        altered_sixth("Tristan", "1,#4,#6,#9", &["tristan"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_resolves_canonical_names() {
        let table = KindTable::standard();
        assert_eq!(
            table.resolve("minor-seventh"),
            Some("minor-seventh".to_string())
        );
        assert_eq!(table.resolve("no-such-kind"), None);
    }

    #[test]
    fn aliases_canonicalize_before_lookup() {
        let table = KindTable::standard();
        assert_eq!(
            table.resolve("dominant"),
            Some("dominant-seventh".to_string())
        );
        assert_eq!(
            table.formula("half-diminished"),
            table.formula("half-diminished-seventh")
        );
    }

    #[test]
    fn formula_excludes_implicit_root() {
        let table = KindTable::standard();
        let formula = table.formula("dominant-seventh").unwrap();
        assert_eq!(
            formula,
            vec![
                FormulaStep::new(3, 0),
                FormulaStep::new(5, 0),
                FormulaStep::new(7, -1)
            ]
        );
        assert!(table.formula("pedal").unwrap().is_empty());
    }

    #[test]
    fn trailing_accidental_formula_text() {
        let steps = parse_formula("1,2-,3,5-").unwrap();
        assert_eq!(
            steps,
            vec![
                FormulaStep::new(2, -1),
                FormulaStep::new(3, 0),
                FormulaStep::new(5, -1)
            ]
        );
    }

    #[test]
    fn double_flat_seventh() {
        let steps = parse_formula("1,-3,-5,--7").unwrap();
        assert_eq!(steps[2], FormulaStep::new(7, -2));
    }

    #[test]
    fn family_derivation() {
        let table = KindTable::standard();
        assert_eq!(table.family("major"), Some(Family::Triad));
        assert_eq!(table.family("suspended-second"), Some(Family::Suspended));
        assert_eq!(table.family("suspended-fourth-seventh"), Some(Family::Seventh));
        assert_eq!(table.family("major-sixth"), Some(Family::Sixth));
        assert_eq!(table.family("minor-ninth"), Some(Family::Ninth));
        assert_eq!(table.family("dominant-13th"), Some(Family::Thirteenth));
        assert_eq!(table.family("pedal"), Some(Family::Pedal));
        assert_eq!(table.family("power"), Some(Family::Power));
        assert_eq!(table.family("German"), Some(Family::AlteredSixth));
        assert_eq!(table.family("Tristan"), Some(Family::AlteredSixth));
    }

    #[test]
    fn inversion_caps_by_family() {
        assert_eq!(Family::Pedal.max_inversion(), 0);
        assert_eq!(Family::Triad.max_inversion(), 2);
        assert_eq!(Family::Seventh.max_inversion(), 3);
        assert_eq!(Family::AlteredSixth.max_inversion(), 3);
        assert_eq!(Family::Ninth.max_inversion(), 4);
        assert_eq!(Family::Thirteenth.max_inversion(), 5);
    }

    #[test]
    fn register_appends_at_lowest_priority() {
        let table = KindTable::standard();
        let def = ChordTypeDef::new("quartal", "1,4,-7", &["q4"]).unwrap();
        table.register(def);
        let names = table.kind_names();
        assert_eq!(names.last().map(String::as_str), Some("quartal"));
        assert_eq!(
            table.default_abbreviation("quartal"),
            Some("q4".to_string())
        );
    }

    #[test]
    fn register_existing_keeps_position() {
        let table = KindTable::standard();
        let pos_before = table
            .kind_names()
            .iter()
            .position(|n| n == "minor")
            .unwrap();
        table.register(ChordTypeDef::new("minor", "1,-3,5", &["min", "m"]).unwrap());
        let names = table.kind_names();
        assert_eq!(names.iter().position(|n| n == "minor"), Some(pos_before));
        assert_eq!(table.default_abbreviation("minor"), Some("min".to_string()));
    }

    #[test]
    fn remove_unregisters() {
        let table = KindTable::standard();
        table.remove("Tristan").unwrap();
        assert_eq!(table.resolve("Tristan"), None);
        assert_eq!(
            table.remove("Tristan"),
            Err(TableError::UnknownKind("Tristan".to_string()))
        );
    }

    #[test]
    fn promote_reorders_without_deleting() {
        let table = KindTable::standard();
        table.promote_abbreviation("major", "maj").unwrap();
        let abbrevs = table.abbreviations("major").unwrap();
        assert_eq!(abbrevs[0], "maj");
        assert!(abbrevs.contains(&"".to_string()));
        assert!(abbrevs.contains(&"M".to_string()));
        assert_eq!(abbrevs.len(), 3);
    }

    #[test]
    fn promote_new_abbreviation_inserts() {
        let table = KindTable::standard();
        table.promote_abbreviation("diminished", "°").unwrap();
        let abbrevs = table.abbreviations("diminished").unwrap();
        assert_eq!(abbrevs, vec!["°", "dim", "o"]);
    }

    #[test]
    fn empty_abbreviation_list_rejected() {
        assert!(matches!(
            ChordTypeDef::new("bare", "1,3,5", &[]),
            Err(TableError::EmptyAbbreviations(_))
        ));
    }

    #[test]
    fn bad_formula_rejected() {
        assert!(matches!(
            parse_formula("1,x,5"),
            Err(TableError::BadFormula(_))
        ));
        assert!(matches!(
            parse_formula("1,0"),
            Err(TableError::BadFormula(_))
        ));
    }
}
