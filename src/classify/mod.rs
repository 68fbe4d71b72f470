//! Reverse classification — pitches plus a root back to a figure.
//!
//! The classifier profiles the collection as semitone distances at the six
//! tertian slots (3, 5, 7, 9, 11, 13), tries an exact-shape match against
//! the kind table in priority order (Pass A, with the permitted omissions
//! each arity tolerates), falls back to scoring present slots against every
//! formula (Pass B), then reconciles any residue as add/omit annotations so
//! the emitted figure realizes back to exactly the input pitch classes.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use crate::chord::{self, RootError};
use crate::figure;
use crate::kind::{ChordTypeDef, FormulaStep, KindTable};
use crate::pitch::{major_scale, Pitch};
use crate::realize;

/// Slot order of the interval profile.
const SLOT_DEGREES: [u8; 6] = [3, 5, 7, 9, 11, 13];
/// Generic (letter) degree each slot answers to.
const SLOT_GENERIC: [u8; 6] = [3, 5, 7, 2, 4, 6];
/// Unaltered reference semitones per slot.
const SLOT_REFERENCE: [u8; 6] = [4, 7, 11, 2, 5, 9];

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub figure: String,
    pub kind: String,
}

/// Classification errors. Only the root-finding entry point can fail;
/// classification proper bottoms out at `None` (unclassifiable).
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyError {
    Root(RootError),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Root(e) => write!(f, "root finding failed: {e}"),
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifyError::Root(e) => Some(e),
        }
    }
}

impl From<RootError> for ClassifyError {
    fn from(e: RootError) -> Self {
        ClassifyError::Root(e)
    }
}

/// Classify with a known root against the process-wide table.
pub fn classify(pitches: &[Pitch], root: &Pitch) -> Option<Classified> {
    classify_in(pitches, root, KindTable::global())
}

/// Classify an arbitrary collection: run the root-finding heuristic first.
pub fn classify_collection(pitches: &[Pitch]) -> Result<Option<Classified>, ClassifyError> {
    classify_collection_in(pitches, KindTable::global())
}

/// [`classify_collection`] against an explicit table.
pub fn classify_collection_in(
    pitches: &[Pitch],
    table: &KindTable,
) -> Result<Option<Classified>, ClassifyError> {
    let root = chord::find_root(pitches)?;
    Ok(classify_in(pitches, &root, table))
}

/// Classify with a known root against an explicit table.
pub fn classify_in(pitches: &[Pitch], root: &Pitch, table: &KindTable) -> Option<Classified> {
    if pitches.is_empty() {
        return None;
    }
    if pitches.len() == 1 {
        return Some(Classified {
            figure: format!("{}pedal", root.name()),
            kind: "pedal".to_string(),
        });
    }

    let prof = profile(pitches, root);
    let snapshot = table.snapshot();

    let matched = match pass_a(&prof, pitches, root, &snapshot) {
        Some(entry) => {
            debug!("pass A matched {}", entry.name);
            entry
        }
        None => {
            let entry = pass_b(&prof, &snapshot)?;
            debug!("pass B fell back to {}", entry.name);
            entry
        }
    };

    let lowest = pitches.iter().min_by_key(|p| p.diatonic_key())?;
    let inverted = !lowest.same_name(root);

    // An inverted sus2 reads as a sus4 on its bass, mirroring the parser's
    // suspended-root rule.
    let (fig_root, kind_name, abbreviation, bass_suffix) =
        if inverted && matched.name == "suspended-second" {
            match table.default_abbreviation("suspended-fourth") {
                Some(abbr) => (lowest, "suspended-fourth".to_string(), abbr, None),
                None => (
                    root,
                    matched.name.clone(),
                    matched.default_abbreviation().to_string(),
                    Some(lowest),
                ),
            }
        } else {
            (
                root,
                matched.name.clone(),
                matched.default_abbreviation().to_string(),
                inverted.then_some(lowest),
            )
        };

    let mut fig = format!("{}{}", fig_root.name(), abbreviation);
    if let Some(bass) = bass_suffix {
        fig.push('/');
        fig.push_str(&bass.name());
    }

    let fig = reconcile_residue(fig, fig_root, pitches, table);

    Some(Classified {
        figure: fig,
        kind: kind_name,
    })
}

/// Semitone distance from the root at each tertian slot, or absent.
fn profile(pitches: &[Pitch], root: &Pitch) -> [Option<u8>; 6] {
    let mut out = [None; 6];
    for (i, generic) in SLOT_GENERIC.iter().enumerate() {
        out[i] = pitches
            .iter()
            .find(|p| p.degree_above(root) == *generic)
            .map(|p| (p.pc() + 12 - root.pc()) % 12);
    }
    out
}

/// Semitones of a formula step against the dominant reference frame.
fn formula_semitone(step: &FormulaStep) -> Option<u8> {
    let reference = match step.degree {
        2 | 9 => 2,
        3 => 4,
        4 | 11 => 5,
        5 => 7,
        6 | 13 => 9,
        7 => 11,
        _ => return None,
    };
    Some(((reference + step.alter as i32).rem_euclid(12)) as u8)
}

/// Slots an arity is allowed to leave unfilled when the formula carries
/// the unaltered reference interval there.
fn permitted_omissions(arity: usize) -> &'static [u8] {
    match arity {
        4 => &[5],
        5 => &[3, 5],
        6 => &[5, 11, 9],
        _ => &[],
    }
}

/// Pass A: exact-shape match at the arity the profile implies, walking the
/// table in priority order.
fn pass_a<'a>(
    prof: &[Option<u8>; 6],
    pitches: &[Pitch],
    root: &Pitch,
    snapshot: &'a [ChordTypeDef],
) -> Option<&'a ChordTypeDef> {
    let arity = if prof[5].is_some() {
        6
    } else if prof[4].is_some() {
        5
    } else if prof[3].is_some() {
        4
    } else if chord::is_seventh_shaped(pitches, root) {
        3
    } else if chord::is_triad_shaped(pitches, root) {
        2
    } else {
        return None;
    };

    let omissions = permitted_omissions(arity);
    snapshot
        .iter()
        .filter(|entry| entry.formula.len() == arity)
        .find(|entry| {
            entry.formula.iter().enumerate().all(|(i, step)| {
                let Some(formula_val) = formula_semitone(step) else {
                    return false;
                };
                match prof[i] {
                    Some(v) => v == formula_val,
                    None => {
                        omissions.contains(&SLOT_DEGREES[i]) && formula_val == SLOT_REFERENCE[i]
                    }
                }
            })
        })
}

/// Pass B: ignore arity, compare each kind's formula degrees against the
/// profile slots that are present, and keep the fullest match. Equal
/// scores keep the earlier kind in table order.
fn pass_b<'a>(prof: &[Option<u8>; 6], snapshot: &'a [ChordTypeDef]) -> Option<&'a ChordTypeDef> {
    let mut best: Option<(&ChordTypeDef, usize)> = None;
    for entry in snapshot {
        let all_match = entry.formula.iter().all(|step| {
            match (slot_index(step.degree), formula_semitone(step)) {
                (Some(si), Some(formula_val)) => prof[si] == Some(formula_val),
                _ => false,
            }
        });
        if !all_match {
            continue;
        }
        let count = entry.formula.len();
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((entry, count));
        }
    }
    best.map(|(entry, _)| entry)
}

fn slot_index(degree: u8) -> Option<usize> {
    match degree {
        3 => Some(0),
        5 => Some(1),
        7 => Some(2),
        2 | 9 => Some(3),
        4 | 11 => Some(4),
        6 | 13 => Some(5),
        _ => None,
    }
}

/// Step 5: realize the synthesized figure and annotate whatever differs
/// from the input, so that parsing the final figure reproduces the input
/// pitch-class set exactly.
fn reconcile_residue(
    mut fig: String,
    fig_root: &Pitch,
    pitches: &[Pitch],
    table: &KindTable,
) -> String {
    let Ok(symbol) = figure::parse_in(&fig, table) else {
        return fig;
    };
    let Ok(reference) = realize::realize_in(&symbol, table) else {
        return fig;
    };

    let input_pcs: BTreeSet<u8> = pitches.iter().map(|p| p.pc()).collect();
    let reference_pcs = reference.pitch_classes();
    let scale = major_scale(fig_root);

    for pc in input_pcs.difference(&reference_pcs) {
        let Some(pitch) = pitches.iter().find(|p| p.pc() == *pc) else {
            continue;
        };
        let generic = pitch.degree_above(fig_root);
        let delta = pitch.alter - scale.pitch_at_simple(generic, 0).alter;
        let occupied = reference.tones().iter().any(|t| {
            t.degree
                .map(|d| ((d - 1) % 7) + 1)
                .is_some_and(|d| d == generic)
        });
        // tensions read as 9/11/13; a compound degree also keeps the add
        // from displacing an occupied simple degree
        let degree = if generic == 1 || occupied || matches!(generic, 2 | 4 | 6) {
            generic + 7
        } else {
            generic
        };
        fig.push_str(&format!(" add {}{}", accidental_marks(delta), degree));
    }

    for pc in reference_pcs.difference(&input_pcs) {
        let Some(tone) = reference.tones().iter().find(|t| t.pitch.pc() == *pc) else {
            continue;
        };
        if let Some(degree) = tone.degree {
            fig.push_str(&format!(" omit {degree}"));
        }
    }

    fig
}

fn accidental_marks(delta: i8) -> String {
    if delta >= 0 {
        "#".repeat(delta as usize)
    } else {
        "b".repeat((-delta) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(names: &[&str]) -> Vec<Pitch> {
        names.iter().map(|n| Pitch::parse(n).unwrap()).collect()
    }

    fn root(name: &str) -> Pitch {
        Pitch::parse(name).unwrap()
    }

    #[test]
    fn classify_major_ninth() {
        let result = classify(&pitches(&["C3", "E3", "G3", "B3", "D4"]), &root("C")).unwrap();
        assert_eq!(result.figure, "CM9");
        assert_eq!(result.kind, "major-ninth");
    }

    #[test]
    fn classify_single_pitch_is_pedal() {
        let result = classify(&pitches(&["C3"]), &root("C")).unwrap();
        assert_eq!(result.figure, "Cpedal");
        assert_eq!(result.kind, "pedal");
    }

    #[test]
    fn classify_major_triad() {
        let result = classify(&pitches(&["C2", "E2", "G2"]), &root("C")).unwrap();
        assert_eq!(result.figure, "C");
        assert_eq!(result.kind, "major");
    }

    #[test]
    fn classify_minor_seventh() {
        let result = classify(&pitches(&["C3", "E-3", "G3", "B-3"]), &root("C")).unwrap();
        assert_eq!(result.figure, "Cm7");
        assert_eq!(result.kind, "minor-seventh");
    }

    #[test]
    fn classify_inverted_seventh_names_bass() {
        let result = classify(&pitches(&["E3", "G3", "B-3", "C4"]), &root("C")).unwrap();
        assert_eq!(result.figure, "C7/E");
        assert_eq!(result.kind, "dominant-seventh");
    }

    #[test]
    fn classify_ninth_with_omitted_fifth() {
        let result = classify(&pitches(&["C3", "E3", "B-3", "D4"]), &root("C")).unwrap();
        assert_eq!(result.kind, "dominant-ninth");
        assert_eq!(result.figure, "C9 omit 5");
    }

    #[test]
    fn classify_sixth_through_fallback() {
        let result = classify(&pitches(&["C3", "E3", "G3", "A3"]), &root("C")).unwrap();
        assert_eq!(result.kind, "major-sixth");
        assert_eq!(result.figure, "C6");
    }

    #[test]
    fn classify_power_chord_through_fallback() {
        let result = classify(&pitches(&["C3", "G3"]), &root("C")).unwrap();
        assert_eq!(result.kind, "power");
        assert_eq!(result.figure, "Cpower");
    }

    #[test]
    fn classify_suspended_fourth() {
        let result = classify(&pitches(&["C3", "F3", "G3"]), &root("C")).unwrap();
        assert_eq!(result.kind, "suspended-fourth");
        assert_eq!(result.figure, "Csus");
    }

    #[test]
    fn inverted_sus2_reroots_as_sus4() {
        // G up to C is a fourth: a sus2 on C over G reads as Gsus
        let result = classify(&pitches(&["G2", "C3", "D3"]), &root("C")).unwrap();
        assert_eq!(result.kind, "suspended-fourth");
        assert_eq!(result.figure, "Gsus");
    }

    #[test]
    fn classify_extra_tone_gets_add_annotation() {
        let result = classify(&pitches(&["C3", "E3", "G3", "B-3", "D-4"]), &root("C")).unwrap();
        assert_eq!(result.kind, "dominant-seventh");
        assert_eq!(result.figure, "C7 add b9");
    }

    #[test]
    fn annotated_figure_round_trips_to_input_pitch_classes() {
        let input = pitches(&["C3", "E3", "G3", "B-3", "D-4"]);
        let result = classify(&input, &root("C")).unwrap();
        let symbol = figure::parse(&result.figure).unwrap();
        let realized = realize::realize(&symbol).unwrap();
        let input_pcs: BTreeSet<u8> = input.iter().map(|p| p.pc()).collect();
        assert_eq!(realized.pitch_classes(), input_pcs);
    }

    #[test]
    fn unclassifiable_collection_is_none() {
        // a chromatic cluster matches nothing in the table
        let result = classify(&pitches(&["C3", "D-3", "D3"]), &root("C"));
        assert_eq!(result, None);
    }

    #[test]
    fn empty_collection_is_none() {
        assert_eq!(classify(&[], &root("C")), None);
    }

    #[test]
    fn classify_collection_finds_root_first() {
        let result = classify_collection(&pitches(&["E3", "G3", "B-3", "C4"]))
            .unwrap()
            .unwrap();
        assert_eq!(result.figure, "C7/E");
    }

    #[test]
    fn classify_collection_empty_errors() {
        assert!(matches!(
            classify_collection(&[]),
            Err(ClassifyError::Root(RootError::NoPitches))
        ));
    }

    #[test]
    fn pass_a_prefers_table_order() {
        // an augmented triad must not be shadowed by anything earlier
        let result = classify(&pitches(&["C3", "E3", "G#3"]), &root("C")).unwrap();
        assert_eq!(result.kind, "augmented");
        assert_eq!(result.figure, "C+");
    }
}
