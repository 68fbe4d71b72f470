//! Chord-collection analysis: the root-finding heuristic and shape
//! predicates the classifier leans on.

use std::collections::BTreeSet;
use std::fmt;

use crate::pitch::Pitch;

/// Failure of the root-finding heuristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootError {
    NoPitches,
}

impl fmt::Display for RootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootError::NoPitches => write!(f, "cannot find a root in an empty pitch collection"),
        }
    }
}

impl std::error::Error for RootError {}

/// Find the most plausible root of an arbitrary pitch collection: the
/// candidate with the most tertian degrees (3rd, 5th, 7th) above it.
/// Ties go to the lowest candidate.
pub fn find_root(pitches: &[Pitch]) -> Result<Pitch, RootError> {
    if pitches.is_empty() {
        return Err(RootError::NoPitches);
    }

    let mut candidates: Vec<&Pitch> = pitches.iter().collect();
    candidates.sort_by_key(|p| p.diatonic_key());
    candidates.dedup_by(|a, b| a.same_name(b));

    let mut best = candidates[0];
    let mut best_score = tertian_score(best, pitches);
    for &cand in candidates.iter().skip(1) {
        let score = tertian_score(cand, pitches);
        if score > best_score {
            best = cand;
            best_score = score;
        }
    }
    Ok(*best)
}

fn tertian_score(candidate: &Pitch, pitches: &[Pitch]) -> usize {
    let degrees: BTreeSet<u8> = pitches.iter().map(|p| p.degree_above(candidate)).collect();
    [3u8, 5, 7].iter().filter(|d| degrees.contains(d)).count()
}

/// True when the collection is triad-shaped around `root`: three distinct
/// spelled tones occupying exactly degrees 1, 3, 5.
pub fn is_triad_shaped(pitches: &[Pitch], root: &Pitch) -> bool {
    shape_matches(pitches, root, 3, &[1, 3, 5])
}

/// True when the collection is seventh-shaped around `root`: four distinct
/// spelled tones occupying exactly degrees 1, 3, 5, 7.
pub fn is_seventh_shaped(pitches: &[Pitch], root: &Pitch) -> bool {
    shape_matches(pitches, root, 4, &[1, 3, 5, 7])
}

fn shape_matches(pitches: &[Pitch], root: &Pitch, unique: usize, degrees: &[u8]) -> bool {
    let names: BTreeSet<String> = pitches.iter().map(|p| p.name()).collect();
    if names.len() != unique {
        return false;
    }
    let found: BTreeSet<u8> = pitches.iter().map(|p| p.degree_above(root)).collect();
    found == degrees.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(names: &[&str]) -> Vec<Pitch> {
        names.iter().map(|n| Pitch::parse(n).unwrap()).collect()
    }

    #[test]
    fn root_of_major_triad() {
        let root = find_root(&pitches(&["C3", "E3", "G3"])).unwrap();
        assert_eq!(root.name(), "C");
    }

    #[test]
    fn root_of_inverted_seventh() {
        let root = find_root(&pitches(&["E3", "G3", "B-3", "C4"])).unwrap();
        assert_eq!(root.name(), "C");
    }

    #[test]
    fn root_of_wide_voicing() {
        let root = find_root(&pitches(&["D3", "F3", "A4", "B-5"])).unwrap();
        assert_eq!(root.name(), "B-");
    }

    #[test]
    fn root_tie_prefers_lowest() {
        // a suspended shape scores no candidate higher than the rest
        let root = find_root(&pitches(&["C3", "F3", "G3"])).unwrap();
        assert_eq!(root.name(), "C");
    }

    #[test]
    fn root_of_single_pitch() {
        let root = find_root(&pitches(&["G2"])).unwrap();
        assert_eq!(root.name(), "G");
    }

    #[test]
    fn empty_collection_errors() {
        assert_eq!(find_root(&[]), Err(RootError::NoPitches));
    }

    #[test]
    fn triad_shape() {
        let root = Pitch::parse("C").unwrap();
        assert!(is_triad_shaped(&pitches(&["C3", "E3", "G3"]), &root));
        assert!(is_triad_shaped(&pitches(&["E3", "G3", "C4"]), &root));
        assert!(!is_triad_shaped(&pitches(&["C3", "D3", "G3"]), &root));
        assert!(!is_triad_shaped(&pitches(&["C3", "E3", "G3", "B3"]), &root));
    }

    #[test]
    fn seventh_shape() {
        let root = Pitch::parse("C").unwrap();
        assert!(is_seventh_shaped(
            &pitches(&["C3", "E3", "G3", "B-3"]),
            &root
        ));
        assert!(!is_seventh_shaped(&pitches(&["C3", "E3", "G3"]), &root));
        assert!(!is_seventh_shaped(
            &pitches(&["C3", "F3", "G3", "B-3"]),
            &root
        ));
    }

    #[test]
    fn doubled_tones_still_shape() {
        let root = Pitch::parse("C").unwrap();
        assert!(is_triad_shaped(
            &pitches(&["C3", "E3", "G3", "C4", "E4"]),
            &root
        ));
    }
}
