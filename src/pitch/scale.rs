//! Diatonic major reference scale.
//!
//! The realizer builds every chord against the major scale of its root: the
//! scale is a neutral reference frame, chord quality comes entirely from the
//! formula's alterations. Scales are cached process-wide per spelled tonic;
//! population is idempotent, so a race between two callers is harmless.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use super::{Pitch, Step};

/// Semitone offsets of the seven major-scale degrees.
const MAJOR_INTERVALS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// A major scale rooted on a spelled tonic, with degree-indexed lookup.
#[derive(Debug, Clone)]
pub struct MajorScale {
    tonic_step: Step,
    /// Spelled degree tones 1..=7 (letter step + accidental).
    degrees: [(Step, i8); 7],
}

impl MajorScale {
    fn build(tonic_step: Step, tonic_alter: i8) -> MajorScale {
        let tonic_pc = Pitch::new(tonic_step, tonic_alter, 0).pc() as i32;
        let mut degrees = [(Step::C, 0i8); 7];
        for (i, interval) in MAJOR_INTERVALS.iter().enumerate() {
            let step = tonic_step.nth_above(i as u8);
            let target_pc = (tonic_pc + *interval as i32).rem_euclid(12);
            let mut diff = target_pc - step.natural_pc() as i32;
            if diff > 6 {
                diff -= 12;
            } else if diff < -6 {
                diff += 12;
            }
            degrees[i] = (step, diff as i8);
        }
        MajorScale {
            tonic_step,
            degrees,
        }
    }

    /// The scale tone at `degree` (1-based, unbounded above), placed
    /// relative to the tonic at `ref_octave`. Degrees past 7 wrap upward:
    /// degree 9 sits a ninth above the tonic.
    pub fn pitch_at(&self, degree: u8, ref_octave: i32) -> Pitch {
        debug_assert!(degree >= 1);
        let idx = ((degree - 1) % 7) as usize;
        let octaves_up = ((degree - 1) / 7) as i32;
        let (step, alter) = self.degrees[idx];
        let wrap = if step.index() < self.tonic_step.index() {
            1
        } else {
            0
        };
        Pitch::new(step, alter, ref_octave + octaves_up + wrap)
    }

    /// Like [`pitch_at`](Self::pitch_at) but folded to the simple degree
    /// 1–7 first, so degree 9 lands on the same pitch as degree 2.
    pub fn pitch_at_simple(&self, degree: u8, ref_octave: i32) -> Pitch {
        self.pitch_at(((degree - 1) % 7) + 1, ref_octave)
    }

    /// Pitch class of the scale tone at a (possibly compound) degree.
    pub fn pc_at(&self, degree: u8) -> u8 {
        self.pitch_at_simple(degree, 0).pc()
    }
}

type ScaleKey = (Step, i8);

static SCALE_CACHE: OnceLock<RwLock<HashMap<ScaleKey, Arc<MajorScale>>>> = OnceLock::new();

/// The major scale on the given tonic spelling, from the shared cache.
pub fn major_scale(tonic: &Pitch) -> Arc<MajorScale> {
    let cache = SCALE_CACHE.get_or_init(|| RwLock::new(HashMap::new()));
    let key: ScaleKey = (tonic.step, tonic.alter);

    if let Some(scale) = cache
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&key)
    {
        return Arc::clone(scale);
    }

    let built = Arc::new(MajorScale::build(tonic.step, tonic.alter));
    let mut map = cache.write().unwrap_or_else(|e| e.into_inner());
    Arc::clone(map.entry(key).or_insert(built))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_of(name: &str) -> Arc<MajorScale> {
        major_scale(&Pitch::parse(name).unwrap())
    }

    #[test]
    fn c_major_degrees() {
        let sc = scale_of("C");
        let names: Vec<String> = (1..=7).map(|d| sc.pitch_at(d, 3).name()).collect();
        assert_eq!(names, ["C", "D", "E", "F", "G", "A", "B"]);
    }

    #[test]
    fn e_flat_major_spelling() {
        let sc = scale_of("E-");
        let names: Vec<String> = (1..=7).map(|d| sc.pitch_at(d, 3).name()).collect();
        assert_eq!(names, ["E-", "F", "G", "A-", "B-", "C", "D"]);
    }

    #[test]
    fn f_sharp_major_spelling() {
        let sc = scale_of("F#");
        let names: Vec<String> = (1..=7).map(|d| sc.pitch_at(d, 3).name()).collect();
        assert_eq!(names, ["F#", "G#", "A#", "B", "C#", "D#", "E#"]);
    }

    #[test]
    fn octave_wraps_at_letter_c() {
        let sc = scale_of("G");
        // G3 A3 B3 C4 D4 E4 F#4
        assert_eq!(sc.pitch_at(1, 3).octave, 3);
        assert_eq!(sc.pitch_at(3, 3).octave, 3);
        assert_eq!(sc.pitch_at(4, 3).octave, 4);
        assert_eq!(sc.pitch_at(7, 3).octave, 4);
    }

    #[test]
    fn compound_degrees_climb() {
        let sc = scale_of("C");
        let ninth = sc.pitch_at(9, 3);
        assert_eq!(ninth.name(), "D");
        assert_eq!(ninth.octave, 4);
        let thirteenth = sc.pitch_at(13, 3);
        assert_eq!(thirteenth.name(), "A");
        assert_eq!(thirteenth.octave, 4);
    }

    #[test]
    fn simple_degree_folds() {
        let sc = scale_of("C");
        assert_eq!(sc.pitch_at_simple(9, 3), sc.pitch_at(2, 3));
        assert_eq!(sc.pc_at(11), sc.pc_at(4));
    }

    #[test]
    fn cache_returns_same_scale() {
        let a = scale_of("D-");
        let b = scale_of("D-");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
