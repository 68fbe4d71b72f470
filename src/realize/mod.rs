//! Pitch realization — [`ChordSymbol`] to a voiced, octave-placed chord.
//!
//! The chord is built against the major scale of its root (a neutral
//! reference frame; quality comes from the formula's alterations), widened
//! for extension families, rotated or given an added bass, run through the
//! step-modification pipeline, and normalized into the playable band.

use std::collections::BTreeSet;

use log::trace;

use crate::figure::{ChordStepModification, ChordSymbol, ModType};
use crate::kind::{Family, KindTable};
use crate::pitch::{major_scale, MajorScale, Pitch};

/// Reference octave the root is first placed in.
const ROOT_OCTAVE: i32 = 3;
/// Octave an appended (non-chord-tone) bass is placed in.
const ADDED_BASS_OCTAVE: i32 = 2;
/// Diatonic height ceiling: anything above E4 pulls the chord down.
const CEILING: i32 = 30;
/// Diatonic height floor: anything below A1 pushes the chord up.
const FLOOR: i32 = 13;

/// One realized tone: a concrete pitch tagged with the scale degree it
/// occupies. An appended bass carries no degree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordTone {
    pub pitch: Pitch,
    pub degree: Option<u8>,
}

/// An ordered, octave-placed chord. Built fresh by every [`realize`] call
/// and never mutated afterwards; tones ascend diatonically.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedChord {
    tones: Vec<ChordTone>,
}

impl RealizedChord {
    pub fn tones(&self) -> &[ChordTone] {
        &self.tones
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    /// The lowest tone.
    pub fn bass(&self) -> Option<&Pitch> {
        self.tones.first().map(|t| &t.pitch)
    }

    pub fn pitches(&self) -> impl Iterator<Item = &Pitch> {
        self.tones.iter().map(|t| &t.pitch)
    }

    /// Spelled names low to high, e.g. `["E3", "G3", "B-3", "C4"]`.
    pub fn pitch_names(&self) -> Vec<String> {
        self.tones.iter().map(|t| t.pitch.to_string()).collect()
    }

    /// The set of pitch classes present.
    pub fn pitch_classes(&self) -> BTreeSet<u8> {
        self.tones.iter().map(|t| t.pitch.pc()).collect()
    }
}

/// Errors from realization. Unlike parse errors these are hard: an
/// alter/subtract against an absent degree means the chord specification
/// is internally inconsistent.
#[derive(Debug, Clone, PartialEq)]
pub enum RealizeError {
    MissingDegree { mod_type: ModType, degree: u8 },
}

impl std::fmt::Display for RealizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RealizeError::MissingDegree { mod_type, degree } => write!(
                f,
                "{} references degree {} which is not in the chord",
                mod_type.keyword(),
                degree
            ),
        }
    }
}

impl std::error::Error for RealizeError {}

/// Realize against the process-wide kind table.
pub fn realize(symbol: &ChordSymbol) -> Result<RealizedChord, RealizeError> {
    realize_in(symbol, KindTable::global())
}

/// Realize against an explicit kind table.
pub fn realize_in(symbol: &ChordSymbol, table: &KindTable) -> Result<RealizedChord, RealizeError> {
    let scale = major_scale(&symbol.root);
    let kind = symbol
        .kind
        .as_deref()
        .and_then(|name| table.resolve(name));
    let formula = kind
        .as_deref()
        .and_then(|k| table.formula(k))
        .unwrap_or_default();
    let family = kind
        .as_deref()
        .and_then(|k| table.family(k))
        .unwrap_or(Family::Triad);

    // Base mapping: root plus formula tones, ascending from octave 3.
    let root = Pitch::new(symbol.root.step, symbol.root.alter, ROOT_OCTAVE);
    let mut tones = vec![ChordTone {
        pitch: root,
        degree: Some(1),
    }];
    for step in &formula {
        let mut pitch = scale.pitch_at(step.degree, ROOT_OCTAVE);
        pitch.alter += step.alter;
        tones.push(ChordTone {
            pitch,
            degree: Some(step.degree),
        });
    }

    // Ordinal position of the bass among the chord tones, before any
    // re-voicing. This is the inversion number the bass implies.
    let implied_inversion = symbol
        .bass
        .as_ref()
        .filter(|b| !b.same_name(&symbol.root))
        .and_then(|b| tones.iter().position(|t| t.pitch.same_name(b)));

    widen_extensions(&mut tones, family);

    if let Some(bass) = symbol.bass.as_ref().filter(|b| !b.same_name(&symbol.root)) {
        let inversion = symbol
            .inversion
            .or(implied_inversion.map(|i| i as u8))
            .filter(|inv| *inv >= 1 && *inv <= family.max_inversion());
        match (inversion, implied_inversion) {
            (Some(_), Some(_)) => invert_onto_bass(&mut tones, bass, family),
            _ => {
                // Added bass: the requested tone is not a supported
                // inversion for this kind, so it goes underneath.
                tones.push(ChordTone {
                    pitch: Pitch::new(bass.step, bass.alter, ADDED_BASS_OCTAVE),
                    degree: None,
                });
            }
        }
    }

    for m in &symbol.modifications {
        tones = apply_step(tones, m, &scale)?;
    }

    normalize_range(&mut tones);
    sort_diatonic(&mut tones);
    trace!(
        "realized {:?} as {:?}",
        symbol.kind,
        tones.iter().map(|t| t.pitch.to_string()).collect::<Vec<_>>()
    );

    Ok(RealizedChord { tones })
}

/// Spacing widen pass for extension-class kinds: raising the second tone
/// (ninths), plus the fourth (elevenths), plus the sixth (thirteenths)
/// avoids the adjacent-second clashes of close-position extended chords.
fn widen_extensions(tones: &mut Vec<ChordTone>, family: Family) {
    if !family.is_extended() {
        return;
    }
    let mut raised: &[usize] = &[1];
    if family == Family::Eleventh {
        raised = &[1, 3];
    } else if family == Family::Thirteenth {
        raised = &[1, 3, 5];
    }
    for idx in raised {
        if let Some(tone) = tones.get_mut(*idx) {
            tone.pitch.octave += 1;
        }
    }
    sort_diatonic(tones);
}

/// Rotate the voicing so the bass tone is lowest: every tone ordered
/// before the bass goes up an octave (two octaves for extension families,
/// preserving the widened spacing), and anything still below the bass
/// follows.
fn invert_onto_bass(tones: &mut Vec<ChordTone>, bass: &Pitch, family: Family) {
    let Some(bass_at) = tones.iter().position(|t| t.pitch.same_name(bass)) else {
        return;
    };
    let bump = if family.is_extended() { 2 } else { 1 };
    for tone in tones.iter_mut().take(bass_at) {
        tone.pitch.octave += bump;
    }
    let bass_num = tones[bass_at].pitch.diatonic_num();
    for (i, tone) in tones.iter_mut().enumerate() {
        if i != bass_at && tone.pitch.diatonic_num() < bass_num {
            tone.pitch.octave += 1;
        }
    }
    sort_diatonic(tones);
}

fn simple_degree(degree: u8) -> u8 {
    ((degree - 1) % 7) + 1
}

/// One step modification as a pure pipeline stage: tones in, tones out.
fn apply_step(
    tones: Vec<ChordTone>,
    m: &ChordStepModification,
    scale: &MajorScale,
) -> Result<Vec<ChordTone>, RealizeError> {
    match m.mod_type {
        ModType::Add => {
            let mut pitch = scale.pitch_at_simple(m.degree, ROOT_OCTAVE);
            pitch.alter += m.alter;
            if m.degree >= 7 {
                // extensions sit above the chord body
                pitch.octave += 1;
            }
            let added = ChordTone {
                pitch,
                degree: Some(m.degree),
            };
            let occupied = tones
                .iter()
                .any(|t| t.degree.map(simple_degree) == Some(m.degree));
            let mut out: Vec<ChordTone> = if occupied {
                tones
                    .into_iter()
                    .filter(|t| t.degree.map(simple_degree) != Some(m.degree))
                    .collect()
            } else {
                tones
            };
            out.push(added);
            Ok(out)
        }
        ModType::Subtract => {
            if !tones.iter().any(|t| t.degree == Some(m.degree)) {
                return Err(RealizeError::MissingDegree {
                    mod_type: ModType::Subtract,
                    degree: m.degree,
                });
            }
            Ok(tones
                .into_iter()
                .filter(|t| t.degree != Some(m.degree))
                .collect())
        }
        ModType::Alter => {
            let mut out = tones;
            let mut found = false;
            for tone in &mut out {
                if tone.degree == Some(m.degree) {
                    tone.pitch = tone.pitch.transposed(m.alter);
                    found = true;
                }
            }
            if !found {
                return Err(RealizeError::MissingDegree {
                    mod_type: ModType::Alter,
                    degree: m.degree,
                });
            }
            Ok(out)
        }
    }
}

/// Pull the chord below the ceiling, then push it above the floor. The
/// admissible band is wider than any realized chord, so the passes settle.
fn normalize_range(tones: &mut Vec<ChordTone>) {
    if tones.is_empty() {
        return;
    }
    while tones.iter().any(|t| t.pitch.diatonic_num() > CEILING) {
        for tone in tones.iter_mut() {
            tone.pitch.octave -= 1;
        }
    }
    while tones.iter().any(|t| t.pitch.diatonic_num() < FLOOR) {
        for tone in tones.iter_mut() {
            tone.pitch.octave += 1;
        }
    }
}

fn sort_diatonic(tones: &mut [ChordTone]) {
    tones.sort_by_key(|t| t.pitch.diatonic_key());
}
