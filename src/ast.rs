//! # Document Model
//!
//! This module defines the in-memory document the parser produces and every other
//! stage consumes.
//!
//! ## Type Hierarchy
//! ```text
//! Document
//!   ├── id, title
//!   ├── tempo: Tempo (positive BPM)
//!   └── Vec<Measure>
//!         ├── id
//!         ├── time_signature: TimeSignature (num/den, default 4/4)
//!         └── Vec<Note>
//!               ├── id: NoteId (unique in the document, never reused)
//!               ├── kind: NoteKind (Pitched(Pitch) | Rest)
//!               └── duration: Duration (w, h, q, e, s)
//! ```
//!
//! ## Key Concepts
//!
//! ### Text is the source of truth
//! A `Document` is always derived: it is built by the parser from text, or produced
//! by an edit operation from another `Document`. Nothing mutates a document in place.
//!
//! ### Rests
//! A rest has no pitch at all. It still occupies time on the timeline and still has a
//! note id, so a renderer can tag it and a transport can report its position.
//!
//! ### Measure fullness
//! The notes of a measure *should* fill its time signature, but over- and underfull
//! measures are legal. The parser reports them as warnings; edits never re-check.
//!
//! ## Related Modules
//! - `parser` - Creates these types from text
//! - `serializer` - Writes them back to text
//! - `edit` - Pure transforms over `Document`
//! - `layout`, `playback` - Derived geometry and schedules

use crate::duration::Duration;
use crate::error::ScoreError;
use crate::ids::{DocumentId, MeasureId, NoteId};
use serde::{Serialize, Serializer};
use std::fmt;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Note letters in diatonic order, starting from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum NoteName {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    /// Position in the C-based diatonic cycle (C = 0 .. B = 6).
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> NoteName {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    /// Case-insensitive letter lookup.
    pub fn from_char(c: char) -> Option<NoteName> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            NoteName::C => 'C',
            NoteName::D => 'D',
            NoteName::E => 'E',
            NoteName::F => 'F',
            NoteName::G => 'G',
            NoteName::A => 'A',
            NoteName::B => 'B',
        }
    }

    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

/// A literal accidental. Enharmonics are kept as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    #[default]
    None,
    Sharp, // #
    Flat,  // b
}

impl Accidental {
    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::None => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }

    pub fn semitone_offset(self) -> i32 {
        match self {
            Accidental::None => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A pitch such as `C4`, `F#3` or `Bb5`.
///
/// Serializes as its token string so collaborators receive `"F#3"`, not a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: NoteName,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Pitch {
    pub fn new(letter: NoteName, accidental: Accidental, octave: i32) -> Self {
        Self {
            letter,
            accidental,
            octave,
        }
    }

    pub fn natural(letter: NoteName, octave: i32) -> Self {
        Self::new(letter, Accidental::None, octave)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.letter.as_char(),
            self.accidental.symbol(),
            self.octave
        )
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What a note sounds: a pitch, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "pitch", rename_all = "lowercase")]
pub enum NoteKind {
    Pitched(Pitch),
    Rest,
}

impl NoteKind {
    pub fn pitch(&self) -> Option<Pitch> {
        match self {
            NoteKind::Pitched(p) => Some(*p),
            NoteKind::Rest => None,
        }
    }

    /// The text-format symbol: the pitch token, or `R`.
    pub fn token(&self) -> String {
        match self {
            NoteKind::Pitched(p) => p.to_string(),
            NoteKind::Rest => "R".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub kind: NoteKind,
    pub duration: Duration,
}

impl Note {
    pub fn new(id: NoteId, kind: NoteKind, duration: Duration) -> Self {
        Self { id, kind, duration }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.kind, NoteKind::Rest)
    }

    pub fn pitch(&self) -> Option<Pitch> {
        self.kind.pitch()
    }

    pub fn beats(&self) -> f64 {
        self.duration.beats()
    }
}

/// Time signature (e.g., 4/4, 3/4, 6/8). Both parts are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl TimeSignature {
    /// `None` unless both parts are positive.
    pub fn new(beats: u32, beat_type: u32) -> Option<Self> {
        if beats == 0 || beat_type == 0 {
            return None;
        }
        Some(Self { beats, beat_type })
    }

    pub fn is_common_time(&self) -> bool {
        *self == Self::default()
    }

    /// How many quarter-note beats fill one measure.
    /// e.g., 4/4 = 4.0, 3/4 = 3.0, 6/8 = 3.0, 2/2 = 4.0
    pub fn capacity_quarters(&self) -> f64 {
        self.beats as f64 * 4.0 / self.beat_type as f64
    }

    /// Convert quarter-note beats to beats of this signature's denominator.
    pub fn quarters_to_own_beats(&self, quarters: f64) -> f64 {
        quarters * self.beat_type as f64 / 4.0
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

/// Tempo in quarter-note beats per minute. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Tempo(f64);

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self, ScoreError> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Self(bpm))
        } else {
            Err(ScoreError::InvalidTempo(bpm))
        }
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    pub fn seconds_per_beat(self) -> f64 {
        60.0 / self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_TEMPO_BPM)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub id: MeasureId,
    pub time_signature: TimeSignature,
    pub notes: Vec<Note>,
}

impl Measure {
    /// Total length of the notes in quarter-note beats.
    pub fn total_quarters(&self) -> f64 {
        self.notes.iter().map(Note::beats).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub tempo: Tempo,
    pub measures: Vec<Measure>,
}

impl Document {
    pub fn empty(id: DocumentId, title: impl Into<String>, tempo: Tempo) -> Self {
        Self {
            id,
            title: title.into(),
            tempo,
            measures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.measures.iter().map(|m| m.notes.len()).sum()
    }

    /// All notes in performance order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.measures.iter().flat_map(|m| m.notes.iter())
    }

    /// Structural equality ignoring every id: same measures, signatures, and
    /// `(pitch-or-rest, duration)` sequences. Title and tempo are not compared.
    pub fn content_eq(&self, other: &Document) -> bool {
        self.measures.len() == other.measures.len()
            && self
                .measures
                .iter()
                .zip(&other.measures)
                .all(|(a, b)| {
                    a.time_signature == b.time_signature
                        && a.notes.len() == b.notes.len()
                        && a.notes
                            .iter()
                            .zip(&b.notes)
                            .all(|(x, y)| x.kind == y.kind && x.duration == y.duration)
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: u64, kind: NoteKind, duration: Duration) -> Note {
        Note::new(NoteId(id), kind, duration)
    }

    #[test]
    fn test_time_signature_capacity() {
        assert_eq!(TimeSignature::default().capacity_quarters(), 4.0);
        assert_eq!(TimeSignature::new(3, 4).unwrap().capacity_quarters(), 3.0);
        assert_eq!(TimeSignature::new(6, 8).unwrap().capacity_quarters(), 3.0);
        assert_eq!(TimeSignature::new(2, 2).unwrap().capacity_quarters(), 4.0);
        assert!(TimeSignature::new(0, 4).is_none());
        assert!(TimeSignature::new(4, 0).is_none());
    }

    #[test]
    fn test_tempo_rejects_non_positive() {
        assert!(Tempo::new(120.0).is_ok());
        assert_eq!(Tempo::new(0.0), Err(ScoreError::InvalidTempo(0.0)));
        assert!(Tempo::new(-5.0).is_err());
        assert!(Tempo::new(f64::NAN).is_err());
        assert!(Tempo::new(f64::INFINITY).is_err());
        assert_eq!(Tempo::new(120.0).unwrap().seconds_per_beat(), 0.5);
    }

    #[test]
    fn test_pitch_display() {
        let p = Pitch::new(NoteName::F, Accidental::Sharp, 3);
        assert_eq!(p.to_string(), "F#3");
        assert_eq!(Pitch::natural(NoteName::B, 5).to_string(), "B5");
    }

    #[test]
    fn test_rest_has_no_pitch() {
        let rest = note(1, NoteKind::Rest, Duration::Quarter);
        assert!(rest.is_rest());
        assert_eq!(rest.pitch(), None);
        assert_eq!(rest.kind.token(), "R");
    }

    #[test]
    fn test_content_eq_ignores_ids() {
        let c4 = NoteKind::Pitched(Pitch::natural(NoteName::C, 4));
        let a = Document {
            id: DocumentId(1),
            title: "a".into(),
            tempo: Tempo::default(),
            measures: vec![Measure {
                id: MeasureId(1),
                time_signature: TimeSignature::default(),
                notes: vec![note(1, c4, Duration::Quarter)],
            }],
        };
        let mut b = a.clone();
        b.id = DocumentId(9);
        b.measures[0].id = MeasureId(9);
        b.measures[0].notes[0].id = NoteId(9);
        assert!(a.content_eq(&b));

        b.measures[0].notes[0].duration = Duration::Half;
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let n = note(2, NoteKind::Pitched(Pitch::natural(NoteName::E, 4)), Duration::Half);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["id"], "note-2");
        assert_eq!(json["kind"]["type"], "pitched");
        assert_eq!(json["kind"]["pitch"], "E4");
        assert_eq!(json["duration"], "h");
    }
}
