//! Playback data type definitions

use crate::ast::Pitch;
use crate::ids::NoteId;
use serde::Serialize;

/// One note or rest on the playback timeline.
///
/// # Fields
/// - `time_seconds`: offset from the start of the document
/// - `duration_seconds`: how long the note (or silence) lasts
/// - `pitch`: `None` for rests
/// - `note_id`: id of the source note, for highlighting
/// - `is_rest`: true exactly when `pitch` is `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    pub time_seconds: f64,
    pub duration_seconds: f64,
    pub pitch: Option<Pitch>,
    pub note_id: NoteId,
    pub is_rest: bool,
}

impl PlaybackEvent {
    pub fn end_seconds(&self) -> f64 {
        self.time_seconds + self.duration_seconds
    }

    /// MIDI number for synthesizers; `None` for rests.
    pub fn midi_note(&self) -> Option<u8> {
        self.pitch.map(|p| p.midi_number())
    }
}
