//! Edit operations.
//!
//! Every function takes a document by reference and returns a new one; the input is
//! never modified. An id that matches no note makes the operation a no-op rather
//! than an error, since stale ids arrive naturally from a UI (delete after delete).
//! Edits do not re-check measure fullness; that is a parse-time concern.

use crate::ast::{Document, Measure, Note, NoteKind};
use crate::duration::Duration;
use crate::ids::{IdSource, NoteId};
use crate::pitch::step_clamped;

/// Mint a note with a fresh id from `ids`.
pub fn new_note<I: IdSource + ?Sized>(ids: &mut I, kind: NoteKind, duration: Duration) -> Note {
    Note::new(ids.next_note_id(), kind, duration)
}

pub fn find_note(doc: &Document, id: NoteId) -> Option<&Note> {
    doc.notes().find(|n| n.id == id)
}

/// Remove the note with `id`. A measure left without notes is removed as well.
pub fn delete_note_by_id(doc: &Document, id: NoteId) -> Document {
    let measures = doc
        .measures
        .iter()
        .map(|m| Measure {
            notes: m.notes.iter().filter(|n| n.id != id).cloned().collect(),
            ..m.clone()
        })
        .filter(|m| !m.notes.is_empty())
        .collect();

    Document {
        measures,
        ..doc.clone()
    }
}

/// Append `note` to the last measure. A document with no measures is returned
/// unchanged; the first measure has to come from text.
pub fn append_note_to_last_measure(doc: &Document, note: Note) -> Document {
    let mut result = doc.clone();
    if let Some(last) = result.measures.last_mut() {
        last.notes.push(note);
    }
    result
}

/// Nudge the pitch of note `id` by `steps` diatonic degrees, clamped to C3..=C6.
/// Rests and `steps == 0` leave the note unchanged.
pub fn update_pitch_by_id(doc: &Document, id: NoteId, steps: i32) -> Document {
    if steps == 0 {
        return doc.clone();
    }
    map_note(doc, id, |note| nudged(note, steps))
}

/// Replace the duration of note `id`. Sibling notes are not adjusted.
pub fn update_duration_by_id(doc: &Document, id: NoteId, duration: Duration) -> Document {
    map_note(doc, id, |note| Note {
        duration,
        ..note.clone()
    })
}

/// Nudge every pitched note by `steps` diatonic degrees, clamped to C3..=C6.
pub fn transpose_document(doc: &Document, steps: i32) -> Document {
    if steps == 0 {
        return doc.clone();
    }
    let measures = doc
        .measures
        .iter()
        .map(|measure| Measure {
            notes: measure
                .notes
                .iter()
                .map(|note| nudged(note, steps))
                .collect(),
            ..measure.clone()
        })
        .collect();

    Document {
        measures,
        ..doc.clone()
    }
}

fn nudged(note: &Note, steps: i32) -> Note {
    match note.kind {
        NoteKind::Pitched(p) => Note {
            kind: NoteKind::Pitched(step_clamped(p, steps)),
            ..note.clone()
        },
        NoteKind::Rest => note.clone(),
    }
}

fn map_note(doc: &Document, id: NoteId, f: impl Fn(&Note) -> Note) -> Document {
    let measures = doc
        .measures
        .iter()
        .map(|m| Measure {
            notes: m
                .notes
                .iter()
                .map(|n| if n.id == id { f(n) } else { n.clone() })
                .collect(),
            ..m.clone()
        })
        .collect();

    Document {
        measures,
        ..doc.clone()
    }
}
