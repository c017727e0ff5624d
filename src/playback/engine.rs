//! Playback schedule generation engine
//!
//! Walks measures in order and notes within each measure in order, keeping one
//! running beat position for the whole document. Events come out sorted by
//! construction; nothing here sorts.

use super::types::PlaybackEvent;
use crate::ast::{Document, Tempo};
use crate::error::ScoreError;
use crate::ids::NoteId;
use log::{debug, warn};

/// Build the playback schedule for `doc` at `tempo` quarter-note BPM.
///
/// # Errors
/// [`ScoreError::InvalidTempo`] when `tempo` is zero, negative or not finite; a
/// schedule is never produced from an infinite or negative seconds-per-beat.
///
/// An empty document yields an empty schedule.
pub fn build_schedule(doc: &Document, tempo: f64) -> Result<Vec<PlaybackEvent>, ScoreError> {
    let tempo = Tempo::new(tempo).map_err(|e| {
        warn!("refusing to schedule at tempo {}", tempo);
        e
    })?;
    Ok(schedule_at(doc, tempo))
}

/// Build the schedule at the document's own tempo.
pub fn schedule_document(doc: &Document) -> Vec<PlaybackEvent> {
    schedule_at(doc, doc.tempo)
}

fn schedule_at(doc: &Document, tempo: Tempo) -> Vec<PlaybackEvent> {
    let seconds_per_beat = tempo.seconds_per_beat();
    let mut events = Vec::with_capacity(doc.note_count());
    let mut beat_pos = 0.0;

    for measure in &doc.measures {
        for note in &measure.notes {
            let beats = note.beats();
            events.push(PlaybackEvent {
                time_seconds: beat_pos * seconds_per_beat,
                duration_seconds: beats * seconds_per_beat,
                pitch: note.pitch(),
                note_id: note.id,
                is_rest: note.is_rest(),
            });
            beat_pos += beats;
        }
    }

    debug!(
        "scheduled {} events over {} beats at {} bpm",
        events.len(),
        beat_pos,
        tempo.bpm()
    );
    events
}

/// End time of the last event, i.e. when playback finishes.
pub fn total_duration(events: &[PlaybackEvent]) -> f64 {
    events.last().map(PlaybackEvent::end_seconds).unwrap_or(0.0)
}

/// The note positioned at `time_seconds`, rests included. `None` before the start
/// and from the end of the last event on, which is when highlighting clears.
pub fn active_note_at(events: &[PlaybackEvent], time_seconds: f64) -> Option<NoteId> {
    if time_seconds < 0.0 {
        return None;
    }
    // First event starting after `time_seconds`; the one before it is the candidate.
    let next = events.partition_point(|e| e.time_seconds <= time_seconds);
    let candidate = events.get(next.checked_sub(1)?)?;
    (time_seconds < candidate.end_seconds()).then_some(candidate.note_id)
}
