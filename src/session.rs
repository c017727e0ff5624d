//! Editing session.
//!
//! Holds the raw text being edited together with its current parse. The text stays
//! the source of truth: an edit is applied to the current document and the result is
//! serialized back into the text. The edited document is kept as-is, so note ids
//! survive the edit and a UI's selection remains valid.
//!
//! The session owns its [`SequentialIds`] for its whole lifetime. Re-parsing after
//! `set_text` draws from the same source, so an id is never handed out twice.

use crate::ast::{Document, NoteKind, Tempo};
use crate::duration::Duration;
use crate::edit;
use crate::error::ScoreError;
use crate::ids::{NoteId, SequentialIds};
use crate::layout::{compute_layout_with, LayoutConfig, StaffGeometry};
use crate::parser::{parse_with_ids, Diagnostic, ParseOptions, ParseOutput};
use crate::playback::{build_schedule, PlaybackEvent};
use crate::serializer::serialize;
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct Session {
    text: String,
    title: String,
    tempo: Tempo,
    ids: SequentialIds,
    output: ParseOutput,
    layout: LayoutConfig,
    dirty: bool,
}

impl Session {
    pub fn new(text: impl Into<String>, options: &ParseOptions) -> Self {
        let text = text.into();
        let title = options
            .title
            .clone()
            .unwrap_or_else(|| crate::ast::DEFAULT_TITLE.to_string());
        let tempo = options.tempo.unwrap_or_default();
        let mut ids = SequentialIds::new();
        let output = parse_with_ids(&text, &ParseOptions::new(title.clone(), tempo), &mut ids);
        Self {
            text,
            title,
            tempo,
            ids,
            output,
            layout: LayoutConfig::default(),
            dirty: false,
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn document(&self) -> Option<&Document> {
        self.output.document.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.output.diagnostics
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.output.warnings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Replace the text and re-parse it.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.reparse();
        self.dirty = true;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if let Some(doc) = self.output.document.as_mut() {
            doc.title = self.title.clone();
        }
        self.dirty = true;
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ScoreError> {
        self.tempo = Tempo::new(bpm)?;
        if let Some(doc) = self.output.document.as_mut() {
            doc.tempo = self.tempo;
        }
        self.dirty = true;
        Ok(())
    }

    /// Apply an edit to the current document and write it back to the text.
    /// Does nothing when the text currently yields no document.
    ///
    /// The new text is the serialized document, so any input that produced a
    /// diagnostic (invalid pairs, a dangling token, a malformed prefix) is gone
    /// from the text afterwards and the diagnostics are cleared.
    pub fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(&Document, &mut SequentialIds) -> Document,
    {
        let Some(doc) = self.output.document.as_ref() else {
            return;
        };
        let edited = f(doc, &mut self.ids);
        if &edited == doc {
            return;
        }
        if self.output.has_errors() {
            warn!(
                "edit drops {} invalid entries from the text",
                self.output.diagnostics.len()
            );
        }
        self.text = serialize(&edited);
        debug!("edit applied, text is now {} bytes", self.text.len());
        // The serialized text is canonical, so only capacity warnings can remain.
        self.output = ParseOutput {
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            measure_lines: (1..=edited.measures.len()).collect(),
            document: Some(edited),
        };
        self.refresh_capacity_warnings();
        self.dirty = true;
    }

    /// Append a new note (fresh id) to the last measure. Returns its id, or `None`
    /// when there is no measure to append to.
    pub fn append_note(&mut self, kind: NoteKind, duration: Duration) -> Option<NoteId> {
        if self.document().map_or(true, Document::is_empty) {
            return None;
        }
        let mut appended = None;
        self.apply(|doc, ids| {
            let note = edit::new_note(ids, kind, duration);
            appended = Some(note.id);
            edit::append_note_to_last_measure(doc, note)
        });
        appended
    }

    pub fn delete_note(&mut self, id: NoteId) {
        self.apply(|doc, _| edit::delete_note_by_id(doc, id));
    }

    pub fn nudge_pitch(&mut self, id: NoteId, steps: i32) {
        self.apply(|doc, _| edit::update_pitch_by_id(doc, id, steps));
    }

    pub fn set_duration(&mut self, id: NoteId, duration: Duration) {
        self.apply(|doc, _| edit::update_duration_by_id(doc, id, duration));
    }

    /// The playback schedule. A session with no document, or a document with no
    /// measures, is a hard stop.
    pub fn schedule(&self) -> Result<Vec<PlaybackEvent>, ScoreError> {
        match self.document() {
            Some(doc) if !doc.is_empty() => build_schedule(doc, self.tempo.bpm()),
            _ => Err(ScoreError::EmptyDocument),
        }
    }

    /// Geometry for the current document; an unparseable text lays out as empty.
    pub fn layout(&self, container_width: f64) -> StaffGeometry {
        let measures = self.document().map(|d| d.measures.as_slice()).unwrap_or(&[]);
        compute_layout_with(&self.layout, container_width, measures)
    }

    fn reparse(&mut self) {
        let options = ParseOptions::new(self.title.clone(), self.tempo);
        self.output = parse_with_ids(&self.text, &options, &mut self.ids);
    }

    /// Recompute over/underfull warnings for the serialized text without minting
    /// new ids for the document being kept.
    fn refresh_capacity_warnings(&mut self) {
        let mut scratch = SequentialIds::starting_after(self.ids.high_water_mark());
        let options = ParseOptions::new(self.title.clone(), self.tempo);
        let reparsed = parse_with_ids(&self.text, &options, &mut scratch);
        self.output.warnings = reparsed.warnings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DiagnosticKind;
    use crate::pitch::parse_pitch;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> Session {
        Session::new(text, &ParseOptions::default())
    }

    fn c4() -> NoteKind {
        NoteKind::Pitched(parse_pitch("C4").unwrap())
    }

    #[test]
    fn test_new_session_is_clean() {
        let s = session("C4 q D4 q E4 h");
        assert!(!s.is_dirty());
        assert_eq!(s.document().unwrap().note_count(), 3);
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_edit_rewrites_text_and_keeps_ids() {
        let mut s = session("C4 q D4 q E4 h");
        let first = s.document().unwrap().measures[0].notes[0].id;
        let second = s.document().unwrap().measures[0].notes[1].id;

        s.nudge_pitch(first, 1);
        assert_eq!(s.text(), "D4 q D4 q E4 h");
        assert!(s.is_dirty());
        assert_eq!(s.document().unwrap().measures[0].notes[1].id, second);
    }

    #[test]
    fn test_append_mints_unused_ids() {
        let mut s = session("C4 q D4 q");
        let existing: Vec<NoteId> = s.document().unwrap().notes().map(|n| n.id).collect();
        let new_id = s.append_note(c4(), Duration::Half).unwrap();
        assert!(!existing.contains(&new_id));
        assert_eq!(s.text(), "C4 q D4 q C4 h");
        assert!(s.diagnostics().is_empty());

        s.delete_note(new_id);
        let again = s.append_note(c4(), Duration::Half).unwrap();
        assert_ne!(again, new_id);
    }

    #[test]
    fn test_append_without_measures() {
        let mut s = session("");
        assert_eq!(s.append_note(c4(), Duration::Quarter), None);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_delete_last_note_removes_measure() {
        let mut s = session("C4 w\nD4 w");
        let id = s.document().unwrap().measures[0].notes[0].id;
        s.delete_note(id);
        assert_eq!(s.text(), "D4 w");
        assert_eq!(s.document().unwrap().measures.len(), 1);
    }

    #[test]
    fn test_duration_change_refreshes_warnings() {
        let mut s = session("C4 q D4 q E4 h");
        let id = s.document().unwrap().measures[0].notes[2].id;
        s.set_duration(id, Duration::Whole);
        assert_eq!(s.text(), "C4 q D4 q E4 w");
        assert!(s.diagnostics().is_empty());
        assert_eq!(s.warnings().len(), 1);
        assert_eq!(s.warnings()[0].kind, DiagnosticKind::Overfull);
    }

    #[test]
    fn test_noop_edit_stays_clean() {
        let mut s = session("C4 w");
        s.delete_note(NoteId(999));
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_set_text_reparses() {
        let mut s = session("C4 w");
        let old_id = s.document().unwrap().measures[0].notes[0].id;
        s.set_text("C4 w\nZZZ q");
        assert!(s.is_dirty());
        assert_eq!(s.diagnostics().len(), 1);
        assert_ne!(s.document().unwrap().measures[0].notes[0].id, old_id);
        s.mark_clean();
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_edit_drops_invalid_input_from_text() {
        let mut s = session("C4 q Z9 q\nD4 w");
        assert_eq!(s.diagnostics().len(), 1);
        let id = s.document().unwrap().measures[1].notes[0].id;
        s.nudge_pitch(id, 1);
        assert_eq!(s.text(), "C4 q\nE4 w");
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_schedule_hard_stops() {
        assert_eq!(session("").schedule(), Err(ScoreError::EmptyDocument));
        assert_eq!(session("ZZZ 99").schedule(), Err(ScoreError::EmptyDocument));

        let mut s = session("C4 q D4 q E4 h");
        assert!(s.set_tempo(0.0).is_err());
        assert_eq!(s.tempo().bpm(), 120.0);
        s.set_tempo(60.0).unwrap();
        let events = s.schedule().unwrap();
        assert_eq!(events[2].time_seconds, 2.0);
        assert_eq!(s.document().unwrap().tempo.bpm(), 60.0);
    }

    #[test]
    fn test_layout_for_unparseable_text() {
        let s = session("ZZZ 99");
        assert_eq!(s.layout(500.0).measure_widths.len(), 1);
    }

    #[test]
    fn test_set_title() {
        let mut s = session("C4 w");
        s.set_title("Etude");
        assert_eq!(s.title(), "Etude");
        assert_eq!(s.document().unwrap().title, "Etude");
    }
}
