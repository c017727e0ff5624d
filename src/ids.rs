//! Identifiers and id sources.
//!
//! Ids are minted by an [`IdSource`] handed to whoever creates notes, measures or
//! documents. [`parse`](crate::parser::parse) builds a fresh [`SequentialIds`] per
//! call, so parsing the same text twice yields the same ids. A long-lived
//! [`Session`](crate::session::Session) owns one source for its whole lifetime, so an
//! id it has handed out is never handed out again, even after the note is deleted.

use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

id_type!(NoteId, "note");
id_type!(MeasureId, "measure");
id_type!(DocumentId, "doc");

/// Supplies fresh ids. Implementations must never return the same id twice.
pub trait IdSource {
    fn next_note_id(&mut self) -> NoteId;
    fn next_measure_id(&mut self) -> MeasureId;
    fn next_document_id(&mut self) -> DocumentId;
}

/// Monotonic counters, one per id kind, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    notes: u64,
    measures: u64,
    documents: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `start` for every kind. Used to mint ids that cannot
    /// collide with ones a previous source already handed out.
    pub fn starting_after(start: u64) -> Self {
        Self {
            notes: start,
            measures: start,
            documents: start,
        }
    }

    /// Highest value handed out so far across all kinds.
    pub fn high_water_mark(&self) -> u64 {
        self.notes.max(self.measures).max(self.documents)
    }
}

impl IdSource for SequentialIds {
    fn next_note_id(&mut self) -> NoteId {
        self.notes += 1;
        NoteId(self.notes)
    }

    fn next_measure_id(&mut self) -> MeasureId {
        self.measures += 1;
        MeasureId(self.measures)
    }

    fn next_document_id(&mut self) -> DocumentId {
        self.documents += 1;
        DocumentId(self.documents)
    }
}
