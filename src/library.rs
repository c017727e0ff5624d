//! # Composition Library
//!
//! A small key-value store of saved compositions, keyed by id. Only the raw text
//! and tempo are stored; documents are always re-parsed on load.
//!
//! ## Storage Format
//! ```json
//! { "version": 2, "items": [ { "id": "comp-…", "title": "…", "updatedAt": "…",
//!                              "rawInput": "C4 w", "tempo": 120 } ] }
//! ```
//! Files written before the `version` field existed (`{ "items": [...] }`) are read
//! as version 1 and rewritten as the current version on the next save. A file that
//! cannot be decoded at all, or that a newer build wrote, lists as an empty library
//! but is never overwritten: saving, deleting or importing into it fails with
//! [`ScoreError::Storage`].
//!
//! ## Stores
//! - [`MemoryStore`] - in-process, for tests and embedding
//! - [`FileStore`] - a single JSON file on disk

use crate::ast::{Tempo, DEFAULT_TITLE};
use crate::error::ScoreError;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const LIBRARY_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredComposition {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub raw_input: String,
    pub tempo: f64,
}

/// What the caller supplies to [`CompositionStore::save`]. Without an id a new
/// record is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveRequest {
    pub id: Option<String>,
    pub title: String,
    pub raw_input: String,
    pub tempo: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(default = "legacy_version")]
    version: u32,
    items: Vec<StoredComposition>,
}

fn legacy_version() -> u32 {
    1
}

pub fn new_composition_id() -> String {
    format!("comp-{}", uuid::Uuid::new_v4())
}

/// Decode a library envelope of any known version.
fn decode(json: &str) -> Result<Vec<StoredComposition>, ScoreError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version > LIBRARY_VERSION {
        return Err(ScoreError::Storage(format!(
            "unsupported library version {}",
            envelope.version
        )));
    }
    if envelope.version < LIBRARY_VERSION {
        debug!(
            "migrating {} compositions from library version {}",
            envelope.items.len(),
            envelope.version
        );
    }
    Ok(envelope.items)
}

fn encode(items: Vec<StoredComposition>) -> Result<String, ScoreError> {
    let envelope = Envelope {
        version: LIBRARY_VERSION,
        items,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Backing storage plus the library operations built on top of it.
///
/// Implementors only provide [`read_items`](Self::read_items) and
/// [`write_items`](Self::write_items). A store whose reads are tolerant of bad data
/// also overrides [`read_items_for_write`](Self::read_items_for_write).
pub trait CompositionStore {
    fn read_items(&self) -> Result<Vec<StoredComposition>, ScoreError>;
    fn write_items(&mut self, items: Vec<StoredComposition>) -> Result<(), ScoreError>;

    /// The items a write starts from. Must fail rather than return items that
    /// would drop stored data once written back.
    fn read_items_for_write(&self) -> Result<Vec<StoredComposition>, ScoreError> {
        self.read_items()
    }

    /// All compositions, most recently updated first.
    fn list(&self) -> Result<Vec<StoredComposition>, ScoreError> {
        let mut items = self.read_items()?;
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    fn save(&mut self, request: SaveRequest) -> Result<StoredComposition, ScoreError> {
        self.save_at(request, Utc::now())
    }

    /// Insert or replace by id, stamping the record with `now`. A blank title is
    /// stored as "Untitled".
    fn save_at(
        &mut self,
        request: SaveRequest,
        now: DateTime<Utc>,
    ) -> Result<StoredComposition, ScoreError> {
        let tempo = Tempo::new(request.tempo)?;
        let title = match request.title.trim() {
            "" => DEFAULT_TITLE.to_string(),
            t => t.to_string(),
        };
        let record = StoredComposition {
            id: request.id.unwrap_or_else(new_composition_id),
            title,
            updated_at: now,
            raw_input: request.raw_input,
            tempo: tempo.bpm(),
        };

        let mut items = self.read_items_for_write()?;
        match items.iter_mut().find(|item| item.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => items.push(record.clone()),
        }
        self.write_items(items)?;
        debug!("saved composition {}", record.id);
        Ok(record)
    }

    fn load(&self, id: &str) -> Result<StoredComposition, ScoreError> {
        self.read_items()?
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| ScoreError::NotFound(id.to_string()))
    }

    /// Remove by id. Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool, ScoreError> {
        let mut items = self.read_items_for_write()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        let removed = items.len() != before;
        if removed {
            self.write_items(items)?;
        }
        Ok(removed)
    }

    fn export_json(&self) -> Result<String, ScoreError> {
        encode(self.list()?)
    }

    /// Merge an exported library into this one. A record replaces an existing one
    /// with the same id only when it is newer. Returns how many records were added
    /// or replaced.
    fn import_json(&mut self, json: &str) -> Result<usize, ScoreError> {
        let incoming = decode(json)?;
        let mut items = self.read_items_for_write()?;
        let mut changed = 0;

        for record in incoming {
            match items.iter_mut().find(|item| item.id == record.id) {
                Some(existing) if record.updated_at > existing.updated_at => {
                    *existing = record;
                    changed += 1;
                }
                Some(_) => {}
                None => {
                    items.push(record);
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.write_items(items)?;
        }
        Ok(changed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Vec<StoredComposition>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompositionStore for MemoryStore {
    fn read_items(&self) -> Result<Vec<StoredComposition>, ScoreError> {
        Ok(self.items.clone())
    }

    fn write_items(&mut self, items: Vec<StoredComposition>) -> Result<(), ScoreError> {
        self.items = items;
        Ok(())
    }
}

/// A library kept in one JSON file. The file is created on first save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents, or `None` when the file does not exist yet.
    fn read_content(&self) -> Result<Option<String>, ScoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl CompositionStore for FileStore {
    fn read_items(&self) -> Result<Vec<StoredComposition>, ScoreError> {
        let Some(content) = self.read_content()? else {
            return Ok(Vec::new());
        };
        match decode(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("ignoring unreadable library {}: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    fn read_items_for_write(&self) -> Result<Vec<StoredComposition>, ScoreError> {
        let Some(content) = self.read_content()? else {
            return Ok(Vec::new());
        };
        decode(&content).map_err(|e| {
            ScoreError::Storage(format!("refusing to overwrite {}: {}", self.path.display(), e))
        })
    }

    fn write_items(&mut self, items: Vec<StoredComposition>) -> Result<(), ScoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, encode(items)?)?;
        Ok(())
    }
}
