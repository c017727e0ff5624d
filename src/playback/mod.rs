//! # Playback Module
//!
//! Flatten a document and a tempo into a time-ordered schedule for an external
//! audio transport.
//!
//! ## Sub-modules
//! - `types` - [`PlaybackEvent`] definition
//! - `engine` - schedule construction and transport helpers
//!
//! ## Timing
//! The clock runs in quarter-note beats from the start of the document and is never
//! reset at a barline: a measure consumes exactly the beats its notes add up to,
//! whatever its time signature says. Seconds are `beats * 60 / tempo`.
//!
//! Rests produce events too. They carry no pitch, so the transport stays silent
//! while still reporting the position (e.g. for highlighting).
//!
//! ## Example
//! ```rust
//! use scorepad::{parse, ParseOptions};
//! use scorepad::playback::build_schedule;
//!
//! let doc = parse("C4 q D4 q E4 h", &ParseOptions::default()).document.unwrap();
//! let events = build_schedule(&doc, 120.0).unwrap();
//!
//! let starts: Vec<f64> = events.iter().map(|e| e.time_seconds).collect();
//! assert_eq!(starts, vec![0.0, 0.5, 1.0]);
//! ```
//!
//! ## Related Modules
//! - `duration` - beat lengths shared with the parser and the layout engine
//! - `session` - refuses to play an empty document

mod engine;
mod types;


pub use engine::{active_note_at, build_schedule, schedule_document, total_duration};
pub use types::PlaybackEvent;
