pub mod api;
pub mod ast;
pub mod config;
pub mod duration;
pub mod edit;
pub mod error;
pub mod ids;
pub mod layout;
pub mod library;
pub mod parser;
pub mod pitch;
pub mod playback;
pub mod serializer;
pub mod session;

pub use api::{compile, compile_strict, compile_with_config, Compiled};
pub use ast::*;
pub use config::Config;
pub use duration::Duration;
pub use edit::{
    append_note_to_last_measure, delete_note_by_id, find_note, new_note, transpose_document,
    update_duration_by_id, update_pitch_by_id,
};
pub use error::*;
pub use ids::{DocumentId, IdSource, MeasureId, NoteId, SequentialIds};
pub use layout::{compute_layout, flatten_notes, LayoutConfig, StaffGeometry};
pub use parser::{
    parse, parse_with_ids, Diagnostic, DiagnosticKind, ParseOptions, ParseOutput, Severity,
};
pub use pitch::{clamp_pitch_token, parse_pitch, step_pitch_token};
pub use playback::{build_schedule, PlaybackEvent};
pub use serializer::serialize;
pub use session::Session;
