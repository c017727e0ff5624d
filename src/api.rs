//! # Public API
//!
//! One-call entry points that run the whole pipeline: text → document →
//! schedule + layout.
//!
//! ## Compilation Functions
//!
//! - [`compile()`] - Best-effort: keeps whatever parsed, returns diagnostics alongside
//! - [`compile_strict()`] - Fails on the first diagnostic that dropped input
//! - [`compile_with_config()`] - Title, tempo and layout constants from a [`Config`]
//!
//! ## Typical Usage
//!
//! ```rust
//! use scorepad::{compile, ParseOptions};
//!
//! let compiled = compile("C4 q D4 q E4 h\nR w", &ParseOptions::default(), 800.0)?;
//! assert_eq!(compiled.schedule.len(), 4);
//! assert_eq!(compiled.layout.measure_widths.len(), 2);
//! assert!(compiled.diagnostics.is_empty());
//! # Ok::<(), scorepad::ScoreError>(())
//! ```

use crate::ast::Document;
use crate::config::Config;
use crate::error::ScoreError;
use crate::layout::{compute_layout_with, flatten_notes, LayoutConfig, RenderNote, StaffGeometry};
use crate::parser::{parse, Diagnostic, ParseOptions, ParseOutput};
use crate::playback::{schedule_document, PlaybackEvent};
use serde::Serialize;

/// Everything a front end needs to show and play one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compiled {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub schedule: Vec<PlaybackEvent>,
    pub layout: StaffGeometry,
    pub notes: Vec<RenderNote>,
}

/// Compile `text`, keeping the valid parts.
///
/// # Errors
/// [`ScoreError::Parse`] carrying the first diagnostic when not a single measure
/// could be built from non-blank text.
pub fn compile(
    text: &str,
    options: &ParseOptions,
    container_width: f64,
) -> Result<Compiled, ScoreError> {
    finish(parse(text, options), &LayoutConfig::default(), container_width)
}

/// Compile `text`, failing on the first diagnostic. Over/underfull warnings do
/// not fail and are returned in [`Compiled::warnings`].
///
/// # Example
/// ```rust
/// use scorepad::{compile_strict, ParseOptions, ScoreError};
///
/// let result = compile_strict("C4 q Z9 q", &ParseOptions::default(), 800.0);
/// assert!(matches!(result, Err(ScoreError::Parse { line: 1, .. })));
/// ```
pub fn compile_strict(
    text: &str,
    options: &ParseOptions,
    container_width: f64,
) -> Result<Compiled, ScoreError> {
    let output = parse(text, options);
    if let Some(err) = output.first_error() {
        return Err(err);
    }
    finish(output, &LayoutConfig::default(), container_width)
}

pub fn compile_with_config(
    text: &str,
    config: &Config,
    container_width: f64,
) -> Result<Compiled, ScoreError> {
    finish(parse(text, &config.parse_options()), &config.layout, container_width)
}

fn finish(
    output: ParseOutput,
    layout: &LayoutConfig,
    container_width: f64,
) -> Result<Compiled, ScoreError> {
    let ParseOutput {
        document,
        diagnostics,
        warnings,
        ..
    } = output;

    let document = match document {
        Some(doc) => doc,
        None => {
            let first = diagnostics.first();
            return Err(ScoreError::Parse {
                line: first.map_or(1, |d| d.line),
                column: first.and_then(|d| d.column),
                message: first
                    .map_or_else(|| "No valid notes found".to_string(), |d| d.message.clone()),
            });
        }
    };

    Ok(Compiled {
        schedule: schedule_document(&document),
        layout: compute_layout_with(layout, container_width, &document.measures),
        notes: flatten_notes(&document),
        document,
        diagnostics,
        warnings,
    })
}
