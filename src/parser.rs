//! # Notation Parser
//!
//! Compiles line-oriented text into a [`Document`] plus a list of [`Diagnostic`]s.
//!
//! ## Text Format
//! ```text
//! C4 q D4 q E4 h          one measure per non-blank line, 4/4 by default
//! 3/4 | G4 q R q B3 q     optional "<beats>/<beat-type> |" prefix
//! ```
//! Each line is a sequence of `<pitch|R> <duration>` pairs separated by whitespace.
//! Pitches follow `[A-Ga-g](#|b)?[0-9]`; `R`/`r` is a rest; durations are one of
//! `w h q e s` (case-sensitive).
//!
//! ## Recovery
//! Parsing is best-effort. A malformed time signature falls back to 4/4, an
//! unpaired trailing token is reported and ignored, and a pair with a bad pitch or
//! duration is reported and dropped. None of these stop the line or the document.
//!
//! A measure whose notes do not fill its time signature is kept as written. That is
//! reported separately in [`ParseOutput::warnings`], since it is advisory and no
//! input was lost; [`ParseOutput::diagnostics`] only lists input that was dropped or
//! replaced.
//!
//! ## Result Policy
//! - blank input: an empty document and no diagnostics
//! - at least one measure built: the document plus any diagnostics and warnings
//! - otherwise: no document, and at least one diagnostic

use crate::ast::*;
use crate::duration::Duration;
use crate::error::ScoreError;
use crate::ids::{IdSource, SequentialIds};
use crate::pitch::parse_pitch;
use log::{debug, trace};
use serde::Serialize;
use std::fmt;

/// Tolerance for comparing a measure's beats against its capacity.
const CAPACITY_TOLERANCE: f64 = 1e-6;

/// Document-level settings the text itself does not carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOptions {
    pub title: Option<String>,
    pub tempo: Option<Tempo>,
}

impl ParseOptions {
    pub fn new(title: impl Into<String>, tempo: Tempo) -> Self {
        Self {
            title: Some(title.into()),
            tempo: Some(tempo),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MalformedTimeSignature,
    DanglingToken,
    InvalidPitch,
    InvalidDuration,
    Overfull,
    Underfull,
    NoValidNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal, parse-time message tied to a source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: usize,
    /// 1-based column of the offending token, when there is one.
    pub column: Option<usize>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Over/underfull measures are warnings; everything else dropped input.
    pub fn severity(&self) -> Severity {
        match self.kind {
            DiagnosticKind::Overfull | DiagnosticKind::Underfull => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "line {}, column {}: {}", self.line, column, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutput {
    pub document: Option<Document>,
    /// Input that was dropped or replaced, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// Over/underfull measures, in source order.
    pub warnings: Vec<Diagnostic>,
    /// Source line (1-based) of each measure in `document`, in order.
    pub measure_lines: Vec<usize>,
}

impl ParseOutput {
    /// True when any input was dropped.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Diagnostics and warnings merged in source-line order.
    pub fn all_messages(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.diagnostics.iter().chain(&self.warnings).collect();
        all.sort_by_key(|d| d.line);
        all
    }

    /// The first diagnostic as a [`ScoreError::Parse`].
    pub fn first_error(&self) -> Option<ScoreError> {
        self.diagnostics.first().map(|d| ScoreError::Parse {
            line: d.line,
            column: d.column,
            message: d.message.clone(),
        })
    }

    /// Strict view: the document, or the first diagnostic. Warnings never fail.
    pub fn into_result(self) -> Result<Document, ScoreError> {
        if let Some(err) = self.first_error() {
            return Err(err);
        }
        self.document.ok_or_else(|| ScoreError::Parse {
            line: 1,
            column: None,
            message: "No valid notes found".to_string(),
        })
    }
}

/// A whitespace-delimited token with its 1-based column in the source line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LocatedToken<'a> {
    text: &'a str,
    column: usize,
}

/// Split `segment` on whitespace. `column_base` is the column of the segment's
/// first character within its line.
fn tokenize(segment: &str, column_base: usize) -> Vec<LocatedToken<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<(usize, usize)> = None; // (byte offset, column)

    for (char_pos, (byte_pos, c)) in segment.char_indices().enumerate() {
        if c.is_whitespace() {
            if let Some((s, column)) = start.take() {
                tokens.push(LocatedToken {
                    text: &segment[s..byte_pos],
                    column,
                });
            }
        } else if start.is_none() {
            start = Some((byte_pos, column_base + char_pos));
        }
    }
    if let Some((s, column)) = start {
        tokens.push(LocatedToken {
            text: &segment[s..],
            column,
        });
    }

    tokens
}

/// Trimmed numbers format without a trailing `.0`.
fn format_beats(beats: f64) -> String {
    let rounded = (beats * 1e6).round() / 1e6;
    format!("{}", rounded)
}

/// Per-call parser state: the id source and messages gathered so far.
struct Parser<'a, I: IdSource + ?Sized> {
    ids: &'a mut I,
    diagnostics: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    measures: Vec<Measure>,
    measure_lines: Vec<usize>,
}

impl<'a, I: IdSource + ?Sized> Parser<'a, I> {
    fn new(ids: &'a mut I) -> Self {
        Self {
            ids,
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            measures: Vec::new(),
            measure_lines: Vec::new(),
        }
    }

    fn report(
        &mut self,
        line: usize,
        column: Option<usize>,
        kind: DiagnosticKind,
        message: String,
    ) {
        trace!("diagnostic at line {}: {}", line, message);
        self.diagnostics.push(Diagnostic {
            line,
            column,
            kind,
            message,
        });
    }

    /// Parse a single measure (one line). Blank lines never reach here.
    fn parse_line(&mut self, line_number: usize, line: &str) {
        let (time_signature, body, body_column) = match line.find('|') {
            Some(pipe) => {
                let prefix = &line[..pipe];
                let body_column = line[..=pipe].chars().count() + 1;
                let ts = self.parse_time_signature_prefix(line_number, prefix);
                (ts, &line[pipe + 1..], body_column)
            }
            None => (TimeSignature::default(), line, 1),
        };

        let tokens = tokenize(body, body_column);
        trace!("line {}: {} tokens in {}", line_number, tokens.len(), time_signature);

        if tokens.len() % 2 != 0 {
            if let Some(dangling) = tokens.last() {
                self.report(
                    line_number,
                    Some(dangling.column),
                    DiagnosticKind::DanglingToken,
                    format!(
                        "Dangling token '{}' has no partner (expected <pitch|R> <duration> pairs)",
                        dangling.text
                    ),
                );
            }
        }

        let mut notes = Vec::new();
        for pair in tokens.chunks_exact(2) {
            if let Some((kind, duration)) = self.parse_pair(line_number, pair[0], pair[1]) {
                notes.push(Note::new(self.ids.next_note_id(), kind, duration));
            }
        }

        if notes.is_empty() {
            return;
        }

        let measure_number = self.measures.len() + 1;
        let measure = Measure {
            id: self.ids.next_measure_id(),
            time_signature,
            notes,
        };
        self.check_capacity(line_number, measure_number, &measure);
        self.measures.push(measure);
        self.measure_lines.push(line_number);
    }

    /// Parse the text before `|`. Falls back to 4/4 on anything malformed.
    fn parse_time_signature_prefix(&mut self, line_number: usize, prefix: &str) -> TimeSignature {
        let trimmed = prefix.trim();
        let parsed = trimmed.split_once('/').and_then(|(beats, beat_type)| {
            let beats = parse_positive(beats.trim())?;
            let beat_type = parse_positive(beat_type.trim())?;
            TimeSignature::new(beats, beat_type)
        });

        match parsed {
            Some(ts) => ts,
            None => {
                let column = prefix
                    .char_indices()
                    .enumerate()
                    .find(|(_, (_, c))| !c.is_whitespace())
                    .map(|(i, _)| i + 1)
                    .unwrap_or(1);
                self.report(
                    line_number,
                    Some(column),
                    DiagnosticKind::MalformedTimeSignature,
                    format!(
                        "Malformed time signature '{}' (expected <beats>/<beat-type> with positive numbers); using 4/4",
                        trimmed
                    ),
                );
                TimeSignature::default()
            }
        }
    }

    /// Returns `None` (after reporting) when either half of the pair is invalid.
    fn parse_pair(
        &mut self,
        line_number: usize,
        symbol: LocatedToken<'_>,
        duration: LocatedToken<'_>,
    ) -> Option<(NoteKind, Duration)> {
        let kind = if symbol.text.eq_ignore_ascii_case("r") {
            Some(NoteKind::Rest)
        } else {
            parse_pitch(symbol.text).map(NoteKind::Pitched)
        };
        let parsed_duration = Duration::from_code(duration.text);

        match (kind, parsed_duration) {
            (Some(kind), Some(d)) => Some((kind, d)),
            (None, d) => {
                let mut message = format!(
                    "Invalid pitch '{}' (expected a letter A-G, optional # or b, and an octave 0-9, or R for a rest)",
                    symbol.text
                );
                if d.is_none() {
                    message.push_str(&format!(" and invalid duration '{}'", duration.text));
                }
                self.report(
                    line_number,
                    Some(symbol.column),
                    DiagnosticKind::InvalidPitch,
                    message,
                );
                None
            }
            (Some(_), None) => {
                self.report(
                    line_number,
                    Some(duration.column),
                    DiagnosticKind::InvalidDuration,
                    format!(
                        "Invalid duration '{}' after '{}' (expected one of w, h, q, e, s)",
                        duration.text, symbol.text
                    ),
                );
                None
            }
        }
    }

    /// Warn when the notes do not fill the time signature, in its own beat units.
    fn check_capacity(&mut self, line_number: usize, measure_number: usize, measure: &Measure) {
        let ts = measure.time_signature;
        let total = measure.total_quarters();
        let capacity = ts.capacity_quarters();
        if (total - capacity).abs() <= CAPACITY_TOLERANCE {
            return;
        }

        let (kind, word) = if total > capacity {
            (DiagnosticKind::Overfull, "overfull")
        } else {
            (DiagnosticKind::Underfull, "underfull")
        };
        let message = format!(
            "Measure {} is {}: {} of {} beats in {}",
            measure_number,
            word,
            format_beats(ts.quarters_to_own_beats(total)),
            ts.beats,
            ts
        );
        trace!("warning at line {}: {}", line_number, message);
        self.warnings.push(Diagnostic {
            line: line_number,
            column: None,
            kind,
            message,
        });
    }
}

fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Parse text with a fresh id source, so identical text yields identical ids.
///
/// # Example
/// ```rust
/// use scorepad::{parse, ParseOptions};
///
/// let output = parse("C4 q D4 q\nE4 h", &ParseOptions::default());
/// let doc = output.document.unwrap();
/// assert_eq!(doc.measures.len(), 2);
/// assert_eq!(doc.measures[0].notes.len(), 2);
/// ```
pub fn parse(text: &str, options: &ParseOptions) -> ParseOutput {
    let mut ids = SequentialIds::new();
    parse_with_ids(text, options, &mut ids)
}

/// Parse text drawing ids from a caller-supplied source.
pub fn parse_with_ids<I: IdSource + ?Sized>(
    text: &str,
    options: &ParseOptions,
    ids: &mut I,
) -> ParseOutput {
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let tempo = options.tempo.unwrap_or_default();

    if text.trim().is_empty() {
        return ParseOutput {
            document: Some(Document::empty(ids.next_document_id(), title, tempo)),
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            measure_lines: Vec::new(),
        };
    }

    let mut parser = Parser::new(ids);
    let mut first_content_line = None;

    for (index, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;
        first_content_line.get_or_insert(line_number);
        parser.parse_line(line_number, line);
    }

    let Parser {
        ids,
        mut diagnostics,
        warnings,
        measures,
        measure_lines,
    } = parser;

    debug!(
        "parsed {} measures with {} diagnostics and {} warnings",
        measures.len(),
        diagnostics.len(),
        warnings.len()
    );

    if measures.is_empty() {
        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic {
                line: first_content_line.unwrap_or(1),
                column: None,
                kind: DiagnosticKind::NoValidNotes,
                message: "No valid notes found".to_string(),
            });
        }
        return ParseOutput {
            document: None,
            diagnostics,
            warnings,
            measure_lines,
        };
    }

    ParseOutput {
        document: Some(Document {
            id: ids.next_document_id(),
            title,
            tempo,
            measures,
        }),
        diagnostics,
        warnings,
        measure_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_default(text: &str) -> ParseOutput {
        parse(text, &ParseOptions::default())
    }

    fn tokens_of(doc: &Document, measure: usize) -> Vec<(String, char)> {
        doc.measures[measure]
            .notes
            .iter()
            .map(|n| (n.kind.token(), n.duration.code()))
            .collect()
    }

    #[test]
    fn test_simple_measures() {
        let out = parse_default("C4 q D4 q\nE4 h");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let doc = out.document.unwrap();
        assert_eq!(doc.measures.len(), 2);
        assert_eq!(tokens_of(&doc, 0), vec![("C4".into(), 'q'), ("D4".into(), 'q')]);
        assert_eq!(tokens_of(&doc, 1), vec![("E4".into(), 'h')]);
        assert_eq!(out.measure_lines, vec![1, 2]);
    }

    #[test]
    fn test_underfull_is_advisory() {
        let out = parse_default("C4 q D4 q");
        let doc = out.document.as_ref().unwrap();
        assert_eq!(doc.measures[0].notes.len(), 2);
        assert!(out.diagnostics.is_empty());
        assert!(!out.has_errors());
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, DiagnosticKind::Underfull);
        assert_eq!(out.warnings[0].message, "Measure 1 is underfull: 2 of 4 beats in 4/4");
        assert_eq!(out.warnings[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_overfull_reports_own_denominator() {
        let out = parse_default("6/8 | C4 h D4 h");
        let d = &out.warnings[0];
        assert_eq!(d.kind, DiagnosticKind::Overfull);
        // 4 quarters = 8 eighth-note beats
        assert_eq!(d.message, "Measure 1 is overfull: 8 of 6 beats in 6/8");
    }

    #[test]
    fn test_all_messages_in_line_order() {
        let out = parse_default("C4 q\nC4 q Z9 q D4 h R q");
        let kinds: Vec<_> = out.all_messages().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Underfull, DiagnosticKind::InvalidPitch]);
    }

    #[test]
    fn test_time_signature_prefix() {
        let out = parse_default("3/4 | G4 q R q B3 q");
        assert!(out.diagnostics.is_empty());
        let doc = out.document.unwrap();
        assert_eq!(doc.measures[0].time_signature, TimeSignature::new(3, 4).unwrap());
        assert!(doc.measures[0].notes[1].is_rest());
    }

    #[test]
    fn test_prefix_whitespace_is_flexible() {
        let out = parse_default("  2/4|C4 q D4 q");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let doc = out.document.unwrap();
        assert_eq!(doc.measures[0].time_signature.beats, 2);
    }

    #[test]
    fn test_malformed_prefix_falls_back() {
        let out = parse_default("0/4 | C4 w");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MalformedTimeSignature);
        assert_eq!(out.diagnostics[0].column, Some(1));
        let doc = out.document.unwrap();
        assert_eq!(doc.measures[0].time_signature, TimeSignature::default());
        assert_eq!(doc.measures[0].notes.len(), 1);

        for prefix in ["x/4", "4/", "/4", "4", "-3/4", "4/0"] {
            let out = parse_default(&format!("{} | C4 w", prefix));
            assert_eq!(out.diagnostics.len(), 1, "prefix {:?}", prefix);
            assert!(out.document.is_some());
        }
    }

    #[test]
    fn test_dangling_token() {
        let out = parse_default("C4 q D4 q E4 h F4");
        assert_eq!(out.diagnostics.len(), 1);
        let d = &out.diagnostics[0];
        assert_eq!(d.kind, DiagnosticKind::DanglingToken);
        assert!(d.message.contains("'F4'"));
        assert_eq!(d.column, Some(16));
        assert_eq!(out.document.unwrap().measures[0].notes.len(), 3);
    }

    #[test]
    fn test_invalid_pair_is_dropped() {
        let out = parse_default("C4 q Z9 q");
        let doc = out.document.unwrap();
        assert_eq!(doc.measures[0].notes.len(), 1);
        let bad = out
            .diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::InvalidPitch)
            .unwrap();
        assert!(bad.message.contains("Z9"));
        assert_eq!(bad.column, Some(6));
    }

    #[test]
    fn test_invalid_duration() {
        let out = parse_default("C4 Q D4 q E4 h R q");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::InvalidDuration);
        assert!(out.diagnostics[0].message.contains("'Q'"));
    }

    #[test]
    fn test_one_diagnostic_per_bad_pair() {
        let out = parse_default("ZZZ 99");
        assert!(out.document.is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("ZZZ"));
        assert!(out.diagnostics[0].message.contains("99"));
    }

    #[test]
    fn test_blank_input_is_empty_document() {
        for text in ["", "   ", "\n\n  \t\n"] {
            let out = parse_default(text);
            assert!(out.diagnostics.is_empty());
            let doc = out.document.unwrap();
            assert!(doc.is_empty());
            assert_eq!(doc.title, DEFAULT_TITLE);
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let out = parse_default("C4 w\n\n   \nD4 w\r\n");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.measure_lines, vec![1, 4]);
        assert_eq!(out.document.unwrap().measures.len(), 2);
    }

    #[test]
    fn test_prefix_only_line_yields_no_measure() {
        let out = parse_default("3/4 |");
        assert!(out.document.is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::NoValidNotes);
    }

    #[test]
    fn test_rest_is_case_insensitive() {
        let out = parse_default("r q R q c4 h");
        let doc = out.document.unwrap();
        assert!(doc.measures[0].notes[0].is_rest());
        assert!(doc.measures[0].notes[1].is_rest());
        assert_eq!(doc.measures[0].notes[2].kind.token(), "C4");
    }

    #[test]
    fn test_ids_unique_and_in_source_order() {
        let doc = parse_default("C4 q D4 q E4 h\nF4 w").document.unwrap();
        let ids: Vec<_> = doc.notes().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(doc.measures[0].id < doc.measures[1].id);
    }

    #[test]
    fn test_options_carry_title_and_tempo() {
        let opts = ParseOptions::new("Scratch", Tempo::new(90.0).unwrap());
        let doc = parse("C4 w", &opts).document.unwrap();
        assert_eq!(doc.title, "Scratch");
        assert_eq!(doc.tempo.bpm(), 90.0);
    }

    #[test]
    fn test_into_result() {
        assert!(parse_default("C4 w").into_result().is_ok());
        // Warnings alone do not fail a strict parse.
        assert!(parse_default("C4 q").into_result().is_ok());
        match parse_default("C4 w\nC4 q Z9 q D4 h R q").into_result() {
            Err(ScoreError::Parse { line, column, message }) => {
                assert_eq!(line, 2);
                assert_eq!(column, Some(6));
                assert!(message.contains("Z9"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_display() {
        let out = parse_default("C4 q X q D4 h R q");
        assert_eq!(
            out.diagnostics[0].to_string(),
            "line 1, column 6: Invalid pitch 'X' (expected a letter A-G, optional # or b, and an octave 0-9, or R for a rest)"
        );
    }

    #[test]
    fn test_tokenize_columns() {
        let tokens = tokenize("  C4  q", 5);
        assert_eq!(
            tokens,
            vec![
                LocatedToken { text: "C4", column: 7 },
                LocatedToken { text: "q", column: 11 },
            ]
        );
    }
}
