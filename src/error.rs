//! # Error Types
//!
//! This module defines the error type for the scorepad compiler.
//!
//! Parse-time problems are *not* errors: the parser reports them as
//! [`Diagnostic`](crate::parser::Diagnostic)s and keeps going. `ScoreError` covers the
//! hard stops: an invalid tempo, playback of an empty document, a caller asking for a
//! strict parse, and failures of the configuration and library collaborators.
//!
//! ## Usage
//! ```rust
//! use scorepad::{build_schedule, parse, ParseOptions, ScoreError};
//!
//! let output = parse("C4 q D4 q", &ParseOptions::default());
//! let doc = output.document.unwrap();
//!
//! match build_schedule(&doc, 0.0) {
//!     Ok(events) => println!("{} events", events.len()),
//!     Err(ScoreError::InvalidTempo(bpm)) => eprintln!("bad tempo {}", bpm),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Tempo was zero, negative, or not a finite number.
    ///
    /// # Example
    /// ```
    /// # use scorepad::ScoreError;
    /// let err = ScoreError::InvalidTempo(-10.0);
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Invalid tempo: -10 (must be a positive number of beats per minute)"
    /// );
    /// ```
    #[error("Invalid tempo: {0} (must be a positive number of beats per minute)")]
    InvalidTempo(f64),

    /// Strict parse failure, produced from the first error-severity diagnostic.
    ///
    /// # Example
    /// ```
    /// # use scorepad::ScoreError;
    /// let err = ScoreError::Parse {
    ///     line: 2,
    ///     column: Some(6),
    ///     message: "Invalid pitch 'Z9'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error at line 2: Invalid pitch 'Z9'");
    /// ```
    #[error("Parse error at line {line}: {message}")]
    Parse {
        line: usize,
        column: Option<usize>,
        message: String,
    },

    /// Playback was requested for a document with no measures.
    #[error("Nothing to play: the document has no measures")]
    EmptyDocument,

    /// Invalid YAML configuration.
    #[error("Invalid config: {0}")]
    Config(String),

    /// Library storage failure (I/O or JSON).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored composition id that does not exist.
    #[error("No stored composition with id '{0}'")]
    NotFound(String),
}

impl From<serde_yaml::Error> for ScoreError {
    fn from(e: serde_yaml::Error) -> Self {
        ScoreError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ScoreError {
    fn from(e: serde_json::Error) -> Self {
        ScoreError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for ScoreError {
    fn from(e: std::io::Error) -> Self {
        ScoreError::Storage(e.to_string())
    }
}
