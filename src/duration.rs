//! Duration table.
//!
//! Maps the symbolic duration codes of the text format to lengths in quarter-note
//! beats. The parser's capacity check, the layout engine's complexity score and the
//! schedule builder's clock all read [`Duration::beats`], so this table is the only
//! place beat lengths are defined.

use serde::{Serialize, Serializer};
use std::fmt;

/// Note length, one of the five codes `w h q e s`.
///
/// Serializes as its code, so collaborators receive `"h"` rather than a variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Duration {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

/// `(duration, code, quarter-note beats)`
pub const DURATION_TABLE: [(Duration, char, f64); 5] = [
    (Duration::Whole, 'w', 4.0),
    (Duration::Half, 'h', 2.0),
    (Duration::Quarter, 'q', 1.0),
    (Duration::Eighth, 'e', 0.5),
    (Duration::Sixteenth, 's', 0.25),
];

impl Duration {
    /// Look up a duration by its code. Codes are case-sensitive: `Q` is not a quarter.
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        DURATION_TABLE
            .iter()
            .find(|(_, table_code, _)| *table_code == c)
            .map(|(duration, _, _)| *duration)
    }

    pub fn code(self) -> char {
        self.entry().1
    }

    /// Length in quarter-note beats.
    pub fn beats(self) -> f64 {
        self.entry().2
    }

    fn entry(self) -> (Duration, char, f64) {
        // Rows are in variant order.
        DURATION_TABLE[self as usize]
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_variant_order() {
        for (i, (duration, _, _)) in DURATION_TABLE.iter().enumerate() {
            assert_eq!(*duration as usize, i);
        }
    }

    #[test]
    fn test_beats() {
        assert_eq!(Duration::Whole.beats(), 4.0);
        assert_eq!(Duration::Half.beats(), 2.0);
        assert_eq!(Duration::Quarter.beats(), 1.0);
        assert_eq!(Duration::Eighth.beats(), 0.5);
        assert_eq!(Duration::Sixteenth.beats(), 0.25);
    }

    #[test]
    fn test_from_code_is_case_sensitive() {
        assert_eq!(Duration::from_code("q"), Some(Duration::Quarter));
        assert_eq!(Duration::from_code("s"), Some(Duration::Sixteenth));
        assert_eq!(Duration::from_code("Q"), None);
        assert_eq!(Duration::from_code("qq"), None);
        assert_eq!(Duration::from_code(""), None);
        assert_eq!(Duration::from_code("99"), None);
    }

    #[test]
    fn test_code_display() {
        assert_eq!(Duration::Eighth.to_string(), "e");
        assert_eq!(Duration::Whole.code(), 'w');
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_value([Duration::Half, Duration::Sixteenth]).unwrap();
        assert_eq!(json, serde_json::json!(["h", "s"]));
    }
}
