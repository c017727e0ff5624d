//! Document → canonical text.
//!
//! The output is what [`parse`](crate::parser::parse) reads: one line per measure,
//! a `num/den | ` prefix only when the signature is not 4/4, and `<token> <duration>`
//! pairs joined by single spaces. Parsing the output reproduces the same measures
//! and notes (ids aside).

use crate::ast::{Document, Measure};

pub fn serialize(doc: &Document) -> String {
    doc.measures
        .iter()
        .map(serialize_measure)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn serialize_measure(measure: &Measure) -> String {
    let pairs = measure
        .notes
        .iter()
        .map(|n| format!("{} {}", n.kind.token(), n.duration))
        .collect::<Vec<_>>()
        .join(" ");

    if measure.time_signature.is_common_time() {
        pairs
    } else {
        format!("{} | {}", measure.time_signature, pairs)
    }
}
