//! # Layout Engine
//!
//! Computes staff geometry for an external renderer.
//!
//! Each measure gets a complexity score, `max(1, quarter beats + 0.3 * note count)`,
//! so beats dominate and dense measures get some extra room at equal beat totals.
//! Base widths are `max(min_measure_width, complexity * pixels_per_complexity_unit)`.
//! When the content is narrower than the container every width is scaled up by the
//! same factor to fill it; when it is wider nothing shrinks and the staff overflows
//! (the consumer scrolls horizontally rather than clipping).
//!
//! The renderer also receives [`flatten_notes`], the document's notes in order with
//! their ids, so it can tag drawn elements for reverse lookup.

use crate::ast::{Document, Measure, NoteKind};
use crate::duration::Duration;
use crate::ids::NoteId;
use log::debug;
use serde::{Deserialize, Serialize};

/// Pixel constants. Deserializable so they can be tuned from the YAML config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Staff area height.
    pub height: f64,
    /// Horizontal margin on each side.
    pub margin_x: f64,
    /// Top offset of the staff.
    pub margin_top: f64,
    pub min_measure_width: f64,
    pub pixels_per_complexity_unit: f64,
    /// Used when the container reports no usable width.
    pub fallback_width: f64,
    /// Extra complexity per note on top of the beat total.
    pub density_weight: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            height: 260.0,
            margin_x: 10.0,
            margin_top: 40.0,
            min_measure_width: 80.0,
            pixels_per_complexity_unit: 60.0,
            fallback_width: 700.0,
            density_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffGeometry {
    pub width: f64,
    pub height: f64,
    pub left_margin: f64,
    pub top_offset: f64,
    /// One entry per measure; a single entry for an empty document.
    pub measure_widths: Vec<f64>,
}

impl StaffGeometry {
    /// Left edge of measure `index`, or `None` past the end.
    pub fn measure_x(&self, index: usize) -> Option<f64> {
        if index >= self.measure_widths.len() {
            return None;
        }
        Some(self.left_margin + self.measure_widths[..index].iter().sum::<f64>())
    }
}

/// One entry of the flattened, order-preserving note list handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNote {
    pub note_id: NoteId,
    pub measure_index: usize,
    pub index_in_measure: usize,
    pub kind: NoteKind,
    pub duration: Duration,
}

pub fn measure_complexity(measure: &Measure, config: &LayoutConfig) -> f64 {
    let score = measure.total_quarters() + config.density_weight * measure.notes.len() as f64;
    score.max(1.0)
}

/// Layout with the default constants.
pub fn compute_layout(container_width: f64, measures: &[Measure]) -> StaffGeometry {
    compute_layout_with(&LayoutConfig::default(), container_width, measures)
}

pub fn compute_layout_with(
    config: &LayoutConfig,
    container_width: f64,
    measures: &[Measure],
) -> StaffGeometry {
    let width = if container_width.is_finite() && container_width > 0.0 {
        container_width
    } else {
        config.fallback_width
    };

    let base_widths: Vec<f64> = if measures.is_empty() {
        // Sized as one empty measure of complexity 1.
        vec![base_width(1.0, config)]
    } else {
        measures
            .iter()
            .map(|m| base_width(measure_complexity(m, config), config))
            .collect()
    };

    let total_base: f64 = base_widths.iter().sum();
    let available = width - 2.0 * config.margin_x;
    let scale = (available / total_base).max(1.0);
    let measure_widths: Vec<f64> = base_widths.iter().map(|w| w * scale).collect();
    let content: f64 = measure_widths.iter().sum();

    debug!(
        "layout: {} measures, container {}, scale {:.3}, content {:.1}",
        measures.len(),
        width,
        scale,
        content
    );

    StaffGeometry {
        width: content + 2.0 * config.margin_x,
        height: config.height,
        left_margin: config.margin_x,
        top_offset: config.margin_top,
        measure_widths,
    }
}

fn base_width(complexity: f64, config: &LayoutConfig) -> f64 {
    config
        .min_measure_width
        .max(complexity * config.pixels_per_complexity_unit)
}

/// The document's notes in performance order, with their position.
pub fn flatten_notes(doc: &Document) -> Vec<RenderNote> {
    doc.measures
        .iter()
        .enumerate()
        .flat_map(|(measure_index, measure)| {
            measure
                .notes
                .iter()
                .enumerate()
                .map(move |(index_in_measure, note)| RenderNote {
                    note_id: note.id,
                    measure_index,
                    index_in_measure,
                    kind: note.kind,
                    duration: note.duration,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseOptions};

    fn measures(text: &str) -> Vec<Measure> {
        parse(text, &ParseOptions::default())
            .document
            .unwrap()
            .measures
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_complexity() {
        let config = LayoutConfig::default();
        let m = measures("C4 q D4 q E4 h");
        // 4 beats + 0.3 * 3 notes
        assert!(close(measure_complexity(&m[0], &config), 4.9));
        let short = measures("C4 s");
        // 0.25 + 0.3 < 1
        assert!(close(measure_complexity(&short[0], &config), 1.0));
    }

    #[test]
    fn test_dense_measure_gets_more_room() {
        let m = measures("C4 w\nC4 e D4 e E4 e F4 e G4 e A4 e B4 e C5 e");
        let geo = compute_layout(100.0, &m);
        assert!(geo.measure_widths[1] > geo.measure_widths[0]);
    }

    #[test]
    fn test_stretches_to_fill_container() {
        let m = measures("C4 w\nD4 w");
        let geo = compute_layout(1000.0, &m);
        // base (4 + 0.3) * 60 = 258 each, available 980
        assert!(close(geo.measure_widths[0], 490.0));
        assert!(close(geo.measure_widths[1], 490.0));
        assert!(close(geo.width, 1000.0));
        assert_eq!(geo.left_margin, 10.0);
        assert_eq!(geo.top_offset, 40.0);
        assert_eq!(geo.height, 260.0);
    }

    #[test]
    fn test_overflows_instead_of_shrinking() {
        let m = measures("C4 w\nD4 w\nE4 w");
        let geo = compute_layout(300.0, &m);
        for w in &geo.measure_widths {
            assert!(close(*w, 258.0));
        }
        assert!(close(geo.width, 3.0 * 258.0 + 20.0));
        assert!(geo.width > 300.0);
    }

    #[test]
    fn test_min_measure_width() {
        let m = measures("C4 s");
        let geo = compute_layout(50.0, &m);
        assert!(close(geo.measure_widths[0], 80.0));
    }

    #[test]
    fn test_empty_document_sizes_one_measure() {
        let geo = compute_layout(500.0, &[]);
        assert_eq!(geo.measure_widths.len(), 1);
        assert!(close(geo.measure_widths[0], 480.0));
        assert!(close(geo.width, 500.0));
    }

    #[test]
    fn test_fallback_width() {
        let geo = compute_layout(0.0, &[]);
        assert!(close(geo.width, 700.0));
        let geo = compute_layout(f64::NAN, &[]);
        assert!(close(geo.width, 700.0));
    }

    #[test]
    fn test_measure_x() {
        let m = measures("C4 w\nD4 w");
        let geo = compute_layout(1000.0, &m);
        assert_eq!(geo.measure_x(0), Some(10.0));
        assert!(close(geo.measure_x(1).unwrap(), 500.0));
        assert_eq!(geo.measure_x(2), None);
    }

    #[test]
    fn test_flatten_notes_preserves_order_and_ids() {
        let doc = parse("C4 h R h\nE4 w", &ParseOptions::default())
            .document
            .unwrap();
        let flat = flatten_notes(&doc);
        let ids: Vec<_> = doc.notes().map(|n| n.id).collect();
        assert_eq!(flat.iter().map(|r| r.note_id).collect::<Vec<_>>(), ids);
        assert_eq!(flat[1].kind, NoteKind::Rest);
        assert_eq!((flat[2].measure_index, flat[2].index_in_measure), (1, 0));
    }

    #[test]
    fn test_config_from_yaml() {
        let config: LayoutConfig =
            serde_yaml::from_str("margin-x: 20\nmin-measure-width: 100").unwrap();
        assert_eq!(config.margin_x, 20.0);
        assert_eq!(config.min_measure_width, 100.0);
        assert_eq!(config.height, 260.0);
    }
}
